use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use corral::db::{ConnectionProvider, DbError, NewUser};
use tokio::fs;

fn temp_database(tag: &str) -> (PathBuf, String) {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    let db_path = std::env::temp_dir().join(format!(
        "corral-{tag}-{}-{}.sqlite",
        std::process::id(),
        hasher.finish()
    ));
    let database_url = format!("sqlite:{}", db_path.to_str().unwrap());
    (db_path, database_url)
}

async fn cleanup(db_path: &Path) {
    let wal_path = PathBuf::from(format!("{}-wal", db_path.to_string_lossy()));
    let shm_path = PathBuf::from(format!("{}-shm", db_path.to_string_lossy()));
    let _ = fs::remove_file(&wal_path).await;
    let _ = fs::remove_file(&shm_path).await;
    let _ = fs::remove_file(db_path).await;
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "$argon2id$stub-hash".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

#[tokio::test]
async fn begin_twice_fails_with_transaction_already_active() {
    let (db_path, database_url) = temp_database("uow-double-begin");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let mut uow = provider.unit_of_work();
    assert!(!uow.in_transaction());

    uow.begin_transaction().await.unwrap();
    assert!(uow.in_transaction());

    let err = uow.begin_transaction().await.unwrap_err();
    assert!(matches!(err, DbError::TransactionAlreadyActive));
    // The first transaction is untouched by the failed second begin.
    assert!(uow.in_transaction());

    uow.rollback_transaction().await.unwrap();
    assert!(!uow.in_transaction());

    cleanup(&db_path).await;
}

#[tokio::test]
async fn commit_and_rollback_require_an_open_transaction() {
    let (db_path, database_url) = temp_database("uow-no-tx");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let mut uow = provider.unit_of_work();

    let err = uow.commit_transaction().await.unwrap_err();
    assert!(matches!(err, DbError::NoActiveTransaction { .. }));

    let err = uow.rollback_transaction().await.unwrap_err();
    assert!(matches!(err, DbError::NoActiveTransaction { .. }));

    assert!(!uow.in_transaction());

    cleanup(&db_path).await;
}

#[tokio::test]
async fn query_failure_inside_transaction_rolls_everything_back() {
    let (db_path, database_url) = temp_database("uow-auto-rollback");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let mut uow = provider.unit_of_work();
    uow.begin_transaction().await.unwrap();

    // Write A, write B, then force a unique-constraint failure.
    uow.users().create(new_user("alice")).await.unwrap();
    uow.users().create(new_user("bob")).await.unwrap();

    let err = uow.users().create(new_user("alice")).await.unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");

    // The failed query rolled the transaction back as a side effect.
    assert!(!uow.in_transaction());
    let err = uow.commit_transaction().await.unwrap_err();
    assert!(matches!(err, DbError::NoActiveTransaction { .. }));

    // Neither A nor B survived.
    let mut fresh = provider.unit_of_work();
    assert!(
        fresh
            .users()
            .get_by_username("alice")
            .await
            .unwrap()
            .is_none()
    );
    assert!(fresh.users().get_by_username("bob").await.unwrap().is_none());

    cleanup(&db_path).await;
}

#[tokio::test]
async fn committed_writes_are_durable() {
    let (db_path, database_url) = temp_database("uow-durable");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let created = {
        let mut uow = provider.unit_of_work();
        uow.begin_transaction().await.unwrap();
        let created = uow.users().create(new_user("carol")).await.unwrap();
        uow.commit_transaction().await.unwrap();
        created
    };

    let mut fresh = provider.unit_of_work();
    let found = fresh
        .users()
        .get_by_username("carol")
        .await
        .unwrap()
        .expect("committed user should be readable from a fresh unit of work");
    assert_eq!(found, created);
    assert_eq!(found.first_name, "Ada");

    let by_id = fresh.users().get_by_id(&created.id).await.unwrap();
    assert_eq!(by_id, Some(found));

    cleanup(&db_path).await;
}

#[tokio::test]
async fn repository_binding_follows_call_time_context() {
    let (db_path, database_url) = temp_database("uow-binding");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let mut uow = provider.unit_of_work();
    let mut observer = provider.unit_of_work();

    // Un-transacted read before any begin.
    assert!(uow.users().get_by_username("erin").await.unwrap().is_none());

    // The same instance then opens a transaction; subsequent repository
    // accesses are bound to it even though `users()` was called before.
    uow.begin_transaction().await.unwrap();
    uow.users().create(new_user("erin")).await.unwrap();

    // Inside the transaction the write is visible...
    assert!(uow.users().get_by_username("erin").await.unwrap().is_some());

    // ...but an un-transacted observer is unaffected by the pending writes.
    assert!(
        observer
            .users()
            .get_by_username("erin")
            .await
            .unwrap()
            .is_none()
    );

    uow.rollback_transaction().await.unwrap();
    assert!(
        observer
            .users()
            .get_by_username("erin")
            .await
            .unwrap()
            .is_none()
    );

    cleanup(&db_path).await;
}

#[tokio::test]
async fn update_password_is_transactional_too() {
    let (db_path, database_url) = temp_database("uow-update");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    let mut uow = provider.unit_of_work();
    let created = uow.users().create(new_user("grace")).await.unwrap();

    uow.begin_transaction().await.unwrap();
    uow.users()
        .update_password(&created.id, "$argon2id$rotated")
        .await
        .unwrap();
    uow.rollback_transaction().await.unwrap();

    let unchanged = uow
        .users()
        .get_by_id(&created.id)
        .await
        .unwrap()
        .expect("user should still exist");
    assert_eq!(unchanged.password, "$argon2id$stub-hash");

    uow.begin_transaction().await.unwrap();
    uow.users()
        .update_password(&created.id, "$argon2id$rotated")
        .await
        .unwrap();
    uow.commit_transaction().await.unwrap();

    let rotated = uow
        .users()
        .get_by_id(&created.id)
        .await
        .unwrap()
        .expect("user should still exist");
    assert_eq!(rotated.password, "$argon2id$rotated");
    assert!(rotated.updated_at >= unchanged.updated_at);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn leaked_unit_of_work_does_not_wedge_the_pool() {
    let (db_path, database_url) = temp_database("uow-leak");
    let provider = ConnectionProvider::connect(&database_url).await.unwrap();

    {
        let mut leaked = provider.unit_of_work();
        leaked.begin_transaction().await.unwrap();
        leaked.users().create(new_user("frank")).await.unwrap();
        assert!(leaked.in_transaction());
        // Dropped while open: a caller bug, surfaced via a warn event. The
        // underlying transaction is discarded.
    }

    let mut uow = provider.unit_of_work();
    assert!(
        uow.users()
            .get_by_username("frank")
            .await
            .unwrap()
            .is_none()
    );

    // The pool is still usable for a full begin/write/commit cycle.
    uow.begin_transaction().await.unwrap();
    uow.users().create(new_user("frank")).await.unwrap();
    uow.commit_transaction().await.unwrap();
    assert!(
        uow.users()
            .get_by_username("frank")
            .await
            .unwrap()
            .is_some()
    );

    cleanup(&db_path).await;
}
