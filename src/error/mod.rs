mod api;
mod vmapi;

pub use api::{ApiError, ApiErrorBody, ApiErrorObject};
pub use vmapi::VmapiError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
