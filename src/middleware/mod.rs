pub mod auth;
pub mod response;

pub use auth::Guard;
pub use response::{ApiResponse, ApiResult};
