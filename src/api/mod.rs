pub mod episode;
pub mod error;
pub mod health;
pub mod openapi;
pub mod selection;

pub use error::{ApiError, ErrorResponse};
