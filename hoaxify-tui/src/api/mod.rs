pub mod client;
pub mod error;

pub use client::{ApiClient, Credentials, HoaxifyApi};
pub use error::{ApiError, ApiResult};
