pub mod client;
pub mod models;

pub use client::TushareClient;
pub use models::{ApiError, TushareData, TushareResponse};
