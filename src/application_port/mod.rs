mod auth_client;
mod target_service;

pub use auth_client::*;
pub use target_service::*;
