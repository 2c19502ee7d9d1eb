mod auth_client_http;
mod authorized_client;
mod http_util;
mod session_manager;
mod target_service_http;
mod token_claims;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_client_http::*;
pub use authorized_client::*;
pub use session_manager::*;
pub use target_service_http::*;
pub use token_claims::decode_expiry;
