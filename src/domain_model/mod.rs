mod oidc;
mod session;
mod target;

pub use oidc::*;
pub use session::*;
pub use target::*;
