mod route_gate;
mod session_watcher;

pub use route_gate::*;
pub use session_watcher::*;
