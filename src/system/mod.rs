mod system;
pub use system::*;
