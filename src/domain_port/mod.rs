mod clock;
mod token_store;

pub use clock::*;
pub use token_store::*;
