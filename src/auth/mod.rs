//! Authentication state: persisted tokens, session lifecycle and token inspection

mod session;
mod store;
pub mod token;
mod types;

pub use session::*;
pub use store::*;
pub use types::*;
