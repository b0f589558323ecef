pub mod document_store;
pub mod memory;
pub mod models;
pub mod session_store;

pub use document_store::*;
pub use session_store::*;
