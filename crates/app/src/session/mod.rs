//! Session lifecycle and durable session storage.

mod manager;
mod storage;

pub use manager::*;
pub use storage::*;
