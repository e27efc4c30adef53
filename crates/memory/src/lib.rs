//! Session state stores for devpilot.
//!
//! Both stores implement `devpilot_core::StateStore` and treat the session
//! snapshot as an opaque blob.

pub mod file_store;
pub mod in_memory;

pub use file_store::FileStateStore;
pub use in_memory::InMemoryStateStore;
