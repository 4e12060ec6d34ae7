//! Credential store adapters
//!
//! Two implementations of the `CredentialStore` port: a process-local
//! in-memory store and a JSON-file store that survives restarts.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
