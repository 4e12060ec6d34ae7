//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the gateway core and external
//! systems. Each port is a trait that can be implemented by adapters in the
//! infrastructure layer, or by mocks in tests.

mod clock;
mod credential_store;
mod transport;

pub use clock::Clock;
pub use credential_store::CredentialStore;
pub use transport::HttpTransport;
