//! Stockline Application - Gateway core
//!
//! The authenticated request gateway: a pre-send freshness interceptor, a
//! post-response 401 recovery interceptor, and the refresh coordinator that
//! collapses concurrent token refreshes into a single network call.
//!
//! External systems are reached through ports; adapters live in the
//! infrastructure crate.

pub mod config;
pub mod gateway;
pub mod ports;
pub mod refresh;

pub use config::GatewayConfig;
pub use gateway::{ApiGateway, REFRESH_THRESHOLD_SECS};
pub use refresh::{RefreshCoordinator, REFRESH_PATH};
