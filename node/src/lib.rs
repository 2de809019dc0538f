//! rollcall server node.
//!
//! Loads the TOML configuration, opens the LMDB environment, builds the
//! verification engine and HTTP state, and runs the server alongside a
//! background purge task until a shutdown signal arrives.

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::{open_store, AttendanceNode};
pub use shutdown::ShutdownController;
