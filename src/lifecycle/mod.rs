//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Cache store → Directory client → RosterService → Warmers
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Background tasks observe broadcast → Exit their loops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Stop the admin listener → Dispose the service
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store first, then directory, then service
//! - Fail fast: a bad store or directory URL aborts startup

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{build_service, start_configured_warmers, StartupError};
