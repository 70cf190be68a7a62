//! # benchjudge telemetry
//!
//! Structured logging for evaluation runs, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust
//! use benchjudge_telemetry::{init_telemetry, info, instrument};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("benchjudge")?;
//!
//!     #[instrument]
//!     async fn score() {
//!         info!("scoring");
//!     }
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use spans::*;

pub use init::{init_json_telemetry, init_telemetry};
