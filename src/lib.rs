//! ntpeek: client-side NTP exchange and inspection.
//!
//! The [`ntp`] module holds the wire codec and the offset/delay math,
//! [`services::session::NtpClient`] runs one blocking exchange, and the rest
//! of the crate turns exchanges into printable probe results.
//!
//! ```no_run
//! use std::time::Duration;
//! use ntpeek::NtpClient;
//!
//! let result = NtpClient::new().request("pool.ntp.org", 3, 123, Duration::from_secs(5))?;
//! println!("offset {:.6} s, delay {:.6} s", result.offset(), result.delay());
//! # Ok::<(), ntpeek::NtpError>(())
//! ```

pub mod adapters;
pub mod domain;
mod error;
pub mod fmt;
pub mod ntp;
pub mod services;
pub mod stats;

pub use domain::ntp::{ProbeResult, Target};
pub use error::{NtpError, Result};
pub use ntp::{ExchangeResult, Packet};
pub use services::compare::compare_many;
pub use services::query::query_one;
pub use services::session::NtpClient;
