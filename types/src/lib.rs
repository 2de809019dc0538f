//! Fundamental types for the rollcall attendance engine.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: timestamps and clocks, coordinates, student identities, session
//! keys, attendance records, verification parameters, and the randomness seam.

pub mod error;
pub mod geo;
pub mod params;
pub mod random;
pub mod record;
pub mod session;
pub mod student;
pub mod time;

pub use error::RollcallError;
pub use geo::Coordinate;
pub use params::VerificationParams;
pub use random::RandomSource;
pub use record::{AttendanceRecord, NewAttendance};
pub use session::SessionKey;
pub use student::{Principal, StudentId};
pub use time::{Clock, SystemClock, Timestamp};
