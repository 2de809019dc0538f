//! Attendance verification engine.
//!
//! Two independent channels prove that a student was present:
//! 1. **QR scan**: a rotating, time-boxed token bound to a (subject, period)
//!    session, presented together with the device's coordinates, which must
//!    fall inside the authorized geofence.
//! 2. **One-time code**: a short numeric code requested by the student and
//!    consumed once. No geofence on this path.
//!
//! Either channel ends in the [`AttendanceRecorder`], which guarantees at
//! most one record per (student, subject, period, date).
//!
//! Registries are plain objects owned by the [`VerificationEngine`]; nothing
//! here is process-global.

pub mod engine;
pub mod error;
pub mod geo;
pub mod otp;
pub mod outcome;
pub mod recorder;
pub mod session;

pub use engine::VerificationEngine;
pub use error::{EngineError, RecordError, VerifyError};
pub use geo::{distance_km, within_range, Geofence};
pub use otp::OtpRegistry;
pub use outcome::{Channel, Outcome, RejectReason};
pub use recorder::AttendanceRecorder;
pub use session::{SessionToken, SessionTokenRegistry, PAYLOAD_HEX_LEN};
