//! Verification parameters: geofence, token lifetimes, OTP shape.
//!
//! Loaded from the `[verification]` table of the node config; every field has
//! a default so a partial table is enough.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, RollcallError};

/// Parameters consumed by the verification engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationParams {
    /// Centre of the geofence scans are checked against.
    #[serde(default = "default_authorized_location")]
    pub authorized_location: Coordinate,

    /// Maximum geodesic distance (km) between a scan and the authorized location.
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,

    /// Freshness window of a session QR token, in seconds.
    #[serde(default = "default_qr_ttl_secs")]
    pub qr_ttl_secs: u64,

    /// Lifetime of a pending OTP challenge, in seconds.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: u64,

    /// Number of decimal digits in an OTP code.
    #[serde(default = "default_otp_length")]
    pub otp_length: usize,

    /// Wrong guesses tolerated before a pending OTP is discarded.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: u32,

    /// Offset from UTC (minutes) of the calendar attendance dates are filed under.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_authorized_location() -> Coordinate {
    Coordinate::new(13.5, 79.5)
}

fn default_max_distance_km() -> f64 {
    0.5
}

fn default_qr_ttl_secs() -> u64 {
    600
}

fn default_otp_ttl_secs() -> u64 {
    300
}

fn default_otp_length() -> usize {
    6
}

fn default_otp_max_attempts() -> u32 {
    5
}

impl VerificationParams {
    pub const OTP_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=10;

    /// Reject parameter sets the engine cannot operate with.
    pub fn validate(&self) -> Result<(), RollcallError> {
        self.authorized_location
            .validate()
            .map_err(|e| RollcallError::InvalidParams(format!("authorized_location: {e}")))?;
        if !self.max_distance_km.is_finite() || self.max_distance_km < 0.0 {
            return Err(RollcallError::InvalidParams(format!(
                "max_distance_km must be a finite, non-negative number (got {})",
                self.max_distance_km
            )));
        }
        if self.qr_ttl_secs == 0 {
            return Err(RollcallError::InvalidParams("qr_ttl_secs must be > 0".into()));
        }
        if self.otp_ttl_secs == 0 {
            return Err(RollcallError::InvalidParams("otp_ttl_secs must be > 0".into()));
        }
        if !Self::OTP_LENGTH_RANGE.contains(&self.otp_length) {
            return Err(RollcallError::InvalidParams(format!(
                "otp_length must be within {:?} (got {})",
                Self::OTP_LENGTH_RANGE,
                self.otp_length
            )));
        }
        if self.otp_max_attempts == 0 {
            return Err(RollcallError::InvalidParams(
                "otp_max_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            authorized_location: default_authorized_location(),
            max_distance_km: default_max_distance_km(),
            qr_ttl_secs: default_qr_ttl_secs(),
            otp_ttl_secs: default_otp_ttl_secs(),
            otp_length: default_otp_length(),
            otp_max_attempts: default_otp_max_attempts(),
            utc_offset_minutes: 0,
        }
    }
}
