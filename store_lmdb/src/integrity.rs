//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the server begins
//! accepting scans.

use std::sync::Arc;

use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid rollcall environment.
const EXPECTED_DATABASES: &[&str] = &["attendance", "attendance_unique", "students", "meta"];

/// Check LMDB database integrity on startup.
///
/// Opens each expected database and counts its entries. Read failures and
/// missing databases are recorded in the report rather than causing a hard
/// error. The attendance table and its uniqueness index must agree in size.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;
    let mut counts = std::collections::HashMap::new();

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                        counts.insert(db_name, count);
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("failed to read database '{}': {}", db_name, e));
                    }
                }
            }
            Ok(None) => {
                report
                    .errors
                    .push(format!("database '{}' is missing", db_name));
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("failed to open database '{}': {}", db_name, e));
            }
        }
    }

    if let (Some(rows), Some(index)) = (counts.get("attendance"), counts.get("attendance_unique")) {
        if rows != index {
            report.errors.push(format!(
                "attendance has {rows} rows but its uniqueness index has {index} entries"
            ));
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_report() {
        let report = IntegrityReport {
            databases_checked: 4,
            total_entries: 100,
            errors: Vec::new(),
        };
        assert!(report.is_healthy());
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 4,
            total_entries: 100,
            errors: vec!["corruption detected".to_string()],
        };
        assert!(!report.is_healthy());
    }
}
