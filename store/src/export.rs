//! CSV export of the attendance ledger.

use std::io::Write;

use rollcall_types::AttendanceRecord;

/// Column header, matching the ledger's historical table layout.
pub const CSV_HEADER: [&str; 6] = ["ID", "RegNo", "Subject", "Period", "Date", "Time"];

/// Write `records` as CSV (header first), quoting fields per RFC 4180.
pub fn export_csv<'a, W, I>(records: I, mut writer: W) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    write_row(&mut writer, CSV_HEADER.iter().copied())?;
    let mut rows = 0;
    for record in records {
        let id = record.id.to_string();
        let date = record.date.format("%Y-%m-%d").to_string();
        let time = record.time.format("%H:%M:%S").to_string();
        write_row(
            &mut writer,
            [
                id.as_str(),
                record.student_id.as_str(),
                record.session.subject.as_str(),
                record.session.period.as_str(),
                date.as_str(),
                time.as_str(),
            ],
        )?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

fn write_row<'a, W: Write>(
    writer: &mut W,
    fields: impl IntoIterator<Item = &'a str>,
) -> std::io::Result<()> {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        if field.contains(&[',', '"', '\n', '\r'][..]) {
            write!(writer, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            writer.write_all(field.as_bytes())?;
        }
    }
    writer.write_all(b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rollcall_types::SessionKey;

    fn record(id: u64, subject: &str) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id: "21CS042".parse().unwrap(),
            session: SessionKey::new(subject, "P1").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 5, 7).unwrap(),
        }
    }

    #[test]
    fn header_only_for_empty_ledger() {
        let records: Vec<AttendanceRecord> = Vec::new();
        let mut out = Vec::new();
        let rows = export_csv(&records, &mut out).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "ID,RegNo,Subject,Period,Date,Time\r\n");
    }

    #[test]
    fn rows_follow_header() {
        let records = vec![record(1, "CS101"), record(2, "MA201")];
        let mut out = Vec::new();
        assert_eq!(export_csv(&records, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[1], "1,21CS042,CS101,P1,2024-03-01,09:05:07");
        assert_eq!(lines[2], "2,21CS042,MA201,P1,2024-03-01,09:05:07");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let records = vec![record(7, "Data, \"Structures\"")];
        let mut out = Vec::new();
        export_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("7,21CS042,\"Data, \"\"Structures\"\"\",P1,"));
    }
}
