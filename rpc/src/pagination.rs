//! Cursor-based pagination for the attendance listing.
//!
//! The cursor is the opaque hex encoding of the last record id on the
//! previous page; the next page starts strictly after it.

use serde::Deserialize;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Cursor from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// The id to resume after: 0 without a cursor, `None` for a garbled one.
    pub fn after_id(&self) -> Option<u64> {
        match self.cursor.as_deref() {
            None | Some("") => Some(0),
            Some(c) => decode_cursor(c),
        }
    }
}

pub fn encode_cursor(last_id: u64) -> String {
    hex::encode(last_id.to_be_bytes())
}

pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes: [u8; 8] = hex::decode(cursor).ok()?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// The cursor for the page after one that ended at `last_id`, or `None` when
/// the page came back short (end of data).
pub fn next_cursor(last_id: Option<u64>, returned: usize, page_size: u32) -> Option<String> {
    if returned < page_size as usize {
        return None;
    }
    last_id.map(encode_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_roundtrip() {
        for id in [0u64, 1, 42, 999, u64::MAX] {
            assert_eq!(decode_cursor(&encode_cursor(id)), Some(id));
        }
    }

    #[test]
    fn garbled_cursor_rejected() {
        let p = PaginationParams {
            cursor: Some("not-hex".into()),
            count: None,
        };
        assert_eq!(p.after_id(), None);
        assert_eq!(decode_cursor("abcd"), None);
    }

    #[test]
    fn missing_cursor_starts_at_beginning() {
        assert_eq!(PaginationParams::default().after_id(), Some(0));
    }

    #[test]
    fn next_cursor_returns_none_at_end() {
        assert!(next_cursor(Some(50), 50, 100).is_none());
    }

    #[test]
    fn next_cursor_points_at_last_id() {
        let c = next_cursor(Some(100), 100, 100).unwrap();
        assert_eq!(decode_cursor(&c), Some(100));
    }

    #[test]
    fn effective_count_clamps() {
        let p = PaginationParams {
            cursor: None,
            count: Some(5000),
        };
        assert_eq!(p.effective_count(), 1000);
        let p = PaginationParams {
            cursor: None,
            count: Some(0),
        };
        assert_eq!(p.effective_count(), 1);
        assert_eq!(PaginationParams::default().effective_count(), 100);
    }
}
