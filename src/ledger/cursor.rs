//! Opaque pagination cursor for history queries.
//!
//! A cursor pins the (created_at, seq) position of the last entry the
//! caller has seen; the next page contains strictly older entries. The
//! encoding is deliberately opaque to clients.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Position in the newest-first (created_at desc, seq desc) ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: i64,
    pub seq: i64,
}

impl Cursor {
    /// Strictly-before check in the newest-first ordering.
    pub fn admits(&self, created_at: i64, seq: i64) -> bool {
        (created_at, seq) < (self.created_at, self.seq)
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}:{}", self.created_at, self.seq))
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (created_at, seq) = text.split_once(':')?;
        Some(Self {
            created_at: created_at.parse().ok()?,
            seq: seq.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let c = Cursor {
            created_at: 1_700_000_000_123,
            seq: 42,
        };
        assert_eq!(Cursor::decode(&c.encode()), Some(c));
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert_eq!(Cursor::decode("not base64 !!"), None);
        assert_eq!(
            Cursor::decode(&URL_SAFE_NO_PAD.encode("no-colon-here")),
            None
        );
        assert_eq!(Cursor::decode(&URL_SAFE_NO_PAD.encode("a:b")), None);
    }

    #[test]
    fn test_admits_is_strict() {
        let c = Cursor {
            created_at: 100,
            seq: 5,
        };
        assert!(c.admits(100, 4));
        assert!(c.admits(99, 999));
        assert!(!c.admits(100, 5));
        assert!(!c.admits(100, 6));
        assert!(!c.admits(101, 0));
    }
}
