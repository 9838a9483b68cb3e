//! Document identifiers.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of an identifier in bytes.
pub const OBJECT_ID_SIZE: usize = 12;

/// Per-process random bytes mixed into every identifier.
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Counter seeded randomly once per process.
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// A 12-byte document identifier, rendered as 24 lowercase hex characters.
///
/// Layout: `[seconds (4 bytes, big-endian)][process unique (5)][counter (3)]`,
/// so identifiers sort by creation time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_SIZE]);

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        let seconds = (current_millis() / 1000) as u32;
        let process = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>()))
            .fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; OBJECT_ID_SIZE];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; OBJECT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Decode from a byte slice (e.g. a sled key).
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; OBJECT_ID_SIZE] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Parse the 24-hex form. Only lowercase hex is accepted.
    pub fn parse_str(s: &str) -> Result<Self, Error> {
        let lowercase_hex = s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if s.len() != OBJECT_ID_SIZE * 2 || !lowercase_hex {
            return Err(Error::InvalidObjectId(s.to_string()));
        }
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn bytes(&self) -> [u8; OBJECT_ID_SIZE] {
        self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.0[..4]);
        u32::from_be_bytes(buf)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let id = ObjectId::new();
        let hex = id.to_hex();

        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(ObjectId::parse_str(&hex).unwrap(), id);
        assert_eq!(hex.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let a = ObjectId::new();
        let b = ObjectId::new();

        assert_ne!(a, b);
        assert!(a.timestamp() <= b.timestamp());
        assert!(a.timestamp() > 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ObjectId::parse_str("abc").is_err());
        assert!(ObjectId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(matches!(
            ObjectId::parse_str("0123456789abcdef0123456"),
            Err(Error::InvalidObjectId(_))
        ));
    }

    #[test]
    fn test_parse_agrees_with_id_pattern() {
        let pattern = regex::Regex::new(crate::schema::vocab::OBJECT_ID_PATTERN).unwrap();
        let hex = "0123456789abcdef01234567";
        let upper = hex.to_uppercase();

        assert!(pattern.is_match(hex) && ObjectId::parse_str(hex).is_ok());
        assert!(!pattern.is_match(&upper));
        assert!(matches!(ObjectId::parse_str(&upper), Err(Error::InvalidObjectId(_))));
    }

    #[test]
    fn test_from_slice() {
        let id = ObjectId::new();
        assert_eq!(ObjectId::from_slice(&id.bytes()), Some(id));
        assert_eq!(ObjectId::from_slice(&[1, 2, 3]), None);
    }

    #[test]
    fn test_display_and_debug() {
        let id = ObjectId::from_bytes([0xab; OBJECT_ID_SIZE]);
        assert_eq!(id.to_string(), "abababababababababababab");
        assert_eq!(format!("{:?}", id), "ObjectId(abababababababababababab)");
    }
}
