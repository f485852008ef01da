use crate::errors::{ErrorKind, LutraError, LutraResult};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::RngCore;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

/// Random bytes identifying this process, shared by all ids it generates.
static PROCESS_RANDOM: Lazy<[u8; 5]> = Lazy::new(|| {
    let mut bytes = [0u8; 5];
    OsRng.fill_bytes(&mut bytes);
    bytes
});

/// Monotonic increment, seeded randomly so restarts do not collide.
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(OsRng.next_u32()));

static INVALID_LENGTH_ERROR: Lazy<LutraError> = Lazy::new(|| {
    LutraError::new(
        "ObjectId validation error: id must be a 24 character hex string",
        ErrorKind::InvalidId,
    )
});

static INVALID_HEX_ERROR: Lazy<LutraError> = Lazy::new(|| {
    LutraError::new(
        "ObjectId validation error: id contains non-hex characters",
        ErrorKind::InvalidId,
    )
});

/// A unique identifier for documents, rendered as 24 hexadecimal characters.
///
/// Each document in a collection is identified by the `ObjectId` stored in its
/// `_id` field. Ids are either supplied by the caller (as a 24-hex string) or
/// generated on insertion.
///
/// # Layout
///
/// The id packs 12 bytes: a 4-byte big-endian creation timestamp (UNIX
/// seconds), 5 process-random bytes, and a 3-byte big-endian increment seeded
/// randomly at process start. Generated ids therefore sort roughly by
/// creation time, and the creation instant is recoverable via
/// [ObjectId::timestamp].
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a new `ObjectId` stamped with the current time.
    pub fn new() -> Self {
        ObjectId::with_timestamp(Utc::now().timestamp() as u32)
    }

    /// Creates an `ObjectId` seeded with the given creation timestamp
    /// (UNIX seconds). The remaining bytes are generated as usual.
    pub fn from_timestamp(timestamp: u32) -> Self {
        ObjectId::with_timestamp(timestamp)
    }

    fn with_timestamp(timestamp: u32) -> Self {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_RANDOM);
        let count = COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }

    /// Parses an `ObjectId` from its 24-character hex representation.
    ///
    /// # Errors
    ///
    /// Returns an [ErrorKind::InvalidId] error if the string is not exactly
    /// 24 characters or contains non-hex characters.
    pub fn parse_str(hex: &str) -> LutraResult<ObjectId> {
        if hex.len() != 24 {
            log::error!("Invalid ObjectId length: {}", hex.len());
            return Err(INVALID_LENGTH_ERROR.clone());
        }

        let mut bytes = [0u8; 12];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| INVALID_HEX_ERROR.clone())?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| INVALID_HEX_ERROR.clone())?;
        }
        Ok(ObjectId { bytes })
    }

    /// The 24-character hexadecimal form of this id.
    pub fn value_of(&self) -> String {
        let mut hex = String::with_capacity(24);
        for byte in &self.bytes {
            hex.push_str(&format!("{:02x}", byte));
        }
        hex
    }

    /// The embedded creation timestamp, in UNIX seconds.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value_of())
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.value_of())
    }
}
