use serde::{Serialize, Serializer};
use std::fmt;

/// Four-character box type tag, e.g. `jp2h` or `res `.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const UUID: FourCC = FourCC(*b"uuid");

    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

/// Header of one box as read from the stream. Never mutated after the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    /// Total size including the header; 0 means "to the end of the parent".
    pub size: u64,
    pub typ: FourCC,
    /// Extended type, present only for `uuid` boxes.
    pub uuid: Option<[u8; 16]>,
    /// 8, 16, 24 or 32 bytes.
    pub header_size: u64,
    /// Absolute offset of the first header byte.
    pub start: u64,
}

impl BoxHeader {
    /// True when the length field was zero and the box runs to the end of its parent.
    pub fn extends_to_parent_end(&self) -> bool {
        self.size == 0
    }

    pub fn body_start(&self) -> u64 {
        self.start + self.header_size
    }

    /// Absolute end offset, resolving the "to end of parent" sentinel against `parent_end`.
    ///
    /// `None` when a 64-bit length pushes the end past `u64::MAX`.
    pub fn end(&self, parent_end: u64) -> Option<u64> {
        if self.size == 0 {
            Some(parent_end)
        } else {
            self.start.checked_add(self.size)
        }
    }

    /// Declared body length, or `None` for boxes that extend to the end of their parent.
    pub fn declared_body_len(&self) -> Option<u64> {
        if self.size == 0 {
            None
        } else {
            Some(self.size - self.header_size)
        }
    }

    pub fn key(&self) -> BoxKey {
        match self.uuid {
            Some(u) if self.typ == FourCC::UUID => BoxKey::Uuid(u),
            _ => BoxKey::FourCC(self.typ),
        }
    }
}

/// Lookup key for interpreters: plain 4CC or a `uuid` extended type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxKey {
    FourCC(FourCC),
    Uuid([u8; 16]),
}
