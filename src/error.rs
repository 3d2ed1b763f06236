//! Error and finding types for box decoding

use crate::boxes::FourCC;
use serde::Serialize;

/// Errors raised while decoding a box stream.
///
/// Most variants are recoverable: the walker turns them into a [`Finding`]
/// on the enclosing box and carries on with the next sibling. Only the
/// variants for which [`DecodeError::is_fatal`] returns true abort the walk.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{box_type}' box at offset {offset} is not allowed inside {}", parent_label(.parent))]
    WrongContext {
        box_type: FourCC,
        parent: Option<FourCC>,
        offset: u64,
    },

    #[error("'{box_type}' box at offset {offset} declares {declared} body bytes but {consumed} were consumed")]
    StructuralMismatch {
        box_type: FourCC,
        declared: u64,
        consumed: u64,
        offset: u64,
    },

    #[error("read of {requested} bytes at offset {offset} overruns the box body ({remaining} bytes left)")]
    BodyOverrun {
        offset: u64,
        requested: u64,
        remaining: u64,
    },

    #[error("stream ends at {stream_len} but {needed} bytes are needed at offset {offset}")]
    TruncatedStream {
        offset: u64,
        needed: u64,
        stream_len: u64,
    },

    #[error("invalid box size {size} at offset {offset}")]
    InvalidSize { offset: u64, size: u64 },

    #[error("cannot seek backward from {from} to {to}")]
    BackwardSeek { from: u64, to: u64 },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

fn parent_label(parent: &Option<FourCC>) -> String {
    match parent {
        Some(p) => format!("'{}'", p),
        None => "the top level".to_string(),
    }
}

impl DecodeError {
    /// Fatal errors end the walk; everything else becomes a finding.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DecodeError::Io(_) | DecodeError::TruncatedStream { .. } | DecodeError::BackwardSeek { .. }
        )
    }

    pub fn kind(&self) -> FindingKind {
        match self {
            DecodeError::WrongContext { .. } => FindingKind::WrongContext,
            DecodeError::StructuralMismatch { .. }
            | DecodeError::BodyOverrun { .. }
            | DecodeError::InvalidSize { .. }
            | DecodeError::BackwardSeek { .. } => FindingKind::StructuralMismatch,
            DecodeError::TruncatedStream { .. } | DecodeError::Io(_) => FindingKind::TruncatedStream,
            DecodeError::InvalidValue(_) => FindingKind::InvalidValue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FindingKind {
    WrongContext,
    StructuralMismatch,
    TruncatedStream,
    InvalidValue,
}

/// A recoverable problem found while decoding, attached to the nearest
/// enclosing box (or to the document for top-level boxes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub box_type: Option<FourCC>,
    pub offset: u64,
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingKind, box_type: Option<FourCC>, offset: u64, message: impl Into<String>) -> Self {
        Finding {
            kind,
            box_type,
            offset,
            message: message.into(),
        }
    }

    pub fn from_error(err: &DecodeError, box_type: Option<FourCC>, offset: u64) -> Self {
        Finding::new(err.kind(), box_type, offset, err.to_string())
    }
}
