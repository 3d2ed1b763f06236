//! Decoder for JPEG 2000 style box streams.
//!
//! The [`Decoder`] walks nested, length-prefixed boxes, dispatches each box
//! to a registered [`BoxInterpreter`], validates where boxes appear, and
//! collects a property tree, calibrated [`ImageMetadata`] and a list of
//! structural [`Finding`]s instead of failing on the first malformed box.
//!
//! ```no_run
//! use jp2box::{DecodeOptions, decode_file};
//!
//! let doc = decode_file("image.jp2", &DecodeOptions::default())?;
//! if let Some(x) = doc.metadata.x_sampling_frequency {
//!     println!("horizontal resolution: {} dots/cm", x.to_f64());
//! }
//! for f in doc.all_findings() {
//!     println!("{:?}: {}", f.kind, f.message);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod boxes;
pub mod calibration;
pub mod decoder;
pub mod error;
pub mod known_boxes;
pub mod metadata;
pub mod parser;
pub mod property;
pub mod rational;
pub mod reader;
pub mod registry;
pub mod tree;
pub mod util;

pub use api::{JsonBox, decode_file, hex_range, json_boxes};
pub use boxes::{BoxHeader, BoxKey, FourCC};
pub use decoder::{DecodeOptions, Decoder, Jp2Document};
pub use error::{DecodeError, Finding, FindingKind};
pub use metadata::{ImageMetadata, SamplingFrequencyUnit};
pub use parser::read_box_header;
pub use property::{Property, PropertyValue};
pub use rational::Rational;
pub use reader::BoxReader;
pub use registry::{BoxInterpreter, DecodeContext, Placement, Registry, default_registry};
pub use tree::{BoxNode, BoxTree, NodeId, NodeStatus};
