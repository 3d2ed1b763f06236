//! The box-tree walker.
//!
//! A [`Decoder`] walks a box stream front to back. For every box it reads the
//! header, then either descends into it (superboxes), hands the body to the
//! registered [`BoxInterpreter`](crate::registry::BoxInterpreter), or skips it
//! as opaque. Recoverable errors become [`Finding`]s on the enclosing box and
//! the walk resumes at the end of the offending box, so one bad box never
//! hides its siblings. Only running out of stream aborts the walk.

use crate::boxes::{BoxHeader, FourCC};
use crate::error::{DecodeError, Finding, FindingKind, Result};
use crate::known_boxes::KnownBox;
use crate::metadata::ImageMetadata;
use crate::parser::{MIN_HEADER_SIZE, read_box_header};
use crate::property::Property;
use crate::reader::BoxReader;
use crate::registry::{DecodeContext, Registry, default_registry};
use crate::tree::{BoxTree, NodeId, NodeStatus};
use std::io::{Cursor, Read, Seek};

/// Tuning knobs for one decode.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Superboxes nested deeper than this are recorded as opaque.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { max_depth: 32 }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Everything produced by decoding one file.
#[derive(Debug, Clone, Default)]
pub struct Jp2Document {
    pub tree: BoxTree,
    /// Module-wide flat property collection.
    pub properties: Vec<Property>,
    pub metadata: ImageMetadata,
    /// Findings about top-level boxes and the stream itself.
    pub findings: Vec<Finding>,
    /// The stream ended before a declared box end.
    pub truncated: bool,
}

impl Jp2Document {
    /// Document findings followed by every node's findings, in stream order.
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .chain(self.tree.iter().flat_map(|(_, n)| n.findings.iter()))
    }

    pub fn is_conformant(&self) -> bool {
        self.all_findings().next().is_none()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        crate::property::find(&self.properties, name)
    }
}

/// Decodes box streams with a fixed registry and options.
pub struct Decoder {
    registry: Registry,
    options: DecodeOptions,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Decoder using [`default_registry`].
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Decoder {
            registry,
            options: DecodeOptions::default(),
        }
    }

    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode the whole stream starting at its current position.
    ///
    /// Structural problems are reported in the returned document. An `Err`
    /// means the underlying I/O failed.
    pub fn decode<R: Read + Seek>(&self, r: &mut R) -> Result<Jp2Document> {
        let reader = BoxReader::new(r)?;
        let end = reader.len();
        let mut walker = Walker {
            reader,
            registry: &self.registry,
            options: &self.options,
            doc: Jp2Document::default(),
        };

        match walker.walk(None, end, 0) {
            Ok(()) => {}
            Err(e @ DecodeError::TruncatedStream { .. }) => {
                log::warn!("{}", e);
                let offset = walker.reader.position();
                walker.doc.truncated = true;
                walker
                    .doc
                    .findings
                    .push(Finding::from_error(&e, None, offset));
            }
            Err(e) => return Err(e),
        }
        Ok(walker.doc)
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Jp2Document> {
        self.decode(&mut Cursor::new(bytes))
    }
}

struct Walker<'r, 'a> {
    reader: BoxReader<'a>,
    registry: &'r Registry,
    options: &'r DecodeOptions,
    doc: Jp2Document,
}

impl Walker<'_, '_> {
    fn parent_type(&self, parent: Option<NodeId>) -> Option<FourCC> {
        parent.map(|p| self.doc.tree.get(p).header.typ)
    }

    /// Attach a finding to `parent`, or to the document at the top level.
    fn attach(&mut self, parent: Option<NodeId>, finding: Finding) {
        log::warn!("{} at offset {}: {}", kind_label(finding.kind), finding.offset, finding.message);
        match parent {
            Some(p) => self.doc.tree.get_mut(p).findings.push(finding),
            None => self.doc.findings.push(finding),
        }
    }

    fn reject(&mut self, header: BoxHeader, parent: Option<NodeId>, err: DecodeError) {
        let finding = Finding::from_error(&err, Some(header.typ), header.start);
        let kind = finding.kind;
        self.attach(parent, finding);
        self.doc.tree.push(header, parent, NodeStatus::Rejected(kind));
    }

    /// Decode the boxes between the current position and `end` as children of `parent`.
    fn walk(&mut self, parent: Option<NodeId>, end: u64, depth: usize) -> Result<()> {
        let parent_type = self.parent_type(parent);

        while self.reader.position() < end {
            let pos = self.reader.position();

            if end - pos < MIN_HEADER_SIZE {
                self.attach(
                    parent,
                    Finding::new(
                        FindingKind::StructuralMismatch,
                        parent_type,
                        pos,
                        format!("{} trailing bytes cannot hold a box header", end - pos),
                    ),
                );
                self.reader.skip_to(end)?;
                break;
            }

            // top-level headers may only run into the end of the stream
            let bound = if parent.is_some() { end } else { u64::MAX };
            let header = match self.reader.bounded(bound, read_box_header) {
                Ok(h) => h,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // without a usable length the rest of the span is lost
                    self.attach(parent, Finding::from_error(&e, parent_type, pos));
                    self.reader.skip_to(end)?;
                    break;
                }
            };

            let Some(box_end) = header.end(end) else {
                let err = DecodeError::InvalidSize {
                    offset: header.start,
                    size: header.size,
                };
                self.reject(header, parent, err);
                self.reader.skip_to(end)?;
                break;
            };
            if box_end > self.reader.len() {
                let err = DecodeError::TruncatedStream {
                    offset: header.start,
                    needed: box_end - header.start,
                    stream_len: self.reader.len(),
                };
                self.doc.tree.push(header, parent, NodeStatus::Truncated);
                return Err(err);
            }
            if box_end > end {
                let finding = Finding::new(
                    FindingKind::StructuralMismatch,
                    Some(header.typ),
                    header.start,
                    format!(
                        "'{}' box at offset {} ends at {}, beyond its parent's end {}",
                        header.typ, header.start, box_end, end
                    ),
                );
                self.attach(parent, finding);
                self.doc
                    .tree
                    .push(header, parent, NodeStatus::Rejected(FindingKind::StructuralMismatch));
                self.reader.skip_to(end)?;
                break;
            }

            if KnownBox::from(header.typ).is_superbox() {
                self.superbox(header, parent, box_end, depth)?;
            } else {
                self.leaf(header, parent, parent_type, box_end)?;
            }
        }
        Ok(())
    }

    fn superbox(&mut self, header: BoxHeader, parent: Option<NodeId>, box_end: u64, depth: usize) -> Result<()> {
        let typ = header.typ;
        let start = header.start;

        if depth >= self.options.max_depth {
            self.attach(
                parent,
                Finding::new(
                    FindingKind::StructuralMismatch,
                    Some(typ),
                    start,
                    format!("'{}' superbox nested deeper than {} levels, not descended", typ, self.options.max_depth),
                ),
            );
            self.doc.tree.push(header, parent, NodeStatus::Opaque);
            return self.reader.skip_to(box_end);
        }

        let id = self.doc.tree.push(header, parent, NodeStatus::Superbox);
        log::debug!("enter superbox '{}' at {} (depth {})", typ, start, depth);

        match self.walk(Some(id), box_end, depth + 1) {
            Ok(()) => {
                log::debug!("leave superbox '{}' at {}", typ, self.reader.position());
                Ok(())
            }
            Err(e @ DecodeError::TruncatedStream { .. }) => {
                self.doc.tree.get_mut(id).status = NodeStatus::Truncated;
                self.attach(
                    parent,
                    Finding::new(
                        FindingKind::StructuralMismatch,
                        Some(typ),
                        start,
                        format!("'{}' superbox ends prematurely: {}", typ, e),
                    ),
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn leaf(
        &mut self,
        header: BoxHeader,
        parent: Option<NodeId>,
        parent_type: Option<FourCC>,
        box_end: u64,
    ) -> Result<()> {
        let registry = self.registry;
        let key = header.key();

        let Some(interp) = registry.get(&key) else {
            log::debug!(
                "no interpreter for '{}' at {}, skipping {} bytes",
                header.typ,
                header.start,
                box_end - header.body_start()
            );
            self.doc.tree.push(header, parent, NodeStatus::Opaque);
            return self.reader.skip_to(box_end);
        };

        if let Err(e) = interp.check_context(&header, parent_type) {
            self.reject(header, parent, e);
            return self.reader.skip_to(box_end);
        }

        log::trace!("decoding '{}' with {:?}", header.typ, registry.name(&key));
        let snapshot = self.doc.metadata.clone();
        let typ = header.typ;
        // a run-to-end leaf owns everything up to its parent's end
        let declared = header
            .declared_body_len()
            .unwrap_or_else(|| box_end.saturating_sub(header.body_start()));

        let outcome = {
            let mut ctx = DecodeContext::new(&header, parent_type, &mut self.doc.metadata);
            self.reader
                .bounded(box_end, |r| {
                    r.mark_start();
                    interp.decode(r, &mut ctx)?;
                    r.finalize(typ, Some(declared))
                })
                .map(|consumed| (consumed, ctx.into_parts()))
        };

        match outcome {
            Ok((consumed, (props, module_props, findings))) => {
                log::trace!("'{}' consumed {} bytes", typ, consumed);
                let id = self.doc.tree.push(header, parent, NodeStatus::Decoded);
                let node = self.doc.tree.get_mut(id);
                node.properties = props;
                node.findings = findings;
                self.doc.properties.extend(module_props);
                self.reader.skip_to(box_end)
            }
            Err(e) if e.is_fatal() => {
                self.doc.metadata = snapshot;
                self.doc.tree.push(header, parent, NodeStatus::Truncated);
                Err(e)
            }
            Err(e) => {
                self.doc.metadata = snapshot;
                self.reject(header, parent, e);
                self.reader.skip_to(box_end)
            }
        }
    }
}

fn kind_label(kind: FindingKind) -> &'static str {
    match kind {
        FindingKind::WrongContext => "wrong context",
        FindingKind::StructuralMismatch => "structural mismatch",
        FindingKind::TruncatedStream => "truncated stream",
        FindingKind::InvalidValue => "invalid value",
    }
}
