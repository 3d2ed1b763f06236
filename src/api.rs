use crate::{
    decoder::{DecodeOptions, Decoder, Jp2Document},
    error::Finding,
    known_boxes::KnownBox,
    property::Property,
    tree::{BoxTree, NodeId, NodeStatus},
    util::{hex_dump, read_slice},
};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

/// A JSON-serializable representation of a single decoded box.
///
/// Mirrors one [`BoxNode`](crate::tree::BoxNode) with its geometry resolved
/// and its children nested in place.
#[derive(Serialize)]
pub struct JsonBox {
    /// Absolute byte offset of this box in the file
    pub offset: u64,
    /// Declared total size, 0 when the box runs to the end of its parent
    pub size: u64,
    /// 8 for plain boxes, 16 with an extended length, +16 for `uuid`
    pub header_size: u64,
    /// Absolute offset where the body starts (None for superboxes)
    pub payload_offset: Option<u64>,
    /// Declared body length (None for superboxes and run-to-end boxes)
    pub payload_size: Option<u64>,

    /// Four-character box type (e.g. "jp2h", "resc")
    pub typ: String,
    /// Extended type of `uuid` boxes, lowercase hex
    pub uuid: Option<String>,
    /// Human-readable box type name (e.g. "Capture Resolution Box")
    pub full_name: String,
    /// "superbox", "decoded", "opaque", "rejected" or "truncated"
    pub kind: String,
    pub status: NodeStatus,
    pub properties: Vec<Property>,
    pub findings: Vec<Finding>,
    /// Child boxes for superboxes
    pub children: Option<Vec<JsonBox>>,
}

/// Decode a file from disk.
///
/// ```no_run
/// use jp2box::{DecodeOptions, decode_file};
///
/// let doc = decode_file("image.jp2", &DecodeOptions::default())?;
/// println!("{} boxes, conformant: {}", doc.tree.len(), doc.is_conformant());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn decode_file(path: impl AsRef<Path>, options: &DecodeOptions) -> anyhow::Result<Jp2Document> {
    let f = File::open(path.as_ref())?;
    let mut r = BufReader::new(f);
    let doc = Decoder::new().options(options.clone()).decode(&mut r)?;
    Ok(doc)
}

/// Nested JSON view of the top-level boxes of a decoded document.
pub fn json_boxes(doc: &Jp2Document) -> Vec<JsonBox> {
    doc.tree
        .roots()
        .iter()
        .map(|id| build_box(&doc.tree, *id))
        .collect()
}

fn kind_str(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Superbox => "superbox",
        NodeStatus::Decoded => "decoded",
        NodeStatus::Opaque => "opaque",
        NodeStatus::Rejected(_) => "rejected",
        NodeStatus::Truncated => "truncated",
    }
}

fn build_box(tree: &BoxTree, id: NodeId) -> JsonBox {
    let node = tree.get(id);
    let hdr = &node.header;

    let (payload_offset, payload_size, children) = if node.status == NodeStatus::Superbox
        || (node.status == NodeStatus::Truncated && !node.children.is_empty())
    {
        let kids = node.children.iter().map(|c| build_box(tree, *c)).collect();
        (None, None, Some(kids))
    } else {
        (Some(hdr.body_start()), hdr.declared_body_len(), None)
    };

    JsonBox {
        offset: hdr.start,
        size: hdr.size,
        header_size: hdr.header_size,
        payload_offset,
        payload_size,

        typ: hdr.typ.to_string(),
        uuid: hdr.uuid.map(hex::encode),
        full_name: KnownBox::from(hdr.typ).full_name().to_string(),
        kind: kind_str(node.status).to_string(),
        status: node.status,
        properties: node.properties.clone(),
        findings: node.findings.clone(),
        children,
    }
}

/// Result of a hex dump operation containing the formatted hex output.
#[derive(Serialize)]
pub struct HexDump {
    /// Starting offset of the dumped data
    pub offset: u64,
    /// Actual number of bytes that were read and dumped
    pub length: u64,
    /// Formatted hex dump string with addresses and ASCII representation
    pub hex: String,
}

/// Hex-dump a range of bytes, clamped to `size`.
///
/// If `offset + max_len` goes beyond `size` the returned length is smaller
/// than `max_len`.
pub fn hex_range<R: Read + Seek>(r: &mut R, size: u64, offset: u64, max_len: u64) -> anyhow::Result<HexDump> {
    let to_read = size.saturating_sub(offset).min(max_len);

    if to_read == 0 {
        return Ok(HexDump {
            offset,
            length: 0,
            hex: String::new(),
        });
    }

    let data = read_slice(r, offset, to_read)?;
    Ok(HexDump {
        offset,
        length: to_read,
        hex: hex_dump(&data, offset),
    })
}
