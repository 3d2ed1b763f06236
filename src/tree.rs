use crate::boxes::BoxHeader;
use crate::error::{Finding, FindingKind};
use crate::property::Property;
use serde::Serialize;

/// Handle to a node in a [`BoxTree`]. Parents are referenced by handle, not ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeStatus {
    /// Body is a sequence of child boxes.
    Superbox,
    /// An interpreter consumed exactly the declared body.
    Decoded,
    /// No interpreter registered; body skipped.
    Opaque,
    /// Box was skipped because of a recoverable error.
    Rejected(FindingKind),
    /// Stream ended inside this box.
    Truncated,
}

/// One decoded box.
#[derive(Debug, Clone)]
pub struct BoxNode {
    pub header: BoxHeader,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub status: NodeStatus,
    pub properties: Vec<Property>,
    /// Problems found in this box or in its direct children.
    pub findings: Vec<Finding>,
}

impl BoxNode {
    pub fn is_decoded(&self) -> bool {
        self.status == NodeStatus::Decoded
    }

    pub fn has_inconsistency(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Arena holding every box of one file, in stream order.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
    roots: Vec<NodeId>,
}

impl BoxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (or at the top level) and return its handle.
    pub fn push(&mut self, header: BoxHeader, parent: Option<NodeId>, status: NodeStatus) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BoxNode {
            header,
            parent,
            children: Vec::new(),
            status,
            properties: Vec::new(),
            findings: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: NodeId) -> &BoxNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut BoxNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<&BoxNode> {
        self.get(id).parent.map(|p| self.get(p))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &BoxNode> {
        self.get(id).children.iter().map(|c| self.get(*c))
    }

    /// Every node in stream order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BoxNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node of the given type, in stream order.
    pub fn find(&self, typ: crate::FourCC) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.header.typ == typ).map(|(id, _)| id)
    }

    /// Absolute end of a box, resolving run-to-parent-end lengths up the tree.
    /// Saturates at `u64::MAX` for lengths that overflow.
    pub fn end_of(&self, id: NodeId, stream_len: u64) -> u64 {
        let node = self.get(id);
        let parent_end = match node.parent {
            Some(p) => self.end_of(p, stream_len),
            None => stream_len,
        };
        node.header.end(parent_end).unwrap_or(u64::MAX)
    }

    /// Dotted path of box types from the top level, e.g. `jp2h.res .resc`.
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = vec![self.get(id).header.typ.to_string()];
        let mut cur = self.get(id).parent;
        while let Some(p) = cur {
            parts.push(self.get(p).header.typ.to_string());
            cur = self.get(p).parent;
        }
        parts.reverse();
        parts.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FourCC;

    fn hdr(typ: &[u8; 4], start: u64) -> BoxHeader {
        BoxHeader {
            size: 8,
            typ: FourCC(*typ),
            uuid: None,
            header_size: 8,
            start,
        }
    }

    #[test]
    fn parent_links_are_handles() {
        let mut t = BoxTree::new();
        let jp2h = t.push(hdr(b"jp2h", 0), None, NodeStatus::Superbox);
        let res = t.push(hdr(b"res ", 8), Some(jp2h), NodeStatus::Superbox);
        let resc = t.push(hdr(b"resc", 16), Some(res), NodeStatus::Decoded);

        assert_eq!(t.roots(), &[jp2h]);
        assert_eq!(t.parent(resc).unwrap().header.typ, FourCC(*b"res "));
        assert!(t.parent(jp2h).is_none());
        assert_eq!(t.children(jp2h).count(), 1);
        assert_eq!(t.path(resc), "jp2h.res .resc");
        assert_eq!(t.find(FourCC(*b"resc")), Some(resc));
        assert_eq!(t.len(), 3);
        assert_eq!(t.end_of(resc, 100), 24);
    }

    #[test]
    fn end_of_resolves_sentinel_through_parents() {
        let mut t = BoxTree::new();
        let asoc = t.push(BoxHeader { size: 40, ..hdr(b"asoc", 10) }, None, NodeStatus::Superbox);
        let inner = t.push(BoxHeader { size: 0, ..hdr(b"xml ", 18) }, Some(asoc), NodeStatus::Opaque);
        assert_eq!(t.end_of(inner, 1000), 50);
    }

    #[test]
    fn end_of_saturates_on_overflowing_length() {
        let mut t = BoxTree::new();
        let id = t.push(BoxHeader { size: u64::MAX, ..hdr(b"jp2c", 12) }, None, NodeStatus::Rejected(FindingKind::StructuralMismatch));
        assert_eq!(t.end_of(id, 100), u64::MAX);
    }
}
