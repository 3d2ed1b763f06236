use clap::{ArgAction, Parser};
use jp2box::{
    DecodeOptions, FourCC, Jp2Document, NodeStatus, decode_file, json_boxes,
    property::render_tree,
    tree::NodeId,
    util::{hex_dump, read_slice},
};
use std::fs::File;

#[derive(Parser, Debug)]
#[command(version, about = "JPEG 2000 box tree explorer")]
struct Args {
    /// JP2/JPX file path
    path: String,

    /// Hex dump the body of boxes of this 4CC (e.g. --raw resc) or uuid:xxxxxxxx...
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Do not descend into superboxes nested deeper than this
    #[arg(long, default_value_t = 32)]
    max_depth: usize,

    /// Bytes to dump with --raw (0 means the entire body)
    #[arg(long, default_value_t = 0)]
    bytes: usize,

    /// Emit JSON instead of human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = DecodeOptions::new().max_depth(args.max_depth);
    let doc = decode_file(&args.path, &options)?;

    // JSON mode: output JSON and exit
    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_boxes(&doc))?);
        return Ok(());
    }

    for id in doc.tree.roots() {
        print_box(&doc, *id, 0);
    }
    for f in &doc.findings {
        println!("! {:?}: {}", f.kind, f.message);
    }
    if doc.truncated {
        println!("! file is truncated");
    }

    if let Some(sel) = args.raw.as_ref() {
        dump_raw(&args.path, &doc, sel, args.bytes)?;
    }

    Ok(())
}

// ---------- Human-readable tree ----------

fn print_box(doc: &Jp2Document, id: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    let node = doc.tree.get(id);
    let hdr = &node.header;

    let status = match node.status {
        NodeStatus::Superbox => "(superbox)".to_string(),
        NodeStatus::Decoded => String::new(),
        NodeStatus::Opaque => "(opaque)".to_string(),
        NodeStatus::Rejected(kind) => format!("(rejected: {:?})", kind),
        NodeStatus::Truncated => "(truncated)".to_string(),
    };
    println!(
        "{indent}{:>6} {:>10} {} {}",
        format!("{:#x}", hdr.start),
        hdr.size,
        display_type(hdr),
        status
    );

    if !node.properties.is_empty() {
        print!("{}", render_tree(&node.properties, depth + 4));
    }
    for f in &node.findings {
        println!("{indent}        ! {:?}: {}", f.kind, f.message);
    }
    for c in &node.children {
        print_box(doc, *c, depth + 1);
    }
}

fn display_type(h: &jp2box::BoxHeader) -> String {
    match h.uuid {
        Some(u) => format!("uuid:{}", hex::encode(u)),
        None => h.typ.to_string(),
    }
}

// ---------- Raw dump ----------

fn matches_selector(h: &jp2box::BoxHeader, sel: &str) -> bool {
    if let Some(prefix) = sel.strip_prefix("uuid:") {
        h.uuid
            .map(|u| hex::encode(u).starts_with(&prefix.to_ascii_lowercase()))
            .unwrap_or(false)
    } else {
        FourCC::from_str(sel).is_some_and(|cc| cc == h.typ && h.uuid.is_none())
    }
}

fn dump_raw(path: &str, doc: &Jp2Document, sel: &str, limit: usize) -> anyhow::Result<()> {
    let mut f = File::open(path)?;
    let file_len = f.metadata()?.len();

    let selected = doc
        .tree
        .iter()
        .filter(|(_, n)| matches_selector(&n.header, sel));
    for (i, (id, node)) in selected.enumerate() {
        let hdr = &node.header;
        let off = hdr.body_start();
        let len = doc.tree.end_of(id, file_len).min(file_len).saturating_sub(off);
        let to_read = if limit == 0 || limit as u64 > len {
            len
        } else {
            limit as u64
        };
        let data = read_slice(&mut f, off, to_read)?;
        println!(
            "\n== Dump {} ({}) body: offset={:#x}, len={} ==",
            i,
            doc.tree.path(id),
            off,
            to_read
        );
        print!("{}", hex_dump(&data, off));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hdr(typ: &[u8; 4], uuid: Option<[u8; 16]>) -> jp2box::BoxHeader {
        jp2box::BoxHeader {
            size: 18,
            typ: FourCC(*typ),
            uuid,
            header_size: 8,
            start: 0,
        }
    }

    #[test]
    fn selector_matches_fourcc() {
        assert!(matches_selector(&hdr(b"resc", None), "resc"));
        assert!(!matches_selector(&hdr(b"resd", None), "resc"));
        assert!(!matches_selector(&hdr(b"resc", None), "res"));
    }

    #[test]
    fn selector_matches_uuid_prefix() {
        let mut u = [0u8; 16];
        u[0] = 0xbe;
        u[1] = 0x7a;
        let h = hdr(b"uuid", Some(u));
        assert!(matches_selector(&h, "uuid:BE7A"));
        assert!(!matches_selector(&h, "uuid:00"));
        assert!(!matches_selector(&h, "uuid"));
    }
}
