use clap::{ArgAction, Parser};
use jp2box::{DecodeOptions, Finding, FindingKind, ImageMetadata, Jp2Document, decode_file, property::render_tree};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about = "Summarize image metadata from a JPEG 2000 file")]
struct Args {
    /// JP2/JPX file path
    path: String,

    /// Emit JSON instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Summary<'a> {
    file: &'a str,
    conformant: bool,
    truncated: bool,
    boxes: usize,
    metadata: &'a ImageMetadata,
    properties: &'a [jp2box::Property],
    findings: Vec<&'a Finding>,
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

    let doc = decode_file(&args.path, &DecodeOptions::default())?;

    if args.json {
        let summary = Summary {
            file: &args.path,
            conformant: doc.is_conformant(),
            truncated: doc.truncated,
            boxes: doc.tree.len(),
            metadata: &doc.metadata,
            properties: &doc.properties,
            findings: doc.all_findings().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_human(&args.path, &doc);
    }

    Ok(())
}

fn count_kind(doc: &Jp2Document, kind: FindingKind) -> usize {
    doc.all_findings().filter(|f| f.kind == kind).count()
}

fn print_human(path: &str, doc: &Jp2Document) {
    let m = &doc.metadata;
    println!("File: {}", path);
    println!("Boxes: {}", doc.tree.len());

    if let (Some(w), Some(h)) = (m.image_width, m.image_length) {
        println!("Size: {}x{}", w, h);
    }
    if let Some(n) = m.samples_per_pixel {
        println!("Components: {}", n);
    }
    if let Some(b) = m.bits_per_sample {
        println!("Bits per sample: {}", b);
    }
    if let Some(x) = m.x_sampling_frequency {
        println!("X sampling frequency: {} ({:.3})", x, x.to_f64());
    }
    if let Some(y) = m.y_sampling_frequency {
        println!("Y sampling frequency: {} ({:.3})", y, y.to_f64());
    }
    if let Some(u) = m.sampling_frequency_unit {
        println!("Sampling frequency unit: {} ({:?})", u.code(), u);
    }

    if !doc.properties.is_empty() {
        println!("Properties:");
        print!("{}", render_tree(&doc.properties, 1));
    }

    if doc.is_conformant() {
        println!("Findings: (none)");
        return;
    }
    println!(
        "Findings: {} wrong context, {} structural, {} truncation, {} invalid value",
        count_kind(doc, FindingKind::WrongContext),
        count_kind(doc, FindingKind::StructuralMismatch),
        count_kind(doc, FindingKind::TruncatedStream),
        count_kind(doc, FindingKind::InvalidValue),
    );
    for f in doc.all_findings() {
        let typ = f.box_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
        println!("  [{:#x}] {} {:?}: {}", f.offset, typ, f.kind, f.message);
    }
}
