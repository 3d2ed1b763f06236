use crate::boxes::{BoxHeader, BoxKey, FourCC};
use crate::calibration::{AxisResolution, per_meter_to_per_cm};
use crate::error::{DecodeError, Finding, Result};
use crate::metadata::{ImageMetadata, SamplingFrequencyUnit};
use crate::property::{Property, PropertyBuilder};
use crate::reader::BoxReader;
use std::collections::HashMap;

pub const SIGNATURE: FourCC = FourCC(*b"jP  ");
pub const FILE_TYPE: FourCC = FourCC(*b"ftyp");
pub const JP2_HEADER: FourCC = FourCC(*b"jp2h");
pub const IMAGE_HEADER: FourCC = FourCC(*b"ihdr");
pub const RESOLUTION: FourCC = FourCC(*b"res ");
pub const CAPTURE_RESOLUTION: FourCC = FourCC(*b"resc");
pub const DISPLAY_RESOLUTION: FourCC = FourCC(*b"resd");

/// Where a box type may legally appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Anywhere,
    TopLevel,
    /// Only as a direct child of one of these superboxes.
    Within(&'static [FourCC]),
}

impl Placement {
    pub fn permits(&self, parent: Option<FourCC>) -> bool {
        match (self, parent) {
            (Placement::Anywhere, _) => true,
            (Placement::TopLevel, None) => true,
            (Placement::Within(types), Some(p)) => types.contains(&p),
            _ => false,
        }
    }
}

/// Everything an interpreter may touch while decoding one box body.
///
/// Properties and findings are staged here and only committed by the walker
/// once the box has been closed with the right byte count.
pub struct DecodeContext<'a> {
    pub header: &'a BoxHeader,
    pub parent: Option<FourCC>,
    pub metadata: &'a mut ImageMetadata,
    properties: Vec<Property>,
    module_properties: Vec<Property>,
    findings: Vec<Finding>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(header: &'a BoxHeader, parent: Option<FourCC>, metadata: &'a mut ImageMetadata) -> Self {
        DecodeContext {
            header,
            parent,
            metadata,
            properties: Vec::new(),
            module_properties: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Attach a property to this box's own tree.
    pub fn add_property(&mut self, p: Property) {
        self.properties.push(p);
    }

    /// Attach a property to the module-wide flat collection.
    pub fn add_module_property(&mut self, p: Property) {
        self.module_properties.push(p);
    }

    /// Record a recoverable problem without abandoning the box.
    pub fn report(&mut self, err: DecodeError) {
        log::warn!("'{}' at {}: {}", self.header.typ, self.header.start, err);
        self.findings
            .push(Finding::from_error(&err, Some(self.header.typ), self.header.start));
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn module_properties(&self) -> &[Property] {
        &self.module_properties
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub(crate) fn into_parts(self) -> (Vec<Property>, Vec<Property>, Vec<Finding>) {
        (self.properties, self.module_properties, self.findings)
    }
}

/// Decoder for the body of one box type.
///
/// The reader is positioned at the first body byte and confined to the
/// box's declared end. The walker checks [`BoxInterpreter::placement`]
/// before calling [`BoxInterpreter::decode`] and checks the consumed byte
/// count afterwards.
pub trait BoxInterpreter: Send + Sync {
    fn placement(&self) -> Placement {
        Placement::Anywhere
    }

    /// Reject the box with `WrongContext` when its parent is not permitted.
    fn check_context(&self, header: &BoxHeader, parent: Option<FourCC>) -> Result<()> {
        if self.placement().permits(parent) {
            Ok(())
        } else {
            Err(DecodeError::WrongContext {
                box_type: header.typ,
                parent,
                offset: header.start,
            })
        }
    }

    fn decode(&self, r: &mut BoxReader<'_>, ctx: &mut DecodeContext<'_>) -> Result<()>;
}

/// Registry of interpreters keyed by `BoxKey` (4CC or UUID).
///
/// The registry is immutable once constructed; use [`Registry::with_interpreter`]
/// to build it fluently.
pub struct Registry {
    map: HashMap<BoxKey, InterpreterEntry>,
}

struct InterpreterEntry {
    inner: Box<dyn BoxInterpreter>,
    name: String,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given interpreter added.
    ///
    /// `name` is human-readable and used only for logging.
    pub fn with_interpreter(mut self, key: BoxKey, name: &str, interp: Box<dyn BoxInterpreter>) -> Self {
        self.map.insert(
            key,
            InterpreterEntry {
                inner: interp,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn get(&self, key: &BoxKey) -> Option<&dyn BoxInterpreter> {
        self.map.get(key).map(|e| e.inner.as_ref())
    }

    pub fn name(&self, key: &BoxKey) -> Option<&str> {
        self.map.get(key).map(|e| e.name.as_str())
    }

    pub fn contains(&self, key: &BoxKey) -> bool {
        self.map.contains_key(key)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------- Interpreters ----------

// jP\040\040: fixed 4-byte signature
pub struct SignatureInterpreter;

const SIGNATURE_MAGIC: u32 = 0x0D0A_870A;

impl BoxInterpreter for SignatureInterpreter {
    fn placement(&self) -> Placement {
        Placement::TopLevel
    }

    fn decode(&self, r: &mut BoxReader<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
        let magic = r.read_u32()?;
        if magic != SIGNATURE_MAGIC {
            ctx.report(DecodeError::InvalidValue(format!(
                "signature 0x{:08x}, expected 0x{:08x}",
                magic, SIGNATURE_MAGIC
            )));
        }
        ctx.add_property(Property::integer("Signature", magic));
        Ok(())
    }
}

// ftyp: brand + minor version + compatibility list
pub struct FileTypeInterpreter;

impl BoxInterpreter for FileTypeInterpreter {
    fn placement(&self) -> Placement {
        Placement::TopLevel
    }

    fn decode(&self, r: &mut BoxReader<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
        let mut brand = [0u8; 4];
        r.read_exact(&mut brand)?;
        let minor = r.read_u32()?;

        let mut compat = PropertyBuilder::new();
        while r.remaining() >= 4 {
            let mut cl = [0u8; 4];
            r.read_exact(&mut cl)?;
            compat = compat.string("Compatibility", FourCC(cl).to_string());
        }

        let brand = FourCC(brand).to_string();
        ctx.add_property(Property::string("Brand", brand.clone()));
        ctx.add_property(Property::integer("MinorVersion", minor));
        ctx.add_property(compat.into_list("CompatibilityList"));
        ctx.add_module_property(Property::string("Brand", brand));
        Ok(())
    }
}

// ihdr: image geometry, written through to the image metadata
pub struct ImageHeaderInterpreter;

const BPC_VARIES: u8 = 0xFF;
const COMPRESSION_JPEG2000: u8 = 7;

impl BoxInterpreter for ImageHeaderInterpreter {
    fn placement(&self) -> Placement {
        Placement::Within(&[JP2_HEADER])
    }

    fn decode(&self, r: &mut BoxReader<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
        let height = r.read_u32()?;
        let width = r.read_u32()?;
        let nc = r.read_u16()?;
        let bpc = r.read_u8()?;
        let compression = r.read_u8()?;
        let unk_c = r.read_u8()?;
        let ipr = r.read_u8()?;

        if compression != COMPRESSION_JPEG2000 {
            ctx.report(DecodeError::InvalidValue(format!(
                "compression type {}, expected {}",
                compression, COMPRESSION_JPEG2000
            )));
        }

        let props = PropertyBuilder::new()
            .integer("Height", height)
            .integer("Width", width)
            .integer("NumberOfComponents", nc)
            .integer("BitsPerComponent", bpc)
            .integer("CompressionType", compression)
            .integer("ColorspaceUnknown", unk_c)
            .integer("IntellectualPropertyRights", ipr)
            .build();
        for p in props {
            ctx.add_property(p);
        }

        let m = &mut *ctx.metadata;
        m.image_width = Some(width);
        m.image_length = Some(height);
        m.samples_per_pixel = Some(nc);
        if bpc != BPC_VARIES {
            // low 7 bits hold depth - 1, high bit is the sign flag
            m.bits_per_sample = Some((bpc & 0x7F) + 1);
        }
        Ok(())
    }
}

// resc / resd: vertical and horizontal grid resolution
pub struct ResolutionInterpreter {
    property: &'static str,
    calibrate: bool,
}

impl ResolutionInterpreter {
    /// Capture resolution: also sets the sampling frequencies.
    pub fn capture() -> Self {
        ResolutionInterpreter {
            property: "CaptureResolution",
            calibrate: true,
        }
    }

    pub fn display() -> Self {
        ResolutionInterpreter {
            property: "DefaultDisplayResolution",
            calibrate: false,
        }
    }
}

fn axis_property(name: &str, axis: &AxisResolution) -> Property {
    PropertyBuilder::new()
        .integer("Numerator", axis.numerator)
        .integer("Denominator", axis.denominator)
        .integer("Exponent", axis.exponent)
        .into_list(name)
}

impl BoxInterpreter for ResolutionInterpreter {
    fn placement(&self) -> Placement {
        Placement::Within(&[RESOLUTION])
    }

    fn decode(&self, r: &mut BoxReader<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
        let v_num = r.read_u16()?;
        let v_den = r.read_u16()?;
        let h_num = r.read_u16()?;
        let h_den = r.read_u16()?;
        let v_exp = r.read_u8()?;
        let h_exp = r.read_u8()?;

        let vert = AxisResolution {
            numerator: v_num,
            denominator: v_den,
            exponent: v_exp,
        };
        let horiz = AxisResolution {
            numerator: h_num,
            denominator: h_den,
            exponent: h_exp,
        };

        let prop = PropertyBuilder::new()
            .push(axis_property("HorizResolution", &horiz))
            .push(axis_property("VertResolution", &vert))
            .into_array(self.property);
        ctx.add_property(prop.clone());
        ctx.add_module_property(prop);

        if !self.calibrate {
            return Ok(());
        }

        let mut calibrated = false;
        match per_meter_to_per_cm(vert) {
            Ok(y) => {
                ctx.metadata.y_sampling_frequency = Some(y);
                calibrated = true;
            }
            Err(e) => ctx.report(e),
        }
        match per_meter_to_per_cm(horiz) {
            Ok(x) => {
                ctx.metadata.x_sampling_frequency = Some(x);
                calibrated = true;
            }
            Err(e) => ctx.report(e),
        }
        if calibrated {
            ctx.metadata.sampling_frequency_unit = Some(SamplingFrequencyUnit::Centimeter);
        }
        Ok(())
    }
}

/// Registry with every interpreter this crate ships.
pub fn default_registry() -> Registry {
    Registry::new()
        .with_interpreter(BoxKey::FourCC(SIGNATURE), "signature", Box::new(SignatureInterpreter))
        .with_interpreter(BoxKey::FourCC(FILE_TYPE), "ftyp", Box::new(FileTypeInterpreter))
        .with_interpreter(BoxKey::FourCC(IMAGE_HEADER), "ihdr", Box::new(ImageHeaderInterpreter))
        .with_interpreter(
            BoxKey::FourCC(CAPTURE_RESOLUTION),
            "resc",
            Box::new(ResolutionInterpreter::capture()),
        )
        .with_interpreter(
            BoxKey::FourCC(DISPLAY_RESOLUTION),
            "resd",
            Box::new(ResolutionInterpreter::display()),
        )
}
