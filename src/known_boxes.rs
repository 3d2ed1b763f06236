use crate::boxes::FourCC;

/// Typed view over JPEG 2000 (Part 1 and the common Part 2) box types.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level
    Signature,
    FileType,
    Jp2Header,
    Codestream,
    IntellectualProperty,
    Xml,
    Uuid,
    UuidInfo,

    // jp2h children
    ImageHeader,
    BitsPerComponent,
    ColourSpecification,
    Palette,
    ComponentMapping,
    ChannelDefinition,
    Resolution,

    // res children
    CaptureResolution,
    DisplayResolution,

    // uinf children
    UuidList,
    DataEntryUrl,

    // JPX superboxes
    CodestreamHeader,
    CompositingLayerHeader,
    ColourGroup,
    FragmentTable,
    Composition,
    Association,
    DesiredReproductions,

    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"jP  " => KnownBox::Signature,
            b"ftyp" => KnownBox::FileType,
            b"jp2h" => KnownBox::Jp2Header,
            b"jp2c" => KnownBox::Codestream,
            b"jp2i" => KnownBox::IntellectualProperty,
            b"xml " => KnownBox::Xml,
            b"uuid" => KnownBox::Uuid,
            b"uinf" => KnownBox::UuidInfo,

            b"ihdr" => KnownBox::ImageHeader,
            b"bpcc" => KnownBox::BitsPerComponent,
            b"colr" => KnownBox::ColourSpecification,
            b"pclr" => KnownBox::Palette,
            b"cmap" => KnownBox::ComponentMapping,
            b"cdef" => KnownBox::ChannelDefinition,
            b"res " => KnownBox::Resolution,

            b"resc" => KnownBox::CaptureResolution,
            b"resd" => KnownBox::DisplayResolution,

            b"ulst" => KnownBox::UuidList,
            b"url " => KnownBox::DataEntryUrl,

            b"jpch" => KnownBox::CodestreamHeader,
            b"jplh" => KnownBox::CompositingLayerHeader,
            b"cgrp" => KnownBox::ColourGroup,
            b"ftbl" => KnownBox::FragmentTable,
            b"comp" => KnownBox::Composition,
            b"asoc" => KnownBox::Association,
            b"drep" => KnownBox::DesiredReproductions,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    /// Does this box's body consist of child boxes?
    pub fn is_superbox(&self) -> bool {
        matches!(
            self,
            KnownBox::Jp2Header
                | KnownBox::Resolution
                | KnownBox::UuidInfo
                | KnownBox::CodestreamHeader
                | KnownBox::CompositingLayerHeader
                | KnownBox::ColourGroup
                | KnownBox::FragmentTable
                | KnownBox::Composition
                | KnownBox::Association
                | KnownBox::DesiredReproductions
        )
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Signature => "JPEG 2000 Signature Box",
            KnownBox::FileType => "File Type Box",
            KnownBox::Jp2Header => "JP2 Header Box",
            KnownBox::Codestream => "Contiguous Codestream Box",
            KnownBox::IntellectualProperty => "Intellectual Property Box",
            KnownBox::Xml => "XML Box",
            KnownBox::Uuid => "UUID Box",
            KnownBox::UuidInfo => "UUID Info Box",
            KnownBox::ImageHeader => "Image Header Box",
            KnownBox::BitsPerComponent => "Bits Per Component Box",
            KnownBox::ColourSpecification => "Colour Specification Box",
            KnownBox::Palette => "Palette Box",
            KnownBox::ComponentMapping => "Component Mapping Box",
            KnownBox::ChannelDefinition => "Channel Definition Box",
            KnownBox::Resolution => "Resolution Box",
            KnownBox::CaptureResolution => "Capture Resolution Box",
            KnownBox::DisplayResolution => "Default Display Resolution Box",
            KnownBox::UuidList => "UUID List Box",
            KnownBox::DataEntryUrl => "Data Entry URL Box",
            KnownBox::CodestreamHeader => "Codestream Header Box",
            KnownBox::CompositingLayerHeader => "Compositing Layer Header Box",
            KnownBox::ColourGroup => "Colour Group Box",
            KnownBox::FragmentTable => "Fragment Table Box",
            KnownBox::Composition => "Composition Box",
            KnownBox::Association => "Association Box",
            KnownBox::DesiredReproductions => "Desired Reproductions Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
