use crate::boxes::{BoxHeader, FourCC};
use crate::error::{DecodeError, Result};
use crate::reader::BoxReader;

/// Smallest possible box header: 4-byte length + 4-byte type.
pub const MIN_HEADER_SIZE: u64 = 8;

/// Read one box header at the reader's position.
///
/// Length `1` means an 8-byte extended length follows the type; length `0`
/// means the box runs to the end of its parent. A `uuid` type is followed by
/// its 16-byte extended type, which is counted as part of the header.
pub fn read_box_header(r: &mut BoxReader<'_>) -> Result<BoxHeader> {
    let start = r.position();
    let size32 = r.read_u32()?;
    let mut typ = [0u8; 4];
    r.read_exact(&mut typ)?;
    let mut size = size32 as u64;

    if size32 == 1 {
        size = r.read_u64()?;
    }

    let mut uuid = None;
    if &typ == b"uuid" {
        let mut u = [0u8; 16];
        r.read_exact(&mut u)?;
        uuid = Some(u);
    }

    let header_size = match (size32 == 1, &typ == b"uuid") {
        (true, true) => 8 + 8 + 16,
        (true, false) => 8 + 8,
        (false, true) => 8 + 16,
        (false, false) => 8,
    } as u64;

    if size != 0 && size < header_size {
        return Err(DecodeError::InvalidSize { offset: start, size });
    }

    log::trace!("box '{}' at {} size={} header={}", FourCC(typ), start, size, header_size);

    Ok(BoxHeader {
        size,
        typ: FourCC(typ),
        uuid,
        header_size,
        start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_of(bytes: Vec<u8>) -> Result<BoxHeader> {
        let mut cur = Cursor::new(bytes);
        let mut r = BoxReader::new(&mut cur)?;
        read_box_header(&mut r)
    }

    #[test]
    fn plain_header() {
        let mut v = 18u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"resc");
        v.extend_from_slice(&[0u8; 10]);
        let h = header_of(v).unwrap();
        assert_eq!(h.typ, FourCC(*b"resc"));
        assert_eq!(h.size, 18);
        assert_eq!(h.header_size, 8);
        assert_eq!(h.declared_body_len(), Some(10));
    }

    #[test]
    fn extended_length_header() {
        let mut v = 1u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"jp2c");
        v.extend_from_slice(&20u64.to_be_bytes());
        v.extend_from_slice(&[0u8; 4]);
        let h = header_of(v).unwrap();
        assert_eq!(h.size, 20);
        assert_eq!(h.header_size, 16);
        assert_eq!(h.declared_body_len(), Some(4));
    }

    #[test]
    fn uuid_header_includes_extended_type() {
        let mut v = 26u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"uuid");
        v.extend_from_slice(&[0xab; 16]);
        v.extend_from_slice(&[1, 2]);
        let h = header_of(v).unwrap();
        assert_eq!(h.header_size, 24);
        assert_eq!(h.uuid, Some([0xab; 16]));
        assert_eq!(h.declared_body_len(), Some(2));
    }

    #[test]
    fn zero_length_means_to_parent_end() {
        let mut v = 0u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"jp2c");
        let h = header_of(v).unwrap();
        assert!(h.extends_to_parent_end());
    }

    #[test]
    fn length_smaller_than_header_is_invalid() {
        let mut v = 4u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"free");
        assert!(matches!(header_of(v), Err(DecodeError::InvalidSize { size: 4, .. })));

        let mut v = 1u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"free");
        v.extend_from_slice(&12u64.to_be_bytes());
        assert!(matches!(header_of(v), Err(DecodeError::InvalidSize { size: 12, .. })));
    }

    #[test]
    fn short_stream_is_truncated() {
        let v = vec![0, 0, 0, 8, b'j'];
        assert!(matches!(header_of(v), Err(DecodeError::TruncatedStream { .. })));
    }
}
