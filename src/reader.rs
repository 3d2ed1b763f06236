use crate::error::{DecodeError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Object-safe `Read + Seek`, so interpreters can take the reader without generics.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Forward-only reader that tracks how many bytes a box body consumed.
///
/// Reads are checked against two limits: the end of the box body currently
/// being decoded (a read past it is [`DecodeError::BodyOverrun`]) and the
/// end of the stream (a read past it, while still inside the box, is
/// [`DecodeError::TruncatedStream`]). Outside any box the reader is unbounded.
/// Seeking backward is never allowed.
pub struct BoxReader<'a> {
    inner: &'a mut dyn ReadSeek,
    pos: u64,
    len: u64,
    bound: u64,
    mark: u64,
}

impl<'a> BoxReader<'a> {
    /// Wrap `inner` at its current position. The stream length is probed once.
    pub fn new(inner: &'a mut dyn ReadSeek) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(BoxReader {
            inner,
            pos,
            len,
            bound: u64::MAX,
            mark: pos,
        })
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the underlying stream.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// End of the span reads are currently confined to, if any.
    pub fn bound(&self) -> Option<u64> {
        (self.bound != u64::MAX).then_some(self.bound)
    }

    /// Bytes left before the current bound or the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.bound.min(self.len).saturating_sub(self.pos)
    }

    /// Confine reads to `end` while `f` runs. The bound can only shrink.
    pub fn bounded<T>(&mut self, end: u64, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.bound;
        self.bound = end.min(saved);
        let out = f(self);
        self.bound = saved;
        out
    }

    /// Snapshot the position where a box body begins.
    pub fn mark_start(&mut self) {
        self.mark = self.pos;
    }

    pub fn bytes_read_so_far(&self) -> u64 {
        self.pos - self.mark
    }

    /// Close a box body. With a known declared length the consumed count
    /// must match exactly; otherwise the consumed count is just reported.
    pub fn finalize(&self, box_type: crate::FourCC, declared: Option<u64>) -> Result<u64> {
        let consumed = self.bytes_read_so_far();
        match declared {
            Some(declared) if declared != consumed => Err(DecodeError::StructuralMismatch {
                box_type,
                declared,
                consumed,
                offset: self.mark,
            }),
            _ => Ok(consumed),
        }
    }

    fn check(&self, n: u64) -> Result<()> {
        let end = self.pos + n;
        if end > self.bound && self.bound <= self.len {
            return Err(DecodeError::BodyOverrun {
                offset: self.pos,
                requested: n,
                remaining: self.remaining(),
            });
        }
        if end > self.len {
            return Err(DecodeError::TruncatedStream {
                offset: self.pos,
                needed: n,
                stream_len: self.len,
            });
        }
        Ok(())
    }

    fn eof(&self, n: u64) -> impl Fn(std::io::Error) -> DecodeError + '_ {
        move |e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                DecodeError::TruncatedStream {
                    offset: self.pos,
                    needed: n,
                    stream_len: self.len,
                }
            } else {
                DecodeError::Io(e)
            }
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let v = self.inner.read_u8().map_err(self.eof(1))?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.check(2)?;
        let v = self.inner.read_u16::<BigEndian>().map_err(self.eof(2))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.check(4)?;
        let v = self.inner.read_u32::<BigEndian>().map_err(self.eof(4))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.check(8)?;
        let v = self.inner.read_u64::<BigEndian>().map_err(self.eof(8))?;
        self.pos += 8;
        Ok(v)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = buf.len() as u64;
        self.check(n)?;
        self.inner.read_exact(buf).map_err(self.eof(n))?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        self.check(n)?;
        let mut v = vec![0u8; n as usize];
        self.inner.read_exact(&mut v).map_err(self.eof(n))?;
        self.pos += n;
        Ok(v)
    }

    /// Advance to `target`, discarding the bytes in between.
    pub fn skip_to(&mut self, target: u64) -> Result<()> {
        if target < self.pos {
            return Err(DecodeError::BackwardSeek {
                from: self.pos,
                to: target,
            });
        }
        if target > self.len {
            return Err(DecodeError::TruncatedStream {
                offset: self.pos,
                needed: target - self.pos,
                stream_len: self.len,
            });
        }
        if target != self.pos {
            self.inner.seek(SeekFrom::Start(target))?;
            self.pos = target;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FourCC;
    use std::io::Cursor;

    #[test]
    fn reads_big_endian_and_counts_bytes() {
        let mut cur = Cursor::new(vec![0x00, 0x64, 0x00, 0x00, 0x00, 0x01, 0x02]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        r.mark_start();
        assert_eq!(r.read_u16().unwrap(), 100);
        assert_eq!(r.read_u32().unwrap(), 1);
        assert_eq!(r.read_u8().unwrap(), 2);
        assert_eq!(r.bytes_read_so_far(), 7);
        assert_eq!(r.finalize(FourCC(*b"test"), Some(7)).unwrap(), 7);
    }

    #[test]
    fn finalize_reports_mismatch() {
        let mut cur = Cursor::new(vec![0u8; 4]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        r.mark_start();
        r.read_u16().unwrap();
        let err = r.finalize(FourCC(*b"test"), Some(4)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::StructuralMismatch { declared: 4, consumed: 2, .. }
        ));
        // unknown length: just report
        assert_eq!(r.finalize(FourCC(*b"test"), None).unwrap(), 2);
    }

    #[test]
    fn read_past_stream_end_is_truncation() {
        let mut cur = Cursor::new(vec![0u8; 3]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        r.read_u16().unwrap();
        let err = r.read_u16().unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedStream { offset: 2, needed: 2, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn read_past_bound_is_overrun() {
        let mut cur = Cursor::new(vec![0u8; 8]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        let err = r
            .bounded(3, |r| {
                r.read_u16()?;
                r.read_u16()
            })
            .unwrap_err();
        assert!(matches!(err, DecodeError::BodyOverrun { remaining: 1, .. }));
        // bound restored afterwards
        assert_eq!(r.bound(), None);
        assert_eq!(r.remaining(), 6);
    }

    #[test]
    fn box_ending_at_stream_end_overruns_rather_than_truncates() {
        let mut cur = Cursor::new(vec![0u8; 4]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        let err = r.bounded(4, |r| r.read_bytes(6)).unwrap_err();
        assert!(matches!(err, DecodeError::BodyOverrun { .. }));

        // a box declared past the stream end is truncated
        let mut cur = Cursor::new(vec![0u8; 4]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        let err = r.bounded(10, |r| r.read_bytes(6)).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedStream { .. }));
    }

    #[test]
    fn skip_is_forward_only() {
        let mut cur = Cursor::new(vec![0u8; 8]);
        let mut r = BoxReader::new(&mut cur).unwrap();
        r.skip_to(6).unwrap();
        assert_eq!(r.position(), 6);
        assert!(matches!(r.skip_to(2), Err(DecodeError::BackwardSeek { .. })));
        assert!(matches!(r.skip_to(9), Err(DecodeError::TruncatedStream { .. })));
    }
}
