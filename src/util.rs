use std::io::{Read, Seek, SeekFrom};

/// Read `len` bytes at absolute `offset`.
pub fn read_slice<R: Read + Seek>(r: &mut R, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    r.seek(SeekFrom::Start(offset))?;
    let mut v = Vec::with_capacity(len as usize);
    r.take(len).read_to_end(&mut v)?;
    if (v.len() as u64) < len {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(v)
}

/// Classic 16-bytes-per-line dump: offset, hex pairs split in two groups of 8, ASCII.
pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let offs = start_offset + (i as u64) * 16;
        let (lo, hi) = chunk.split_at(chunk.len().min(8));
        let hexs = format!("{} {}", spaced_hex(lo), spaced_hex(hi));
        let ascii: String = chunk
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<48}  |{}|\n", offs, hexs.trim_end(), ascii));
    }
    out
}

fn spaced_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    let pairs: Vec<&str> = (0..encoded.len())
        .step_by(2)
        .map(|i| &encoded[i..i + 2])
        .collect();
    pairs.join(" ")
}
