//! WOFF 1.0 encoder: zlib per table.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::FontError;
use super::sfnt::{self, Sfnt, align4};

pub const SIGNATURE: u32 = u32::from_be_bytes(*b"wOFF");
const HEADER_LEN: usize = 44;
const ENTRY_LEN: usize = 20;

/// Wrap an sfnt font in a WOFF container.
pub fn encode(font: &[u8]) -> Result<Vec<u8>, FontError> {
    let sfnt = sfnt::parse(font)?;
    write(&sfnt)
}

fn write(sfnt: &Sfnt<'_>) -> Result<Vec<u8>, FontError> {
    let num_tables = sfnt.tables.len();
    let mut directory = Vec::with_capacity(ENTRY_LEN * num_tables);
    let mut body = Vec::new();
    let mut offset = HEADER_LEN + ENTRY_LEN * num_tables;

    for table in &sfnt.tables {
        let compressed = compress(table.data)?;
        // Tables that do not shrink are stored as-is.
        let stored = if compressed.len() < table.data.len() {
            compressed.as_slice()
        } else {
            table.data
        };

        directory.extend_from_slice(&table.tag);
        directory.extend_from_slice(&(offset as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&table.checksum.to_be_bytes());

        body.extend_from_slice(stored);
        body.resize(align4(body.len()), 0);
        offset = HEADER_LEN + ENTRY_LEN * num_tables + body.len();
    }

    let length = HEADER_LEN + directory.len() + body.len();
    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&sfnt.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&sfnt.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    out.extend_from_slice(&[0; 20]); // no metadata or private data
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);
    Ok(out)
}

fn compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn u32_at(data: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(data[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn test_header_and_tables() {
        let glyf = vec![7u8; 400];
        let font = sfnt::build(sfnt::TRUETYPE, &[(b"glyf", &glyf), (b"head", b"hd")]);
        let woff = encode(&font).unwrap();

        assert_eq!(u32_at(&woff, 0), SIGNATURE);
        assert_eq!(u32_at(&woff, 4), sfnt::TRUETYPE);
        assert_eq!(u32_at(&woff, 8) as usize, woff.len());
        assert_eq!(u16::from_be_bytes([woff[12], woff[13]]), 2);
        assert_eq!(u32_at(&woff, 16), 12 + 32 + 400 + 4);
        assert_eq!(woff.len() % 4, 0);

        // glyf: compressed, round-trips through zlib
        let entry = HEADER_LEN;
        assert_eq!(&woff[entry..entry + 4], b"glyf");
        let offset = u32_at(&woff, entry + 4) as usize;
        let comp_len = u32_at(&woff, entry + 8) as usize;
        assert_eq!(u32_at(&woff, entry + 12), 400);
        assert!(comp_len < 400);
        assert_eq!(offset % 4, 0);
        let mut decoded = Vec::new();
        ZlibDecoder::new(&woff[offset..offset + comp_len])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, glyf);

        // head: too small to shrink, stored verbatim
        let entry = HEADER_LEN + ENTRY_LEN;
        let offset = u32_at(&woff, entry + 4) as usize;
        assert_eq!(u32_at(&woff, entry + 8), 2);
        assert_eq!(&woff[offset..offset + 2], b"hd");
    }

    #[test]
    fn test_rejects_non_font() {
        assert!(encode(b"definitely not a font").is_err());
    }
}
