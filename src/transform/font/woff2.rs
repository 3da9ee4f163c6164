//! WOFF 2.0 encoder.
//!
//! All tables use the null transform and are compressed together as a
//! single Brotli stream. `glyf`/`loca` therefore carry transform version 3.

use std::io::Write;

use super::FontError;
use super::sfnt::{self, Sfnt, align4};

pub const SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");
const HEADER_LEN: usize = 48;

/// Tag index 63 means the tag follows the flags byte.
const ARBITRARY_TAG: u8 = 63;
/// Transform version 3 on `glyf`/`loca` is the null transform.
const NULL_TRANSFORM_GLYF: u8 = 3 << 6;

const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;

#[rustfmt::skip]
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post",
    b"cvt ", b"fpgm", b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT",
    b"EBLC", b"gasp", b"hdmx", b"kern", b"LTSH", b"PCLT", b"VDMX", b"vhea",
    b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC", b"JSTF", b"MATH",
    b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar",
    b"gvar", b"hsty", b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop",
    b"trak", b"Zapf", b"Silf", b"Glat", b"Gloc", b"Feat", b"Sill",
];

/// Wrap an sfnt font in a WOFF2 container.
pub fn encode(font: &[u8]) -> Result<Vec<u8>, FontError> {
    let sfnt = sfnt::parse(font)?;
    write(&sfnt)
}

fn write(sfnt: &Sfnt<'_>) -> Result<Vec<u8>, FontError> {
    let mut directory = Vec::new();
    let mut stream = Vec::new();

    for table in &sfnt.tables {
        write_entry(&mut directory, &table.tag, table.data.len() as u32);
        stream.extend_from_slice(table.data);
    }

    let compressed = compress(&stream)?;
    let length = align4(HEADER_LEN + directory.len() + compressed.len());

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&sfnt.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(sfnt.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&sfnt.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    out.extend_from_slice(&[0; 20]); // no metadata or private data
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(length, 0);
    Ok(out)
}

fn write_entry(out: &mut Vec<u8>, tag: &[u8; 4], orig_length: u32) {
    let index = KNOWN_TAGS.iter().position(|known| *known == tag);
    let transform = if matches!(tag, b"glyf" | b"loca") {
        NULL_TRANSFORM_GLYF
    } else {
        0
    };

    match index {
        Some(index) => out.push(index as u8 | transform),
        None => {
            out.push(ARBITRARY_TAG | transform);
            out.extend_from_slice(tag);
        }
    }
    write_base128(out, orig_length);
}

/// UIntBase128: big-endian groups of 7 bits, high bit set on all but the last.
fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7f) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    Ok(writer.into_inner())
}
