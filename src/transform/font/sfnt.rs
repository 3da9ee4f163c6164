//! Minimal sfnt (TrueType / OpenType) table directory reader.

use super::FontError;

/// `0x00010000`: TrueType outlines
pub const TRUETYPE: u32 = 0x0001_0000;
/// `OTTO`: CFF outlines
pub const OPENTYPE: u32 = u32::from_be_bytes(*b"OTTO");
/// `true`: legacy Apple TrueType
pub const APPLE_TRUE: u32 = u32::from_be_bytes(*b"true");
/// `ttcf`: font collection
pub const COLLECTION: u32 = u32::from_be_bytes(*b"ttcf");

const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 16;

/// One table of a parsed font, borrowing its data from the input.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: &'a [u8],
}

/// A parsed font: its flavor and tables sorted by tag.
#[derive(Debug)]
pub struct Sfnt<'a> {
    pub flavor: u32,
    pub tables: Vec<Table<'a>>,
}

impl Sfnt<'_> {
    /// Size of the font as a plain sfnt with 4-byte aligned tables.
    pub fn total_sfnt_size(&self) -> u32 {
        let tables: usize = self.tables.iter().map(|t| align4(t.data.len())).sum();
        (HEADER_LEN + RECORD_LEN * self.tables.len() + tables) as u32
    }
}

pub fn parse(data: &[u8]) -> Result<Sfnt<'_>, FontError> {
    let flavor = read_u32(data, 0).ok_or(FontError::Truncated("header"))?;
    match flavor {
        TRUETYPE | OPENTYPE | APPLE_TRUE => {}
        COLLECTION => return Err(FontError::Collection),
        _ => return Err(FontError::NotSfnt),
    }

    let num_tables = read_u16(data, 4).ok_or(FontError::Truncated("header"))? as usize;
    if num_tables == 0 {
        return Err(FontError::Truncated("table directory"));
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let record = HEADER_LEN + i * RECORD_LEN;
        let fields = (
            data.get(record..record + 4),
            read_u32(data, record + 4),
            read_u32(data, record + 8),
            read_u32(data, record + 12),
        );
        let (Some(tag), Some(checksum), Some(offset), Some(length)) = fields else {
            return Err(FontError::Truncated("table directory"));
        };

        let start = offset as usize;
        let data = start
            .checked_add(length as usize)
            .and_then(|end| data.get(start..end))
            .ok_or(FontError::Truncated("table data"))?;

        tables.push(Table {
            tag: [tag[0], tag[1], tag[2], tag[3]],
            checksum,
            data,
        });
    }
    tables.sort_by_key(|t| t.tag);

    Ok(Sfnt { flavor, tables })
}

pub fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn read_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Build an sfnt from `(tag, data)` pairs, for tests.
#[cfg(test)]
pub fn build(flavor: u32, tables: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0; 6]); // searchRange, entrySelector, rangeShift

    let mut offset = HEADER_LEN + RECORD_LEN * tables.len();
    let mut body = Vec::new();
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        body.resize(align4(body.len()), 0);
        offset = HEADER_LEN + RECORD_LEN * tables.len() + body.len();
    }
    out.extend_from_slice(&body);
    out
}
