//! # dBASE III Table Parser
//!
//! Minimal parser for the fixed-width dBASE III (`.DBF`) layout the POS
//! export uses.
//!
//! ## File Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DBF File Layout                                  │
//! │                                                                         │
//! │  Offset 0        Header (32 bytes)                                     │
//! │  ├── [0]         version byte (0x03 = dBASE III without memo)          │
//! │  ├── [1..4]      last-update date (YY MM DD)                           │
//! │  ├── [4..8]      record count       (u32, little-endian)               │
//! │  ├── [8..10]     header length      (u16, little-endian)               │
//! │  └── [10..12]    record length      (u16, little-endian)               │
//! │                                                                         │
//! │  Offset 32       Field descriptors (32 bytes each, 0x0D terminator)    │
//! │  ├── [0..11]     field name (ASCII, NUL-padded)                        │
//! │  ├── [11]        field type (C/N/F/D/L/...)                            │
//! │  ├── [16]        field length                                          │
//! │  └── [17]        decimal count                                         │
//! │                                                                         │
//! │  header length   Records (record length bytes each)                    │
//! │  ├── [0]         0x20 = active, 0x2A = deleted                         │
//! │  └── fields back to back, fixed width, space-padded                    │
//! │                                                                         │
//! │  optional        0x1A end-of-file marker                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are decoded as trimmed strings; typed interpretation (numbers,
//! dates) happens in [`crate::reader`] where the column meaning is known.

use std::collections::HashMap;

use crate::error::{PosError, PosResult};

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const DESCRIPTOR_TERMINATOR: u8 = 0x0D;
const RECORD_ACTIVE: u8 = 0x20;
const RECORD_DELETED: u8 = 0x2A;

// =============================================================================
// Field Descriptors
// =============================================================================

/// DBF column type, from the descriptor's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbfFieldType {
    /// `C` - character data, space-padded.
    Character,
    /// `N` - numeric, right-aligned ASCII digits.
    Numeric,
    /// `F` - float, same representation as numeric.
    Float,
    /// `D` - date, `YYYYMMDD`.
    Date,
    /// `L` - logical (`T`/`F`/`?`).
    Logical,
    /// Anything else; preserved as raw text.
    Other(u8),
}

impl DbfFieldType {
    fn from_byte(b: u8) -> Self {
        match b {
            b'C' => DbfFieldType::Character,
            b'N' => DbfFieldType::Numeric,
            b'F' => DbfFieldType::Float,
            b'D' => DbfFieldType::Date,
            b'L' => DbfFieldType::Logical,
            other => DbfFieldType::Other(other),
        }
    }
}

/// One column of the table.
#[derive(Debug, Clone)]
pub struct DbfField {
    /// Column name, upper-case ASCII as stored (e.g. `SKU_NO`).
    pub name: String,

    /// Column type.
    pub kind: DbfFieldType,

    /// Fixed width in bytes.
    pub length: usize,
}

// =============================================================================
// Parsed File
// =============================================================================

/// A fully parsed DBF table: column layout plus active rows.
///
/// Deleted rows (flag byte `0x2A`) are skipped during parsing and never
/// surface to callers.
#[derive(Debug)]
pub struct DbfFile {
    /// Column descriptors in file order.
    pub fields: Vec<DbfField>,

    /// Active rows; each maps column name to its trimmed string value.
    pub rows: Vec<HashMap<String, String>>,
}

impl DbfFile {
    /// Parses a DBF table from its raw bytes.
    pub fn parse(data: &[u8]) -> PosResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(PosError::Truncated(format!(
                "file is {} bytes, header needs {}",
                data.len(),
                HEADER_LEN
            )));
        }

        let record_count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
        let record_len = u16::from_le_bytes([data[10], data[11]]) as usize;

        if header_len < HEADER_LEN + 1 || header_len > data.len() {
            return Err(PosError::Malformed(format!(
                "header length {} out of bounds",
                header_len
            )));
        }

        if record_len == 0 {
            return Err(PosError::Malformed("record length is zero".into()));
        }

        let fields = Self::parse_descriptors(&data[HEADER_LEN..header_len])?;

        // Field widths plus the deletion flag must match the declared record
        // length, or the offsets below would shear.
        let widths: usize = fields.iter().map(|f| f.length).sum();
        if widths + 1 != record_len {
            return Err(PosError::Malformed(format!(
                "field widths ({}) + flag byte disagree with record length {}",
                widths, record_len
            )));
        }

        let mut rows = Vec::with_capacity(record_count);
        let mut offset = header_len;

        for index in 0..record_count {
            if offset + record_len > data.len() {
                return Err(PosError::Truncated(format!(
                    "record {} of {} extends past end of file",
                    index + 1,
                    record_count
                )));
            }

            let record = &data[offset..offset + record_len];
            offset += record_len;

            match record[0] {
                RECORD_DELETED => continue,
                RECORD_ACTIVE => {}
                other => {
                    return Err(PosError::Malformed(format!(
                        "record {} has invalid deletion flag 0x{:02X}",
                        index + 1,
                        other
                    )))
                }
            }

            let mut row = HashMap::with_capacity(fields.len());
            let mut pos = 1;
            for field in &fields {
                let raw = &record[pos..pos + field.length];
                pos += field.length;

                let value = String::from_utf8_lossy(raw).trim().to_string();
                row.insert(field.name.clone(), value);
            }

            rows.push(row);
        }

        Ok(DbfFile { fields, rows })
    }

    fn parse_descriptors(area: &[u8]) -> PosResult<Vec<DbfField>> {
        let mut fields = Vec::new();
        let mut offset = 0;

        loop {
            if offset >= area.len() {
                return Err(PosError::Malformed(
                    "field descriptors not terminated".into(),
                ));
            }

            if area[offset] == DESCRIPTOR_TERMINATOR {
                break;
            }

            if offset + DESCRIPTOR_LEN > area.len() {
                return Err(PosError::Truncated("field descriptor cut short".into()));
            }

            let descriptor = &area[offset..offset + DESCRIPTOR_LEN];
            offset += DESCRIPTOR_LEN;

            let name_end = descriptor[..11]
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(11);
            let name = String::from_utf8_lossy(&descriptor[..name_end])
                .trim()
                .to_string();

            if name.is_empty() {
                return Err(PosError::Malformed("field with empty name".into()));
            }

            fields.push(DbfField {
                name,
                kind: DbfFieldType::from_byte(descriptor[11]),
                length: descriptor[16] as usize,
            });
        }

        if fields.is_empty() {
            return Err(PosError::Malformed("table has no fields".into()));
        }

        Ok(fields)
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Builds a DBF byte image from (name, type, length) columns and rows of
/// pre-padded string values. Shared with the reader tests.
#[cfg(test)]
pub(crate) fn build_dbf(columns: &[(&str, u8, u8)], rows: &[&[&str]]) -> Vec<u8> {
    let record_len: usize = 1 + columns.iter().map(|c| c.2 as usize).sum::<usize>();
    let header_len = HEADER_LEN + columns.len() * DESCRIPTOR_LEN + 1;

    let mut data = vec![0u8; HEADER_LEN];
    data[0] = 0x03;
    data[4..8].copy_from_slice(&(rows.len() as u32).to_le_bytes());
    data[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
    data[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());

    for (name, kind, length) in columns {
        let mut descriptor = [0u8; DESCRIPTOR_LEN];
        descriptor[..name.len()].copy_from_slice(name.as_bytes());
        descriptor[11] = *kind;
        descriptor[16] = *length;
        data.extend_from_slice(&descriptor);
    }
    data.push(DESCRIPTOR_TERMINATOR);

    for row in rows {
        data.push(RECORD_ACTIVE);
        for (value, (_, _, length)) in row.iter().zip(columns) {
            let mut cell = vec![b' '; *length as usize];
            let bytes = value.as_bytes();
            cell[..bytes.len()].copy_from_slice(bytes);
            data.extend_from_slice(&cell);
        }
    }
    data.push(0x1A);

    data
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_table() {
        let data = build_dbf(
            &[("SKU_NO", b'C', 10), ("QTYONHAND", b'N', 6)],
            &[&["RING-42", "3"], &["BAND-7", "0"]],
        );

        let file = DbfFile::parse(&data).unwrap();
        assert_eq!(file.fields.len(), 2);
        assert_eq!(file.fields[0].name, "SKU_NO");
        assert_eq!(file.fields[0].kind, DbfFieldType::Character);
        assert_eq!(file.rows.len(), 2);
        assert_eq!(file.rows[0]["SKU_NO"], "RING-42");
        assert_eq!(file.rows[1]["QTYONHAND"], "0");
    }

    #[test]
    fn test_deleted_rows_are_skipped() {
        let mut data = build_dbf(&[("SKU_NO", b'C', 10)], &[&["RING-42"], &["BAND-7"]]);

        // Flip the second record's flag to deleted.
        let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
        let record_len = u16::from_le_bytes([data[10], data[11]]) as usize;
        data[header_len + record_len] = RECORD_DELETED;

        let file = DbfFile::parse(&data).unwrap();
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.rows[0]["SKU_NO"], "RING-42");
    }

    #[test]
    fn test_truncated_file_errors() {
        let data = build_dbf(&[("SKU_NO", b'C', 10)], &[&["RING-42"]]);
        let result = DbfFile::parse(&data[..data.len() - 6]);
        assert!(matches!(result, Err(PosError::Truncated(_))));
    }

    #[test]
    fn test_width_mismatch_errors() {
        let mut data = build_dbf(&[("SKU_NO", b'C', 10)], &[&["RING-42"]]);
        // Corrupt the declared record length.
        data[10..12].copy_from_slice(&99u16.to_le_bytes());
        assert!(matches!(
            DbfFile::parse(&data),
            Err(PosError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_header_errors() {
        assert!(matches!(
            DbfFile::parse(&[0u8; 8]),
            Err(PosError::Truncated(_))
        ));
    }
}
