//! # SARECORD Reader
//!
//! Locates a store's `SARECORD.DBF`, decodes its rows into [`PosRecord`]s,
//! and applies the source-side filters.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use shopsync_core::{is_placeholder_sku, PosRecord};

use crate::dbf::DbfFile;
use crate::error::{PosError, PosResult};

/// Column carrying the SKU.
const COL_SKU: &str = "SKU_NO";
/// Column carrying the on-hand quantity.
const COL_QTY: &str = "QTYONHAND";
/// Column carrying the transaction date (`YYYYMMDD`).
const COL_DATE: &str = "DATE";

// =============================================================================
// Read Options
// =============================================================================

/// Source-side filters applied while reading.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// `0` keeps only today's transactions; `n > 0` keeps the trailing
    /// n-day window.
    pub days_back: u32,

    /// Drop internal placeholder SKUs (suffix `00001`) at the source.
    pub exclude_placeholder_skus: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            days_back: 0,
            exclude_placeholder_skus: true,
        }
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Reads `SARECORD.DBF` tables from a per-store data tree.
///
/// The POS export lives at `{data_root}/{STORE}/CURRENT/SARECORD.DBF`.
#[derive(Debug, Clone)]
pub struct SarecordReader {
    data_root: PathBuf,
}

impl SarecordReader {
    /// Creates a reader rooted at the POS data directory.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        SarecordReader {
            data_root: data_root.into(),
        }
    }

    /// Path of a store's current transaction table.
    pub fn table_path(&self, store_code: &str) -> PathBuf {
        self.data_root
            .join(store_code)
            .join("CURRENT")
            .join("SARECORD.DBF")
    }

    /// Reads and filters a store's transaction records.
    pub fn read(&self, store_code: &str, options: &ReadOptions) -> PosResult<Vec<PosRecord>> {
        let path = self.table_path(store_code);
        let records = read_sarecord(&path, options)?;

        info!(
            store = %store_code,
            count = records.len(),
            days_back = options.days_back,
            "Read POS records"
        );

        Ok(records)
    }
}

/// Reads one `SARECORD.DBF` file, applying [`ReadOptions`] filters relative
/// to today's date.
pub fn read_sarecord(path: &Path, options: &ReadOptions) -> PosResult<Vec<PosRecord>> {
    let data = std::fs::read(path)?;
    let file = DbfFile::parse(&data)?;

    let records = decode_rows(&file)?;
    debug!(path = %path.display(), total = records.len(), "Parsed SARECORD table");

    Ok(filter_records(
        records,
        Local::now().date_naive(),
        options,
    ))
}

/// Decodes parsed rows into records, validating the column layout once.
fn decode_rows(file: &DbfFile) -> PosResult<Vec<PosRecord>> {
    if !file.fields.iter().any(|f| f.name == COL_SKU) {
        return Err(PosError::MissingColumn(COL_SKU));
    }
    if !file.fields.iter().any(|f| f.name == COL_QTY) {
        return Err(PosError::MissingColumn(COL_QTY));
    }

    let records = file
        .rows
        .iter()
        .map(|row| {
            let sku = row.get(COL_SKU).cloned().unwrap_or_default();
            let qty = row
                .get(COL_QTY)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| v as i64)
                .unwrap_or(0);
            let date = row
                .get(COL_DATE)
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y%m%d").ok());

            PosRecord::new(sku, qty, date)
        })
        .collect();

    Ok(records)
}

/// Applies the days-back and placeholder filters.
///
/// Records without a parseable date are kept: the nightly export
/// occasionally leaves the column blank and dropping those rows would lose
/// real stock movements.
fn filter_records(
    records: Vec<PosRecord>,
    today: NaiveDate,
    options: &ReadOptions,
) -> Vec<PosRecord> {
    let cutoff = today - chrono::Days::new(options.days_back as u64);

    records
        .into_iter()
        .filter(|rec| match rec.date {
            Some(date) if options.days_back == 0 => date == today,
            Some(date) => date >= cutoff,
            None => true,
        })
        .filter(|rec| {
            !(options.exclude_placeholder_skus && is_placeholder_sku(rec.sku.trim()))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::build_dbf;

    fn sample_records() -> Vec<PosRecord> {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        vec![
            PosRecord::new("RING-42", 3, d("2026-08-07")),
            PosRecord::new("BAND-7", 0, d("2026-08-05")),
            PosRecord::new("X-00001", 9, d("2026-08-07")),
            PosRecord::new("CHAIN-1", 2, None),
        ]
    }

    #[test]
    fn test_filter_today_only() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let options = ReadOptions::default();

        let kept = filter_records(sample_records(), today, &options);
        let skus: Vec<_> = kept.iter().map(|r| r.sku.as_str()).collect();

        // Today's row, plus the undated row; placeholder excluded.
        assert_eq!(skus, vec!["RING-42", "CHAIN-1"]);
    }

    #[test]
    fn test_filter_days_back_window() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let options = ReadOptions {
            days_back: 3,
            exclude_placeholder_skus: true,
        };

        let kept = filter_records(sample_records(), today, &options);
        let skus: Vec<_> = kept.iter().map(|r| r.sku.as_str()).collect();

        assert_eq!(skus, vec!["RING-42", "BAND-7", "CHAIN-1"]);
    }

    #[test]
    fn test_placeholder_filter_can_be_disabled() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let options = ReadOptions {
            days_back: 0,
            exclude_placeholder_skus: false,
        };

        let kept = filter_records(sample_records(), today, &options);
        assert!(kept.iter().any(|r| r.sku == "X-00001"));
    }

    #[test]
    fn test_decode_rows_from_dbf() {
        let data = build_dbf(
            &[
                ("SKU_NO", b'C', 12),
                ("QTYONHAND", b'N', 6),
                ("DATE", b'D', 8),
            ],
            &[
                &["RING-42", "3", "20260807"],
                &["BAND-7", "-2", "20260805"],
            ],
        );

        let file = DbfFile::parse(&data).unwrap();
        let records = decode_rows(&file).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sku, "RING-42");
        assert_eq!(records[0].qty_on_hand, 3);
        assert_eq!(
            records[0].date,
            NaiveDate::from_ymd_opt(2026, 8, 7)
        );
        assert_eq!(records[1].qty_on_hand, -2);
        assert_eq!(records[1].target_quantity(), 0);
    }

    #[test]
    fn test_missing_sku_column_errors() {
        let data = build_dbf(&[("QTYONHAND", b'N', 6)], &[&["3"]]);
        let file = DbfFile::parse(&data).unwrap();
        assert!(matches!(
            decode_rows(&file),
            Err(PosError::MissingColumn("SKU_NO"))
        ));
    }

    #[test]
    fn test_read_sarecord_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("STORE-1").join("CURRENT");
        std::fs::create_dir_all(&store_dir).unwrap();

        let today = Local::now().date_naive().format("%Y%m%d").to_string();
        let data = build_dbf(
            &[
                ("SKU_NO", b'C', 12),
                ("QTYONHAND", b'N', 6),
                ("DATE", b'D', 8),
            ],
            &[&["RING-42", "5", today.as_str()]],
        );
        std::fs::write(store_dir.join("SARECORD.DBF"), data).unwrap();

        let reader = SarecordReader::new(dir.path());
        let records = reader
            .read("STORE-1", &ReadOptions::default())
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sku, "RING-42");
        assert_eq!(records[0].qty_on_hand, 5);
    }

    #[test]
    fn test_read_missing_file_errors() {
        let reader = SarecordReader::new("/nonexistent");
        assert!(matches!(
            reader.read("STORE-1", &ReadOptions::default()),
            Err(PosError::Io(_))
        ));
    }
}
