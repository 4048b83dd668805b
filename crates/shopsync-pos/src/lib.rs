//! # shopsync-pos: POS Transaction-File Reader
//!
//! Reads retail point-of-sale transaction databases and produces the records
//! the sync engine consumes.
//!
//! The stores run a legacy POS whose nightly export is a dBASE III table
//! (`SARECORD.DBF`) under a per-store data directory. This crate parses that
//! fixed-width format directly — header, field descriptors, rows — and
//! applies the two source-side filters:
//!
//! - **days back**: `0` keeps only today's transactions, `n > 0` keeps the
//!   trailing n-day window
//! - **placeholder SKUs**: internal dummy items (suffix `00001`) are dropped
//!   before they ever reach a sync queue
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopsync_pos::{ReadOptions, SarecordReader};
//!
//! let reader = SarecordReader::new("Z:/VISUALJS/data");
//! let records = reader.read("STORE-1", &ReadOptions { days_back: 3, ..Default::default() })?;
//! ```

pub mod dbf;
pub mod error;
pub mod reader;

pub use dbf::{DbfField, DbfFile, DbfFieldType};
pub use error::{PosError, PosResult};
pub use reader::{ReadOptions, SarecordReader};
