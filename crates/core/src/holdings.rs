//! Brokerage holdings export parsing.
//!
//! Brokerage exports start with a few metadata lines (account name, export
//! date, ...) before the actual table, so the header row has to be located
//! first.

use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{EXPORT_SECURITY_COLUMN, EXPORT_UNITS_COLUMN};
use crate::errors::{Result, ValidationError};
use crate::profile::normalize_ticker;

/// Minimum number of cells for a table row to be considered a holding.
const MIN_HOLDING_CELLS: usize = 3;

/// A single position read from a holdings export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Holding {
    pub ticker: String,
    pub units: Decimal,
}

/// Parse a holdings export into positions.
///
/// Rows with a blank ticker or unreadable units are skipped.
pub fn parse_holdings_export(text: &str) -> Result<Vec<Holding>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;

    let (header_idx, security_idx, units_idx) = locate_header(&rows).ok_or_else(|| {
        ValidationError::MissingField(format!(
            "{}/{} header",
            EXPORT_SECURITY_COLUMN, EXPORT_UNITS_COLUMN
        ))
    })?;

    let mut holdings = Vec::new();
    for (offset, row) in rows.iter().skip(header_idx + 1).enumerate() {
        if row.len() < MIN_HOLDING_CELLS {
            continue;
        }
        let line = header_idx + offset + 2;

        let ticker = normalize_ticker(row.get(security_idx).unwrap_or_default());
        if ticker.is_empty() {
            debug!("Skipping export row {}: no security", line);
            continue;
        }

        let raw_units = row.get(units_idx).unwrap_or_default().replace(',', "");
        match Decimal::from_str(&raw_units) {
            Ok(units) => holdings.push(Holding { ticker, units }),
            Err(e) => debug!("Skipping export row {} ({}): bad units: {}", line, ticker, e),
        }
    }

    Ok(holdings)
}

/// Find the header row and the column positions of security and units.
fn locate_header(rows: &[StringRecord]) -> Option<(usize, usize, usize)> {
    rows.iter().enumerate().find_map(|(idx, row)| {
        let security = row.iter().position(|c| c == EXPORT_SECURITY_COLUMN)?;
        let units = row.iter().position(|c| c == EXPORT_UNITS_COLUMN)?;
        Some((idx, security, units))
    })
}
