//! Heuristic field extraction for contract detail pages.
//!
//! The detail pages carry no stable ids or classes, so this scans every
//! table row for marker phrases and picks candidate cells by shape.
//! The rules are ordering-sensitive on purpose: same-row candidates
//! overwrite (last wins), the next-row fallback only fills fields that
//! are still empty (first wins). Extraction never fails; a field nobody
//! matched comes back as the [`NOT_FOUND`] sentinel.

use super::tables::Extraction;

/// Sentinel for a field no rule matched.
pub const NOT_FOUND: &str = "Not Found";

/// Cells shorter than this are assumed to be labels or codes, not
/// company names.
const MIN_NAME_LEN: usize = 11;

/// The three fields recovered from one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFields {
    pub low_bidder: String,
    pub low_bid_amount: String,
    pub awardee: String,
}

/// Scan all extracted tables for low-bid and awardee information.
pub fn extract_fields(extraction: &Extraction) -> ContractFields {
    let mut low_bidder = String::new();
    let mut low_bid_amount = String::new();
    let mut awardee = String::new();

    for table in &extraction.tables {
        for (i, row) in table.iter().enumerate() {
            let row_text = row.join(" ").to_lowercase();

            if row_text.contains("low bid") || row_text.contains("lowest bid") {
                for cell in row {
                    if cell.contains('$') {
                        low_bid_amount = cell.trim().to_string();
                    } else if is_name_candidate(cell) {
                        low_bidder = cell.trim().to_string();
                    }
                }

                // Sometimes the values sit in the row below the label.
                if let Some(next_row) = table.get(i + 1) {
                    for cell in next_row {
                        if cell.contains('$') {
                            if low_bid_amount.is_empty() {
                                low_bid_amount = cell.trim().to_string();
                            }
                        } else if is_name_candidate(cell) && low_bidder.is_empty() {
                            low_bidder = cell.trim().to_string();
                        }
                    }
                }
            }

            if row_text.contains("award") && row_text.contains("awardee") {
                for cell in row {
                    if is_name_candidate(cell) {
                        awardee = cell.trim().to_string();
                    }
                }
            }
        }
    }

    ContractFields {
        low_bidder: or_not_found(low_bidder),
        low_bid_amount: or_not_found(low_bid_amount),
        awardee: or_not_found(awardee),
    }
}

/// A cell looks like a company name when it is long enough and not just
/// a formatted number.
fn is_name_candidate(cell: &str) -> bool {
    cell.chars().count() >= MIN_NAME_LEN && !is_numeric_cell(cell)
}

/// Numeric after stripping currency formatting (`$1,234,567.89` is
/// numeric, `Acme Construction Co` is not).
fn is_numeric_cell(cell: &str) -> bool {
    let stripped: String = cell
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '$' | ' '))
        .collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

fn or_not_found(value: String) -> String {
    if value.is_empty() {
        NOT_FOUND.to_string()
    } else {
        value
    }
}

// ── Tests ──
