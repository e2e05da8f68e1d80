//! Table and link extraction over the token stream.
//!
//! Reconstructs `table > tr > td/th` structure with three boolean flags,
//! the way the target pages actually nest, rather than building a DOM.
//! Tables are collected as a flat list in close order; hrefs are captured
//! only while a cell is open, in document order.

use super::tokens::Token;

pub type Row = Vec<String>;
pub type Table = Vec<Row>;

/// Everything the extractor recovers from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub tables: Vec<Table>,
    pub links: Vec<String>,
}

/// Consume a token stream and rebuild table structure plus in-cell links.
///
/// Only one table context is active at a time: opening a `<table>` while
/// inside one starts a fresh context, and the innermost close wins. That
/// matches the simple non-overlapping nesting on the pages this reads;
/// it is not a general nested-table tracker.
pub fn extract_tables(tokens: impl Iterator<Item = Token>) -> Extraction {
    let mut tables: Vec<Table> = Vec::new();
    let mut links: Vec<String> = Vec::new();

    let mut current_table: Table = Vec::new();
    let mut current_row: Row = Vec::new();
    let mut current_cell = String::new();

    let mut in_table = false;
    let mut in_row = false;
    let mut in_cell = false;

    for token in tokens {
        match token {
            Token::StartTag { name, attrs } => match name.as_str() {
                "table" => {
                    in_table = true;
                    current_table = Vec::new();
                }
                "tr" if in_table => {
                    in_row = true;
                    current_row = Vec::new();
                }
                "td" | "th" if in_row => {
                    in_cell = true;
                    current_cell.clear();
                }
                "a" if in_cell => {
                    for (key, value) in attrs {
                        if key == "href" {
                            links.push(value);
                        }
                    }
                }
                _ => {}
            },
            Token::EndTag { name } => match name.as_str() {
                "table" => {
                    in_table = false;
                    if !current_table.is_empty() {
                        tables.push(std::mem::take(&mut current_table));
                    }
                }
                "tr" if in_row => {
                    in_row = false;
                    if !current_row.is_empty() {
                        current_table.push(std::mem::take(&mut current_row));
                    }
                }
                "td" | "th" if in_cell => {
                    in_cell = false;
                    current_row.push(current_cell.trim().to_string());
                }
                _ => {}
            },
            Token::Text(text) => {
                if in_cell {
                    current_cell.push_str(&text);
                }
            }
        }
    }

    Extraction { tables, links }
}

// ── Tests ──
