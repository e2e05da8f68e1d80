pub mod extract;
pub mod tables;
pub mod tokens;

pub use tables::Extraction;

/// Two-pass pipeline: raw html → token stream → tables + links.
pub fn parse_document(html: &str) -> Extraction {
    tables::extract_tables(tokens::tokenize(html))
}
