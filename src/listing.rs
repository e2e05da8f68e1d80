//! Listing-page filtering and contract URL resolution.
//!
//! Two independent passes over one extraction, combined by position: the
//! link pass builds an ordered, de-duplicated queue of resolved
//! contract-detail URLs, the row pass counts rows matching the county
//! and status vocabulary, and the Nth matching row claims the Nth URL.
//!
//! The positional pairing is a layout assumption of the IDOT repository
//! pages (matching rows and detail links appear in the same relative
//! order and counts), not a relational join. Revisit before pointing
//! this at any other site.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::parser::Extraction;

/// Chicago-metro counties the report cares about.
const VALID_COUNTIES: &[&str] = &[
    "boone", "cook", "grundy", "dupage", "kane", "kendall", "lake", "mchenry", "will", "various",
];

/// Contract statuses worth following.
const VALID_STATUSES: &[&str] = &["active", "executed", "awarded"];

/// Detail links carry this path marker. Case-sensitive on purpose: it is
/// a literal route segment, not prose.
const DETAIL_LINK_MARKER: &str = "LbContractDetail";

/// Resolve the contract-detail URLs claimed by matching listing rows, in
/// document order.
pub fn resolve_contract_urls(extraction: &Extraction, base: &Url) -> Vec<Url> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: Vec<Url> = Vec::new();

    for link in &extraction.links {
        if !link.contains(DETAIL_LINK_MARKER) {
            continue;
        }
        match base.join(link) {
            Ok(resolved) => {
                if seen.insert(resolved.to_string()) {
                    queue.push(resolved);
                }
            }
            Err(e) => {
                debug!("Skipping unresolvable href {:?}: {}", link, e);
            }
        }
    }

    let matching_rows = extraction
        .tables
        .iter()
        .flat_map(|table| table.iter())
        .filter(|row| row_matches(row))
        .count();
    debug!(
        "{} matching rows, {} candidate detail links",
        matching_rows,
        queue.len()
    );

    // One URL per matching row; rows beyond the queue get nothing.
    queue.truncate(matching_rows);
    queue
}

/// A listing row is relevant when it has enough cells to be a data row
/// and mentions both a tracked county and a tracked status anywhere in
/// its text.
fn row_matches(row: &[String]) -> bool {
    if row.len() < 3 {
        return false;
    }
    let text = row.join(" ").to_lowercase();
    VALID_COUNTIES.iter().any(|county| text.contains(county))
        && VALID_STATUSES.iter().any(|status| text.contains(status))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(rows: Vec<Vec<&str>>, links: Vec<&str>) -> Extraction {
        Extraction {
            tables: vec![rows
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect()],
            links: links.into_iter().map(str::to_string).collect(),
        }
    }

    fn base() -> Url {
        Url::parse("https://webapps.dot.illinois.gov/WCTB/LbHome").unwrap()
    }

    #[test]
    fn relative_links_resolved_against_base() {
        let e = extraction(
            vec![vec!["72345", "Cook", "Active"]],
            vec!["/WCTB/LbContractDetail?id=72345"],
        );
        let urls = resolve_contract_urls(&e, &base());
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].as_str(),
            "https://webapps.dot.illinois.gov/WCTB/LbContractDetail?id=72345"
        );
    }

    #[test]
    fn non_detail_links_ignored() {
        let e = extraction(
            vec![vec!["72345", "Cook", "Active"]],
            vec!["/WCTB/LbHome", "/WCTB/sort?col=2", "/WCTB/LbContractDetail?id=1"],
        );
        let urls = resolve_contract_urls(&e, &base());
        assert_eq!(urls.len(), 1);
        assert!(urls[0].as_str().contains("LbContractDetail"));
    }

    #[test]
    fn duplicate_links_collapse_to_first_seen() {
        let e = extraction(
            vec![
                vec!["72345", "Cook", "Active"],
                vec!["72346", "Will", "Awarded"],
            ],
            vec![
                "/WCTB/LbContractDetail?id=1",
                "/WCTB/LbContractDetail?id=2",
                "/WCTB/LbContractDetail?id=1",
            ],
        );
        let urls = resolve_contract_urls(&e, &base());
        assert_eq!(urls.len(), 2);
        assert!(urls[0].as_str().ends_with("id=1"));
        assert!(urls[1].as_str().ends_with("id=2"));
    }

    #[test]
    fn rows_need_both_county_and_status() {
        let links = vec!["/WCTB/LbContractDetail?id=1"];
        // County only.
        let e = extraction(vec![vec!["72345", "Cook", "Pending"]], links.clone());
        assert!(resolve_contract_urls(&e, &base()).is_empty());
        // Status only.
        let e = extraction(vec![vec!["72345", "Champaign", "Active"]], links.clone());
        assert!(resolve_contract_urls(&e, &base()).is_empty());
        // Both.
        let e = extraction(vec![vec!["72345", "Cook", "Active"]], links);
        assert_eq!(resolve_contract_urls(&e, &base()).len(), 1);
    }

    #[test]
    fn short_rows_skipped() {
        let e = extraction(
            vec![vec!["Cook Active"]],
            vec!["/WCTB/LbContractDetail?id=1"],
        );
        assert!(resolve_contract_urls(&e, &base()).is_empty());
    }

    #[test]
    fn match_is_substring_anywhere_in_row() {
        // "will" hides inside "Willowbrook"; that is the documented
        // behavior, not an accident.
        let e = extraction(
            vec![vec!["72345", "Willowbrook Rd resurfacing", "Executed"]],
            vec!["/WCTB/LbContractDetail?id=1"],
        );
        assert_eq!(resolve_contract_urls(&e, &base()).len(), 1);
    }

    #[test]
    fn url_count_is_min_of_rows_and_links() {
        // More links than matching rows: extras unclaimed.
        let e = extraction(
            vec![
                vec!["1", "Cook", "Active"],
                vec!["2", "Champaign", "Active"],
            ],
            vec![
                "/WCTB/LbContractDetail?id=1",
                "/WCTB/LbContractDetail?id=2",
                "/WCTB/LbContractDetail?id=3",
            ],
        );
        assert_eq!(resolve_contract_urls(&e, &base()).len(), 1);

        // More matching rows than links: remaining rows skipped.
        let e = extraction(
            vec![
                vec!["1", "Cook", "Active"],
                vec!["2", "Kane", "Awarded"],
                vec!["3", "Lake", "Executed"],
            ],
            vec!["/WCTB/LbContractDetail?id=1"],
        );
        assert_eq!(resolve_contract_urls(&e, &base()).len(), 1);
    }
}
