//! Orchestration: repository page → resolved detail URLs → report rows.
//!
//! Only the repository fetch is fatal. Each detail page is fetched and
//! scraped independently; a failure there becomes an `ERROR:` row in the
//! report and the batch keeps going. Detail fetches run with bounded
//! concurrency but the report stays in resolution order, not completion
//! order.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{info, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::fetcher::PageFetcher;
use crate::listing;
use crate::parser;
use crate::parser::extract;
use crate::report::Contract;

/// Default cap on in-flight detail fetches. Small on purpose: the IDOT
/// listing yields tens of contracts, not thousands.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Fetch the repository page and resolve the contract-detail URLs its
/// matching rows claim. Fatal on transport failure or an empty result.
pub async fn resolve_repository<F>(fetcher: &F, repo_url: &str) -> Result<Vec<Url>, ScrapeError>
where
    F: PageFetcher + ?Sized,
{
    let base = Url::parse(repo_url.trim()).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

    info!("Fetching repository page: {}", base);
    let html = fetcher.fetch(&base).await.map_err(ScrapeError::Transport)?;

    let extraction = parser::parse_document(&html);
    let urls = listing::resolve_contract_urls(&extraction, &base);
    if urls.is_empty() {
        return Err(ScrapeError::NoMatches);
    }

    info!("Resolved {} contract detail pages", urls.len());
    Ok(urls)
}

/// Scrape every detail URL into a report row, up to `concurrency` pages
/// in flight at once. `progress` fires once per finished page (in
/// completion order; the returned rows are in input order).
pub async fn scrape_details<F, P>(
    fetcher: &F,
    urls: &[Url],
    concurrency: usize,
    progress: P,
) -> Vec<Contract>
where
    F: PageFetcher + ?Sized,
    P: Fn() + Sync,
{
    let progress = &progress;
    // Boxed and collected eagerly to work around rust-lang/rust#102211:
    // keeping the closure/generator types inside `buffered` trips a
    // spurious "Send is not general enough" error when `F` is
    // `dyn PageFetcher`. The futures stay lazy until polled, so
    // `buffered` still caps in-flight fetches exactly as before.
    let page_futures: Vec<_> = urls
        .iter()
        .map(|url| {
            FutureExt::boxed(async move {
                let contract = scrape_contract(fetcher, url).await;
                progress();
                contract
            })
        })
        .collect();
    stream::iter(page_futures)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// The whole pipeline for one repository URL.
pub async fn scrape_repository<F>(
    fetcher: &F,
    repo_url: &str,
    concurrency: usize,
) -> Result<Vec<Contract>, ScrapeError>
where
    F: PageFetcher + ?Sized,
{
    let urls = resolve_repository(fetcher, repo_url).await?;
    Ok(scrape_details(fetcher, &urls, concurrency, || {}).await)
}

/// One detail page. Never fails: transport errors become an error row.
async fn scrape_contract<F>(fetcher: &F, url: &Url) -> Contract
where
    F: PageFetcher + ?Sized,
{
    match fetcher.fetch(url).await {
        Ok(html) => {
            let fields = extract::extract_fields(&parser::parse_document(&html));
            Contract::new(url, fields)
        }
        Err(e) => {
            warn!("Contract fetch failed for {}: {}", url, e);
            Contract::from_error(url, &e.to_string())
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::stub::StubFetcher;
    use crate::parser::extract::NOT_FOUND;

    const REPO_URL: &str = "https://webapps.dot.illinois.gov/WCTB/LbHome";

    fn listing_page(rows: usize) -> String {
        let mut html = String::from("<html><body><table>");
        html.push_str("<tr><th>Contract</th><th>County</th><th>Status</th></tr>");
        for i in 1..=rows {
            html.push_str(&format!(
                "<tr>\
                   <td><a href=\"/WCTB/LbContractDetail?id={i}\">7234{i}</a></td>\
                   <td>Cook</td>\
                   <td>Active</td>\
                 </tr>"
            ));
        }
        html.push_str("</table></body></html>");
        html
    }

    fn detail_page(bidder: &str, amount: &str) -> String {
        format!(
            "<table>\
               <tr><td>Low Bid</td><td>{bidder}</td><td>{amount}</td></tr>\
               <tr><td>Awardee</td><td>{bidder}</td></tr>\
             </table>"
        )
    }

    fn detail_url(i: usize) -> String {
        format!("https://webapps.dot.illinois.gov/WCTB/LbContractDetail?id={i}")
    }

    #[tokio::test]
    async fn listing_fetch_failure_is_fatal() {
        let fetcher = StubFetcher::default().failure(REPO_URL, "connection refused");
        let err = scrape_repository(&fetcher, REPO_URL, 1).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch repository page: Fetch Error: connection refused"
        );
    }

    #[tokio::test]
    async fn empty_listing_is_fatal() {
        let fetcher = StubFetcher::default()
            .page(REPO_URL, "<table><tr><td>no matches here</td></tr></table>");
        let err = scrape_repository(&fetcher, REPO_URL, 1).await.unwrap_err();
        assert!(matches!(err, ScrapeError::NoMatches));
    }

    #[tokio::test]
    async fn invalid_url_rejected_before_any_fetch() {
        let fetcher = StubFetcher::default();
        let err = scrape_repository(&fetcher, "not a url", 1).await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn happy_path_one_row_per_resolved_url() {
        let fetcher = StubFetcher::default()
            .page(REPO_URL, &listing_page(2))
            .page(
                &detail_url(1),
                &detail_page("Acme Construction Co", "$1,234,567.89"),
            )
            .page(
                &detail_url(2),
                &detail_page("Plote Construction Inc", "$987,654.00"),
            );

        let report = scrape_repository(&fetcher, REPO_URL, 4).await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].contract_url, detail_url(1));
        assert_eq!(report[0].low_bidder, "Acme Construction Co");
        assert_eq!(report[0].low_bid_amount, "$1,234,567.89");
        assert_eq!(report[0].awardee, "Acme Construction Co");
        assert_eq!(report[1].low_bidder, "Plote Construction Inc");
    }

    #[tokio::test]
    async fn detail_failure_isolated_to_its_row() {
        let fetcher = StubFetcher::default()
            .page(REPO_URL, &listing_page(3))
            .page(&detail_url(1), &detail_page("Acme Construction Co", "$1.00"))
            .failure(&detail_url(2), "timed out")
            .page(
                &detail_url(3),
                &detail_page("Plote Construction Inc", "$3.00"),
            );

        let report = scrape_repository(&fetcher, REPO_URL, 4).await.unwrap();
        assert_eq!(report.len(), 3);

        assert_eq!(report[0].low_bidder, "Acme Construction Co");
        assert_eq!(report[1].low_bidder, "ERROR: Fetch Error: timed out");
        assert_eq!(report[1].low_bid_amount, "");
        assert_eq!(report[1].awardee, "");
        assert_eq!(report[2].low_bidder, "Plote Construction Inc");
    }

    #[tokio::test]
    async fn unextractable_detail_yields_sentinels() {
        let fetcher = StubFetcher::default()
            .page(REPO_URL, &listing_page(1))
            .page(
                &detail_url(1),
                "<table><tr><td>Route</td><td>IL 47</td></tr></table>",
            );

        let report = scrape_repository(&fetcher, REPO_URL, 1).await.unwrap();
        assert_eq!(report[0].low_bidder, NOT_FOUND);
        assert_eq!(report[0].low_bid_amount, NOT_FOUND);
        assert_eq!(report[0].awardee, NOT_FOUND);
    }

    #[tokio::test]
    async fn order_preserved_under_concurrency() {
        let mut fetcher = StubFetcher::default().page(REPO_URL, &listing_page(8));
        for i in 1..=8 {
            fetcher = fetcher.page(
                &detail_url(i),
                &detail_page(&format!("Company Number {i:02} Inc"), "$1.00"),
            );
        }

        let report = scrape_repository(&fetcher, REPO_URL, 8).await.unwrap();
        let bidders: Vec<&str> = report.iter().map(|c| c.low_bidder.as_str()).collect();
        let expected: Vec<String> = (1..=8)
            .map(|i| format!("Company Number {i:02} Inc"))
            .collect();
        assert_eq!(bidders, expected);
    }

    #[tokio::test]
    async fn progress_fires_once_per_page() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let fetcher = StubFetcher::default()
            .page(REPO_URL, &listing_page(3))
            .page(&detail_url(1), &detail_page("Acme Construction Co", "$1.00"))
            .page(&detail_url(2), &detail_page("Acme Construction Co", "$2.00"))
            .page(&detail_url(3), &detail_page("Acme Construction Co", "$3.00"));

        let urls = resolve_repository(&fetcher, REPO_URL).await.unwrap();
        let count = AtomicUsize::new(0);
        let report = scrape_details(&fetcher, &urls, 2, || {
            count.fetch_add(1, Ordering::Relaxed);
        })
        .await;
        assert_eq!(report.len(), 3);
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }
}
