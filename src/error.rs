use crate::fetcher::FetchError;

/// Fatal pipeline errors. Per-contract fetch failures are not here: the
/// orchestrator folds those into the corresponding report row instead of
/// aborting the batch.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The repository URL itself does not parse. Raised before any fetch.
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    /// The repository (listing) page could not be fetched.
    #[error("Failed to fetch repository page: {0}")]
    Transport(FetchError),

    /// The listing parsed but no row passed the county/status filter with
    /// a contract-detail link to claim.
    #[error("No matching contracts found. Please check the URL and filter criteria.")]
    NoMatches,

    /// Report serialization failed. Practically unreachable for in-memory
    /// CSV output, but kept explicit rather than unwrapped.
    #[error("Failed to serialize report: {0}")]
    Csv(String),
}
