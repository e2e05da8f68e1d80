//! The contract report and its CSV serialization.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ScrapeError;
use crate::parser::extract::ContractFields;

/// One output row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_url: String,
    pub low_bidder: String,
    pub low_bid_amount: String,
    pub awardee: String,
}

impl Contract {
    pub fn new(url: &Url, fields: ContractFields) -> Self {
        Self {
            contract_url: url.to_string(),
            low_bidder: fields.low_bidder,
            low_bid_amount: fields.low_bid_amount,
            awardee: fields.awardee,
        }
    }

    /// Row for a detail page that could not be fetched: the error rides
    /// in the bidder column, the other fields stay empty. The batch
    /// continues around it.
    pub fn from_error(url: &Url, message: &str) -> Self {
        Self {
            contract_url: url.to_string(),
            low_bidder: format!("ERROR: {message}"),
            low_bid_amount: String::new(),
            awardee: String::new(),
        }
    }
}

/// Serialize the report with a `contract_url,low_bidder,low_bid_amount,
/// awardee` header row. Always emits the header, even for zero rows.
pub fn to_csv(contracts: &[Contract]) -> Result<String, ScrapeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for contract in contracts {
        writer
            .serialize(contract)
            .map_err(|e| ScrapeError::Csv(e.to_string()))?;
    }
    if contracts.is_empty() {
        writer
            .write_record(["contract_url", "low_bidder", "low_bid_amount", "awardee"])
            .map_err(|e| ScrapeError::Csv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ScrapeError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ScrapeError::Csv(e.to_string()))
}

// ── Tests ──
