use crate::domain::operation::TransactionType;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a scenario file.
///
/// `reference` names an earlier step (or, failing that, a bare transaction
/// id) for follow-ons. `method` is a card reference, or a token when it
/// starts with `PMT_`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioStep {
    pub step: String,
    pub op: TransactionType,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Reads scenario steps from a CSV source.
///
/// Whitespace around fields is trimmed and trailing columns may be left out.
pub struct ScenarioReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScenarioReader<R> {
    /// Columns are matched by header name, so a scenario may list them in
    /// any order. Lines starting with `#` are skipped.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes steps; a bad row yields an error and reading
    /// continues with the next one.
    pub fn steps(self) -> impl Iterator<Item = Result<ScenarioStep>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
