use crate::application::engine::ReservationEngine;
use crate::domain::reservation::{ItemType, ReservationId};
use crate::error::{ReservationError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Create,
    Cancel,
    Complete,
}

/// One row of a batch file.
///
/// `create` rows need `user`, `item` and `item_type`; `cancel` and
/// `complete` rows need `id`. Unused columns may be left empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ReservationRequest {
    pub action: RequestAction,
    pub user: Option<i64>,
    pub item: Option<i64>,
    pub item_type: Option<ItemType>,
    pub id: Option<ReservationId>,
}

impl ReservationRequest {
    /// Runs the request against `engine` and returns the id it touched.
    pub async fn apply(self, engine: &ReservationEngine) -> Result<ReservationId> {
        match self.action {
            RequestAction::Create => {
                let user = required(self.user, "user")?;
                let item = required(self.item, "item")?;
                let item_type = required(self.item_type, "item_type")?;
                Ok(engine.create(user, item, item_type).await?.id)
            }
            RequestAction::Cancel => {
                let id = required(self.id, "id")?;
                engine.cancel(id).await?;
                Ok(id)
            }
            RequestAction::Complete => {
                let id = required(self.id, "id")?;
                engine.complete(id).await?;
                Ok(id)
            }
        }
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| ReservationError::ValidationError(format!("Missing '{}' column", column)))
}

/// Reads reservation requests from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<ReservationRequest>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests.
    pub fn requests(self) -> impl Iterator<Item = Result<ReservationRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ReservationError::from))
    }
}
