use crate::domain::reservation::{ReservationId, ReservationStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReservationError>;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Item {item_id} is already reserved")]
    AlreadyReserved { item_id: i64 },
    #[error("Reservation {0} not found")]
    NotFound(ReservationId),
    #[error("Reservation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    },
    #[error("Reservation {0} hold has already lapsed")]
    HoldExpired(ReservationId),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Sweep stopped after expiring {processed} reservation(s): {source}")]
    PartialSweep {
        processed: usize,
        #[source]
        source: Box<ReservationError>,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used by transports to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CsvError(e) if e.is_io_error() => ErrorKind::Internal,
            Self::ValidationError(_) | Self::CsvError(_) | Self::ConfigError(_) => {
                ErrorKind::Validation
            }
            Self::AlreadyReserved { .. }
            | Self::ConstraintViolation(_)
            | Self::InvalidTransition { .. }
            | Self::HoldExpired(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PartialSweep { source, .. } => source.kind(),
            Self::IoError(_) | Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(Box::new(std::io::Error::other(msg.into())))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ReservationError {
    fn from(err: rocksdb::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<serde_json::Error> for ReservationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}
