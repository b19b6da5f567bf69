//! Application layer containing the reservation lifecycle orchestration.
//!
//! This module defines the `ReservationEngine`, the only component allowed to
//! change a reservation's status, and the `ExpirySweeper` that drives its
//! periodic expiry pass on a `tokio` task.

pub mod engine;
pub mod sweeper;
