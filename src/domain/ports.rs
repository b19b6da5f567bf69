use super::reservation::{Reservation, ReservationId, ReservationStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable record of reservations.
///
/// The store is the single source of truth for the exclusivity invariant:
/// `insert` must check for an active hold on the item and write the new
/// record as one atomic step.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Persists a new reservation and returns it with its assigned id.
    ///
    /// Fails with `ConstraintViolation` if another reservation for the same
    /// item is pending with `expires_at` after the new record's `created_at`.
    async fn insert(&self, reservation: Reservation) -> Result<Reservation>;

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// All reservations of a user, most recently created first.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Reservation>>;

    /// The pending reservation on `item_id` whose expiry is after `now`.
    async fn find_active_by_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>>;

    /// Pending reservations whose expiry is at or before `now`.
    async fn find_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>>;

    /// Replaces the stored record if its current status is still `expected`.
    ///
    /// Fails with `NotFound` if the id is absent and with
    /// `InvalidTransition` if the stored status has moved on.
    async fn update(&self, reservation: Reservation, expected: ReservationStatus) -> Result<()>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<()>;
}

pub type ReservationStoreBox = Box<dyn ReservationStore>;
pub type ReservationStoreFactory = Box<dyn Fn() -> ReservationStoreBox + Send + Sync>;
