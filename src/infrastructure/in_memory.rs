use crate::domain::ports::ReservationStore;
use crate::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    last_id: i64,
    reservations: BTreeMap<ReservationId, Reservation>,
    by_item: HashMap<i64, Vec<ReservationId>>,
}

impl Inner {
    fn active_on_item(&self, item_id: i64, now: DateTime<Utc>) -> Option<&Reservation> {
        self.by_item
            .get(&item_id)?
            .iter()
            .filter_map(|id| self.reservations.get(id))
            .find(|r| r.is_active_at(now))
    }
}

/// A thread-safe in-memory reservation store.
///
/// Uses `Arc<RwLock<..>>` to allow shared concurrent access. `insert` holds
/// the write lock across the exclusivity check and the write, so two
/// concurrent inserts for the same item are serialized.
/// Ideal for testing or single-run batches where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryReservationStore {
    /// Creates a new, empty in-memory reservation store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, mut reservation: Reservation) -> Result<Reservation> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.active_on_item(reservation.item_id, reservation.created_at) {
            return Err(ReservationError::ConstraintViolation(format!(
                "item {} already held by reservation {}",
                existing.item_id, existing.id
            )));
        }

        inner.last_id += 1;
        reservation.id = ReservationId(inner.last_id);
        inner
            .by_item
            .entry(reservation.item_id)
            .or_default()
            .push(reservation.id);
        inner
            .reservations
            .insert(reservation.id, reservation.clone());
        tracing::debug!("Stored reservation {}", reservation.id);
        Ok(reservation)
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner.reservations.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut reservations: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reservations)
    }

    async fn find_active_by_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner.active_on_item(item_id, now).cloned())
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reservations
            .values()
            .filter(|r| r.is_lapsed_at(now))
            .cloned()
            .collect())
    }

    async fn update(&self, reservation: Reservation, expected: ReservationStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .reservations
            .get_mut(&reservation.id)
            .ok_or(ReservationError::NotFound(reservation.id))?;

        if stored.status != expected {
            return Err(ReservationError::InvalidTransition {
                id: reservation.id,
                from: stored.status,
                to: reservation.status,
            });
        }

        *stored = reservation;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
