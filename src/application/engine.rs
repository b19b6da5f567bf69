use crate::config::EngineConfig;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::ports::ReservationStoreBox;
use crate::domain::reservation::{ItemType, Reservation, ReservationId, ReservationStatus};
use crate::error::{ReservationError, Result};
use std::sync::Arc;

/// The main entry point of the reservation lifecycle.
///
/// `ReservationEngine` is the sole owner of valid state transitions. It holds
/// no cross-call state besides the store handle, so it can be shared behind an
/// `Arc` by any number of concurrent callers and the expiry sweeper.
pub struct ReservationEngine {
    store: ReservationStoreBox,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl ReservationEngine {
    /// Creates a new engine over `store` with the wall clock and default config.
    pub fn new(store: ReservationStoreBox) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Places a pending hold on `item_id` for `user_id`.
    ///
    /// Fails with `AlreadyReserved` while another hold on the item is active.
    /// The lookup below only short-circuits the common case; the store's
    /// atomic insert is what makes concurrent creates race-free.
    pub async fn create(&self, user_id: i64, item_id: i64, item_type: ItemType) -> Result<Reservation> {
        validate_id("user id", user_id)?;
        validate_id("item id", item_id)?;

        let now = self.clock.now();
        if self.store.find_active_by_item(item_id, now).await?.is_some() {
            tracing::debug!("Rejected reservation of item {} by user {}: held", item_id, user_id);
            return Err(ReservationError::AlreadyReserved { item_id });
        }

        let pending = Reservation::pending(user_id, item_id, item_type, now, self.config.hold_duration)?;
        let reservation = match self.store.insert(pending).await {
            Ok(reservation) => reservation,
            Err(ReservationError::ConstraintViolation(reason)) => {
                tracing::debug!("Lost reservation race on item {}: {}", item_id, reason);
                return Err(ReservationError::AlreadyReserved { item_id });
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "Reservation {} placed on item {} ({}) by user {} until {}",
            reservation.id,
            item_id,
            item_type,
            user_id,
            reservation.expires_at
        );
        Ok(reservation)
    }

    /// Cancels a pending reservation.
    pub async fn cancel(&self, id: ReservationId) -> Result<()> {
        let reservation = self.get(id).await?;
        self.finish(reservation, ReservationStatus::Cancelled).await?;
        tracing::info!("Reservation {} cancelled", id);
        Ok(())
    }

    /// Confirms a pending reservation whose hold has not lapsed.
    pub async fn complete(&self, id: ReservationId) -> Result<()> {
        let reservation = self.get(id).await?;
        if reservation.is_lapsed_at(self.clock.now()) {
            return Err(ReservationError::HoldExpired(id));
        }
        self.finish(reservation, ReservationStatus::Completed).await?;
        tracing::info!("Reservation {} completed", id);
        Ok(())
    }

    pub async fn get(&self, id: ReservationId) -> Result<Reservation> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound(id))
    }

    /// All reservations of `user_id` in any status, most recent first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Reservation>> {
        validate_id("user id", user_id)?;
        self.store.find_by_user(user_id).await
    }

    /// Expires every pending reservation whose hold has lapsed.
    ///
    /// Returns how many were expired. Records that are no longer `pending`,
    /// whether in the scan result or by the time of the write, are skipped. Any other failure stops the sweep and
    /// is reported as `PartialSweep`; already expired records stay expired.
    pub async fn sweep(&self) -> Result<usize> {
        let now = self.clock.now();
        let lapsed = self.store.find_expired_pending(now).await?;

        let mut processed = 0;
        for mut reservation in lapsed {
            let id = reservation.id;
            if let Err(e) = reservation.transition(ReservationStatus::Expired, now) {
                tracing::debug!("Skipped expiring reservation {}: {}", id, e);
                continue;
            }
            match self.store.update(reservation, ReservationStatus::Pending).await {
                Ok(()) => processed += 1,
                Err(ReservationError::InvalidTransition { from, .. }) => {
                    tracing::debug!("Skipped expiring reservation {}: already {}", id, from);
                }
                Err(e) => {
                    return Err(ReservationError::PartialSweep {
                        processed,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(processed)
    }

    /// Checks that the store is reachable.
    pub async fn health(&self) -> Result<()> {
        self.store.ping().await
    }

    async fn finish(&self, mut reservation: Reservation, to: ReservationStatus) -> Result<()> {
        if let Err(e) = reservation.transition(to, self.clock.now()) {
            tracing::debug!("Rejected transition of reservation {}: {}", reservation.id, e);
            return Err(e);
        }
        self.store
            .update(reservation, ReservationStatus::Pending)
            .await
    }
}

fn validate_id(field: &str, value: i64) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(ReservationError::ValidationError(format!(
            "{} must be positive, got {}",
            field, value
        )))
    }
}
