use crate::domain::ports::ReservationStore;
use crate::domain::reservation::{Reservation, ReservationId, ReservationStatus};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for reservation records, keyed by id.
pub const CF_RESERVATIONS: &str = "reservations";
/// Column Family indexing pending reservations, keyed by item id then reservation id.
pub const CF_ACTIVE_ITEMS: &str = "active_items";
/// Column Family indexing reservations by user id then reservation id.
pub const CF_BY_USER: &str = "by_user";
/// Column Family for store bookkeeping (id sequence).
pub const CF_META: &str = "meta";

const LAST_ID_KEY: &[u8] = b"last_id";

/// A persistent reservation store backed by RocksDB.
///
/// Records live in `reservations`; `active_items` holds one entry per pending
/// reservation and acts as the conditional unique index on item id. Every
/// write that touches the index runs under `write_lock` and lands as one
/// atomic `WriteBatch`, so the exclusivity check and the insert cannot
/// interleave with another writer in this process.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBReservationStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBReservationStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_RESERVATIONS, CF_ACTIVE_ITEMS, CF_BY_USER, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| ReservationError::internal(format!("{} column family not found", name)))
    }

    fn load(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let cf = self.cf(CF_RESERVATIONS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn last_id(&self) -> Result<i64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, LAST_ID_KEY)? {
            Some(bytes) => decode_i64(&bytes),
            None => Ok(0),
        }
    }

    /// Reservation ids stored under keys starting with `prefix` in `cf_name`.
    fn ids_with_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<ReservationId>> {
        let cf = self.cf(cf_name)?;
        let mut ids = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            ids.push(ReservationId(decode_i64(&key[key.len() - 8..])?));
        }
        Ok(ids)
    }

    fn pending_on_item(&self, item_id: i64) -> Result<Vec<Reservation>> {
        let mut reservations = Vec::new();
        for id in self.ids_with_prefix(CF_ACTIVE_ITEMS, &item_id.to_be_bytes())? {
            if let Some(reservation) = self.load(id)? {
                reservations.push(reservation);
            }
        }
        Ok(reservations)
    }
}

fn composite_key(prefix: i64, id: ReservationId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&prefix.to_be_bytes());
    key[8..].copy_from_slice(&id.0.to_be_bytes());
    key
}

fn decode_i64(bytes: &[u8]) -> Result<i64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ReservationError::internal(format!("Malformed key of {} bytes", bytes.len())))?;
    Ok(i64::from_be_bytes(raw))
}

#[async_trait]
impl ReservationStore for RocksDBReservationStore {
    async fn insert(&self, mut reservation: Reservation) -> Result<Reservation> {
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self
            .pending_on_item(reservation.item_id)?
            .into_iter()
            .find(|r| r.is_active_at(reservation.created_at))
        {
            return Err(ReservationError::ConstraintViolation(format!(
                "item {} already held by reservation {}",
                existing.item_id, existing.id
            )));
        }

        let id = ReservationId(self.last_id()? + 1);
        reservation.id = id;
        let value = serde_json::to_vec(&reservation)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_META)?, LAST_ID_KEY, id.0.to_be_bytes());
        batch.put_cf(self.cf(CF_RESERVATIONS)?, id.0.to_be_bytes(), value);
        batch.put_cf(
            self.cf(CF_ACTIVE_ITEMS)?,
            composite_key(reservation.item_id, id),
            b"",
        );
        batch.put_cf(
            self.cf(CF_BY_USER)?,
            composite_key(reservation.user_id, id),
            b"",
        );
        self.db.write(batch)?;

        tracing::debug!("Stored reservation {} for item {}", id, reservation.item_id);
        Ok(reservation)
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.load(id)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Reservation>> {
        let mut reservations = Vec::new();
        for id in self.ids_with_prefix(CF_BY_USER, &user_id.to_be_bytes())? {
            if let Some(reservation) = self.load(id)? {
                reservations.push(reservation);
            }
        }
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reservations)
    }

    async fn find_active_by_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>> {
        Ok(self
            .pending_on_item(item_id)?
            .into_iter()
            .find(|r| r.is_active_at(now)))
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let mut expired = Vec::new();
        for id in self.ids_with_prefix(CF_ACTIVE_ITEMS, &[])? {
            if let Some(reservation) = self.load(id)?
                && reservation.is_lapsed_at(now)
            {
                expired.push(reservation);
            }
        }
        Ok(expired)
    }

    async fn update(&self, reservation: Reservation, expected: ReservationStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let stored = self
            .load(reservation.id)?
            .ok_or(ReservationError::NotFound(reservation.id))?;
        if stored.status != expected {
            return Err(ReservationError::InvalidTransition {
                id: reservation.id,
                from: stored.status,
                to: reservation.status,
            });
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_RESERVATIONS)?,
            reservation.id.0.to_be_bytes(),
            serde_json::to_vec(&reservation)?,
        );
        if reservation.status != ReservationStatus::Pending {
            batch.delete_cf(
                self.cf(CF_ACTIVE_ITEMS)?,
                composite_key(stored.item_id, stored.id),
            );
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.last_id().map(|_| ())
    }
}
