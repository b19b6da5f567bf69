//! Storage adapters implementing [`crate::domain::ports::ReservationStore`].

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
