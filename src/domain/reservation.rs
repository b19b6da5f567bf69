use crate::error::{ReservationError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub i64);

impl ReservationId {
    /// Placeholder carried by a reservation until the store assigns its id.
    pub const UNASSIGNED: Self = Self(0);
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Weapon,
    Armor,
    Other,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weapon" => Ok(Self::Weapon),
            "armor" => Ok(Self::Armor),
            "other" => Ok(Self::Other),
            other => Err(ReservationError::ValidationError(format!(
                "Unknown item type '{}', expected weapon, armor or other",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Completed, cancelled and expired are final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        *self == Self::Pending && next.is_terminal()
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed exclusive hold of one item by one user.
///
/// Identity fields (`id`, `item_id`, `user_id`, `item_type`, `expires_at`,
/// `created_at`) never change once the store has accepted the record; only
/// `status` and `updated_at` move, and only through [`Reservation::transition`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub item_id: i64,
    pub user_id: i64,
    pub item_type: ItemType,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Builds a fresh pending hold starting at `now` and lasting `hold`.
    ///
    /// Fails with `ConfigError` when `now + hold` falls outside the
    /// representable time range.
    pub fn pending(
        user_id: i64,
        item_id: i64,
        item_type: ItemType,
        now: DateTime<Utc>,
        hold: Duration,
    ) -> Result<Self> {
        let expires_at = now.checked_add_signed(hold).ok_or_else(|| {
            ReservationError::ConfigError(format!(
                "Hold of {} minutes starting at {} overflows the supported time range",
                hold.num_minutes(),
                now
            ))
        })?;
        Ok(Self {
            id: ReservationId::UNASSIGNED,
            item_id,
            user_id,
            item_type,
            status: ReservationStatus::Pending,
            expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Pending and not yet past its expiry.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Pending && self.expires_at > now
    }

    /// Pending but past its expiry, waiting for the sweep.
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Pending && self.expires_at <= now
    }

    /// Moves the reservation to `to`, refreshing `updated_at`.
    pub fn transition(&mut self, to: ReservationStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(ReservationError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
