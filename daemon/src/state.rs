//! The commanded-state table: what every panel has been told to show,
//! shared between the HTTP handlers and the keepalive loop.

use std::collections::BTreeMap;
use std::mem;

use tallybridge::{Screen, TallyState};
use tokio::sync::RwLock;

/// A point-in-time copy of the whole table, keyed by (bandeau, screen).
pub type StateSnapshot = BTreeMap<(u8, Screen), TallyState>;

/// Commanded state of every configured (bandeau, screen) pair behind a
/// single reader/writer lock. Entries are created at startup and only ever
/// overwritten afterwards, so readers always see the full key set.
pub struct StateStore {
    table: RwLock<StateSnapshot>,
}

impl StateStore {
    /// Build the table with both screens of every given bandeau off.
    pub fn new(bands: impl IntoIterator<Item = u8>) -> Self {
        let mut table = BTreeMap::new();
        for band in bands {
            for screen in Screen::ALL {
                table.insert((band, screen), TallyState::Off);
            }
        }
        StateStore {
            table: RwLock::new(table),
        }
    }

    /// Overwrite one entry, returning the state it replaced. Setting a pair
    /// to its current state is a no-op for the table but still counts as a
    /// command, so callers send the datagram regardless.
    pub async fn set(&self, band: u8, screen: Screen, state: TallyState) -> TallyState {
        let mut table = self.table.write().await;
        match table.get_mut(&(band, screen)) {
            Some(slot) => mem::replace(slot, state),
            // Callers check bandeau ids against the socket registry, which
            // is built from the same config as this table.
            None => {
                table.insert((band, screen), state);
                TallyState::Off
            }
        }
    }

    /// A consistent copy of the table. Taken under the read lock, so it
    /// never observes a write halfway.
    pub async fn snapshot(&self) -> StateSnapshot {
        self.table.read().await.clone()
    }
}
