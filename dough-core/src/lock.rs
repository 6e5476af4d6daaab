//! Persisted poolish lock.
//!
//! Once every poolish confirmation is ticked the poolish is physically
//! mixed, so its flour/water are frozen here and the engine stops picking
//! a size on its own.

use log::info;
use serde::{Deserialize, Serialize};

use crate::inputs::{coerce_int, parse_int};
use crate::store::{KeyValueStore, Namespaced};

pub const LOCKED_KEY: &str = "poolishLocked";
pub const FLOUR_KEY: &str = "lockedPoolishFlour";
pub const WATER_KEY: &str = "lockedPoolishWater";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolishLock {
    pub flour_g: i64,
    pub water_g: i64,
}

impl PoolishLock {
    /// A zero water amount means "same as flour" (100% poolish).
    pub fn new(flour_g: i64, water_g: i64) -> Self {
        let water_g = if water_g == 0 { flour_g } else { water_g };
        Self { flour_g, water_g }
    }

    /// The active lock, if any. Unreadable flour counts as 0 and unreadable
    /// water falls back to the flour amount.
    pub fn load<S: KeyValueStore>(store: &Namespaced<S>) -> Option<Self> {
        if store.get(LOCKED_KEY).as_deref() != Some("true") {
            return None;
        }
        let flour_g = store.get(FLOUR_KEY).map(|v| coerce_int(&v)).unwrap_or(0);
        let water_g = store
            .get(WATER_KEY)
            .and_then(|v| parse_int(&v))
            .unwrap_or(flour_g);
        Some(Self { flour_g, water_g })
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut Namespaced<S>) {
        info!(
            "locking poolish at {} g flour / {} g water",
            self.flour_g, self.water_g
        );
        store.set(LOCKED_KEY, "true");
        store.set(FLOUR_KEY, &self.flour_g.to_string());
        store.set(WATER_KEY, &self.water_g.to_string());
    }

    pub fn clear<S: KeyValueStore>(store: &mut Namespaced<S>) {
        if store.get(LOCKED_KEY).is_some() {
            info!("releasing poolish lock");
        }
        store.remove(LOCKED_KEY);
        store.remove(FLOUR_KEY);
        store.remove(WATER_KEY);
    }
}
