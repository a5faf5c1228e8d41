//! Room store: in-memory registry of live rooms with opportunistic eviction

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::GameSettings;

use super::error::PongError;
use super::room::{generate_room_code, Room, RoomClock};

/// Registry of all live rooms, keyed by room code.
///
/// Each room lives in one `DashMap` shard; every operation on a room runs
/// while holding that shard's write guard, so requests for the same room are
/// serialized. The shared RNG is always locked after the shard, never before.
pub struct RoomStore {
    rooms: DashMap<String, Room>,
    rng: Mutex<ChaCha8Rng>,
    settings: GameSettings,
    last_sweep_at: AtomicU64,
}

impl RoomStore {
    pub fn new(settings: GameSettings) -> Self {
        Self::with_rng(settings, ChaCha8Rng::from_entropy())
    }

    /// A store with a reproducible random source
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self::with_rng(settings, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(settings: GameSettings, rng: ChaCha8Rng) -> Self {
        Self {
            rooms: DashMap::new(),
            rng: Mutex::new(rng),
            settings,
            last_sweep_at: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Number of rooms currently held, expired or not
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Insert a room under a fresh code. The code is reserved atomically, so
    /// two concurrent creates can never share one.
    pub(crate) fn insert_new(
        &self,
        now: u64,
        build: impl FnOnce(String, &mut ChaCha8Rng) -> Room,
    ) -> String {
        self.sweep_if_due(now);

        loop {
            let code = generate_room_code(&mut *self.rng.lock());
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => {
                    debug!(code = %code, "Room code collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let mut rng = self.rng.lock();
                    slot.insert(build(code.clone(), &mut *rng));
                    return code;
                }
            }
        }
    }

    /// Run `f` against a live room while holding its lock.
    /// An expired room is removed on sight and reported as `NotFound`.
    pub(crate) fn with_room<T>(
        &self,
        code: &str,
        now: u64,
        f: impl FnOnce(&mut Room, &GameSettings, &mut ChaCha8Rng) -> Result<T, PongError>,
    ) -> Result<T, PongError> {
        self.sweep_if_due(now);

        {
            let mut room = self.rooms.get_mut(code).ok_or(PongError::NotFound)?;
            if !room.is_expired(now, &self.settings) {
                let mut rng = self.rng.lock();
                return f(room.value_mut(), &self.settings, &mut *rng);
            }
        }

        if self
            .rooms
            .remove_if(code, |_, room| room.is_expired(now, &self.settings))
            .is_some()
        {
            info!(code = %code, "Room evicted on lookup");
        }
        Err(PongError::NotFound)
    }

    /// Sweep at most once per `sweep_interval_ms`. Concurrent callers race on
    /// a compare-exchange and only the winner sweeps.
    fn sweep_if_due(&self, now: u64) {
        let last = self.last_sweep_at.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.settings.sweep_interval_ms {
            return;
        }
        if self
            .last_sweep_at
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.sweep(now);
        }
    }

    /// Remove every expired room. Returns how many were evicted.
    pub fn sweep(&self, now: u64) -> usize {
        let snapshot: Vec<(String, RoomClock)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clock()))
            .collect();

        let mut evicted = 0;
        for code in select_expired(&snapshot, now, &self.settings) {
            // Re-check under the lock: the room may have been touched since
            if self
                .rooms
                .remove_if(&code, |_, room| room.is_expired(now, &self.settings))
                .is_some()
            {
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!(evicted, remaining = self.rooms.len(), "Evicted expired rooms");
        }
        evicted
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Direct access for tests that need to stage a specific board position
    #[cfg(test)]
    pub(crate) fn edit_room(&self, code: &str, f: impl FnOnce(&mut Room)) {
        if let Some(mut room) = self.rooms.get_mut(code) {
            f(room.value_mut());
        }
    }
}

/// Pick the codes whose clocks have run out
pub fn select_expired(
    snapshot: &[(String, RoomClock)],
    now: u64,
    settings: &GameSettings,
) -> Vec<String> {
    snapshot
        .iter()
        .filter(|(_, clock)| clock.is_expired(now, settings))
        .map(|(code, _)| code.clone())
        .collect()
}
