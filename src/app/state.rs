//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::RoomStore;
use crate::util::rate_limit::{create_player_limiter, PlayerLimiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomStore>,
    pub player_limiter: Arc<PlayerLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rooms = Arc::new(RoomStore::new(config.game.clone()));
        Self::with_store(config, rooms)
    }

    /// Build state around an existing room store
    pub fn with_store(config: Config, rooms: Arc<RoomStore>) -> Self {
        let player_limiter = create_player_limiter(config.rate_limit_per_sec);

        Self {
            config: Arc::new(config),
            rooms,
            player_limiter,
        }
    }
}
