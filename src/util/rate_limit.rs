//! Rate limiting utilities

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::game::PlayerId;

/// Rate limiter keyed by player identity
pub type PlayerLimiter = RateLimiter<PlayerId, DefaultKeyedStateStore<PlayerId>, DefaultClock>;

/// Create a per-player rate limiter with the specified requests per second.
/// Clients poll state every ~80 ms and push paddle input every ~45 ms, so a
/// well-behaved player stays around 35 requests per second.
pub fn create_player_limiter(requests_per_second: u32) -> Arc<PlayerLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}
