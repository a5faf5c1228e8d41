//! Paddle input from players

use tracing::trace;

use super::error::PongError;
use super::room::{PlayerId, Role};
use super::store::RoomStore;

impl RoomStore {
    /// Move the caller's own paddle. The position is clamped to the board;
    /// the ball is not advanced here.
    pub fn submit_input(
        &self,
        code: &str,
        requester_id: PlayerId,
        y: f64,
        now: u64,
    ) -> Result<(), PongError> {
        if !y.is_finite() {
            return Err(PongError::InvalidArgument("y"));
        }

        self.with_room(code, now, |room, settings, _| {
            let role = room.require_role(requester_id)?;
            // Clamp in f64: values past f32::MAX narrow to infinity
            let y = y.clamp(0.0, f64::from(settings.max_paddle_y())) as f32;
            match role {
                Role::Host => room.host_y = y,
                Role::Guest => room.guest_y = y,
            }
            room.touch(now);

            trace!(code = %room.code, ?role, y, "Paddle moved");
            Ok(())
        })
    }
}
