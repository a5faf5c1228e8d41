//! Room lifecycle: create, join and restart

use tracing::info;

use super::error::PongError;
use super::room::{Participant, PlayerId, Role, Room};
use super::store::RoomStore;

impl RoomStore {
    /// Open a new room with the creator seated as host
    pub fn create_room(
        &self,
        creator_id: PlayerId,
        creator_name: &str,
        now: u64,
    ) -> (String, Role) {
        let host = Participant {
            id: creator_id,
            name: creator_name.to_string(),
        };
        let code = self.insert_new(now, |code, rng| {
            Room::new(code, host, self.settings(), rng, now)
        });

        info!(code = %code, user_id = %creator_id, "Room created");
        (code, Role::Host)
    }

    /// Take the guest seat, or return the seat the caller already holds
    pub fn join_room(
        &self,
        code: &str,
        joiner_id: PlayerId,
        joiner_name: &str,
        now: u64,
    ) -> Result<Role, PongError> {
        self.with_room(code, now, |room, settings, rng| {
            if let Some(role) = room.role_of(joiner_id) {
                room.touch(now);
                return Ok(role);
            }
            if room.guest.is_some() {
                return Err(PongError::RoomFull);
            }

            room.guest = Some(Participant {
                id: joiner_id,
                name: joiner_name.to_string(),
            });
            room.reset_match(settings, rng, now);

            info!(code = %room.code, user_id = %joiner_id, "Player joined room");
            Ok(Role::Guest)
        })
    }

    /// Start a fresh match with the same two players
    pub fn restart_room(
        &self,
        code: &str,
        requester_id: PlayerId,
        now: u64,
    ) -> Result<(), PongError> {
        self.with_room(code, now, |room, settings, rng| {
            let role = room.require_role(requester_id)?;
            if room.guest.is_none() {
                return Err(PongError::NeedSecondPlayer);
            }

            let previous = room.status;
            room.reset_match(settings, rng, now);

            info!(code = %room.code, ?role, from = ?previous, "Room restarted");
            Ok(())
        })
    }
}
