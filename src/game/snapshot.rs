//! Per-player state snapshots for polling clients

use serde::Serialize;
use tracing::{debug, info};

use super::error::PongError;
use super::physics::{PhysicsStepper, StepOutcome};
use super::room::{PlayerId, Role, Room, RoomStatus};
use super::store::RoomStore;

/// Everything a client needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    /// The requester's own seat
    pub role: Role,
    pub status: RoomStatus,
    pub winner: Option<Role>,
    pub players: PlayersView,
    pub paddles: PaddlesView,
    pub ball: BallView,
    pub scores: ScoresView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayersView {
    pub host: String,
    pub guest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddlesView {
    pub host_y: f32,
    pub guest_y: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BallView {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoresView {
    pub host: u32,
    pub guest: u32,
}

impl RoomView {
    pub fn project(room: &Room, role: Role, paddle_height: f32) -> Self {
        Self {
            role,
            status: room.status,
            winner: room.winner,
            players: PlayersView {
                host: room.host.name.clone(),
                guest: room.guest.as_ref().map(|g| g.name.clone()),
            },
            paddles: PaddlesView {
                host_y: room.host_y,
                guest_y: room.guest_y,
                height: paddle_height,
            },
            ball: BallView {
                x: room.ball.x,
                y: room.ball.y,
                vx: room.ball.vx,
                vy: room.ball.vy,
                r: room.ball.r,
            },
            scores: ScoresView {
                host: room.host_score,
                guest: room.guest_score,
            },
        }
    }
}

impl RoomStore {
    /// Advance the room to `now` and return it from the requester's seat.
    /// Observing a room is what drives its simulation.
    pub fn get_state(
        &self,
        code: &str,
        requester_id: PlayerId,
        now: u64,
    ) -> Result<RoomView, PongError> {
        self.with_room(code, now, |room, settings, rng| {
            let role = room.require_role(requester_id)?;

            match PhysicsStepper::advance(room, settings, rng, now) {
                StepOutcome::Scored(scorer) => debug!(
                    code = %room.code,
                    ?scorer,
                    host = room.host_score,
                    guest = room.guest_score,
                    "Point scored"
                ),
                StepOutcome::Finished(winner) => info!(
                    code = %room.code,
                    ?winner,
                    host = room.host_score,
                    guest = room.guest_score,
                    "Match finished"
                ),
                StepOutcome::Idle | StepOutcome::Moved => {}
            }
            room.touch(now);

            Ok(RoomView::project(room, role, settings.paddle_height))
        })
    }
}
