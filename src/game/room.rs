//! Room state: the authoritative record of one match

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::config::GameSettings;

use super::error::PongError;
use super::physics::PhysicsStepper;

/// Opaque player identity, as issued by the hub's session tokens
pub type PlayerId = Uuid;

/// Characters allowed in room codes (no I, O, 0 or 1)
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 6;

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Host is alone in the room
    Waiting,
    /// Both players present, ball in play
    Playing,
    /// A side reached the winning score
    Finished,
}

/// The two fixed seats in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
}

/// Match state (owned by the room store)
#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub status: RoomStatus,
    pub host: Participant,
    pub guest: Option<Participant>,
    pub host_y: f32,
    pub guest_y: f32,
    pub host_score: u32,
    pub guest_score: u32,
    pub ball: Ball,
    pub winner: Option<Role>,
    pub created_at: u64,
    pub updated_at: u64,
    pub last_tick_at: u64,
}

impl Room {
    /// A fresh room in `waiting` with only the host seated
    pub fn new<R: Rng>(
        code: String,
        host: Participant,
        settings: &GameSettings,
        rng: &mut R,
        now: u64,
    ) -> Self {
        let centre_y = settings.max_paddle_y() / 2.0;
        Self {
            code,
            status: RoomStatus::Waiting,
            host,
            guest: None,
            host_y: centre_y,
            guest_y: centre_y,
            host_score: 0,
            guest_score: 0,
            ball: PhysicsStepper::serve(random_side(rng), settings, rng),
            winner: None,
            created_at: now,
            updated_at: now,
            last_tick_at: now,
        }
    }

    /// Seat a player by identity
    pub fn role_of(&self, id: PlayerId) -> Option<Role> {
        if self.host.id == id {
            Some(Role::Host)
        } else if self.guest.as_ref().is_some_and(|g| g.id == id) {
            Some(Role::Guest)
        } else {
            None
        }
    }

    pub fn require_role(&self, id: PlayerId) -> Result<Role, PongError> {
        self.role_of(id).ok_or(PongError::Forbidden)
    }

    /// Zero the scores and put a new ball in play
    pub fn reset_match<R: Rng>(&mut self, settings: &GameSettings, rng: &mut R, now: u64) {
        self.status = RoomStatus::Playing;
        self.host_score = 0;
        self.guest_score = 0;
        self.winner = None;
        self.ball = PhysicsStepper::serve(random_side(rng), settings, rng);
        self.last_tick_at = now;
        self.updated_at = now;
    }

    pub fn touch(&mut self, now: u64) {
        self.updated_at = self.updated_at.max(now);
    }

    pub fn clock(&self) -> RoomClock {
        RoomClock {
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn is_expired(&self, now: u64, settings: &GameSettings) -> bool {
        self.clock().is_expired(now, settings)
    }
}

/// The two timestamps that drive eviction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomClock {
    pub created_at: u64,
    pub updated_at: u64,
}

impl RoomClock {
    /// Too old in absolute terms, or idle for too long
    pub fn is_expired(&self, now: u64, settings: &GameSettings) -> bool {
        now.saturating_sub(self.created_at) > settings.room_max_age_ms
            || now.saturating_sub(self.updated_at) > settings.room_idle_ms
    }
}

fn random_side<R: Rng>(rng: &mut R) -> Role {
    if rng.gen_bool(0.5) {
        Role::Host
    } else {
        Role::Guest
    }
}

/// Generate a random room code
pub fn generate_room_code<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and upper-case a client-supplied code, rejecting anything outside the alphabet
pub fn normalize_room_code(raw: &str) -> Result<String, PongError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
        Ok(code)
    } else {
        Err(PongError::InvalidArgument("code"))
    }
}
