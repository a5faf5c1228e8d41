//! Ball physics: lazy, elapsed-time driven stepping of one room

use rand::Rng;

use crate::config::GameSettings;

use super::room::{Ball, Role, Room, RoomStatus};

/// Length of one nominal 60 Hz frame, the unit velocities are expressed in
pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

/// What a single step did to the room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Room not in play, nothing moved
    Idle,
    /// Ball moved, no point scored
    Moved,
    /// A point was scored and the ball re-served
    Scored(Role),
    /// A point was scored and it ended the match
    Finished(Role),
}

/// Physics system for advancing a room's ball and scores
pub struct PhysicsStepper;

impl PhysicsStepper {
    /// Convert the wall-clock gap since the last tick into a frame multiplier.
    /// The gap is clamped so bursty polls still make progress and long gaps
    /// cannot teleport the ball across the board.
    pub fn step_multiplier(last_tick_at: u64, now: u64, settings: &GameSettings) -> f32 {
        let elapsed = now
            .saturating_sub(last_tick_at)
            .clamp(settings.min_tick_ms, settings.max_tick_ms);
        elapsed as f32 / NOMINAL_FRAME_MS
    }

    /// Advance the room to `now`. Only a `playing` room moves.
    pub fn advance<R: Rng>(
        room: &mut Room,
        settings: &GameSettings,
        rng: &mut R,
        now: u64,
    ) -> StepOutcome {
        if room.status != RoomStatus::Playing {
            room.last_tick_at = now;
            return StepOutcome::Idle;
        }

        let step = Self::step_multiplier(room.last_tick_at, now, settings);
        room.last_tick_at = now;

        let ball = &mut room.ball;
        ball.x += ball.vx * step;
        ball.y += ball.vy * step;

        Self::reflect_walls(ball, settings);

        if room.ball.vx < 0.0 {
            Self::collide_paddle(&mut room.ball, Role::Host, room.host_y, settings);
        } else if room.ball.vx > 0.0 {
            Self::collide_paddle(&mut room.ball, Role::Guest, room.guest_y, settings);
        }

        let scorer = if room.ball.x < -settings.score_margin {
            Role::Guest
        } else if room.ball.x > settings.board_width + settings.score_margin {
            Role::Host
        } else {
            return StepOutcome::Moved;
        };

        let score = match scorer {
            Role::Host => &mut room.host_score,
            Role::Guest => &mut room.guest_score,
        };
        *score += 1;

        if *score >= settings.winning_score {
            room.status = RoomStatus::Finished;
            room.winner = Some(scorer);
            return StepOutcome::Finished(scorer);
        }

        room.ball = Self::serve(scorer.opponent(), settings, rng);
        StepOutcome::Scored(scorer)
    }

    /// A centred ball at serve speed, heading toward `toward`'s side.
    /// Vertical velocity is re-rolled on every serve.
    pub fn serve<R: Rng>(toward: Role, settings: &GameSettings, rng: &mut R) -> Ball {
        let direction = match toward {
            Role::Host => -1.0,
            Role::Guest => 1.0,
        };
        let vy = if settings.serve_max_vy > 0.0 {
            rng.gen_range(-settings.serve_max_vy..=settings.serve_max_vy)
        } else {
            0.0
        };

        Ball {
            x: settings.board_width / 2.0,
            y: settings.board_height / 2.0,
            vx: direction * settings.serve_speed,
            vy,
            r: settings.ball_radius,
        }
    }

    /// Elastic bounce off the top and bottom walls
    fn reflect_walls(ball: &mut Ball, settings: &GameSettings) {
        if ball.y - ball.r < 0.0 {
            ball.y = ball.r;
            ball.vy = ball.vy.abs();
        } else if ball.y + ball.r > settings.board_height {
            ball.y = settings.board_height - ball.r;
            ball.vy = -ball.vy.abs();
        }
    }

    /// Bounce off `side`'s paddle if the ball's bounding box overlaps it.
    /// Callers only test the paddle the ball is travelling toward.
    fn collide_paddle(ball: &mut Ball, side: Role, paddle_y: f32, settings: &GameSettings) {
        let paddle_x = match side {
            Role::Host => settings.host_paddle_x(),
            Role::Guest => settings.guest_paddle_x(),
        };

        let overlaps = ball.x + ball.r >= paddle_x
            && ball.x - ball.r <= paddle_x + settings.paddle_width
            && ball.y + ball.r >= paddle_y
            && ball.y - ball.r <= paddle_y + settings.paddle_height;
        if !overlaps {
            return;
        }

        let half = settings.paddle_height / 2.0;
        let t = ((ball.y - (paddle_y + half)) / half).clamp(-1.0, 1.0);
        let speed = (ball.vx.abs() + settings.speed_increment).min(settings.max_speed);

        match side {
            Role::Host => {
                ball.vx = speed;
                ball.x = paddle_x + settings.paddle_width + ball.r + 0.5;
            }
            Role::Guest => {
                ball.vx = -speed;
                ball.x = paddle_x - ball.r - 0.5;
            }
        }
        ball.vy = t * settings.max_bounce_vy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::Participant;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn playing_room(settings: &GameSettings, rng: &mut ChaCha8Rng) -> Room {
        let host = Participant {
            id: Uuid::new_v4(),
            name: "host".into(),
        };
        let mut room = Room::new("ABCDEF".into(), host, settings, rng, 0);
        room.guest = Some(Participant {
            id: Uuid::new_v4(),
            name: "guest".into(),
        });
        room.reset_match(settings, rng, 0);
        room
    }

    #[test]
    fn step_multiplier_is_clamped() {
        let s = GameSettings::default();
        assert_eq!(PhysicsStepper::step_multiplier(100, 100, &s), 8.0 / NOMINAL_FRAME_MS);
        assert_eq!(PhysicsStepper::step_multiplier(100, 50, &s), 8.0 / NOMINAL_FRAME_MS);
        assert_eq!(PhysicsStepper::step_multiplier(0, 20, &s), 20.0 / NOMINAL_FRAME_MS);
        assert_eq!(PhysicsStepper::step_multiplier(0, 10_000, &s), 40.0 / NOMINAL_FRAME_MS);
    }

    #[test]
    fn serve_is_centred_at_base_speed() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let ball = PhysicsStepper::serve(Role::Host, &s, &mut rng);
            assert_eq!((ball.x, ball.y), (400.0, 250.0));
            assert_eq!(ball.vx, -s.serve_speed);
            assert!(ball.vy.abs() <= s.serve_max_vy);

            let ball = PhysicsStepper::serve(Role::Guest, &s, &mut rng);
            assert_eq!(ball.vx, s.serve_speed);
        }
    }

    #[test]
    fn waiting_room_does_not_move() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let host = Participant {
            id: Uuid::new_v4(),
            name: "host".into(),
        };
        let mut room = Room::new("ABCDEF".into(), host, &s, &mut rng, 0);
        let before = room.ball;

        assert_eq!(PhysicsStepper::advance(&mut room, &s, &mut rng, 40), StepOutcome::Idle);
        assert_eq!(room.ball, before);
        assert_eq!(room.last_tick_at, 40);
    }

    #[test]
    fn ball_reflects_off_top_wall() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut room = playing_room(&s, &mut rng);
        room.ball = Ball {
            x: 400.0,
            y: 10.0,
            vx: 6.0,
            vy: -5.0,
            r: 8.0,
        };

        PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert_eq!(room.ball.y, 8.0);
        assert_eq!(room.ball.vy, 5.0);
    }

    #[test]
    fn ball_reflects_off_bottom_wall() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut room = playing_room(&s, &mut rng);
        room.ball = Ball {
            x: 400.0,
            y: 490.0,
            vx: -6.0,
            vy: 5.0,
            r: 8.0,
        };

        PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert_eq!(room.ball.y, 492.0);
        assert_eq!(room.ball.vy, -5.0);
    }

    #[test]
    fn centre_hit_on_host_paddle_returns_flat_and_faster() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut room = playing_room(&s, &mut rng);
        room.host_y = 200.0;
        // Paddle centre is at y = 245; the ball arrives there next step
        room.ball = Ball {
            x: 50.0,
            y: 245.0,
            vx: -6.0,
            vy: 0.0,
            r: 8.0,
        };

        PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert!((room.ball.vx - 6.35).abs() < 1e-5);
        assert_eq!(room.ball.vy, 0.0);
        assert!(room.ball.x - room.ball.r > s.host_paddle_x() + s.paddle_width);
    }

    #[test]
    fn edge_hit_on_guest_paddle_exits_steeply() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut room = playing_room(&s, &mut rng);
        room.guest_y = 100.0;
        room.ball = Ball {
            x: 750.0,
            y: 100.0,
            vx: 6.0,
            vy: 0.0,
            r: 8.0,
        };

        PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert!(room.ball.vx < 0.0);
        assert_eq!(room.ball.vy, -s.max_bounce_vy);
        assert!(room.ball.x + room.ball.r < s.guest_paddle_x());
    }

    #[test]
    fn ball_leaving_a_paddle_is_not_hit_again() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut room = playing_room(&s, &mut rng);
        room.host_y = 200.0;
        // Overlapping the host paddle but already heading right
        room.ball = Ball {
            x: 36.0,
            y: 245.0,
            vx: 6.0,
            vy: 0.0,
            r: 8.0,
        };

        PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert_eq!(room.ball.vx, 6.0);
    }

    #[test]
    fn rally_speed_never_decreases_and_is_capped() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        let mut room = playing_room(&s, &mut rng);
        room.ball.vy = 0.0;

        let mut now = 0;
        let mut last_speed = room.ball.vx.abs();
        let mut hits = 0;
        let mut last_sign = room.ball.vx.signum();
        while hits < 40 {
            // Paddles track the ball perfectly
            room.host_y = (room.ball.y - s.paddle_height / 2.0).clamp(0.0, s.max_paddle_y());
            room.guest_y = room.host_y;
            now += 40;
            let outcome = PhysicsStepper::advance(&mut room, &s, &mut rng, now);
            assert_eq!(outcome, StepOutcome::Moved);

            let speed = room.ball.vx.abs();
            assert!(speed >= last_speed);
            assert!(speed <= s.max_speed);
            if room.ball.vx.signum() != last_sign {
                hits += 1;
                last_sign = room.ball.vx.signum();
            }
            last_speed = speed;
        }
        assert_eq!(last_speed, s.max_speed);
    }

    #[test]
    fn crossing_the_left_edge_scores_for_guest_and_reserves() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let mut room = playing_room(&s, &mut rng);
        room.host_y = 0.0;
        room.ball = Ball {
            x: -10.0,
            y: 400.0,
            vx: -9.0,
            vy: 0.0,
            r: 8.0,
        };

        let outcome = PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert_eq!(outcome, StepOutcome::Scored(Role::Guest));
        assert_eq!((room.host_score, room.guest_score), (0, 1));
        assert_eq!(room.ball.x, s.board_width / 2.0);
        // Re-served toward the host at base speed
        assert_eq!(room.ball.vx, -s.serve_speed);
    }

    #[test]
    fn winning_point_finishes_and_freezes_the_room() {
        let s = GameSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(29);
        let mut room = playing_room(&s, &mut rng);
        room.host_score = s.winning_score - 1;
        room.ball = Ball {
            x: 815.0,
            y: 250.0,
            vx: 9.0,
            vy: 0.0,
            r: 8.0,
        };
        room.guest_y = 0.0;

        let outcome = PhysicsStepper::advance(&mut room, &s, &mut rng, 40);
        assert_eq!(outcome, StepOutcome::Finished(Role::Host));
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.winner, Some(Role::Host));

        let frozen = room.ball;
        assert_eq!(PhysicsStepper::advance(&mut room, &s, &mut rng, 80), StepOutcome::Idle);
        assert_eq!(room.ball, frozen);
        assert_eq!(room.host_score, s.winning_score);
    }
}
