//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,

    /// HS256 secret used by the hub to sign session tokens
    pub auth_jwt_secret: String,
    /// Allowed client origin for CORS (comma-separated)
    pub client_origin: String,
    /// Requests per second allowed per player on match endpoints
    pub rate_limit_per_sec: u32,

    /// Board geometry and match tuning
    pub game: GameSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let log_json = match env::var("LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => true,
            Ok(format) if format.eq_ignore_ascii_case("text") => false,
            Ok(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
            Err(_) => false,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json,

            auth_jwt_secret: env::var("AUTH_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("AUTH_JWT_SECRET"))?,
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            rate_limit_per_sec: env_or("RATE_LIMIT_PER_SEC", 60)?,

            game: GameSettings::from_env()?,
        })
    }
}

/// Board geometry, physics tuning and room lifetimes.
///
/// Velocities are expressed in board units per nominal 60 Hz frame; the
/// stepper scales them by the real elapsed time of each tick.
#[derive(Clone, Debug)]
pub struct GameSettings {
    pub board_width: f32,
    pub board_height: f32,
    pub paddle_height: f32,
    pub paddle_width: f32,
    /// Gap between each board edge and the outer face of its paddle
    pub paddle_offset: f32,
    pub ball_radius: f32,

    /// Horizontal speed of every fresh serve
    pub serve_speed: f32,
    /// Vertical serve velocity is drawn from `[-serve_max_vy, serve_max_vy]`
    pub serve_max_vy: f32,
    /// Horizontal speed gained on each paddle hit
    pub speed_increment: f32,
    /// Cap on horizontal speed within a rally
    pub max_speed: f32,
    /// Vertical exit speed for a hit on the very edge of a paddle
    pub max_bounce_vy: f32,
    /// How far past a side edge the ball must travel to count as a point
    pub score_margin: f32,
    pub winning_score: u32,

    /// Lower bound on the elapsed time fed into one tick
    pub min_tick_ms: u64,
    /// Upper bound on the elapsed time fed into one tick
    pub max_tick_ms: u64,

    /// Absolute room lifetime, measured from creation
    pub room_max_age_ms: u64,
    /// Idle threshold, measured from the last state-affecting request
    pub room_idle_ms: u64,
    /// Minimum spacing between two opportunistic eviction sweeps
    pub sweep_interval_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_width: 800.0,
            board_height: 500.0,
            paddle_height: 90.0,
            paddle_width: 12.0,
            paddle_offset: 24.0,
            ball_radius: 8.0,
            serve_speed: 6.0,
            serve_max_vy: 3.0,
            speed_increment: 0.35,
            max_speed: 11.0,
            max_bounce_vy: 6.0,
            score_margin: 20.0,
            winning_score: 7,
            min_tick_ms: 8,
            max_tick_ms: 40,
            room_max_age_ms: 2 * 60 * 60 * 1000,
            room_idle_ms: 120 * 1000,
            sweep_interval_ms: 1000,
        }
    }
}

impl GameSettings {
    /// Defaults, with the operator-facing knobs overridable from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Self {
            board_width: env_or("PONG_BOARD_WIDTH", defaults.board_width)?,
            board_height: env_or("PONG_BOARD_HEIGHT", defaults.board_height)?,
            paddle_height: env_or("PONG_PADDLE_HEIGHT", defaults.paddle_height)?,
            winning_score: env_or("PONG_WINNING_SCORE", defaults.winning_score)?,
            room_max_age_ms: env_secs_as_ms("PONG_ROOM_MAX_AGE_SECS", defaults.room_max_age_ms)?,
            room_idle_ms: env_secs_as_ms("PONG_ROOM_IDLE_SECS", defaults.room_idle_ms)?,
            ..defaults
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject geometry the stepper cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN slips through every ordered comparison below
        let lengths = [
            ("PONG_BOARD_WIDTH", self.board_width),
            ("PONG_BOARD_HEIGHT", self.board_height),
            ("PONG_PADDLE_HEIGHT", self.paddle_height),
            ("paddle_width", self.paddle_width),
            ("ball_radius", self.ball_radius),
            ("serve_speed", self.serve_speed),
            ("max_speed", self.max_speed),
        ];
        for (key, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(key));
            }
        }
        let non_negative = [
            ("paddle_offset", self.paddle_offset),
            ("serve_max_vy", self.serve_max_vy),
            ("speed_increment", self.speed_increment),
            ("max_bounce_vy", self.max_bounce_vy),
            ("score_margin", self.score_margin),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(key));
            }
        }

        if self.board_width <= 2.0 * (self.paddle_offset + self.paddle_width) {
            return Err(ConfigError::Invalid("PONG_BOARD_WIDTH"));
        }
        if self.paddle_height <= 0.0 || self.board_height <= self.paddle_height {
            return Err(ConfigError::Invalid("PONG_PADDLE_HEIGHT"));
        }
        if self.winning_score == 0 {
            return Err(ConfigError::Invalid("PONG_WINNING_SCORE"));
        }
        if self.room_idle_ms == 0 {
            return Err(ConfigError::Invalid("PONG_ROOM_IDLE_SECS"));
        }
        if self.room_max_age_ms == 0 {
            return Err(ConfigError::Invalid("PONG_ROOM_MAX_AGE_SECS"));
        }
        Ok(())
    }

    /// Highest legal paddle offset
    pub fn max_paddle_y(&self) -> f32 {
        self.board_height - self.paddle_height
    }

    /// Left edge of the host (left) paddle
    pub fn host_paddle_x(&self) -> f32 {
        self.paddle_offset
    }

    /// Left edge of the guest (right) paddle
    pub fn guest_paddle_x(&self) -> f32 {
        self.board_width - self.paddle_offset - self.paddle_width
    }
}

/// Read and parse an optional environment variable
fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Read an optional duration given in seconds, returned in milliseconds
fn env_secs_as_ms(key: &'static str, default_ms: u64) -> Result<u64, ConfigError> {
    env_or(key, default_ms / 1000)?
        .checked_mul(1000)
        .ok_or(ConfigError::Invalid(key))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = GameSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_paddle_y(), 410.0);
        assert_eq!(settings.host_paddle_x(), 24.0);
        assert_eq!(settings.guest_paddle_x(), 764.0);
    }

    #[test]
    fn default_max_speed_cannot_jump_a_paddle_in_one_tick() {
        let s = GameSettings::default();
        let frames = s.max_tick_ms as f32 / (1000.0 / 60.0);
        assert!(s.max_speed * frames < s.paddle_width + 2.0 * s.ball_radius);
    }

    #[test]
    fn paddle_taller_than_board_is_rejected() {
        let settings = GameSettings {
            paddle_height: 600.0,
            ..GameSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid("PONG_PADDLE_HEIGHT"))
        ));
    }

    #[test]
    fn non_finite_or_negative_geometry_is_rejected() {
        let cases = [
            (
                GameSettings {
                    board_height: f32::NAN,
                    ..GameSettings::default()
                },
                "PONG_BOARD_HEIGHT",
            ),
            (
                GameSettings {
                    paddle_height: f32::NAN,
                    ..GameSettings::default()
                },
                "PONG_PADDLE_HEIGHT",
            ),
            (
                GameSettings {
                    board_width: f32::INFINITY,
                    ..GameSettings::default()
                },
                "PONG_BOARD_WIDTH",
            ),
            (
                GameSettings {
                    paddle_height: -90.0,
                    ..GameSettings::default()
                },
                "PONG_PADDLE_HEIGHT",
            ),
            (
                GameSettings {
                    board_height: -500.0,
                    ..GameSettings::default()
                },
                "PONG_BOARD_HEIGHT",
            ),
        ];

        for (settings, key) in cases {
            match settings.validate() {
                Err(ConfigError::Invalid(rejected)) => assert_eq!(rejected, key),
                other => panic!("{key} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn huge_durations_are_rejected_instead_of_overflowing() {
        std::env::set_var("PONG_TEST_HUGE_SECS", u64::MAX.to_string());
        std::env::set_var("PONG_TEST_SMALL_SECS", "90");

        assert!(matches!(
            env_secs_as_ms("PONG_TEST_HUGE_SECS", 1_000),
            Err(ConfigError::Invalid("PONG_TEST_HUGE_SECS"))
        ));
        assert_eq!(env_secs_as_ms("PONG_TEST_SMALL_SECS", 1_000).unwrap(), 90_000);
        assert_eq!(env_secs_as_ms("PONG_TEST_UNSET_SECS", 7_000).unwrap(), 7_000);
    }

    #[test]
    fn zero_winning_score_is_rejected() {
        let settings = GameSettings {
            winning_score: 0,
            ..GameSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid("PONG_WINNING_SCORE"))
        ));
    }
}
