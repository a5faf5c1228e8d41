//! Pong match engine: room store, lifecycle, physics and snapshots

pub mod error;
pub mod input;
pub mod lifecycle;
pub mod physics;
pub mod room;
pub mod snapshot;
pub mod store;

pub use error::PongError;
pub use room::{normalize_room_code, PlayerId, Role};
pub use snapshot::RoomView;
pub use store::RoomStore;
