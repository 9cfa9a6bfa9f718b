//! Types shared between the game server and its clients: 2D vector math,
//! the game component data model, and the wire protocol messages.

pub mod components;
pub mod protocol;
pub mod vector;

pub use components::{GameComponent, Projectile, Ship, Star};
pub use protocol::{Command, CommandParseError, TurnIntent, Welcome, WorldSnapshot};
pub use vector::Vector2D;
