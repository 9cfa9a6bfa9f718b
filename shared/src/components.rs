use crate::vector::Vector2D;
use serde::{Deserialize, Serialize};

/// Behavior common to every simulated entity.
///
/// Each component has an id that is unique within its kind for its lifetime,
/// a location and facing direction in world coordinates, and an active flag.
pub trait GameComponent {
    fn id(&self) -> u32;
    fn location(&self) -> Vector2D;
    fn direction(&self) -> Vector2D;
    fn is_active(&self) -> bool;
}

/// A player-controlled ship.
///
/// Fields marked `serde(skip)` are server-side bookkeeping and never leave
/// the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub id: u32,
    /// Id of the client session that owns this ship.
    pub owner: u32,
    /// Player name sent during the connect handshake.
    pub name: String,
    pub location: Vector2D,
    pub direction: Vector2D,
    pub health: i32,
    pub score: u32,
    #[serde(skip)]
    pub velocity: Vector2D,
    /// Ticks left until a dead ship may respawn.
    #[serde(skip)]
    pub respawn_frames: u32,
}

impl Ship {
    /// Creates a dead ship for a new player.
    /// The spawn phase of the next tick gives it a location and health.
    pub fn new(id: u32, owner: u32, name: String) -> Self {
        Ship {
            id,
            owner,
            name,
            location: Vector2D::ZERO,
            direction: Vector2D::new(0.0, 1.0),
            health: 0,
            score: 0,
            velocity: Vector2D::ZERO,
            respawn_frames: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// The tip of the ship, where projectiles leave from.
    pub fn nose(&self, radius: f64) -> Vector2D {
        self.location.add(&self.direction.scale(radius))
    }
}

impl GameComponent for Ship {
    fn id(&self) -> u32 {
        self.id
    }

    fn location(&self) -> Vector2D {
        self.location
    }

    fn direction(&self) -> Vector2D {
        self.direction
    }

    fn is_active(&self) -> bool {
        self.is_alive()
    }
}

/// A projectile in flight. Moves with a constant velocity until it leaves
/// the world or hits something.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Id of the ship that fired this projectile.
    pub owner: u32,
    pub location: Vector2D,
    pub direction: Vector2D,
    pub active: bool,
    #[serde(skip)]
    pub velocity: Vector2D,
}

impl Projectile {
    pub fn new(id: u32, owner: u32, location: Vector2D, direction: Vector2D, velocity: Vector2D) -> Self {
        Projectile {
            id,
            owner,
            location,
            direction,
            active: true,
            velocity,
        }
    }
}

impl GameComponent for Projectile {
    fn id(&self) -> u32 {
        self.id
    }

    fn location(&self) -> Vector2D {
        self.location
    }

    fn direction(&self) -> Vector2D {
        self.direction
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// A fixed star. Ships and projectiles die on contact; its mass pulls
/// ships toward it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub id: u32,
    pub location: Vector2D,
    pub radius: f64,
    pub mass: f64,
}

impl Star {
    pub fn new(id: u32, location: Vector2D, radius: f64, mass: f64) -> Self {
        Star {
            id,
            location,
            radius,
            mass,
        }
    }
}

impl GameComponent for Star {
    fn id(&self) -> u32 {
        self.id
    }

    fn location(&self) -> Vector2D {
        self.location
    }

    fn direction(&self) -> Vector2D {
        Vector2D::ZERO
    }

    fn is_active(&self) -> bool {
        true
    }
}
