//! Simulation tuning parameters.

/// All tunable constants of the simulation.
///
/// Defaults follow the classic tuning of the game; the binary overrides a
/// subset from command-line arguments.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Tick period in milliseconds.
    pub ms_per_frame: u64,
    /// Side length of the square world. Coordinates run from `-world_size / 2`
    /// to `world_size / 2` on both axes.
    pub world_size: f64,
    pub ship_collision_radius: f64,
    pub star_collision_radius: f64,
    pub projectile_collision_radius: f64,
    /// Health a ship spawns with.
    pub ship_hitpoints: i32,
    /// Acceleration added along the facing direction per tick of thrust.
    pub engine_strength: f64,
    /// Radians a ship turns per tick of a turn command.
    pub turn_rate: f64,
    /// Units a projectile travels per tick.
    pub projectile_speed: f64,
    pub projectile_damage: i32,
    /// Minimum ticks between two shots from the same ship.
    pub fire_cooldown_frames: u32,
    /// Ticks a destroyed ship waits before respawning.
    pub respawn_delay_frames: u32,
    /// Gravitational pull of a star, in units of acceleration per tick.
    pub star_mass: f64,
    pub star_count: u32,
    pub max_clients: usize,
    /// Seed for the simulation RNG; random from entropy when unset.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            ms_per_frame: 16,
            world_size: 750.0,
            ship_collision_radius: 20.0,
            star_collision_radius: 35.0,
            projectile_collision_radius: 0.0,
            ship_hitpoints: 5,
            engine_strength: 0.08,
            turn_rate: 0.035,
            projectile_speed: 15.0,
            projectile_damage: 1,
            fire_cooldown_frames: 6,
            respawn_delay_frames: 300,
            star_mass: 0.015,
            star_count: 1,
            max_clients: 32,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_playable() {
        let config = GameConfig::default();

        assert!(config.ms_per_frame > 0);
        assert!(config.world_size > 2.0 * config.star_collision_radius);
        assert!(config.ship_hitpoints > 0);
        assert!(config.projectile_speed > 0.0);
        assert!(config.rng_seed.is_none());
    }
}
