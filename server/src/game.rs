//! The authoritative simulation state and the per-tick pipeline.

use crate::client_manager::ClientManager;
use crate::config::GameConfig;
use crate::world::World;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::{GameComponent, Projectile, Ship, Star, TurnIntent, Vector2D, WorldSnapshot};
use std::f64::consts::TAU;

/// Owns the world and advances it one tick at a time.
///
/// All world mutation happens inside [`tick`], which runs the phases in a
/// fixed order: cleanup, ship spawning, projectile spawning, ship motion,
/// projectile motion, wrapping, collision. Client commands are read from the
/// session registry at tick time; nothing else writes to the world.
///
/// [`tick`]: Game::tick
pub struct Game {
    pub world: World,
    config: GameConfig,
    rng: ChaCha8Rng,
    tick: u64,
}

impl Game {
    /// Creates a game world with the configured star field.
    pub fn new(config: GameConfig) -> Self {
        let mut rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut world = World::new(config.world_size);
        for i in 0..config.star_count {
            // The first star sits at the center; extras scatter over the
            // inner half of the world.
            let location = if i == 0 {
                Vector2D::ZERO
            } else {
                let spread = world.bounds() / 2.0;
                Vector2D::new(rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
            };
            world.add_star(Star::new(
                0,
                location,
                config.star_collision_radius,
                config.star_mass,
            ));
        }

        Game {
            world,
            config,
            rng,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one tick of the simulation pipeline.
    ///
    /// Never fails: an empty world or an empty registry is a valid state.
    pub fn tick(&mut self, clients: &mut ClientManager) {
        self.cleanup(clients);
        self.spawn_ships(clients);
        self.spawn_projectiles(clients);
        self.ship_motion(clients);
        self.projectile_motion();
        self.wrapping();
        self.collisions();
        self.tick += 1;
    }

    /// The state of all live components, for broadcasting.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            ships: self.world.ships().cloned().collect(),
            projectiles: self
                .world
                .projectiles()
                .filter(|projectile| projectile.is_active())
                .cloned()
                .collect(),
            stars: self.world.stars().cloned().collect(),
        }
    }

    /// Removes projectiles that died last tick and ships whose owner is gone.
    fn cleanup(&mut self, clients: &ClientManager) {
        self.world.retain_projectiles(|_, projectile| projectile.active);

        let orphaned: Vec<u32> = self
            .world
            .ships()
            .filter(|ship| !clients.is_connected(ship.owner))
            .map(|ship| ship.id)
            .collect();

        for ship_id in orphaned {
            if let Some(ship) = self.world.remove_ship(ship_id) {
                info!("Reclaimed ship {} ('{}')", ship_id, ship.name);
            }
        }
    }

    /// Creates ships for new sessions and respawns dead ones whose respawn
    /// delay has elapsed.
    fn spawn_ships(&mut self, clients: &mut ClientManager) {
        for client in clients.connected_sessions_mut() {
            let ship_id = match client.ship_id {
                Some(ship_id) => ship_id,
                None => {
                    let ship_id = self
                        .world
                        .add_ship(Ship::new(0, client.id, client.name.clone()));
                    client.ship_id = Some(ship_id);
                    ship_id
                }
            };

            let (alive, waiting) = match self.world.ship(ship_id) {
                Some(ship) => (ship.is_alive(), ship.respawn_frames > 0),
                None => continue,
            };
            if alive {
                continue;
            }
            if waiting {
                if let Some(ship) = self.world.ship_mut(ship_id) {
                    ship.respawn_frames -= 1;
                }
                continue;
            }

            let location = self.world.find_ship_spawn_location(
                &mut self.rng,
                self.config.star_collision_radius,
                self.config.ship_collision_radius,
            );
            debug_assert!(self.world.in_bounds(&location));
            let angle = self.rng.gen::<f64>() * TAU;
            let direction = Vector2D::new(angle.cos(), angle.sin());

            if let Some(ship) = self.world.ship_mut(ship_id) {
                ship.location = location;
                ship.direction = direction;
                ship.velocity = Vector2D::ZERO;
                ship.health = self.config.ship_hitpoints;
                info!(
                    "Ship {} ('{}') spawned at ({:.1}, {:.1})",
                    ship_id, ship.name, location.x, location.y
                );
            }
        }
    }

    /// Fires projectiles for sessions whose fire intent and cooldown allow it.
    fn spawn_projectiles(&mut self, clients: &mut ClientManager) {
        for client in clients.connected_sessions_mut() {
            if client.fire_cooldown > 0 {
                client.fire_cooldown -= 1;
            }
            if !client.command.fire || client.fire_cooldown > 0 {
                continue;
            }

            let ship_id = match client.ship_id {
                Some(ship_id) => ship_id,
                None => continue,
            };
            let projectile = match self.world.ship(ship_id) {
                Some(ship) if ship.is_alive() => Projectile::new(
                    0,
                    ship.id,
                    ship.nose(self.config.ship_collision_radius),
                    ship.direction,
                    ship.direction.scale(self.config.projectile_speed),
                ),
                _ => continue,
            };

            let projectile_id = self.world.add_projectile(projectile);
            client.fire_cooldown = self.config.fire_cooldown_frames;
            debug!("Ship {} fired projectile {}", ship_id, projectile_id);
        }
    }

    /// Applies turn, thrust and star gravity to every live ship, then
    /// integrates velocity into location.
    ///
    /// The one-shot fire flag is cleared here; turn and thrust persist until
    /// the client sends a new command.
    fn ship_motion(&mut self, clients: &mut ClientManager) {
        let stars: Vec<(Vector2D, f64)> = self
            .world
            .stars()
            .map(|star| (star.location, star.mass))
            .collect();

        for client in clients.connected_sessions_mut() {
            let command = client.command;
            client.command.fire = false;

            let ship = match client.ship_id.and_then(|ship_id| self.world.ship_mut(ship_id)) {
                Some(ship) if ship.is_alive() => ship,
                _ => continue,
            };

            match command.turn {
                TurnIntent::Left => {
                    ship.direction = ship.direction.rotate(self.config.turn_rate);
                }
                TurnIntent::Right => {
                    ship.direction = ship.direction.rotate(-self.config.turn_rate);
                }
                TurnIntent::None => {}
            }

            if command.thrust {
                ship.velocity = ship
                    .velocity
                    .add(&ship.direction.scale(self.config.engine_strength));
            }

            for (star_location, mass) in &stars {
                let pull = star_location.subtract(&ship.location).normalize().scale(*mass);
                ship.velocity = ship.velocity.add(&pull);
            }

            ship.location = ship.location.add(&ship.velocity);
        }
    }

    /// Moves projectiles and marks those that left the world as dead.
    ///
    /// Dead projectiles stay in the world until the next tick's cleanup so
    /// this phase never removes from the collection it iterates.
    fn projectile_motion(&mut self) {
        let bounds = self.world.bounds();
        for projectile in self.world.projectiles_mut() {
            if !projectile.active {
                continue;
            }
            projectile.location = projectile.location.add(&projectile.velocity);
            if projectile.location.x.abs() > bounds || projectile.location.y.abs() > bounds {
                projectile.active = false;
            }
        }
    }

    /// Teleports out-of-bounds ships to the opposite edge, per axis.
    fn wrapping(&mut self) {
        let bounds = self.world.bounds();
        for ship in self.world.ships_mut() {
            if ship.location.x > bounds {
                ship.location.x = -bounds;
            } else if ship.location.x < -bounds {
                ship.location.x = bounds;
            }

            if ship.location.y > bounds {
                ship.location.y = -bounds;
            } else if ship.location.y < -bounds {
                ship.location.y = bounds;
            }
        }
    }

    /// Resolves projectile and star hits, applies damage and scores kills.
    fn collisions(&mut self) {
        let stars: Vec<(Vector2D, f64)> = self
            .world
            .stars()
            .map(|star| (star.location, star.radius))
            .collect();
        let ship_targets: Vec<(u32, Vector2D)> = self
            .world
            .ships()
            .filter(|ship| ship.is_alive())
            .map(|ship| (ship.id, ship.location))
            .collect();

        let ship_radius = self.config.ship_collision_radius;
        let projectile_radius = self.config.projectile_collision_radius;

        // Projectiles against stars, then against ships. A projectile never
        // hits the ship that fired it.
        let mut hits: Vec<(u32, u32)> = Vec::new();
        for projectile in self.world.projectiles_mut() {
            if !projectile.active {
                continue;
            }

            if stars.iter().any(|(location, radius)| {
                projectile.location.distance(location) <= *radius + projectile_radius
            }) {
                projectile.active = false;
                continue;
            }

            let hit = ship_targets.iter().find(|(ship_id, location)| {
                *ship_id != projectile.owner
                    && projectile.location.distance(location) <= ship_radius + projectile_radius
            });
            if let Some((ship_id, _)) = hit {
                hits.push((*ship_id, projectile.owner));
                projectile.active = false;
            }
        }

        for (ship_id, owner_id) in hits {
            let mut killed = false;
            if let Some(ship) = self.world.ship_mut(ship_id) {
                if !ship.is_alive() {
                    continue;
                }
                ship.health -= self.config.projectile_damage;
                if ship.health <= 0 {
                    ship.health = 0;
                    ship.respawn_frames = self.config.respawn_delay_frames;
                    killed = true;
                    info!("Ship {} destroyed by ship {}", ship_id, owner_id);
                }
            }
            if killed {
                if let Some(owner) = self.world.ship_mut(owner_id) {
                    owner.score += 1;
                }
            }
        }

        // Ships against stars: instant destruction, no points awarded.
        let crashed: Vec<u32> = self
            .world
            .ships()
            .filter(|ship| {
                ship.is_alive()
                    && stars.iter().any(|(location, radius)| {
                        ship.location.distance(location) <= *radius + ship_radius
                    })
            })
            .map(|ship| ship.id)
            .collect();

        for ship_id in crashed {
            if let Some(ship) = self.world.ship_mut(ship_id) {
                ship.health = 0;
                ship.respawn_frames = self.config.respawn_delay_frames;
                info!("Ship {} fell into a star", ship_id);
            }
        }
    }
}
