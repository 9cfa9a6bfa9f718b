//! The authoritative container of all game components.

use log::debug;
use rand::Rng;
use shared::{Projectile, Ship, Star, Vector2D};
use std::collections::BTreeMap;

/// Candidates tried by the spawn-location search before giving up.
const SPAWN_ATTEMPTS: u32 = 100;

/// Holds every ship, projectile and star in the game, keyed by id.
///
/// Ships, projectiles and stars live in independent id spaces, each with its
/// own incrementing counter. Iteration is in ascending id order so a seeded
/// game replays identically. The world is only ever mutated by the
/// simulation pipeline; network tasks never touch it.
pub struct World {
    size: f64,
    ships: BTreeMap<u32, Ship>,
    projectiles: BTreeMap<u32, Projectile>,
    stars: BTreeMap<u32, Star>,
    next_ship_id: u32,
    next_projectile_id: u32,
    next_star_id: u32,
}

impl World {
    /// Creates an empty world with the given side length.
    pub fn new(size: f64) -> Self {
        World {
            size,
            ships: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            stars: BTreeMap::new(),
            next_ship_id: 0,
            next_projectile_id: 0,
            next_star_id: 0,
        }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Distance from the origin to a world edge on either axis.
    pub fn bounds(&self) -> f64 {
        self.size / 2.0
    }

    /// True if the point lies within the world, edges included.
    pub fn in_bounds(&self, point: &Vector2D) -> bool {
        let bounds = self.bounds();
        point.x.abs() <= bounds && point.y.abs() <= bounds
    }

    /// Inserts a ship under the next ship id and returns that id.
    pub fn add_ship(&mut self, mut ship: Ship) -> u32 {
        let id = self.next_ship_id;
        self.next_ship_id += 1;
        ship.id = id;
        self.ships.insert(id, ship);
        id
    }

    /// Inserts a projectile under the next projectile id and returns that id.
    pub fn add_projectile(&mut self, mut projectile: Projectile) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        projectile.id = id;
        self.projectiles.insert(id, projectile);
        id
    }

    /// Inserts a star under the next star id and returns that id.
    pub fn add_star(&mut self, mut star: Star) -> u32 {
        let id = self.next_star_id;
        self.next_star_id += 1;
        star.id = id;
        self.stars.insert(id, star);
        id
    }

    pub fn remove_ship(&mut self, id: u32) -> Option<Ship> {
        self.ships.remove(&id)
    }

    pub fn remove_projectile(&mut self, id: u32) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    pub fn ship(&self, id: u32) -> Option<&Ship> {
        self.ships.get(&id)
    }

    pub fn ship_mut(&mut self, id: u32) -> Option<&mut Ship> {
        self.ships.get_mut(&id)
    }

    /// All ships, in ascending id order.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    pub fn ships_mut(&mut self) -> impl Iterator<Item = &mut Ship> {
        self.ships.values_mut()
    }

    /// All projectiles, in ascending id order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn projectiles_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.projectiles.values_mut()
    }

    /// Drops every projectile for which the predicate returns false.
    pub fn retain_projectiles<F>(&mut self, f: F)
    where
        F: FnMut(&u32, &mut Projectile) -> bool,
    {
        self.projectiles.retain(f);
    }

    /// All stars, in ascending id order.
    pub fn stars(&self) -> impl Iterator<Item = &Star> {
        self.stars.values()
    }

    /// Searches for a spawn location at least `min_distance_from_stars` away
    /// from every star and `min_distance_from_ships` away from every live
    /// ship.
    ///
    /// Tries a bounded number of uniformly random candidates; if none
    /// qualifies the search falls back to the world origin rather than loop
    /// forever.
    pub fn find_ship_spawn_location(
        &self,
        rng: &mut impl Rng,
        min_distance_from_stars: f64,
        min_distance_from_ships: f64,
    ) -> Vector2D {
        let bounds = self.bounds();

        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = Vector2D::new(
                rng.gen_range(-bounds..=bounds),
                rng.gen_range(-bounds..=bounds),
            );

            let clear_of_stars = self
                .stars
                .values()
                .all(|star| candidate.distance(&star.location) >= min_distance_from_stars);

            let clear_of_ships = self
                .ships
                .values()
                .filter(|ship| ship.is_alive())
                .all(|ship| candidate.distance(&ship.location) >= min_distance_from_ships);

            if clear_of_stars && clear_of_ships {
                return candidate;
            }
        }

        debug!(
            "No clear spawn location found after {} attempts, using origin",
            SPAWN_ATTEMPTS
        );
        Vector2D::ZERO
    }
}
