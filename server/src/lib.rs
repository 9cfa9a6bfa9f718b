//! # SpaceWars Game Server Library
//!
//! Authoritative server for the multiplayer space-combat game. The server
//! owns the canonical world state — ships, projectiles and stars — advances
//! it at a fixed tick rate, and broadcasts a snapshot of every live
//! component to all connected clients after each tick.
//!
//! ## Architecture
//!
//! The design is single-writer: the game loop is the only code that mutates
//! the [`world::World`]. Connection tasks parse inbound command lines and
//! write them into per-session slots in the
//! [`client_manager::ClientManager`]; the simulation reads those slots once
//! per tick. Only the registry is shared between tasks, behind one lock
//! that is never held across an await point, so a slow client can never
//! stall a tick.
//!
//! Snapshots leave the simulation through a `watch` channel that always
//! carries the latest serialized tick. Per-connection writer tasks forward
//! it at whatever pace their socket allows — a client that falls behind
//! skips stale snapshots rather than queueing them.
//!
//! ## Module Organization
//!
//! - [`config`] — every simulation tunable, with playable defaults.
//! - [`world`] — the component container: per-kind id spaces, spatial
//!   queries and the bounded spawn-location search.
//! - [`game`] — the per-tick pipeline: cleanup, spawning, motion, wrapping
//!   and collision, in that order.
//! - [`game_loop`] — the fixed-period scheduler driving [`game::Game::tick`].
//! - [`client_manager`] — session registry with last-write-wins command
//!   slots and deferred disconnect handling.
//! - [`network`] — the TCP collaborator: name handshake, command parsing
//!   and snapshot streaming, plus lifecycle events for logging consumers.

pub mod client_manager;
pub mod config;
pub mod game;
pub mod game_loop;
pub mod network;
pub mod world;
