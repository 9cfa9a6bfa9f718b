//! Client session management for the game server
//!
//! This module tracks every connected client and the state the simulation
//! needs from it:
//! - Session lifecycle (connect, disconnect, deferred removal)
//! - The latest command per session, overwritten on every received line
//! - The session's ship association and fire cooldown
//!
//! Network tasks mutate sessions through short-lived locks; the game loop
//! reads and updates them once per tick. Disconnected sessions are only
//! reaped between ticks, never while the pipeline is running.

use log::info;
use shared::Command;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{RwLock, RwLockWriteGuard};

/// Acquires the registry write lock, recovering it if a holder panicked.
pub fn lock(clients: &RwLock<ClientManager>) -> RwLockWriteGuard<'_, ClientManager> {
    clients.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Server-side state for one connected client.
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server.
    pub id: u32,
    /// Player name received in the connect handshake.
    pub name: String,
    /// Network address, kept for logging.
    pub addr: SocketAddr,
    /// Id of the ship this session controls; `None` until first spawn.
    pub ship_id: Option<u32>,
    /// Most recent command received from the client. Last write wins;
    /// earlier commands within a tick are deliberately discarded.
    pub command: Command,
    /// Ticks remaining before this session's ship may fire again.
    pub fire_cooldown: u32,
    /// Cleared when the socket closes; the session is removed after the
    /// current tick completes.
    pub connected: bool,
}

impl Client {
    pub fn new(id: u32, name: String, addr: SocketAddr) -> Self {
        Self {
            id,
            name,
            addr,
            ship_id: None,
            command: Command::default(),
            fire_cooldown: 0,
            connected: true,
        }
    }
}

/// Manages all connected clients and their command slots.
///
/// Enforces the server capacity limit and assigns client ids. The game loop
/// is the only reader of command state; connection tasks are the writers.
pub struct ClientManager {
    /// Sessions indexed by client id, iterated in id order so ticks are
    /// reproducible under a seeded RNG.
    clients: BTreeMap<u32, Client>,
    /// Next available client id for new connections.
    next_client_id: u32,
    /// Maximum number of concurrent clients allowed.
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to create a session for a new connection.
    ///
    /// Returns `Some(client_id)` on success, `None` if the server is full.
    pub fn add_client(&mut self, name: String, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} ('{}') connected from {}", client_id, name, addr);
        self.clients.insert(client_id, Client::new(client_id, name, addr));

        Some(client_id)
    }

    /// Marks a session as disconnected.
    ///
    /// The session stays in the registry until [`reap_disconnected`] runs so
    /// that an in-flight tick never observes a half-removed client. Returns
    /// false if the client id is unknown.
    ///
    /// [`reap_disconnected`]: ClientManager::reap_disconnected
    pub fn disconnect_client(&mut self, client_id: u32) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.connected = false;
            true
        } else {
            false
        }
    }

    /// Overwrites a session's command slot with the latest command.
    ///
    /// Returns false if the client id is unknown.
    pub fn apply_command(&mut self, client_id: u32, command: Command) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.command = command;
            true
        } else {
            false
        }
    }

    /// Removes every disconnected session and returns their ids.
    ///
    /// Called by the game loop after each tick's pipeline run.
    pub fn reap_disconnected(&mut self) -> Vec<u32> {
        let reaped: Vec<u32> = self
            .clients
            .values()
            .filter(|client| !client.connected)
            .map(|client| client.id)
            .collect();

        for client_id in &reaped {
            self.clients.remove(client_id);
            info!("Client {} removed", client_id);
        }

        reaped
    }

    pub fn get(&self, client_id: u32) -> Option<&Client> {
        self.clients.get(&client_id)
    }

    /// True if the given client id has a session that is still connected.
    pub fn is_connected(&self, client_id: u32) -> bool {
        self.clients
            .get(&client_id)
            .map(|client| client.connected)
            .unwrap_or(false)
    }

    /// Mutable access to the still-connected sessions, in client id order.
    pub fn connected_sessions_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut().filter(|client| client.connected)
    }

    /// Returns the number of sessions, including not-yet-reaped ones.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
