//! Integration tests for the game server
//!
//! These tests run the full server stack — game loop, session registry and
//! TCP networking — over real sockets, and check cross-component behavior
//! that unit tests cannot see.

use server::client_manager::{lock, ClientManager};
use server::config::GameConfig;
use server::game::Game;
use server::game_loop::{GameLoop, GameLoopHandle};
use server::network::NetworkServer;
use shared::{Command, Welcome, WorldSnapshot};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_test::assert_ok;

fn test_config() -> GameConfig {
    GameConfig {
        ms_per_frame: 10,
        world_size: 1000.0,
        fire_cooldown_frames: 2,
        max_clients: 4,
        rng_seed: Some(11),
        ..GameConfig::default()
    }
}

/// Wires up the full server the way the binary does and spawns it on an
/// ephemeral port.
async fn start_server(config: GameConfig) -> (SocketAddr, GameLoopHandle) {
    let mut game = Game::new(config.clone());
    let clients = Arc::new(RwLock::new(ClientManager::new(config.max_clients)));
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(String::new());

    let network = NetworkServer::bind(
        "127.0.0.1:0",
        Arc::clone(&clients),
        event_tx,
        snapshot_rx,
        config.world_size,
    )
    .await
    .unwrap();
    let addr = network.local_addr().unwrap();
    tokio::spawn(network.run());

    let game_loop = GameLoop::new(config.ms_per_frame);
    let handle = game_loop.handle();
    tokio::spawn(async move {
        game_loop
            .run(move || {
                {
                    let mut clients = lock(&clients);
                    game.tick(&mut clients);
                    clients.reap_disconnected();
                }
                if let Ok(mut line) = serde_json::to_string(&game.snapshot()) {
                    line.push('\n');
                    let _ = snapshot_tx.send(line);
                }
            })
            .await;
    });

    (addr, handle)
}

/// A minimal game client speaking the line protocol.
struct TestClient {
    stream: BufReader<TcpStream>,
}

impl TestClient {
    async fn connect(addr: SocketAddr, name: &str) -> (Self, Welcome) {
        let stream = tokio_test::assert_ok!(TcpStream::connect(addr).await);
        let mut client = TestClient {
            stream: BufReader::new(stream),
        };
        client.send_line(name).await;
        let welcome: Welcome = serde_json::from_str(&client.read_line().await).unwrap();
        (client, welcome)
    }

    async fn send_line(&mut self, line: &str) {
        self.stream
            .get_mut()
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.stream.read_line(&mut line))
            .await
            .expect("timed out waiting for a server line")
            .unwrap();
        line
    }

    async fn next_snapshot(&mut self) -> WorldSnapshot {
        serde_json::from_str(&self.read_line().await).unwrap()
    }

    /// Reads snapshots until one satisfies the predicate, with a bounded
    /// number of attempts.
    async fn snapshot_where<F>(&mut self, mut predicate: F) -> WorldSnapshot
    where
        F: FnMut(&WorldSnapshot) -> bool,
    {
        for _ in 0..200 {
            let snapshot = self.next_snapshot().await;
            if predicate(&snapshot) {
                return snapshot;
            }
        }
        panic!("no snapshot matched the predicate within 200 ticks");
    }
}

mod protocol_tests {
    use super::*;

    /// The handshake assigns a client id and reports the world size.
    #[tokio::test]
    async fn welcome_carries_session_parameters() {
        let (addr, handle) = start_server(test_config()).await;

        let (_client, welcome) = TestClient::connect(addr, "ada").await;
        assert_eq!(welcome.client_id, 1);
        assert_eq!(welcome.world_size, 1000.0);

        let (_client2, welcome2) = TestClient::connect(addr, "bob").await;
        assert_eq!(welcome2.client_id, 2);

        handle.stop();
    }

    /// Command lines survive the trip through the parser into the session
    /// registry and the simulation.
    #[test]
    fn command_grammar_round_trip() {
        let command: Command = "left true false".parse().unwrap();
        assert!(command.thrust);
        assert!(!command.fire);
    }
}

mod gameplay_tests {
    use super::*;

    /// A connected client is assigned a live ship and sees it in the
    /// snapshot stream.
    #[tokio::test]
    async fn client_receives_world_snapshots() {
        let (addr, handle) = start_server(test_config()).await;
        let (mut client, welcome) = TestClient::connect(addr, "ada").await;

        let snapshot = client.snapshot_where(|s| s.ships.len() == 1).await;
        let ship = &snapshot.ships[0];
        assert_eq!(ship.name, "ada");
        assert_eq!(ship.owner, welcome.client_id);
        assert_eq!(ship.health, 5);
        assert!(ship.location.x.abs() <= 500.0);
        assert!(ship.location.y.abs() <= 500.0);
        // The default world has its star at the origin.
        assert_eq!(snapshot.stars.len(), 1);

        handle.stop();
    }

    /// A fire command produces a projectile owned by the firing ship.
    #[tokio::test]
    async fn firing_produces_a_projectile() {
        let (addr, handle) = start_server(test_config()).await;
        let (mut client, _) = TestClient::connect(addr, "ada").await;

        let snapshot = client.snapshot_where(|s| s.ships.len() == 1).await;
        let ship_id = snapshot.ships[0].id;

        client.send_line("none false true").await;
        let snapshot = client.snapshot_where(|s| !s.projectiles.is_empty()).await;
        assert_eq!(snapshot.projectiles[0].owner, ship_id);

        handle.stop();
    }

    /// Both clients appear in the same world.
    #[tokio::test]
    async fn two_clients_see_each_other() {
        let (addr, handle) = start_server(test_config()).await;
        let (_ada, _) = TestClient::connect(addr, "ada").await;
        let (mut bob, _) = TestClient::connect(addr, "bob").await;

        let snapshot = bob.snapshot_where(|s| s.ships.len() == 2).await;
        let mut names: Vec<&str> = snapshot.ships.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["ada", "bob"]);

        handle.stop();
    }

    /// Closing a connection reclaims the ship within a few ticks.
    #[tokio::test]
    async fn disconnect_reclaims_ship() {
        let (addr, handle) = start_server(test_config()).await;
        let (ada, _) = TestClient::connect(addr, "ada").await;
        let (mut bob, _) = TestClient::connect(addr, "bob").await;

        bob.snapshot_where(|s| s.ships.len() == 2).await;
        drop(ada);

        let snapshot = bob.snapshot_where(|s| s.ships.len() == 1).await;
        assert_eq!(snapshot.ships[0].name, "bob");

        handle.stop();
    }

    /// A malformed command line neither closes the connection nor stops the
    /// snapshot stream.
    #[tokio::test]
    async fn malformed_command_is_ignored() {
        let (addr, handle) = start_server(test_config()).await;
        let (mut client, _) = TestClient::connect(addr, "ada").await;

        client.snapshot_where(|s| s.ships.len() == 1).await;
        client.send_line("fire ze missiles").await;

        // Still connected: snapshots keep flowing and commands still work.
        client.send_line("none false true").await;
        client.snapshot_where(|s| !s.projectiles.is_empty()).await;

        handle.stop();
    }

    /// Stopping the loop ends the snapshot stream after the in-flight tick.
    #[tokio::test]
    async fn stop_halts_the_snapshot_stream() {
        let (addr, handle) = start_server(test_config()).await;
        let (mut client, _) = TestClient::connect(addr, "ada").await;

        client.snapshot_where(|s| s.ships.len() == 1).await;
        handle.stop();

        // Drain whatever was in flight; then the stream must go quiet.
        loop {
            let mut line = String::new();
            match tokio::time::timeout(
                Duration::from_millis(300),
                client.stream.read_line(&mut line),
            )
            .await
            {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => panic!("read error after stop: {}", e),
            }
        }
    }
}

mod simulation_tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// Two servers with the same seed and the same inputs stay in lockstep.
    #[test]
    fn seeded_games_are_deterministic() {
        let run = || {
            let mut game = Game::new(test_config());
            let mut clients = ClientManager::new(4);
            let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

            let ada = clients.add_client("ada".to_string(), addr).unwrap();
            let bob = clients.add_client("bob".to_string(), addr).unwrap();
            for tick in 0..20 {
                if tick % 3 == 0 {
                    clients.apply_command(ada, "left true false".parse().unwrap());
                    clients.apply_command(bob, "right true true".parse().unwrap());
                }
                game.tick(&mut clients);
            }
            game.snapshot()
        };

        let a = run();
        let b = run();

        // Snapshot order is indeterminate; compare by id.
        let mut a_ships = a.ships.clone();
        let mut b_ships = b.ships.clone();
        a_ships.sort_by_key(|s| s.id);
        b_ships.sort_by_key(|s| s.id);

        assert_eq!(a_ships.len(), b_ships.len());
        for (ship_a, ship_b) in a_ships.iter().zip(b_ships.iter()) {
            assert_approx_eq!(ship_a.location.x, ship_b.location.x);
            assert_approx_eq!(ship_a.location.y, ship_b.location.y);
            assert_approx_eq!(ship_a.direction.x, ship_b.direction.x);
        }
        assert_eq!(a.projectiles.len(), b.projectiles.len());
    }
}
