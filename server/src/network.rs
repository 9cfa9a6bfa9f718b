//! TCP network layer: accepts clients, reads command lines and streams
//! world snapshots.
//!
//! The protocol is line oriented. A client's first line is its player name;
//! the server answers with a `Welcome` JSON line and from then on sends one
//! snapshot JSON line per tick. Every further client line is a command.
//!
//! Connection tasks never touch the world. They only write into the session
//! registry, and the game loop picks those writes up at the next tick.

use crate::client_manager::{lock, ClientManager};
use log::{error, info, warn};
use shared::{Command, Welcome};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

/// Notifications for logging and scoreboard consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    ClientConnected { client_id: u32, name: String },
    ClientConnectFailed { reason: String },
    ClientDisconnected { client_id: u32 },
}

/// Listens for client connections and spawns a task per connection.
pub struct NetworkServer {
    listener: TcpListener,
    clients: Arc<RwLock<ClientManager>>,
    events: mpsc::UnboundedSender<LifecycleEvent>,
    snapshots: watch::Receiver<String>,
    world_size: f64,
}

impl NetworkServer {
    /// Binds the listener. The `snapshots` receiver carries the serialized
    /// snapshot line published by the game loop after every tick.
    pub async fn bind(
        addr: &str,
        clients: Arc<RwLock<ClientManager>>,
        events: mpsc::UnboundedSender<LifecycleEvent>,
        snapshots: watch::Receiver<String>,
        world_size: f64,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(NetworkServer {
            listener,
            clients,
            events,
            snapshots,
            world_size,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let clients = Arc::clone(&self.clients);
                    let events = self.events.clone();
                    let snapshots = self.snapshots.clone();
                    let world_size = self.world_size;
                    tokio::spawn(async move {
                        handle_connection(stream, addr, clients, events, snapshots, world_size)
                            .await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    let _ = self.events.send(LifecycleEvent::ClientConnectFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Serves one client connection from handshake to disconnect.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    clients: Arc<RwLock<ClientManager>>,
    events: mpsc::UnboundedSender<LifecycleEvent>,
    snapshots: watch::Receiver<String>,
    world_size: f64,
) {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // Handshake: the first line is the player's name.
    let name = match lines.next_line().await {
        Ok(Some(line)) if !line.trim().is_empty() => line.trim().to_string(),
        Ok(_) => {
            let _ = events.send(LifecycleEvent::ClientConnectFailed {
                reason: format!("{}: connection closed before a name was sent", addr),
            });
            return;
        }
        Err(e) => {
            let _ = events.send(LifecycleEvent::ClientConnectFailed {
                reason: format!("{}: {}", addr, e),
            });
            return;
        }
    };

    let client_id = match lock(&clients).add_client(name.clone(), addr) {
        Some(client_id) => client_id,
        None => {
            warn!("Refused connection from {}: server full", addr);
            let _ = events.send(LifecycleEvent::ClientConnectFailed {
                reason: format!("{}: server full", addr),
            });
            return;
        }
    };
    let _ = events.send(LifecycleEvent::ClientConnected { client_id, name });

    let writer = tokio::spawn(stream_snapshots(
        write_half,
        snapshots,
        Welcome {
            client_id,
            world_size,
        },
    ));

    // Read command lines until the client goes away. Malformed lines are
    // dropped; the connection stays open.
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match line.parse::<Command>() {
                Ok(command) => {
                    lock(&clients).apply_command(client_id, command);
                }
                Err(e) => {
                    warn!("Dropping malformed command from client {}: {}", client_id, e);
                }
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Read error from client {}: {}", client_id, e);
                break;
            }
        }
    }

    writer.abort();
    lock(&clients).disconnect_client(client_id);
    let _ = events.send(LifecycleEvent::ClientDisconnected { client_id });
    info!("Connection from {} closed", addr);
}

/// Sends the welcome line, then forwards each new snapshot line.
///
/// The watch channel only ever hands out the most recent snapshot, so a
/// client that cannot keep up skips stale ticks instead of accumulating a
/// send queue.
async fn stream_snapshots(
    mut write_half: OwnedWriteHalf,
    mut snapshots: watch::Receiver<String>,
    welcome: Welcome,
) {
    let mut greeting = match serde_json::to_string(&welcome) {
        Ok(greeting) => greeting,
        Err(e) => {
            error!("Failed to serialize welcome message: {}", e);
            return;
        }
    };
    greeting.push('\n');
    if write_half.write_all(greeting.as_bytes()).await.is_err() {
        return;
    }

    while snapshots.changed().await.is_ok() {
        let line = snapshots.borrow_and_update().clone();
        if write_half.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::TurnIntent;
    use std::time::Duration;

    struct TestServer {
        addr: SocketAddr,
        clients: Arc<RwLock<ClientManager>>,
        events: mpsc::UnboundedReceiver<LifecycleEvent>,
        _snapshots: watch::Sender<String>,
    }

    async fn start_server(max_clients: usize) -> TestServer {
        let clients = Arc::new(RwLock::new(ClientManager::new(max_clients)));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(String::new());

        let server = NetworkServer::bind(
            "127.0.0.1:0",
            Arc::clone(&clients),
            event_tx,
            snapshot_rx,
            750.0,
        )
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        TestServer {
            addr,
            clients,
            events: event_rx,
            _snapshots: snapshot_tx,
        }
    }

    async fn read_line(stream: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_line(&mut line))
            .await
            .expect("timed out reading line")
            .unwrap();
        line
    }

    #[tokio::test]
    async fn test_handshake_creates_session_and_sends_welcome() {
        let mut server = start_server(4).await;

        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(b"ada\n").await.unwrap();

        let welcome: Welcome = serde_json::from_str(&read_line(&mut stream).await).unwrap();
        assert_eq!(welcome.client_id, 1);
        assert_eq!(welcome.world_size, 750.0);

        assert_eq!(
            server.events.recv().await,
            Some(LifecycleEvent::ClientConnected {
                client_id: 1,
                name: "ada".to_string()
            })
        );
        assert!(lock(&server.clients).is_connected(1));
    }

    #[tokio::test]
    async fn test_commands_reach_the_session_slot() {
        let mut server = start_server(4).await;

        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(b"ada\n").await.unwrap();
        read_line(&mut stream).await;
        server.events.recv().await;

        // A malformed line first: it must be dropped without closing the
        // connection or disturbing the command that follows.
        stream
            .get_mut()
            .write_all(b"warp 9 engage\nleft true false\n")
            .await
            .unwrap();

        let mut turn = TurnIntent::None;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if let Some(client) = lock(&server.clients).get(1) {
                turn = client.command.turn;
                if turn == TurnIntent::Left {
                    break;
                }
            }
        }
        assert_eq!(turn, TurnIntent::Left);
        assert!(lock(&server.clients).is_connected(1));
    }

    #[tokio::test]
    async fn test_full_server_refuses_connection() {
        let mut server = start_server(0).await;

        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(b"ada\n").await.unwrap();

        match server.events.recv().await {
            Some(LifecycleEvent::ClientConnectFailed { reason }) => {
                assert!(reason.contains("server full"));
            }
            other => panic!("expected a connect failure, got {:?}", other),
        }
        assert!(lock(&server.clients).is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_marks_session() {
        let mut server = start_server(4).await;

        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(b"ada\n").await.unwrap();
        read_line(&mut stream).await;
        server.events.recv().await;

        drop(stream);

        assert_eq!(
            server.events.recv().await,
            Some(LifecycleEvent::ClientDisconnected { client_id: 1 })
        );
        // The session lingers, disconnected, until the game loop reaps it.
        let mut clients = lock(&server.clients);
        assert_eq!(clients.len(), 1);
        assert!(!clients.is_connected(1));
        assert_eq!(clients.reap_disconnected(), vec![1]);
    }
}
