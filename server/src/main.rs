use clap::Parser;
use log::{debug, error, info, warn};
use server::client_manager::{lock, ClientManager};
use server::config::GameConfig;
use server::game::Game;
use server::game_loop::GameLoop;
use server::network::{LifecycleEvent, NetworkServer};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, watch};

/// Authoritative game server for the space-combat game.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "11000")]
    port: u16,
    /// Tick period in milliseconds
    #[clap(short, long, default_value = "16")]
    ms_per_frame: u64,
    /// Side length of the square world
    #[clap(short, long, default_value = "750")]
    world_size: f64,
    /// Maximum number of concurrent clients
    #[clap(long, default_value = "32")]
    max_clients: usize,
    /// Seed for the simulation RNG (random when omitted)
    #[clap(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = GameConfig {
        ms_per_frame: args.ms_per_frame,
        world_size: args.world_size,
        max_clients: args.max_clients,
        rng_seed: args.seed,
        ..GameConfig::default()
    };

    let mut game = Game::new(config.clone());
    let clients = Arc::new(RwLock::new(ClientManager::new(config.max_clients)));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(String::new());

    let address = format!("{}:{}", args.host, args.port);
    let network = NetworkServer::bind(
        &address,
        Arc::clone(&clients),
        event_tx,
        snapshot_rx,
        config.world_size,
    )
    .await?;
    info!("Server listening on {}", network.local_addr()?);

    tokio::spawn(network.run());

    // Lifecycle events feed the log; a scoreboard would subscribe here too.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                LifecycleEvent::ClientConnected { client_id, name } => {
                    info!("Player '{}' joined as client {}", name, client_id);
                }
                LifecycleEvent::ClientConnectFailed { reason } => {
                    warn!("Client connection failed: {}", reason);
                }
                LifecycleEvent::ClientDisconnected { client_id } => {
                    info!("Client {} left", client_id);
                }
            }
        }
    });

    let game_loop = GameLoop::new(config.ms_per_frame);
    let handle = game_loop.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping after the current tick");
            handle.stop();
        }
    });

    game_loop
        .run(move || {
            {
                let mut clients = lock(&clients);
                game.tick(&mut clients);
                clients.reap_disconnected();
            }

            match serde_json::to_string(&game.snapshot()) {
                Ok(mut line) => {
                    line.push('\n');
                    let _ = snapshot_tx.send(line);
                }
                Err(e) => error!("Failed to serialize snapshot: {}", e),
            }

            if game.tick_count() % 600 == 0 {
                debug!(
                    "Tick {}: {} ships, {} projectiles",
                    game.tick_count(),
                    game.world.ships().count(),
                    game.world.projectiles().count()
                );
            }
        })
        .await;

    info!("Server stopped");
    Ok(())
}
