use futuretd_engine::{command_channel, CommandQueue, LoopConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::map::TileMap;
use super::server_command::ServerCommand;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) map: TileMap,
    pub(crate) commands: CommandQueue<ServerCommand>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== FutureTD Startup ===");

    let config = LoopConfig::default().with_env_overrides();
    // No network transport yet: the map's own build requests are echoed back
    // through the queue a server connection would feed.
    let (sender, commands) = command_channel();
    let map = TileMap::new(sender);

    AppWiring {
        config,
        map,
        commands,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
