//! Realtime group-chat relay server.
//!
//! Receives messages from clients over a websocket, broadcasts them to every
//! connected client and records them for the history endpoint.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! DATABASE_URL=postgres://localhost/chat PORT=3000 cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 127.0.0.1 --port 3000 --allowed-origin http://localhost:5173
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hiroba_server::{
    config::{
        DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_FRAME_BYTES, DEFAULT_OUTBOUND_CAPACITY, ServerConfig,
    },
    domain::MessageStore,
    infrastructure::repository::{InMemoryMessageStore, PostgresMessageStore},
    ui::{Server, ServerError},
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Realtime group-chat relay over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// PostgreSQL connection string; messages are kept in memory when omitted
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Origin allowed to call the HTTP API ("*" allows any)
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Seconds between liveness pings
    #[arg(long, default_value = "30")]
    ping_interval_secs: u64,

    /// Seconds without a pong before a connection is considered dead
    #[arg(long, default_value = "60")]
    read_timeout_secs: u64,

    /// Seconds allowed for a single frame write
    #[arg(long, default_value = "10")]
    write_timeout_secs: u64,

    /// Frames buffered per connection before it is dropped as too slow
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// Largest message accepted from a client, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    max_frame_bytes: usize,

    /// Number of messages returned by GET /api/messages
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            outbound_capacity: self.outbound_capacity,
            max_frame_bytes: self.max_frame_bytes,
            history_limit: self.history_limit,
            allowed_origin: self.allowed_origin.clone(),
        }
    }
}

async fn connect_store(database_url: Option<&str>) -> Result<Arc<dyn MessageStore>, ServerError> {
    match database_url {
        Some(url) => {
            let store = PostgresMessageStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, messages are kept in memory only");
            Ok(Arc::new(InMemoryMessageStore::new()))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.server_config();

    let store = match connect_store(args.database_url.as_deref()).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let server = Server::new(config, store);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Gracefully shutdown!");
}
