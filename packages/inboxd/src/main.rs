use anyhow::{Context, Result};
use axum::{Router, routing::get};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::info;
use tracing_subscriber::prelude::*;
use uuid::Uuid;

mod config;
mod db;
mod handlers;
mod models;
mod seed;
mod service;
mod store;

use crate::config::{AppConfig, Backend};
use crate::db::Database;
use crate::service::ConversationService;
use crate::store::{ConversationStore, DocumentStore, RelationalStore};

/// Span maker that tags each request with a unique ID. Records the path only:
/// query strings carry search terms, which stay out of span fields.
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %Uuid::new_v4(),
        )
    }
}

#[derive(Parser)]
#[command(name = "inboxd")]
#[command(about = "Paginated, searchable conversation listings over a contact/message store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom data directory (defaults to ~/.inboxd)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server in the foreground
    Serve(ServeArgs),

    /// Populate the store with generated contacts and messages
    Seed(SeedArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Host to bind to (overrides config)
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Port for the web server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Store backend (overrides config)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Parser)]
struct SeedArgs {
    /// Number of contacts to generate
    #[arg(long, default_value = "100000")]
    contacts: u64,

    /// Number of messages to generate
    #[arg(long, default_value = "5000000")]
    messages: u64,

    /// Rows per insert transaction
    #[arg(long, default_value = "1000")]
    batch_size: usize,

    /// RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    /// Store backend (overrides config)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Delete the database file before seeding
    #[arg(long)]
    reset_db: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub service: ConversationService,
    pub store: Arc<dyn ConversationStore>,
    pub db: Arc<Database>,
    pub backend: Backend,
}

pub(crate) fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations/recent",
            get(handlers::recent_conversations),
        )
        .route(
            "/conversations/search",
            get(handlers::search_conversations),
        )
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/health/ready", get(handlers::health_ready_handler))
}

fn init_tracing(debug: bool) {
    let default_directive = if debug {
        "inboxd=debug,tower_http=debug,info"
    } else {
        "inboxd=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

fn make_store(backend: Backend, db: &Database) -> Arc<dyn ConversationStore> {
    match backend {
        Backend::Relational => Arc::new(RelationalStore::new(db.pool.clone())),
        Backend::Document => Arc::new(DocumentStore::new(db.pool.clone())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_serve(args, cli.data_dir).await,
        Commands::Seed(args) => run_seed(args, cli.data_dir).await,
    }
}

async fn run_serve(args: ServeArgs, data_dir: Option<PathBuf>) -> Result<()> {
    init_tracing(args.debug);

    let mut config = AppConfig::new(data_dir)?;
    if let Some(host) = args.host {
        config.file.server.host = Some(host);
    }
    if let Some(port) = args.port {
        config.file.server.port = Some(port);
    }
    if let Some(backend) = args.backend {
        config.file.database.backend = backend;
    }

    let db = Arc::new(Database::new(&config).await?);
    let store = make_store(config.file.database.backend, &db);

    let app_state = AppState {
        service: ConversationService::new(store.clone()),
        store,
        db: db.clone(),
        backend: config.file.database.backend,
    };

    let app = api_router()
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("{}:{}", config.host(), config.port()).parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("inboxd listening on http://{}", actual_addr);
    info!("API endpoints:");
    info!("  GET /conversations/recent?page=&limit=    - Recent conversations");
    info!("  GET /conversations/search?q=&page=&limit= - Search conversations");

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")
}

async fn run_seed(args: SeedArgs, data_dir: Option<PathBuf>) -> Result<()> {
    init_tracing(false);

    let mut config = AppConfig::new(data_dir)?;
    if let Some(backend) = args.backend {
        config.file.database.backend = backend;
    }
    if args.reset_db {
        config.reset_database()?;
    }

    let db = Database::new(&config).await?;
    let store = make_store(config.file.database.backend, &db);

    let opts = seed::SeedOptions {
        contacts: args.contacts,
        messages: args.messages,
        batch_size: args.batch_size.max(1),
        rng_seed: args.seed,
    };
    seed::run(store.as_ref(), &opts).await
}
