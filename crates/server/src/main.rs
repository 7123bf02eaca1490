use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coffre_crypto::{BlobCipher, parse_master_key};
use coffre_server::api::{self, AppState};
use coffre_server::auth::JwtManager;
use coffre_server::config::CoffreConfig;
use coffre_server::files::FileService;
use coffre_server::registry::UserRegistry;
use coffre_server::retention::{RetentionSweeper, sweep_loop};
use coffre_store::{DocumentStore, EncryptedBlobStore, ObjectStore};
use coffre_store_s3::{S3Config, S3ObjectStore};

#[derive(Parser)]
#[command(name = "coffre-server", about = "Encrypted file-storage backend")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "coffre.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one retention sweep pass and exit.
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = CoffreConfig::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let state = build_state(&config)?;
    let sweeper = Arc::new(RetentionSweeper::new(
        Arc::clone(&state.files_docs),
        Arc::clone(&state.app.registry),
        Arc::clone(&state.app.files),
        config.retention.days,
    ));

    match cli.command {
        Some(Command::Cleanup) => {
            let summary = sweeper.run_cleanup().await;
            info!(
                deleted = summary.deleted,
                errors = summary.errors,
                cutoff = %summary.cutoff,
                "cleanup complete"
            );
        }
        None => {
            tokio::spawn(sweep_loop(
                sweeper,
                Duration::from_secs(config.retention.sweep_interval_secs),
            ));

            let router = api::router(state.app, &config.server.allowed_origins_list());
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr, "listening");
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}

struct BuiltState {
    app: AppState,
    files_docs: Arc<DocumentStore>,
}

fn build_state(config: &CoffreConfig) -> Result<BuiltState, Box<dyn std::error::Error>> {
    let master_key = parse_master_key(config.encryption_key()?.expose_secret())?;
    let cipher = BlobCipher::new(master_key);

    let mut s3 = S3Config::new(
        config.storage.bucket.clone(),
        config.storage.access_key_id.clone(),
        config.secret_access_key()?,
    )
    .with_force_path_style(config.storage.force_path_style);
    if let Some(region) = &config.storage.region {
        s3 = s3.with_region(region.clone());
    }
    if let Some(endpoint) = &config.storage.endpoint_url {
        s3 = s3.with_endpoint_url(endpoint.clone());
    }

    let raw: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&s3));
    let docs = Arc::new(DocumentStore::new(EncryptedBlobStore::new(raw, cipher)));

    let registry = Arc::new(UserRegistry::new(Arc::clone(&docs)));
    let files = Arc::new(FileService::new(Arc::clone(&docs)));
    let jwt = Arc::new(JwtManager::new(
        config.secret_key()?.expose_secret(),
        config.auth.token_expiry_hours * 3600,
    ));

    Ok(BuiltState {
        app: AppState {
            jwt,
            registry,
            files,
        },
        files_docs: docs,
    })
}
