use anyhow::Context;
use salon::{
    api::routes,
    auth::session::spawn_pruner,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    utils::toml_config::ServerConfig,
    AppState, SalonConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        config,
        verbose,
        no_color,
        command,
    } = Cli::parse_args();

    let output = if no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => match init::run(
            InitConfig {
                path,
                force,
                host,
                port,
            },
            &output,
        ) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => anyhow::bail!(e),
        },
        Some(Commands::Config { validate }) => show_config(&config, validate, &output),
        Some(Commands::Serve) | None => serve(&config, verbose).await,
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { server.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.log_format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn serve(config_path: &Path, verbose: bool) -> anyhow::Result<()> {
    let config = SalonConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    init_tracing(&config.server, verbose);

    let auth = config.auth_settings()?;
    let db = config
        .database_provider()
        .create_client()
        .await
        .context("Failed to open database")?;
    tracing::info!(url = %config.database.url, "database ready");

    let state = AppState::new(config, db, auth)?;

    let prune_every = state.config.auth.prune_interval_secs;
    if prune_every > 0 {
        spawn_pruner(state.sessions.clone(), Duration::from_secs(prune_every));
    }

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "salon-server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

fn show_config(config_path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    output.header("Configuration");

    let config = match SalonConfig::from_toml_str(
        &std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?,
    ) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            anyhow::bail!("invalid configuration");
        }
    };

    output.kv("file", &config_path.display().to_string());

    output.subheader("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log", &format!("{} ({})", config.server.log_level, config.server.log_format));

    output.subheader("Auth");
    output.kv("access secret", &config.auth.access_secret_env);
    output.kv("refresh secret", &config.auth.refresh_secret_env);
    output.kv("access ttl", &format!("{}s", config.auth.access_token_ttl));
    output.kv("refresh ttl", &format!("{}s", config.auth.refresh_token_ttl));

    output.subheader("Database");
    output.kv("url", &config.database.url);

    output.subheader("Cookies");
    output.kv("secure", &config.cookies.secure.to_string());
    output.kv("same_site", &config.cookies.same_site);
    output.kv("path", &config.cookies.path);

    output.subheader("CORS");
    for origin in &config.cors.allowed_origins {
        output.list_item(origin);
    }

    if validate {
        output.newline();
        match config.auth_settings() {
            Ok(_) => output.success("Configuration and signing secrets are valid"),
            Err(e) => {
                output.error(&e.to_string());
                anyhow::bail!("invalid configuration");
            }
        }
    }

    Ok(())
}
