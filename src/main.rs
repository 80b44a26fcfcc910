use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use disputeflow::config::{Config, DEFAULT_MODEL};
use disputeflow::gateway;
use disputeflow::sessions::{create_session_store, SessionStore};

/// `disputeflow` - conversational dispute assistant service.
#[derive(Parser, Debug)]
#[command(name = "disputeflow")]
#[command(version)]
#[command(about = "Durable per-user dispute chat sessions over a generative-text backend.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway
    #[command(long_about = "\
Start the HTTP gateway.

Serves the chat page at /, the chat API at POST /api/chat, and the
session diagnostic at GET /state. Bind address defaults to the values
in your config file (gateway.host / gateway.port).

Examples:
  disputeflow serve                 # use config defaults
  disputeflow serve -p 8080         # listen on port 8080
  disputeflow serve --host 0.0.0.0  # bind to all interfaces")]
    Serve {
        /// Port to listen on; defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Show effective configuration and backends
    Status,

    /// Inspect persisted sessions
    Session {
        #[command(subcommand)]
        session_command: SessionCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Print the full persisted state for a session identifier as JSON
    Get {
        /// Session identifier (cookie value)
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("DISPUTEFLOW_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = Config::load_or_init().await?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            info!("Starting disputeflow gateway on {host}:{port}");
            gateway::run_gateway(&host, port, config).await
        }

        Commands::Status => {
            println!("disputeflow status");
            println!();
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Workspace:   {}", config.workspace_dir.display());
            println!("Config:      {}", config.config_path.display());
            println!();
            println!(
                "Provider:    {}",
                config.default_provider.as_deref().unwrap_or("openai")
            );
            println!(
                "Model:       {}",
                config.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
            );
            println!("Temperature: {}", config.default_temperature);
            println!();
            println!("Gateway:     {}:{}", config.gateway.host, config.gateway.port);
            println!("Sessions:    {} backend", config.session.backend);
            println!(
                "Replay cap:  {}",
                if config.session.max_model_messages == 0 {
                    "unbounded".to_string()
                } else {
                    format!("{} messages", config.session.max_model_messages)
                }
            );
            Ok(())
        }

        Commands::Session { session_command } => match session_command {
            SessionCommands::Get { id } => {
                let store = create_session_store(&config.session, &config.workspace_dir)?;
                match store.load(&id).await? {
                    Some(state) => {
                        println!("{}", serde_json::to_string_pretty(&state)?);
                    }
                    None => println!("null"),
                }
                Ok(())
            }
        },
    }
}
