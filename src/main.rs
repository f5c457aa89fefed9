// src/main.rs - hoctap entry point

use clap::Parser;
use std::path::PathBuf;

use hoctap::api::{self, ApiState};
use hoctap::cli::ask::{self, AskOptions};
use hoctap::cli::{Cli, Commands};
use hoctap::core::prompt::PromptComposer;
use hoctap::core::tutor::Tutor;
use hoctap::core::types::{Mode, SolutionMode};
use hoctap::infra::config::Config;
use hoctap::infra::credentials::StaticCredentials;
use hoctap::infra::logger;
use hoctap::infra::paths;
use hoctap::infra::session::SessionStore;
use hoctap::provider;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(paths::config_file_path);
    let mut config = if cli.config.is_some() {
        Config::load_from(&config_path)?
    } else {
        Config::load()?
    };

    let credentials = StaticCredentials::from_env(config.provider.api_key.clone());

    if let Some(Commands::Status) = cli.command {
        return hoctap::cli::status::show_status(&config_path, &config, &credentials);
    }

    let provider = provider::build_provider(&config.provider)?;
    let tutor = Tutor::new(PromptComposer::default(), provider);

    match cli.command {
        Some(Commands::Ask {
            question,
            subject,
            mode,
            solution_mode,
            image,
        }) => {
            let options = AskOptions {
                question: question.join(" "),
                subject: subject.unwrap_or_else(|| config.tutor.default_subject.clone()),
                mode: Mode::parse(&mode),
                solution_mode: SolutionMode::parse(&solution_mode),
                image,
            };
            ask::run_ask(&tutor, &credentials, options).await
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, tutor, credentials).await
        }
        Some(Commands::Status) | None => serve(config, tutor, credentials).await,
    }
}

async fn serve(config: Config, tutor: Tutor, credentials: StaticCredentials) -> anyhow::Result<()> {
    if credentials.resolve(None, None).is_none() {
        tracing::warn!(
            "No API key in GEMINI_API_KEY, GOOGLE_API_KEY or config; clients must supply their own"
        );
    }
    tracing::info!(provider = tutor.provider_id(), "Starting tutor");

    let limits = config.server.session_limits();
    tracing::debug!(
        idle_minutes = config.server.session_idle_minutes,
        max_sessions = limits.max_sessions,
        "Session limits"
    );
    let state = ApiState::new(tutor, credentials, config.tutor.clone())
        .with_sessions(SessionStore::with_limits(limits));
    api::start_server(&config.server, state).await
}
