use std::path::PathBuf;

use clap::{Parser, Subcommand};
use peerflow::config::{ClientConfig, ConfigError};
use peerflow::model::{Role, User};
use peerflow::storage::FileStorage;
use peerflow::{ApiClient, ApiError, Navigation, RouteGuard, SessionStore};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not logged in; run `peerflow login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "peerflow", about = "PeerFlow session and assignment CLI")]
struct Cli {
    /// Orchestrator base URL (overrides `PEERFLOW_API_BASE_URL`).
    #[arg(long)]
    base_url: Option<String>,

    /// Auth service base URL (overrides `PEERFLOW_AUTH_BASE_URL`).
    #[arg(long)]
    auth_base_url: Option<String>,

    /// Session file (overrides `PEERFLOW_STATE_FILE`).
    #[arg(long)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PEERFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the persisted session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Fetch an assignment with its peer review and submissions.
    Assignment {
        assignment_id: String,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Show the route guard decision for a path.
    Route { path: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    let api = ApiClient::new(config.timeouts)?;
    let guard = RouteGuard::new(config.public_routes.clone());
    let mut store = SessionStore::restore(FileStorage::new(&config.state_file), api);

    match cli.command {
        Command::Login { email, password } => {
            let user = store.login(&config.auth_base_url, &email, &password).await?;
            println!("logged in as {} <{}> ({})", user.display_name(), user.email, role_label(&user));
        }
        Command::Logout => {
            store.logout();
            println!("logged out");
        }
        Command::Whoami => match store.user() {
            Some(user) if store.is_authenticated() => {
                println!("{} <{}> ({})", user.display_name(), user.email, role_label(user));
            }
            _ => println!("not logged in"),
        },
        Command::Assignment { assignment_id, force } => {
            let path = format!("/assignments/{assignment_id}");
            if guard.check(&store, &path) != Navigation::Allow {
                return Err(CliError::NotLoggedIn);
            }
            let assignment = store
                .fetch_assignment(&config.api_base_url, &assignment_id, force)
                .await?;
            let summary = json!({
                "assignment": assignment,
                "peerReview": store.peer_review().map(|pr| json!({
                    "id": pr.id,
                    "status": pr.status,
                    "reviewDeadline": pr.review_deadline,
                    "criteria": pr.rubric.criteria.len(),
                    "pairings": pr.pairings.len(),
                    "completedReviews": pr.completed_reviews(),
                })),
                "submissions": store.submissions().len(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Route { path } => match guard.check(&store, &path) {
            Navigation::Allow => println!("allow {path}"),
            Navigation::Redirect(to) => println!("redirect {path} -> {to}"),
        },
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config.api_base_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(url) = &cli.auth_base_url {
        config.auth_base_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(path) = &cli.state_file {
        config.state_file.clone_from(path);
    }
    Ok(config)
}

fn role_label(user: &User) -> &str {
    user.role.as_ref().map_or("no role", Role::as_str)
}
