//! vec2 command-line client
//!
//! Signs in through the browser, keeps tokens in a credential file, and
//! prints API responses as pretty JSON.

mod callback;
mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vec2_client::objects::Response;
use vec2_client::{FileLog, FileStore, FormData, Vec2Client};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "vec2", version, about = "Command-line client for the vec2 marketplace API")]
struct Cli {
    /// Config file (defaults to $VEC2_CONFIG, then ./vec2.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in through the browser and store the tokens
    Login,
    /// Show a public profile
    Profile { username: String },
    /// Search vectors, profiles, or your own vectors
    Search {
        query: String,
        #[arg(long, conflicts_with = "mine")]
        profiles: bool,
        #[arg(long)]
        mine: bool,
    },
    /// List vectors of a user, or your own
    Vectors { username: Option<String> },
    /// List your tags
    Tags,
    /// List your sales
    Sales,
    /// List your purchases
    Purchases,
    /// List your payouts
    Payouts,
    /// Show the signed-in user
    Whoami,
    /// Download a vector file
    Download {
        id: String,
        /// Output path (defaults to <id>.svg)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fetch the public preview instead of the purchased file
        #[arg(long)]
        public: bool,
    },
    /// Show or clear the stored session
    Tokens {
        #[arg(long)]
        clear: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let client = Arc::new(build_client(&config).await?);
    run(cli.command, client, &config).await
}

async fn build_client(config: &Config) -> Result<Vec2Client> {
    let store = FileStore::load(config.credentials.path.clone())
        .await
        .with_context(|| {
            format!(
                "failed to open credentials at {}",
                config.credentials.path.display()
            )
        })?;
    let secret = config
        .api
        .secret
        .as_ref()
        .ok_or(common::Error::MissingSecret(config::SECRET_ENV))?;

    let mut builder = Vec2Client::builder(
        &config.api.client_id,
        secret.expose().as_str(),
        &config.api.key,
    )
    .url(&config.api.url)
    .timeout(Duration::from_secs(config.api.timeout_secs))
    .token_store(Arc::new(store));

    for log in &config.logs {
        let mut file_log = FileLog::new(&log.path, log.parsed_fields()?);
        if log.auth_only {
            file_log = file_log.when(|_, _, _, auth_endpoint| auth_endpoint);
        }
        builder = builder.enable_log(file_log);
    }

    Ok(builder.build()?)
}

async fn run(command: Command, client: Arc<Vec2Client>, config: &Config) -> Result<ExitCode> {
    let resp = match command {
        Command::Login => return login(client, config).await,
        Command::Tokens { clear } => return tokens(&client, config, clear).await,
        Command::Download { id, output, public } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{id}.svg")));
            return download(&client, &id, &output, public).await;
        }
        Command::Profile { username } => client.get().profile(&username).await?,
        Command::Search {
            query,
            profiles,
            mine,
        } => {
            if profiles {
                client.get().profile_search(&query).await?
            } else if mine {
                client.get().user_vector_search(&query).await?
            } else {
                client.get().vector_search(&query).await?
            }
        }
        Command::Vectors { username } => client.get().vectors(username.as_deref()).await?,
        Command::Tags => client.get().tags().await?,
        Command::Sales => client.get().sales().await?,
        Command::Purchases => client.get().purchases().await?,
        Command::Payouts => client.get().payouts().await?,
        Command::Whoami => client.get().user(FormData::new()).await?,
    };
    print_response(&resp)
}

fn print_response(resp: &Response) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    Ok(exit_code(resp.status))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

async fn login(client: Arc<Vec2Client>, config: &Config) -> Result<ExitCode> {
    let addr = config.login.callback_addr;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind callback listener on {addr}"))?;

    let url = client.login_url(&config.login.redirect_url())?;
    println!("Open this URL in your browser to sign in:\n\n    {url}\n");

    let timeout = Duration::from_secs(config.login.timeout_secs);
    if !callback::wait_for_login(listener, client, timeout).await? {
        anyhow::bail!("no valid login callback within {}s", timeout.as_secs());
    }

    info!(credentials = %config.credentials.path.display(), "credentials stored");
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "status": true,
            "credentials": config.credentials.path.display().to_string(),
        }))?
    );
    Ok(ExitCode::SUCCESS)
}

async fn tokens(client: &Vec2Client, config: &Config, clear: bool) -> Result<ExitCode> {
    if clear {
        client.set_access_token("").await?;
        client.set_refresh_token("").await?;
        info!("stored tokens cleared");
    }
    let summary = json!({
        "state": format!("{:?}", client.state().await).to_lowercase(),
        "access_token": !client.access_token().await.is_empty(),
        "refresh_token": !client.refresh_token().await.is_empty(),
        "credentials": config.credentials.path.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}

async fn download(client: &Vec2Client, id: &str, output: &Path, public: bool) -> Result<ExitCode> {
    let resp = if public {
        client.get().vector_public(id).await?
    } else {
        client.get().vector_download(id).await?
    };

    let Some(bytes) = resp.get("vector").and_then(|v| v.as_file()) else {
        return print_response(&resp);
    };
    tokio::fs::write(output, bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "status": true,
            "path": output.display().to_string(),
            "bytes": bytes.len(),
        }))?
    );
    Ok(ExitCode::SUCCESS)
}
