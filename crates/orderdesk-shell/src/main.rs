//! OrderDesk shell - session tooling for the OrderDesk dashboard backend.
//!
//! Logs in, keeps the stored credential honest with the Session Monitor and
//! issues authenticated requests through the gateway.

mod app;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use orderdesk_core::auth::decode_claims;
use orderdesk_core::storage::{DESIGNATION_KEY, ROLE_ID_KEY, USER_CODE_KEY};
use orderdesk_core::{Config, SessionState};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

// ============================================================================
// Constants
// ============================================================================

/// Path the navigator starts on when none is given
const DEFAULT_START_PATH: &str = "/dashboard";

/// How often watch mode looks for a redirect (in milliseconds)
const WATCH_POLL_MS: u64 = 250;

const USAGE: &str = "usage: orderdesk <login <username> | logout | status | get <path> | watch [path]>";

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must outlive the program.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os("ORDERDESK_LOG_DIR").map(PathBuf::from) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "orderdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load().context("Failed to load configuration")?;
    info!(base_url = %config.api_base_url, "OrderDesk shell starting");

    match args.first().map(String::as_str) {
        Some("login") => {
            let username = args.get(1).cloned().or_else(|| config.last_username.clone());
            let Some(username) = username else {
                bail!("{}", USAGE);
            };
            login(config, &username).await
        }
        Some("logout") => logout(config),
        Some("status") => status(config),
        Some("get") => {
            let Some(path) = args.get(1) else {
                bail!("{}", USAGE);
            };
            get(config, path).await
        }
        Some("watch") => {
            let path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_START_PATH);
            watch(config, path).await
        }
        _ => bail!("{}", USAGE),
    }
}

async fn login(mut config: Config, username: &str) -> Result<()> {
    let app = App::one_shot(config.clone(), &config.login_path)?;
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    let record = app
        .gateway
        .authenticate(username, &password)
        .await
        .context("Login failed")?;

    config.last_username = Some(username.to_string());
    config.save().context("Failed to save configuration")?;

    println!("Logged in as {}", record.user_code.as_deref().unwrap_or(username));
    if let Ok(claims) = decode_claims(&record.access_token) {
        if let Some(expires) = claims.expires_at() {
            println!("Session expires at {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    Ok(())
}

fn logout(config: Config) -> Result<()> {
    let app = App::one_shot(config, DEFAULT_START_PATH)?;
    app.invalidator.logout();
    println!("Logged out");
    Ok(())
}

fn status(config: Config) -> Result<()> {
    let app = App::new(config, DEFAULT_START_PATH)?;
    let Some(token) = app.store.access_token().context("Failed to read credentials")? else {
        println!("Not logged in");
        return Ok(());
    };

    match decode_claims(&token) {
        Ok(claims) => {
            let now = Utc::now().timestamp();
            if claims.is_expired_at(now) {
                println!("Session expired");
            } else {
                match claims.seconds_remaining(now) {
                    Some(secs) => println!("Session valid, {} minutes remaining", secs / 60),
                    None => println!("Session valid, no expiry"),
                }
            }
            if let Some(sub) = claims.sub {
                println!("  subject:     {}", sub);
            }
        }
        Err(e) => println!("Stored credential is malformed: {}", e),
    }

    for (label, key) in [
        ("role id", ROLE_ID_KEY),
        ("user code", USER_CODE_KEY),
        ("designation", DESIGNATION_KEY),
    ] {
        if let Some(value) = app.store.attribute(key)? {
            println!("  {:<12} {}", format!("{}:", label), value);
        }
    }
    Ok(())
}

async fn get(config: Config, path: &str) -> Result<()> {
    let app = App::one_shot(config, path)?;
    match app.gateway.get(path).await {
        Ok(response) => {
            match response.json() {
                Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                None => println!("{}", response.body),
            }
            Ok(())
        }
        Err(e) => {
            if app.cell.is_invalidating() {
                eprintln!("Session ended; run `orderdesk login` again.");
            }
            Err(e).with_context(|| format!("GET {} failed", path))
        }
    }
}

async fn watch(config: Config, path: &str) -> Result<()> {
    let app = App::new(config, path)?;
    let login_path = app.config.login_path.clone();
    let handle = app.monitor().start();
    println!("Watching session on {} (Ctrl+C to stop)", path);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("Stopped");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(WATCH_POLL_MS)) => {
                if !app.navigator.navigations().is_empty() {
                    println!("Session ended; redirected to {}", login_path);
                    break;
                }
            }
        }
    }

    handle.stop();
    if app.cell.state() == SessionState::Valid {
        info!("Session still valid at exit");
    }
    Ok(())
}
