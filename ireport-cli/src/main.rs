//! iReport CLI - command-line client
//!
//! Keeps a session the way the mobile client does: identity and token are
//! persisted between runs, and logins go either to a remote backend
//! (`IREPORT_API_BASE_URL`) or to a local credential store.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ireport_auth::{
    build_authenticator, AuthConfig, BlobCredentialStore, CredentialStore, FileStorage,
    Permission, ProfileUpdate, SessionManager, SessionState, TokenService,
};
use ireport_core::{
    init_logging, load_toml, log_operation_error, log_operation_start, log_operation_success,
    save_toml, LoggingConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ireport")]
#[command(about = "Command-line client for iReport")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the persisted session and local credential lists
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Discard the current session
    Logout,

    /// Show the current identity
    Whoami,

    /// Update the current identity's profile
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// List staff members (admin and guidance only)
    Staff,

    /// Check whether the current identity holds a permission
    Can {
        /// Permission name, e.g. manage_reports
        permission: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// On-disk layout: auth settings at the top level, logging in its own table
#[derive(Debug, Default, Serialize, Deserialize)]
struct CliConfig {
    #[serde(flatten)]
    auth: AuthConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ireport")
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ireport")
}

/// Auth settings come from the file plus environment; logging from the file only
fn load_config(path: &Path) -> anyhow::Result<CliConfig> {
    let logging = if path.exists() {
        load_toml::<CliConfig, _>(path)
            .with_context(|| format!("reading {}", path.display()))?
            .logging
    } else {
        LoggingConfig::default()
    };

    let auth = AuthConfig::load(Some(path))?;
    Ok(CliConfig { auth, logging })
}

/// A restored session plus the credential lists it authenticates against
struct Client {
    session: SessionManager<FileStorage>,
    store: Arc<dyn CredentialStore>,
}

async fn open_client(config: &AuthConfig, data_dir: &Path) -> anyhow::Result<Client> {
    let storage = Arc::new(FileStorage::open(data_dir.join("session.json")).await?);
    let store: Arc<dyn CredentialStore> = Arc::new(BlobCredentialStore::new(
        storage.clone(),
        config.bootstrap_admin_password.clone(),
    ));
    let tokens = Arc::new(TokenService::new(&config.token)?);
    let authenticator = build_authenticator(config, store.clone(), tokens)?;
    debug!(mode = %authenticator.mode(), "Authenticator ready");

    let session = SessionManager::new(storage, store.clone(), authenticator);
    session.init().await?;
    Ok(Client { session, store })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)?;

    if cli.verbose {
        config.logging = LoggingConfig::with_level("debug");
    }
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting iReport CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config { show, init } = &cli.command {
        return handle_config(&config_path, &config, *show, *init);
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let client = open_client(&config.auth, &data_dir).await?;
    let session = &client.session;

    match cli.command {
        Commands::Login { email, password } => handle_login(session, &email, &password).await?,
        Commands::Logout => {
            session.logout().await?;
            println!("Logged out");
        }
        Commands::Whoami => handle_whoami(session).await?,
        Commands::Profile { name, phone } => handle_profile(session, name, phone).await?,
        Commands::Staff => handle_staff(&client).await?,
        Commands::Can { permission } => handle_can(session, &permission).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn handle_login(
    session: &SessionManager<FileStorage>,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    log_operation_start!("login");

    match session.login(email, password).await {
        Ok(identity) => {
            log_operation_success!("login", id = %identity.id);
            println!(
                "Logged in as {} <{}> ({})",
                identity.display_name, identity.email, identity.role
            );
            Ok(())
        }
        Err(e) => {
            log_operation_error!("login", e);
            bail!("{}", e.public_message())
        }
    }
}

async fn handle_whoami(session: &SessionManager<FileStorage>) -> anyhow::Result<()> {
    match (session.state().await, session.current().await) {
        (SessionState::LoggedIn, Some(identity)) => {
            println!("{}", serde_json::to_string_pretty(&identity.to_info())?);
            if session.can_access_full_dashboard().await {
                println!("Dashboard: full");
            } else {
                println!("Dashboard: limited");
            }
        }
        _ => println!("Not logged in"),
    }
    Ok(())
}

async fn handle_profile(
    session: &SessionManager<FileStorage>,
    name: Option<String>,
    phone: Option<String>,
) -> anyhow::Result<()> {
    let update = ProfileUpdate {
        display_name: name,
        phone,
        profile_image: None,
    };
    if update.is_empty() {
        bail!("Nothing to update: pass --name and/or --phone");
    }

    let identity = session.update_current_user(update).await?;
    println!("Profile updated: {}", identity.display_name);
    Ok(())
}

async fn handle_staff(client: &Client) -> anyhow::Result<()> {
    if !client.session.can_access_full_dashboard().await {
        bail!("Only administrators and guidance staff can list staff members");
    }
    let Some(me) = client.session.staff_member().await else {
        bail!("Not logged in as a staff member");
    };
    debug!(id = %me.id, "Listing staff");

    for member in client.store.staff().await? {
        let status = if member.is_active { "active" } else { "inactive" };
        println!(
            "{:<24} {:<32} {:<10} {}",
            member.display_name, member.email, member.role, status
        );
    }
    Ok(())
}

async fn handle_can(session: &SessionManager<FileStorage>, permission: &str) -> anyhow::Result<()> {
    let permission: Permission = permission
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    if session.current().await.is_none() {
        bail!("Not logged in");
    }

    let allowed = session.check_permission(permission).await;
    println!("{}: {}", permission, if allowed { "yes" } else { "no" });
    Ok(())
}

fn handle_config(path: &Path, config: &CliConfig, show: bool, init: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        save_toml(&CliConfig::default(), path)?;
        println!("Configuration initialized at: {}", path.display());
    }

    if show {
        println!("Configuration file: {}", path.display());
        println!(
            "Authentication: {}",
            match config.auth.remote_base_url() {
                Some(url) => format!("remote ({})", url),
                None => "local".to_string(),
            }
        );
        println!("Token lifetime: {}h", config.auth.token.ttl_hours);
        println!("Request timeout: {}s", config.auth.request_timeout_secs);
        println!("Log level: {}", config.logging.level);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let cli = Cli::parse_from(["ireport", "login", "a@school.edu", "--password", "pw"]);
        match cli.command {
            Commands::Login { email, password } => {
                assert_eq!(email, "a@school.edu");
                assert_eq!(password, "pw");
            }
            _ => panic!("expected login"),
        }

        let cli = Cli::parse_from(["ireport", "-v", "can", "manage_reports"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Can { .. }));
    }

    #[test]
    fn init_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ireport").join("config.toml");

        handle_config(&path, &CliConfig::default(), false, true).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.logging.level, "info");
        assert_eq!(loaded.auth.bootstrap_admin_password, "admin123");

        // Refuses to clobber an existing file
        assert!(handle_config(&path, &CliConfig::default(), false, true).is_err());
    }

    #[tokio::test]
    async fn local_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig::default();

        let client = open_client(&config, dir.path()).await.unwrap();
        assert!(handle_staff(&client).await.is_err());

        handle_login(&client.session, "admin@school.edu", "admin123").await.unwrap();
        handle_can(&client.session, "remove_students").await.unwrap();
        handle_staff(&client).await.unwrap();
        assert!(handle_can(&client.session, "fly").await.is_err());

        // A new process picks the session back up
        let reopened = open_client(&config, dir.path()).await.unwrap();
        assert_eq!(reopened.session.state().await, SessionState::LoggedIn);

        reopened.session.logout().await.unwrap();
        assert!(handle_profile(&reopened.session, Some("X".into()), None).await.is_err());
    }
}
