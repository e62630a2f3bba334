//! iReport Web Server
//!
//! REST backend for iReport authentication and identity administration.

use clap::Parser;
use ireport_web::server::IReportServerBuilder;
use ireport_web::{init_logging, WebConfig};
use tracing::{info, warn};

/// iReport Web Server - authentication and role authorization backend
#[derive(Parser)]
#[command(name = "ireport-web")]
#[command(about = "REST backend for iReport")]
#[command(version)]
struct Args {
    /// Server host to bind to (defaults to IREPORT_HOST or 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on (defaults to PORT or 5000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode (permits the built-in token secret)
    #[arg(long)]
    dev: bool,

    /// SQLite database URL for identities, e.g. sqlite://ireport.db
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var(
            "RUST_LOG",
            format!(
                "ireport_web={level},ireport_auth={level},tower_http=debug",
                level = args.log_level
            ),
        );
    }
    init_logging();

    let config = WebConfig::from_env()?;
    let dev_mode = config.dev_mode || args.dev;
    let mut builder = IReportServerBuilder::new(config).dev_mode(dev_mode);

    // Command line arguments override the environment
    if let Some(host) = args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(database_url) = args.database_url {
        builder = builder.database_url(database_url);
    }

    let server = builder.build().await?;
    info!("Starting iReport Web Server on http://{}", server.config().address());
    if server.config().database_url.is_none() {
        warn!("DATABASE_URL not set; identities are kept in memory only");
    }

    server.start().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["ireport-web"]);
        assert_eq!(args.host, None);
        assert_eq!(args.port, None);
        assert!(!args.dev);

        let args = Args::parse_from(["ireport-web", "--host", "0.0.0.0", "--port", "3000", "--dev"]);
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(3000));
        assert!(args.dev);
    }
}
