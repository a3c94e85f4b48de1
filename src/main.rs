use tracing::{error, info};

use postadm::service::{AdminService, DomainService};
use postadm::{AuditLog, Config, Database};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = postadm::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        postadm::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    info!("postadm - mail directory administration");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    if let Err(e) = summarize(&db, &config).await {
        error!("Failed to read directory: {e}");
        std::process::exit(1);
    }
}

async fn summarize(db: &Database, config: &Config) -> postadm::Result<()> {
    let domains = DomainService::new(db, config).list_domains().await?;
    let admins = AdminService::new(db, config).list_admins().await?;
    let log_entries = AuditLog::new(db).count().await?;

    info!(
        "Directory at {}: {} domains, {} admins, {} log entries",
        config.database.path,
        domains.len(),
        admins.len(),
        log_entries
    );
    Ok(())
}
