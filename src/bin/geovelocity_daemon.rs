use std::path::PathBuf;
use std::sync::Arc;

use structopt::StructOpt;
use tokio::net::TcpListener;

use geovelocity::api;
use geovelocity::config::{Config, Overrides};
use geovelocity::{AnalysisEngine, GeoIpService, SqliteEventStore};

/// Impossible travel detection service
#[derive(StructOpt, Debug)]
#[structopt(name = "geovelocity-daemon", about = "Impossible travel detection service")]
struct Opt {
    /// Path to configuration file
    #[structopt(short, long, default_value = "config.toml", parse(from_os_str))]
    config: PathBuf,

    /// Bind address for the API
    #[structopt(long, env = "HOST")]
    host: Option<String>,

    /// Bind port for the API
    #[structopt(long, env = "PORT")]
    port: Option<u16>,

    /// Path to the GeoLite2-City .mmdb database
    #[structopt(long, env = "GEODB", parse(from_os_str))]
    geodb: Option<PathBuf>,

    /// Directory holding the SQLite event database
    #[structopt(long, env = "DBPATH", parse(from_os_str))]
    dbpath: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opt = Opt::from_args();
    let config = Config::load_or_default(&opt.config)?.apply(Overrides {
        host: opt.host,
        port: opt.port,
        geoip_database: opt.geodb,
        data_dir: opt.dbpath,
    });

    log::info!("Starting geovelocity daemon...");

    let geo_service = GeoIpService::new(&config.geoip.database_path)?;
    log::info!("GeoIP database: {}", config.geoip.database_path.display());

    let store = SqliteEventStore::open(config.database_path())?;
    log::info!("Event store: {}", config.database_path().display());

    let engine = Arc::new(AnalysisEngine::new(geo_service, store));
    let router = api::create_router(engine);

    let addresses = config.bind_addresses()?;
    let listener = TcpListener::bind(addresses.as_slice()).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Geovelocity daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Received shutdown signal, gracefully stopping...");
}
