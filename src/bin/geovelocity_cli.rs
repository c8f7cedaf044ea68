use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use structopt::StructOpt;

use geovelocity::config::Config;
use geovelocity::{
    AccessEvent, AccessPoint, AnalysisEngine, GeoIpService, GeoResolver, SqliteEventStore,
};

/// Impossible travel detection command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "geovelocity", about = "Impossible travel detection CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml", parse(from_os_str))]
        output: PathBuf,
    },
    /// Resolve an IP address to its location
    Lookup {
        /// Path to the GeoLite2-City .mmdb database
        #[structopt(long, env = "GEODB", default_value = "GeoLite2-City.mmdb", parse(from_os_str))]
        geodb: PathBuf,
        /// IP address to resolve
        ip: String,
    },
    /// Analyze one access event against the local event store
    Analyze {
        /// Path to the GeoLite2-City .mmdb database
        #[structopt(long, env = "GEODB", default_value = "GeoLite2-City.mmdb", parse(from_os_str))]
        geodb: PathBuf,
        /// Directory holding the SQLite event database
        #[structopt(long, env = "DBPATH", default_value = "local-db", parse(from_os_str))]
        dbpath: PathBuf,
        /// Unique event identifier
        #[structopt(long)]
        id: String,
        /// Username the event belongs to
        #[structopt(long)]
        user: String,
        /// Unix timestamp of the event in seconds
        #[structopt(long)]
        timestamp: i64,
        /// Source IP address
        #[structopt(long)]
        ip: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    match Cli::from_args() {
        Cli::Config { output } => {
            Config::default().to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Lookup { geodb, ip } => {
            let service = GeoIpService::new(&geodb)?;
            let point = service.resolve(&ip)?;
            let info = service.lookup_city_info(&ip)?;

            println!("IP:        {}", ip);
            println!("Location:  {}", info.display_location());
            println!("Latitude:  {:.4}", point.latitude);
            println!("Longitude: {:.4}", point.longitude);
            println!("Accuracy:  {} km", point.radius);
            if let Some(code) = info.country_code {
                println!("Country:   {}", code);
            }
            if let Some(timezone) = info.timezone {
                println!("Timezone:  {}", timezone);
            }
        }
        Cli::Analyze { geodb, dbpath, id, user, timestamp, ip } => {
            let event = AccessEvent::new(id, user, timestamp, ip)?;
            let engine = AnalysisEngine::new(
                GeoIpService::new(&geodb)?,
                SqliteEventStore::open_in_dir(&dbpath)?,
            );

            let verdict = engine.analyze(&event)?;
            describe("preceding", verdict.preceding());
            describe("subsequent", verdict.subsequent());
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

fn describe(label: &str, access: Option<&AccessPoint>) {
    let Some(access) = access else {
        eprintln!("No {} event", label);
        return;
    };

    let when = Utc
        .timestamp_opt(access.timestamp, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| access.timestamp.to_string());
    let speed = if access.speed == i64::MAX {
        "simultaneous".to_string()
    } else {
        format!("{} mph", access.speed)
    };

    eprintln!("Nearest {} event: {} from {} ({})", label, when, access.ip, speed);
}
