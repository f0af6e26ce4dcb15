//! Command implementations for the station CLI.
//!
//! Provides subcommands for serving the web application, importing survey
//! spreadsheets, managing login accounts and inspecting pivot tables.

use clap::Subcommand;
use kok_data::MeasurementFamily;
use std::path::PathBuf;

pub mod load;
pub mod pivot;
pub mod user;

#[derive(Subcommand)]
pub enum Command {
    /// Run the web application
    Serve {
        /// SQLite database file
        #[arg(long, env = "KOK_DB_PATH", default_value = kok_web::config::DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Address to bind
        #[arg(long, env = "KOK_HOST", default_value = kok_web::config::DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = kok_web::config::DEFAULT_PORT)]
        port: u16,
    },

    /// Create a login account (creates the users table if needed)
    CreateUser {
        /// SQLite database file
        #[arg(long, env = "KOK_DB_PATH", default_value = kok_web::config::DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(short, long, default_value = "admin")]
        username: String,

        #[arg(short, long, env = "KOK_PASSWORD")]
        password: String,
    },

    /// Import station and measurement CSV exports
    Load {
        /// SQLite database file
        #[arg(long, env = "KOK_DB_PATH", default_value = kok_web::config::DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Station metadata CSV
        #[arg(short = 't', long)]
        stations: Option<PathBuf>,

        /// Water quality CSV
        #[arg(short, long)]
        water: Option<PathBuf>,

        /// Soil quality CSV
        #[arg(short, long)]
        soil: Option<PathBuf>,
    },

    /// Print a station's pivot table as JSON
    Pivot {
        /// SQLite database file
        #[arg(long, env = "KOK_DB_PATH", default_value = kok_web::config::DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Station code
        station: String,

        /// Measurement family: water or soil
        #[arg(short, long, default_value = "water")]
        family: MeasurementFamily,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { db, host, port } => {
            kok_web::serve(kok_web::ServerConfig {
                db_path: db,
                host,
                port,
            })
            .await
        }
        Command::CreateUser {
            db,
            username,
            password,
        } => user::run_create_user(&db, &username, &password),
        Command::Load {
            db,
            stations,
            water,
            soil,
        } => load::run_load(&db, stations.as_deref(), water.as_deref(), soil.as_deref()),
        Command::Pivot {
            db,
            station,
            family,
        } => pivot::run_pivot(&db, &station, family),
    }
}
