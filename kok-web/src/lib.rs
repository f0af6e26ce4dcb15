//! HTTP server for the Kok river monitoring stations.
//!
//! Serves the station list, per-station water and soil pivot tables, and
//! login-guarded add/edit/delete endpoints. Responses are JSON; page
//! rendering is left to the front end.
//!
//! # Routes
//!
//! | method | path | login |
//! |---|---|---|
//! | GET | `/` | |
//! | GET | `/api/stations` | |
//! | GET | `/test` | |
//! | GET | `/station/{code}` | |
//! | POST | `/login` | |
//! | GET | `/logout` | |
//! | POST | `/add-station` | yes |
//! | GET, POST | `/edit-station/{code}` | yes |
//! | DELETE | `/delete-station/{code}` | yes |

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use routes::router;

use kok_db::Database;
use session::SessionStore;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
        }
    }
}

/// Open the database and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = Database::open(&config.db_path)?;
    let app = router(AppState::new(db));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {}: {}", addr, e))?;
    log::info!("database: {}", config.db_path.display());
    log::info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
