//! Login account management.

use kok_db::Database;
use log::info;
use std::path::Path;

pub fn run_create_user(db_path: &Path, username: &str, password: &str) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        anyhow::bail!("username and password must not be empty");
    }
    let db = Database::open(db_path)?;
    if db.create_user(username, password)? {
        info!("Created user '{}'", username);
    } else {
        info!("User '{}' already exists", username);
    }
    Ok(())
}
