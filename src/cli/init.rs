use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(data_dir.join("exports"))?;
    save_settings(&settings)?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    tracing::debug!(data_dir = %data_dir.display(), "initialized local store");

    println!("Initialized pricewise at {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  pricewise import <sales.json>");
    println!("  pricewise report summary");
    println!("  pricewise dashboard");
    Ok(())
}
