//! Write a default config file.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;

pub fn execute(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} Config already exists: {}", "-".dimmed(), path.display());
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}
