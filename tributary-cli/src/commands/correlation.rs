//! Correlation id handler

use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

pub async fn handle_correlation_command(config: &Config) -> Result<()> {
    let id = config
        .api()
        .generate_correlation_id()
        .await
        .context("Failed to obtain a correlation id")?;

    println!("{}", id.to_string().cyan());
    Ok(())
}
