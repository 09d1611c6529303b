//! Lineage handler

use anyhow::{Context, Result};
use colored::*;
use tributary_core::dto::lineage::LineageInfo;
use tributary_runner::service::LineageQuery;

use super::print_json;
use crate::config::Config;

pub async fn handle_lineage_command(dataset: &str, config: &Config) -> Result<()> {
    let info = LineageQuery::new(config.api())
        .lineage_for(dataset)
        .await
        .with_context(|| format!("Failed to fetch lineage of '{}'", dataset))?;

    print_lineage(dataset, &info);
    Ok(())
}

pub(crate) fn print_lineage(dataset: &str, info: &LineageInfo) {
    let edges = info.edges();

    if edges.is_empty() {
        println!("{}", format!("No lineage known for {}.", dataset).yellow());
    } else {
        println!("{}", format!("Lineage of {}:", dataset).bold());
        for edge in edges {
            println!(
                "  {} {} {} {} {}",
                edge.input,
                "→".dimmed(),
                edge.transformation.cyan(),
                "→".dimmed(),
                edge.output
            );
        }
    }

    if let Some(counts) = &info.row_counts {
        print_json("Row counts:", counts);
    }
}
