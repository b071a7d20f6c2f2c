//! `mdxsync sync` - batch reconciliation.

use std::path::PathBuf;

use crate::cms::RealCms;
use crate::config::Config;
use crate::content_type::{CONTENT_TYPES, find};
use crate::sync::{Publisher, RealGit, SyncOptions, sync_all};

use super::{CountRow, counts_table};
use crate::cli::error::CliError;

/// Run reconciliation and print the summary. Returns whether any
/// per-record error occurred.
pub async fn run(
    config: &Config,
    dry_run: bool,
    content_type: Option<&str>,
) -> miette::Result<bool> {
    let types = match content_type {
        Some(key) => {
            let spec = find(key).ok_or_else(|| CliError::UnknownType(key.to_string()))?;
            vec![*spec]
        }
        None => CONTENT_TYPES.to_vec(),
    };

    if dry_run {
        println!("Dry-run mode - no changes will be made\n");
    }

    let cms = RealCms::new(config);
    let publisher = Publisher::new(RealGit::new(), PathBuf::from("."), config);
    let opts = SyncOptions { dry_run };

    let summary = sync_all(&cms, &publisher, config, &types, &opts).await;

    let icon = if summary.has_errors() { "⚠" } else { "✓" };
    println!("{} Sync complete\n", icon);
    println!(
        "{}",
        counts_table(vec![
            CountRow { metric: "Created", count: summary.created },
            CountRow { metric: "Updated", count: summary.updated },
            CountRow { metric: "Deleted", count: summary.deleted },
            CountRow { metric: "Unchanged", count: summary.unchanged },
            CountRow { metric: "Materialized", count: summary.materialized },
            CountRow { metric: "Skipped", count: summary.skipped },
            CountRow { metric: "Errors", count: summary.errors },
        ])
    );

    if dry_run {
        println!("\nThis was a dry-run. Run without --dry-run to apply changes.");
    }

    Ok(summary.has_errors())
}
