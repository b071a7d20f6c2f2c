//! `mdxsync import` - translation import.

use crate::cms::RealCms;
use crate::config::Config;
use crate::content_type::find;
use crate::sync::{ImportOptions, import_translations};

use super::{CountRow, counts_table};
use crate::cli::error::CliError;

pub async fn run(
    config: &Config,
    content_type: &str,
    opts: ImportOptions,
) -> miette::Result<bool> {
    let spec = find(content_type)
        .ok_or_else(|| CliError::UnknownType(content_type.to_string()))?;

    if opts.dry_run {
        println!("Dry-run mode - no records will be created\n");
    }

    let cms = RealCms::new(config);
    let summary = import_translations(&cms, config, spec, &opts).await?;

    let icon = if summary.has_errors() { "⚠" } else { "✓" };
    println!("{} Import complete\n", icon);
    println!(
        "{}",
        counts_table(vec![
            CountRow { metric: "Imported", count: summary.imported },
            CountRow { metric: "Skipped", count: summary.skipped },
            CountRow { metric: "Errors", count: summary.errors },
        ])
    );

    Ok(summary.has_errors())
}
