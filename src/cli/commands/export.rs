//! `mdxsync export` - translation export.

use crate::cms::RealCms;
use crate::config::Config;
use crate::content_type::find;
use crate::sync::{ExportOptions, export_translations};

use super::{CountRow, counts_table};
use crate::cli::error::CliError;

pub async fn run(
    config: &Config,
    content_type: &str,
    opts: ExportOptions,
) -> miette::Result<bool> {
    let spec = find(content_type)
        .ok_or_else(|| CliError::UnknownType(content_type.to_string()))?;

    if opts.dry_run {
        println!("Dry-run mode - no files will be written\n");
    }

    let cms = RealCms::new(config);
    let summary = export_translations(&cms, config, spec, &opts).await?;

    let icon = if summary.has_errors() { "⚠" } else { "✓" };
    println!(
        "{} Export complete: {} files under {}\n",
        icon,
        summary.exported,
        config.translations_dir.display()
    );
    println!(
        "{}",
        counts_table(vec![
            CountRow { metric: "Exported", count: summary.exported },
            CountRow { metric: "Skipped", count: summary.skipped },
            CountRow { metric: "Errors", count: summary.errors },
        ])
    );

    Ok(summary.has_errors())
}
