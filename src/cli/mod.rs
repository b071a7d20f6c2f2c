mod commands;
pub mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::sync::{ExportOptions, ImportOptions};

#[derive(Parser)]
#[command(name = "mdxsync")]
#[command(author, version, about = "MDX / CMS content synchronization", long_about = None)]
pub struct Cli {
    /// Override the CMS URL (default: MDXSYNC_CMS_URL env or http://localhost:1337)
    #[arg(long, global = true)]
    pub cms_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile MDX files on disk with the CMS
    Sync {
        /// Preview changes without mutating anything
        #[arg(long)]
        dry_run: bool,
        /// Content type to sync (default: all)
        #[arg(long = "type")]
        content_type: Option<String>,
    },
    /// Export published records as translation templates
    Export {
        /// Preview without writing files
        #[arg(long)]
        dry_run: bool,
        /// Content type to export
        #[arg(long = "type", default_value = "blog")]
        content_type: String,
        /// Process only the first N records
        #[arg(long)]
        limit: Option<usize>,
        /// Only records published on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// Only these record ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
        /// Only these slugs (comma-separated)
        #[arg(long, value_delimiter = ',')]
        slugs: Vec<String>,
        /// Export all locales even when a translation exists
        #[arg(long)]
        force: bool,
    },
    /// Import translated MDX files into the CMS
    Import {
        /// Preview without creating records
        #[arg(long)]
        dry_run: bool,
        /// Content type to import
        #[arg(long = "type", default_value = "blog")]
        content_type: String,
        /// Process only the first N files
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdxsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Parse arguments and run the selected command.
///
/// Returns the process exit code: 1 when any per-record error occurred so
/// cron/CI can flag runs that need attention, 0 otherwise.
pub async fn run() -> miette::Result<i32> {
    init_tracing();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let config = Config::from_env(cli.cms_url);

    let had_errors = match cli.command {
        Commands::Sync {
            dry_run,
            content_type,
        } => commands::sync::run(&config, dry_run, content_type.as_deref()).await?,
        Commands::Export {
            dry_run,
            content_type,
            limit,
            since,
            ids,
            slugs,
            force,
        } => {
            let opts = ExportOptions {
                limit,
                since,
                ids,
                slugs,
                force,
                dry_run,
            };
            commands::export::run(&config, &content_type, opts).await?
        }
        Commands::Import {
            dry_run,
            content_type,
            limit,
        } => {
            let opts = ImportOptions { dry_run, limit };
            commands::import::run(&config, &content_type, opts).await?
        }
    };

    Ok(if had_errors { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_flags() {
        let cli = Cli::parse_from(["mdxsync", "sync", "--dry-run", "--type", "blog"]);
        match cli.command {
            Commands::Sync {
                dry_run,
                content_type,
            } => {
                assert!(dry_run);
                assert_eq!(content_type.as_deref(), Some("blog"));
            }
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn test_export_csv_flags() {
        let cli = Cli::parse_from([
            "mdxsync", "export", "--ids", "1,2,3", "--slugs", "a,b", "--since", "2024-01-01",
            "--limit", "5", "--force",
        ]);
        match cli.command {
            Commands::Export {
                ids, slugs, since, limit, force, ..
            } => {
                assert_eq!(ids, vec![1, 2, 3]);
                assert_eq!(slugs, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(since.as_deref(), Some("2024-01-01"));
                assert_eq!(limit, Some(5));
                assert!(force);
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_global_cms_url_flag() {
        let cli = Cli::parse_from(["mdxsync", "sync", "--cms-url", "http://cms:1337"]);
        assert_eq!(cli.cms_url.as_deref(), Some("http://cms:1337"));
    }
}
