use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Unknown content type: {0}")]
    #[diagnostic(
        code(mdxsync::cli::unknown_type),
        help("Known content types: blog, events, press")
    )]
    UnknownType(String),
}
