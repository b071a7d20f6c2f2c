use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let code = mdxsync::cli::run().await?;
    std::process::exit(code);
}
