use std::process::ExitCode;

use bitacora::{Articles, Blog, Config, FsStorage, Server};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(&config.log_filter);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bitacora failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), bitacora::Error> {
    let storage = FsStorage::open(&config.articles_dir).await?;
    info!(dir = %storage.dir().display(), "articles directory ready");

    let blog = Blog::new(Articles::new(storage), config.admin_password);
    Server::bind(config.addr).serve(blog.into_router()).await
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("invalid log filter `{filter}` ({e}); falling back to `info`");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
