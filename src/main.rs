use clap::Parser;
use log::error;
use meteodash::{error_chain, serve, Locale, ServerConfig, DEFAULT_API_URL};
use std::net::SocketAddr;
use std::process::ExitCode;

/// Serves the temperature analysis dashboard.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Current-conditions endpoint of the weather provider.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Language of the page: `ru` or `en`.
    #[arg(long, default_value = "ru")]
    locale: Locale,

    /// Largest accepted CSV upload, in MiB.
    #[arg(long, default_value_t = 64)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ServerConfig::builder()
        .bind(args.bind)
        .api_url(args.api_url)
        .locale(args.locale)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024))
        .build();

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}
