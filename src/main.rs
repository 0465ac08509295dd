use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::ReplayArgs;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("patchboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "server")]
#[tokio::main]
async fn main() {
    init_tracing();
    let args = ReplayArgs::parse();
    if let Err(err) = cli::run_replay_or_edit(args).await {
        eprintln!("\u{001b}[31merror:\u{001b}[0m {err:?}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
fn main() {
    init_tracing();
    let args = ReplayArgs::parse();
    if let Err(err) = cli::run_replay_or_edit_sync(args) {
        eprintln!("\u{001b}[31merror:\u{001b}[0m {err:?}");
        std::process::exit(1);
    }
}
