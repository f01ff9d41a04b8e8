mod cmd;

use clap::Parser;
use cmd::config::{Cli, Effective};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout with status 0
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .init();

    let eff = match Effective::new(&cli) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("% ERROR: {e}");
            std::process::exit(1);
        }
    };

    match cmd::run(eff).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("% ERROR: {e}");
            std::process::exit(1);
        }
    }
}
