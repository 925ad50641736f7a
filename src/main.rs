use clap::Parser;
use wpmaint::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match tokio::task::spawn_blocking(move || wpmaint::app::run_cli(cli)).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("wpmaint: maintenance task failed: {}", err);
            1
        }
    };
    std::process::exit(code);
}
