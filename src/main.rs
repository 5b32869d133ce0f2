use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = covsmith::cli::Cli::parse();

    if let Err(e) = covsmith::cli::run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
