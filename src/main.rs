use basis_arb::cli::{ArbCliConfig, Cli, Commands};
use basis_arb::commands::{run_arbitrage, run_spread_check};
use basis_arb::observability::init_tracing;
use clap::Parser;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file before clap reads them
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.verbose)?;

    match cli.command {
        Commands::Run { market, strategy, paper } => {
            run_arbitrage(ArbCliConfig::new(market, strategy), paper).await?;
        }
        Commands::Spread { market, threshold_bps } => {
            run_spread_check(market, threshold_bps).await?;
        }
    }

    Ok(())
}
