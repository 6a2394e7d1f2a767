use clap::Parser;

use liquidity_simulation::{create_example_config, ScenarioConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "liquidity-sim")]
#[command(about = "Replay a batch-auction liquidity scenario block by block")]
struct Args {
    /// Path to the scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    scenario: String,

    /// Write an example scenario to this path and exit
    #[arg(long)]
    init: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if let Some(path) = args.init {
        create_example_config(&path)?;
        log::info!("Wrote example scenario to {}", path);
        return Ok(());
    }

    let config = ScenarioConfig::load(&args.scenario)?;
    log::info!("Loaded scenario '{}' from {}", config.name, args.scenario);

    let mut runner = ScenarioRunner::new(config)?;
    let summary = runner.run()?;

    let state = runner.final_state()?;
    println!("{}", serde_json::to_string_pretty(&state)?);

    if !summary.pools_halted.is_empty() {
        anyhow::bail!("{} pools halted during the run", summary.pools_halted.len());
    }
    Ok(())
}
