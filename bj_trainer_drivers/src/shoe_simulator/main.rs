mod simulation;

use std::error::Error;
use std::path::PathBuf;

use bj_trainer::Trainer;
use bj_trainer_drivers::load_config;
use clap::Parser;

use self::simulation::ShoeReporter;

/// Plays whole shoes with perfect basic strategy and reports how every
/// betting system fared.
#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file. Defaults to ~/.bj_trainer.yml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of shoes to play, overriding the config file
    #[arg(short, long)]
    shoes: Option<u32>,

    /// Seed for reproducible shuffles, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Print every round
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: CommandLineArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let rules = config.rules()?;
    let shoes = args.shoes.unwrap_or(config.shoe_simulator.shoes).max(1);
    let seed = args.seed.or(config.shoe_simulator.seed);
    log::info!("simulating {} shoe(s) with {:?}", shoes, rules);

    let mut trainer = match seed {
        Some(seed) => Trainer::with_seed(seed),
        None => Trainer::new(),
    };
    trainer.configure(rules)?;

    let mut reporter = ShoeReporter::new(args.verbose);
    for shoe in 0..shoes {
        // Later shoes keep the bankrolls of earlier ones.
        let handle = if shoe == 0 {
            trainer.start_shoe()?
        } else {
            trainer.reshuffle()?
        };
        reporter.replay(&handle.opening);
        trainer.run_shoe_with_handler(&mut reporter)?;
    }

    print!("{}", serde_yaml::to_string(&reporter.report())?);
    Ok(())
}
