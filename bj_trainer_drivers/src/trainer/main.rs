mod interactive;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use bj_trainer::Trainer;
use bj_trainer_drivers::load_config;
use clap::Parser;

use self::interactive::Session;

/// Practice basic strategy hand by hand in the terminal.
#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file. Defaults to ~/.bj_trainer.yml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible shuffles, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Pause in milliseconds before the dealer's cards are shown
    #[arg(long)]
    delay: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: CommandLineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let rules = config.rules()?;
    let seed = args.seed.or(config.trainer.seed);
    let delay = Duration::from_millis(args.delay.unwrap_or(config.trainer.reveal_delay_ms));

    let mut trainer = match seed {
        Some(seed) => Trainer::with_seed(seed),
        None => Trainer::new(),
    };
    trainer.configure(rules)?;

    let stdin = io::stdin();
    let mut session = Session::new(trainer, stdin.lock(), io::stdout(), delay);
    session.run()
}
