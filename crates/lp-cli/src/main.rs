//! CLI frontend for the Lifepath table engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use lp_mechanics::RollMode;
use tracing_subscriber::EnvFilter;

use commands::resolve::ResolveArgs;

#[derive(Parser)]
#[command(
    name = "lifepath",
    about = "Lifepath: table-driven character background generation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log every resolution step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll dice, e.g. `d20` or `3d6`
    Roll {
        /// Dice notation
        dice: String,

        /// Roll twice and keep the higher result
        #[arg(long, conflicts_with = "disadvantage")]
        advantage: bool,

        /// Roll twice and keep the lower result
        #[arg(long)]
        disadvantage: bool,

        /// Named modifier, e.g. `--mod cuMod=2` (repeatable)
        #[arg(short = 'm', long = "mod", value_parser = commands::parse_modifier)]
        modifiers: Vec<(String, i32)>,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Validate a table file and summarize its tables
    Check {
        /// JSON table file
        file: PathBuf,
    },

    /// List the tables in a table file
    List {
        /// JSON table file
        file: PathBuf,

        /// Only tables of this category (e.g. race, youth)
        #[arg(short, long)]
        category: Option<String>,

        /// Only tables available to this subject (JSON file)
        #[arg(long)]
        subject: Option<PathBuf>,
    },

    /// Resolve a table against a subject
    Resolve(ResolveArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Roll {
            dice,
            advantage,
            disadvantage,
            modifiers,
            seed,
        } => {
            let mode = if advantage {
                RollMode::Advantage
            } else if disadvantage {
                RollMode::Disadvantage
            } else {
                RollMode::Normal
            };
            commands::roll::run(&dice, mode, &modifiers, seed)
        }
        Commands::Check { file } => commands::check::run(&file),
        Commands::List {
            file,
            category,
            subject,
        } => commands::list::run(&file, category.as_deref(), subject.as_deref()),
        Commands::Resolve(args) => commands::resolve::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
