use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use starfold::cli::commands::{self, ForecastOptions, MilintOptions, TurnSelector};
use starfold::config::AnalysisConfig;

#[derive(Parser)]
#[command(name = "starfold")]
#[command(about = "Turn analysis for planets.nu games: minefields, sectors and colony economics")]
#[command(version)]
struct Cli {
    /// Path to the configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct TurnArgs {
    /// Player whose view to use (default: lowest player id)
    #[arg(short, long)]
    player: Option<u32>,

    /// Turn number (default: the player's latest)
    #[arg(short, long)]
    turn: Option<u32>,
}

impl From<TurnArgs> for TurnSelector {
    fn from(args: TurnArgs) -> Self {
        TurnSelector {
            player: args.player,
            turn: args.turn,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct minefields from game messages
    Minefields {
        /// Turn to display (default: latest)
        #[arg(short, long)]
        turn: Option<u32>,

        /// Save the reconstructed timeline as a snapshot
        #[arg(long)]
        save: bool,

        /// Write a starmap drawing layer to this file
        #[arg(long)]
        overlay: Option<String>,
    },

    /// Show jump-connected sectors and starbase catchment
    Sectors {
        #[command(flatten)]
        turn: TurnArgs,

        /// Write a starmap drawing layer to this file
        #[arg(long)]
        overlay: Option<String>,
    },

    /// Economy table of owned planets with cargo in orbit
    Econ {
        #[command(flatten)]
        turn: TurnArgs,
    },

    /// Forecast one colony over the coming turns
    Colony {
        /// Planet id
        planet: u32,

        #[command(flatten)]
        turn: TurnArgs,

        /// Turns to project (default from config)
        #[arg(short = 'n', long)]
        turns: Option<usize>,

        /// Happiness bonus from ships on a hiss mission
        #[arg(long, default_value_t = 0)]
        hiss: i32,

        /// Planet sits in a nebula
        #[arg(long)]
        nebula: bool,

        /// Native auto-tax policy: Growth, Growth+, "Flat 70" or "Flat 40"
        #[arg(long)]
        policy: Option<String>,
    },

    /// Sightings of another player's freighters
    Freighters {
        /// Player whose freighters to list
        target: u32,

        /// Player whose turns to search (default: lowest player id)
        #[arg(short, long)]
        player: Option<u32>,

        /// Write a starmap drawing layer to this file
        #[arg(long)]
        overlay: Option<String>,
    },

    /// Latest sightings of an enemy's ships near a point
    Milint {
        /// Player whose ships to report
        target: u32,

        /// Centre of the search area
        x: i32,
        y: i32,

        /// Search radius in light years
        #[arg(short, long, default_value_t = 200.0)]
        radius: f64,

        /// Ignore turns before this one
        #[arg(long, default_value_t = 1)]
        from_turn: u32,

        /// Player whose turns to search (default: lowest player id)
        #[arg(short, long)]
        player: Option<u32>,

        /// Write a starmap drawing layer to this file
        #[arg(long)]
        overlay: Option<String>,
    },

    /// List saved minefield snapshots
    Snapshots,
}

fn load_config(path: &str) -> AnalysisConfig {
    let path = Path::new(path);
    if !path.exists() {
        return AnalysisConfig::default();
    }
    match AnalysisConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(config: &AnalysisConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    init_logging(&config);

    let result = match cli.command {
        Commands::Minefields {
            turn,
            save,
            overlay,
        } => commands::minefields(&config, turn, save, overlay.as_deref()),
        Commands::Sectors { turn, overlay } => {
            commands::sectors(&config, turn.into(), overlay.as_deref())
        }
        Commands::Econ { turn } => commands::econ(&config, turn.into()),
        Commands::Colony {
            planet,
            turn,
            turns,
            hiss,
            nebula,
            policy,
        } => {
            let options = ForecastOptions {
                turns,
                hiss_effect: hiss,
                nebula_bonus: nebula,
                policy,
            };
            commands::colony(&config, turn.into(), planet, &options)
        }
        Commands::Freighters {
            target,
            player,
            overlay,
        } => commands::freighters(&config, player, target, overlay.as_deref()),
        Commands::Milint {
            target,
            x,
            y,
            radius,
            from_turn,
            player,
            overlay,
        } => {
            let options = MilintOptions {
                viewer: player,
                target,
                from_turn,
                x,
                y,
                radius,
            };
            commands::milint(&config, options, overlay.as_deref())
        }
        Commands::Snapshots => commands::list_snapshots(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
