use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cheatmeter", version, about = "Cheat Meter weight-loss tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Journey management
    Journey {
        #[command(subcommand)]
        action: commands::journey::JourneyAction,
    },
    /// Weight log
    Weight {
        #[command(subcommand)]
        action: commands::weight::WeightAction,
    },
    /// Earned cheat meals and free days
    Reward {
        #[command(subcommand)]
        action: commands::reward::RewardAction,
    },
    /// Off-plan eating log
    Slip {
        #[command(subcommand)]
        action: commands::slip::SlipAction,
    },
    /// Cheat-meal recipe catalog
    Recipe {
        #[command(subcommand)]
        action: commands::recipe::RecipeAction,
    },
    /// Body measurements
    Measure {
        #[command(subcommand)]
        action: commands::measure::MeasureAction,
    },
    /// Badges
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Progress statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHEATMETER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Journey { action } => commands::journey::run(action),
        Commands::Weight { action } => commands::weight::run(action),
        Commands::Reward { action } => commands::reward::run(action),
        Commands::Slip { action } => commands::slip::run(action),
        Commands::Recipe { action } => commands::recipe::run(action),
        Commands::Measure { action } => commands::measure::run(action),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "cheatmeter", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
