use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xfx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xfx::AppCommand {
    fn from(cmd: Commands) -> xfx::AppCommand {
        match cmd {
            Commands::Rate { code } => xfx::AppCommand::Rate { code },
            Commands::History { code, days } => xfx::AppCommand::History { code, days },
            Commands::Currencies => xfx::AppCommand::Currencies,
            Commands::Queries { count } => xfx::AppCommand::Queries { count },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the current exchange rate of a currency in PLN
    Rate {
        /// Three-letter currency code, e.g. EUR
        code: String,
    },
    /// Show the exchange rate history of a currency
    History {
        /// Three-letter currency code, e.g. USD
        code: String,
        /// Number of days to look back (1-30)
        #[arg(short, long, default_value_t = 7, allow_negative_numbers = true)]
        days: i64,
    },
    /// List known currencies
    Currencies,
    /// Show the most recent rate queries
    Queries {
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xfx::cli::setup::setup(),
        Some(cmd) => xfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
