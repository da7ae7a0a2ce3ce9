use clap::{CommandFactory, Parser, Subcommand};
use competency_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "competency", version, about = "Competency assessment CLI")]
struct Cli {
    /// User id to act as
    #[arg(long = "as", global = true, default_value = "system")]
    as_user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reference catalog: competencies, positions, departments
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// User profiles and roles
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Assessment cycles
    Cycle {
        #[command(subcommand)]
        action: commands::cycle::CycleAction,
    },
    /// Assessments and ratings
    Assess {
        #[command(subcommand)]
        action: commands::assess::AssessAction,
    },
    /// Gap analysis of an assessment
    Gap(commands::gap::GapArgs),
    /// Development plans
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Individual, department and completion reports
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let default_level = Config::load_or_default().logging.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let as_user = cli.as_user;
    let result = match cli.command {
        Commands::Catalog { action } => commands::catalog::run(&as_user, action),
        Commands::User { action } => commands::user::run(&as_user, action),
        Commands::Cycle { action } => commands::cycle::run(&as_user, action),
        Commands::Assess { action } => commands::assess::run(&as_user, action),
        Commands::Gap(args) => commands::gap::run(&as_user, args),
        Commands::Plan { action } => commands::plan::run(&as_user, action),
        Commands::Report { action } => commands::report::run(&as_user, action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "competency", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
