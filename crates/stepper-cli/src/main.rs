mod cmd;
mod output;
mod root;
mod session;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use session::Target;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stepper",
    about = "Step-gated wizard sessions: report progress, save payloads, navigate",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .stepper/ or .git/)
    #[arg(long, global = true, env = "STEPPER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Wizard to drive (default: `default_wizard` from config)
    #[arg(long, short = 'w', global = true, env = "STEPPER_WIZARD")]
    wizard: Option<String>,

    /// Session key
    #[arg(
        long,
        short = 's',
        global = true,
        env = "STEPPER_SESSION",
        default_value = "default"
    )]
    session: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .stepper/ and a config with the built-in wizards
    Init,

    /// List the steps of a wizard
    Steps,

    /// Show the session: active step, percents, reachable steps
    Status,

    /// Report completion for the active step
    Report {
        /// Percent complete; clamped into 0..=100
        #[arg(allow_negative_numbers = true)]
        percent: i64,
        /// Report for one section of a composite step
        #[arg(long)]
        section: Option<String>,
    },

    /// Save the payload of the active step
    Save {
        /// Inline JSON payload
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        data: Option<String>,
        /// Read the payload from a JSON or YAML file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show progress and payload of a step (default: the active step)
    Show { step: Option<String> },

    /// Navigate to a step, subject to gating
    Goto { step: String },

    /// Advance to the next step
    Next,

    /// Go back one step
    Back,

    /// Delete the stored session
    Reset,

    /// List stored sessions of the wizard
    Sessions,

    /// Inspect and validate .stepper/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let target = Target {
        wizard: cli.wizard.as_deref(),
        session: &cli.session,
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Steps => cmd::steps::run(&root, &target, cli.json),
        Commands::Status => cmd::status::run(&root, &target, cli.json),
        Commands::Report { percent, section } => {
            cmd::report::run(&root, &target, percent, section.as_deref(), cli.json)
        }
        Commands::Save { data, file } => {
            cmd::save::run(&root, &target, data.as_deref(), file.as_deref(), cli.json)
        }
        Commands::Show { step } => cmd::show::run(&root, &target, step.as_deref(), cli.json),
        Commands::Goto { step } => cmd::nav::goto(&root, &target, &step, cli.json),
        Commands::Next => cmd::nav::next(&root, &target, cli.json),
        Commands::Back => cmd::nav::back(&root, &target, cli.json),
        Commands::Reset => cmd::reset::run(&root, &target, cli.json),
        Commands::Sessions => cmd::reset::list(&root, &target, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        let code = if e.downcast_ref::<cmd::nav::NavigationDenied>().is_some() {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}
