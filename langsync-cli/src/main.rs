use clap::{ArgAction, Parser, Subcommand};
use langsync_cli::{
    config::Config,
    edit::{EditOptions, run_add_command, run_remove_command},
    status::{StatusOptions, run_status_command},
    sync::{SyncOptions, run_sync_command},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ./langsync.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate pending entries of every locale and update their status markers.
    Sync {
        /// Directory holding one sub-directory per locale
        #[arg(short, long)]
        dir: Option<String>,

        /// Reference locale (default: en-US)
        #[arg(short, long)]
        reference: Option<String>,

        /// Only process these locales (comma separated or repeated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Translation endpoint (LibreTranslate compatible)
        #[arg(long, env = "LANGSYNC_ENDPOINT")]
        endpoint: Option<String>,

        /// API key sent with every translation request
        #[arg(long, env = "LANGSYNC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Run against an in-memory copy and write nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the translation status of every locale.
    Status {
        /// Directory holding one sub-directory per locale
        #[arg(short, long)]
        dir: Option<String>,

        /// Reference locale (default: en-US)
        #[arg(short, long)]
        reference: Option<String>,

        /// Number of locales listed per ranking
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an entry to every locale (complete in the reference, incomplete elsewhere).
    Add {
        /// Entry key, e.g. StopButton.Content
        key: String,

        /// Entry value in the reference language
        value: String,

        /// Directory holding one sub-directory per locale
        #[arg(short, long)]
        dir: Option<String>,

        /// Reference locale (default: en-US)
        #[arg(short, long)]
        reference: Option<String>,
    },

    /// Remove an entry from every locale.
    Remove {
        /// Entry key, e.g. StopButton.Content
        key: String,

        /// Directory holding one sub-directory per locale
        #[arg(short, long)]
        dir: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("langsync={0},langsync_cli={0},warn", default_level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = Config::discover(args.config.as_deref()).and_then(|config| match args.commands {
        Commands::Sync {
            dir,
            reference,
            only,
            endpoint,
            api_key,
            dry_run,
            json,
        } => run_sync_command(
            SyncOptions {
                strings_dir: dir,
                reference,
                only,
                endpoint,
                api_key,
                dry_run,
                json,
            },
            &config,
        ),
        Commands::Status {
            dir,
            reference,
            top,
            json,
        } => run_status_command(
            StatusOptions {
                strings_dir: dir,
                reference,
                top,
                json,
            },
            &config,
        ),
        Commands::Add {
            key,
            value,
            dir,
            reference,
        } => run_add_command(
            EditOptions {
                strings_dir: dir,
                reference,
                key,
            },
            &value,
            &config,
        ),
        Commands::Remove { key, dir } => run_remove_command(
            EditOptions {
                strings_dir: dir,
                reference: None,
                key,
            },
            &config,
        ),
    });

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
