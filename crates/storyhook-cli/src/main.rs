mod cmd;

use clap::{Parser, Subcommand};
use cmd::settings::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "storyhook",
    about = "Tick story checklists when linked GitHub issues close",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML config file (flags and environment variables override it)
    #[arg(long, global = true, env = "STORYHOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        #[command(flatten)]
        settings: Settings,

        /// Port to listen on
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Path the webhook is served on
        #[arg(long)]
        path: Option<String>,

        /// Public URL of this server; install it as a webhook on every
        /// repository of the story repository's owner before serving
        #[arg(long, value_name = "URL")]
        install_webhook: Option<String>,
    },

    /// Install the issues webhook on every repository of an organization
    Install {
        #[command(flatten)]
        settings: Settings,

        /// Organization to install into (default: owner of the story repository)
        #[arg(long)]
        org: Option<String>,

        /// Public URL GitHub should deliver events to
        #[arg(long, value_name = "URL")]
        webhook_url: String,
    },

    /// Print the story an issue body (read from stdin) refers to
    Resolve {
        /// Story repository, owner/name
        #[arg(long, env = "STORY_REPO")]
        story_repo: String,

        /// REST API base used to render the story locator
        #[arg(long, env = "GITHUB_API_BASE", default_value = "https://api.github.com")]
        api_base: String,
    },

    /// Tick the checklist line for a work issue in a story body read from stdin
    Tick {
        /// Owner of the work repository
        #[arg(long)]
        owner: String,

        /// Name of the work repository
        #[arg(long)]
        repo: String,

        /// Work issue number
        #[arg(long)]
        number: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Install { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve {
            settings,
            port,
            path,
            install_webhook,
        } => cmd::serve::run(
            config_path,
            &settings,
            port,
            path,
            install_webhook.as_deref(),
        ),
        Commands::Install {
            settings,
            org,
            webhook_url,
        } => cmd::install::run(
            config_path,
            &settings,
            org.as_deref(),
            &webhook_url,
            cli.json,
        ),
        Commands::Resolve {
            story_repo,
            api_base,
        } => cmd::resolve::run(&story_repo, &api_base, cli.json),
        Commands::Tick {
            owner,
            repo,
            number,
        } => cmd::tick::run(&owner, &repo, number, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
