use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use assistants_core::logging::{file_logger, SharedLogger};
use assistants_core::{
    resolve_config, ConfigProvider, ConsoleLogger, EnvSecretStore, FanoutLogger,
    FileConfigProvider, FileLogger, Logger, MemoryConfigProvider, SessionConfig, SessionIssuer,
    SessionSettings,
};

mod simulate;
mod tools;

/// Voice assistant tool session demo
#[derive(Parser, Debug)]
#[command(name = "assistants-demo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Workspace root holding .config/assistants/config.yaml
    #[arg(short = 'w', long = "workspace", value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Request session credentials for an assistant
    Connect {
        /// Assistant to join (defaults to assistant_id from config)
        #[arg(short = 'a', long = "assistant-id")]
        assistant_id: Option<String>,

        /// Name shown to the agent
        #[arg(short = 'n', long = "name")]
        participant_name: Option<String>,

        /// Use the private endpoint with UPLIFTAI_API_KEY
        #[arg(long)]
        private: bool,
    },

    /// Run a scripted agent against an in-memory room
    Simulate {
        /// Instructions to send once the agent is present
        #[arg(short = 'i', long = "instructions")]
        instructions: Option<String>,
    },
}

async fn load_config(cli: &Cli, overrides: SessionSettings) -> Result<SessionConfig, Box<dyn Error>> {
    let user = FileConfigProvider::user();
    let workspace = FileConfigProvider::workspace(match &cli.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    });
    let flags = MemoryConfigProvider::with_settings(overrides);

    // Later layers win
    let layers: [&dyn ConfigProvider; 3] = [&user, &workspace, &flags];
    Ok(resolve_config(&layers).await?)
}

async fn connect(
    config: &SessionConfig,
    logger: SharedLogger,
    private: bool,
) -> Result<(), Box<dyn Error>> {
    let assistant_id = config
        .assistant_id
        .clone()
        .ok_or("No assistant ID given; pass --assistant-id or set assistant_id in config")?;

    let issuer = SessionIssuer::from_config(config)
        .with_secret_store(Arc::new(EnvSecretStore::new()))
        .with_logger(logger);

    let result = if private {
        issuer.create_session(&assistant_id, &config.participant_name).await
    } else {
        issuer
            .create_public_session(&assistant_id, &config.participant_name)
            .await
    };

    match result {
        Ok(credentials) => {
            println!("token: {}", credentials.token);
            println!("wsUrl: {}", credentials.ws_url);
            Ok(())
        }
        Err(e) => Err(e.user_message().into()),
    }
}

/// Console output, mirrored to the debug log file when ASSISTANTS_DEBUG is set
fn build_logger(verbose: bool) -> SharedLogger {
    let console: SharedLogger = Arc::new(ConsoleLogger::with_prefix("[Demo]").verbose(verbose));
    if !file_logger::is_enabled() {
        return console;
    }

    let logger = FanoutLogger::new()
        .with(console)
        .with(Arc::new(FileLogger::new("demo")));
    logger.debug(&format!(
        "[Demo] Debug log at {}",
        file_logger::log_file_path().display()
    ));
    Arc::new(logger)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = build_logger(cli.verbose);

    let overrides = match &cli.command {
        Commands::Connect {
            assistant_id,
            participant_name,
            ..
        } => SessionSettings {
            assistant_id: assistant_id.clone(),
            participant_name: participant_name.clone(),
            ..SessionSettings::default()
        },
        Commands::Simulate { .. } => SessionSettings::default(),
    };

    let outcome = match load_config(&cli, overrides).await {
        Ok(config) => match cli.command {
            Commands::Connect { private, .. } => connect(&config, logger, private).await,
            Commands::Simulate { instructions } => simulate::run(&config, logger, instructions).await,
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
