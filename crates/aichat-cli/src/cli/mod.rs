//! CLI entry and dispatch.

use std::path::PathBuf;

use aichat_core::client::ApiClient;
use aichat_core::config;
use aichat_core::error::ClientError;
use aichat_core::providers::Provider;
use aichat_core::{interrupt, logging};
use anyhow::{Context, Result};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "aichat")]
#[command(version = "0.1")]
#[command(about = "Terminal client for the AI chat-bot backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides config)
    #[arg(long, global = true, env = "AICHAT_BASE_URL", value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Submit code for review
    Review {
        /// Code to review
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,

        /// Read the code from a file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Language tag sent with the code (default from config)
        #[arg(long)]
        language: Option<String>,

        /// Provider to use (default from config)
        #[arg(long)]
        provider: Option<Provider>,

        /// Business requirements the code must satisfy
        #[arg(long)]
        requirements: Option<String>,

        /// Also write the review as an HTML page
        #[arg(long, value_name = "PATH")]
        html: Option<PathBuf>,

        /// Review the backend's sample code when no code is given
        #[arg(long)]
        use_placeholder: bool,
    },

    /// Chat with the model (interactive unless --message is given)
    Chat {
        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,

        /// Provider to use (default from config)
        #[arg(long)]
        provider: Option<Provider>,

        /// Continue an existing conversation
        #[arg(long, value_name = "ID")]
        conversation_id: Option<String>,

        /// Wait for the full response instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Analyze a support ticket
    Ticket {
        /// Ticket text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the ticket from a file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Provider to use (default from config)
        #[arg(long)]
        provider: Option<Provider>,
    },

    /// List supported providers
    Providers,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
    /// Set the default provider
    Provider {
        /// Provider id (openai, gemini, ollama, groq, cohere, mistral)
        #[arg(value_name = "ID")]
        id: Provider,
    },
}

/// Returns the validation error inside `err`, if that is what it is.
pub fn validation_error(err: &anyhow::Error) -> Option<&ClientError> {
    err.downcast_ref::<ClientError>()
        .filter(|client_err| client_err.is_validation())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    let result = rt.block_on(async move { dispatch(cli).await });
    // A pending stdin read in the chat loop must not hold up exit.
    rt.shutdown_background();
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.logging).context("init logging")?;

    let Cli { command, base_url } = cli;
    tracing::debug!(
        base_url = base_url.as_deref().unwrap_or(config.base_url.as_str()),
        "dispatching command"
    );
    let client = || ApiClient::from_config(&config, base_url.as_deref());

    match command {
        Commands::Review {
            code,
            file,
            language,
            provider,
            requirements,
            html,
            use_placeholder,
        } => {
            commands::review::run(
                &client()?,
                commands::review::ReviewRunOptions {
                    code,
                    file: file.as_deref(),
                    language: language.unwrap_or_else(|| config.language.clone()),
                    provider: provider.unwrap_or(config.provider),
                    requirements,
                    html: html.as_deref(),
                    use_placeholder,
                },
            )
            .await
        }

        Commands::Chat {
            message,
            provider,
            conversation_id,
            no_stream,
        } => {
            commands::chat::run(
                &client()?,
                commands::chat::ChatRunOptions {
                    message,
                    provider: provider.unwrap_or(config.provider),
                    conversation_id: conversation_id.unwrap_or_default(),
                    no_stream,
                    stream: (&config.stream).into(),
                },
            )
            .await
        }

        Commands::Ticket {
            text,
            file,
            provider,
        } => {
            let text = commands::read_input(text, file.as_deref())?;
            commands::ticket::run(&client()?, provider.unwrap_or(config.provider), &text).await
        }

        Commands::Providers => {
            commands::providers::list(config.provider);
            Ok(())
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::Provider { id } => commands::config::set_provider(id),
        },
    }
}
