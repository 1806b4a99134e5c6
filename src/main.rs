use quizgen::config::Config;
use quizgen::gateway::{self, GatewayState};
use quizgen::quiz::{LevelCounts, QuizConfig, QuizDistribution, QuizService};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// quizgen - chat-completion gateway and math quiz generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config directory (contains quizgen.toml)
    #[arg(long, short = 'c', default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the forwarding gateway
    Serve {
        /// Override the listen address from the config
        #[arg(long)]
        listen: Option<String>,
    },

    /// Generate a quiz and print the questions as JSON
    Quiz {
        /// Quiz topic
        #[arg(long, short = 't')]
        topic: String,

        /// Single-choice counts as BIET,HIEU,VANDUNG
        #[arg(long, default_value = "0,0,0", value_parser = parse_counts)]
        tn: LevelCounts,

        /// Numeric-answer counts as BIET,HIEU,VANDUNG
        #[arg(long, default_value = "0,0,0", value_parser = parse_counts)]
        tln: LevelCounts,

        /// True/false-set counts as BIET,HIEU,VANDUNG
        #[arg(long, default_value = "0,0,0", value_parser = parse_counts)]
        ds: LevelCounts,

        /// Extra instructions for the model
        #[arg(long)]
        extra: Option<String>,

        #[arg(long)]
        api_key: Option<String>,
    },

    /// Generate a theory summary for a topic
    Theory {
        #[arg(long, short = 't')]
        topic: String,

        #[arg(long)]
        api_key: Option<String>,
    },

    /// Check whether an API key is accepted
    TestKey {
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::discover(&args.config_dir)?;

    // RUST_LOG wins, then the config file, then a per-command default
    let default_level = match args.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.as_deref().unwrap_or(default_level))
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Serve { listen } => serve_command(config, listen).await,
        Commands::Quiz {
            topic,
            tn,
            tln,
            ds,
            extra,
            api_key,
        } => {
            let quiz = QuizConfig {
                topic,
                distribution: QuizDistribution {
                    single_choice: tn,
                    numeric_answer: tln,
                    true_false_set: ds,
                },
                additional_prompt: extra,
            };
            quiz_command(config, quiz, api_key).await
        }
        Commands::Theory { topic, api_key } => theory_command(config, topic, api_key).await,
        Commands::TestKey { api_key } => test_key_command(config, api_key).await,
    }
}

async fn serve_command(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(listen) = listen {
        config.gateway.listen = listen;
    }
    let addr = config.gateway.listen_addr()?;

    let state = GatewayState::new(&config)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    gateway::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await
}

async fn quiz_command(config: Config, quiz: QuizConfig, api_key: Option<String>) -> Result<()> {
    let api_key = resolve_api_key(&config, api_key);
    let service = QuizService::from_config(&config)?;

    let questions = service
        .generate_quiz(&quiz, &api_key)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", serde_json::to_string_pretty(&questions)?);
    Ok(())
}

async fn theory_command(config: Config, topic: String, api_key: Option<String>) -> Result<()> {
    let api_key = resolve_api_key(&config, api_key);
    let service = QuizService::from_config(&config)?;

    let text = service
        .generate_theory(&topic, &api_key)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", text);
    Ok(())
}

async fn test_key_command(config: Config, api_key: Option<String>) -> Result<()> {
    let api_key = resolve_api_key(&config, api_key);
    let service = QuizService::from_config(&config)?;

    if service.test_api_key(&api_key).await {
        println!("API key accepted");
        Ok(())
    } else {
        anyhow::bail!("API key rejected or gateway unreachable")
    }
}

/// CLI flag, then config, then DEEPSEEK_API_KEY
fn resolve_api_key(config: &Config, flag: Option<String>) -> String {
    flag.or_else(|| config.get_api_key()).unwrap_or_default()
}

fn parse_counts(value: &str) -> std::result::Result<LevelCounts, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid count in {:?}: {}", value, e))?;

    match parts.as_slice() {
        [biet, hieu, van_dung] => Ok(LevelCounts::new(*biet, *hieu, *van_dung)),
        _ => Err(format!(
            "expected three counts BIET,HIEU,VANDUNG, got {:?}",
            value
        )),
    }
}
