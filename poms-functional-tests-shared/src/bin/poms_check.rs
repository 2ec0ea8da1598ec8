use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poms_testutils::config::{Config, Env, Prefix};
use poms_testutils::letterbox::LetterBoxClient;
use poms_testutils::media::ProgramUpdate;
use poms_testutils::wait::{Check, Waiter};
use poms_testutils::MediaBackendClient;

#[derive(Parser, Debug)]
struct CliArgs {
    /// The environment to check, overrides POMS_ENV and the config file.
    #[clap(long, value_enum)]
    pub env: Option<Env>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows the resolved endpoints of the environment.
    Config,

    /// Polls the media backend until a media object is in the given state.
    Media {
        /// Mid or crid of the media object.
        id: String,

        /// Waits until the object is marked deleted.
        #[clap(long)]
        deleted: bool,

        /// Waits until the main title equals this.
        #[clap(long)]
        title: Option<String>,

        /// How long to keep polling.
        #[clap(long, default_value_t = 300)]
        acceptable_secs: u64,

        /// Seconds between two attempts.
        #[clap(long, default_value_t = 15)]
        interval_secs: u64,
    },

    /// Lists the import endpoints of the letterbox.
    Letterbox,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let config = Config::load_for(cli_args.env)?;
    info!(
        "Using env {} (config file: {})",
        config.env(),
        config
            .source()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    run(cli_args.command, &config).await
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config => {
            for prefix in Prefix::ALL {
                match config.base_url(prefix) {
                    Ok(url) => println!("{:<16} {}", prefix.section(), url),
                    Err(_) => println!("{:<16} -", prefix.section()),
                }
            }
        }
        Command::Media {
            id,
            deleted,
            title,
            acceptable_secs,
            interval_secs,
        } => {
            let client = MediaBackendClient::configured(config)?;
            let waiter = Waiter::new(Duration::from_secs(acceptable_secs))
                .with_interval(Duration::from_secs(interval_secs));
            let program = wait_for_media(&client, &id, waiter, &media_checks(deleted, title)).await?;
            println!("{}", program.to_xml()?);
        }
        Command::Letterbox => {
            let client = LetterBoxClient::configured(config)?;
            for endpoint in client.list_endpoints().await? {
                println!("{}", endpoint);
            }
        }
    }
    Ok(())
}

fn media_checks(deleted: bool, title: Option<String>) -> Vec<Check<ProgramUpdate>> {
    let mut checks = vec![Check::<ProgramUpdate>::new(
        if deleted { "is deleted" } else { "is not deleted" },
        move |program: &ProgramUpdate| program.is_deleted() == deleted,
    )];
    if let Some(title) = title {
        let description = format!("has main title {}", title);
        checks.push(
            Check::new(description, move |program: &ProgramUpdate| {
                program.main_title() == Some(title.as_str())
            })
            .with_failure_description(|program: &ProgramUpdate| {
                format!("main title is {:?}", program.main_title())
            }),
        );
    }
    checks
}

async fn wait_for_media(
    client: &MediaBackendClient,
    id: &str,
    waiter: Waiter,
    checks: &[Check<ProgramUpdate>],
) -> Result<ProgramUpdate> {
    waiter
        .until(
            move || async move { Ok::<_, anyhow::Error>(client.get_program(id).await?) },
            checks,
        )
        .await
        .with_context(|| format!("Media object {} did not reach the expected state", id))
}
