use anyhow::Context;
use cdp_driver::{ChromeSession, Config, TodoScenario};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run the AngularJS todo-list check against a Chrome instance.
#[derive(Debug, Parser)]
#[command(name = "cdp-driver", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DevTools WebSocket URL of a running browser; launches one when absent
    #[arg(long)]
    ws_url: Option<String>,

    /// Show the launched browser window
    #[arg(long)]
    headed: bool,

    /// Page hosting the todo sample
    #[arg(long)]
    url: Option<String>,

    /// Todo text to enter
    #[arg(long)]
    text: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(ws_url) = self.ws_url {
            config.connection.ws_url = Some(ws_url);
        }
        if self.headed {
            config.connection.headless = false;
        }
        if let Some(url) = self.url {
            config.scenario.url = url;
        }
        if let Some(text) = self.text {
            config.scenario.todo_text = text;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Cli::parse().into_config()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = ChromeSession::open(&config.connection).context("opening browser session")?;
    let scenario = TodoScenario::from(&config.scenario);

    match scenario.run_and_close(session).await {
        Ok(report) => {
            info!(run_id = %report.run_id, "scenario passed");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "scenario failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
