use clap::Parser;
use nestflow::config::{ArtifactConfig, BrowserConfig, Config, WaitConfig, WindowSize};
use nestflow::Suite;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Browser-driven end-to-end checks for the ProjectNest account flows.
#[derive(Debug, Parser)]
#[command(name = "nestflow", version, about)]
struct Cli {
    /// Run the browser headless.
    #[arg(long)]
    headless: bool,

    /// Wait bound for outcome reads and redirects, in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_seconds: u64,

    /// Wait bound for locating form elements, in seconds.
    #[arg(long, default_value_t = 5)]
    implicit_wait_seconds: u64,

    /// Browser window size, WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080")]
    window_size: WindowSize,

    /// Base URL of the target site.
    #[arg(long)]
    base_url: Option<String>,

    /// Directory failure screenshots are written into.
    #[arg(long, default_value = ".")]
    artifact_dir: PathBuf,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config {
            browser: BrowserConfig {
                headless: self.headless,
                window: self.window_size,
                ..BrowserConfig::default()
            },
            wait: WaitConfig {
                timeout_secs: self.timeout_seconds,
                implicit_secs: self.implicit_wait_seconds,
                ..WaitConfig::default()
            },
            artifacts: ArtifactConfig {
                dir: self.artifact_dir,
            },
            ..Config::default()
        };
        if let Some(base_url) = self.base_url {
            config.site.base_url = base_url;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();

    let suite = Suite::launch(config).await?;
    let report = suite.run().await;

    for result in &report.results {
        if result.is_pass() {
            info!(scenario = %result.scenario, "PASS");
        } else {
            for failure in &result.failures {
                warn!(
                    scenario = %result.scenario,
                    artifact = ?failure.artifact,
                    "FAIL: {}",
                    failure.message
                );
            }
        }
    }
    info!(
        run_id = %report.run_id,
        failed = report.failed_count(),
        total = report.results.len(),
        "run finished"
    );

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
