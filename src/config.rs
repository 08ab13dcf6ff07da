// Command line options and derived settings.
// Flags fall back to environment variables; `.env` is loaded before parsing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};

use crate::agent::{AgentOptions, DEFAULT_MAX_STEPS, DEFAULT_MODEL};
use crate::cache::DiskCache;
use crate::cache::lru::DEFAULT_CAPACITY;
use crate::error::{Result, ScoutError};
use crate::events::EventBus;
use crate::openai::{OPENAI_API_BASE, OpenAiClient};
use crate::pipeline::Pipeline;
use crate::web::PageFetcher;

/// Find political contacts on websites with an LLM-driven crawler.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Input CSV with a start_url column, preselected in the TUI.
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,
    /// Directory for contacts_updated.csv and contacts_merged.csv.
    #[arg(short, long, default_value = ".", global = true)]
    pub output_dir: PathBuf,
    /// Chat model used by the agents.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,
    /// Base URL of the OpenAI compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_BASE, global = true)]
    pub base_url: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,
    /// Pages kept in memory per agent.
    #[arg(long, default_value_t = DEFAULT_CAPACITY, global = true)]
    pub cache_size: usize,
    /// Minutes a fetched page stays in the disk cache. 0 disables it.
    #[arg(long, default_value_t = 60, global = true)]
    pub cache_ttl_mins: u64,
    /// Completion requests per agent before it gives up.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS, global = true)]
    pub max_steps: usize,
    /// HTTP timeout for page fetches in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,
    /// Delete cached pages before starting.
    #[arg(long, global = true)]
    pub clear_cache: bool,
    /// Log debug output.
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crawl the start URLs of a CSV without the TUI.
    Run {
        /// Talk to the first-pass agent on stdin when it answers in text.
        #[arg(long)]
        interactive: bool,
    },
}

/// Validated configuration shared by the TUI and headless runs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub api_key: Option<String>,
    pub agent: AgentOptions,
    pub cache_ttl: Duration,
    pub timeout: Duration,
    pub verbose: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.cache_size == 0 {
            return Err(ScoutError::Other("--cache-size must be at least 1".into()));
        }
        if cli.max_steps == 0 {
            return Err(ScoutError::Other("--max-steps must be at least 1".into()));
        }

        Ok(Self {
            input: cli.input.clone(),
            output_dir: cli.output_dir.clone(),
            base_url: cli.base_url.clone(),
            api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
            agent: AgentOptions {
                model: cli.model.clone(),
                cache_size: cli.cache_size,
                max_steps: cli.max_steps,
            },
            cache_ttl: Duration::from_secs(cli.cache_ttl_mins.saturating_mul(60)),
            timeout: Duration::from_secs(cli.timeout_secs),
            verbose: cli.verbose,
        })
    }

    /// Wire up a pipeline against the real OpenAI API and the web.
    pub fn pipeline(&self, events: EventBus) -> Result<Pipeline> {
        let key = self.api_key.as_deref().ok_or(ScoutError::MissingApiKey)?;
        let backend = OpenAiClient::new(key, &self.base_url)?;
        let pages = PageFetcher::new(self.timeout)?;

        Ok(
            Pipeline::new(Arc::new(backend), Arc::new(pages), events, self.agent.clone())
                .with_disk_cache(DiskCache::open_default(self.cache_ttl)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["contact-scout"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--api-key", "sk-test"]);
        assert!(cli.command.is_none());

        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.agent.cache_size, DEFAULT_CAPACITY);
        assert_eq!(settings.agent.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(settings.cache_ttl, Duration::from_secs(3600));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_run_subcommand_with_global_flags() {
        let cli = parse(&["run", "--input", "in.csv", "--interactive", "--cache-ttl-mins", "0"]);
        assert!(matches!(cli.command, Some(Commands::Run { interactive: true })));
        assert_eq!(cli.input, Some(PathBuf::from("in.csv")));

        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn test_rejects_zero_limits() {
        let cli = parse(&["--max-steps", "0"]);
        assert!(Settings::from_cli(&cli).is_err());
        let cli = parse(&["--cache-size", "0"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_pipeline_requires_api_key() {
        let cli = parse(&["--api-key", "  "]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(matches!(
            settings.pipeline(EventBus::new()),
            Err(ScoutError::MissingApiKey)
        ));
    }
}
