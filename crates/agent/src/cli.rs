use clap::{Args, Parser, Subcommand, ValueEnum};
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "trackwatch-agent",
    about = "Alert synchronization agent for the trackwatch asset-tracking platform",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: json (production) or text (development)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Bearer token for authenticated backends
    #[arg(long, env = "TRACKWATCH_TOKEN", global = true)]
    pub token: Option<String>,

    /// Backend base URL (overrides config file)
    #[arg(long, env = "TRACKWATCH_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Table,
    /// Raw JSON from the API
    Json,
}

/// Subscription scope: which user's alerts to synchronize.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// User whose alerts to synchronize
    #[arg(long, env = "TRACKWATCH_USER")]
    pub user: String,

    /// Organization the user belongs to
    #[arg(long, env = "TRACKWATCH_ORG")]
    pub org: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version information
    Version,

    /// List and manage alerts
    Alerts(AlertsArgs),

    /// Follow the live alert feed until interrupted
    Watch {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Args, Debug)]
pub struct AlertsArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List current alerts, newest first
    List {
        /// Show only unread alerts
        #[arg(long)]
        unread: bool,

        /// Maximum number of alerts to show
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Mark one alert as read
    MarkRead {
        /// Alert ID
        id: String,
    },

    /// Mark every alert as read
    MarkAllRead,
}

pub fn parse() -> Cli {
    Cli::parse()
}
