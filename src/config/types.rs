use serde::Deserialize;

/// Main configuration structure for Snippet-Harvest
///
/// Every section has defaults, so an empty TOML document (or no file at all)
/// produces a usable configuration once credentials are supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub github: GithubConfig,
    pub crawler: CrawlerConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Repository search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Filter passed verbatim to the repository search endpoint
    pub query: String,

    /// Results requested per search page
    #[serde(rename = "per-page")]
    pub per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: "language:python pushed:<2023-01-01".to_string(),
            per_page: 30,
        }
    }
}

/// Hosting API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Base URL of the REST API
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Transport timeout for a single request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Ordered credential list; the front entry is the one in use
    pub tokens: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: format!("snippet-harvest/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            tokens: Vec::new(),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent crawl workers
    pub workers: usize,

    /// How often the coordinator checks worker liveness (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// How long an interrupt waits for workers to reach a safe point (milliseconds)
    #[serde(rename = "shutdown-grace-ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            poll_interval_ms: 100,
            shutdown_grace_ms: 5000,
        }
    }
}

/// Snippet extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Column width documentation is wrapped to
    #[serde(rename = "wrap-width")]
    pub wrap_width: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { wrap_width: 70 }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the visited-repository ledger (JSON array)
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Optional append-only log file
    #[serde(rename = "log-path")]
    pub log_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./database/python_code_snippets.db".to_string(),
            ledger_path: "ids.json".to_string(),
            log_path: None,
        }
    }
}
