use serde::Deserialize;

/// Main configuration structure for Site-Harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Total timeout for a single GET request (seconds)
    pub timeout_secs: u64,

    /// Timeout for establishing the connection (seconds)
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed before the fetch fails
    pub max_redirects: usize,

    /// Retries for transient failures (timeouts, connect errors, 5xx)
    pub retries: u32,

    /// Delay between retries (milliseconds)
    pub retry_delay_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_redirects: 5,
            retries: 0,
            retry_delay_ms: 1000,
            user_agent: format!("SiteHarvester/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Page budget used when the caller does not specify one
    pub default_max_pages: u32,

    /// Maximum number of pages fetched concurrently
    pub max_concurrent_pages: usize,

    /// Maximum number of image fetches in flight at once, across all pages of a batch
    pub max_concurrent_images: usize,

    /// Optional wall-clock limit for a whole crawl (seconds)
    pub crawl_timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_max_pages: 10,
            max_concurrent_pages: 4,
            max_concurrent_images: 8,
            crawl_timeout_secs: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory holding content-addressed page text and image files
    pub content_dir: String,

    /// Path to the SQLite database holding page and image records
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: "./scraped_files".to_string(),
            database_path: "./harvest.db".to_string(),
        }
    }
}
