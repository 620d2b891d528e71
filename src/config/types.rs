use serde::Deserialize;

/// Main configuration structure for Club-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub listing: ListingConfig,
    pub selectors: SelectorConfig,
    #[serde(default, rename = "static-page")]
    pub static_page: StaticPageConfig,
}

/// Target site URLs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Prefix joined with each result's relative detail path
    pub base_url: String,

    /// Search page driven by the listing phase
    pub search_url: String,
}

/// Output destinations and checkpoint cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Seed dataset written by the listing phase
    pub listing_path: String,

    /// Enriched dataset written by the detail phase
    pub details_path: String,

    /// Partial snapshot overwritten during the detail phase
    pub partial_path: String,

    /// Log file, appended to on every run
    pub log_path: String,

    /// Number of seed rows between partial snapshots
    #[serde(default = "default_partial_save_every")]
    pub partial_save_every: usize,

    /// Field separator for every table
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// Static fetch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Headless browser session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Upper bound for every wait-for-condition poll
    #[serde(default = "default_timeout_secs")]
    pub wait_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after navigating to a detail page
    #[serde(default = "default_settle_delay")]
    pub settle_delay: DelayRange,

    /// Pause before clicking the installations tab
    #[serde(default = "default_installation_delay")]
    pub installation_delay: DelayRange,

    /// Pause before clicking the committee tab
    #[serde(default = "default_committee_delay")]
    pub committee_delay: DelayRange,

    /// Try to dismiss the overlay on every detail page instead of only the first
    #[serde(default)]
    pub dismiss_overlay_every_entity: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            wait_timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay: default_settle_delay(),
            installation_delay: default_installation_delay(),
            committee_delay: default_committee_delay(),
            dismiss_overlay_every_entity: false,
        }
    }
}

/// Inclusive range for a randomized pause, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }
}

/// Listing phase behaviour
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Assign contiguous indices instead of keeping discovery positions
    #[serde(default)]
    pub renumber_on_skip: bool,
}

/// How an element is located in the live page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    Xpath(String),
    Id(String),
}

impl Locator {
    /// Short tag used by the DOM helper scripts
    pub fn kind(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css",
            Locator::Xpath(_) => "xpath",
            Locator::Id(_) => "id",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::Xpath(s) | Locator::Id(s) => s,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

/// UI locators for the search page and the detail page tabs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub popup: Locator,
    pub search_toggle: Locator,
    pub expanded_search_panel: Locator,
    pub submit_button: Locator,
    pub results: Locator,
    pub name_link: Locator,

    #[serde(default = "default_summary_fields")]
    pub summary_fields: Locator,

    #[serde(default = "default_image")]
    pub image: Locator,

    #[serde(default = "default_detail_url_attribute")]
    pub detail_url_attribute: String,

    pub installation_tab: Locator,
    pub installation_panel: Locator,

    #[serde(default = "default_installation_block")]
    pub installation_block: Locator,

    #[serde(default = "default_installation_value")]
    pub installation_value: Locator,

    #[serde(default = "default_committee_tab")]
    pub committee_tab: Locator,

    #[serde(default = "default_committee_panel")]
    pub committee_panel: Locator,

    pub president_panel: Locator,
    pub president_name: Locator,
}

/// CSS selectors applied to the statically fetched detail document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticPageConfig {
    #[serde(default = "default_heading")]
    pub heading: String,

    #[serde(default = "default_info_values")]
    pub info_values: String,

    #[serde(default = "default_members_rows")]
    pub members_rows: String,

    /// Inert script text stripped from the heading
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Labels that look numeric but are never phone numbers
    #[serde(default = "default_non_phone_prefixes")]
    pub non_phone_prefixes: Vec<String>,
}

impl Default for StaticPageConfig {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            info_values: default_info_values(),
            members_rows: default_members_rows(),
            placeholder: default_placeholder(),
            non_phone_prefixes: default_non_phone_prefixes(),
        }
    }
}

fn default_partial_save_every() -> usize {
    50
}

fn default_delimiter() -> char {
    '*'
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "fr-BE,fr;q=0.9,en;q=0.8".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_settle_delay() -> DelayRange {
    DelayRange {
        min_ms: 3000,
        max_ms: 4000,
    }
}

fn default_installation_delay() -> DelayRange {
    DelayRange {
        min_ms: 4000,
        max_ms: 5000,
    }
}

fn default_committee_delay() -> DelayRange {
    DelayRange {
        min_ms: 2000,
        max_ms: 3000,
    }
}

fn default_summary_fields() -> Locator {
    Locator::Css("dd".to_string())
}

fn default_image() -> Locator {
    Locator::Css("img.profile".to_string())
}

fn default_detail_url_attribute() -> String {
    "data-url".to_string()
}

fn default_installation_block() -> Locator {
    Locator::Xpath(".//div[contains(@class,'panel-body')]//dl".to_string())
}

fn default_installation_value() -> Locator {
    Locator::Css("dd".to_string())
}

fn default_committee_tab() -> Locator {
    Locator::Id("tabResult".to_string())
}

fn default_committee_panel() -> Locator {
    Locator::Id("tabClubCommittee".to_string())
}

fn default_heading() -> String {
    "div.detail-body h1".to_string()
}

fn default_info_values() -> String {
    "div#colInfo dd".to_string()
}

fn default_members_rows() -> String {
    "table.table-infor tbody tr".to_string()
}

fn default_placeholder() -> String {
    "javascript:void(0)".to_string()
}

fn default_non_phone_prefixes() -> Vec<String> {
    vec!["Extérieur".to_string()]
}
