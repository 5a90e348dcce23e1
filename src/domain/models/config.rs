use serde::{Deserialize, Serialize};

/// Main configuration structure for playtest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Game inspection configuration
    #[serde(default)]
    pub inspection: InspectionConfig,

    /// Test generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Ranking configuration
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Execution and validation configuration
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Rate limiting for model backend calls
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Session retention
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Game inspection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InspectionConfig {
    /// Timeout for one inspection of the game page in milliseconds
    #[serde(default = "default_inspection_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_inspection_timeout_ms() -> u64 {
    60_000
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_inspection_timeout_ms(),
        }
    }
}

/// Test generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Minimum pool size accepted from the generation backend
    #[serde(default = "default_min_test_cases")]
    pub min_test_cases: usize,

    /// Number of backend attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Prompt budget (tokens) of the first attempt; attempt n asks for base * (n + 1)
    #[serde(default = "default_base_prompt_budget")]
    pub base_prompt_budget: u32,

    /// Timeout for one backend call in milliseconds
    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_min_test_cases() -> usize {
    20
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_prompt_budget() -> u32 {
    4096
}

const fn default_generation_timeout_ms() -> u64 {
    120_000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_test_cases: default_min_test_cases(),
            max_attempts: default_max_attempts(),
            base_prompt_budget: default_base_prompt_budget(),
            timeout_ms: default_generation_timeout_ms(),
        }
    }
}

/// Ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RankingConfig {
    /// Number of test cases selected for execution
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Weight of the normalized priority signal
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f64,

    /// Weight of the backend's failure-detection confidence
    #[serde(default = "default_detection_weight")]
    pub detection_weight: f64,

    /// Bonus for the first pick of a category; the k-th extra pick gets weight / (1 + k)
    #[serde(default = "default_coverage_weight")]
    pub coverage_weight: f64,

    /// Confidence assumed when the backend gave none
    #[serde(default = "default_detection_confidence")]
    pub default_detection_confidence: f64,
}

const fn default_top_n() -> usize {
    10
}

const fn default_priority_weight() -> f64 {
    0.6
}

const fn default_detection_weight() -> f64 {
    0.15
}

const fn default_coverage_weight() -> f64 {
    0.25
}

const fn default_detection_confidence() -> f64 {
    0.5
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            priority_weight: default_priority_weight(),
            detection_weight: default_detection_weight(),
            coverage_weight: default_coverage_weight(),
            default_detection_confidence: default_detection_confidence(),
        }
    }
}

/// Execution and validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutionConfig {
    /// Maximum test cases executing at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Repeat-validation runs per test case (at least 2)
    #[serde(default = "default_repeat_runs")]
    pub repeat_runs: u32,

    /// Judge variant used for repeat-validation runs
    #[serde(default = "default_primary_judge")]
    pub primary_judge: String,

    /// Judge variant used for the tie-breaking cross-agent run
    #[serde(default = "default_cross_agent_judge")]
    pub cross_agent_judge: String,

    /// Timeout for one browser driver execution in milliseconds
    #[serde(default = "default_driver_timeout_ms")]
    pub driver_timeout_ms: u64,

    /// Timeout for one verdict judge call in milliseconds
    #[serde(default = "default_judge_timeout_ms")]
    pub judge_timeout_ms: u64,
}

const fn default_max_concurrency() -> usize {
    3
}

const fn default_repeat_runs() -> u32 {
    2
}

fn default_primary_judge() -> String {
    "primary".to_string()
}

fn default_cross_agent_judge() -> String {
    "cross-agent".to_string()
}

const fn default_driver_timeout_ms() -> u64 {
    30_000
}

const fn default_judge_timeout_ms() -> u64 {
    60_000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            repeat_runs: default_repeat_runs(),
            primary_judge: default_primary_judge(),
            cross_agent_judge: default_cross_agent_judge(),
            driver_timeout_ms: default_driver_timeout_ms(),
            judge_timeout_ms: default_judge_timeout_ms(),
        }
    }
}

/// Knowledge store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KnowledgeConfig {
    /// Snippets requested from the store per generation
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    /// Timeout for one store call in milliseconds
    #[serde(default = "default_knowledge_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_max_snippets() -> usize {
    5
}

const fn default_knowledge_timeout_ms() -> u64 {
    5_000
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_snippets: default_max_snippets(),
            timeout_ms: default_knowledge_timeout_ms(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Model backend requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

const fn default_requests_per_second() -> f64 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Session retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetentionConfig {
    /// Sessions untouched for longer than this are expired
    #[serde(default = "default_max_session_age_hours")]
    pub max_session_age_hours: u64,
}

const fn default_max_session_age_hours() -> u64 {
    24
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_session_age_hours: default_max_session_age_hours(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
