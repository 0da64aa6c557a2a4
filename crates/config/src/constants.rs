//! Centralized constants for the coaching engine
//!
//! Single source of truth for defaults used across crates. Configuration
//! sections take their serde defaults from here.

/// LLM API endpoints
pub mod endpoints {
    /// OpenAI-compatible chat completions base URL
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Anthropic messages API base URL
    pub const ANTHROPIC_DEFAULT: &str = "https://api.anthropic.com";
}

/// Default model ids per provider
pub mod models {
    pub const OPENAI_DEFAULT: &str = "gpt-3.5-turbo";
    pub const ANTHROPIC_DEFAULT: &str = "claude-3-haiku-20240307";
}

/// Generation parameters
pub mod generation {
    pub const TEMPERATURE: f32 = 0.7;
    pub const MAX_TOKENS: usize = 2000;
    pub const TIMEOUT_SECS: u64 = 30;
    pub const MAX_RETRIES: u32 = 3;
    /// Doubles after every failed attempt
    pub const INITIAL_BACKOFF_MS: u64 = 200;
}

/// Phase transition rules
pub mod dialogue {
    /// Understanding level (1-10) that ends the current-situation phase early
    pub const UNDERSTANDING_THRESHOLD: u8 = 7;

    /// User turns after which any phase advances
    pub const MIN_TURNS_PER_PHASE: usize = 2;

    /// User turns needed in execution support before the summary
    pub const EXECUTION_SUPPORT_MIN_TURNS: usize = 1;

    /// History entries shown to the analyzer
    pub const ANALYSIS_HISTORY_WINDOW: usize = 5;

    /// History entries shown to the question generator
    pub const QUESTION_HISTORY_WINDOW: usize = 10;

    /// A next-action hint naming customers moves solution exploration on
    pub const CUSTOMER_KEYWORDS: &[&str] = &["customer", "client", "顧客"];

    /// Key points mentioning any of these count as a concrete plan
    pub const GOAL_KEYWORDS: &[&str] = &[
        "goal", "target", "visit", "measure", "%", "目標", "訪問", "測定",
    ];
}

/// Completeness scoring
pub mod completeness {
    pub const POINTS_PER_USER_TURN: u32 = 15;

    /// Cap on turn points for the mock scorer
    pub const MOCK_TURN_CAP: u32 = 70;

    /// Cap on turn points when the model's score cannot be parsed
    pub const FALLBACK_TURN_CAP: u32 = 90;

    pub const KEYWORD_BONUS: u32 = 5;

    pub const BONUS_KEYWORDS: &[&str] = &[
        "issue", "goal", "specific", "example", "situation", "deadline",
        "課題", "目標", "具体的", "例", "状況", "期限",
    ];
}

/// Server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_MAX_SESSIONS: usize = 1000;
}

/// Text rendering limits
pub mod formatting {
    /// Slack section text limit
    pub const SLACK_MAX_CHARS: usize = 3000;
}

/// Knowledge store
pub mod knowledge {
    pub const SEARCH_LIMIT: usize = 5;
}

/// Action plan generation
pub mod action_plan {
    /// Templates merged into one plan
    pub const MAX_TEMPLATES: usize = 2;
    /// Used when the timeline cannot be read
    pub const DEFAULT_TIMELINE_DAYS: u32 = 30;
    pub const DAYS_PER_WEEK: u32 = 7;
    pub const DAYS_PER_MONTH: u32 = 30;
    /// Steps numbered at or below this are high priority
    pub const HIGH_PRIORITY_STEPS: u32 = 2;
    /// Due date of the onboarding item added for first-year reps
    pub const ONBOARDING_DUE_DAYS: i64 = 3;
}

/// 1-on-1 meeting analysis
pub mod one_on_one {
    /// Knowledge references attached to one analysis
    pub const MAX_REFERENCES: usize = 5;
    /// Search terms used to gather references
    pub const SEARCH_TERMS: &[&str] = &[
        "sales",
        "customer",
        "trust",
        "relationship",
        "proposal",
        "hearing",
        "meeting",
    ];
}
