//! Shared constants for dqbot.
//!
//! Centralizes names and defaults that are referenced from more than one crate.

/// User input that starts the save flow (compared ASCII case-insensitively).
pub const SAVE_TRIGGER: &str = "save test";

/// User inputs that end a chat session (compared ASCII case-insensitively).
pub const EXIT_TOKENS: [&str; 2] = ["exit", "quit"];

/// Column every assertion must project with its per-row verdict.
pub const VERDICT_COLUMN: &str = "test_result";

/// Default name of the append-only history table.
pub const DEFAULT_HISTORY_TABLE: &str = "test_results_aggregated";

/// Default directory holding one `.sql` file per stored assertion.
pub const DEFAULT_TESTS_DIR: &str = "tests/generated";

/// Default target database file.
pub const DEFAULT_TARGET_DB: &str = "sample_crm.db";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default sampling temperature for SQL generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default timeout for a single text-generation request, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Chat sessions idle for longer than this are discarded by the HTTP server, in seconds.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

/// Default number of assertions executed concurrently in one run.
pub const DEFAULT_MAX_PARALLEL_TESTS: usize = 4;

/// Maximum length of the file-name slug derived from an assertion name.
pub const MAX_SLUG_LEN: usize = 50;
