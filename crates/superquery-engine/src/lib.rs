//! superquery-engine
//!
//! Executes compiled queries by spawning the external `super` binary, one
//! child process per query, and decodes its line-delimited JSON output into
//! bounded result sets.

pub mod display;
pub mod executor;
pub mod output;
pub mod process;

pub use display::{format_table, statistics, QueryStatistics};
pub use executor::{validate_binary, BinaryStatus, ProbeOutcome, SuperExecutor};
pub use output::{parse_output, JsonLinesCollector};
pub use process::{EngineEnv, CREDENTIAL_VARS};
