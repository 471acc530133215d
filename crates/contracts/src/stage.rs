//! Stage kinds - labels for pipeline stages
//!
//! Used for stage labels in errors, logs and metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Source sequence (just / range / iter)
    Source,
    /// Keep elements matching a predicate
    Filter,
    /// Transform each element
    Map,
    /// Expand each element into an inner sequence, drained in order
    FlatMap,
    /// Drain one sequence after another
    Concat,
    /// Pair elements by index
    Zip,
    /// Re-run upstream from the start
    Repeat,
    /// Withhold each element for a minimum duration
    Delay,
    /// Next map/filter runs on a worker pool
    RunOn,
    /// Trace signals
    Log,
    /// Side-effect peek
    Peek,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Filter => "filter",
            Self::Map => "map",
            Self::FlatMap => "flat_map",
            Self::Concat => "concat",
            Self::Zip => "zip",
            Self::Repeat => "repeat",
            Self::Delay => "delay",
            Self::RunOn => "run_on",
            Self::Log => "log",
            Self::Peek => "peek",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
