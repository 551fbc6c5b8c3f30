/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! Every request reports exactly one named counter:
//!
//! - `<prefix>.success.<class>` where class is nohash, verified or unknown
//! - `<prefix>.mismatch` when no copy matched the validation token
//! - `<prefix>.notfound`
//! - `<prefix>.badrequest`
//! - `<prefix>.noversions` when no version chain could be built

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use parking_lot::Mutex;

use crate::resolver::{ResolutionOutcome, Selection};

pub const DEFAULT_METRICS_PREFIX: &str = "wmfstatic";

pub const COUNTER_MISMATCH: &str = "mismatch";
pub const COUNTER_NOT_FOUND: &str = "notfound";
pub const COUNTER_BAD_REQUEST: &str = "badrequest";
pub const COUNTER_NO_VERSIONS: &str = "noversions";

/// Receiver of named counter increments
pub trait MetricsSink: Send + Sync {
    fn increment(&self, counter: &str);
}

/// The counter (without prefix) reported for an outcome
pub fn outcome_counter(outcome: &ResolutionOutcome) -> String {
    use crate::resolver::NotFoundReason;

    match outcome {
        ResolutionOutcome::Served(file) | ResolutionOutcome::NotModified(file) => {
            match file.selection {
                Selection::HashFallback => COUNTER_MISMATCH.to_string(),
                _ => format!("success.{}", file.response_class()),
            }
        }
        ResolutionOutcome::NotFound(NotFoundReason::NoCandidate) => COUNTER_NOT_FOUND.to_string(),
        ResolutionOutcome::NotFound(NotFoundReason::Configuration(_)) => {
            COUNTER_NO_VERSIONS.to_string()
        }
        ResolutionOutcome::BadRequest(_) => COUNTER_BAD_REQUEST.to_string(),
    }
}

/// Join a prefix and counter name with '.', leaving the counter alone when the prefix is empty
pub fn prefixed(prefix: &str, counter: &str) -> String {
    if prefix.is_empty() {
        counter.to_string()
    } else {
        format!("{prefix}.{counter}")
    }
}

/// Writes each increment to the log under the "metrics" target
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn increment(&self, counter: &str) {
        info!(target: "metrics", "{counter}:1|c");
    }
}

/// Keeps counts in memory
#[derive(Debug, Default)]
pub struct MemoryMetrics {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl MemoryMetrics {
    pub fn new() -> MemoryMetrics {
        MemoryMetrics::default()
    }

    pub fn count(&self, counter: &str) -> u64 {
        self.counts.lock().get(counter).copied().unwrap_or(0)
    }

    /// Copy of all counts so far
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts.lock().clone()
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }
}

impl MetricsSink for MemoryMetrics {
    fn increment(&self, counter: &str) {
        *self.counts.lock().entry(counter.to_string()).or_insert(0) += 1;
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn increment(&self, counter: &str) {
        (**self).increment(counter);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::resolver::{BadRequestReason, FileStat, NotFoundReason, ResolvedFile};
    use crate::version::VersionRoot;

    fn served(selection: Selection) -> ResolutionOutcome {
        ResolutionOutcome::Served(ResolvedFile {
            path: PathBuf::from("/srv/php-1.0/a.css"),
            root: VersionRoot::new("/srv/php-1.0"),
            selection,
            content_type: "text/css".to_string(),
            stat: FileStat {
                size: 1,
                modified: UNIX_EPOCH,
            },
        })
    }

    #[test]
    fn counters_for_each_outcome() {
        assert_eq!(outcome_counter(&served(Selection::Unvalidated)), "success.nohash");
        assert_eq!(outcome_counter(&served(Selection::Verified)), "success.verified");
        assert_eq!(outcome_counter(&served(Selection::MalformedToken)), "success.unknown");
        assert_eq!(outcome_counter(&served(Selection::HashFallback)), "mismatch");
        assert_eq!(
            outcome_counter(&ResolutionOutcome::NotFound(NotFoundReason::NoCandidate)),
            "notfound"
        );
        assert_eq!(
            outcome_counter(&ResolutionOutcome::NotFound(NotFoundReason::Configuration(
                String::new()
            ))),
            "noversions"
        );
        assert_eq!(
            outcome_counter(&ResolutionOutcome::BadRequest(BadRequestReason::PathEscape)),
            "badrequest"
        );
    }

    #[test]
    fn prefix_is_optional() {
        assert_eq!(prefixed("wmfstatic", "notfound"), "wmfstatic.notfound");
        assert_eq!(prefixed("", "notfound"), "notfound");
    }

    #[test]
    fn shared_memory_metrics_count() {
        let memory = Arc::new(MemoryMetrics::new());
        let shared: Arc<MemoryMetrics> = Arc::clone(&memory);
        let sink: Arc<dyn MetricsSink> = shared;
        sink.increment("wmfstatic.success.nohash");
        sink.increment("wmfstatic.success.nohash");
        sink.increment("wmfstatic.notfound");
        assert_eq!(memory.count("wmfstatic.success.nohash"), 2);
        assert_eq!(memory.count("wmfstatic.mismatch"), 0);
        assert_eq!(memory.total(), 3);
    }
}
