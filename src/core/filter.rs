// HttpSleuth - core/filter.rs
//
// Record filters applied between the pipeline and the renderer.
// The status bucket and the wildcard pattern are AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::model::TransactionRecord;
use crate::util::error::FilterError;
use glob::Pattern;

/// Status bucket selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    /// `status < 400`.
    Ok,
    /// `status >= 400`.
    NotOk,
}

impl StatusFilter {
    /// Build from the two CLI flags. "ok" is checked first, so passing
    /// both selects the ok bucket.
    pub fn from_flags(ok: bool, not_ok: bool) -> Self {
        if ok {
            StatusFilter::Ok
        } else if not_ok {
            StatusFilter::NotOk
        } else {
            StatusFilter::All
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Ok => record.is_ok(),
            StatusFilter::NotOk => !record.is_ok(),
        }
    }
}

/// Complete filter state.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub status: StatusFilter,

    /// Shell-style wildcard matched against the record's JSON form.
    /// None = no pattern filter.
    pub pattern: Option<Pattern>,
}

impl FilterState {
    /// Set the wildcard pattern, compiling it. An empty pattern clears it.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<(), FilterError> {
        if pattern.is_empty() {
            self.pattern = None;
            return Ok(());
        }
        let compiled = Pattern::new(pattern).map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        self.pattern = Some(compiled);
        Ok(())
    }

    /// Does `record` pass every active filter?
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if !self.status.matches(record) {
            return false;
        }
        let Some(pattern) = &self.pattern else {
            return true;
        };
        match serde_json::to_string(record) {
            Ok(json) => pattern.matches(&json),
            Err(e) => {
                tracing::warn!(error = %e, "Record could not be serialised for pattern matching");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: u16, url: &str) -> TransactionRecord {
        TransactionRecord {
            timestamp: "10:00".to_string(),
            method: "GET".to_string(),
            url: url.to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filter_returns_all() {
        let filter = FilterState::default();
        assert_eq!(filter.status, StatusFilter::All);
        assert!(filter.pattern.is_none());
        assert!(filter.matches(&record(200, "/a")));
        assert!(filter.matches(&record(500, "/a")));
        assert!(filter.matches(&record(0, "/a")));
    }

    #[test]
    fn test_status_buckets() {
        assert!(StatusFilter::Ok.matches(&record(399, "/")));
        assert!(!StatusFilter::Ok.matches(&record(400, "/")));
        assert!(StatusFilter::NotOk.matches(&record(400, "/")));
        assert!(!StatusFilter::NotOk.matches(&record(204, "/")));
        // An unobserved status counts as ok.
        assert!(StatusFilter::Ok.matches(&record(0, "/")));
    }

    #[test]
    fn test_ok_flag_wins_over_not_ok() {
        assert_eq!(StatusFilter::from_flags(true, true), StatusFilter::Ok);
        assert_eq!(StatusFilter::from_flags(false, true), StatusFilter::NotOk);
        assert_eq!(StatusFilter::from_flags(false, false), StatusFilter::All);
    }

    #[test]
    fn test_pattern_matches_serialised_record() {
        let mut filter = FilterState::default();
        filter.set_pattern("*\"url\":\"https://api/login\"*").unwrap();
        assert!(filter.matches(&record(200, "https://api/login")));
        assert!(!filter.matches(&record(200, "https://api/logout")));
    }

    #[test]
    fn test_pattern_must_cover_whole_text() {
        let mut filter = FilterState::default();
        filter.set_pattern("login").unwrap();
        assert!(!filter.matches(&record(200, "/login")));
        filter.set_pattern("*login*").unwrap();
        assert!(filter.matches(&record(200, "/login")));
    }

    #[test]
    fn test_combined_filters() {
        let mut filter = FilterState {
            status: StatusFilter::NotOk,
            pattern: None,
        };
        filter.set_pattern("*login*").unwrap();
        assert!(filter.matches(&record(503, "/login")));
        assert!(!filter.matches(&record(200, "/login")));
        assert!(!filter.matches(&record(503, "/items")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut filter = FilterState::default();
        let err = filter.set_pattern("[unclosed").unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
        assert!(filter.pattern.is_none());
    }

    #[test]
    fn test_empty_pattern_clears() {
        let mut filter = FilterState::default();
        filter.set_pattern("*a*").unwrap();
        filter.set_pattern("").unwrap();
        assert!(filter.pattern.is_none());
    }
}
