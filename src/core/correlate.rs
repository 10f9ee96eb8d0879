// HttpSleuth - core/correlate.rs
//
// Request/response correlation for split grammars.
//
// Per correlation id: absent -> pending (request seen) -> resolved
// (response seen, pair merged, entry removed). A later request with the
// same id replaces the pending one; a response with no pending request is
// dropped. Pending entries are never evicted within a run.

use crate::core::model::{HalfRecord, Role, TransactionRecord};
use std::collections::HashMap;

/// Pending-request cache owned by one pipeline run.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<String, HalfRecord>,
    superseded: usize,
    dropped: usize,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one half record. Returns the merged transaction when `half` is
    /// a response that resolves a pending request.
    pub fn accept(&mut self, half: HalfRecord) -> Option<TransactionRecord> {
        match half.role {
            Role::Request => {
                let id = half.correlation_id.clone();
                if self.pending.insert(id, half).is_some() {
                    self.superseded += 1;
                    tracing::debug!("Pending request superseded by a newer request with the same id");
                }
                None
            }
            Role::Response => match self.pending.remove(&half.correlation_id) {
                Some(request) => Some(TransactionRecord::merge(request, half)),
                None => {
                    self.dropped += 1;
                    tracing::debug!(
                        id = %half.correlation_id,
                        "Response has no pending request; dropped"
                    );
                    None
                }
            },
        }
    }

    /// Requests still waiting for a response.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Pending requests replaced by a later request with the same id.
    pub fn superseded(&self) -> usize {
        self.superseded
    }

    /// Responses that arrived with no pending request.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, url: &str) -> HalfRecord {
        let mut half = HalfRecord::new(Role::Request, id);
        half.method = "GET".to_string();
        half.url = url.to_string();
        half
    }

    fn response(id: &str, status: u16) -> HalfRecord {
        let mut half = HalfRecord::new(Role::Response, id);
        half.status = Some(status);
        half
    }

    #[test]
    fn test_request_then_response_resolves() {
        let mut correlator = Correlator::new();
        assert!(correlator.accept(request("abc-123", "/a")).is_none());
        assert_eq!(correlator.pending(), 1);

        let record = correlator.accept(response("abc-123", 503)).unwrap();
        assert_eq!(record.url, "/a");
        assert_eq!(record.status, 503);
        assert_eq!(correlator.pending(), 0);
    }

    #[test]
    fn test_second_request_supersedes_first() {
        let mut correlator = Correlator::new();
        correlator.accept(request("id", "/first"));
        correlator.accept(request("id", "/second"));
        assert_eq!(correlator.pending(), 1);
        assert_eq!(correlator.superseded(), 1);

        let record = correlator.accept(response("id", 200)).unwrap();
        assert_eq!(record.url, "/second");
    }

    #[test]
    fn test_unmatched_response_is_dropped() {
        let mut correlator = Correlator::new();
        assert!(correlator.accept(response("zzz-999", 200)).is_none());
        assert_eq!(correlator.dropped(), 1);
        assert_eq!(correlator.pending(), 0);
    }

    #[test]
    fn test_response_consumes_entry_once() {
        let mut correlator = Correlator::new();
        correlator.accept(request("id", "/a"));
        assert!(correlator.accept(response("id", 200)).is_some());
        assert!(correlator.accept(response("id", 200)).is_none());
        assert_eq!(correlator.dropped(), 1);
    }

    #[test]
    fn test_interleaved_ids_resolve_in_response_order() {
        let mut correlator = Correlator::new();
        correlator.accept(request("slow", "/slow"));
        correlator.accept(request("fast", "/fast"));
        let first = correlator.accept(response("fast", 200)).unwrap();
        let second = correlator.accept(response("slow", 200)).unwrap();
        assert_eq!(first.url, "/fast");
        assert_eq!(second.url, "/slow");
    }
}
