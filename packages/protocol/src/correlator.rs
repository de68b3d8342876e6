use crate::messages::RequestId;
use crc32fast::Hasher;
use std::collections::HashMap;

/// Sequential request ids scoped to one session.
///
/// Ids are `{seed}-{n}` where the seed is a CRC32 of the session name, so
/// ids from two sessions sharing a host never collide.
#[derive(Debug, Clone)]
pub struct RequestIdGenerator {
    seed: String,
    count: u32,
}

impl RequestIdGenerator {
    pub fn new(session: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(session.as_bytes());
        Self {
            seed: format!("{:x}", hasher.finalize()),
            count: 0,
        }
    }

    pub fn next_id(&mut self) -> RequestId {
        self.count += 1;
        RequestId(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest<O> {
    pub origin: O,
    /// Content of the origin when the request was issued
    pub snapshot: String,
}

/// Outstanding requests by id.
///
/// Several requests may be in flight at once, including two for the same
/// origin; whichever response arrives first resolves its own entry only.
#[derive(Debug)]
pub struct RequestCorrelator<O> {
    ids: RequestIdGenerator,
    pending: HashMap<RequestId, PendingRequest<O>>,
}

impl<O> RequestCorrelator<O> {
    pub fn new(session: &str) -> Self {
        Self {
            ids: RequestIdGenerator::new(session),
            pending: HashMap::new(),
        }
    }

    pub fn begin(&mut self, origin: O, snapshot: impl Into<String>) -> RequestId {
        let id = self.ids.next_id();
        self.pending.insert(
            id.clone(),
            PendingRequest {
                origin,
                snapshot: snapshot.into(),
            },
        );
        id
    }

    /// Take the entry for `id`. `None` means the response is stale.
    pub fn resolve(&mut self, id: &RequestId) -> Option<PendingRequest<O>> {
        self.pending.remove(id)
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = (&RequestId, &PendingRequest<O>)> {
        self.pending.iter()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<O: PartialEq> RequestCorrelator<O> {
    pub fn has_pending_for(&self, origin: &O) -> bool {
        self.pending.values().any(|p| p.origin == *origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_and_seeded() {
        let mut a = RequestIdGenerator::new("session-a");
        let mut b = RequestIdGenerator::new("session-b");

        let first = a.next_id();
        let second = a.next_id();
        assert_eq!(first.as_str(), format!("{}-1", a.seed()));
        assert_eq!(second.as_str(), format!("{}-2", a.seed()));
        assert_ne!(b.next_id(), first);
    }

    #[test]
    fn test_concurrent_requests_do_not_cross_resolve() {
        let mut correlator = RequestCorrelator::new("s");
        let hero = correlator.begin("hero_h1_1", "Old hero");
        let about = correlator.begin("about_p_2", "Old about");

        let resolved = correlator.resolve(&about).unwrap();
        assert_eq!(resolved.origin, "about_p_2");
        assert_eq!(resolved.snapshot, "Old about");
        assert!(correlator.is_pending(&hero));
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn test_second_resolution_is_stale() {
        let mut correlator = RequestCorrelator::new("s");
        let id = correlator.begin("k", "");
        assert!(correlator.resolve(&id).is_some());
        assert!(correlator.resolve(&id).is_none());
        assert!(correlator.resolve(&RequestId::from("unknown")).is_none());
    }

    #[test]
    fn test_duplicate_origin_both_tracked() {
        let mut correlator = RequestCorrelator::new("s");
        let first = correlator.begin("k", "a");
        let second = correlator.begin("k", "b");
        assert_ne!(first, second);
        assert!(correlator.has_pending_for(&"k"));

        correlator.resolve(&second);
        assert!(correlator.has_pending_for(&"k"));
        correlator.resolve(&first);
        assert!(!correlator.has_pending_for(&"k"));
    }
}
