//! Concurrent scenario registry (spec §4.A).
//!
//! Readers never hold a lock for the duration of a request: writers publish
//! a brand-new `Arc<Vec<Arc<Scenario>>>` per key under a short-lived mutex,
//! and readers clone the `Arc` out and release the lock immediately. This is
//! the same "stable snapshot, rare writer" shape the teacher's `PhaseState`
//! uses for its `DashMap<EventType, AtomicU64>` event counters, adapted to
//! a plain `Mutex<HashMap<..>>` because registry writes are driven only by
//! `POST /scenario` and startup config load — much rarer than event counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::model::Scenario;

type ScenarioList = Arc<Vec<Arc<Scenario>>>;

/// Concurrent table keyed by `"{path}_{METHOD}"` holding ordered scenario lists.
#[derive(Default)]
pub struct ScenarioRegistry {
    table: Mutex<HashMap<String, ScenarioList>>,
}

impl ScenarioRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scenario to the list at its key, publishing a new list.
    ///
    /// A second add of an equivalent scenario appends a duplicate entry by
    /// design — insertion order is the match-precedence tiebreak (spec §4.A).
    pub fn add(&self, scenario: Scenario) {
        let key = scenario.key();
        let scenario = Arc::new(scenario);
        let mut table = self.table.lock().expect("registry lock poisoned");
        let updated = match table.get(&key) {
            Some(existing) => {
                let mut next = (**existing).clone();
                next.push(scenario);
                next
            }
            None => vec![scenario],
        };
        table.insert(key, Arc::new(updated));
    }

    /// Returns a stable snapshot of the list at `key`, if any.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<ScenarioList> {
        self.table.lock().expect("registry lock poisoned").get(key).cloned()
    }

    /// Visits every `(key, list)` pair currently in the registry. Each list
    /// passed to `f` is a stable snapshot taken at the moment of iteration.
    pub fn iterate(&self, mut f: impl FnMut(&str, &ScenarioList)) {
        let snapshot: Vec<(String, ScenarioList)> = {
            let table = self.table.lock().expect("registry lock poisoned");
            table.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        for (key, list) in &snapshot {
            f(key, list);
        }
    }

    /// Number of distinct (path, method) keys registered — for `/health`.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.table.lock().expect("registry lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::model::{MatchSpec, Response};

    fn scenario(path: &str, method: &str, status: u16) -> Scenario {
        Scenario::new(
            path.to_string(),
            method.to_string(),
            MatchSpec::default(),
            vec![Response {
                status,
                delay: None,
                delay_range: None,
                body: String::new(),
                headers: Default::default(),
                gzip: false,
                probability: 0.0,
            }],
            None,
        )
    }

    #[test]
    fn add_then_lookup_returns_snapshot() {
        let reg = ScenarioRegistry::new();
        reg.add(scenario("/a", "GET", 200));
        let list = reg.lookup("/a_GET").expect("scenario present");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].responses[0].status, 200);
    }

    #[test]
    fn duplicate_add_appends_in_order() {
        let reg = ScenarioRegistry::new();
        reg.add(scenario("/a", "GET", 200));
        reg.add(scenario("/a", "GET", 500));
        let list = reg.lookup("/a_GET").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].responses[0].status, 200);
        assert_eq!(list[1].responses[0].status, 500);
    }

    #[test]
    fn lookup_missing_key_is_none() {
        let reg = ScenarioRegistry::new();
        assert!(reg.lookup("/nope_GET").is_none());
    }

    #[test]
    fn iterate_visits_every_key_with_stable_snapshot() {
        let reg = ScenarioRegistry::new();
        reg.add(scenario("/a", "GET", 200));
        reg.add(scenario("/b", "POST", 201));
        let mut seen = Vec::new();
        reg.iterate(|k, list| seen.push((k.to_string(), list.len())));
        seen.sort();
        assert_eq!(seen, vec![("/a_GET".to_string(), 1), ("/b_POST".to_string(), 1)]);
    }
}
