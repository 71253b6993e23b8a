//! Logical reload clock.
//!
//! Wall-clock time is too coarse to order reloads that happen in the same
//! instant, so reloads are stamped with a counter instead. Every module
//! reloaded during one top-level call shares that call's tick.

use rustc_hash::FxHashMap;

/// A point on the reload clock. Larger is later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalTime(u64);

impl LogicalTime {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Last reload time per module name.
#[derive(Debug, Clone, Default)]
pub struct ReloadTimes {
    times: FxHashMap<String, LogicalTime>,
    clock: u64,
}

impl ReloadTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock. The result is strictly greater than every time
    /// handed out before.
    pub fn tick(&mut self) -> LogicalTime {
        self.clock += 1;
        LogicalTime(self.clock)
    }

    /// Latest time handed out, if any.
    pub fn now(&self) -> Option<LogicalTime> {
        (self.clock > 0).then_some(LogicalTime(self.clock))
    }

    pub fn record(&mut self, name: &str, at: LogicalTime) {
        self.times.insert(name.to_string(), at);
    }

    pub fn get(&self, name: &str) -> Option<LogicalTime> {
        self.times.get(name).copied()
    }

    /// Names reloaded at or after `at`, sorted.
    pub fn since(&self, at: LogicalTime) -> Vec<String> {
        let mut names: Vec<String> = self
            .times
            .iter()
            .filter(|(_, t)| **t >= at)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Names reloaded strictly after `mark` (everything for `None`), sorted.
    pub fn after(&self, mark: Option<LogicalTime>) -> Vec<String> {
        let mut names: Vec<String> = self
            .times
            .iter()
            .filter(|(_, t)| Some(**t) > mark)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Fold `other` in. Entries already present here win; the clock never
    /// moves backwards.
    pub fn merge(&mut self, other: ReloadTimes) {
        self.clock = self.clock.max(other.clock);
        for (name, at) in other.times {
            self.times.entry(name).or_insert(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_strictly_increasing() {
        let mut times = ReloadTimes::new();
        assert_eq!(times.now(), None);
        let a = times.tick();
        let b = times.tick();
        assert!(b > a);
        assert_eq!(times.now(), Some(b));
    }

    #[test]
    fn test_record_and_since() {
        let mut times = ReloadTimes::new();
        let first = times.tick();
        times.record("a", first);
        let second = times.tick();
        times.record("c", second);
        times.record("b", second);

        assert_eq!(times.get("a"), Some(first));
        assert_eq!(times.get("missing"), None);
        assert_eq!(times.since(second), vec!["b", "c"]);
        assert_eq!(times.since(first).len(), 3);
        assert_eq!(times.after(Some(first)), vec!["b", "c"]);
        assert_eq!(times.after(None).len(), 3);
    }

    #[test]
    fn test_merge_keeps_existing_and_max_clock() {
        let mut old = ReloadTimes::new();
        for _ in 0..5 {
            old.tick();
        }
        old.record("a", LogicalTime(2));
        old.record("b", LogicalTime(5));

        let mut new = ReloadTimes::new();
        let t = new.tick();
        new.record("a", t);

        new.merge(old);
        assert_eq!(new.get("a"), Some(LogicalTime(1)));
        assert_eq!(new.get("b"), Some(LogicalTime(5)));
        assert_eq!(new.tick(), LogicalTime(6));
    }
}
