use std::collections::VecDeque;

/// Rolling window of per-frame detection events, oldest evicted first.
#[derive(Clone, Debug)]
pub struct DetectionHistory {
    events: VecDeque<bool>,
    capacity: usize,
    hits: usize,
}

impl DetectionHistory {
    /// Create an empty window holding at most `capacity` events.
    ///
    /// A capacity of zero is bumped to one so the window can always hold
    /// the latest frame.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        DetectionHistory {
            events: VecDeque::with_capacity(capacity + 1),
            capacity,
            hits: 0,
        }
    }

    pub fn push(&mut self, event: bool) {
        self.events.push_back(event);
        if event {
            self.hits += 1;
        }

        if self.events.len() > self.capacity {
            if let Some(true) = self.events.pop_front() {
                self.hits -= 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of `true` events currently in the window.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.events.iter().copied()
    }
}

impl Default for DetectionHistory {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut history = DetectionHistory::new(3);
        history.push(true);
        history.push(false);
        history.push(false);
        history.push(false);

        assert_eq!(history.len(), 3);
        assert_eq!(history.hits(), 0);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![false, false, false]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut history = DetectionHistory::new(10);
        for i in 0..57 {
            history.push(i % 3 == 0);
            assert!(history.len() <= 10);
            assert_eq!(history.hits(), history.iter().filter(|e| *e).count());
        }
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut history = DetectionHistory::new(0);
        history.push(false);
        history.push(true);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![true]);
    }
}
