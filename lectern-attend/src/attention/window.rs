//! Bounded smoothing window
//!
//! Holds the most recent gated verdicts together with their confidences.
//! Each entry pairs a verdict with its confidence, so the two sequences can
//! never drift out of alignment.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    entries: VecDeque<(bool, f32)>,
    capacity: usize,
}

impl SmoothingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a verdict, evicting the oldest entry when full
    pub fn push(&mut self, attentive: bool, confidence: f32) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((attentive, confidence));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Number of attentive verdicts in the window
    pub fn attentive_count(&self) -> usize {
        self.entries.iter().filter(|(attentive, _)| *attentive).count()
    }

    /// Majority vote over the window
    ///
    /// Attentive when at least `required` entries are attentive. An exact
    /// half split (even windows only) counts as distracted.
    pub fn majority(&self, required: usize) -> bool {
        let trues = self.attentive_count();
        if trues * 2 == self.entries.len() {
            return false;
        }
        trues >= required
    }

    /// Verdicts oldest first
    pub fn history(&self) -> impl Iterator<Item = bool> + '_ {
        self.entries.iter().map(|(attentive, _)| *attentive)
    }

    /// Confidences oldest first, index-aligned with [`history`](Self::history)
    pub fn confidences(&self) -> impl Iterator<Item = f32> + '_ {
        self.entries.iter().map(|(_, confidence)| *confidence)
    }

    /// Mean confidence, 0 when empty
    pub fn mean_confidence(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.confidences().map(f64::from).sum();
        sum / self.entries.len() as f64
    }
}
