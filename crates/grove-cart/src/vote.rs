//! Majority voting over class labels.

/// Vote counts per distinct label, ordered by ascending label.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteTally {
    counts: Vec<(f64, usize)>,
}

impl VoteTally {
    /// Count occurrences of each distinct label.
    pub fn from_labels(labels: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = labels.into_iter().collect();
        sorted.sort_unstable_by(f64::total_cmp);

        let mut counts: Vec<(f64, usize)> = Vec::new();
        for label in sorted {
            match counts.last_mut() {
                Some((last, n)) if *last == label => *n += 1,
                _ => counts.push((label, 1)),
            }
        }
        Self { counts }
    }

    /// The most frequent label; the lowest label wins a tie.
    ///
    /// Returns `None` when no votes were cast.
    #[must_use]
    pub fn winner(&self) -> Option<f64> {
        let mut best: Option<(f64, usize)> = None;
        for &(label, n) in &self.counts {
            // Ascending label order, so only a strictly larger count replaces.
            if best.is_none_or(|(_, best_n)| n > best_n) {
                best = Some((label, n));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Number of votes for `label`.
    #[must_use]
    pub fn count(&self, label: f64) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |&(_, n)| n)
    }

    /// Total number of votes cast.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().map(|&(_, n)| n).sum()
    }

    /// `(label, votes)` pairs by ascending label.
    #[must_use]
    pub fn as_slice(&self) -> &[(f64, usize)] {
        &self.counts
    }
}

/// Return the most frequent label, breaking ties toward the lowest label.
///
/// Returns `None` for an empty input.
#[must_use]
pub fn majority(labels: impl IntoIterator<Item = f64>) -> Option<f64> {
    VoteTally::from_labels(labels).winner()
}
