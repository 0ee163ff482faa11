//! Gini impurity of candidate partitions.

use crate::dataset::Dataset;
use crate::node::Impurity;

/// Gini impurity `1 - Σ(p_i²)` of a single group from its class counts.
///
/// Returns `0.0` for an empty group.
#[must_use]
pub fn group_impurity(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let purity: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - purity
}

/// Weighted Gini impurity of a partition of rows.
///
/// Each group contributes its own impurity weighted by
/// `group_size / total_rows`; empty groups contribute nothing. `classes`
/// is the set of labels present in the rows being partitioned.
#[must_use]
pub fn gini_index(dataset: &Dataset, groups: &[&[usize]], classes: &[f64]) -> Impurity {
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total == 0 {
        return Impurity::new(0.0);
    }

    let mut counts = vec![0usize; classes.len()];
    let mut score = 0.0;
    for group in groups {
        if group.is_empty() {
            continue;
        }
        counts.iter_mut().for_each(|c| *c = 0);
        for &row in group.iter() {
            let label = dataset.label(row);
            if let Some(k) = classes.iter().position(|&c| c == label) {
                counts[k] += 1;
            }
        }
        let weight = group.len() as f64 / total as f64;
        score += group_impurity(&counts, group.len()) * weight;
    }
    Impurity::new(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(labels: &[f64]) -> Dataset {
        Dataset::new(labels.iter().map(|&l| vec![0.0, l]).collect()).unwrap()
    }

    #[test]
    fn single_class_group_is_pure() {
        let ds = labelled(&[1.0, 1.0, 1.0]);
        let imp = gini_index(&ds, &[&[0, 1, 2]], &[1.0]);
        assert_eq!(imp.value(), 0.0);
    }

    #[test]
    fn even_two_class_group_is_half() {
        let ds = labelled(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let imp = gini_index(&ds, &[&[0, 1, 2, 3, 4, 5]], &[0.0, 1.0]);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn perfectly_separating_partition_is_zero() {
        let ds = labelled(&[0.0, 0.0, 1.0, 1.0]);
        let imp = gini_index(&ds, &[&[0, 1], &[2, 3]], &[0.0, 1.0]);
        assert_eq!(imp.value(), 0.0);
    }

    #[test]
    fn groups_are_weighted_by_size() {
        // left: [0, 1] -> 0.5 impurity, weight 2/4; right: [1, 1] -> pure.
        let ds = labelled(&[0.0, 1.0, 1.0, 1.0]);
        let imp = gini_index(&ds, &[&[0, 1], &[2, 3]], &[0.0, 1.0]);
        assert!((imp.value() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_group_is_skipped() {
        let ds = labelled(&[0.0, 1.0]);
        let imp = gini_index(&ds, &[&[], &[0, 1]], &[0.0, 1.0]);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
        assert_eq!(gini_index(&ds, &[&[], &[]], &[0.0, 1.0]).value(), 0.0);
    }

    #[test]
    fn three_class_uniform() {
        let imp = group_impurity(&[100, 100, 100], 300);
        assert!((imp - (1.0 - 3.0 * (1.0 / 3.0_f64).powi(2))).abs() < 1e-10);
    }
}
