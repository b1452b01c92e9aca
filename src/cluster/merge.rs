//! Consolidation of redundant clusters.
//!
//! Sweeping several eps values surfaces the same group of documents more than
//! once, usually with a few members more or less. Clusters whose Jaccard index
//! reaches a cutoff are unioned.

use super::dbscan::Cluster;

/// Default Jaccard cutoff above which two clusters are considered redundant.
pub const REDUNDANT_CUTOFF: f64 = 0.8;

/// `|a ∩ b| / |a ∪ b|`; two empty sets count as identical.
pub fn jaccard(a: &Cluster, b: &Cluster) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        1.0
    } else {
        inter as f64 / union as f64
    }
}

/// Merge clusters whose Jaccard index is at least `cutoff`.
///
/// Each pass pops the last cluster of the working list and looks for its
/// highest-Jaccard partner among the rest (earliest wins a tie). With a
/// partner, the union goes back on the list and is popped next; without one,
/// the cluster is final. Passes repeat until nothing merges, so no two
/// clusters in the output reach the cutoff.
///
/// The output is ordered by size (largest first), then by members.
pub fn merge_redundant(clusters: Vec<Cluster>, cutoff: f64) -> Vec<Cluster> {
    let mut current = clusters;
    loop {
        let (next, merges) = merge_pass(current, cutoff);
        current = next;
        if merges == 0 {
            break;
        }
    }
    current.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    current
}

fn merge_pass(mut candidates: Vec<Cluster>, cutoff: f64) -> (Vec<Cluster>, usize) {
    let mut processed = Vec::with_capacity(candidates.len());
    let mut merges = 0;

    while candidates.len() > 1 {
        let Some(c_i) = candidates.pop() else {
            break;
        };

        let mut best: Option<(usize, f64)> = None;
        for (j, c_j) in candidates.iter().enumerate() {
            let s = jaccard(&c_i, c_j);
            if s >= cutoff && best.map_or(true, |(_, b)| s > b) {
                best = Some((j, s));
            }
        }

        match best {
            None => processed.push(c_i),
            Some((j, _)) => {
                let c_j = candidates.remove(j);
                candidates.push(c_i.union(&c_j).copied().collect());
                merges += 1;
            }
        }
    }

    processed.append(&mut candidates);
    (processed, merges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ids: &[usize]) -> Cluster {
        ids.iter().copied().collect()
    }

    #[test]
    fn jaccard_basics() {
        assert_eq!(jaccard(&c(&[1, 2]), &c(&[1, 2])), 1.0);
        assert_eq!(jaccard(&c(&[1, 2]), &c(&[3, 4])), 0.0);
        assert!((jaccard(&c(&[1, 2, 3]), &c(&[2, 3, 4])) - 0.5).abs() < 1e-12);
        assert_eq!(jaccard(&c(&[]), &c(&[])), 1.0);
    }

    #[test]
    fn merges_near_duplicates_only() {
        let merged = merge_redundant(
            vec![
                c(&[0, 1, 2, 3, 4]),
                c(&[0, 1, 2, 3, 4, 5]),
                c(&[10, 11, 12]),
            ],
            0.8,
        );
        assert_eq!(merged, vec![c(&[0, 1, 2, 3, 4, 5]), c(&[10, 11, 12])]);
    }

    #[test]
    fn cutoff_one_merges_identical_sets() {
        let merged = merge_redundant(vec![c(&[1, 2, 3]), c(&[1, 2, 3]), c(&[1, 2, 3, 4])], 1.0);
        assert_eq!(merged, vec![c(&[1, 2, 3, 4]), c(&[1, 2, 3])]);
    }

    #[test]
    fn cutoff_zero_merges_everything() {
        let merged = merge_redundant(vec![c(&[1]), c(&[2, 3]), c(&[4, 5, 6])], 0.0);
        assert_eq!(merged, vec![c(&[1, 2, 3, 4, 5, 6])]);
    }

    #[test]
    fn prefers_highest_jaccard_partner() {
        // [0..5] overlaps both; [0..5] with [0..4] is the closer match.
        let merged = merge_redundant(
            vec![
                c(&[0, 1, 2, 3, 4]),
                c(&[1, 2, 3, 4, 5, 6]),
                c(&[0, 1, 2, 3, 4, 5]),
            ],
            0.7,
        );
        assert_eq!(merged, vec![c(&[0, 1, 2, 3, 4, 5, 6])]);
    }

    #[test]
    fn later_growth_triggers_another_pass() {
        // `a` is final after the first pop; `b ∪ c` then reaches the cutoff with it.
        let a = c(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let b = c(&[0, 1, 2, 3, 4, 5, 6, 7, 20]);
        let cc = c(&[1, 2, 3, 4, 5, 6, 7, 8, 20]);
        let merged = merge_redundant(vec![b, cc, a], 0.8);
        assert_eq!(merged, vec![c(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 20])]);
    }

    #[test]
    fn output_is_a_fixpoint() {
        let input = vec![
            c(&[0, 1, 2, 3]),
            c(&[0, 1, 2, 3, 4]),
            c(&[5, 6, 7]),
            c(&[5, 6, 7, 8, 9]),
            c(&[10, 11, 12]),
        ];
        let merged = merge_redundant(input, 0.8);
        assert_eq!(merge_redundant(merged.clone(), 0.8), merged);
        for (i, x) in merged.iter().enumerate() {
            for y in &merged[i + 1..] {
                assert!(jaccard(x, y) < 0.8);
            }
        }
    }

    #[test]
    fn empty_and_single_inputs() {
        assert!(merge_redundant(Vec::new(), 0.8).is_empty());
        assert_eq!(merge_redundant(vec![c(&[7])], 0.8), vec![c(&[7])]);
    }
}
