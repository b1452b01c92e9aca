use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use semsim::cluster::{distance_matrix, jaccard, merge_redundant, score_sizes, Cluster};
use semsim::salience::SalienceEngine;
use semsim::{IdfTable, SquareMatrix, Term};

fn similarity_matrix() -> impl Strategy<Value = SquareMatrix> {
    (1usize..8).prop_flat_map(|n| {
        prop::collection::vec(0.0f64..=1.0, n * n).prop_map(move |vals| {
            let mut m = SquareMatrix::zeros(n);
            for i in 0..n {
                m.set(i, i, 1.0);
                for j in 0..i {
                    m.set(i, j, vals[i * n + j]);
                    m.set(j, i, vals[i * n + j]);
                }
            }
            m
        })
    })
}

fn clusters() -> impl Strategy<Value = Vec<Cluster>> {
    prop::collection::vec(prop::collection::btree_set(0usize..20, 1..8), 0..8)
}

fn hash_of(t: &Term) -> u64 {
    let mut h = DefaultHasher::new();
    t.hash(&mut h);
    h.finish()
}

proptest! {
    #[test]
    fn prop_distances_nonnegative_with_zero_diagonal(sim in similarity_matrix()) {
        let d = distance_matrix(&sim, 1e-6);
        for i in 0..d.len() {
            prop_assert_eq!(d.get(i, i), 0.0);
            for j in 0..d.len() {
                prop_assert!(d.get(i, j) >= 0.0);
                prop_assert!(d.get(i, j).is_finite());
            }
        }
    }

    #[test]
    fn prop_salience_in_unit_interval(
        docs in prop::collection::vec(prop::collection::vec("[a-e]{1,2}", 0..6), 1..10),
        global in prop::collection::vec(("[a-e]{1,2}", -2.0f64..3.0), 0..10),
    ) {
        let idf: IdfTable = global.into_iter().collect();
        let table = SalienceEngine::new(&idf).score(&docs);
        for terms in &docs {
            for t in terms {
                let s = table.salience(t).unwrap();
                prop_assert!((0.0..=1.0).contains(&s), "salience {} out of range", s);
            }
        }
    }

    #[test]
    fn prop_score_is_order_invariant(
        sizes in prop::collection::vec(1usize..50, 1..10),
        extra in 0usize..100,
    ) {
        let n = sizes.iter().sum::<usize>() + extra;
        let mut reversed = sizes.clone();
        reversed.reverse();
        let mut sorted = sizes.clone();
        sorted.sort();
        let a = score_sizes(&sizes, n);
        prop_assert!((a - score_sizes(&reversed, n)).abs() < 1e-9);
        prop_assert!((a - score_sizes(&sorted, n)).abs() < 1e-9);
        prop_assert!(a >= 0.0);
    }

    #[test]
    fn prop_merge_is_idempotent(input in clusters(), cutoff in 0.0f64..=1.0) {
        let once = merge_redundant(input, cutoff);
        let twice = merge_redundant(once.clone(), cutoff);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_output_is_not_redundant(input in clusters(), cutoff in 0.05f64..=1.0) {
        let merged = merge_redundant(input, cutoff);
        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                prop_assert!(jaccard(a, b) < cutoff);
            }
        }
    }

    #[test]
    fn prop_merge_boundaries(input in clusters()) {
        let all = merge_redundant(input.clone(), 0.0);
        prop_assert_eq!(all.len(), usize::from(!input.is_empty()));

        let exact = merge_redundant(input.clone(), 1.0);
        let distinct: BTreeSet<Cluster> = input.into_iter().collect();
        let got: BTreeSet<Cluster> = exact.iter().cloned().collect();
        prop_assert_eq!(exact.len(), distinct.len());
        prop_assert_eq!(got, distinct);
    }

    #[test]
    fn prop_term_identity_is_the_string(
        term in "[a-z ]{1,12}",
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        let t1 = Term::new(term.clone(), a, b, a);
        let t2 = Term::new(term, b, a, b);
        prop_assert_eq!(&t1, &t2);
        prop_assert_eq!(hash_of(&t1), hash_of(&t2));
    }
}
