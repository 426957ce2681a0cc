/**
 * Shift a blueprint's weight toward the categories the learner is weakest in.
 */
use std::collections::BTreeMap;

use super::bank::Category;
use super::persistence::CategoryStat;
use super::sampling::Blueprint;


pub const DEFAULT_BOOST: f64 = 0.35;
/// Accuracy assumed for a category that has never been attempted.
pub const PRIOR_ACCURACY: f64 = 0.75;


/// Return `base` with each weight scaled by `1 + boost * (1 - accuracy)` and the result
/// normalized to sum to 1.
pub fn build_adaptive_weights(
    base: &Blueprint,
    stats: &BTreeMap<Category, CategoryStat>,
    boost: f64,
) -> Blueprint {
    let adjusted: BTreeMap<Category, f64> = base
        .weights()
        .iter()
        .map(|(category, weight)| {
            let accuracy = stats
                .get(category)
                .and_then(|s| s.accuracy())
                .unwrap_or(PRIOR_ACCURACY);
            (*category, weight * (1.0 + boost * (1.0 - accuracy)))
        })
        .collect();

    let sum: f64 = adjusted.values().sum();
    let sum = if sum == 0.0 { 1.0 } else { sum };
    Blueprint::new(adjusted.into_iter().map(|(c, w)| (c, w / sum)).collect())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weaker_category_gets_more_weight() {
        let base = Blueprint::from_pairs(&[(Category::Alertness, 0.5), (Category::Attitude, 0.5)]);
        let mut stats = BTreeMap::new();
        stats.insert(Category::Alertness, CategoryStat { correct: 9, total: 10 });
        stats.insert(Category::Attitude, CategoryStat { correct: 3, total: 10 });

        let weights = build_adaptive_weights(&base, &stats, DEFAULT_BOOST);
        assert!(weights.weight(Category::Attitude) > weights.weight(Category::Alertness));
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unattempted_categories_use_prior() {
        let base = Blueprint::from_pairs(&[(Category::Alertness, 0.5), (Category::Attitude, 0.5)]);
        let mut stats = BTreeMap::new();
        stats.insert(Category::Alertness, CategoryStat { correct: 3, total: 4 });

        let weights = build_adaptive_weights(&base, &stats, DEFAULT_BOOST);
        assert!((weights.weight(Category::Alertness) - 0.5).abs() < 1e-9);
        assert!((weights.weight(Category::Attitude) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn uniform_blueprint_stays_normalized() {
        let mut stats = BTreeMap::new();
        for (i, c) in Category::ALL.iter().enumerate() {
            stats.insert(*c, CategoryStat { correct: i as u32, total: 13 });
        }
        let weights = build_adaptive_weights(&Blueprint::uniform(), &stats, 0.9);
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_blueprint_does_not_divide_by_zero() {
        let base = Blueprint::from_pairs(&[(Category::Alertness, 0.0), (Category::Attitude, 0.0)]);
        let weights = build_adaptive_weights(&base, &BTreeMap::new(), DEFAULT_BOOST);
        assert_eq!(weights.weight(Category::Alertness), 0.0);
        assert!(weights.weights().values().all(|w| w.is_finite()));
    }
}
