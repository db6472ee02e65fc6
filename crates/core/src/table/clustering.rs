//! Tolerance-based grouping of positioned objects.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

type KeyF64 = OrderedFloat<f64>;

fn key_f64(v: f64) -> KeyF64 {
    OrderedFloat(v)
}

/// Group objects whose key lies within `tolerance` of a group's anchor.
///
/// The first object of a group fixes its anchor; later objects join the
/// group with the closest anchor in range or start a new one. Anchors are
/// therefore always more than `tolerance` apart. Groups are returned in
/// anchor order, members in input order.
pub fn cluster_by_anchor<T: Clone, F: Fn(&T) -> f64>(
    xs: &[T],
    key_fn: F,
    tolerance: f64,
) -> Vec<Vec<T>> {
    let tolerance = tolerance.max(0.0);
    let mut groups: BTreeMap<KeyF64, Vec<T>> = BTreeMap::new();
    for x in xs {
        let v = key_fn(x);
        if !v.is_finite() {
            continue;
        }
        let anchor = groups
            .range(key_f64(v - tolerance)..=key_f64(v + tolerance))
            .map(|(k, _)| *k)
            .min_by(|a, b| (a.0 - v).abs().total_cmp(&(b.0 - v).abs()));
        groups
            .entry(anchor.unwrap_or(key_f64(v)))
            .or_default()
            .push(x.clone());
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_within_tolerance_of_anchor() {
        let ys = vec![100.0, 112.0, 40.0, 126.0, 45.0, 200.0];
        let groups = cluster_by_anchor(&ys, |v| *v, 15.0);
        assert_eq!(
            groups,
            vec![vec![40.0, 45.0], vec![100.0, 112.0], vec![126.0], vec![200.0]]
        );
    }

    #[test]
    fn zero_tolerance_groups_equal_keys_only() {
        let ys = vec![3.0, 3.0, 4.0];
        let groups = cluster_by_anchor(&ys, |v| *v, 0.0);
        assert_eq!(groups, vec![vec![3.0, 3.0], vec![4.0]]);
    }

    #[test]
    fn non_finite_keys_are_skipped() {
        let ys = vec![f64::NAN, 1.0];
        assert_eq!(cluster_by_anchor(&ys, |v| *v, 5.0), vec![vec![1.0]]);
    }
}
