use unfortunate_shared::Item;

use crate::rng::UniformSource;

/// Returns the first item whose running weight sum reaches `r`.
///
/// `None` for an empty list or when `r` lands in the unassigned gap past the
/// last item. Callers are expected to check full assignment first.
pub fn select(items: &[Item], r: f64) -> Option<(usize, &Item)> {
    let mut sum = 0.0;
    for (idx, item) in items.iter().enumerate() {
        sum += item.weight;
        if r <= sum {
            return Some((idx, item));
        }
    }
    None
}

/// Single uniform draw, then [`select`].
pub fn select_with<'a, R: UniformSource>(
    items: &'a [Item],
    rng: &mut R,
) -> Option<(usize, &'a Item)> {
    let r = rng.next_f64();
    select(items, r)
}

/// Like [`select`], but a draw inside the (tolerated) unassigned gap falls
/// back to the last item.
pub fn select_assigned(items: &[Item], r: f64) -> Option<(usize, &Item)> {
    select(items, r).or_else(|| items.last().map(|last| (items.len() - 1, last)))
}

/// Cumulative angle (rad) where each sector starts, in item order.
pub fn sector_starts(items: &[Item]) -> Vec<f64> {
    let mut acc = 0.0;
    items
        .iter()
        .map(|item| {
            let start = acc;
            acc += sector_span(item.weight);
            start
        })
        .collect()
}

pub fn sector_span(weight: f64) -> f64 {
    std::f64::consts::TAU * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    fn abc() -> Vec<Item> {
        vec![
            Item::new("A", 0.5),
            Item::new("B", 0.3),
            Item::new("C", 0.2),
        ]
    }

    #[test]
    fn picks_by_cumulative_weight() {
        let items = abc();
        assert_eq!(select(&items, 0.1).map(|(i, _)| i), Some(0));
        assert_eq!(select(&items, 0.6).map(|(i, _)| i), Some(1));
        assert_eq!(select(&items, 0.95).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn boundary_belongs_to_earlier_item() {
        let items = abc();
        assert_eq!(select(&items, 0.5).map(|(i, _)| i), Some(0));
        assert_eq!(select(&items, 0.0).map(|(i, _)| i), Some(0));
    }

    #[test]
    fn empty_and_gap_select_nothing() {
        assert!(select(&[], 0.3).is_none());
        let partial = vec![Item::new("A", 0.4)];
        assert!(select(&partial, 0.7).is_none());
        assert_eq!(select_assigned(&partial, 0.7).map(|(i, _)| i), Some(0));
        assert!(select_assigned(&[], 0.7).is_none());
    }

    #[test]
    fn select_with_uses_one_draw() {
        let items = abc();
        let mut rng = ScriptedSource::new(vec![0.6, 0.1]);
        let (idx, item) = select_with(&items, &mut rng).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(item.title, "B");
        let (idx, _) = select_with(&items, &mut rng).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn sector_starts_accumulate() {
        let starts = sector_starts(&abc());
        assert_eq!(starts.len(), 3);
        assert_eq!(starts[0], 0.0);
        assert!((starts[1] - std::f64::consts::PI).abs() < 1e-12);
        assert!((starts[2] - 0.8 * std::f64::consts::TAU).abs() < 1e-12);
    }
}
