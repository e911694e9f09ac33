//! Property-based invariant tests for distribution and placement.
//!
//! 1. An equal split reconstructs the viewport width.
//! 2. A proportional split scales every natural width by the same factor.
//! 3. `Fill` placement reproduces the natural content width.
//! 4. Adjacent items of a section are separated by exactly the spacing.
//! 5. Self-measurement keeps that spacing for every trailing item.
//! 6. Section and row sequences are sorted and de-duplicated.
//! 7. The decision agrees with the aggregate widths it was made from.

use std::collections::BTreeSet;

use distrow_layout::{
    Distribution, DistributionEngine, ItemKey, LayoutConfig, Rect, preferred_distribution,
};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn widths_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(
        prop::collection::vec((1u32..=400).prop_map(f64::from), 1..6),
        1..5,
    )
}

fn engine_with(widths: &[Vec<f64>]) -> DistributionEngine {
    let mut engine = DistributionEngine::new(LayoutConfig::default());
    let keys: Vec<ItemKey> = widths
        .iter()
        .enumerate()
        .flat_map(|(section, row_widths)| {
            (0..row_widths.len()).map(move |row| ItemKey::new(section, row))
        })
        .collect();
    engine.seed(keys, 100.0);
    for (section, row_widths) in widths.iter().enumerate() {
        for (row, width) in row_widths.iter().enumerate() {
            let key = ItemKey::new(section, row);
            let frame = engine.store().get(key).unwrap().frame;
            engine.remeasure(key, frame, Rect { width: *width, ..frame });
        }
    }
    engine
}

/// Insets and spacing the viewport must cover before items get any width.
fn gutters(widths: &[Vec<f64>]) -> f64 {
    let config = LayoutConfig::default();
    widths
        .iter()
        .map(|row| {
            config.section_inset.horizontal_sum() + config.item_spacing * (row.len() - 1) as f64
        })
        .sum()
}

fn assert_spacing(engine: &DistributionEngine) -> Result<(), TestCaseError> {
    let spacing = engine.config().item_spacing;
    let records: Vec<_> = engine.store().iter().collect();
    for pair in records.windows(2) {
        let ((a_key, a), (b_key, b)) = (pair[0], pair[1]);
        if a_key.section == b_key.section {
            prop_assert!((a.frame.right() + spacing - b.frame.x).abs() < EPS);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn equal_split_spans_viewport(widths in widths_strategy(), extra in 1u32..4000) {
        let viewport = gutters(&widths) + f64::from(extra);
        let mut engine = engine_with(&widths);
        engine.place(Distribution::FillEqually, viewport);
        prop_assert!((engine.content_size(false).width - viewport).abs() < EPS);

        let equal = engine.equal_item_width(viewport);
        for (_, attrs) in engine.store().iter() {
            prop_assert!((attrs.frame.width - equal).abs() < EPS);
        }
    }

    #[test]
    fn proportional_split_preserves_ratio(widths in widths_strategy(), extra in 1u32..4000) {
        let viewport = gutters(&widths) + f64::from(extra);
        let total: f64 = widths.iter().flatten().sum();
        let scale = f64::from(extra) / total;

        let mut engine = engine_with(&widths);
        engine.place(Distribution::FillProportionally, viewport);
        prop_assert!((engine.content_size(false).width - viewport).abs() < 1e-4);
        for (_, attrs) in engine.store().iter() {
            let natural = attrs.intrinsic_width.unwrap();
            prop_assert!((attrs.frame.width - natural * scale).abs() < 1e-6);
        }
    }

    #[test]
    fn fill_reproduces_natural_content(widths in widths_strategy()) {
        let mut engine = engine_with(&widths);
        engine.place(Distribution::Fill, 1.0);
        let natural = engine.content_size(true).width;
        prop_assert_eq!(engine.content_size(false).width, natural);
        prop_assert_eq!(
            natural,
            gutters(&widths) + widths.iter().flatten().sum::<f64>()
        );
    }

    #[test]
    fn sweep_separates_items_by_spacing(
        widths in widths_strategy(),
        viewport in 1u32..5000,
    ) {
        let mut engine = engine_with(&widths);
        engine.update(f64::from(viewport));
        assert_spacing(&engine)?;
    }

    #[test]
    fn remeasure_keeps_spacing(
        widths in widths_strategy(),
        pick in any::<prop::sample::Index>(),
        new_width in 1u32..=400,
    ) {
        let mut engine = engine_with(&widths);
        engine.place(Distribution::Fill, 1.0);
        let keys: Vec<ItemKey> = engine.store().iter().map(|(key, _)| key).collect();
        let key = keys[pick.index(keys.len())];
        let frame = engine.store().get(key).unwrap().frame;
        let before = engine.content_size(false).width;

        let outcome = engine
            .remeasure(key, frame, Rect { width: f64::from(new_width), ..frame })
            .unwrap();
        assert_spacing(&engine)?;
        prop_assert!(
            (engine.content_size(false).width - (before - outcome.width_delta)).abs() < EPS
        );
    }

    #[test]
    fn sequences_sorted_and_unique(keys in prop::collection::vec((0usize..8, 0usize..8), 1..40)) {
        let mut engine = DistributionEngine::new(LayoutConfig::default());
        engine.seed(keys.iter().map(|&(section, row)| ItemKey::new(section, row)), 100.0);

        let sections: BTreeSet<usize> = keys.iter().map(|(section, _)| *section).collect();
        let expected: Vec<usize> = sections.iter().copied().collect();
        prop_assert_eq!(engine.section_sequence(), expected);

        for section in sections {
            let rows: BTreeSet<usize> = keys
                .iter()
                .filter(|(s, _)| *s == section)
                .map(|(_, row)| *row)
                .collect();
            let expected: Vec<usize> = rows.into_iter().collect();
            prop_assert_eq!(engine.row_sequence(section), expected);
        }
    }

    #[test]
    fn decision_agrees_with_aggregates(widths in widths_strategy(), viewport in 1u32..3000) {
        let viewport = f64::from(viewport);
        let mut engine = engine_with(&widths);
        let content = engine.content_size(true).width;
        let max = engine.max_item_width();
        let equal = engine.equal_item_width(viewport);

        let decided = engine.decide(viewport);
        prop_assert_eq!(decided, preferred_distribution(content, viewport, max, equal));
        match decided {
            Distribution::Fill => prop_assert!(content > viewport),
            Distribution::FillEqually => prop_assert!(content <= viewport && max <= equal),
            Distribution::FillProportionally => prop_assert!(content <= viewport && max > equal),
        }
    }
}
