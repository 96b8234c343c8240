use grail_core::catalog::{CatalogLoader, catalog};
use grail_core::recognize;
use grail_core::scores::score_table;
use grail_core::stats::{progress, reduce};
use grail_core::{COMPLETION_SCORE_TARGET, GrailMode, GrailStats, ItemRecord, PlayerTree};
use serde_json::Value;

fn fully_found(mode: GrailMode) -> PlayerTree {
    catalog(mode)
        .slots()
        .into_iter()
        .map(|slot| (slot, ItemRecord::found()))
        .collect()
}

#[test]
fn bundled_catalogs_have_expected_slot_counts() {
    let holy = catalog(GrailMode::Holy);
    let counts: Vec<(&str, usize)> = holy
        .categories()
        .iter()
        .map(|def| (def.key.as_str(), holy.slots_under(&def.path).len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("uniqueArmor", 123),
            ("uniqueWeapons", 197),
            ("uniqueOther", 59),
            ("sets", 127),
            ("runes", 33),
        ]
    );
    assert_eq!(holy.slot_count(), 539);
    assert_eq!(catalog(GrailMode::Eth).slot_count(), 347);
    assert_eq!(catalog(GrailMode::Runeword).slot_count(), 92);
    for mode in GrailMode::ALL {
        assert_eq!(catalog(mode).mode(), mode);
        assert_eq!(catalog(mode).version(), "2.6.0");
    }
}

#[test]
fn complete_holy_grail_scores_the_target() {
    let tree = fully_found(GrailMode::Holy);
    let stats = reduce(
        catalog(GrailMode::Holy),
        Some(&tree),
        score_table(GrailMode::Holy),
    );
    assert_eq!(stats.item_score, COMPLETION_SCORE_TARGET);
    assert_eq!(stats.total_missing(), 0);
    for (_, category) in &stats.categories {
        assert!(category.found_bits.bytes().all(|b| b == b'1'));
    }
}

#[test]
fn unweighted_modes_score_zero() {
    for mode in [GrailMode::Eth, GrailMode::Runeword] {
        let tree = fully_found(mode);
        let stats = reduce(catalog(mode), Some(&tree), score_table(mode));
        assert_eq!(stats.item_score, 0);
        assert_eq!(stats.total_missing(), 0);
    }
}

#[test]
fn absent_and_empty_trees_reduce_to_unfound() {
    for mode in GrailMode::ALL {
        let catalog = catalog(mode);
        let absent = reduce(catalog, None, score_table(mode));
        let empty = reduce(catalog, Some(&PlayerTree::new()), score_table(mode));
        assert_eq!(absent, GrailStats::unfound(catalog));
        assert_eq!(absent, empty);
        assert_eq!(absent.total_missing(), catalog.slot_count());
        for (key, category) in &absent.categories {
            let def = catalog.category(key).unwrap();
            let slots = catalog.slots_under(&def.path).len();
            assert_eq!(category.found_bits.len(), slots);
            assert_eq!(category.item_scores, vec![0; slots]);
        }
    }
}

#[test]
fn template_round_trips_through_the_recognizer() {
    for mode in GrailMode::ALL {
        let catalog = catalog(mode);
        let template = catalog.template_value();
        let mut leaves = 0;
        recognize::visit_items(&template, &mut |_, _| leaves += 1);
        assert_eq!(leaves, catalog.slot_count());
        assert!(PlayerTree::from_value(&template).is_empty());

        let found = fully_found(mode);
        let nested = found.to_nested(catalog);
        assert_eq!(PlayerTree::from_value(&nested), found);
    }
}

#[test]
fn progress_counts_perfect_items() {
    let catalog = catalog(GrailMode::Holy);
    let mut tree = PlayerTree::new();
    for slot in catalog.slots_under(&["runes".to_string()]).into_iter().take(3) {
        tree.set(
            slot,
            ItemRecord {
                was_found: true,
                is_perfect: true,
                note: String::new(),
            },
        );
    }
    let rows = progress(catalog, Some(&tree));
    let runes = rows.iter().find(|row| row.key == "runes").unwrap();
    assert_eq!((runes.total, runes.found, runes.perfects), (33, 3, 3));
    let sets = rows.iter().find(|row| row.key == "sets").unwrap();
    assert_eq!(sets.found, 0);
}

#[test]
fn stats_payload_keeps_category_order() {
    let stats = GrailStats::unfound(catalog(GrailMode::Holy));
    let value = serde_json::to_value(&stats).unwrap();
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec!["uniqueArmor", "uniqueWeapons", "uniqueOther", "sets", "runes", "itemScore"]
    );
    assert_eq!(value["runes"]["missing"], Value::from(33));
    let back: GrailStats = serde_json::from_value(value).unwrap();
    assert_eq!(back, stats);
}

#[test]
fn fingerprints_identify_slot_order() {
    let holy = catalog(GrailMode::Holy);
    let reloaded = grail_core::StaticCatalogs
        .load_catalog(GrailMode::Holy)
        .unwrap();
    assert_eq!(holy.fingerprint(), reloaded.fingerprint());
    assert_ne!(
        holy.fingerprint(),
        catalog(GrailMode::Eth).fingerprint()
    );
}
