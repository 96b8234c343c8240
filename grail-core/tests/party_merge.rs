use grail_core::catalog::catalog;
use grail_core::scores::score_table;
use grail_core::stats::reduce;
use grail_core::codec;
use grail_core::{
    CategoryStats, GrailMode, GrailStats, ItemPath, ItemRecord, Leaderboard, PlayerTree,
    SortKey, aggregate,
};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_tree(rng: &mut SmallRng, slots: &[ItemPath]) -> PlayerTree {
    let mut tree = PlayerTree::new();
    for slot in slots {
        match rng.gen_range(0..10) {
            0 => tree.set(slot.clone(), ItemRecord::found()),
            1 => tree.set(slot.clone(), ItemRecord::found().with_note("dropped in cows")),
            2 => tree.set(slot.clone(), ItemRecord::default().with_note("want this")),
            _ => {}
        }
    }
    tree
}

fn holy_stats(tree: Option<&PlayerTree>) -> GrailStats {
    reduce(
        catalog(GrailMode::Holy),
        tree,
        score_table(GrailMode::Holy),
    )
}

#[test]
fn merge_never_loses_a_found_item() {
    let slots = catalog(GrailMode::Holy).slots();
    let mut rng = SmallRng::seed_from_u64(0x6A11);
    for _ in 0..16 {
        let members: Vec<PlayerTree> = (0..rng.gen_range(1..5))
            .map(|_| random_tree(&mut rng, &slots))
            .collect();
        let party = aggregate(members.iter().map(Some));
        for member in &members {
            for (path, record) in member.iter() {
                let merged = party.get(path);
                assert!(merged.was_found || !record.was_found, "{path} lost");
                assert!(merged.note.contains(&record.note));
            }
        }
        let best = members.iter().map(PlayerTree::found_count).max().unwrap();
        assert!(party.found_count() >= best);
    }
}

#[test]
fn single_member_party_is_that_member() {
    let slots = catalog(GrailMode::Holy).slots();
    let mut rng = SmallRng::seed_from_u64(7);
    let tree = random_tree(&mut rng, &slots);
    assert_eq!(aggregate([Some(&tree)]), tree);
    assert_eq!(aggregate([None, Some(&tree), None]), tree);
}

#[test]
fn found_flags_do_not_depend_on_member_order() {
    let slots = catalog(GrailMode::Holy).slots();
    let mut rng = SmallRng::seed_from_u64(99);
    let mut members: Vec<PlayerTree> = (0..4).map(|_| random_tree(&mut rng, &slots)).collect();
    let forward = holy_stats(Some(&aggregate(members.iter().map(Some))));
    members.shuffle(&mut rng);
    let shuffled = holy_stats(Some(&aggregate(members.iter().map(Some))));
    assert_eq!(forward, shuffled);
}

#[test]
fn merged_vectors_match_the_codec_fold_of_member_vectors() {
    let slots = catalog(GrailMode::Holy).slots();
    let mut rng = SmallRng::seed_from_u64(0xBEEF);
    let members: Vec<PlayerTree> = (0..3).map(|_| random_tree(&mut rng, &slots)).collect();
    let merged = holy_stats(Some(&aggregate(members.iter().map(Some))));
    let each: Vec<GrailStats> = members.iter().map(|tree| holy_stats(Some(tree))).collect();

    for (key, party) in &merged.categories {
        let unfound = CategoryStats::unfound(party.len());
        let (bits, scores) = each.iter().fold(
            (unfound.found_bits, unfound.item_scores),
            |(bits, scores), stats| {
                let member = stats.category(key).unwrap();
                (
                    codec::union_bits(&bits, &member.found_bits),
                    codec::union_scores(&scores, &member.item_scores),
                )
            },
        );
        assert_eq!(party.found_bits, bits, "{key}");
        assert_eq!(party.item_scores, scores, "{key}");
        assert_eq!(party.missing, codec::count_missing(&bits));
    }

    let board = Leaderboard::build(
        catalog(GrailMode::Holy),
        each.into_iter()
            .enumerate()
            .map(|(i, stats)| (format!("member{i}"), Some(stats))),
        &merged,
        SortKey::Total,
    );
    assert_eq!(board.totals.total, merged.total_missing());
    assert_eq!(board.totals.item_score, merged.item_score);
}

#[test]
fn notes_from_two_members_are_joined() {
    let ber = ItemPath::parse("runes/Ber");
    let mut bob = PlayerTree::new();
    bob.set(ber.clone(), ItemRecord::found().with_note("Found by Bob"));
    let mut alice = PlayerTree::new();
    alice.set(ber.clone(), ItemRecord::found().with_note("Also found by Alice"));
    let party = aggregate([Some(&bob), Some(&alice)]);
    assert_eq!(party.get(&ber).note, "Found by Bob --- Also found by Alice");
    assert!(party.get(&ber).was_found);
}

#[test]
fn split_facets_score_separately_in_a_party() {
    let die = ItemPath::parse("uniques/other/rainbow facet (jewel)/die/Cold");
    let level = ItemPath::parse("uniques/other/rainbow facet (jewel)/level up/Cold");
    let mut bob = PlayerTree::new();
    bob.set(die.clone(), ItemRecord::found());
    let mut alice = PlayerTree::new();
    alice.set(level.clone(), ItemRecord::found());

    let party = aggregate([Some(&bob), Some(&alice)]);
    assert!(party.get(&die).was_found && party.get(&level).was_found);
    let stats = holy_stats(Some(&party));
    let other = stats.category("uniqueOther").unwrap();
    assert_eq!(other.found(), 2);
    assert_eq!(stats.item_score, 8);
}
