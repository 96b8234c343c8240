use std::sync::Barrier;
use std::thread;

use grail_core::{
    AccountStore, GrailConfig, GrailEngine, GrailError, GrailMode, ItemPath, ItemRecord,
    JsonDirStore, MemoryStore, NewAccount,
};

fn race_one_token<S: AccountStore>(engine: &GrailEngine<S>, round: usize) {
    let created = engine
        .create_account(NewAccount::new(format!("bob{round}"), "pw"))
        .unwrap();
    let address = created.address.to_string();
    let barrier = Barrier::new(2);
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ["runes/Ber", "runes/Jah"]
            .into_iter()
            .map(|path| {
                let (barrier, token, address) = (&barrier, &created.token, &address);
                scope.spawn(move || {
                    barrier.wait();
                    engine.update_item(
                        address,
                        "pw",
                        token,
                        GrailMode::Holy,
                        ItemPath::parse(path),
                        ItemRecord::found(),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "round {round}");
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(loser.is_retryable());
    assert_eq!(loser.current_token(), Some(&winners[0].token));

    let stored = engine.get(&address).unwrap();
    assert_eq!(stored.update_count, 1);
    assert_eq!(stored.token, winners[0].token);
    assert_eq!(stored.trees.holy.as_ref().map(|t| t.found_count()), Some(1));
}

#[test]
fn racing_writers_with_one_token_have_one_winner() {
    for round in 0..32 {
        let engine = GrailEngine::new(MemoryStore::new(), GrailConfig::default());
        race_one_token(&engine, round);
    }
}

#[test]
fn json_dir_store_races_have_one_winner() {
    let dir = std::env::temp_dir().join(format!(
        "grail-race-{}-{}",
        std::process::id(),
        rand::random::<u32>()
    ));
    let store = JsonDirStore::open(&dir).unwrap();
    let engine = GrailEngine::new(store, GrailConfig::default());
    for round in 0..16 {
        race_one_token(&engine, round);
    }
    assert_eq!(engine.store().all().unwrap().len(), 16);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn loser_can_retry_with_the_reported_token() {
    let engine = GrailEngine::new(MemoryStore::new(), GrailConfig::default());
    let created = engine
        .create_account(NewAccount::new("bob", "pw"))
        .unwrap();
    let ber = ItemPath::parse("runes/Ber");
    engine
        .update_item("bob", "pw", &created.token, GrailMode::Holy, ber.clone(), ItemRecord::found())
        .unwrap();

    let jah = ItemPath::parse("runes/Jah");
    let err = engine
        .update_item("bob", "pw", &created.token, GrailMode::Holy, jah.clone(), ItemRecord::found())
        .unwrap_err();
    let GrailError::StaleToken { current, specified, .. } = err.clone() else {
        panic!("expected a stale token, got {err:?}");
    };
    assert_eq!(specified, created.token);

    let view = engine
        .update_item("bob", "pw", &current, GrailMode::Holy, jah.clone(), ItemRecord::found())
        .unwrap();
    let holy = view.trees.holy.unwrap();
    assert!(holy.get(&ber).was_found && holy.get(&jah).was_found);
    assert_eq!(view.update_count, 2);
}

#[test]
fn many_threads_serialize_their_writes() {
    let engine = GrailEngine::new(MemoryStore::new(), GrailConfig::default());
    engine
        .create_account(NewAccount::new("bob", "pw"))
        .unwrap();
    let runes: Vec<ItemPath> = engine
        .catalog(GrailMode::Holy)
        .slots_under(&["runes".to_string()]);

    thread::scope(|scope| {
        for rune in &runes {
            let engine = &engine;
            scope.spawn(move || {
                loop {
                    let token = engine.get("bob").unwrap().token;
                    match engine.update_item(
                        "bob",
                        "pw",
                        &token,
                        GrailMode::Holy,
                        rune.clone(),
                        ItemRecord::found(),
                    ) {
                        Ok(_) => break,
                        Err(err) if err.is_retryable() => {}
                        Err(err) => panic!("{err}"),
                    }
                }
            });
        }
    });

    let view = engine.get("bob").unwrap();
    assert_eq!(view.update_count, runes.len() as u64);
    let stats = engine.stats("bob", GrailMode::Holy).unwrap();
    assert_eq!(stats.category("runes").unwrap().missing, 0);
}
