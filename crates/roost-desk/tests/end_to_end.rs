//! End-to-end trade scenarios through the desk.
//!
//! Every test builds a fresh desk over an in-memory inventory and a manual
//! clock, so timeouts are exercised by advancing time rather than sleeping.

use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use roost_desk::{TradeDesk, spawn_janitor};
use roost_inventory::{InventoryStore, MemoryInventory};
use roost_types::*;

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);
const P3: PlayerId = PlayerId(3);
const P4: PlayerId = PlayerId(4);

struct World {
    desk: Arc<TradeDesk>,
    store: Arc<MemoryInventory>,
    clock: Arc<ManualClock>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn world_with(config: TradeConfig) -> World {
    init_tracing();
    let store = Arc::new(MemoryInventory::new());
    let clock = Arc::new(ManualClock::starting_now());
    let desk = TradeDesk::new(store.clone(), clock.clone(), config).unwrap();
    World {
        desk: Arc::new(desk),
        store,
        clock,
    }
}

fn world() -> World {
    world_with(TradeConfig::default())
}

fn give(world: &World, player: PlayerId, id: &str, kind: ItemKind) -> ItemRecord {
    let record = ItemRecord::dummy(id, kind);
    world.store.grant(player, record.clone()).unwrap();
    record
}

fn fingerprints(store: &MemoryInventory, players: &[PlayerId]) -> BTreeMap<[u8; 32], usize> {
    let mut counts = BTreeMap::new();
    for &player in players {
        for record in store.items(player) {
            *counts.entry(record.fingerprint()).or_insert(0) += 1;
        }
    }
    counts
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_egg_for_chicken() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let c1 = give(&w, P2, "C1", ItemKind::Chicken);
    let before = fingerprints(&w.store, &[P1, P2]);

    let s = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.add_item(s.id, P2, ItemKind::Chicken, &c1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();

    let locked = w.desk.request_lock(s.id, P2).unwrap();
    assert_eq!(locked.status, TradeStatus::Locked);
    assert!(locked.locked_item_ids.contains(&e1.id));
    assert!(locked.locked_item_ids.contains(&c1.id));

    let result = w.desk.execute(s.id, P1).unwrap();

    // P1 holds C1 under a new ID and no longer E1.
    assert!(!w.store.holds(P1, &e1.id, ItemKind::Egg));
    let got = &result.received_by(P1)[0];
    assert_ne!(got.id, c1.id);
    assert_eq!(got.fingerprint(), c1.fingerprint());
    assert!(w.store.holds(P1, &got.id, ItemKind::Chicken));

    // P2 holds E1 under a new ID and no longer C1.
    assert!(!w.store.holds(P2, &c1.id, ItemKind::Chicken));
    let got = &result.received_by(P2)[0];
    assert_ne!(got.id, e1.id);
    assert!(w.store.holds(P2, &got.id, ItemKind::Egg));

    assert_eq!(fingerprints(&w.store, &[P1, P2]), before);

    let done = w.desk.get_session(s.id).unwrap();
    assert_eq!(done.status, TradeStatus::Completed);
    assert!(done.locked_item_ids.is_empty());
    assert!(w.desk.active_session_for(P1).is_none());
    assert!(w.desk.active_session_for(P2).is_none());
}

#[test]
fn scenario_b_item_sold_before_lock() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);

    let s = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();

    // Sold through the market while P2 is still thinking.
    w.store.remove_item(P1, &e1.id, ItemKind::Egg).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();

    let err = w.desk.request_lock(s.id, P2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingItems);

    let after = w.desk.get_session(s.id).unwrap();
    assert_eq!(after.status, TradeStatus::Pending);
    assert!(after.locked_item_ids.is_empty());
    assert_eq!(w.desk.registry().locked_item_count(), 0);
}

#[test]
fn scenario_c_lock_window_elapses() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();
    w.desk.request_lock(s.id, P1).unwrap();

    w.clock.advance(secs(11));
    let err = w.desk.execute(s.id, P2).unwrap_err();
    assert!(matches!(
        err,
        TradeError::Expired {
            window: ExpiryWindow::Lock,
            ..
        }
    ));

    let after = w.desk.get_session(s.id).unwrap();
    assert_eq!(after.status, TradeStatus::Cancelled);
    assert!(after.locked_item_ids.is_empty());
    assert!(w.store.holds(P1, &e1.id, ItemKind::Egg));
    assert!(!w.desk.registry().is_item_globally_locked(&e1.id));
}

#[test]
fn scenario_d_duplicate_add() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();

    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    let err = w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ItemConflict);
    assert_eq!(w.desk.get_session(s.id).unwrap().offer_a.len(), 1);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn confirmation_reset_on_every_edit() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let e2 = give(&w, P1, "E2", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();

    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();

    let after_add = w.desk.add_item(s.id, P1, ItemKind::Egg, &e2.id).unwrap();
    assert!(!after_add.offer_a.is_confirmed());
    assert!(after_add.offer_b.is_confirmed(), "partner mark untouched");

    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.remove_item(s.id, P1, &e1.id).unwrap();
    assert!(!w.desk.get_session(s.id).unwrap().offer_a.is_confirmed());

    let err = w.desk.request_lock(s.id, P1).unwrap_err();
    assert!(matches!(err, TradeError::NotConfirmed { waiting_on } if waiting_on == vec![P1]));
}

#[test]
fn lock_exclusivity_across_sessions() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s1 = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s1.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s1.id, P1, true).unwrap();
    w.desk.set_confirmation(s1.id, P2, true).unwrap();
    w.desk.request_lock(s1.id, P1).unwrap();

    // Same ID shows up in another player's inventory (e.g. a replayed grant).
    w.store.grant(P3, e1.clone()).unwrap();
    let s2 = w.desk.request_trade(P3, P4).unwrap();
    let err = w.desk.add_item(s2.id, P3, ItemKind::Egg, &e1.id).unwrap_err();
    assert!(matches!(err, TradeError::ItemLocked { session, .. } if session == s1.id));
    assert!(w.desk.get_session(s2.id).unwrap().offer_a.is_empty());
}

#[test]
fn idempotent_disconnect() {
    let w = world();
    let s = w.desk.request_trade(P1, P2).unwrap();

    let first = w.desk.on_disconnect(P2).unwrap().unwrap();
    assert_eq!(first.id, s.id);
    assert_eq!(first.cancel_reason, Some(CancelReason::Disconnect(P2)));

    assert!(w.desk.on_disconnect(P2).unwrap().is_none());
    assert!(w.desk.on_disconnect(P1).unwrap().is_none());
    assert!(w.desk.on_disconnect(P3).unwrap().is_none());
    assert_eq!(
        w.desk.get_session(s.id).unwrap().cancel_reason,
        Some(CancelReason::Disconnect(P2))
    );

    // Both are free to trade again.
    assert!(w.desk.request_trade(P1, P2).is_ok());
}

#[test]
fn disconnect_releases_locked_items() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();
    w.desk.request_lock(s.id, P2).unwrap();

    w.desk.on_disconnect(P1).unwrap();
    assert_eq!(w.desk.registry().locked_item_count(), 0);
    assert!(w.store.holds(P1, &e1.id, ItemKind::Egg));
}

#[test]
fn timeout_correctness() {
    let w = world();
    let s = w.desk.request_trade(P1, P2).unwrap();

    w.clock.advance(secs(300));
    assert!(w.desk.sweep().is_empty(), "exactly at the limit is not expired");

    w.clock.advance(Duration::from_millis(1));
    let report = w.desk.sweep();
    assert_eq!(report.expired_pending, 1);
    assert!(w.desk.active_session_for(P1).is_none());
    assert!(w.desk.active_session_for(P2).is_none());
    assert_eq!(w.desk.get_session(s.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn operations_after_expiry_fail() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();
    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    w.desk.set_confirmation(s.id, P1, true).unwrap();
    w.desk.set_confirmation(s.id, P2, true).unwrap();

    w.clock.advance(secs(301));
    let err = w.desk.request_lock(s.id, P1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);
}

#[test]
fn concurrent_duplicate_adds_admit_one() {
    let w = world();
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let desk = Arc::clone(&w.desk);
            let barrier = Arc::clone(&barrier);
            let id = e1.id.clone();
            thread::spawn(move || {
                barrier.wait();
                desk.add_item(s.id, P1, ItemKind::Egg, &id).is_ok()
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(w.desk.get_session(s.id).unwrap().offer_a.len(), 1);
}

#[test]
fn independent_sessions_trade_in_parallel() {
    let w = world();
    let pairs: Vec<(PlayerId, PlayerId)> = (0..6u64)
        .map(|i| (PlayerId(100 + 2 * i), PlayerId(101 + 2 * i)))
        .collect();
    for &(a, b) in &pairs {
        give(&w, a, &format!("egg-{}", a.0), ItemKind::Egg);
        give(&w, b, &format!("hen-{}", b.0), ItemKind::Chicken);
    }
    let everyone: Vec<PlayerId> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
    let before = fingerprints(&w.store, &everyone);

    let handles: Vec<_> = pairs
        .iter()
        .map(|&(a, b)| {
            let desk = Arc::clone(&w.desk);
            thread::spawn(move || {
                let s = desk.request_trade(a, b).unwrap();
                desk.add_item(s.id, a, ItemKind::Egg, &ItemId::new(format!("egg-{}", a.0)))
                    .unwrap();
                desk.add_item(s.id, b, ItemKind::Chicken, &ItemId::new(format!("hen-{}", b.0)))
                    .unwrap();
                desk.set_confirmation(s.id, a, true).unwrap();
                desk.set_confirmation(s.id, b, true).unwrap();
                desk.request_lock(s.id, a).unwrap();
                desk.execute(s.id, b).unwrap()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap().items_moved(), 2);
    }
    assert_eq!(fingerprints(&w.store, &everyone), before);
    assert_eq!(w.desk.registry().locked_item_count(), 0);
}

// ---------------------------------------------------------------------------
// Configuration & background janitor
// ---------------------------------------------------------------------------

#[test]
fn config_from_json_drives_limits() {
    let cfg = TradeConfig::from_json(r#"{ "max_items_per_offer": 1 }"#).unwrap();
    let w = world_with(cfg);
    let e1 = give(&w, P1, "E1", ItemKind::Egg);
    let e2 = give(&w, P1, "E2", ItemKind::Egg);
    let s = w.desk.request_trade(P1, P2).unwrap();

    w.desk.add_item(s.id, P1, ItemKind::Egg, &e1.id).unwrap();
    let err = w.desk.add_item(s.id, P1, ItemKind::Egg, &e2.id).unwrap_err();
    assert!(matches!(err, TradeError::OfferFull { limit: 1 }));
}

#[tokio::test]
async fn background_janitor_expires_sessions() {
    let cfg = TradeConfig {
        sweep_interval: Duration::from_millis(10),
        ..TradeConfig::default()
    };
    let w = world_with(cfg);
    let s = w.desk.request_trade(P1, P2).unwrap();
    let handle = spawn_janitor(Arc::clone(&w.desk));

    w.clock.advance(secs(301));
    let mut gone = false;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if w.desk.registry().get(s.id).is_none() {
            gone = true;
            break;
        }
    }
    handle.shutdown().await;

    assert!(gone, "janitor never removed the expired session");
    assert!(w.desk.active_session_for(P1).is_none());
    assert!(w.desk.request_trade(P1, P2).is_ok());
}
