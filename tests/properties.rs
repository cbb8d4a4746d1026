// ABOUTME: Property tests for lifecycle and retention invariants.
// ABOUTME: Random operation sequences must never leave two running instances.

mod support;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use scon::engine::RetentionPolicy;
use scon::metadata::{SnapshotRecord, StatefulContainer};
use scon::types::{ImageId, ImageRef};
use support::{MockDriver, engine, image, name};

#[derive(Debug, Clone, Copy)]
enum Action {
    Start,
    Stop,
    Snapshot,
    Prune,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Start),
        Just(Action::Stop),
        Just(Action::Snapshot),
        Just(Action::Prune),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn at_most_one_instance_is_running(actions in prop::collection::vec(action(), 1..16)) {
        runtime().block_on(async {
            let (engine, _dir) = engine(RetentionPolicy::new(2, 30));
            let web = name("web");
            engine.create(&web, &image("nginx")).await.unwrap();

            for action in actions {
                // Errors are expected for invalid transitions; only the invariant matters.
                let _ = match action {
                    Action::Start => engine.start(&web).await.map(drop),
                    Action::Stop => engine.stop(&web).await.map(drop),
                    Action::Snapshot => engine.snapshot(&web, false).await.map(drop),
                    Action::Prune => engine.prune(Some(&web)).await.map(drop),
                };

                let sc = engine.get(&web).unwrap();
                assert!(sc.running_count() <= 1, "{sc:?}");
                assert!(engine.driver().running_count() <= 1);
                if let Some(next) = sc.next_snapshot_to_start.as_deref() {
                    assert!(sc.snapshot(next).is_some(), "dangling next: {next}");
                }
                assert!(sc.snapshots.windows(2).all(|w| w[0].created_at <= w[1].created_at));
            }
        });
    }

    #[test]
    fn retention_is_idempotent_and_respects_protection(
        snapshots in prop::collection::vec((0i64..120, any::<bool>()), 0..12),
        next in prop::option::of(0usize..12),
        max_snapshots in 0usize..6,
        retention_days in 0u32..60,
    ) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut sc = StatefulContainer::new(name("web"), &ImageRef::parse("nginx").unwrap(), now);
        // Oldest first, so timestamps are non-decreasing.
        let mut ages: Vec<_> = snapshots.clone();
        ages.sort_by(|a, b| b.0.cmp(&a.0));
        for (idx, (days, tagged)) in ages.iter().enumerate() {
            sc.snapshots.push(SnapshotRecord {
                name: format!("web:v{}", idx + 1),
                image_id: ImageId::new(format!("sha256:{idx}")),
                created_at: now - Duration::days(*days),
                tagged: *tagged,
            });
        }
        sc.next_snapshot_to_start = next
            .filter(|n| *n < sc.snapshots.len())
            .map(|n| sc.snapshots[n].name.clone());
        let protected: Vec<String> = sc
            .snapshots
            .iter()
            .filter(|s| s.tagged || Some(s.name.as_str()) == sc.next_snapshot_to_start.as_deref())
            .map(|s| s.name.clone())
            .collect();

        let policy = RetentionPolicy::new(max_snapshots, retention_days);
        let driver = MockDriver::new();
        let rt = runtime();

        let first = rt.block_on(policy.enforce(&mut sc, &driver, now));
        let after_first = sc.snapshots.clone();
        let second = rt.block_on(policy.enforce(&mut sc, &driver, now));

        prop_assert!(second.removed.is_empty());
        prop_assert_eq!(&sc.snapshots, &after_first);
        for name in &protected {
            prop_assert!(sc.snapshot(name).is_some(), "protected {} removed", name);
        }
        prop_assert!(first.failures.is_empty());

        let unprotected = sc
            .snapshots
            .iter()
            .filter(|s| !protected.contains(&s.name))
            .count();
        prop_assert!(unprotected <= max_snapshots);
    }
}
