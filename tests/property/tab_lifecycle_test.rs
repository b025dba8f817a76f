//! Property-based tests for the tab lifecycle.
//!
//! For any interleaving of selections, evictions, clock jumps and timer
//! firings, the tab manager must keep these invariants:
//! - the selected tab stays materialized once it was selected;
//! - every materialized tab has an access record;
//! - each tab has at most one live surface, and only materialized tabs have one.

#[path = "../common/mod.rs"]
mod common;

use chatgate::managers::tab_manager::TabManagerTrait;
use chatgate::types::tab::TabKind;
use common::Harness;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Select(TabKind),
    Evict(TabKind),
    Advance(i64),
    FireTimers,
}

fn arb_tab() -> impl Strategy<Value = TabKind> {
    prop_oneof![
        Just(TabKind::Chat),
        Just(TabKind::Video),
        Just(TabKind::Translate),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => arb_tab().prop_map(Op::Select),
            2 => arb_tab().prop_map(Op::Evict),
            2 => (0..4000i64).prop_map(Op::Advance),
            2 => Just(Op::FireTimers),
        ],
        1..60,
    )
}

fn check_invariants(h: &Harness, selected_once: bool) -> Result<(), TestCaseError> {
    let materialized = h.tabs.materialized_tabs();
    if selected_once {
        prop_assert!(materialized.contains(&h.tabs.selected()));
    }
    for tab in &materialized {
        prop_assert!(h.tabs.tracker().is_tracked(*tab), "{} is not tracked", tab);
    }
    for tab in TabKind::ALL {
        let live = h
            .host
            .all(tab)
            .iter()
            .filter(|probe| !probe.detached.get())
            .count();
        let expected = usize::from(materialized.contains(&tab));
        prop_assert_eq!(live, expected, "live surfaces for {}", tab);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lifecycle_invariants_hold(ops in arb_ops()) {
        let mut h = Harness::new();
        let mut selected_once = false;

        for op in ops {
            match op {
                Op::Select(tab) => {
                    h.select(tab);
                    selected_once = true;
                }
                Op::Evict(tab) => h.tabs.evict(tab),
                Op::Advance(secs) => h.clock.advance(secs),
                Op::FireTimers => {
                    h.fire_timers();
                }
            }
            check_invariants(&h, selected_once)?;
        }

        h.tabs.shutdown();
        prop_assert_eq!(h.scheduler.active_count(), 0);
    }

    #[test]
    fn selected_tab_survives_any_idle_time(tab in arb_tab(), idle in 1800i64..1_000_000) {
        let mut h = Harness::new();
        h.select(tab);
        h.clock.advance(idle);
        h.fire_timers();
        h.fire_timers();

        prop_assert_eq!(h.tabs.materialized_tabs(), vec![tab]);
        prop_assert!(h.tabs.tracker().is_tracked(tab));
    }
}
