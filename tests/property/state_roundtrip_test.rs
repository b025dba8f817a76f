//! Property-based tests for persisted tab state and resume URLs.

use std::sync::Arc;

use chatgate::database::Database;
use chatgate::services::clock::ManualClock;
use chatgate::services::page_scripts::compose_resume_url;
use chatgate::services::state_store::{TabStateStore, TabStateStoreTrait};
use chatgate::types::tab::TabKind;
use proptest::prelude::*;
use tempfile::TempDir;
use url::Url;

fn arb_tab() -> impl Strategy<Value = TabKind> {
    prop_oneof![
        Just(TabKind::Chat),
        Just(TabKind::Video),
        Just(TabKind::Translate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any saved string comes back byte for byte after reopening the file.
    #[test]
    fn saved_values_survive_reopen(tab in arb_tab(), value in "\\PC{0,200}", now in 0i64..4_000_000_000) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");

        {
            let db = Arc::new(Database::open(&path).unwrap());
            let store = TabStateStore::new(db, Arc::new(ManualClock::new(now)));
            store.save(tab, &value).unwrap();
        }

        let db = Arc::new(Database::open(&path).unwrap());
        let store = TabStateStore::new(db, Arc::new(ManualClock::new(0)));
        prop_assert_eq!(store.load(tab).unwrap(), Some(value));
        let expected_saved_at = if tab.supports_resume() { Some(now) } else { None };
        prop_assert_eq!(store.saved_at(tab).unwrap(), expected_saved_at);
    }

    /// The resume URL carries exactly one `t` parameter and keeps the others.
    #[test]
    fn resume_url_has_single_offset(
        id in "[A-Za-z0-9_-]{1,16}",
        old in proptest::option::of(0u64..100_000),
        list in proptest::option::of("[A-Za-z0-9]{1,12}"),
        secs in 1u64..1_000_000,
    ) {
        let mut base = Url::parse("https://www.youtube.com/watch").unwrap();
        {
            let mut pairs = base.query_pairs_mut();
            if let Some(old) = old {
                pairs.append_pair("t", &format!("{}s", old));
            }
            pairs.append_pair("v", &id);
            if let Some(list) = &list {
                pairs.append_pair("list", list);
            }
        }

        let resumed = compose_resume_url(base.as_str(), secs).unwrap();
        let parsed = Url::parse(&resumed).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        let offsets: Vec<&String> = pairs.iter().filter(|(k, _)| k == "t").map(|(_, v)| v).collect();
        let expected = format!("{}s", secs);
        prop_assert_eq!(offsets, vec![&expected]);
        prop_assert!(pairs.contains(&("v".to_string(), id.clone())));
        if let Some(list) = list {
            prop_assert!(pairs.contains(&("list".to_string(), list)));
        }
        prop_assert_eq!(&pairs.last().unwrap().0, "t");
    }
}
