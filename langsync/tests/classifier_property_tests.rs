use langsync::classifier::{StatusUpdate, apply_updates, classify, completion_sweep};
use langsync::languages::TechnicalKeys;
use langsync::types::{Entry, EntryStatus, LocaleStore};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum TargetState {
    Missing,
    Same(Option<EntryStatus>),
    Different(Option<EntryStatus>),
}

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z][A-Za-z0-9]{0,10}(\\.Content)?").expect("valid key regex")
}

fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 ,!\\?]{1,20}").expect("valid value regex")
}

fn status_strategy() -> impl Strategy<Value = Option<EntryStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(EntryStatus::Complete)),
        Just(Some(EntryStatus::Incomplete)),
        Just(Some(EntryStatus::Error("timeout".to_string()))),
        Just(Some(EntryStatus::PermanentError(None))),
        Just(Some(EntryStatus::PermanentError(Some(
            "invalid destination language".to_string()
        )))),
    ]
}

fn target_state_strategy() -> impl Strategy<Value = TargetState> {
    prop_oneof![
        Just(TargetState::Missing),
        status_strategy().prop_map(TargetState::Same),
        status_strategy().prop_map(TargetState::Different),
    ]
}

fn dataset_strategy() -> impl Strategy<Value = BTreeMap<String, (String, TargetState, bool)>> {
    prop::collection::btree_map(
        key_strategy(),
        (value_strategy(), target_state_strategy(), prop::bool::weighted(0.2)),
        1..12,
    )
}

struct Fixture {
    reference: LocaleStore,
    target: LocaleStore,
    technical: TechnicalKeys,
}

fn build(dataset: &BTreeMap<String, (String, TargetState, bool)>) -> Fixture {
    let mut reference = LocaleStore::new("en-US");
    let mut target = LocaleStore::new("fr-FR");
    let mut technical = Vec::new();

    for (key, (value, state, is_technical)) in dataset {
        reference.add_entry(
            Entry::new(key.clone(), value.clone()).with_status(EntryStatus::Complete),
        );
        if *is_technical {
            technical.push(key.clone());
        }
        let entry = match state {
            TargetState::Missing => continue,
            TargetState::Same(status) => Entry {
                key: key.clone(),
                value: value.clone(),
                status: status.clone(),
            },
            TargetState::Different(status) => Entry {
                key: key.clone(),
                value: format!("{} (fr)", value),
                status: status.clone(),
            },
        };
        target.add_entry(entry);
    }

    Fixture {
        reference,
        target,
        technical: TechnicalKeys::new(technical),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn divergent_entries_end_complete_and_are_never_queued(dataset in dataset_strategy()) {
        let Fixture { reference, mut target, technical } = build(&dataset);
        let classification = classify(&reference, &target, &technical);
        apply_updates(&mut target, &classification.updates);

        for (key, (_, state, _)) in &dataset {
            if let TargetState::Different(_) = state {
                prop_assert!(classification.work.iter().all(|w| &w.key != key));
                prop_assert_eq!(
                    target.find_entry(key).unwrap().status.clone(),
                    Some(EntryStatus::Complete)
                );
            }
        }
    }

    #[test]
    fn technical_keys_are_complete_and_never_queued(dataset in dataset_strategy()) {
        let Fixture { reference, mut target, technical } = build(&dataset);
        let classification = classify(&reference, &target, &technical);
        apply_updates(&mut target, &classification.updates);

        for key in technical.iter() {
            prop_assert!(classification.work.iter().all(|w| w.key != key));
            prop_assert_eq!(
                target.find_entry(key).unwrap().status.clone(),
                Some(EntryStatus::Complete)
            );
        }
    }

    #[test]
    fn final_entries_with_reference_value_are_left_alone(dataset in dataset_strategy()) {
        let Fixture { reference, target, technical } = build(&dataset);
        let classification = classify(&reference, &target, &technical);

        for (key, (_, state, is_technical)) in &dataset {
            if *is_technical {
                continue;
            }
            if let TargetState::Same(Some(status)) = state {
                let queued = classification.work.iter().any(|w| &w.key == key);
                prop_assert_eq!(queued, !status.is_final());
                let touched = classification.updates.iter().any(|u| match u {
                    StatusUpdate::Mark { key: k, .. } | StatusUpdate::Insert { key: k, .. } => {
                        k == key
                    }
                });
                prop_assert!(!touched);
            }
        }
    }

    #[test]
    fn completion_sweep_is_idempotent(dataset in dataset_strategy()) {
        let Fixture { reference, mut target, technical } = build(&dataset);
        let classification = classify(&reference, &target, &technical);
        apply_updates(&mut target, &classification.updates);

        completion_sweep(&mut target, Some(&reference), &technical);
        prop_assert!(target.entries.iter().all(|e| e.status.is_some()));

        let snapshot = target.clone();
        prop_assert_eq!(completion_sweep(&mut target, Some(&reference), &technical), 0);
        prop_assert_eq!(target, snapshot);
    }
}
