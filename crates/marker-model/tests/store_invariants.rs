use std::cell::Cell;
use std::rc::Rc;

use labtrack_marker_model::{
    Calibration, CalibrationParams, FnListener, MarkerSample, MarkerStore, ModelError, Point2D,
    StoreEvent,
};
use proptest::prelude::*;

fn assert_strictly_ascending(store: &MarkerStore) {
    let samples = store.samples();
    for pair in samples.windows(2) {
        assert!(
            pair[0].run_id < pair[1].run_id,
            "run ids out of order: {} then {}",
            pair[0].run_id,
            pair[1].run_id
        );
    }
}

proptest! {
    #[test]
    fn inserts_keep_run_ids_strictly_ascending(run_ids in prop::collection::vec(-50i64..50, 0..60)) {
        let store = MarkerStore::new();
        let mut accepted = std::collections::BTreeSet::new();

        for run_id in run_ids {
            let before = store.samples();
            match store.insert(MarkerSample::new(run_id, run_id as f64, 0.0)) {
                Ok(index) => {
                    prop_assert!(accepted.insert(run_id));
                    prop_assert_eq!(store.run_id_at(index), Ok(run_id));
                }
                Err(ModelError::DuplicateKey { run_id: rejected }) => {
                    prop_assert_eq!(rejected, run_id);
                    prop_assert!(accepted.contains(&run_id));
                    prop_assert_eq!(store.samples(), before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            assert_strictly_ascending(&store);
        }

        prop_assert_eq!(store.len(), accepted.len());
    }

    #[test]
    fn removals_preserve_order(run_ids in prop::collection::btree_set(0i64..200, 1..40), picks in prop::collection::vec(0usize..64, 0..20)) {
        let store = MarkerStore::new();
        for run_id in &run_ids {
            store.insert(MarkerSample::new(*run_id, 0.0, 0.0)).unwrap();
        }

        for pick in picks {
            let len = store.len();
            let result = store.remove_at(pick);
            if pick < len {
                prop_assert!(result.is_ok());
                prop_assert_eq!(store.len(), len - 1);
            } else {
                prop_assert_eq!(result, Err(ModelError::OutOfRange { index: pick, len }));
                prop_assert_eq!(store.len(), len);
            }
            assert_strictly_ascending(&store);
        }
    }

    #[test]
    fn calibration_is_a_pure_function_of_state(
        ox in -1e3f64..1e3, oy in -1e3f64..1e3,
        sx in -10f64..10.0, sy in -10f64..10.0,
        px in -1e4f64..1e4, py in -1e4f64..1e4,
    ) {
        let calibration = Calibration::new(CalibrationParams::new(Point2D::new(ox, oy), sx, sy));
        let raw = Point2D::new(px, py);
        prop_assert_eq!(calibration.from_raw(raw), calibration.from_raw(raw));
        prop_assert_eq!(
            calibration.from_raw(raw),
            Point2D::new((px - ox) * sx, (py - oy) * sy)
        );
    }
}

#[test]
fn replacing_calibration_sends_only_all_changed() {
    let store = MarkerStore::new();
    for run_id in 0..10 {
        store
            .insert(MarkerSample::new(run_id, run_id as f64, 0.0))
            .unwrap();
    }

    let all_changed = Rc::new(Cell::new(0));
    let other = Rc::new(Cell::new(0));
    let listener = {
        let all_changed = all_changed.clone();
        let other = other.clone();
        Rc::new(FnListener::new(move |event: &StoreEvent| match event {
            StoreEvent::AllChanged => all_changed.set(all_changed.get() + 1),
            _ => other.set(other.get() + 1),
        }))
    };
    store.subscribe(&listener);

    store.set_calibration(Some(Rc::new(Calibration::default())));
    assert_eq!(all_changed.get(), 1);
    assert_eq!(other.get(), 0);
}

#[test]
fn dropped_store_listener_is_never_invoked() {
    let store = MarkerStore::new();
    let calls = Rc::new(Cell::new(0));
    let listener = {
        let calls = calls.clone();
        Rc::new(FnListener::new(move |_: &StoreEvent| calls.set(calls.get() + 1)))
    };
    store.subscribe(&listener);
    drop(listener);

    store.insert(MarkerSample::new(1, 0.0, 0.0)).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(store.subscriber_count(), 0);
}
