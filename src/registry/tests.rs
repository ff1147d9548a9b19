use super::*;
use crate::error::CcaError;
use crate::facade::{FacadeHandle, FacadeState};
use crate::mock::{MockEngineFactory, MockProbe};
use crate::types::{InitParams, TuningMode};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn create_test_registry() -> (EngineRegistry, Arc<MockProbe>) {
    let factory = MockEngineFactory::new();
    let probe = factory.probe();
    let registry = EngineRegistryBuilder::new().factory(factory).build().unwrap();
    (registry, probe)
}

#[test]
fn test_acquire_returns_same_facade() {
    let (registry, _probe) = create_test_registry();

    let first = registry.acquire(0, TuningMode::Video);
    let second = registry.acquire(0, TuningMode::Video);

    assert!(FacadeHandle::ptr_eq(&first, &second));
    assert_eq!(first.device_id(), 0);
    assert_eq!(first.tuning_mode(), TuningMode::Video);

    let stats = registry.stats();
    assert_eq!(stats.acquires, 2);
    assert_eq!(stats.facades_created, 1);
    assert_eq!(stats.facades, 1);
}

#[test]
fn test_distinct_pairs_get_distinct_facades() {
    let (registry, _probe) = create_test_registry();

    let video = registry.acquire(0, TuningMode::Video);
    let still = registry.acquire(0, TuningMode::StillCapture);
    let other_device = registry.acquire(1, TuningMode::Video);

    assert!(!FacadeHandle::ptr_eq(&video, &still));
    assert!(!FacadeHandle::ptr_eq(&video, &other_device));

    let stats = registry.stats();
    assert_eq!(stats.buckets, 2);
    assert_eq!(stats.facades, 3);
    assert_eq!(
        registry.device_modes(0),
        Some(vec![TuningMode::Video, TuningMode::StillCapture])
    );
}

#[test]
fn test_acquire_does_not_construct_engine() {
    let (registry, probe) = create_test_registry();

    let handle = registry.acquire(2, TuningMode::VideoUll);

    assert_eq!(handle.lock().state(), FacadeState::Unconstructed);
    assert_eq!(probe.constructed(), 0);
}

#[test]
fn test_release_then_acquire_creates_new_facade() {
    let (registry, probe) = create_test_registry();

    let first = registry.acquire(0, TuningMode::Video);
    first.lock().init(&InitParams::default()).unwrap();

    registry.release(0, TuningMode::Video);
    assert!(!registry.contains(0, TuningMode::Video));
    assert_eq!(probe.live(), 0);

    let second = registry.acquire(0, TuningMode::Video);
    assert!(!FacadeHandle::ptr_eq(&first, &second));
    assert_eq!(second.lock().state(), FacadeState::Unconstructed);

    second.lock().run_dvs(1).unwrap();
    assert_eq!(probe.constructed(), 2);
}

#[test]
fn test_release_does_not_deinit_engine() {
    let (registry, probe) = create_test_registry();

    registry
        .acquire(0, TuningMode::Video)
        .lock()
        .init(&InitParams::default())
        .unwrap();
    registry.release(0, TuningMode::Video);

    assert_eq!(probe.calls("deinit"), 0);
    assert_eq!(probe.dropped(), 1);
}

#[test]
fn test_stale_handle_after_release() {
    let (registry, probe) = create_test_registry();

    let stale = registry.acquire(3, TuningMode::VideoLl);
    registry.release(3, TuningMode::VideoLl);

    assert_eq!(stale.lock().state(), FacadeState::Released);
    let result = stale.lock().run_dvs(5);
    assert!(matches!(
        result,
        Err(CcaError::Released {
            device: 3,
            mode: TuningMode::VideoLl
        })
    ));
    assert_eq!(probe.constructed(), 0);
}

#[test]
fn test_release_unknown_pair_is_noop() {
    let (registry, _probe) = create_test_registry();
    let handle = registry.acquire(0, TuningMode::Video);

    registry.release(0, TuningMode::StillCapture);
    registry.release(9, TuningMode::Video);

    assert!(registry.contains(0, TuningMode::Video));
    assert_eq!(handle.lock().state(), FacadeState::Unconstructed);
    assert_eq!(registry.stats().facades_released, 0);
    assert_eq!(registry.device_modes(9), None);
}

#[test]
fn test_bucket_persists_after_last_release() {
    let (registry, _probe) = create_test_registry();

    registry.acquire(4, TuningMode::Video);
    registry.release(4, TuningMode::Video);

    assert_eq!(registry.device_modes(4), Some(Vec::new()));
    let stats = registry.stats();
    assert_eq!(stats.buckets, 1);
    assert_eq!(stats.facades, 0);
}

#[test]
fn test_release_all() {
    let (registry, probe) = create_test_registry();

    let mut before = Vec::new();
    for device in 0..3 {
        for mode in [TuningMode::Video, TuningMode::StillCapture] {
            let handle = registry.acquire(device, mode);
            handle.lock().init(&InitParams::default()).unwrap();
            before.push(handle);
        }
    }
    assert_eq!(probe.live(), 6);

    registry.release_all();

    let stats = registry.stats();
    assert_eq!(stats.facades, 0);
    assert_eq!(stats.buckets, 3);
    assert_eq!(stats.facades_released, 6);
    assert_eq!(probe.live(), 0);
    assert!(before
        .iter()
        .all(|h| h.lock().state() == FacadeState::Released));

    for old in &before {
        let fresh = registry.acquire(old.device_id(), old.tuning_mode());
        assert!(!FacadeHandle::ptr_eq(old, &fresh));
    }
}

#[test]
fn test_drop_releases_engines() {
    let (registry, probe) = create_test_registry();
    let handle = registry.acquire(0, TuningMode::Video);
    handle.lock().run_dvs(0).unwrap();

    drop(registry);

    assert_eq!(probe.live(), 0);
    assert_eq!(handle.lock().state(), FacadeState::Released);
}

#[test]
fn test_builder_requires_factory() {
    let result = EngineRegistryBuilder::new().build();

    match result {
        Err(CcaError::System { message }) => {
            assert!(message.contains("Engine factory must be specified"))
        }
        _ => panic!("Expected system error for missing factory"),
    }
}

#[test]
fn test_concurrent_acquire_no_duplicates() {
    let factory = MockEngineFactory::new();
    let probe = factory.probe();
    let registry = Arc::new(EngineRegistry::new(Arc::new(factory)));

    let pairs = [
        (0, TuningMode::Video),
        (0, TuningMode::StillCapture),
        (1, TuningMode::Video),
        (2, TuningMode::VideoUll),
    ];
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();

    for t in 0..threads {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut acquired = Vec::new();
            for i in 0..200 {
                let (device, mode) = pairs[(t + i) % pairs.len()];
                acquired.push(registry.acquire(device, mode));
            }
            acquired
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let stats = registry.stats();
    assert_eq!(stats.facades_created, pairs.len() as u64);
    assert_eq!(stats.acquires, (threads * 200) as u64);

    for (device, mode) in pairs {
        let canonical = registry.acquire(device, mode);
        assert!(all
            .iter()
            .filter(|h| h.device_id() == device && h.tuning_mode() == mode)
            .all(|h| FacadeHandle::ptr_eq(h, &canonical)));
    }

    // Drive every facade from its own thread
    let mut workers = Vec::new();
    for (device, mode) in pairs {
        let registry = Arc::clone(&registry);
        workers.push(thread::spawn(move || {
            let handle = registry.acquire(device, mode);
            for frame in 0..50 {
                handle.lock().run_dvs(frame).unwrap();
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(probe.constructed(), pairs.len() as u64);
    assert_eq!(probe.calls("run_dvs"), 200);

    let seen: HashSet<_> = all
        .iter()
        .map(|h| (h.device_id(), h.tuning_mode()))
        .collect();
    assert_eq!(seen.len(), pairs.len());
}

#[test]
fn test_concurrent_acquire_and_release() {
    let (registry, probe) = create_test_registry();
    let registry = Arc::new(registry);
    let mut handles = Vec::new();

    for t in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let device = t % 2;
            for frame in 0..100 {
                let facade = registry.acquire(device, TuningMode::Video);
                // A concurrent release may retire the facade under us
                let _ = facade.lock().run_dvs(frame);
                if frame % 10 == 0 {
                    registry.release(device, TuningMode::Video);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    registry.release_all();
    assert_eq!(probe.live(), 0);
    assert_eq!(registry.stats().facades, 0);
}

#[test]
fn test_release_destroys_engine_before_reacquire() {
    let (registry, engines) = create_test_registry();
    let registry = Arc::new(registry);

    let old = registry.acquire(0, TuningMode::Video);
    old.lock().init(&InitParams::default()).unwrap();
    assert_eq!(engines.live(), 1);

    let barrier = Arc::new(Barrier::new(3));

    // Keep the old facade busy so its teardown is delayed
    let holder = {
        let barrier = Arc::clone(&barrier);
        let old = old.clone();
        thread::spawn(move || {
            let guard = old.lock();
            barrier.wait();
            thread::sleep(Duration::from_millis(200));
            drop(guard);
        })
    };

    let releaser = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            registry.release(0, TuningMode::Video);
        })
    };

    barrier.wait();
    thread::sleep(Duration::from_millis(50));
    let fresh = registry.acquire(0, TuningMode::Video);
    fresh.lock().init(&InitParams::default()).unwrap();
    assert!(engines.live() <= 1);

    holder.join().unwrap();
    releaser.join().unwrap();
    assert!(engines.live() <= 1);

    // Whenever a second engine was built, the first one was gone by then
    let events = engines.events();
    if let Some(created) = events.iter().position(|e| e.starts_with("create:1:")) {
        let dropped = events
            .iter()
            .position(|e| e == "drop:0")
            .expect("old engine dropped");
        assert!(dropped < created);
    }
}
