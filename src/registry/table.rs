use super::stats::{RegistryStats, RegistryStatsSnapshot};
use crate::engine::EngineFactory;
use crate::facade::{EngineFacade, FacadeHandle};
use crate::types::{DeviceId, TuningMode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Facades registered for one device
struct DeviceBucket {
    facades: HashMap<TuningMode, FacadeHandle>,
}

impl DeviceBucket {
    fn new() -> Self {
        Self {
            facades: HashMap::new(),
        }
    }
}

/// Table of engine facades keyed by device and tuning mode.
///
/// At most one facade exists per (device, mode) pair. Table lookups,
/// mutations and the teardown of released facades run under a single lock;
/// ordinary facade operations never take it. Device
/// buckets are kept once created, even after their last facade is released.
pub struct EngineRegistry {
    table: Mutex<HashMap<DeviceId, DeviceBucket>>,
    factory: Arc<dyn EngineFactory>,
    stats: RegistryStats,
}

impl EngineRegistry {
    /// Create an empty registry whose engines come from `factory`
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        debug!("Created engine registry");
        Self {
            table: Mutex::new(HashMap::new()),
            factory,
            stats: RegistryStats::new(),
        }
    }

    /// Return the facade for (device, mode), creating it on first request.
    ///
    /// Repeated calls return the same facade until it is released.
    pub fn acquire(&self, device: DeviceId, mode: TuningMode) -> FacadeHandle {
        let mut table = self.table.lock();
        self.stats.acquires.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Acquiring facade for device {} mode {:?}, {} device buckets",
            device,
            mode,
            table.len()
        );

        let bucket = table.entry(device).or_insert_with(|| {
            debug!("Creating device bucket for device {}", device);
            DeviceBucket::new()
        });

        let handle = bucket.facades.entry(mode).or_insert_with(|| {
            info!("Registering engine facade for device {} mode {:?}", device, mode);
            self.stats.facades_created.fetch_add(1, Ordering::Relaxed);
            FacadeHandle::new(EngineFacade::new(
                device,
                mode,
                Arc::clone(&self.factory),
            ))
        });

        handle.clone()
    }

    /// Drop the facade for (device, mode) and destroy its engine.
    ///
    /// The engine is destroyed before the table lock is released, so a
    /// concurrent acquire of the same pair never overlaps the old engine.
    /// Handles still held by callers stop accepting operations. Unknown pairs
    /// are ignored.
    pub fn release(&self, device: DeviceId, mode: TuningMode) {
        debug!("Releasing facade for device {} mode {:?}", device, mode);

        let mut table = self.table.lock();
        let removed = table
            .get_mut(&device)
            .and_then(|bucket| bucket.facades.remove(&mode));

        match removed {
            Some(handle) => {
                handle.lock().retire();
                self.stats.facades_released.fetch_add(1, Ordering::Relaxed);
                info!("Released engine facade for device {} mode {:?}", device, mode);
            }
            None => debug!(
                "No facade registered for device {} mode {:?}",
                device, mode
            ),
        }
    }

    /// Release every registered facade. Device buckets are kept, empty.
    pub fn release_all(&self) {
        let mut table = self.table.lock();
        debug!("Releasing all facades across {} device buckets", table.len());

        let mut count = 0u64;
        for bucket in table.values_mut() {
            for (_, handle) in bucket.facades.drain() {
                handle.lock().retire();
                count += 1;
            }
        }

        self.stats
            .facades_released
            .fetch_add(count, Ordering::Relaxed);
        info!("Released {} engine facades", count);
    }

    pub fn contains(&self, device: DeviceId, mode: TuningMode) -> bool {
        self.table
            .lock()
            .get(&device)
            .map_or(false, |bucket| bucket.facades.contains_key(&mode))
    }

    /// Modes registered for `device`, or `None` if the device was never seen
    pub fn device_modes(&self, device: DeviceId) -> Option<Vec<TuningMode>> {
        self.table.lock().get(&device).map(|bucket| {
            let mut modes: Vec<TuningMode> = bucket.facades.keys().copied().collect();
            modes.sort();
            modes
        })
    }

    pub fn stats(&self) -> RegistryStatsSnapshot {
        let table = self.table.lock();
        let facades = table.values().map(|bucket| bucket.facades.len()).sum();
        self.stats.snapshot(table.len(), facades)
    }
}

impl Drop for EngineRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Builder for [`EngineRegistry`]
pub struct EngineRegistryBuilder {
    factory: Option<Arc<dyn EngineFactory>>,
}

impl EngineRegistryBuilder {
    pub fn new() -> Self {
        Self { factory: None }
    }

    pub fn factory<F: EngineFactory + 'static>(mut self, factory: F) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn shared_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> crate::error::Result<EngineRegistry> {
        let factory = self.factory.ok_or_else(|| {
            crate::error::CcaError::system("Engine factory must be specified")
        })?;

        Ok(EngineRegistry::new(factory))
    }
}

impl Default for EngineRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
