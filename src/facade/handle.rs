use super::core::EngineFacade;
use crate::types::{DeviceId, TuningMode};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Shared reference to a registered [`EngineFacade`].
///
/// Clones point at the same facade. Operations are serialized per facade by
/// the handle's own lock, independent of the registry table lock.
#[derive(Clone)]
pub struct FacadeHandle {
    device: DeviceId,
    mode: TuningMode,
    inner: Arc<Mutex<EngineFacade>>,
}

impl FacadeHandle {
    pub(crate) fn new(facade: EngineFacade) -> Self {
        Self {
            device: facade.device_id(),
            mode: facade.tuning_mode(),
            inner: Arc::new(Mutex::new(facade)),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device
    }

    pub fn tuning_mode(&self) -> TuningMode {
        self.mode
    }

    /// Lock the facade for a sequence of operations.
    ///
    /// The lock is not reentrant. Drop the guard before calling
    /// `EngineRegistry::release`, `release_all` or dropping the registry,
    /// since those lock every facade they tear down.
    pub fn lock(&self) -> MutexGuard<'_, EngineFacade> {
        self.inner.lock()
    }

    /// Whether both handles refer to the same facade instance
    pub fn ptr_eq(a: &FacadeHandle, b: &FacadeHandle) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for FacadeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacadeHandle")
            .field("device", &self.device)
            .field("mode", &self.mode)
            .finish()
    }
}
