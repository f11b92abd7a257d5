use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::{binding, instance::Fmu, model::Model};

/// Opaque, process-unique token for a live instance. Passed across the C
/// ABI as `fmi2Component`; a small integer rather than an interior pointer,
/// so stale handles stay recognizable and never dereference freed memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHandle(usize);

impl InstanceHandle {
    pub fn as_component(self) -> binding::fmi2Component {
        self.0 as binding::fmi2Component
    }

    pub fn from_component(component: binding::fmi2Component) -> Option<Self> {
        let raw = component as usize;
        (raw != 0).then_some(InstanceHandle(raw))
    }
}

/// Failure to install a model factory. Only observable at library
/// initialization; never surfaces on the FMI ABI.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model description GUID cannot be empty")]
    EmptyGuid,

    #[error("a model for GUID {0} is already registered")]
    DuplicateGuid(String),
}

/// Installed model factories, keyed by GUID. Populated during library
/// initialization; read-only once the first ABI call arrives.
static MODELS: Lazy<RwLock<HashMap<String, Arc<dyn Model>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Live instances. The registry lock is held only for lookups and
/// mutations of the map itself, never across a model call; per-instance
/// serialization is the environment's obligation under the FMI standard,
/// with the instance mutex as the safety net.
static INSTANCES: Lazy<RwLock<HashMap<InstanceHandle, Arc<Mutex<Fmu>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

/// Install a model factory under the GUID of its description. Multiple
/// models can be registered as long as their GUIDs differ.
pub fn register_model(model: impl Model + 'static) -> Result<(), RegistryError> {
    let guid = model.description().guid;
    if guid.is_empty() {
        return Err(RegistryError::EmptyGuid);
    }

    let mut models = write_lock(&MODELS);
    if models.contains_key(&guid) {
        return Err(RegistryError::DuplicateGuid(guid));
    }
    models.insert(guid, Arc::new(model));
    Ok(())
}

pub(crate) fn model_for_guid(guid: &str) -> Option<Arc<dyn Model>> {
    read_lock(&MODELS).get(guid).cloned()
}

pub(crate) fn insert_instance(fmu: Fmu) -> InstanceHandle {
    let handle = InstanceHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
    write_lock(&INSTANCES).insert(handle, Arc::new(Mutex::new(fmu)));
    handle
}

pub(crate) fn instance(handle: InstanceHandle) -> Option<Arc<Mutex<Fmu>>> {
    read_lock(&INSTANCES).get(&handle).cloned()
}

pub(crate) fn remove_instance(handle: InstanceHandle) -> bool {
    write_lock(&INSTANCES).remove(&handle).is_some()
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Recover the guard even if another thread panicked while holding the
/// instance; the record stays usable for error reporting.
pub(crate) fn lock_fmu(fmu: &Mutex<Fmu>) -> std::sync::MutexGuard<'_, Fmu> {
    fmu.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
