//! Instance records and the gated operations behind every ABI entry point.
//!
//! Each function looks the handle up in the instance registry, tests the
//! current lifecycle state against the operation's allowed set, and only
//! then dispatches to the model implementation. State-machine violations
//! log an "Illegal call sequence" error and return [`Status::Error`]
//! without calling through.

use std::ffi::CString;
use std::sync::{Arc, Mutex};

use crate::{
    lifecycle::ModelState,
    logger::{LogMask, Logger, LoggerCallback},
    model::{InterfaceType, ModelError, ModelInstance, StepResult, ValueReference},
    registry::{self, InstanceHandle, lock_fmu},
    status::Status,
};

/// A live FMU instance: identity, lifecycle state, logger, the user model,
/// and co-simulation bookkeeping.
pub struct Fmu {
    pub name: String,
    pub kind: InterfaceType,
    pub guid: String,
    pub resource_location: String,
    pub state: ModelState,
    pub(crate) logger: Logger,
    pub(crate) model: Box<dyn ModelInstance>,
    /// End of the last successfully completed communication step.
    pub(crate) last_successful_time: f64,
    /// Status of the most recent `DoStep`, reported by `fmi2GetStatus`.
    pub(crate) step_status: Status,
    /// Strings most recently returned by `fmi2GetString`; FMI requires them
    /// to stay valid until the next call that writes strings on the same
    /// instance, so the table is replaced, not appended.
    pub(crate) string_buf: Vec<CString>,
}

impl Fmu {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn last_successful_time(&self) -> f64 {
        self.last_successful_time
    }

    pub fn step_status(&self) -> Status {
        self.step_status
    }
}

/// Create a new instance of a registered model. Returns `None` when
/// validation fails; the reason is reported through the supplied callback
/// under the `logStatusError` category.
pub fn instantiate(
    instance_name: &str,
    kind: InterfaceType,
    guid: &str,
    resource_location: &str,
    logging_on: bool,
    callback: LoggerCallback,
) -> Option<InstanceHandle> {
    // Errors are logged by default; loggingOn additionally enables events.
    let mut mask = LogMask::ERROR;
    if logging_on {
        mask |= LogMask::EVENTS;
    }
    let logger = Logger::new(mask, callback);

    if instance_name.is_empty() {
        logger.error("Missing instance name");
        return None;
    }
    if guid.is_empty() {
        logger.error("Missing GUID");
        return None;
    }
    let Some(model) = registry::model_for_guid(guid) else {
        logger.error(format!("GUID {guid} does not match any registered model"));
        return None;
    };

    let instance = match model.instantiate(&logger) {
        Ok(instance) => instance,
        Err(err) => {
            logger.error(format!("Error instantiating model: {err}"));
            return None;
        }
    };

    let fmu = Fmu {
        name: instance_name.to_string(),
        kind,
        guid: guid.to_string(),
        resource_location: resource_location.to_string(),
        state: ModelState::INSTANTIATED,
        logger,
        model: instance,
        last_successful_time: 0.0,
        step_status: Status::Ok,
        string_buf: Vec::new(),
    };
    Some(registry::insert_instance(fmu))
}

/// Look up a live instance record. Fails for freed or never-issued handles.
pub fn fmu(handle: InstanceHandle) -> Option<Arc<Mutex<Fmu>>> {
    registry::instance(handle)
}

/// Drop an instance. Unknown handles are ignored; the handle is invalid
/// afterwards.
pub fn free_instance(handle: InstanceHandle) {
    registry::remove_instance(handle);
}

fn allowed_state(
    handle: InstanceHandle,
    name: &str,
    expected: ModelState,
) -> Option<Arc<Mutex<Fmu>>> {
    let fmu = registry::instance(handle)?;
    let ok = {
        let guard = lock_fmu(&fmu);
        if guard.state.intersects(expected) {
            true
        } else {
            guard
                .logger
                .error(format!("Illegal call sequence at {name}"));
            false
        }
    };
    ok.then_some(fmu)
}

/// Replace the logger mask: off clears it, on with no categories enables
/// everything, on with categories enables their union. Unknown category
/// names fail the call.
pub fn set_debug_logging(handle: InstanceHandle, logging_on: bool, categories: &[&str]) -> Status {
    let Some(fmu) = allowed_state(handle, "SetDebugLogging", ModelState::ANY_INSTANTIATED) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);

    if !logging_on {
        fmu.logger.set_mask(LogMask::empty());
        return Status::Ok;
    }
    if categories.is_empty() {
        fmu.logger.set_mask(LogMask::ALL);
        return Status::Ok;
    }

    let mut mask = LogMask::empty();
    for category in categories {
        match LogMask::from_category_name(category) {
            Ok(bit) => mask |= bit,
            Err(_) => {
                fmu.logger
                    .error(format!("Log category {category} was not recognized"));
                return Status::Error;
            }
        }
    }
    fmu.logger.set_mask(mask);
    Status::Ok
}

pub fn setup_experiment(
    handle: InstanceHandle,
    tolerance: Option<f64>,
    start_time: f64,
    stop_time: Option<f64>,
) -> Status {
    let Some(fmu) = allowed_state(handle, "SetupExperiment", ModelState::INSTANTIATED) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    let Fmu { model, logger, .. } = &mut *fmu;
    if let Err(err) = model.setup_experiment(logger, tolerance, start_time, stop_time) {
        logger.error(format!("Error calling SetupExperiment: {err}"));
        return Status::Error;
    }
    Status::Ok
}

pub fn enter_initialization_mode(handle: InstanceHandle) -> Status {
    let Some(fmu) = allowed_state(handle, "EnterInitializationMode", ModelState::INSTANTIATED)
    else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    let result = {
        let Fmu { model, logger, .. } = &mut *fmu;
        model.enter_initialization_mode(logger).map_err(|err| {
            logger.error(format!("Error calling EnterInitializationMode: {err}"));
        })
    };
    if result.is_err() {
        return Status::Error;
    }
    fmu.state = ModelState::INITIALIZATION_MODE;
    Status::Ok
}

pub fn exit_initialization_mode(handle: InstanceHandle) -> Status {
    let Some(fmu) = allowed_state(
        handle,
        "ExitInitializationMode",
        ModelState::INITIALIZATION_MODE,
    ) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    let result = {
        let Fmu { model, logger, .. } = &mut *fmu;
        model.exit_initialization_mode(logger).map_err(|err| {
            logger.error(format!("Error calling ExitInitializationMode: {err}"));
        })
    };
    if result.is_err() {
        return Status::Error;
    }
    fmu.state = if fmu.kind == InterfaceType::ModelExchange {
        ModelState::EVENT_MODE
    } else {
        ModelState::STEP_COMPLETE
    };
    Status::Ok
}

pub fn terminate(handle: InstanceHandle) -> Status {
    const EXPECTED: ModelState = ModelState::from_bits_truncate(
        ModelState::EVENT_MODE.bits()
            | ModelState::CONTINUOUS_TIME_MODE.bits()
            | ModelState::STEP_COMPLETE.bits()
            | ModelState::STEP_FAILED.bits(),
    );
    let Some(fmu) = allowed_state(handle, "Terminate", EXPECTED) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    let result = {
        let Fmu { model, logger, .. } = &mut *fmu;
        model.terminate(logger).map_err(|err| {
            logger.error(format!("Error calling Terminate: {err}"));
        })
    };
    if result.is_err() {
        return Status::Error;
    }
    fmu.state = ModelState::TERMINATED;
    Status::Ok
}

/// Return to `Instantiated` from any non-fatal state, replacing the model
/// with a fresh instance from its factory.
pub fn reset(handle: InstanceHandle) -> Status {
    const EXPECTED: ModelState = ModelState::ANY_INSTANTIATED;
    let Some(fmu) = allowed_state(handle, "Reset", EXPECTED) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);

    let Some(factory) = registry::model_for_guid(&fmu.guid) else {
        fmu.logger
            .error(format!("GUID {} does not match any registered model", fmu.guid));
        return Status::Error;
    };
    let fresh = match factory.instantiate(&fmu.logger) {
        Ok(instance) => instance,
        Err(err) => {
            fmu.logger.error(format!("Error calling Reset: {err}"));
            return Status::Error;
        }
    };

    fmu.model = fresh;
    fmu.state = ModelState::INSTANTIATED;
    fmu.last_successful_time = 0.0;
    fmu.step_status = Status::Ok;
    fmu.string_buf.clear();
    Status::Ok
}

const GET_ALLOWED: ModelState = ModelState::from_bits_truncate(
    ModelState::INITIALIZATION_MODE.bits()
        | ModelState::EVENT_MODE.bits()
        | ModelState::CONTINUOUS_TIME_MODE.bits()
        | ModelState::STEP_COMPLETE.bits()
        | ModelState::STEP_FAILED.bits()
        | ModelState::STEP_CANCELED.bits()
        | ModelState::TERMINATED.bits()
        | ModelState::ERROR.bits(),
);

const SET_ALLOWED: ModelState = ModelState::from_bits_truncate(
    ModelState::INSTANTIATED.bits()
        | ModelState::INITIALIZATION_MODE.bits()
        | ModelState::EVENT_MODE.bits()
        | ModelState::CONTINUOUS_TIME_MODE.bits()
        | ModelState::STEP_COMPLETE.bits(),
);

macro_rules! getter {
    ($fn_name:ident, $name:literal, $model_fn:ident, $ty:ty) => {
        #[doc = concat!("Read ", $name, " values into `values`; `vrs` and `values` must have equal length.")]
        pub fn $fn_name(handle: InstanceHandle, vrs: &[ValueReference], values: &mut [$ty]) -> Status {
            let Some(fmu) = allowed_state(handle, $name, GET_ALLOWED) else {
                return Status::Error;
            };
            let mut fmu = lock_fmu(&fmu);
            if vrs.is_empty() {
                return Status::Ok;
            }
            let Fmu { model, logger, .. } = &mut *fmu;
            if vrs.len() != values.len() {
                logger.error(format!(
                    "Error calling {}: {}",
                    $name,
                    ModelError::CountMismatch {
                        references: vrs.len(),
                        values: values.len(),
                    }
                ));
                return Status::Error;
            }
            match model.$model_fn(vrs) {
                Ok(results) if results.len() == values.len() => {
                    for (slot, value) in values.iter_mut().zip(results) {
                        *slot = value;
                    }
                    Status::Ok
                }
                Ok(results) => {
                    logger.error(format!(
                        "Error calling {}: model returned {} values for {} references",
                        $name,
                        results.len(),
                        vrs.len()
                    ));
                    Status::Error
                }
                Err(err) => {
                    logger.error(format!("Error calling {}: {err}", $name));
                    Status::Error
                }
            }
        }
    };
}

macro_rules! setter {
    ($fn_name:ident, $name:literal, $model_fn:ident, $ty:ty) => {
        #[doc = concat!("Write ", $name, " values; `vrs` and `values` must have equal length.")]
        pub fn $fn_name(handle: InstanceHandle, vrs: &[ValueReference], values: &[$ty]) -> Status {
            let Some(fmu) = allowed_state(handle, $name, SET_ALLOWED) else {
                return Status::Error;
            };
            let mut fmu = lock_fmu(&fmu);
            if vrs.is_empty() {
                return Status::Ok;
            }
            let Fmu { model, logger, .. } = &mut *fmu;
            if vrs.len() != values.len() {
                logger.error(format!(
                    "Error calling {}: {}",
                    $name,
                    ModelError::CountMismatch {
                        references: vrs.len(),
                        values: values.len(),
                    }
                ));
                return Status::Error;
            }
            if let Err(err) = model.$model_fn(vrs, values) {
                logger.error(format!("Error calling {}: {err}", $name));
                return Status::Error;
            }
            Status::Ok
        }
    };
}

getter!(get_real, "GetReal", get_real, f64);
getter!(get_integer, "GetInteger", get_integer, i32);
getter!(get_boolean, "GetBoolean", get_boolean, bool);
getter!(get_string, "GetString", get_string, String);

setter!(set_real, "SetReal", set_real, f64);
setter!(set_integer, "SetInteger", set_integer, i32);
setter!(set_boolean, "SetBoolean", set_boolean, bool);
setter!(set_string, "SetString", set_string, String);

/// String getter for the C surface: converts results to C strings held in
/// the per-instance table and returns their pointers. The pointers stay
/// valid until the next call that writes strings on the same instance.
pub(crate) fn get_string_raw(
    handle: InstanceHandle,
    vrs: &[ValueReference],
) -> Result<Vec<*const std::os::raw::c_char>, Status> {
    let Some(fmu) = allowed_state(handle, "GetString", GET_ALLOWED) else {
        return Err(Status::Error);
    };
    let mut fmu = lock_fmu(&fmu);
    if vrs.is_empty() {
        return Ok(Vec::new());
    }
    let results = {
        let Fmu { model, logger, .. } = &mut *fmu;
        match model.get_string(vrs) {
            Ok(results) if results.len() == vrs.len() => results,
            Ok(results) => {
                logger.error(format!(
                    "Error calling GetString: model returned {} values for {} references",
                    results.len(),
                    vrs.len()
                ));
                return Err(Status::Error);
            }
            Err(err) => {
                logger.error(format!("Error calling GetString: {err}"));
                return Err(Status::Error);
            }
        }
    };

    let mut table = Vec::with_capacity(results.len());
    for text in results {
        match CString::new(text) {
            Ok(c_text) => table.push(c_text),
            Err(err) => {
                fmu.logger
                    .error(format!("Error calling GetString: {err}"));
                return Err(Status::Error);
            }
        }
    }
    fmu.string_buf = table;
    Ok(fmu.string_buf.iter().map(|text| text.as_ptr()).collect())
}

/// Perform one co-simulation step. Requires a co-simulation instance in
/// `StepComplete` and a positive step size. On success the internal clock
/// is anchored to `current + step`.
pub fn do_step(
    handle: InstanceHandle,
    current_communication_point: f64,
    communication_step_size: f64,
    no_set_fmu_state_prior: bool,
) -> Status {
    let Some(fmu) = allowed_state(handle, "DoStep", ModelState::STEP_COMPLETE) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);

    if fmu.kind != InterfaceType::CoSimulation {
        fmu.logger
            .error("DoStep is only available for co-simulation instances");
        return Status::Error;
    }
    if communication_step_size <= 0.0 || communication_step_size.is_nan() {
        fmu.logger.error(format!(
            "Communication step size must be positive, got {communication_step_size}"
        ));
        return Status::Error;
    }

    let result = {
        let Fmu { model, logger, .. } = &mut *fmu;
        model.do_step(
            logger,
            current_communication_point,
            communication_step_size,
            no_set_fmu_state_prior,
        )
    };

    match result {
        Ok(StepResult::Complete) => {
            fmu.last_successful_time = current_communication_point + communication_step_size;
            fmu.step_status = Status::Ok;
            Status::Ok
        }
        Ok(StepResult::Partial) => {
            fmu.state = ModelState::STEP_FAILED;
            fmu.step_status = Status::Discard;
            Status::Discard
        }
        Ok(StepResult::Async) => {
            fmu.state = ModelState::STEP_IN_PROGRESS;
            fmu.step_status = Status::Pending;
            Status::Pending
        }
        Err(err) => {
            fmu.logger.error(format!("Error calling DoStep: {err}"));
            Status::Error
        }
    }
}

/// Cancel an asynchronous step. The core is synchronous, so this only
/// performs the `StepInProgress -> StepCanceled` transition.
pub fn cancel_step(handle: InstanceHandle) -> Status {
    let Some(fmu) = allowed_state(handle, "CancelStep", ModelState::STEP_IN_PROGRESS) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    fmu.state = ModelState::STEP_CANCELED;
    Status::Ok
}

pub(crate) const SERIALIZE_ALLOWED: ModelState = ModelState::from_bits_truncate(
    ModelState::INSTANTIATED.bits()
        | ModelState::INITIALIZATION_MODE.bits()
        | ModelState::EVENT_MODE.bits()
        | ModelState::CONTINUOUS_TIME_MODE.bits()
        | ModelState::STEP_COMPLETE.bits()
        | ModelState::STEP_FAILED.bits()
        | ModelState::STEP_CANCELED.bits()
        | ModelState::TERMINATED.bits()
        | ModelState::ERROR.bits(),
);

/// Capture the model state as an opaque byte buffer.
pub fn get_fmu_state(handle: InstanceHandle) -> Result<Vec<u8>, Status> {
    let Some(fmu) = allowed_state(handle, "GetFMUstate", SERIALIZE_ALLOWED) else {
        return Err(Status::Error);
    };
    let mut fmu = lock_fmu(&fmu);
    let Fmu { model, logger, .. } = &mut *fmu;
    model.encode_state().map_err(|err| {
        logger.error(format!("Error calling GetFMUstate: {err}"));
        Status::Error
    })
}

/// Restore a state previously captured on an instance of the same model.
pub fn set_fmu_state(handle: InstanceHandle, bytes: &[u8]) -> Status {
    let Some(fmu) = allowed_state(handle, "SetFMUstate", SERIALIZE_ALLOWED) else {
        return Status::Error;
    };
    let mut fmu = lock_fmu(&fmu);
    let Fmu { model, logger, .. } = &mut *fmu;
    if let Err(err) = model.decode_state(bytes) {
        logger.error(format!("Error calling SetFMUstate: {err}"));
        return Status::Error;
    }
    Status::Ok
}
