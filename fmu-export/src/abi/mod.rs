//! The exported FMI 2.0 C API.
//!
//! Every function converts its C arguments, resolves the component handle
//! against the instance registry and delegates to the gated operations in
//! [`crate::instance`]. Nothing here panics across the ABI; failures come
//! back as `fmi2Status` codes with a message through the logger callback.

pub mod state;
pub mod values;

use std::ffi::{CStr, CString};

use crate::{
    binding,
    instance::{self, Fmu},
    lifecycle::ModelState,
    logger::LoggerCallback,
    model::InterfaceType,
    registry::{self, InstanceHandle, lock_fmu},
    status::Status,
};

/// Convert a possibly-null C string argument; lossy for invalid UTF-8.
pub(crate) unsafe fn string_arg(text: binding::fmi2String) -> String {
    if text.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

/// Materialize a C array argument. `len == 0` yields an empty slice;
/// a null pointer with `len > 0` is a contract violation.
pub(crate) unsafe fn slice_arg<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts(ptr, len) })
}

pub(crate) unsafe fn mut_slice_arg<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
    if len == 0 {
        return Some(&mut []);
    }
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// Environment logger callback plus the opaque pointer it is passed back.
/// The FMI standard obliges the environment to provide a callback that may
/// be invoked from any thread driving this instance.
struct EnvironmentLogger {
    callback: unsafe extern "C" fn(
        binding::fmi2ComponentEnvironment,
        binding::fmi2String,
        binding::fmi2Status,
        binding::fmi2String,
        binding::fmi2String,
    ),
    environment: binding::fmi2ComponentEnvironment,
    instance_name: CString,
}

unsafe impl Send for EnvironmentLogger {}

pub(crate) fn logger_callback(
    functions: *const binding::fmi2CallbackFunctions,
    instance_name: &str,
) -> LoggerCallback {
    let functions = (!functions.is_null()).then(|| unsafe { *functions });
    let Some(callback) = functions.and_then(|f| f.logger) else {
        // No callback supplied: report on stderr so failures stay visible.
        let name = instance_name.to_string();
        return Box::new(move |status, category, message| {
            eprintln!("[{name}] {status:?} {category}: {message}");
        });
    };

    let sink = EnvironmentLogger {
        callback,
        environment: functions
            .map(|f| f.componentEnvironment)
            .unwrap_or_else(std::ptr::null_mut),
        instance_name: CString::new(instance_name).unwrap_or_default(),
    };
    Box::new(move |status, category, message| {
        let sink = &sink;
        let category = CString::new(category).unwrap_or_default();
        let message = CString::new(message).unwrap_or_default();
        unsafe {
            (sink.callback)(
                sink.environment,
                sink.instance_name.as_ptr(),
                status.into(),
                category.as_ptr(),
                message.as_ptr(),
            )
        };
    })
}

/// Gate + dispatch helper for entry points implemented directly against the
/// instance record.
pub(crate) fn with_fmu(
    component: binding::fmi2Component,
    name: &str,
    expected: ModelState,
    op: impl FnOnce(&mut Fmu) -> Status,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let Some(fmu) = registry::instance(handle) else {
        return Status::Error.into();
    };
    let mut fmu = lock_fmu(&fmu);
    if !fmu.state.intersects(expected) {
        fmu.logger
            .error(format!("Illegal call sequence at {name}"));
        return Status::Error.into();
    }
    op(&mut fmu).into()
}

fn component_handle(component: binding::fmi2Component) -> Option<InstanceHandle> {
    InstanceHandle::from_component(component)
}

// Inquire version numbers

#[unsafe(export_name = "fmi2GetVersion")]
pub unsafe extern "C" fn fmi2_get_version() -> binding::fmi2String {
    binding::fmi2Version.as_ptr()
}

#[unsafe(export_name = "fmi2GetTypesPlatform")]
pub unsafe extern "C" fn fmi2_get_types_platform() -> binding::fmi2String {
    binding::fmi2TypesPlatform.as_ptr()
}

// Creation and destruction of FMU instances and setting debug status

#[unsafe(export_name = "fmi2Instantiate")]
pub unsafe extern "C" fn fmi2_instantiate(
    instance_name: binding::fmi2String,
    fmu_type: binding::fmi2Type,
    fmu_guid: binding::fmi2String,
    fmu_resource_location: binding::fmi2String,
    functions: *const binding::fmi2CallbackFunctions,
    _visible: binding::fmi2Boolean,
    logging_on: binding::fmi2Boolean,
) -> binding::fmi2Component {
    let name = unsafe { string_arg(instance_name) };
    let guid = unsafe { string_arg(fmu_guid) };
    let resource_location = unsafe { string_arg(fmu_resource_location) };
    let callback = logger_callback(functions, &name);

    let kind = match fmu_type {
        binding::fmi2Type_fmi2ModelExchange => InterfaceType::ModelExchange,
        binding::fmi2Type_fmi2CoSimulation => InterfaceType::CoSimulation,
        other => {
            callback(
                Status::Error,
                "logStatusError",
                &format!("Unknown FMU type {other}"),
            );
            return std::ptr::null_mut();
        }
    };

    match instance::instantiate(
        &name,
        kind,
        &guid,
        &resource_location,
        logging_on == binding::fmi2True,
        callback,
    ) {
        Some(handle) => handle.as_component(),
        None => std::ptr::null_mut(),
    }
}

#[unsafe(export_name = "fmi2FreeInstance")]
pub unsafe extern "C" fn fmi2_free_instance(component: binding::fmi2Component) {
    if let Some(handle) = component_handle(component) {
        instance::free_instance(handle);
    }
}

#[unsafe(export_name = "fmi2SetDebugLogging")]
pub unsafe extern "C" fn fmi2_set_debug_logging(
    component: binding::fmi2Component,
    logging_on: binding::fmi2Boolean,
    n_categories: usize,
    categories: *const binding::fmi2String,
) -> binding::fmi2Status {
    let Some(handle) = component_handle(component) else {
        return Status::Error.into();
    };
    let Some(raw_categories) = (unsafe { slice_arg(categories, n_categories) }) else {
        return Status::Error.into();
    };
    let owned: Vec<String> = raw_categories
        .iter()
        .map(|&category| unsafe { string_arg(category) })
        .collect();
    let category_refs: Vec<&str> = owned.iter().map(String::as_str).collect();
    instance::set_debug_logging(handle, logging_on == binding::fmi2True, &category_refs).into()
}

// Enter and exit initialization mode, terminate and reset

#[unsafe(export_name = "fmi2SetupExperiment")]
pub unsafe extern "C" fn fmi2_setup_experiment(
    component: binding::fmi2Component,
    tolerance_defined: binding::fmi2Boolean,
    tolerance: binding::fmi2Real,
    start_time: binding::fmi2Real,
    stop_time_defined: binding::fmi2Boolean,
    stop_time: binding::fmi2Real,
) -> binding::fmi2Status {
    let Some(handle) = component_handle(component) else {
        return Status::Error.into();
    };
    let tolerance = (tolerance_defined == binding::fmi2True).then_some(tolerance);
    let stop_time = (stop_time_defined == binding::fmi2True).then_some(stop_time);
    instance::setup_experiment(handle, tolerance, start_time, stop_time).into()
}

#[unsafe(export_name = "fmi2EnterInitializationMode")]
pub unsafe extern "C" fn fmi2_enter_initialization_mode(
    component: binding::fmi2Component,
) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::enter_initialization_mode(handle).into(),
        None => Status::Error.into(),
    }
}

#[unsafe(export_name = "fmi2ExitInitializationMode")]
pub unsafe extern "C" fn fmi2_exit_initialization_mode(
    component: binding::fmi2Component,
) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::exit_initialization_mode(handle).into(),
        None => Status::Error.into(),
    }
}

#[unsafe(export_name = "fmi2Terminate")]
pub unsafe extern "C" fn fmi2_terminate(component: binding::fmi2Component) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::terminate(handle).into(),
        None => Status::Error.into(),
    }
}

#[unsafe(export_name = "fmi2Reset")]
pub unsafe extern "C" fn fmi2_reset(component: binding::fmi2Component) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::reset(handle).into(),
        None => Status::Error.into(),
    }
}

// Getting partial derivatives

#[unsafe(export_name = "fmi2GetDirectionalDerivative")]
pub unsafe extern "C" fn fmi2_get_directional_derivative(
    component: binding::fmi2Component,
    _v_unknown_ref: *const binding::fmi2ValueReference,
    _n_unknown: usize,
    _v_known_ref: *const binding::fmi2ValueReference,
    _n_known: usize,
    _dv_known: *const binding::fmi2Real,
    _dv_unknown: *mut binding::fmi2Real,
) -> binding::fmi2Status {
    with_fmu(
        component,
        "GetDirectionalDerivative",
        ModelState::ANY_INSTANTIATED,
        |fmu| {
            fmu.logger
                .error("Directional derivatives are not provided by this library");
            Status::Error
        },
    )
}

// Functions for Model Exchange: the surface is preserved, with the minimal
// state-machine semantics the co-simulation core shares.

const MODE_TRANSITIONS: ModelState = ModelState::from_bits_truncate(
    ModelState::EVENT_MODE.bits() | ModelState::CONTINUOUS_TIME_MODE.bits(),
);

#[unsafe(export_name = "fmi2EnterEventMode")]
pub unsafe extern "C" fn fmi2_enter_event_mode(
    component: binding::fmi2Component,
) -> binding::fmi2Status {
    with_fmu(component, "EnterEventMode", MODE_TRANSITIONS, |fmu| {
        fmu.state = ModelState::EVENT_MODE;
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2NewDiscreteStates")]
pub unsafe extern "C" fn fmi2_new_discrete_states(
    component: binding::fmi2Component,
    event_info: *mut binding::fmi2EventInfo,
) -> binding::fmi2Status {
    if event_info.is_null() {
        return Status::Error.into();
    }
    with_fmu(component, "NewDiscreteStates", ModelState::EVENT_MODE, |_| {
        unsafe { *event_info = binding::fmi2EventInfo::default() };
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2EnterContinuousTimeMode")]
pub unsafe extern "C" fn fmi2_enter_continuous_time_mode(
    component: binding::fmi2Component,
) -> binding::fmi2Status {
    with_fmu(
        component,
        "EnterContinuousTimeMode",
        ModelState::EVENT_MODE,
        |fmu| {
            fmu.state = ModelState::CONTINUOUS_TIME_MODE;
            Status::Ok
        },
    )
}

#[unsafe(export_name = "fmi2CompletedIntegratorStep")]
pub unsafe extern "C" fn fmi2_completed_integrator_step(
    component: binding::fmi2Component,
    _no_set_fmu_state_prior: binding::fmi2Boolean,
    enter_event_mode: *mut binding::fmi2Boolean,
    terminate_simulation: *mut binding::fmi2Boolean,
) -> binding::fmi2Status {
    with_fmu(
        component,
        "CompletedIntegratorStep",
        ModelState::CONTINUOUS_TIME_MODE,
        |_| {
            if !enter_event_mode.is_null() {
                unsafe { *enter_event_mode = binding::fmi2False };
            }
            if !terminate_simulation.is_null() {
                unsafe { *terminate_simulation = binding::fmi2False };
            }
            Status::Ok
        },
    )
}

#[unsafe(export_name = "fmi2SetTime")]
pub unsafe extern "C" fn fmi2_set_time(
    component: binding::fmi2Component,
    _time: binding::fmi2Real,
) -> binding::fmi2Status {
    with_fmu(component, "SetTime", MODE_TRANSITIONS, |_| Status::Ok)
}

#[unsafe(export_name = "fmi2SetContinuousStates")]
pub unsafe extern "C" fn fmi2_set_continuous_states(
    component: binding::fmi2Component,
    states: *const binding::fmi2Real,
    n_states: usize,
) -> binding::fmi2Status {
    if unsafe { slice_arg(states, n_states) }.is_none() {
        return Status::Error.into();
    }
    with_fmu(
        component,
        "SetContinuousStates",
        ModelState::CONTINUOUS_TIME_MODE,
        |_| Status::Ok,
    )
}

macro_rules! me_real_array_getter {
    ($rust_name:ident, $c_name:literal, $op_name:literal, $fill:expr) => {
        #[unsafe(export_name = $c_name)]
        pub unsafe extern "C" fn $rust_name(
            component: binding::fmi2Component,
            values: *mut binding::fmi2Real,
            n_values: usize,
        ) -> binding::fmi2Status {
            let Some(values) = (unsafe { mut_slice_arg(values, n_values) }) else {
                return Status::Error.into();
            };
            with_fmu(component, $op_name, ModelState::ANY_INSTANTIATED, |_| {
                values.fill($fill);
                Status::Ok
            })
        }
    };
}

me_real_array_getter!(fmi2_get_derivatives, "fmi2GetDerivatives", "GetDerivatives", 0.0);
me_real_array_getter!(
    fmi2_get_event_indicators,
    "fmi2GetEventIndicators",
    "GetEventIndicators",
    0.0
);
me_real_array_getter!(
    fmi2_get_continuous_states,
    "fmi2GetContinuousStates",
    "GetContinuousStates",
    0.0
);
me_real_array_getter!(
    fmi2_get_nominals_of_continuous_states,
    "fmi2GetNominalsOfContinuousStates",
    "GetNominalsOfContinuousStates",
    1.0
);

// Functions for Co-Simulation

#[unsafe(export_name = "fmi2SetRealInputDerivatives")]
pub unsafe extern "C" fn fmi2_set_real_input_derivatives(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    order: *const binding::fmi2Integer,
    value: *const binding::fmi2Real,
) -> binding::fmi2Status {
    if unsafe { slice_arg(vr, nvr) }.is_none()
        || unsafe { slice_arg(order, nvr) }.is_none()
        || unsafe { slice_arg(value, nvr) }.is_none()
    {
        return Status::Error.into();
    }
    // Interpolation hints are accepted and ignored by the synchronous core.
    with_fmu(
        component,
        "SetRealInputDerivatives",
        ModelState::ANY_INSTANTIATED,
        |_| Status::Ok,
    )
}

#[unsafe(export_name = "fmi2GetRealOutputDerivatives")]
pub unsafe extern "C" fn fmi2_get_real_output_derivatives(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    order: *const binding::fmi2Integer,
    value: *mut binding::fmi2Real,
) -> binding::fmi2Status {
    if unsafe { slice_arg(vr, nvr) }.is_none() || unsafe { slice_arg(order, nvr) }.is_none() {
        return Status::Error.into();
    }
    let Some(values) = (unsafe { mut_slice_arg(value, nvr) }) else {
        return Status::Error.into();
    };
    with_fmu(
        component,
        "GetRealOutputDerivatives",
        ModelState::ANY_INSTANTIATED,
        |_| {
            values.fill(0.0);
            Status::Ok
        },
    )
}

#[unsafe(export_name = "fmi2DoStep")]
pub unsafe extern "C" fn fmi2_do_step(
    component: binding::fmi2Component,
    current_communication_point: binding::fmi2Real,
    communication_step_size: binding::fmi2Real,
    no_set_fmu_state_prior_to_current_point: binding::fmi2Boolean,
) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::do_step(
            handle,
            current_communication_point,
            communication_step_size,
            no_set_fmu_state_prior_to_current_point == binding::fmi2True,
        )
        .into(),
        None => Status::Error.into(),
    }
}

#[unsafe(export_name = "fmi2CancelStep")]
pub unsafe extern "C" fn fmi2_cancel_step(
    component: binding::fmi2Component,
) -> binding::fmi2Status {
    match component_handle(component) {
        Some(handle) => instance::cancel_step(handle).into(),
        None => Status::Error.into(),
    }
}

// Status inquiry: the core is synchronous, so the answers come from the
// step bookkeeping recorded by `DoStep`.

const INQUIRY_ALLOWED: ModelState = ModelState::from_bits_truncate(
    ModelState::STEP_COMPLETE.bits()
        | ModelState::STEP_IN_PROGRESS.bits()
        | ModelState::STEP_FAILED.bits()
        | ModelState::STEP_CANCELED.bits()
        | ModelState::TERMINATED.bits(),
);

#[unsafe(export_name = "fmi2GetStatus")]
pub unsafe extern "C" fn fmi2_get_status(
    component: binding::fmi2Component,
    kind: binding::fmi2StatusKind,
    value: *mut binding::fmi2Status,
) -> binding::fmi2Status {
    if value.is_null() {
        return Status::Error.into();
    }
    with_fmu(component, "GetStatus", INQUIRY_ALLOWED, |fmu| {
        if kind != binding::fmi2StatusKind_fmi2DoStepStatus {
            return Status::Discard;
        }
        unsafe { *value = fmu.step_status().into() };
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2GetRealStatus")]
pub unsafe extern "C" fn fmi2_get_real_status(
    component: binding::fmi2Component,
    kind: binding::fmi2StatusKind,
    value: *mut binding::fmi2Real,
) -> binding::fmi2Status {
    if value.is_null() {
        return Status::Error.into();
    }
    with_fmu(component, "GetRealStatus", INQUIRY_ALLOWED, |fmu| {
        if kind != binding::fmi2StatusKind_fmi2LastSuccessfulTime {
            return Status::Discard;
        }
        unsafe { *value = fmu.last_successful_time() };
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2GetIntegerStatus")]
pub unsafe extern "C" fn fmi2_get_integer_status(
    component: binding::fmi2Component,
    _kind: binding::fmi2StatusKind,
    value: *mut binding::fmi2Integer,
) -> binding::fmi2Status {
    if value.is_null() {
        return Status::Error.into();
    }
    // No integer-valued status kind exists in FMI 2.0.
    with_fmu(component, "GetIntegerStatus", INQUIRY_ALLOWED, |_| {
        Status::Discard
    })
}

#[unsafe(export_name = "fmi2GetBooleanStatus")]
pub unsafe extern "C" fn fmi2_get_boolean_status(
    component: binding::fmi2Component,
    kind: binding::fmi2StatusKind,
    value: *mut binding::fmi2Boolean,
) -> binding::fmi2Status {
    if value.is_null() {
        return Status::Error.into();
    }
    with_fmu(component, "GetBooleanStatus", INQUIRY_ALLOWED, |_| {
        if kind != binding::fmi2StatusKind_fmi2Terminated {
            return Status::Discard;
        }
        unsafe { *value = binding::fmi2False };
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2GetStringStatus")]
pub unsafe extern "C" fn fmi2_get_string_status(
    component: binding::fmi2Component,
    kind: binding::fmi2StatusKind,
    value: *mut binding::fmi2String,
) -> binding::fmi2Status {
    if value.is_null() {
        return Status::Error.into();
    }
    with_fmu(component, "GetStringStatus", INQUIRY_ALLOWED, |_| {
        if kind != binding::fmi2StatusKind_fmi2PendingStatus {
            return Status::Discard;
        }
        // Synchronous core: there is never a pending computation to report.
        unsafe { *value = c"".as_ptr() };
        Status::Ok
    })
}
