//! The exported C surface, driven the way a simulation master would:
//! C strings in, status codes out, results through caller-provided buffers.

use std::ffi::{CStr, CString};
use std::sync::Mutex;

use fmu_export::{FmuModel, UserModel, abi, binding};

/// Records every message delivered through the C logger callback.
static LOGGED: Mutex<Vec<(binding::fmi2Status, String, String, String)>> = Mutex::new(Vec::new());

unsafe extern "C" fn test_logger(
    _environment: binding::fmi2ComponentEnvironment,
    instance_name: binding::fmi2String,
    status: binding::fmi2Status,
    category: binding::fmi2String,
    message: binding::fmi2String,
) {
    let text = |ptr: binding::fmi2String| {
        if ptr.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
        }
    };
    LOGGED
        .lock()
        .unwrap()
        .push((status, text(instance_name), text(category), text(message)));
}

fn callbacks() -> binding::fmi2CallbackFunctions {
    binding::fmi2CallbackFunctions {
        logger: Some(test_logger),
        allocateMemory: None,
        freeMemory: None,
        stepFinished: None,
        componentEnvironment: std::ptr::null_mut(),
    }
}

#[derive(FmuModel, Default)]
#[model(guid = "{b7c1de02-9e4a-4b09-95a8-f63cf0b7a201}", description = "Integrating counter")]
pub struct Accumulator {
    /// Running sum of the input.
    #[variable(causality = "output", variability = "continuous", initial = "exact", start = 0.0)]
    pub total: f64,

    /// Value added once per communication step.
    #[variable(causality = "input", variability = "discrete", start = 1.0)]
    pub increment: f64,

    /// Steps taken so far.
    #[variable(causality = "output", variability = "discrete", initial = "exact", start = 0)]
    pub steps: i32,

    /// Human-readable tag for the instance.
    #[variable(causality = "parameter", variability = "tunable", start = "accumulator")]
    pub label: String,
}

impl UserModel for Accumulator {
    fn do_step(
        &mut self,
        _logger: &fmu_export::Logger,
        _current: f64,
        _step: f64,
        _no_set_fmu_state_prior: bool,
    ) -> Result<fmu_export::StepResult, fmu_export::ModelError> {
        self.total += self.increment;
        self.steps += 1;
        Ok(fmu_export::StepResult::Complete)
    }
}

fmu_export::export_models! { Accumulator }

fn instantiate(name: &CStr) -> binding::fmi2Component {
    let guid = c"{b7c1de02-9e4a-4b09-95a8-f63cf0b7a201}";
    let resource = c"file:///tmp/resources";
    let functions = callbacks();
    unsafe {
        abi::fmi2_instantiate(
            name.as_ptr(),
            binding::fmi2Type_fmi2CoSimulation,
            guid.as_ptr(),
            resource.as_ptr(),
            &functions,
            binding::fmi2False,
            binding::fmi2False,
        )
    }
}

fn initialized(name: &CStr) -> binding::fmi2Component {
    let component = instantiate(name);
    assert!(!component.is_null());
    unsafe {
        assert_eq!(
            abi::fmi2_enter_initialization_mode(component),
            binding::fmi2Status_fmi2OK
        );
        assert_eq!(
            abi::fmi2_exit_initialization_mode(component),
            binding::fmi2Status_fmi2OK
        );
    }
    component
}

#[test]
fn version_strings_come_back_as_c_strings() {
    let version = unsafe { CStr::from_ptr(abi::fmi2_get_version()) };
    assert_eq!(version.to_str().unwrap(), "2.0");
    let platform = unsafe { CStr::from_ptr(abi::fmi2_get_types_platform()) };
    assert_eq!(platform.to_str().unwrap(), "default");
}

#[test]
fn instantiate_with_unknown_guid_logs_and_returns_null() {
    let name = c"abi-unknown-guid";
    let guid = c"{00000000-0000-0000-0000-000000000000}";
    let functions = callbacks();
    let component = unsafe {
        abi::fmi2_instantiate(
            name.as_ptr(),
            binding::fmi2Type_fmi2CoSimulation,
            guid.as_ptr(),
            c"".as_ptr(),
            &functions,
            binding::fmi2False,
            binding::fmi2False,
        )
    };
    assert!(component.is_null());

    let logged = LOGGED.lock().unwrap();
    assert!(logged.iter().any(|(status, instance, category, message)| {
        *status == binding::fmi2Status_fmi2Error
            && instance == "abi-unknown-guid"
            && category == "logStatusError"
            && message.contains("does not match any registered model")
    }));
}

#[test]
fn free_instance_ignores_null_components() {
    unsafe { abi::fmi2_free_instance(std::ptr::null_mut()) };
}

#[test]
fn typed_access_over_the_c_surface() {
    let component = initialized(c"abi-values");

    // nvr = 0 succeeds without touching the buffers.
    let status = unsafe {
        abi::values::fmi2_get_real(component, std::ptr::null(), 0, std::ptr::null_mut())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);

    // Null references with a positive count violate the contract.
    let mut sink = [0.0];
    let status = unsafe {
        abi::values::fmi2_get_real(component, std::ptr::null(), 1, sink.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2Error);

    // Drive two steps with an input set through the C setter.
    let increment_vr: [binding::fmi2ValueReference; 1] = [2];
    let increment = [2.5];
    let status = unsafe {
        abi::values::fmi2_set_real(component, increment_vr.as_ptr(), 1, increment.as_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);

    for step in 0..2 {
        let status = unsafe {
            abi::fmi2_do_step(component, step as f64 * 0.5, 0.5, binding::fmi2False)
        };
        assert_eq!(status, binding::fmi2Status_fmi2OK);
    }

    let read_vrs: [binding::fmi2ValueReference; 2] = [1, 2];
    let mut reals = [0.0f64; 2];
    let status = unsafe {
        abi::values::fmi2_get_real(component, read_vrs.as_ptr(), 2, reals.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);
    assert_eq!(reals, [5.0, 2.5]);

    let step_vr: [binding::fmi2ValueReference; 1] = [3];
    let mut integers = [0 as binding::fmi2Integer];
    let status = unsafe {
        abi::values::fmi2_get_integer(component, step_vr.as_ptr(), 1, integers.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);
    assert_eq!(integers[0], 2);

    unsafe { abi::fmi2_free_instance(component) };
}

#[test]
fn string_results_stay_valid_until_the_next_string_call() {
    let component = initialized(c"abi-strings");

    let label_vr: [binding::fmi2ValueReference; 1] = [4];
    let mut pointers: [binding::fmi2String; 1] = [std::ptr::null()];
    let status = unsafe {
        abi::values::fmi2_get_string(component, label_vr.as_ptr(), 1, pointers.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);
    let first = unsafe { CStr::from_ptr(pointers[0]) };
    assert_eq!(first.to_str().unwrap(), "accumulator");

    // Overwrite through the setter, then read again: the old pointer is
    // replaced by the new table entry.
    let replacement = CString::new("relabeled").unwrap();
    let values = [replacement.as_ptr()];
    let status = unsafe {
        abi::values::fmi2_set_string(component, label_vr.as_ptr(), 1, values.as_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);

    let status = unsafe {
        abi::values::fmi2_get_string(component, label_vr.as_ptr(), 1, pointers.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2OK);
    let second = unsafe { CStr::from_ptr(pointers[0]) };
    assert_eq!(second.to_str().unwrap(), "relabeled");

    unsafe { abi::fmi2_free_instance(component) };
}

#[test]
fn boolean_values_convert_between_c_ints_and_rust_bools() {
    let component = initialized(c"abi-booleans");

    // The accumulator has no boolean variables: a boolean read of a real
    // reference reports a base-type mismatch.
    let vrs: [binding::fmi2ValueReference; 1] = [1];
    let mut flags = [binding::fmi2False];
    let status = unsafe {
        abi::values::fmi2_get_boolean(component, vrs.as_ptr(), 1, flags.as_mut_ptr())
    };
    assert_eq!(status, binding::fmi2Status_fmi2Error);

    unsafe { abi::fmi2_free_instance(component) };
}

#[test]
fn model_exchange_surface_is_reachable_but_gated() {
    let component = initialized(c"abi-me-surface");

    // A co-simulation instance in StepComplete cannot enter event mode.
    let status = unsafe { abi::fmi2_enter_event_mode(component) };
    assert_eq!(status, binding::fmi2Status_fmi2Error);

    // Directional derivatives are not provided.
    let status = unsafe {
        abi::fmi2_get_directional_derivative(
            component,
            std::ptr::null(),
            0,
            std::ptr::null(),
            0,
            std::ptr::null(),
            std::ptr::null_mut(),
        )
    };
    assert_eq!(status, binding::fmi2Status_fmi2Error);

    unsafe { abi::fmi2_free_instance(component) };
}
