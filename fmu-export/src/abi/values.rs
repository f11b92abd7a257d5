//! Typed value access across the ABI: `(instance, references, count,
//! values)` in, status out. References are materialized into owned slices,
//! dispatched to the model's typed accessors, and results are copied back
//! into the caller's buffer. `nvr == 0` is a valid no-op.

use crate::{
    abi::{mut_slice_arg, slice_arg, string_arg},
    binding, instance,
    registry::InstanceHandle,
    status::Status,
};

#[unsafe(export_name = "fmi2GetReal")]
pub unsafe extern "C" fn fmi2_get_real(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *mut binding::fmi2Real,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { mut_slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    instance::get_real(handle, vrs, values).into()
}

#[unsafe(export_name = "fmi2GetInteger")]
pub unsafe extern "C" fn fmi2_get_integer(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *mut binding::fmi2Integer,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { mut_slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    instance::get_integer(handle, vrs, values).into()
}

#[unsafe(export_name = "fmi2GetBoolean")]
pub unsafe extern "C" fn fmi2_get_boolean(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *mut binding::fmi2Boolean,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { mut_slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    let mut booleans = vec![false; vrs.len()];
    let status = instance::get_boolean(handle, vrs, &mut booleans);
    if status == Status::Ok {
        for (slot, flag) in values.iter_mut().zip(booleans) {
            *slot = if flag { binding::fmi2True } else { binding::fmi2False };
        }
    }
    status.into()
}

#[unsafe(export_name = "fmi2GetString")]
pub unsafe extern "C" fn fmi2_get_string(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *mut binding::fmi2String,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { mut_slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    match instance::get_string_raw(handle, vrs) {
        Ok(pointers) => {
            values.copy_from_slice(&pointers);
            Status::Ok.into()
        }
        Err(status) => status.into(),
    }
}

#[unsafe(export_name = "fmi2SetReal")]
pub unsafe extern "C" fn fmi2_set_real(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *const binding::fmi2Real,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    instance::set_real(handle, vrs, values).into()
}

#[unsafe(export_name = "fmi2SetInteger")]
pub unsafe extern "C" fn fmi2_set_integer(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *const binding::fmi2Integer,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    instance::set_integer(handle, vrs, values).into()
}

#[unsafe(export_name = "fmi2SetBoolean")]
pub unsafe extern "C" fn fmi2_set_boolean(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *const binding::fmi2Boolean,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    let booleans: Vec<bool> = values.iter().map(|&flag| flag == binding::fmi2True).collect();
    instance::set_boolean(handle, vrs, &booleans).into()
}

#[unsafe(export_name = "fmi2SetString")]
pub unsafe extern "C" fn fmi2_set_string(
    component: binding::fmi2Component,
    vr: *const binding::fmi2ValueReference,
    nvr: usize,
    value: *const binding::fmi2String,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let (Some(vrs), Some(values)) =
        (unsafe { slice_arg(vr, nvr) }, unsafe { slice_arg(value, nvr) })
    else {
        return Status::Error.into();
    };
    let owned: Vec<String> = values
        .iter()
        .map(|&text| unsafe { string_arg(text) })
        .collect();
    instance::set_string(handle, vrs, &owned).into()
}
