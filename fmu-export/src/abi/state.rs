//! The six FMU-state functions: opaque handle lifecycle plus the
//! size-prefixed serialization protocol.
//!
//! `Get` captures the model state into a runtime-owned record; `Set`
//! pushes a record's payload back through the model's decoder; the record
//! itself stays owned by the environment until `Free`. `Serialize` and
//! `DeSerialize` move records through environment-provided byte buffers
//! without touching the model.

use crate::{
    abi::{mut_slice_arg, slice_arg, with_fmu},
    binding,
    fmu_state::FmuState,
    instance::{self, SERIALIZE_ALLOWED},
    registry::InstanceHandle,
    status::Status,
};

#[unsafe(export_name = "fmi2GetFMUstate")]
pub unsafe extern "C" fn fmi2_get_fmu_state(
    component: binding::fmi2Component,
    fmu_state: *mut binding::fmi2FMUstate,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    if fmu_state.is_null() {
        return Status::Error.into();
    }
    match instance::get_fmu_state(handle) {
        Ok(payload) => {
            // A non-null incoming handle points at a previously returned
            // record whose memory is reused by replacement.
            let previous = unsafe { *fmu_state };
            if unsafe { FmuState::from_handle(previous) }.is_some() {
                unsafe { FmuState::free(previous) };
            }
            unsafe { *fmu_state = FmuState::new(payload).into_handle() };
            Status::Ok.into()
        }
        Err(status) => status.into(),
    }
}

#[unsafe(export_name = "fmi2SetFMUstate")]
pub unsafe extern "C" fn fmi2_set_fmu_state(
    component: binding::fmi2Component,
    fmu_state: binding::fmi2FMUstate,
) -> binding::fmi2Status {
    let Some(handle) = InstanceHandle::from_component(component) else {
        return Status::Error.into();
    };
    let Some(state) = (unsafe { FmuState::from_handle(fmu_state) }) else {
        return with_fmu(component, "SetFMUstate", SERIALIZE_ALLOWED, |fmu| {
            fmu.logger()
                .error("SetFMUstate called with a state not produced by this library");
            Status::Error
        });
    };
    // Copy the payload so the record remains intact for further use.
    let payload = state.payload().to_vec();
    instance::set_fmu_state(handle, &payload).into()
}

#[unsafe(export_name = "fmi2FreeFMUstate")]
pub unsafe extern "C" fn fmi2_free_fmu_state(
    _component: binding::fmi2Component,
    fmu_state: *mut binding::fmi2FMUstate,
) -> binding::fmi2Status {
    if fmu_state.is_null() {
        return Status::Ok.into();
    }
    let current = unsafe { *fmu_state };
    if current.is_null() {
        return Status::Ok.into();
    }
    if unsafe { FmuState::from_handle(current) }.is_none() {
        return Status::Error.into();
    }
    unsafe { FmuState::free(current) };
    unsafe { *fmu_state = std::ptr::null_mut() };
    Status::Ok.into()
}

#[unsafe(export_name = "fmi2SerializedFMUstateSize")]
pub unsafe extern "C" fn fmi2_serialized_fmu_state_size(
    component: binding::fmi2Component,
    fmu_state: binding::fmi2FMUstate,
    size: *mut usize,
) -> binding::fmi2Status {
    if size.is_null() {
        return Status::Error.into();
    }
    let Some(state) = (unsafe { FmuState::from_handle(fmu_state) }) else {
        return Status::Error.into();
    };
    with_fmu(component, "SerializedFMUstateSize", SERIALIZE_ALLOWED, |_| {
        unsafe { *size = state.serialized_size() };
        Status::Ok
    })
}

#[unsafe(export_name = "fmi2SerializeFMUstate")]
pub unsafe extern "C" fn fmi2_serialize_fmu_state(
    component: binding::fmi2Component,
    fmu_state: binding::fmi2FMUstate,
    serialized_state: *mut binding::fmi2Byte,
    size: usize,
) -> binding::fmi2Status {
    let Some(state) = (unsafe { FmuState::from_handle(fmu_state) }) else {
        return Status::Error.into();
    };
    let Some(buffer) = (unsafe { mut_slice_arg(serialized_state as *mut u8, size) }) else {
        return Status::Error.into();
    };
    with_fmu(component, "SerializeFMUstate", SERIALIZE_ALLOWED, |fmu| {
        match state.serialize_into(buffer) {
            Ok(()) => Status::Ok,
            Err(err) => {
                fmu.logger()
                    .error(format!("Error calling SerializeFMUstate: {err}"));
                Status::Error
            }
        }
    })
}

#[unsafe(export_name = "fmi2DeSerializeFMUstate")]
pub unsafe extern "C" fn fmi2_deserialize_fmu_state(
    component: binding::fmi2Component,
    serialized_state: *const binding::fmi2Byte,
    size: usize,
    fmu_state: *mut binding::fmi2FMUstate,
) -> binding::fmi2Status {
    if fmu_state.is_null() {
        return Status::Error.into();
    }
    let Some(buffer) = (unsafe { slice_arg(serialized_state as *const u8, size) }) else {
        return Status::Error.into();
    };
    with_fmu(component, "DeSerializeFMUstate", SERIALIZE_ALLOWED, |fmu| {
        match FmuState::deserialize(buffer) {
            Ok(state) => {
                unsafe { *fmu_state = state.into_handle() };
                Status::Ok
            }
            Err(err) => {
                fmu.logger()
                    .error(format!("Error calling DeSerializeFMUstate: {err}"));
                Status::Error
            }
        }
    })
}
