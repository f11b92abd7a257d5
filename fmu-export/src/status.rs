use crate::binding;

/// Return status of every FMI function, mirroring `fmi2Status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    /// All well.
    Ok = binding::fmi2Status_fmi2OK,
    /// Things are not quite right, but the computation can continue; the
    /// logger has been called with the prepared message.
    Warning = binding::fmi2Status_fmi2Warning,
    /// The step could not be completed as asked; the master has to decide
    /// whether the simulation run can be continued.
    Discard = binding::fmi2Status_fmi2Discard,
    /// The call failed; the simulation cannot be continued with this
    /// instance unless a previously captured FMU state is restored.
    Error = binding::fmi2Status_fmi2Error,
    /// The computations are irreparably corrupted for all instances.
    Fatal = binding::fmi2Status_fmi2Fatal,
    /// Only from `fmi2DoStep` when the slave executes asynchronously.
    Pending = binding::fmi2Status_fmi2Pending,
}

impl From<Status> for binding::fmi2Status {
    fn from(status: Status) -> Self {
        status as binding::fmi2Status
    }
}
