//! FMI 2.0 host-side runtime.
//!
//! This crate exports the standard FMI 2.0 C API (`fmi2Instantiate`,
//! `fmi2DoStep`, `fmi2GetReal`, ...) and hosts user-authored model
//! implementations registered through [`register_model`]. A single compiled
//! shared library may contain many models distinguished by GUID; the
//! environment picks one per instance at `fmi2Instantiate` time.
//!
//! A model is usually a struct deriving [`FmuModel`] plus a [`UserModel`]
//! impl for its behavior:
//!
//! ```rust,ignore
//! use fmu_export::{FmuModel, StepResult, UserModel, export_models};
//!
//! #[derive(FmuModel, Default)]
//! #[model(guid = "{...}", description = "Falling mass")]
//! struct FallingMass {
//!     #[variable(causality = "output", start = 1.0, unit = "m")]
//!     pub h: f64,
//! }
//!
//! impl UserModel for FallingMass {
//!     fn do_step(
//!         &mut self,
//!         logger: &fmu_export::Logger,
//!         current: f64,
//!         step: f64,
//!         _no_set_prior: bool,
//!     ) -> Result<StepResult, fmu_export::ModelError> {
//!         self.h -= 9.81 * step * (current + step);
//!         Ok(StepResult::Complete)
//!     }
//! }
//!
//! export_models! { FallingMass }
//! ```
//!
//! Every exported C function validates the instance handle and the current
//! lifecycle state before dispatching; errors are reported through the
//! environment's logger callback and returned as `fmi2Status` codes, never
//! as unwinds across the ABI.

#![deny(clippy::all)]
#![deny(deref_nullptr)]
#![deny(invalid_value)]
#![deny(invalid_from_utf8)]
#![deny(static_mut_refs)]

pub mod abi;
pub mod binding;
pub mod codec;
mod fmu_state;
mod instance;
mod lifecycle;
mod logger;
mod macros;
mod model;
mod registry;
mod status;

pub use fmu_state::FmuState;
pub use instance::{
    Fmu, cancel_step, do_step, enter_initialization_mode, exit_initialization_mode, fmu,
    free_instance, get_boolean, get_fmu_state, get_integer, get_real, get_string, instantiate,
    reset, set_boolean, set_debug_logging, set_fmu_state, set_integer, set_real, set_string,
    setup_experiment, terminate,
};
pub use lifecycle::ModelState;
pub use logger::{LogMask, Logger, LoggerCallback};
pub use model::{
    InterfaceType, Model, ModelDefinition, ModelError, ModelInstance, ModelVariables, StepResult,
    UserModel, ValueReference,
};
pub use registry::{InstanceHandle, RegistryError, register_model};
pub use status::Status;

// Re-export the derive macro and the schema crate so model crates only
// need this dependency.
pub use fmu_export_derive::FmuModel;
pub use fmu_schema;

// Re-exported for use by `export_models!`.
#[doc(hidden)]
pub use ctor;

/// The version string returned by `fmi2GetVersion`.
pub fn version() -> &'static str {
    binding::fmi2Version
        .to_str()
        .unwrap_or_default()
}

/// The platform string returned by `fmi2GetTypesPlatform`.
pub fn types_platform() -> &'static str {
    binding::fmi2TypesPlatform
        .to_str()
        .unwrap_or_default()
}
