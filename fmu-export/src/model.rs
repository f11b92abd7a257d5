use std::marker::PhantomData;

use fmu_schema::ModelDescription;
use thiserror::Error;

use crate::logger::Logger;

/// Handle identifying a variable within an FMU for typed get/set calls.
/// 1-based and unique per base type; the first declared variable is 1.
pub type ValueReference = u32;

/// Which FMI interface an instance was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterfaceType {
    ModelExchange,
    CoSimulation,
}

/// Outcome of a co-simulation step as reported by the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// The model integrated over the full communication step.
    Complete,
    /// The model stopped before the communication point; maps to
    /// `fmi2Discard`.
    Partial,
    /// The model started the step asynchronously; maps to `fmi2Pending`.
    Async,
}

/// Failure reported by a model implementation. Never crosses the C ABI;
/// the runtime logs the message and returns an error status.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model instance does not implement {0}")]
    Unsupported(&'static str),

    #[error("value reference {0} is out of range")]
    UnknownValueReference(ValueReference),

    #[error("value reference {vr} does not refer to a {expected} variable")]
    TypeMismatch {
        vr: ValueReference,
        expected: &'static str,
    },

    #[error("variable {0} is constant and cannot be set")]
    ConstantVariable(&'static str),

    #[error("value count {values} does not match reference count {references}")]
    CountMismatch { references: usize, values: usize },

    #[error("state payload is malformed: {0}")]
    MalformedState(String),

    #[error("{0}")]
    Failure(String),
}

impl ModelError {
    /// Ad-hoc failure with a model-supplied message.
    pub fn msg(message: impl Into<String>) -> Self {
        ModelError::Failure(message.into())
    }
}

/// A model factory registered with the process-wide registry, keyed by the
/// GUID of its static description. Produces a fresh implementation per
/// instantiation.
pub trait Model: Send + Sync {
    fn description(&self) -> ModelDescription;

    fn instantiate(&self, logger: &Logger) -> Result<Box<dyn ModelInstance>, ModelError>;
}

/// The per-instance contract the runtime drives. Lifecycle hooks default to
/// no-ops; value access and state capture default to "unsupported", which
/// the runtime logs and maps to an error status.
///
/// Implement this directly for hand-rolled models, or derive
/// [`ModelVariables`] with `#[derive(FmuModel)]` and implement [`UserModel`]
/// to get this for free.
pub trait ModelInstance: Send {
    fn setup_experiment(
        &mut self,
        _logger: &Logger,
        _tolerance: Option<f64>,
        _start_time: f64,
        _stop_time: Option<f64>,
    ) -> Result<(), ModelError> {
        Ok(())
    }

    fn enter_initialization_mode(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    fn exit_initialization_mode(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    fn terminate(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    /// Integrate from `current` over `step`. The instance logger is passed
    /// in so models can report events through the environment callback.
    fn do_step(
        &mut self,
        _logger: &Logger,
        _current: f64,
        _step: f64,
        _no_set_fmu_state_prior: bool,
    ) -> Result<StepResult, ModelError> {
        Err(ModelError::Unsupported("DoStep"))
    }

    fn get_real(&mut self, _vrs: &[ValueReference]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Unsupported("GetReal"))
    }

    fn get_integer(&mut self, _vrs: &[ValueReference]) -> Result<Vec<i32>, ModelError> {
        Err(ModelError::Unsupported("GetInteger"))
    }

    fn get_boolean(&mut self, _vrs: &[ValueReference]) -> Result<Vec<bool>, ModelError> {
        Err(ModelError::Unsupported("GetBoolean"))
    }

    fn get_string(&mut self, _vrs: &[ValueReference]) -> Result<Vec<String>, ModelError> {
        Err(ModelError::Unsupported("GetString"))
    }

    fn set_real(&mut self, _vrs: &[ValueReference], _values: &[f64]) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("SetReal"))
    }

    fn set_integer(&mut self, _vrs: &[ValueReference], _values: &[i32]) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("SetInteger"))
    }

    fn set_boolean(&mut self, _vrs: &[ValueReference], _values: &[bool]) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("SetBoolean"))
    }

    fn set_string(&mut self, _vrs: &[ValueReference], _values: &[String]) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("SetString"))
    }

    /// Capture the full model state as an opaque byte buffer.
    fn encode_state(&self) -> Result<Vec<u8>, ModelError> {
        Err(ModelError::Unsupported("GetFMUstate"))
    }

    /// Restore a state previously produced by [`Self::encode_state`].
    fn decode_state(&mut self, _bytes: &[u8]) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("SetFMUstate"))
    }
}

/// Variable access derived from a declarative model definition; implemented
/// by `#[derive(FmuModel)]`.
///
/// Value references are the 1-based field declaration order. Getters and
/// setters validate every reference before the first mutation: an
/// out-of-range reference or a base-type mismatch leaves the model
/// untouched.
pub trait ModelVariables {
    /// GUID carried by the `#[model]` attribute.
    const GUID: &'static str;

    /// The complete model description, ready for rendering.
    fn model_description() -> ModelDescription
    where
        Self: Sized;

    /// The scalar-variable list in declaration order.
    fn variables() -> Vec<fmu_schema::ScalarVariable>
    where
        Self: Sized;

    /// Reset every field carrying a `start` tag to its start value.
    fn apply_start_values(&mut self);

    fn get_real(&self, vrs: &[ValueReference]) -> Result<Vec<f64>, ModelError>;
    fn get_integer(&self, vrs: &[ValueReference]) -> Result<Vec<i32>, ModelError>;
    fn get_boolean(&self, vrs: &[ValueReference]) -> Result<Vec<bool>, ModelError>;
    fn get_string(&self, vrs: &[ValueReference]) -> Result<Vec<String>, ModelError>;

    fn set_real(&mut self, vrs: &[ValueReference], values: &[f64]) -> Result<(), ModelError>;
    fn set_integer(&mut self, vrs: &[ValueReference], values: &[i32]) -> Result<(), ModelError>;
    fn set_boolean(&mut self, vrs: &[ValueReference], values: &[bool]) -> Result<(), ModelError>;
    fn set_string(&mut self, vrs: &[ValueReference], values: &[String]) -> Result<(), ModelError>;

    /// Round-trip the full field set through the self-describing binary
    /// format in [`crate::codec`].
    fn encode_state(&self) -> Result<Vec<u8>, ModelError>;
    fn decode_state(&mut self, bytes: &[u8]) -> Result<(), ModelError>;
}

/// Behavior hooks for a derived model. All lifecycle hooks default to
/// success; co-simulation models override [`UserModel::do_step`].
pub trait UserModel: ModelVariables + Default + Send {
    fn setup_experiment(
        &mut self,
        _logger: &Logger,
        _tolerance: Option<f64>,
        _start_time: f64,
        _stop_time: Option<f64>,
    ) -> Result<(), ModelError> {
        Ok(())
    }

    fn enter_initialization_mode(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    fn exit_initialization_mode(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    fn terminate(&mut self, _logger: &Logger) -> Result<(), ModelError> {
        Ok(())
    }

    fn do_step(
        &mut self,
        _logger: &Logger,
        _current: f64,
        _step: f64,
        _no_set_fmu_state_prior: bool,
    ) -> Result<StepResult, ModelError> {
        Err(ModelError::Unsupported("DoStep"))
    }
}

impl<T: UserModel> ModelInstance for T {
    fn setup_experiment(
        &mut self,
        logger: &Logger,
        tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> Result<(), ModelError> {
        UserModel::setup_experiment(self, logger, tolerance, start_time, stop_time)
    }

    fn enter_initialization_mode(&mut self, logger: &Logger) -> Result<(), ModelError> {
        UserModel::enter_initialization_mode(self, logger)
    }

    fn exit_initialization_mode(&mut self, logger: &Logger) -> Result<(), ModelError> {
        UserModel::exit_initialization_mode(self, logger)
    }

    fn terminate(&mut self, logger: &Logger) -> Result<(), ModelError> {
        UserModel::terminate(self, logger)
    }

    fn do_step(
        &mut self,
        logger: &Logger,
        current: f64,
        step: f64,
        no_set_fmu_state_prior: bool,
    ) -> Result<StepResult, ModelError> {
        UserModel::do_step(self, logger, current, step, no_set_fmu_state_prior)
    }

    fn get_real(&mut self, vrs: &[ValueReference]) -> Result<Vec<f64>, ModelError> {
        ModelVariables::get_real(self, vrs)
    }

    fn get_integer(&mut self, vrs: &[ValueReference]) -> Result<Vec<i32>, ModelError> {
        ModelVariables::get_integer(self, vrs)
    }

    fn get_boolean(&mut self, vrs: &[ValueReference]) -> Result<Vec<bool>, ModelError> {
        ModelVariables::get_boolean(self, vrs)
    }

    fn get_string(&mut self, vrs: &[ValueReference]) -> Result<Vec<String>, ModelError> {
        ModelVariables::get_string(self, vrs)
    }

    fn set_real(&mut self, vrs: &[ValueReference], values: &[f64]) -> Result<(), ModelError> {
        ModelVariables::set_real(self, vrs, values)
    }

    fn set_integer(&mut self, vrs: &[ValueReference], values: &[i32]) -> Result<(), ModelError> {
        ModelVariables::set_integer(self, vrs, values)
    }

    fn set_boolean(&mut self, vrs: &[ValueReference], values: &[bool]) -> Result<(), ModelError> {
        ModelVariables::set_boolean(self, vrs, values)
    }

    fn set_string(&mut self, vrs: &[ValueReference], values: &[String]) -> Result<(), ModelError> {
        ModelVariables::set_string(self, vrs, values)
    }

    fn encode_state(&self) -> Result<Vec<u8>, ModelError> {
        ModelVariables::encode_state(self)
    }

    fn decode_state(&mut self, bytes: &[u8]) -> Result<(), ModelError> {
        ModelVariables::decode_state(self, bytes)
    }
}

/// Factory adapter turning a derived model type into a registrable
/// [`Model`]: instantiation builds a `Default` value and applies the
/// declared start values.
pub struct ModelDefinition<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ModelDefinition<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ModelDefinition<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: UserModel + 'static> Model for ModelDefinition<T> {
    fn description(&self) -> ModelDescription {
        T::model_description()
    }

    fn instantiate(&self, _logger: &Logger) -> Result<Box<dyn ModelInstance>, ModelError> {
        let mut model = T::default();
        model.apply_start_values();
        Ok(Box::new(model))
    }
}
