//! FMI 2.0 `modelDescription.xml` support.
//!
//! This crate holds a value-typed, equality-comparable representation of
//! everything that goes into an FMI 2.0 model description: scalar variables
//! with their per-type payloads, unit and type definitions, the default
//! experiment, vendor annotations and the model structure. The
//! [`ModelDescription`] root renders to the XML document a simulation
//! environment validates against the library GUID, and parses back from it.

#![deny(clippy::all)]

use thiserror::Error;

mod attr_list;
mod counts;
mod model_description;
mod model_structure;
mod scalar_variable;
mod simple_type;
mod unit;

pub use attr_list::AttrList;
pub use counts::VariableCounts;
pub use model_description::{
    Annotations, Category, CoSimulation, DefaultExperiment, LOG_CATEGORY_NAMES, LogCategories,
    ModelDescription, ModelExchange, ModelVariables, ToolAnnotation, TypeDefinitions,
    UnitDefinitions,
};
pub use model_structure::{DependenciesKind, ModelStructure, Unknown, UnknownList};
pub use scalar_variable::{
    BooleanVariable, Causality, EnumerationVariable, Initial, IntegerVariable, RealVariable,
    ScalarVariable, StringVariable, VariableType, Variability,
};
pub use simple_type::{
    BooleanType, EnumerationItem, EnumerationType, IntegerType, RealType, SimpleType, StringType,
};
pub use unit::{BaseUnit, DisplayUnit, Unit};

/// The FMI version this schema implements, as it appears in the `fmiVersion`
/// root attribute.
pub const FMI_VERSION: &str = "2.0";

/// Variable naming convention emitted for generated descriptions.
pub const NAMING_CONVENTION_FLAT: &str = "flat";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("error writing XML: {0}")]
    XmlWrite(String),

    #[error("error parsing XML: {0}")]
    XmlParse(String),

    #[error("scalar variable name {0} is not unique")]
    DuplicateVariableName(String),

    #[error("value reference {reference} is used twice for base type {base_type}")]
    DuplicateValueReference {
        reference: u32,
        base_type: VariableType,
    },

    #[error("scalar variable {0} must carry exactly one type element")]
    MissingVariableType(String),

    #[error("variable {0} with causality input or independent must not define initial")]
    ForbiddenInitial(String),

    #[error("variable {0} is continuous but not of type Real")]
    ContinuousNonReal(String),

    #[error("unknown index {0} does not refer to a scalar variable")]
    UnknownIndexOutOfRange(u32),

    #[error("dependencies of unknown {0} are not in ascending order")]
    UnsortedDependencies(u32),

    #[error("dependenciesKind of unknown {index} has {kinds} entries for {dependencies} dependencies")]
    DependenciesKindMismatch {
        index: u32,
        dependencies: usize,
        kinds: usize,
    },

    #[error("malformed dependency list on unknown {index}: {message}")]
    MalformedDependencies { index: u32, message: String },

    #[error("derivative index {derivative} of variable {name} does not refer to a Real variable")]
    InvalidDerivativeIndex { name: String, derivative: u32 },
}
