use yaserde_derive::{YaDeserialize, YaSerialize};

use crate::{
    FMI_VERSION, NAMING_CONVENTION_FLAT, SchemaError,
    model_structure::{ModelStructure, UnknownList},
    scalar_variable::{Causality, ScalarVariable, Variability, VariableType},
    simple_type::SimpleType,
    unit::Unit,
};

/// Root of `modelDescription.xml`.
///
/// Constructed either programmatically or by the reflective variable builder
/// in `fmu-export-derive`; rendered with [`ModelDescription::to_xml`] and
/// parsed back with [`ModelDescription::from_xml`]. Rendering then parsing
/// then rendering again is byte-identical.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
#[yaserde(rename = "fmiModelDescription")]
pub struct ModelDescription {
    /// Version of FMI this document conforms to; always `"2.0"`.
    #[yaserde(attribute = true, rename = "fmiVersion")]
    pub fmi_version: String,

    #[yaserde(attribute = true, rename = "variableNamingConvention")]
    pub variable_naming_convention: Option<String>,

    /// The name of the model as used in the generating environment.
    #[yaserde(attribute = true, rename = "modelName")]
    pub model_name: String,

    /// Fingerprint tying this document to the compiled library. The
    /// environment passes it back at instantiation time.
    #[yaserde(attribute = true)]
    pub guid: String,

    #[yaserde(attribute = true)]
    pub description: Option<String>,

    #[yaserde(attribute = true)]
    pub author: Option<String>,

    #[yaserde(attribute = true)]
    pub version: Option<String>,

    #[yaserde(attribute = true)]
    pub copyright: Option<String>,

    #[yaserde(attribute = true)]
    pub license: Option<String>,

    #[yaserde(attribute = true, rename = "generationTool")]
    pub generation_tool: Option<String>,

    /// ISO 8601 timestamp of document generation, e.g. `2009-12-08T14:33:22Z`.
    #[yaserde(attribute = true, rename = "generationDateAndTime")]
    pub generation_date_and_time: Option<String>,

    #[yaserde(attribute = true, rename = "numberOfEventIndicators")]
    pub number_of_event_indicators: Option<u32>,

    /// Present when the FMU supports Model Exchange.
    #[yaserde(rename = "ModelExchange")]
    pub model_exchange: Option<ModelExchange>,

    /// Present when the FMU supports Co-Simulation.
    #[yaserde(rename = "CoSimulation")]
    pub co_simulation: Option<CoSimulation>,

    #[yaserde(rename = "LogCategories")]
    pub log_categories: Option<LogCategories>,

    #[yaserde(rename = "UnitDefinitions")]
    pub unit_definitions: Option<UnitDefinitions>,

    #[yaserde(rename = "TypeDefinitions")]
    pub type_definitions: Option<TypeDefinitions>,

    #[yaserde(rename = "DefaultExperiment")]
    pub default_experiment: Option<DefaultExperiment>,

    #[yaserde(rename = "VendorAnnotations")]
    pub vendor_annotations: Option<Annotations>,

    #[yaserde(rename = "ModelVariables")]
    pub model_variables: ModelVariables,

    #[yaserde(rename = "ModelStructure")]
    pub model_structure: ModelStructure,
}

/// Capability flags of the Model Exchange interface.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct ModelExchange {
    /// Short class name, usable as the shared-library prefix.
    #[yaserde(attribute = true, rename = "modelIdentifier")]
    pub model_identifier: String,

    #[yaserde(attribute = true, rename = "needsExecutionTool")]
    pub needs_execution_tool: Option<bool>,

    #[yaserde(attribute = true, rename = "canGetAndSetFMUstate")]
    pub can_get_and_set_fmu_state: Option<bool>,

    #[yaserde(attribute = true, rename = "canSerializeFMUstate")]
    pub can_serialize_fmu_state: Option<bool>,

    #[yaserde(attribute = true, rename = "providesDirectionalDerivative")]
    pub provides_directional_derivative: Option<bool>,
}

/// Capability flags of the Co-Simulation interface.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct CoSimulation {
    #[yaserde(attribute = true, rename = "modelIdentifier")]
    pub model_identifier: String,

    #[yaserde(attribute = true, rename = "needsExecutionTool")]
    pub needs_execution_tool: Option<bool>,

    #[yaserde(attribute = true, rename = "canHandleVariableCommunicationStepSize")]
    pub can_handle_variable_communication_step_size: Option<bool>,

    #[yaserde(attribute = true, rename = "canInterpolateInputs")]
    pub can_interpolate_inputs: Option<bool>,

    #[yaserde(attribute = true, rename = "maxOutputDerivativeOrder")]
    pub max_output_derivative_order: Option<u32>,

    // The misspelling is fixed by the FMI 2.0 schema.
    #[yaserde(attribute = true, rename = "canRunAsynchronuously")]
    pub can_run_asynchronously: Option<bool>,

    #[yaserde(attribute = true, rename = "canGetAndSetFMUstate")]
    pub can_get_and_set_fmu_state: Option<bool>,

    #[yaserde(attribute = true, rename = "canSerializeFMUstate")]
    pub can_serialize_fmu_state: Option<bool>,

    #[yaserde(attribute = true, rename = "providesDirectionalDerivative")]
    pub provides_directional_derivative: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct LogCategories {
    #[yaserde(rename = "Category")]
    pub categories: Vec<Category>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct Category {
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(attribute = true)]
    pub description: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct UnitDefinitions {
    #[yaserde(rename = "Unit")]
    pub units: Vec<Unit>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct TypeDefinitions {
    #[yaserde(rename = "SimpleType")]
    pub types: Vec<SimpleType>,
}

/// Default experiment bounds suggested to the environment.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct DefaultExperiment {
    #[yaserde(attribute = true, rename = "startTime")]
    pub start_time: Option<f64>,

    #[yaserde(attribute = true, rename = "stopTime")]
    pub stop_time: Option<f64>,

    #[yaserde(attribute = true)]
    pub tolerance: Option<f64>,

    #[yaserde(attribute = true, rename = "stepSize")]
    pub step_size: Option<f64>,
}

/// Tool-specific annotation list, usable both at document level
/// (`VendorAnnotations`) and per scalar variable (`Annotations`).
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct Annotations {
    #[yaserde(rename = "Tool")]
    pub tools: Vec<ToolAnnotation>,
}

/// A single tool annotation. The body is carried as opaque text.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct ToolAnnotation {
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(text = true)]
    pub content: String,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct ModelVariables {
    #[yaserde(rename = "ScalarVariable")]
    pub variables: Vec<ScalarVariable>,
}

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// The log category names every generated description advertises, in mask
/// bit order with the wildcard last.
pub const LOG_CATEGORY_NAMES: [&str; 7] = [
    "logEvents",
    "logStatusWarning",
    "logStatusDiscard",
    "logStatusError",
    "logStatusFatal",
    "logStatusPending",
    "logAll",
];

impl ModelDescription {
    /// A description with the fixed attributes and the full log category
    /// list pre-populated.
    pub fn new(model_name: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            fmi_version: FMI_VERSION.to_string(),
            variable_naming_convention: Some(NAMING_CONVENTION_FLAT.to_string()),
            model_name: model_name.into(),
            guid: guid.into(),
            log_categories: Some(LogCategories {
                categories: LOG_CATEGORY_NAMES
                    .iter()
                    .map(|name| Category {
                        name: (*name).to_string(),
                        description: None,
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    /// Render the document: UTF-8 XML 1.0 declaration, four-space indent,
    /// optional containers omitted when empty.
    pub fn to_xml(&self) -> Result<String, SchemaError> {
        let config = yaserde::ser::Config {
            perform_indent: true,
            write_document_declaration: false,
            indent_string: Some("    ".to_string()),
        };
        let body =
            yaserde::ser::to_string_with_config(self, &config).map_err(SchemaError::XmlWrite)?;
        Ok(format!("{XML_DECLARATION}\n{body}"))
    }

    pub fn from_xml(text: &str) -> Result<Self, SchemaError> {
        yaserde::de::from_str(text).map_err(SchemaError::XmlParse)
    }

    /// Check the structural invariants: unique names, per-type unique value
    /// references, initial rules, continuous-only-Real, dependency list
    /// shape and derivative indices.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let variables = &self.model_variables.variables;
        let mut names = std::collections::HashSet::new();
        let mut references = std::collections::HashSet::new();

        for variable in variables {
            if !names.insert(variable.name.as_str()) {
                return Err(SchemaError::DuplicateVariableName(variable.name.clone()));
            }

            let base_type = variable
                .variable_type()
                .ok_or_else(|| SchemaError::MissingVariableType(variable.name.clone()))?;
            if !references.insert((base_type, variable.value_reference)) {
                return Err(SchemaError::DuplicateValueReference {
                    reference: variable.value_reference,
                    base_type,
                });
            }

            let causality = variable.causality.unwrap_or_default();
            if variable.initial.is_some()
                && matches!(causality, Causality::Input | Causality::Independent)
            {
                return Err(SchemaError::ForbiddenInitial(variable.name.clone()));
            }

            if variable.variability.unwrap_or_default() == Variability::Continuous
                && base_type != VariableType::Real
            {
                return Err(SchemaError::ContinuousNonReal(variable.name.clone()));
            }

            if let Some(derivative) = variable.real.as_ref().and_then(|real| real.derivative) {
                let refers_to_real = derivative >= 1
                    && variables
                        .get(derivative as usize - 1)
                        .is_some_and(|target| target.real.is_some());
                if !refers_to_real {
                    return Err(SchemaError::InvalidDerivativeIndex {
                        name: variable.name.clone(),
                        derivative,
                    });
                }
            }
        }

        for list in [
            &self.model_structure.outputs,
            &self.model_structure.derivatives,
            &self.model_structure.initial_unknowns,
        ]
        .into_iter()
        .flatten()
        {
            self.validate_unknowns(list, variables.len())?;
        }

        Ok(())
    }

    fn validate_unknowns(&self, list: &UnknownList, variables: usize) -> Result<(), SchemaError> {
        for unknown in &list.unknowns {
            if unknown.index == 0 || unknown.index as usize > variables {
                return Err(SchemaError::UnknownIndexOutOfRange(unknown.index));
            }

            let dependencies = unknown.dependency_indices().map_err(|message| {
                SchemaError::MalformedDependencies {
                    index: unknown.index,
                    message,
                }
            })?;
            let kinds = unknown.dependency_kinds().map_err(|message| {
                SchemaError::MalformedDependencies {
                    index: unknown.index,
                    message,
                }
            })?;

            if let Some(dependencies) = &dependencies {
                if !dependencies.is_sorted() {
                    return Err(SchemaError::UnsortedDependencies(unknown.index));
                }
                if dependencies.iter().any(|&dep| dep == 0 || dep as usize > variables) {
                    return Err(SchemaError::UnknownIndexOutOfRange(unknown.index));
                }
            }

            if let Some(kinds) = kinds {
                let dependencies = dependencies.as_deref().unwrap_or_default();
                if kinds.len() != dependencies.len() {
                    return Err(SchemaError::DependenciesKindMismatch {
                        index: unknown.index,
                        dependencies: dependencies.len(),
                        kinds: kinds.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar_variable::{Initial, IntegerVariable, RealVariable};
    use crate::model_structure::Unknown;

    fn real_variable(name: &str, reference: u32) -> ScalarVariable {
        ScalarVariable {
            name: name.into(),
            value_reference: reference,
            real: Some(RealVariable::default()),
            ..Default::default()
        }
    }

    fn description_with(variables: Vec<ScalarVariable>) -> ModelDescription {
        let mut description = ModelDescription::new("model", "guid");
        description.model_variables.variables = variables;
        description
    }

    #[test]
    fn new_populates_fixed_attributes_and_log_categories() {
        let description = ModelDescription::new("name", "guid");
        assert_eq!(description.fmi_version, "2.0");
        assert_eq!(description.variable_naming_convention.as_deref(), Some("flat"));
        let categories = description.log_categories.unwrap().categories;
        assert_eq!(categories.len(), 7);
        assert_eq!(categories[0].name, "logEvents");
        assert_eq!(categories[6].name, "logAll");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let description =
            description_with(vec![real_variable("x", 1), real_variable("x", 2)]);
        assert!(matches!(
            description.validate(),
            Err(SchemaError::DuplicateVariableName(name)) if name == "x"
        ));
    }

    #[test]
    fn value_references_are_unique_per_base_type() {
        let mut integer = ScalarVariable {
            name: "count".into(),
            value_reference: 1,
            integer: Some(IntegerVariable::default()),
            variability: Some(Variability::Discrete),
            ..Default::default()
        };
        // Same reference as the Real variable, different base type: allowed.
        let description =
            description_with(vec![real_variable("x", 1), integer.clone()]);
        assert!(description.validate().is_ok());

        integer.name = "other".into();
        integer.value_reference = 2;
        let description = description_with(vec![
            real_variable("x", 2),
            real_variable("y", 2),
            integer,
        ]);
        assert!(matches!(
            description.validate(),
            Err(SchemaError::DuplicateValueReference { reference: 2, .. })
        ));
    }

    #[test]
    fn inputs_must_not_define_initial() {
        let mut variable = real_variable("u", 1);
        variable.causality = Some(Causality::Input);
        variable.initial = Some(Initial::Exact);
        let description = description_with(vec![variable]);
        assert!(matches!(
            description.validate(),
            Err(SchemaError::ForbiddenInitial(name)) if name == "u"
        ));
    }

    #[test]
    fn only_reals_may_be_continuous() {
        let variable = ScalarVariable {
            name: "n".into(),
            value_reference: 1,
            variability: Some(Variability::Continuous),
            integer: Some(IntegerVariable::default()),
            ..Default::default()
        };
        let description = description_with(vec![variable]);
        assert!(matches!(
            description.validate(),
            Err(SchemaError::ContinuousNonReal(name)) if name == "n"
        ));
    }

    #[test]
    fn derivative_must_refer_to_a_real_variable() {
        let mut der = real_variable("der_x", 2);
        der.real.as_mut().unwrap().derivative = Some(5);
        let description = description_with(vec![real_variable("x", 1), der]);
        assert!(matches!(
            description.validate(),
            Err(SchemaError::InvalidDerivativeIndex { derivative: 5, .. })
        ));
    }

    #[test]
    fn dependencies_must_be_sorted_and_matched_by_kinds() {
        let mut description =
            description_with(vec![real_variable("x", 1), real_variable("y", 2)]);
        description.model_structure.outputs = Some(UnknownList::new(vec![
            Unknown::with_dependencies(1, &[2, 1]),
        ]));
        assert!(matches!(
            description.validate(),
            Err(SchemaError::UnsortedDependencies(1))
        ));

        description.model_structure.outputs = Some(UnknownList::new(vec![Unknown {
            index: 1,
            dependencies: Some("1 2".into()),
            dependencies_kind: Some("constant".into()),
        }]));
        assert!(matches!(
            description.validate(),
            Err(SchemaError::DependenciesKindMismatch { index: 1, dependencies: 2, kinds: 1 })
        ));
    }

    #[test]
    fn unknown_indices_must_be_in_range() {
        let mut description = description_with(vec![real_variable("x", 1)]);
        description.model_structure.derivatives =
            Some(UnknownList::new(vec![Unknown::new(4)]));
        assert!(matches!(
            description.validate(),
            Err(SchemaError::UnknownIndexOutOfRange(4))
        ));
    }
}
