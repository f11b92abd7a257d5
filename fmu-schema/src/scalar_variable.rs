use std::{fmt::Display, str::FromStr};

use yaserde_derive::{YaDeserialize, YaSerialize};

use crate::model_description::Annotations;

/// Enumeration that defines the causality of a variable, in other words its
/// role seen from the outside of the model.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, YaSerialize, YaDeserialize)]
pub enum Causality {
    #[yaserde(rename = "parameter")]
    Parameter,
    #[yaserde(rename = "calculatedParameter")]
    CalculatedParameter,
    #[yaserde(rename = "input")]
    Input,
    #[yaserde(rename = "output")]
    Output,
    #[default]
    #[yaserde(rename = "local")]
    Local,
    #[yaserde(rename = "independent")]
    Independent,
}

/// Enumeration that defines the time instants at which a variable may change
/// its value. Only `Real` variables may be continuous.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, YaSerialize, YaDeserialize)]
pub enum Variability {
    #[yaserde(rename = "constant")]
    Constant,
    #[yaserde(rename = "fixed")]
    Fixed,
    #[yaserde(rename = "tunable")]
    Tunable,
    #[yaserde(rename = "discrete")]
    Discrete,
    #[default]
    #[yaserde(rename = "continuous")]
    Continuous,
}

/// Enumeration that defines how the start value of a variable is determined.
/// Must be absent for `input` and `independent` causality.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, YaSerialize, YaDeserialize)]
pub enum Initial {
    #[default]
    #[yaserde(rename = "exact")]
    Exact,
    #[yaserde(rename = "approx")]
    Approx,
    #[yaserde(rename = "calculated")]
    Calculated,
}

macro_rules! spellings {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    // Absence of text defaults to the first variant.
                    "" => Ok(Self::default()),
                    other => Err(format!(
                        concat!("unknown ", stringify!($ty), " value '{}'"),
                        other
                    )),
                }
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $($ty::$variant => $text,)+
                };
                write!(f, "{}", text)
            }
        }
    };
}

spellings!(Causality {
    Parameter => "parameter",
    CalculatedParameter => "calculatedParameter",
    Input => "input",
    Output => "output",
    Local => "local",
    Independent => "independent",
});

spellings!(Variability {
    Constant => "constant",
    Fixed => "fixed",
    Tunable => "tunable",
    Discrete => "discrete",
    Continuous => "continuous",
});

spellings!(Initial {
    Exact => "exact",
    Approx => "approx",
    Calculated => "calculated",
});

impl Initial {
    /// The FMI 2.0 default for `initial` when the attribute is omitted.
    ///
    /// `input` and `independent` variables carry no initial at all; for the
    /// remaining combinations the default follows the table in section
    /// 2.2.7 of the standard.
    pub fn derived_from(causality: Causality, variability: Variability) -> Option<Initial> {
        match causality {
            Causality::Input | Causality::Independent => None,
            Causality::Parameter => Some(Initial::Exact),
            Causality::CalculatedParameter => Some(Initial::Calculated),
            Causality::Output | Causality::Local => match variability {
                Variability::Constant => Some(Initial::Exact),
                _ => Some(Initial::Calculated),
            },
        }
    }
}

/// The base type of a scalar variable, used to scope value-reference
/// uniqueness and to name type mismatches in error messages.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VariableType {
    Real,
    Integer,
    Boolean,
    String,
    Enumeration,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            VariableType::Real => "Real",
            VariableType::Integer => "Integer",
            VariableType::Boolean => "Boolean",
            VariableType::String => "String",
            VariableType::Enumeration => "Enumeration",
        };
        write!(f, "{}", text)
    }
}

/// Type-specific payload of a `Real` scalar variable.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct RealVariable {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true)]
    pub unit: Option<String>,

    #[yaserde(attribute = true, rename = "displayUnit")]
    pub display_unit: Option<String>,

    #[yaserde(attribute = true, rename = "relativeQuantity")]
    pub relative_quantity: Option<bool>,

    #[yaserde(attribute = true)]
    pub min: Option<f64>,

    /// max >= min required.
    #[yaserde(attribute = true)]
    pub max: Option<f64>,

    /// nominal >= min and nominal <= max required.
    #[yaserde(attribute = true)]
    pub nominal: Option<f64>,

    #[yaserde(attribute = true)]
    pub unbounded: Option<bool>,

    /// Name of a type defined under `TypeDefinitions` providing defaults.
    #[yaserde(attribute = true, rename = "declaredType")]
    pub declared_type: Option<String>,

    /// Value before initialization, required if initial is exact or approx.
    #[yaserde(attribute = true)]
    pub start: Option<f64>,

    /// If present, this variable is the derivative of the scalar variable
    /// with the given 1-based index.
    #[yaserde(attribute = true)]
    pub derivative: Option<u32>,

    /// Only for Model Exchange continuous-time states: whether the state can
    /// be reinitialized at an event by the FMU.
    #[yaserde(attribute = true)]
    pub reinit: Option<bool>,
}

/// Type-specific payload of an `Integer` scalar variable.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct IntegerVariable {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true)]
    pub min: Option<i32>,

    #[yaserde(attribute = true)]
    pub max: Option<i32>,

    #[yaserde(attribute = true, rename = "declaredType")]
    pub declared_type: Option<String>,

    #[yaserde(attribute = true)]
    pub start: Option<i32>,
}

/// Type-specific payload of a `Boolean` scalar variable.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct BooleanVariable {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true, rename = "declaredType")]
    pub declared_type: Option<String>,

    #[yaserde(attribute = true)]
    pub start: Option<bool>,
}

/// Type-specific payload of a `String` scalar variable.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct StringVariable {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true, rename = "declaredType")]
    pub declared_type: Option<String>,

    #[yaserde(attribute = true)]
    pub start: Option<String>,
}

/// Type-specific payload of an `Enumeration` scalar variable. The declared
/// type names an `EnumerationType` under `TypeDefinitions`.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct EnumerationVariable {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true)]
    pub min: Option<i32>,

    #[yaserde(attribute = true)]
    pub max: Option<i32>,

    #[yaserde(attribute = true, rename = "declaredType")]
    pub declared_type: Option<String>,

    #[yaserde(attribute = true)]
    pub start: Option<i32>,
}

/// One named quantity exposed across the FMI surface. Exactly one of the
/// per-type payload elements must be present.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
#[yaserde(rename = "ScalarVariable")]
pub struct ScalarVariable {
    /// The full, globally unique name of the variable.
    #[yaserde(attribute = true)]
    pub name: String,

    /// Handle identifying the variable value in typed get/set calls. Unique
    /// within a base type; the first declared variable has reference 1.
    #[yaserde(attribute = true, rename = "valueReference")]
    pub value_reference: u32,

    #[yaserde(attribute = true)]
    pub description: Option<String>,

    #[yaserde(attribute = true)]
    pub causality: Option<Causality>,

    #[yaserde(attribute = true)]
    pub variability: Option<Variability>,

    #[yaserde(attribute = true)]
    pub initial: Option<Initial>,

    /// Only relevant for Model Exchange inputs.
    #[yaserde(attribute = true, rename = "canHandleMultipleSetPerTimeInstant")]
    pub can_handle_multiple_set_per_time_instant: Option<bool>,

    #[yaserde(rename = "Annotations")]
    pub annotations: Option<Annotations>,

    #[yaserde(rename = "Real")]
    pub real: Option<RealVariable>,

    #[yaserde(rename = "Integer")]
    pub integer: Option<IntegerVariable>,

    #[yaserde(rename = "Boolean")]
    pub boolean: Option<BooleanVariable>,

    #[yaserde(rename = "String")]
    pub string: Option<StringVariable>,

    #[yaserde(rename = "Enumeration")]
    pub enumeration: Option<EnumerationVariable>,
}

impl ScalarVariable {
    /// The base type of the payload element, if exactly one is present.
    pub fn variable_type(&self) -> Option<VariableType> {
        let mut found = None;
        let mut count = 0;
        if self.real.is_some() {
            found = Some(VariableType::Real);
            count += 1;
        }
        if self.integer.is_some() {
            found = Some(VariableType::Integer);
            count += 1;
        }
        if self.boolean.is_some() {
            found = Some(VariableType::Boolean);
            count += 1;
        }
        if self.string.is_some() {
            found = Some(VariableType::String);
            count += 1;
        }
        if self.enumeration.is_some() {
            found = Some(VariableType::Enumeration);
            count += 1;
        }
        if count == 1 { found } else { None }
    }

    /// The effective `initial`, falling back to the FMI defaults when the
    /// attribute is omitted.
    pub fn effective_initial(&self) -> Option<Initial> {
        self.initial.or_else(|| {
            Initial::derived_from(
                self.causality.unwrap_or_default(),
                self.variability.unwrap_or_default(),
            )
        })
    }
}
