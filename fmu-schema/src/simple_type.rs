use yaserde_derive::{YaDeserialize, YaSerialize};

/// A named type under `TypeDefinitions`, referenced by scalar variables via
/// their `declaredType` attribute. Exactly one payload element is present.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
#[yaserde(rename = "SimpleType")]
pub struct SimpleType {
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(attribute = true)]
    pub description: Option<String>,

    #[yaserde(rename = "Real")]
    pub real: Option<RealType>,

    #[yaserde(rename = "Integer")]
    pub integer: Option<IntegerType>,

    #[yaserde(rename = "Boolean")]
    pub boolean: Option<BooleanType>,

    #[yaserde(rename = "String")]
    pub string: Option<StringType>,

    #[yaserde(rename = "Enumeration")]
    pub enumeration: Option<EnumerationType>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct RealType {
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

    #[yaserde(attribute = true)]
    pub max: Option<f64>,

    #[yaserde(attribute = true)]
    pub nominal: Option<f64>,

    #[yaserde(attribute = true)]
    pub unbounded: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct IntegerType {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(attribute = true)]
    pub min: Option<i32>,

    #[yaserde(attribute = true)]
    pub max: Option<i32>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct BooleanType {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct StringType {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,
}

/// Enumeration type with its ordered items. Item values are unique within
/// the enumeration but need not be consecutive.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct EnumerationType {
    #[yaserde(attribute = true)]
    pub quantity: Option<String>,

    #[yaserde(rename = "Item")]
    pub items: Vec<EnumerationItem>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct EnumerationItem {
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(attribute = true)]
    pub value: i32,

    #[yaserde(attribute = true)]
    pub description: Option<String>,
}
