use yaserde_derive::{YaDeserialize, YaSerialize};

/// Unit definition with respect to SI base units, plus display units whose
/// conversion to the base unit is given by `factor` and `offset`.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
#[yaserde(rename = "Unit")]
pub struct Unit {
    /// Unique name of the unit, for example `"N.m"`.
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(rename = "BaseUnit")]
    pub base_unit: Option<BaseUnit>,

    #[yaserde(rename = "DisplayUnit")]
    pub display_units: Vec<DisplayUnit>,
}

/// Exponents of the SI base units, and the linear conversion
/// `unit = factor * base + offset`. Omitted exponents are zero.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct BaseUnit {
    #[yaserde(attribute = true)]
    pub kg: Option<i32>,

    #[yaserde(attribute = true)]
    pub m: Option<i32>,

    #[yaserde(attribute = true)]
    pub s: Option<i32>,

    #[yaserde(attribute = true, rename = "A")]
    pub ampere: Option<i32>,

    #[yaserde(attribute = true, rename = "K")]
    pub kelvin: Option<i32>,

    #[yaserde(attribute = true)]
    pub mol: Option<i32>,

    #[yaserde(attribute = true)]
    pub cd: Option<i32>,

    #[yaserde(attribute = true)]
    pub rad: Option<i32>,

    #[yaserde(attribute = true)]
    pub factor: Option<f64>,

    #[yaserde(attribute = true)]
    pub offset: Option<f64>,
}

/// Alternative display unit for values carried in the base unit.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct DisplayUnit {
    #[yaserde(attribute = true)]
    pub name: String,

    #[yaserde(attribute = true)]
    pub factor: Option<f64>,

    #[yaserde(attribute = true)]
    pub offset: Option<f64>,
}
