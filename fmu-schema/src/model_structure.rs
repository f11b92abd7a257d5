use std::{fmt::Display, str::FromStr};

use yaserde_derive::{YaDeserialize, YaSerialize};

use crate::attr_list::AttrList;

/// Ordered lists of the outputs, state derivatives and initial unknowns of
/// the model, each referring to scalar variables by 1-based index.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
#[yaserde(rename = "ModelStructure")]
pub struct ModelStructure {
    #[yaserde(rename = "Outputs")]
    pub outputs: Option<UnknownList>,

    #[yaserde(rename = "Derivatives")]
    pub derivatives: Option<UnknownList>,

    #[yaserde(rename = "InitialUnknowns")]
    pub initial_unknowns: Option<UnknownList>,
}

#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct UnknownList {
    #[yaserde(rename = "Unknown")]
    pub unknowns: Vec<Unknown>,
}

impl UnknownList {
    pub fn new(unknowns: Vec<Unknown>) -> Self {
        Self { unknowns }
    }
}

/// Dependency of a scalar unknown on known variables:
/// `Unknown = f(Known_1, Known_2, ...)`.
///
/// The dependency attributes are space-delimited index lists in the XML; the
/// typed accessors parse and render them, tolerating any whitespace.
#[derive(Clone, Default, PartialEq, Debug, YaSerialize, YaDeserialize)]
pub struct Unknown {
    /// 1-based index of the unknown in the scalar-variable list.
    #[yaserde(attribute = true)]
    pub index: u32,

    /// If absent, the unknown depends on all knowns. If present, the listed
    /// scalar-variable indices, ordered ascending.
    #[yaserde(attribute = true)]
    pub dependencies: Option<String>,

    /// When present, one entry per dependency describing how the known
    /// enters the equation.
    #[yaserde(attribute = true, rename = "dependenciesKind")]
    pub dependencies_kind: Option<String>,
}

impl Unknown {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn with_dependencies(index: u32, dependencies: &[u32]) -> Self {
        Self {
            index,
            dependencies: Some(AttrList(dependencies.to_vec()).to_string()),
            dependencies_kind: None,
        }
    }

    pub fn with_dependency_kinds(
        index: u32,
        dependencies: &[u32],
        kinds: &[DependenciesKind],
    ) -> Self {
        Self {
            index,
            dependencies: Some(AttrList(dependencies.to_vec()).to_string()),
            dependencies_kind: Some(AttrList(kinds.to_vec()).to_string()),
        }
    }

    /// Parsed dependency indices; `None` means "depends on all knowns".
    pub fn dependency_indices(&self) -> Result<Option<Vec<u32>>, String> {
        self.dependencies
            .as_deref()
            .map(|text| {
                text.parse::<AttrList<u32>>()
                    .map(|list| list.0)
                    .map_err(|err| err.to_string())
            })
            .transpose()
    }

    /// Parsed dependency kinds, when present.
    pub fn dependency_kinds(&self) -> Result<Option<Vec<DependenciesKind>>, String> {
        self.dependencies_kind
            .as_deref()
            .map(|text| text.parse::<AttrList<DependenciesKind>>().map(|list| list.0))
            .transpose()
    }
}

/// How a known variable enters the equation of an unknown.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum DependenciesKind {
    #[default]
    Dependent,
    Constant,
    Fixed,
    Tunable,
    Discrete,
}

impl FromStr for DependenciesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependent" => Ok(DependenciesKind::Dependent),
            "constant" => Ok(DependenciesKind::Constant),
            "fixed" => Ok(DependenciesKind::Fixed),
            "tunable" => Ok(DependenciesKind::Tunable),
            "discrete" => Ok(DependenciesKind::Discrete),
            other => Err(format!("unknown dependenciesKind value '{other}'")),
        }
    }
}

impl Display for DependenciesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DependenciesKind::Dependent => "dependent",
            DependenciesKind::Constant => "constant",
            DependenciesKind::Fixed => "fixed",
            DependenciesKind::Tunable => "tunable",
            DependenciesKind::Discrete => "discrete",
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_lists_render_space_delimited() {
        let unknown = Unknown::with_dependency_kinds(
            1,
            &[2, 3, 4],
            &[
                DependenciesKind::Constant,
                DependenciesKind::Dependent,
                DependenciesKind::Fixed,
            ],
        );
        assert_eq!(unknown.dependencies.as_deref(), Some("2 3 4"));
        assert_eq!(
            unknown.dependencies_kind.as_deref(),
            Some("constant dependent fixed")
        );
    }

    #[test]
    fn dependency_lists_parse_leniently() {
        let unknown = Unknown {
            index: 3,
            dependencies: Some("1\t 2  3".into()),
            dependencies_kind: Some(" constant   tunable discrete ".into()),
        };
        assert_eq!(unknown.dependency_indices().unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(
            unknown.dependency_kinds().unwrap(),
            Some(vec![
                DependenciesKind::Constant,
                DependenciesKind::Tunable,
                DependenciesKind::Discrete,
            ])
        );
    }

    #[test]
    fn absent_dependencies_mean_depends_on_all() {
        let unknown = Unknown::new(2);
        assert_eq!(unknown.dependency_indices().unwrap(), None);
        assert_eq!(unknown.dependency_kinds().unwrap(), None);
    }

    #[test]
    fn malformed_dependency_list_is_an_error() {
        let unknown = Unknown {
            index: 1,
            dependencies: Some("1 two".into()),
            dependencies_kind: None,
        };
        assert!(unknown.dependency_indices().is_err());
    }
}
