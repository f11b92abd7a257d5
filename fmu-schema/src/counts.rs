use crate::{
    model_description::ModelDescription,
    scalar_variable::{Causality, Variability, VariableType},
};

/// Tallies over the scalar-variable list, useful for sanity checks and for
/// reporting what a model exposes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VariableCounts {
    pub num_constants: usize,
    pub num_fixed: usize,
    pub num_tunable: usize,
    pub num_discrete: usize,
    pub num_continuous: usize,
    pub num_parameters: usize,
    pub num_calculated_parameters: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_local: usize,
    pub num_independent: usize,
    pub num_real_vars: usize,
    pub num_integer_vars: usize,
    pub num_boolean_vars: usize,
    pub num_string_vars: usize,
    pub num_enumeration_vars: usize,
}

impl ModelDescription {
    /// Count variables by variability, causality and base type. Omitted
    /// attributes count under their FMI defaults (`local`, `continuous`).
    pub fn model_counts(&self) -> VariableCounts {
        self.model_variables.variables.iter().fold(
            VariableCounts::default(),
            |mut counts, variable| {
                match variable.variability.unwrap_or_default() {
                    Variability::Constant => counts.num_constants += 1,
                    Variability::Fixed => counts.num_fixed += 1,
                    Variability::Tunable => counts.num_tunable += 1,
                    Variability::Discrete => counts.num_discrete += 1,
                    Variability::Continuous => counts.num_continuous += 1,
                }
                match variable.causality.unwrap_or_default() {
                    Causality::Parameter => counts.num_parameters += 1,
                    Causality::CalculatedParameter => counts.num_calculated_parameters += 1,
                    Causality::Input => counts.num_inputs += 1,
                    Causality::Output => counts.num_outputs += 1,
                    Causality::Local => counts.num_local += 1,
                    Causality::Independent => counts.num_independent += 1,
                }
                match variable.variable_type() {
                    Some(VariableType::Real) => counts.num_real_vars += 1,
                    Some(VariableType::Integer) => counts.num_integer_vars += 1,
                    Some(VariableType::Boolean) => counts.num_boolean_vars += 1,
                    Some(VariableType::String) => counts.num_string_vars += 1,
                    Some(VariableType::Enumeration) => counts.num_enumeration_vars += 1,
                    None => {}
                }
                counts
            },
        )
    }

    /// Number of continuous-time states, read off the derivatives list.
    pub fn num_states(&self) -> usize {
        self.model_structure
            .derivatives
            .as_ref()
            .map(|list| list.unknowns.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model_structure::{Unknown, UnknownList},
        scalar_variable::{BooleanVariable, IntegerVariable, RealVariable, ScalarVariable},
    };

    #[test]
    fn counts_cover_causality_variability_and_type() {
        let mut description = ModelDescription::new("counted", "guid");
        description.model_variables.variables = vec![
            ScalarVariable {
                name: "x".into(),
                value_reference: 1,
                causality: Some(Causality::Output),
                variability: Some(Variability::Continuous),
                real: Some(RealVariable::default()),
                ..Default::default()
            },
            ScalarVariable {
                name: "k".into(),
                value_reference: 2,
                causality: Some(Causality::Parameter),
                variability: Some(Variability::Fixed),
                real: Some(RealVariable::default()),
                ..Default::default()
            },
            ScalarVariable {
                name: "n".into(),
                value_reference: 1,
                variability: Some(Variability::Discrete),
                integer: Some(IntegerVariable::default()),
                ..Default::default()
            },
            ScalarVariable {
                name: "on".into(),
                value_reference: 1,
                causality: Some(Causality::Input),
                variability: Some(Variability::Discrete),
                boolean: Some(BooleanVariable::default()),
                ..Default::default()
            },
        ];

        let counts = description.model_counts();
        assert_eq!(counts.num_continuous, 1);
        assert_eq!(counts.num_fixed, 1);
        assert_eq!(counts.num_discrete, 2);
        assert_eq!(counts.num_outputs, 1);
        assert_eq!(counts.num_parameters, 1);
        assert_eq!(counts.num_inputs, 1);
        assert_eq!(counts.num_local, 1);
        assert_eq!(counts.num_real_vars, 2);
        assert_eq!(counts.num_integer_vars, 1);
        assert_eq!(counts.num_boolean_vars, 1);
        assert_eq!(counts.num_string_vars, 0);
    }

    #[test]
    fn omitted_attributes_count_under_their_defaults() {
        let mut description = ModelDescription::new("defaults", "guid");
        description.model_variables.variables = vec![ScalarVariable {
            name: "x".into(),
            value_reference: 1,
            real: Some(RealVariable::default()),
            ..Default::default()
        }];
        let counts = description.model_counts();
        assert_eq!(counts.num_local, 1);
        assert_eq!(counts.num_continuous, 1);
    }

    #[test]
    fn states_are_counted_from_the_derivatives_list() {
        let mut description = ModelDescription::new("states", "guid");
        assert_eq!(description.num_states(), 0);
        description.model_structure.derivatives = Some(UnknownList::new(vec![
            Unknown::new(1),
            Unknown::new(2),
        ]));
        assert_eq!(description.num_states(), 2);
    }
}
