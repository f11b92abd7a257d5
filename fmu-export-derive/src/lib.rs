//! `#[derive(FmuModel)]`: the reflective variable builder.
//!
//! Derives the `ModelVariables` contract from a declarative model struct:
//! one scalar variable per public field in declaration order (first field
//! gets value reference 1), typed getters and setters, start-value
//! application, and a state encode/decode pair over the runtime's
//! self-describing binary format.

#![deny(clippy::all)]

use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;
use syn::{DeriveInput, parse_macro_input};

mod codegen;
mod model;

/// Derive the FMI variable surface for a model struct.
///
/// ```rust,ignore
/// #[derive(FmuModel, Default)]
/// #[model(guid = "{2d5ad039-5b33-4b1a-9405-e2455d930aed}")]
/// struct BouncingBall {
///     /// Height above ground.
///     #[variable(causality = "output", start = 1.0, unit = "m")]
///     pub h: f64,
/// }
/// ```
///
/// Supported field types are `f64`, `i32`, `bool` and `String`. Tag values
/// use the FMI textual spellings (`causality = "calculatedParameter"`,
/// `variability = "tunable"`, `initial = "approx"`, ...); unknown spellings,
/// non-public fields and unsupported types are compile errors naming the
/// offending field.
#[proc_macro_derive(FmuModel, attributes(model, variable))]
#[proc_macro_error]
pub fn derive_fmu_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let model = model::ModelDef::parse(&input);
    codegen::expand(&model).into()
}
