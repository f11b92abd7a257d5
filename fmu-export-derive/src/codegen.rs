//! Token generation for the `ModelVariables` implementation.

use proc_macro2::TokenStream;
use quote::quote;

use fmu_schema::{Causality, Initial, Variability};

use crate::model::{FieldDef, FieldKind, ModelDef, StartValue};

pub fn expand(model: &ModelDef) -> TokenStream {
    let ident = &model.ident;
    let guid = &model.guid;

    let variables = variable_exprs(model);
    let description = description_fn(model);
    let start_values = start_value_stmts(model);
    let encode = encode_fns(model);

    let get_real = getter(model, FieldKind::Real, quote!(f64));
    let get_integer = getter(model, FieldKind::Integer, quote!(i32));
    let get_boolean = getter(model, FieldKind::Boolean, quote!(bool));
    let get_string = getter(model, FieldKind::String, quote!(String));

    let set_real = setter(model, FieldKind::Real, quote!(f64));
    let set_integer = setter(model, FieldKind::Integer, quote!(i32));
    let set_boolean = setter(model, FieldKind::Boolean, quote!(bool));
    let set_string = setter(model, FieldKind::String, quote!(String));

    quote! {
        impl ::fmu_export::ModelVariables for #ident {
            const GUID: &'static str = #guid;

            #description

            fn variables() -> ::std::vec::Vec<::fmu_export::fmu_schema::ScalarVariable> {
                ::std::vec![ #(#variables),* ]
            }

            fn apply_start_values(&mut self) {
                #(#start_values)*
            }

            #get_real
            #get_integer
            #get_boolean
            #get_string

            #set_real
            #set_integer
            #set_boolean
            #set_string

            #encode
        }
    }
}

fn getter_name(kind: FieldKind) -> TokenStream {
    match kind {
        FieldKind::Real => quote!(get_real),
        FieldKind::Integer => quote!(get_integer),
        FieldKind::Boolean => quote!(get_boolean),
        FieldKind::String => quote!(get_string),
    }
}

fn setter_name(kind: FieldKind) -> TokenStream {
    match kind {
        FieldKind::Real => quote!(set_real),
        FieldKind::Integer => quote!(set_integer),
        FieldKind::Boolean => quote!(set_boolean),
        FieldKind::String => quote!(set_string),
    }
}

fn getter(model: &ModelDef, kind: FieldKind, value_ty: TokenStream) -> TokenStream {
    let fn_name = getter_name(kind);
    let expected = kind.name();
    let field_count = model.fields.len() as u32;

    let arms: Vec<TokenStream> = model
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.kind == kind)
        .map(|(index, field)| {
            let vr = index as u32 + 1;
            let ident = &field.ident;
            if kind == FieldKind::String {
                quote!(#vr => self.#ident.clone(),)
            } else {
                quote!(#vr => self.#ident,)
            }
        })
        .collect();

    quote! {
        // The range arm is redundant when every field has this base type.
        #[allow(unreachable_patterns)]
        fn #fn_name(
            &self,
            vrs: &[::fmu_export::ValueReference],
        ) -> ::std::result::Result<::std::vec::Vec<#value_ty>, ::fmu_export::ModelError> {
            let mut values = ::std::vec::Vec::with_capacity(vrs.len());
            for &vr in vrs {
                values.push(match vr {
                    #(#arms)*
                    1..=#field_count => {
                        return Err(::fmu_export::ModelError::TypeMismatch {
                            vr,
                            expected: #expected,
                        });
                    }
                    _ => return Err(::fmu_export::ModelError::UnknownValueReference(vr)),
                });
            }
            Ok(values)
        }
    }
}

fn setter(model: &ModelDef, kind: FieldKind, value_ty: TokenStream) -> TokenStream {
    let fn_name = setter_name(kind);
    let expected = kind.name();
    let field_count = model.fields.len() as u32;

    let mut check_arms = Vec::new();
    let mut apply_arms = Vec::new();
    for (index, field) in model.fields.iter().enumerate() {
        if field.kind != kind {
            continue;
        }
        let vr = index as u32 + 1;
        let ident = &field.ident;
        if field.is_constant() {
            let name = field.ident.to_string();
            check_arms.push(quote! {
                #vr => return Err(::fmu_export::ModelError::ConstantVariable(#name)),
            });
        } else {
            check_arms.push(quote!(#vr => {}));
            if kind == FieldKind::String {
                apply_arms.push(quote!(#vr => self.#ident = value.clone(),));
            } else {
                apply_arms.push(quote!(#vr => self.#ident = *value,));
            }
        }
    }

    quote! {
        // The range arm is redundant when every field has this base type,
        // and the value binding is unused when no field does.
        #[allow(unreachable_patterns, unused_variables)]
        fn #fn_name(
            &mut self,
            vrs: &[::fmu_export::ValueReference],
            values: &[#value_ty],
        ) -> ::std::result::Result<(), ::fmu_export::ModelError> {
            if vrs.len() != values.len() {
                return Err(::fmu_export::ModelError::CountMismatch {
                    references: vrs.len(),
                    values: values.len(),
                });
            }
            // Validate every pair before the first mutation so a failed
            // call leaves the model untouched.
            for &vr in vrs {
                match vr {
                    #(#check_arms)*
                    1..=#field_count => {
                        return Err(::fmu_export::ModelError::TypeMismatch {
                            vr,
                            expected: #expected,
                        });
                    }
                    _ => return Err(::fmu_export::ModelError::UnknownValueReference(vr)),
                }
            }
            for (&vr, value) in vrs.iter().zip(values) {
                match vr {
                    #(#apply_arms)*
                    _ => {}
                }
            }
            Ok(())
        }
    }
}

fn start_value_stmts(model: &ModelDef) -> Vec<TokenStream> {
    model
        .fields
        .iter()
        .filter_map(|field| {
            let ident = &field.ident;
            field.start.as_ref().map(|start| match start {
                StartValue::Real(value) => {
                    let value = f64_tokens(*value);
                    quote!(self.#ident = #value;)
                }
                StartValue::Integer(value) => {
                    let value = i32_tokens(*value);
                    quote!(self.#ident = #value;)
                }
                StartValue::Boolean(value) => quote!(self.#ident = #value;),
                StartValue::String(value) => quote!(self.#ident = #value.to_string();),
            })
        })
        .collect()
}

fn encode_fns(model: &ModelDef) -> TokenStream {
    let field_count = model.fields.len() as u32;

    let writes: Vec<TokenStream> = model
        .fields
        .iter()
        .map(|field| {
            let ident = &field.ident;
            match field.kind {
                FieldKind::Real => quote!(writer.write_real(self.#ident);),
                FieldKind::Integer => quote!(writer.write_integer(self.#ident);),
                FieldKind::Boolean => quote!(writer.write_boolean(self.#ident);),
                FieldKind::String => quote!(writer.write_string(&self.#ident);),
            }
        })
        .collect();

    let reads: Vec<TokenStream> = model
        .fields
        .iter()
        .map(|field| {
            let ident = &field.ident;
            match field.kind {
                FieldKind::Real => quote!(self.#ident = reader.read_real()?;),
                FieldKind::Integer => quote!(self.#ident = reader.read_integer()?;),
                FieldKind::Boolean => quote!(self.#ident = reader.read_boolean()?;),
                FieldKind::String => quote!(self.#ident = reader.read_string()?;),
            }
        })
        .collect();

    quote! {
        fn encode_state(&self) -> ::std::result::Result<::std::vec::Vec<u8>, ::fmu_export::ModelError> {
            let mut writer = ::fmu_export::codec::StateWriter::new(#field_count);
            #(#writes)*
            Ok(writer.finish())
        }

        fn decode_state(&mut self, bytes: &[u8]) -> ::std::result::Result<(), ::fmu_export::ModelError> {
            let mut reader = ::fmu_export::codec::StateReader::new(bytes, #field_count)?;
            #(#reads)*
            reader.finish()?;
            Ok(())
        }
    }
}

fn description_fn(model: &ModelDef) -> TokenStream {
    let model_name = &model.model_name;
    let description = opt_string(&model.description);

    let outputs: Vec<u32> = model
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.causality == Some(Causality::Output))
        .map(|(index, _)| index as u32 + 1)
        .collect();
    let derivatives: Vec<u32> = model
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.derivative.is_some())
        .map(|(index, _)| index as u32 + 1)
        .collect();

    let outputs_stmt = if outputs.is_empty() {
        quote!()
    } else {
        quote! {
            description.model_structure.outputs = Some(::fmu_export::fmu_schema::UnknownList::new(
                ::std::vec![ #(::fmu_export::fmu_schema::Unknown::new(#outputs)),* ],
            ));
        }
    };
    let derivatives_stmt = if derivatives.is_empty() {
        quote!()
    } else {
        quote! {
            description.model_structure.derivatives = Some(::fmu_export::fmu_schema::UnknownList::new(
                ::std::vec![ #(::fmu_export::fmu_schema::Unknown::new(#derivatives)),* ],
            ));
        }
    };

    quote! {
        fn model_description() -> ::fmu_export::fmu_schema::ModelDescription {
            let mut description = ::fmu_export::fmu_schema::ModelDescription::new(#model_name, Self::GUID);
            description.description = #description;
            description.generation_tool = Some("rust-fmu".to_string());
            description.co_simulation = Some(::fmu_export::fmu_schema::CoSimulation {
                model_identifier: #model_name.to_string(),
                can_get_and_set_fmu_state: Some(true),
                can_serialize_fmu_state: Some(true),
                ..::std::default::Default::default()
            });
            description.model_variables.variables = Self::variables();
            #outputs_stmt
            #derivatives_stmt
            description
        }
    }
}

fn variable_exprs(model: &ModelDef) -> Vec<TokenStream> {
    model
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let vr = index as u32 + 1;
            let name = field.ident.to_string();
            let description = opt_string(&field.description);
            let causality = opt_causality(field.causality);
            let variability = opt_variability(field.variability);
            let initial = opt_initial(field.initial);
            let multiple_set = opt_bool(field.can_handle_multiple_set);
            let payload = payload_expr(field);

            quote! {
                ::fmu_export::fmu_schema::ScalarVariable {
                    name: #name.to_string(),
                    value_reference: #vr,
                    description: #description,
                    causality: #causality,
                    variability: #variability,
                    initial: #initial,
                    can_handle_multiple_set_per_time_instant: #multiple_set,
                    #payload
                    ..::std::default::Default::default()
                }
            }
        })
        .collect()
}

fn payload_expr(field: &FieldDef) -> TokenStream {
    let quantity = opt_string(&field.quantity);
    let declared_type = opt_string(&field.declared_type);

    match field.kind {
        FieldKind::Real => {
            let unit = opt_string(&field.unit);
            let display_unit = opt_string(&field.display_unit);
            let relative_quantity = opt_bool(field.relative_quantity);
            let min = opt_f64(field.min_real);
            let max = opt_f64(field.max_real);
            let nominal = opt_f64(field.nominal);
            let unbounded = opt_bool(field.unbounded);
            let reinit = opt_bool(field.reinit);
            let derivative = opt_u32(field.derivative);
            let start = match field.start {
                Some(StartValue::Real(value)) => {
                    let value = f64_tokens(value);
                    quote!(Some(#value))
                }
                _ => quote!(None),
            };
            quote! {
                real: Some(::fmu_export::fmu_schema::RealVariable {
                    quantity: #quantity,
                    unit: #unit,
                    display_unit: #display_unit,
                    relative_quantity: #relative_quantity,
                    min: #min,
                    max: #max,
                    nominal: #nominal,
                    unbounded: #unbounded,
                    declared_type: #declared_type,
                    start: #start,
                    derivative: #derivative,
                    reinit: #reinit,
                }),
            }
        }
        FieldKind::Integer => {
            let min = opt_i32(field.min_integer);
            let max = opt_i32(field.max_integer);
            let start = match field.start {
                Some(StartValue::Integer(value)) => {
                    let value = i32_tokens(value);
                    quote!(Some(#value))
                }
                _ => quote!(None),
            };
            quote! {
                integer: Some(::fmu_export::fmu_schema::IntegerVariable {
                    quantity: #quantity,
                    min: #min,
                    max: #max,
                    declared_type: #declared_type,
                    start: #start,
                }),
            }
        }
        FieldKind::Boolean => {
            let start = match field.start {
                Some(StartValue::Boolean(value)) => quote!(Some(#value)),
                _ => quote!(None),
            };
            quote! {
                boolean: Some(::fmu_export::fmu_schema::BooleanVariable {
                    quantity: #quantity,
                    declared_type: #declared_type,
                    start: #start,
                }),
            }
        }
        FieldKind::String => {
            let start = match &field.start {
                Some(StartValue::String(value)) => quote!(Some(#value.to_string())),
                _ => quote!(None),
            };
            quote! {
                string: Some(::fmu_export::fmu_schema::StringVariable {
                    quantity: #quantity,
                    declared_type: #declared_type,
                    start: #start,
                }),
            }
        }
    }
}

fn opt_string(value: &Option<String>) -> TokenStream {
    match value {
        Some(text) => quote!(Some(#text.to_string())),
        None => quote!(None),
    }
}

fn opt_bool(value: Option<bool>) -> TokenStream {
    match value {
        Some(flag) => quote!(Some(#flag)),
        None => quote!(None),
    }
}

fn opt_f64(value: Option<f64>) -> TokenStream {
    match value {
        Some(number) => {
            let number = f64_tokens(number);
            quote!(Some(#number))
        }
        None => quote!(None),
    }
}

fn opt_i32(value: Option<i32>) -> TokenStream {
    match value {
        Some(number) => {
            let number = i32_tokens(number);
            quote!(Some(#number))
        }
        None => quote!(None),
    }
}

fn opt_u32(value: Option<u32>) -> TokenStream {
    match value {
        Some(number) => quote!(Some(#number)),
        None => quote!(None),
    }
}

// Negative numbers are emitted as a minus punct plus a positive literal.

fn f64_tokens(value: f64) -> TokenStream {
    let literal = proc_macro2::Literal::f64_suffixed(value.abs());
    if value.is_sign_negative() {
        quote!(-#literal)
    } else {
        quote!(#literal)
    }
}

fn i32_tokens(value: i32) -> TokenStream {
    if value == i32::MIN {
        return quote!(::std::primitive::i32::MIN);
    }
    let literal = proc_macro2::Literal::i32_suffixed(value.abs());
    if value < 0 {
        quote!(-#literal)
    } else {
        quote!(#literal)
    }
}

fn opt_causality(value: Option<Causality>) -> TokenStream {
    match value {
        Some(Causality::Parameter) => quote!(Some(::fmu_export::fmu_schema::Causality::Parameter)),
        Some(Causality::CalculatedParameter) => {
            quote!(Some(::fmu_export::fmu_schema::Causality::CalculatedParameter))
        }
        Some(Causality::Input) => quote!(Some(::fmu_export::fmu_schema::Causality::Input)),
        Some(Causality::Output) => quote!(Some(::fmu_export::fmu_schema::Causality::Output)),
        Some(Causality::Local) => quote!(Some(::fmu_export::fmu_schema::Causality::Local)),
        Some(Causality::Independent) => quote!(Some(::fmu_export::fmu_schema::Causality::Independent)),
        None => quote!(None),
    }
}

fn opt_variability(value: Option<Variability>) -> TokenStream {
    match value {
        Some(Variability::Constant) => quote!(Some(::fmu_export::fmu_schema::Variability::Constant)),
        Some(Variability::Fixed) => quote!(Some(::fmu_export::fmu_schema::Variability::Fixed)),
        Some(Variability::Tunable) => quote!(Some(::fmu_export::fmu_schema::Variability::Tunable)),
        Some(Variability::Discrete) => quote!(Some(::fmu_export::fmu_schema::Variability::Discrete)),
        Some(Variability::Continuous) => quote!(Some(::fmu_export::fmu_schema::Variability::Continuous)),
        None => quote!(None),
    }
}

fn opt_initial(value: Option<Initial>) -> TokenStream {
    match value {
        Some(Initial::Exact) => quote!(Some(::fmu_export::fmu_schema::Initial::Exact)),
        Some(Initial::Approx) => quote!(Some(::fmu_export::fmu_schema::Initial::Approx)),
        Some(Initial::Calculated) => quote!(Some(::fmu_export::fmu_schema::Initial::Calculated)),
        None => quote!(None),
    }
}
