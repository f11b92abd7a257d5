//! Parsing and validation of the `#[model]` and `#[variable]` attributes.

use std::str::FromStr;

use proc_macro2::Span;
use proc_macro_error2::abort;
use syn::{Data, DeriveInput, Fields, spanned::Spanned};

use fmu_schema::{Causality, Initial, Variability};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldKind {
    Real,
    Integer,
    Boolean,
    String,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Real => "Real",
            FieldKind::Integer => "Integer",
            FieldKind::Boolean => "Boolean",
            FieldKind::String => "String",
        }
    }
}

/// Start value, parsed against the field's base type.
#[derive(Clone, Debug)]
pub enum StartValue {
    Real(f64),
    Integer(i32),
    Boolean(bool),
    String(String),
}

pub struct FieldDef {
    pub ident: syn::Ident,
    pub span: Span,
    pub kind: FieldKind,
    pub description: Option<String>,
    pub causality: Option<Causality>,
    pub variability: Option<Variability>,
    pub initial: Option<Initial>,
    pub can_handle_multiple_set: Option<bool>,
    pub declared_type: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub display_unit: Option<String>,
    pub relative_quantity: Option<bool>,
    pub unbounded: Option<bool>,
    pub reinit: Option<bool>,
    pub min_real: Option<f64>,
    pub max_real: Option<f64>,
    pub nominal: Option<f64>,
    pub min_integer: Option<i32>,
    pub max_integer: Option<i32>,
    pub start: Option<StartValue>,
    pub derivative: Option<u32>,
}

impl FieldDef {
    pub fn is_constant(&self) -> bool {
        self.variability == Some(Variability::Constant)
    }
}

pub struct ModelDef {
    pub ident: syn::Ident,
    pub model_name: String,
    pub guid: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    pub fn parse(input: &DeriveInput) -> ModelDef {
        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => &fields.named,
                _ => abort!(
                    input.ident.span(),
                    "FmuModel requires named fields; tuple and unit structs cannot describe scalar variables"
                ),
            },
            _ => abort!(
                input.ident.span(),
                "FmuModel can only be derived for structs"
            ),
        };

        if named.is_empty() {
            abort!(input.ident.span(), "model struct has no fields");
        }

        let (model_name, guid, description) = parse_model_attr(input);

        let fields: Vec<FieldDef> = named.iter().map(parse_field).collect();

        for field in &fields {
            if let Some(derivative) = field.derivative {
                let in_range = derivative >= 1 && derivative as usize <= fields.len();
                let refers_to_real = in_range
                    && fields[derivative as usize - 1].kind == FieldKind::Real;
                if !refers_to_real {
                    abort!(
                        field.span,
                        "derivative index {} on field `{}` does not refer to a Real field",
                        derivative,
                        field.ident
                    );
                }
            }
        }

        ModelDef {
            ident: input.ident.clone(),
            model_name,
            guid,
            description,
            fields,
        }
    }
}

fn parse_model_attr(input: &DeriveInput) -> (String, String, Option<String>) {
    let mut guid = None;
    let mut name = None;
    let mut description = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("guid") {
                guid = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("description") {
                description = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else {
                return Err(meta.error("unknown model attribute"));
            }
            Ok(())
        });
        if let Err(err) = result {
            abort!(err.span(), "{}", err);
        }
    }

    let Some(guid) = guid else {
        abort!(
            input.ident.span(),
            "#[model(guid = \"...\")] is required; the GUID keys the model in the registry"
        );
    };

    (
        name.unwrap_or_else(|| input.ident.to_string()),
        guid,
        description,
    )
}

fn field_kind(field: &syn::Field) -> Option<FieldKind> {
    let syn::Type::Path(path) = &field.ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if !matches!(segment.arguments, syn::PathArguments::None) {
        return None;
    }
    match segment.ident.to_string().as_str() {
        "f64" => Some(FieldKind::Real),
        "i32" => Some(FieldKind::Integer),
        "bool" => Some(FieldKind::Boolean),
        "String" => Some(FieldKind::String),
        _ => None,
    }
}

fn parse_field(field: &syn::Field) -> FieldDef {
    let ident = field
        .ident
        .clone()
        .expect("named fields checked by the caller");
    let span = field.span();

    if !matches!(field.vis, syn::Visibility::Public(_)) {
        abort!(
            span,
            "model field `{}` is not public and cannot be exposed as a scalar variable",
            ident
        );
    }

    let Some(kind) = field_kind(field) else {
        abort!(
            span,
            "model field `{}` has an unsupported type; supported types are f64, i32, bool and String",
            ident
        );
    };

    let mut def = FieldDef {
        ident: ident.clone(),
        span,
        kind,
        description: None,
        causality: None,
        variability: None,
        initial: None,
        can_handle_multiple_set: None,
        declared_type: None,
        quantity: None,
        unit: None,
        display_unit: None,
        relative_quantity: None,
        unbounded: None,
        reinit: None,
        min_real: None,
        max_real: None,
        nominal: None,
        min_integer: None,
        max_integer: None,
        start: None,
        derivative: None,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("variable") {
            continue;
        }
        let result = attr.parse_nested_meta(|meta| parse_variable_tag(&meta, &mut def));
        if let Err(err) = result {
            abort!(err.span(), "field `{}`: {}", ident, err);
        }
    }

    def
}

fn parse_variable_tag(
    meta: &syn::meta::ParseNestedMeta,
    def: &mut FieldDef,
) -> syn::Result<()> {
    let path = &meta.path;

    if path.is_ident("description") {
        def.description = Some(meta.value()?.parse::<syn::LitStr>()?.value());
    } else if path.is_ident("causality") {
        def.causality = Some(parse_spelling::<Causality>(meta, "causality")?);
    } else if path.is_ident("variability") {
        let variability = parse_spelling::<Variability>(meta, "variability")?;
        if variability == Variability::Continuous && def.kind != FieldKind::Real {
            return Err(meta.error("only Real fields may be continuous"));
        }
        def.variability = Some(variability);
    } else if path.is_ident("initial") {
        def.initial = Some(parse_spelling::<Initial>(meta, "initial")?);
    } else if path.is_ident("can_handle_multiple_set_per_time_instant") {
        def.can_handle_multiple_set = Some(meta.value()?.parse::<syn::LitBool>()?.value());
    } else if path.is_ident("declared_type") {
        def.declared_type = Some(meta.value()?.parse::<syn::LitStr>()?.value());
    } else if path.is_ident("quantity") {
        def.quantity = Some(meta.value()?.parse::<syn::LitStr>()?.value());
    } else if path.is_ident("unit") {
        require_kind(meta, def, FieldKind::Real, "unit")?;
        def.unit = Some(meta.value()?.parse::<syn::LitStr>()?.value());
    } else if path.is_ident("display_unit") {
        require_kind(meta, def, FieldKind::Real, "display_unit")?;
        def.display_unit = Some(meta.value()?.parse::<syn::LitStr>()?.value());
    } else if path.is_ident("relative_quantity") {
        require_kind(meta, def, FieldKind::Real, "relative_quantity")?;
        def.relative_quantity = Some(meta.value()?.parse::<syn::LitBool>()?.value());
    } else if path.is_ident("unbounded") {
        require_kind(meta, def, FieldKind::Real, "unbounded")?;
        def.unbounded = Some(meta.value()?.parse::<syn::LitBool>()?.value());
    } else if path.is_ident("reinit") {
        require_kind(meta, def, FieldKind::Real, "reinit")?;
        def.reinit = Some(meta.value()?.parse::<syn::LitBool>()?.value());
    } else if path.is_ident("nominal") {
        require_kind(meta, def, FieldKind::Real, "nominal")?;
        def.nominal = Some(parse_f64(meta)?);
    } else if path.is_ident("derivative") {
        require_kind(meta, def, FieldKind::Real, "derivative")?;
        def.derivative = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
    } else if path.is_ident("min") {
        match def.kind {
            FieldKind::Real => def.min_real = Some(parse_f64(meta)?),
            FieldKind::Integer => def.min_integer = Some(parse_i32(meta)?),
            _ => return Err(meta.error("min only applies to f64 and i32 fields")),
        }
    } else if path.is_ident("max") {
        match def.kind {
            FieldKind::Real => def.max_real = Some(parse_f64(meta)?),
            FieldKind::Integer => def.max_integer = Some(parse_i32(meta)?),
            _ => return Err(meta.error("max only applies to f64 and i32 fields")),
        }
    } else if path.is_ident("start") {
        def.start = Some(match def.kind {
            FieldKind::Real => StartValue::Real(parse_f64(meta)?),
            FieldKind::Integer => StartValue::Integer(parse_i32(meta)?),
            FieldKind::Boolean => StartValue::Boolean(meta.value()?.parse::<syn::LitBool>()?.value()),
            FieldKind::String => StartValue::String(meta.value()?.parse::<syn::LitStr>()?.value()),
        });
    } else {
        return Err(meta.error("unknown variable tag"));
    }

    Ok(())
}

fn require_kind(
    meta: &syn::meta::ParseNestedMeta,
    def: &FieldDef,
    expected: FieldKind,
    tag: &str,
) -> syn::Result<()> {
    if def.kind != expected {
        return Err(meta.error(format!(
            "{tag} only applies to {} fields",
            expected.name()
        )));
    }
    Ok(())
}

/// Parse an enumerated tag value against the FMI textual spellings shared
/// with the XML schema.
fn parse_spelling<T: FromStr<Err = String>>(
    meta: &syn::meta::ParseNestedMeta,
    tag: &str,
) -> syn::Result<T> {
    let literal = meta.value()?.parse::<syn::LitStr>()?;
    literal
        .value()
        .parse::<T>()
        .map_err(|err| syn::Error::new(literal.span(), format!("invalid {tag}: {err}")))
}

/// Numeric tag values may be written with a leading minus, which syn
/// exposes as a unary expression rather than a literal.
fn parse_f64(meta: &syn::meta::ParseNestedMeta) -> syn::Result<f64> {
    let expr = meta.value()?.parse::<syn::Expr>()?;
    eval_f64(&expr).ok_or_else(|| syn::Error::new(expr.span(), "expected a numeric literal"))
}

fn eval_f64(expr: &syn::Expr) -> Option<f64> {
    match expr {
        syn::Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Float(value) => value.base10_parse().ok(),
            syn::Lit::Int(value) => value.base10_parse::<i64>().ok().map(|v| v as f64),
            _ => None,
        },
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => eval_f64(expr).map(|value| -value),
        _ => None,
    }
}

fn parse_i32(meta: &syn::meta::ParseNestedMeta) -> syn::Result<i32> {
    let expr = meta.value()?.parse::<syn::Expr>()?;
    eval_i32(&expr).ok_or_else(|| syn::Error::new(expr.span(), "expected an integer literal"))
}

fn eval_i32(expr: &syn::Expr) -> Option<i32> {
    match expr {
        syn::Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Int(value) => value.base10_parse().ok(),
            _ => None,
        },
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => eval_i32(expr).and_then(i32::checked_neg),
        _ => None,
    }
}
