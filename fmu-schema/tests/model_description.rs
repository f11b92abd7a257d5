use fmu_schema::{
    Annotations, BaseUnit, BooleanVariable, Causality, CoSimulation, DefaultExperiment,
    DependenciesKind, DisplayUnit, EnumerationItem, EnumerationType, Initial, IntegerType,
    IntegerVariable, ModelDescription, RealType, RealVariable, ScalarVariable, SimpleType,
    StringVariable, ToolAnnotation, TypeDefinitions, Unit, UnitDefinitions, Unknown, UnknownList,
    Variability,
};

/// A description exercising every container and most optional attributes.
fn full_description() -> ModelDescription {
    let mut md = ModelDescription::new("name", "guid-guid");
    md.description = Some("Thing here".into());
    md.author = Some("Bob Smith".into());
    md.version = Some("v0.0.1".into());
    md.copyright = Some("Blah".into());
    md.license = Some("MIT".into());
    md.generation_tool = Some("rust-fmu".into());
    md.generation_date_and_time = Some("2024-01-01T00:00:00Z".into());
    md.number_of_event_indicators = Some(2);
    md.co_simulation = Some(CoSimulation {
        model_identifier: "name".into(),
        can_get_and_set_fmu_state: Some(true),
        can_serialize_fmu_state: Some(true),
        ..Default::default()
    });
    md.unit_definitions = Some(UnitDefinitions {
        units: vec![
            Unit {
                name: "rad/s".into(),
                base_unit: Some(BaseUnit {
                    s: Some(-1),
                    rad: Some(1),
                    ..Default::default()
                }),
                display_units: vec![DisplayUnit {
                    name: "deg/s".into(),
                    factor: Some(57.29577951308232),
                    offset: None,
                }],
            },
            Unit {
                name: "bar".into(),
                base_unit: Some(BaseUnit {
                    kg: Some(1),
                    m: Some(-1),
                    s: Some(-2),
                    factor: Some(1.0e5),
                    ..Default::default()
                }),
                display_units: vec![],
            },
        ],
    });
    md.type_definitions = Some(TypeDefinitions {
        types: vec![
            SimpleType {
                name: "Angle".into(),
                description: Some("plane angle".into()),
                real: Some(RealType {
                    quantity: Some("Angle".into()),
                    unit: Some("rad/s".into()),
                    relative_quantity: Some(true),
                    min: Some(0.0),
                    max: Some(6.3),
                    ..Default::default()
                }),
                ..Default::default()
            },
            SimpleType {
                name: "Counter".into(),
                description: None,
                integer: Some(IntegerType {
                    min: Some(0),
                    max: Some(1000),
                    ..Default::default()
                }),
                ..Default::default()
            },
            SimpleType {
                name: "Mode".into(),
                description: Some("operating mode".into()),
                enumeration: Some(EnumerationType {
                    quantity: None,
                    items: vec![
                        EnumerationItem {
                            name: "idle".into(),
                            value: 1,
                            description: None,
                        },
                        EnumerationItem {
                            name: "running".into(),
                            value: 2,
                            description: Some("normal operation".into()),
                        },
                    ],
                }),
                ..Default::default()
            },
        ],
    });
    md.default_experiment = Some(DefaultExperiment {
        start_time: Some(1.0),
        stop_time: Some(2.0),
        tolerance: Some(0.1),
        step_size: Some(1e-3),
    });
    md.vendor_annotations = Some(Annotations {
        tools: vec![ToolAnnotation {
            name: "Foo".into(),
            content: "opaque".into(),
        }],
    });
    md.model_variables.variables = vec![
        ScalarVariable {
            name: "varreal".into(),
            value_reference: 1,
            description: Some("real desc".into()),
            causality: Some(Causality::Input),
            variability: Some(Variability::Continuous),
            can_handle_multiple_set_per_time_instant: Some(true),
            real: Some(RealVariable {
                quantity: Some("Angle".into()),
                unit: Some("rad/s".into()),
                display_unit: Some("deg/s".into()),
                min: Some(0.0),
                max: Some(57.29577951308232),
                declared_type: Some("Angle".into()),
                start: Some(0.0),
                ..Default::default()
            }),
            ..Default::default()
        },
        ScalarVariable {
            name: "varinteger".into(),
            value_reference: 2,
            description: Some("integer desc".into()),
            causality: Some(Causality::Local),
            variability: Some(Variability::Discrete),
            initial: Some(Initial::Exact),
            integer: Some(IntegerVariable {
                min: Some(2),
                max: Some(2),
                start: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        },
        ScalarVariable {
            name: "varboolean".into(),
            value_reference: 3,
            description: Some("boolean desc".into()),
            variability: Some(Variability::Discrete),
            boolean: Some(BooleanVariable::default()),
            ..Default::default()
        },
        ScalarVariable {
            name: "varstring".into(),
            value_reference: 4,
            description: Some("string desc".into()),
            variability: Some(Variability::Discrete),
            string: Some(StringVariable {
                start: Some("foo".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];
    md.model_structure.outputs = Some(UnknownList::new(vec![Unknown::with_dependencies(
        3,
        &[1, 2],
    )]));
    md.model_structure.derivatives = Some(UnknownList::new(vec![
        Unknown::with_dependencies(1, &[3]),
        Unknown::with_dependency_kinds(2, &[3], &[DependenciesKind::Constant]),
    ]));
    md.model_structure.initial_unknowns = Some(UnknownList::new(vec![
        Unknown::with_dependency_kinds(
            1,
            &[2, 3, 4],
            &[
                DependenciesKind::Constant,
                DependenciesKind::Dependent,
                DependenciesKind::Fixed,
            ],
        ),
    ]));
    md
}

#[test]
fn renders_declaration_and_root_attributes() {
    let xml = full_description().to_xml().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(xml.contains(
        r#"fmiVersion="2.0" variableNamingConvention="flat" modelName="name" guid="guid-guid""#
    ));
    assert!(xml.contains(r#"description="Thing here" author="Bob Smith" version="v0.0.1""#));
    assert!(xml.contains(r#"numberOfEventIndicators="2""#));
}

#[test]
fn renders_with_four_space_indent() {
    let xml = full_description().to_xml().unwrap();
    assert!(xml.contains("\n    <ModelVariables>"));
    assert!(xml.contains("\n        <ScalarVariable "));
    assert!(xml.contains("\n    <ModelStructure>"));
    assert!(xml.contains("\n        <Outputs>"));
}

#[test]
fn renders_scalar_variable_attributes_in_schema_order() {
    let xml = full_description().to_xml().unwrap();
    assert!(xml.contains(
        r#"name="varreal" valueReference="1" description="real desc" causality="input" variability="continuous" canHandleMultipleSetPerTimeInstant="true""#
    ));
    assert!(xml.contains(
        r#"name="varinteger" valueReference="2" description="integer desc" causality="local" variability="discrete" initial="exact""#
    ));
}

#[test]
fn renders_dependency_lists_space_delimited() {
    let xml = full_description().to_xml().unwrap();
    assert!(xml.contains(r#"dependencies="1 2""#));
    assert!(xml.contains(r#"dependencies="2 3 4" dependenciesKind="constant dependent fixed""#));
    assert!(!xml.contains("dependencies=\"[1"));
}

#[test]
fn renders_booleans_as_lowercase_words() {
    let xml = full_description().to_xml().unwrap();
    assert!(xml.contains(r#"canGetAndSetFMUstate="true""#));
    assert!(xml.contains(r#"canSerializeFMUstate="true""#));
    assert!(!xml.contains("=\"True\""));
}

#[test]
fn omits_absent_optionals_and_empty_containers() {
    let mut md = ModelDescription::new("minimal", "g");
    md.log_categories = None;
    md.model_variables.variables = vec![ScalarVariable {
        name: "v1".into(),
        value_reference: 1,
        real: Some(RealVariable::default()),
        ..Default::default()
    }];
    let xml = md.to_xml().unwrap();
    assert!(!xml.contains("LogCategories"));
    assert!(!xml.contains("UnitDefinitions"));
    assert!(!xml.contains("TypeDefinitions"));
    assert!(!xml.contains("DefaultExperiment"));
    assert!(!xml.contains("VendorAnnotations"));
    assert!(!xml.contains("description="));
    assert!(!xml.contains("author="));
    assert!(xml.contains("ModelVariables"));
    assert!(xml.contains("ModelStructure"));
}

#[test]
fn log_categories_render_in_mask_order() {
    let md = ModelDescription::new("m", "g");
    let xml = md.to_xml().unwrap();
    let positions: Vec<usize> = [
        "logEvents",
        "logStatusWarning",
        "logStatusDiscard",
        "logStatusError",
        "logStatusFatal",
        "logStatusPending",
        "logAll",
    ]
    .iter()
    .map(|name| xml.find(name).unwrap())
    .collect();
    assert!(positions.is_sorted());
}

#[test]
fn emit_parse_emit_is_byte_identical() {
    let original = full_description();
    let first = original.to_xml().unwrap();
    let parsed = ModelDescription::from_xml(&first).unwrap();
    let second = parsed.to_xml().unwrap();
    assert_eq!(first, second);
}

#[test]
fn parse_recovers_the_value_model() {
    let original = full_description();
    let xml = original.to_xml().unwrap();
    let parsed = ModelDescription::from_xml(&xml).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn full_description_is_valid() {
    full_description().validate().unwrap();
}

#[test]
fn parsed_log_categories_match_the_advertised_set() {
    let xml = ModelDescription::new("m", "g").to_xml().unwrap();
    let parsed = ModelDescription::from_xml(&xml).unwrap();
    let parsed_names: Vec<String> = parsed
        .log_categories
        .unwrap()
        .categories
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(parsed_names, fmu_schema::LOG_CATEGORY_NAMES);
}
