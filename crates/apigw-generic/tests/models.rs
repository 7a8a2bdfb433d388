use apigw_generic::{
    class_models_schema, class_type, collect_fields, declared_fields, declared_methods, field,
    infer_method_binding, instantiate_return_type, is_assignable_from, is_simple_type,
    parameterized, superclass, type_variable_bounds, ClassId, ClassRegistry, GenericType,
    TypeEnv, TypeError,
};

use pretty_assertions::assert_eq;

const MODELS: &str = r#"[
  {
    "name": "com.example.Box",
    "signature": "<T:Ljava/lang/Object;>Ljava/lang/Object;",
    "fields": [
      { "name": "value", "signature": "TT;" },
      { "name": "history", "signature": "Ljava/util/List<TT;>;" },
      { "name": "count", "signature": "I", "public": false },
      { "name": "EMPTY", "signature": "Lcom/example/Box<*>;", "static": true }
    ],
    "methods": [
      { "name": "get", "signature": "()TT;" },
      { "name": "map", "signature": "<R:Ljava/lang/Object;>(Lcom/example/Box<TR;>;)Lcom/example/Box<TR;>;" }
    ]
  },
  {
    "name": "com.example.IntBox",
    "signature": "Lcom/example/Box<Ljava/lang/Integer;>;",
    "fields": [{ "name": "count", "signature": "J" }]
  },
  {
    "name": "com.example.Outer",
    "signature": "<K:Ljava/lang/Object;>Ljava/lang/Object;"
  },
  {
    "name": "com.example.Outer$Inner",
    "enclosing": "com.example.Outer",
    "static": false,
    "signature": "<V:Ljava/lang/Object;>Ljava/lang/Object;",
    "fields": [{ "name": "entry", "signature": "Ljava/util/Map<TK;TV;>;" }]
  },
  {
    "name": "com.example.Money",
    "super_class": "java.lang.Object",
    "interfaces": ["java.io.Serializable"]
  }
]"#;

fn registry() -> ClassRegistry {
    let mut env = ClassRegistry::with_minimal_jdk();
    env.load_json(MODELS).unwrap();
    env
}

fn id(env: &ClassRegistry, name: &str) -> ClassId {
    env.lookup_class(name).unwrap()
}

fn class(env: &ClassRegistry, name: &str) -> GenericType {
    class_type(env, id(env, name), false).unwrap()
}

fn show(env: &ClassRegistry, ty: &GenericType) -> String {
    ty.display(env).to_string()
}

#[test]
fn inherited_field_resolves_against_the_subclass() {
    let env = registry();
    let int_box = class(&env, "com.example.IntBox");

    let fields = collect_fields(&env, &int_box).unwrap();
    let summary: Vec<(String, String)> = fields
        .iter()
        .map(|field| (field.name.clone(), show(&env, &field.resolved_type)))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("count".to_string(), "long".to_string()),
            ("value".to_string(), "java.lang.Integer".to_string()),
            (
                "history".to_string(),
                "java.util.List<java.lang.Integer>".to_string()
            ),
            (
                "EMPTY".to_string(),
                "com.example.Box<?>".to_string()
            ),
        ]
    );

    let value = fields.iter().find(|field| field.name == "value").unwrap();
    assert_eq!(show(&env, &value.declared_type), "T");
    assert_eq!(value.declaring_class, id(&env, "com.example.Box"));
}

#[test]
fn declared_fields_keep_flags_and_can_be_retyped() {
    let env = registry();
    let string = class(&env, "java.lang.String");
    let box_string = parameterized(&env, id(&env, "com.example.Box"), None, vec![string.clone()])
        .unwrap();

    let fields = declared_fields(&env, &box_string).unwrap();
    assert_eq!(fields.len(), 4);
    let count = &fields[2];
    assert!(!count.is_public);
    assert!(!count.is_static);
    assert!(fields[3].is_static);

    let value = field(&env, &box_string, "value").unwrap().unwrap();
    assert_eq!(value.resolved_type, string);
    let retyped = value.replace_resolved_type(class(&env, "java.lang.Object"));
    assert_eq!(retyped.name, "value");
    assert_eq!(retyped.declared_type, value.declared_type);
    assert_eq!(show(&env, &retyped.resolved_type), "java.lang.Object");

    assert!(field(&env, &box_string, "missing").unwrap().is_none());
}

#[test]
fn superclass_of_a_model_is_its_signature_supertype() {
    let env = registry();
    let int_box = class(&env, "com.example.IntBox");
    let parent = superclass(&env, &int_box).unwrap().unwrap();
    assert_eq!(show(&env, &parent), "com.example.Box<java.lang.Integer>");

    let money = class(&env, "com.example.Money");
    let parent = superclass(&env, &money).unwrap().unwrap();
    assert_eq!(show(&env, &parent), "java.lang.Object");
}

#[test]
fn inner_classes_of_generic_classes_carry_their_owner() {
    let env = registry();
    let inner = class_type(&env, id(&env, "com.example.Outer$Inner"), true).unwrap();
    assert_eq!(show(&env, &inner), "com.example.Outer<K>.Inner<V>");

    let string = class(&env, "java.lang.String");
    let long = class(&env, "java.lang.Long");
    let outer = parameterized(&env, id(&env, "com.example.Outer"), None, vec![string]).unwrap();
    let inner = parameterized(
        &env,
        id(&env, "com.example.Outer$Inner"),
        Some(outer),
        vec![long],
    )
    .unwrap();

    let entry = field(&env, &inner, "entry").unwrap().unwrap();
    assert_eq!(
        show(&env, &entry.resolved_type),
        "java.util.Map<java.lang.String, java.lang.Long>"
    );

    let err = parameterized(
        &env,
        id(&env, "com.example.Outer$Inner"),
        None,
        vec![class(&env, "java.lang.Long")],
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::MissingOwner { .. }), "{err}");
}

#[test]
fn arity_is_checked_at_construction() {
    let env = registry();
    let err = parameterized(&env, id(&env, "com.example.Box"), None, Vec::new()).unwrap_err();
    assert!(
        matches!(
            err,
            TypeError::ArityMismatch {
                expected: 1,
                found: 0,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn methods_resolve_class_variables_and_keep_method_variables() {
    let env = registry();
    let string = class(&env, "java.lang.String");
    let box_string = parameterized(&env, id(&env, "com.example.Box"), None, vec![string.clone()])
        .unwrap();

    let methods = declared_methods(&env, &box_string).unwrap();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].return_type.as_ref(), Some(&string));

    let map = &methods[1];
    assert_eq!(map.type_params.len(), 1);
    assert_eq!(show(&env, &map.params[0]), "com.example.Box<R>");

    let long = class(&env, "java.lang.Long");
    let box_long = parameterized(&env, id(&env, "com.example.Box"), None, vec![long]).unwrap();
    let binding = infer_method_binding(&env, map, &[box_long.clone()])
        .unwrap()
        .unwrap();
    let returned = instantiate_return_type(&env, map, &binding).unwrap().unwrap();
    assert_eq!(returned, box_long);

    assert_eq!(infer_method_binding(&env, map, &[]).unwrap(), None);
    assert_eq!(infer_method_binding(&env, map, &[string]).unwrap(), None);
}

#[test]
fn static_generic_factory_infers_its_own_variable() {
    let env = ClassRegistry::with_minimal_jdk();
    let optional = class(&env, "java.util.Optional");
    let methods = declared_methods(&env, &optional).unwrap();
    let of = methods.iter().find(|method| method.name == "of").unwrap();
    assert!(of.is_static);

    let string = class(&env, "java.lang.String");
    let binding = infer_method_binding(&env, of, &[string]).unwrap().unwrap();
    let returned = instantiate_return_type(&env, of, &binding).unwrap().unwrap();
    assert_eq!(show(&env, &returned), "java.util.Optional<java.lang.String>");

    let open = instantiate_return_type(&env, of, &Default::default())
        .unwrap()
        .unwrap();
    assert_eq!(show(&env, &open), "java.util.Optional<?>");

    let get = methods.iter().find(|method| method.name == "get").unwrap();
    assert_eq!(show(&env, get.return_type.as_ref().unwrap()), "?");
}

#[test]
fn undefined_references_fail_the_load() {
    let mut env = ClassRegistry::with_minimal_jdk();
    let err = env
        .load_json(r#"[{ "name": "com.example.Broken", "super_class": "com.example.Missing" }]"#)
        .unwrap_err();
    assert!(matches!(err, TypeError::UnknownClass { ref name } if name == "com.example.Missing"));

    let err = env
        .load_json(r#"[{ "name": "com.example.Stray", "fields": [{ "name": "x", "signature": "TX;" }] }]"#)
        .unwrap_err();
    assert!(matches!(err, TypeError::UnknownTypeVariable { .. }), "{err}");
}

#[test]
fn malformed_models_are_rejected() {
    let mut env = ClassRegistry::with_minimal_jdk();

    let err = env
        .load_json(r#"[{ "name": "com.example.A", "signature": "Ljava/lang/Object" }]"#)
        .unwrap_err();
    assert!(matches!(err, TypeError::Signature(_)), "{err}");

    let err = env
        .load_json(r#"[{ "name": "com.example.A" }, { "name": "com.example.A" }]"#)
        .unwrap_err();
    assert!(matches!(err, TypeError::Model { .. }), "{err}");

    let err = env
        .load_json(r#"[{ "name": "com.example.A", "colour": "red" }]"#)
        .unwrap_err();
    assert!(matches!(err, TypeError::Json { .. }), "{err}");
}

#[test]
fn simple_types_cover_the_platform_leaves_and_configured_classes() {
    let mut env = registry();
    for name in [
        "int",
        "void",
        "java.lang.Integer",
        "java.lang.String",
        "java.lang.StringBuilder",
        "java.util.Date",
        "java.lang.Number",
        "java.lang.Class",
    ] {
        assert!(is_simple_type(&env, &class(&env, name)), "{name}");
    }
    assert!(!is_simple_type(&env, &class(&env, "java.util.ArrayList")));
    assert!(!is_simple_type(&env, &class(&env, "com.example.Money")));

    let money = id(&env, "com.example.Money");
    env.mark_simple_class(money);
    assert!(is_simple_type(&env, &class(&env, "com.example.Money")));
}

#[test]
fn cached_class_types_match_uncached_ones() {
    let mut env = registry();
    let int_box = id(&env, "com.example.IntBox");
    let list = id(&env, "java.util.List");
    let uncached = (
        class_type(&env, list, true).unwrap(),
        class_type(&env, int_box, false).unwrap(),
    );

    env.set_cache_enabled(true);
    let first = class_type(&env, list, true).unwrap();
    let second = class_type(&env, list, true).unwrap();
    assert!(GenericType::ptr_eq(&first, &second));
    assert_eq!(first, uncached.0);
    assert_eq!(class_type(&env, int_box, false).unwrap(), uncached.1);
    assert!(env.type_cache().is_some_and(|cache| !cache.is_empty()));
}

#[test]
fn model_schema_describes_an_array_of_classes() {
    let schema = serde_json::to_value(class_models_schema()).unwrap();
    assert_eq!(schema["type"], "array");
    assert!(schema["definitions"]["ClassModel"]["properties"]["signature"].is_object());
}

#[test]
fn raw_self_bounds_stop_at_the_second_use() {
    let mut env = ClassRegistry::with_minimal_jdk();
    env.load_json(
        r#"[
          { "name": "com.example.Node", "signature": "<T:Lcom/example/Node;>Ljava/lang/Object;" },
          { "name": "com.example.A", "signature": "<T:Lcom/example/B;>Ljava/lang/Object;" },
          { "name": "com.example.B", "signature": "<U:Lcom/example/A;>Ljava/lang/Object;" }
        ]"#,
    )
    .unwrap();

    let node = class(&env, "com.example.Node");
    assert_eq!(
        show(&env, &node),
        "com.example.Node<? extends com.example.Node<?>>"
    );
    let formal = class_type(&env, id(&env, "com.example.Node"), true).unwrap();
    let var = formal.as_parameterized().unwrap().args[0].as_variable().unwrap().clone();
    let bounds = type_variable_bounds(&env, &var).unwrap();
    assert_eq!(bounds, vec![node.clone()]);
    assert!(is_assignable_from(&env, &node, &node).unwrap());

    let a = class(&env, "com.example.A");
    let b = class(&env, "com.example.B");
    assert_eq!(
        show(&env, &a),
        "com.example.A<? extends com.example.B<? extends com.example.A<?>>>"
    );
    assert_eq!(
        show(&env, &b),
        "com.example.B<? extends com.example.A<? extends com.example.B<?>>>"
    );

    // Results do not depend on which class was expanded first.
    env.set_cache_enabled(true);
    assert_eq!(class(&env, "com.example.B"), b);
    assert_eq!(class(&env, "com.example.A"), a);
    assert_eq!(class(&env, "com.example.Node"), node);
}
