use apigw_generic::{
    array, class_type, declared_type, from_descriptor, parameterized, replace, to_descriptor,
    union, visit, wildcard, ClassId, ClassRegistry, GenericType, TypeEnv, TypeError, TypeKind,
    TypeScope, TypeVisitor,
};
use apigw_signature::{parse_type_signature, TypeDescriptor};

use pretty_assertions::assert_eq;

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
fn replacing_a_union_member_with_a_union_flattens() {
    let env = ClassRegistry::with_minimal_jdk();
    let object = class(&env, "java.lang.Object");
    let number = class(&env, "java.lang.Number");
    let string = class(&env, "java.lang.String");
    let integer = class(&env, "java.lang.Integer");
    let long = class(&env, "java.lang.Long");

    let outer = union(&env, object, vec![string.clone(), integer.clone()]).unwrap();
    let inner = union(&env, number, vec![long, string.clone()]).unwrap();

    let replaced = replace(&env, &outer, &mut |ty: &GenericType| {
        if *ty == integer {
            inner.clone()
        } else {
            ty.clone()
        }
    })
    .unwrap();

    assert_eq!(
        show(&env, &replaced),
        "union[java.lang.Object](java.lang.String,java.lang.Long)"
    );
    let members = &replaced.as_union().unwrap().possible;
    assert!(members.iter().all(|member| member.as_union().is_none()));
}

#[test]
fn replacing_a_union_member_with_a_variable_is_an_error() {
    let env = ClassRegistry::with_minimal_jdk();
    let object = class(&env, "java.lang.Object");
    let string = class(&env, "java.lang.String");
    let list = class_type(&env, id(&env, "java.util.List"), true).unwrap();
    let var = list.as_parameterized().unwrap().args[0].clone();

    let members = union(&env, object, vec![string.clone()]).unwrap();
    let err = replace(&env, &members, &mut |ty: &GenericType| {
        if *ty == string {
            var.clone()
        } else {
            ty.clone()
        }
    })
    .unwrap_err();
    assert!(matches!(err, TypeError::InvalidUnionMember { .. }), "{err}");
}

#[test]
fn replace_rewrites_nested_components_and_shares_untouched_ones() {
    let env = ClassRegistry::with_minimal_jdk();
    let string = class(&env, "java.lang.String");
    let integer = class(&env, "java.lang.Integer");
    let map = parameterized(
        &env,
        id(&env, "java.util.Map"),
        None,
        vec![string.clone(), array(wildcard(&env, vec![string.clone()], None))],
    )
    .unwrap();

    let replaced = replace(&env, &map, &mut |ty: &GenericType| {
        if *ty == string {
            integer.clone()
        } else {
            ty.clone()
        }
    })
    .unwrap();
    assert_eq!(
        show(&env, &replaced),
        "java.util.Map<java.lang.Integer, ? extends java.lang.Integer[]>"
    );

    let same = replace(&env, &map, &mut |ty: &GenericType| ty.clone()).unwrap();
    assert!(GenericType::ptr_eq(&same, &map));
}

struct Depth;

impl TypeVisitor for Depth {
    type Report = usize;

    fn visit_type(&mut self, _ty: &GenericType, children: Vec<usize>) -> usize {
        children.into_iter().max().map_or(1, |deepest| deepest + 1)
    }
}

#[derive(Default)]
struct Names<'a> {
    env: Option<&'a ClassRegistry>,
    order: Vec<String>,
}

impl TypeVisitor for Names<'_> {
    type Report = ();

    fn visit_type(&mut self, ty: &GenericType, _children: Vec<()>) {
        if let Some(env) = self.env {
            self.order.push(ty.display(env).to_string());
        }
    }
}

#[test]
fn visit_reports_children_before_parents() {
    let env = ClassRegistry::with_minimal_jdk();
    let string = class(&env, "java.lang.String");
    let list = parameterized(
        &env,
        id(&env, "java.util.List"),
        None,
        vec![array(string.clone())],
    )
    .unwrap();

    assert_eq!(visit(&list, &mut Depth), 3);
    assert_eq!(visit(&string, &mut Depth), 1);

    let mut names = Names {
        env: Some(&env),
        ..Names::default()
    };
    visit(&list, &mut names);
    assert_eq!(
        names.order,
        vec![
            "java.lang.String".to_string(),
            "java.lang.String[]".to_string(),
            "java.util.List<java.lang.String[]>".to_string(),
        ]
    );
}

#[test]
fn wildcards_are_leaves_for_visitors() {
    let env = ClassRegistry::with_minimal_jdk();
    let bounded = wildcard(&env, vec![class(&env, "java.lang.Number")], None);
    assert_eq!(visit(&bounded, &mut Depth), 1);
}

#[test]
fn descriptors_convert_both_ways() {
    let env = ClassRegistry::with_minimal_jdk();
    let desc = parse_type_signature("Ljava/util/Map<Ljava/lang/String;[I>;").unwrap();
    let ty = from_descriptor(&env, &desc, TypeScope::Empty).unwrap();
    assert_eq!(show(&env, &ty), "java.util.Map<java.lang.String, int[]>");
    assert!(ty.is_map());
    assert_eq!(to_descriptor(&env, &ty).unwrap(), desc);

    let lower = parse_type_signature("Ljava/util/List<-Ljava/lang/Integer;>;").unwrap();
    let ty = from_descriptor(&env, &lower, TypeScope::Empty).unwrap();
    assert_eq!(show(&env, &ty), "java.util.List<? super java.lang.Integer>");
    assert_eq!(to_descriptor(&env, &ty).unwrap(), lower);
}

#[test]
fn raw_descriptors_become_bounded_wildcards() {
    let env = ClassRegistry::with_minimal_jdk();
    let raw = from_descriptor(&env, &TypeDescriptor::class("java.lang.Enum"), TypeScope::Empty)
        .unwrap();
    assert_eq!(
        show(&env, &raw),
        "java.lang.Enum<? extends java.lang.Enum<E>>"
    );

    let declared = declared_type(&env, &raw).unwrap();
    assert_eq!(show(&env, &declared), "java.lang.Enum<E>");
}

#[test]
fn descriptor_errors_are_definition_errors() {
    let env = ClassRegistry::with_minimal_jdk();

    let unknown = TypeDescriptor::class("com.example.Nowhere");
    let err = from_descriptor(&env, &unknown, TypeScope::Empty).unwrap_err();
    assert!(matches!(err, TypeError::UnknownClass { .. }), "{err}");

    let free = TypeDescriptor::variable("T");
    let err = from_descriptor(&env, &free, TypeScope::Empty).unwrap_err();
    assert!(matches!(err, TypeError::UnknownTypeVariable { .. }), "{err}");

    let void = class(&env, "void");
    let err = to_descriptor(&env, &void).unwrap_err();
    assert!(matches!(err, TypeError::UnsupportedDescriptor { .. }), "{err}");
}

#[test]
fn union_descriptor_is_its_declared_type() {
    let env = ClassRegistry::with_minimal_jdk();
    let number = class(&env, "java.lang.Number");
    let members = union(
        &env,
        number,
        vec![class(&env, "java.lang.Integer"), class(&env, "java.lang.Long")],
    )
    .unwrap();
    assert_eq!(
        to_descriptor(&env, &members).unwrap(),
        TypeDescriptor::class("java.lang.Number")
    );
    assert!(matches!(members.kind(), TypeKind::Union(_)));
    assert!(members.is_dynamic());
}

#[test]
fn unions_deduplicate_by_raw_type_and_reject_empty_sets() {
    let env = ClassRegistry::with_minimal_jdk();
    let object = class(&env, "java.lang.Object");
    let string = class(&env, "java.lang.String");
    let list_string = parameterized(&env, id(&env, "java.util.List"), None, vec![string.clone()])
        .unwrap();
    let list_raw = class(&env, "java.util.List");

    let members = union(&env, object.clone(), vec![list_string.clone(), list_raw, string]).unwrap();
    let possible = &members.as_union().unwrap().possible;
    assert_eq!(possible.len(), 2);
    assert_eq!(possible[0], list_string);

    let err = union(&env, object, Vec::new()).unwrap_err();
    assert!(matches!(err, TypeError::EmptyUnion { .. }), "{err}");
}
