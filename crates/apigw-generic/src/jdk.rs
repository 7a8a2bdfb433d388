//! The slice of the platform class library every registry starts from.

use apigw_signature::{BaseType, TypeDescriptor, OBJECT_CLASS_NAME};

use crate::registry::{
    ClassDef, ClassId, ClassKind, ClassRegistry, GenericDeclaration, MethodDef, TypeEnv,
};

fn class(name: &str) -> TypeDescriptor {
    TypeDescriptor::class(name)
}

fn var(name: &str) -> TypeDescriptor {
    TypeDescriptor::variable(name)
}

fn generic(name: &str, args: &[TypeDescriptor]) -> TypeDescriptor {
    TypeDescriptor::parameterized(name, args.to_vec())
}

fn object() -> TypeDescriptor {
    TypeDescriptor::object()
}

fn define(
    registry: &mut ClassRegistry,
    name: &str,
    kind: ClassKind,
    params: &[(&str, Vec<TypeDescriptor>)],
    super_class: Option<TypeDescriptor>,
    interfaces: Vec<TypeDescriptor>,
) -> ClassId {
    let id = registry.intern_class_id(name);
    let mut def = ClassDef::new(name, kind);
    def.type_params = params
        .iter()
        .map(|(param, bounds)| {
            registry.add_type_param(*param, GenericDeclaration::Class(id), bounds.clone())
        })
        .collect();
    def.super_class = super_class;
    def.interfaces = interfaces;
    registry.define_class(id, def);
    id
}

/// Attach a method to an already defined class. `type_params` are declared by the method.
fn add_method(
    registry: &mut ClassRegistry,
    class: ClassId,
    name: &str,
    type_params: &[&str],
    params: Vec<TypeDescriptor>,
    return_type: Option<TypeDescriptor>,
    is_static: bool,
) {
    let Some(mut def) = registry.class(class).cloned() else {
        return;
    };
    let index = u32::try_from(def.methods.len()).expect("too many platform methods");
    let type_params = type_params
        .iter()
        .map(|param| {
            registry.add_type_param(
                *param,
                GenericDeclaration::Method { class, index },
                vec![object()],
            )
        })
        .collect();
    def.methods.push(MethodDef {
        name: name.to_string(),
        type_params,
        params,
        return_type,
        is_static,
    });
    registry.define_class(class, def);
}

pub(crate) fn define_minimal_jdk(registry: &mut ClassRegistry) {
    use ClassKind::{Class, Interface, Primitive};

    define(registry, OBJECT_CLASS_NAME, Class, &[], None, vec![]);
    for base in BaseType::ALL {
        define(registry, base.keyword(), Primitive, &[], None, vec![]);
    }
    define(registry, "void", Primitive, &[], None, vec![]);

    let serializable = class("java.io.Serializable");
    let cloneable = class("java.lang.Cloneable");
    define(registry, "java.io.Serializable", Interface, &[], None, vec![]);
    define(registry, "java.lang.Cloneable", Interface, &[], None, vec![]);
    define(registry, "java.lang.CharSequence", Interface, &[], None, vec![]);
    define(
        registry,
        "java.lang.Comparable",
        Interface,
        &[("T", vec![object()])],
        None,
        vec![],
    );
    define(
        registry,
        "java.lang.Number",
        Class,
        &[],
        Some(object()),
        vec![serializable.clone()],
    );

    for boxed in [
        "java.lang.Byte",
        "java.lang.Short",
        "java.lang.Integer",
        "java.lang.Long",
        "java.lang.Float",
        "java.lang.Double",
    ] {
        define(
            registry,
            boxed,
            Class,
            &[],
            Some(class("java.lang.Number")),
            vec![generic("java.lang.Comparable", &[class(boxed)])],
        );
    }
    for boxed in ["java.lang.Boolean", "java.lang.Character"] {
        define(
            registry,
            boxed,
            Class,
            &[],
            Some(object()),
            vec![
                serializable.clone(),
                generic("java.lang.Comparable", &[class(boxed)]),
            ],
        );
    }
    define(registry, "java.lang.Void", Class, &[], Some(object()), vec![]);

    define(
        registry,
        "java.lang.String",
        Class,
        &[],
        Some(object()),
        vec![
            serializable.clone(),
            generic("java.lang.Comparable", &[class("java.lang.String")]),
            class("java.lang.CharSequence"),
        ],
    );
    for builder in ["java.lang.StringBuilder", "java.lang.StringBuffer"] {
        define(
            registry,
            builder,
            Class,
            &[],
            Some(object()),
            vec![serializable.clone(), class("java.lang.CharSequence")],
        );
    }

    define(
        registry,
        "java.lang.Enum",
        Class,
        &[("E", vec![generic("java.lang.Enum", &[var("E")])])],
        Some(object()),
        vec![
            generic("java.lang.Comparable", &[var("E")]),
            serializable.clone(),
        ],
    );
    define(
        registry,
        "java.lang.Class",
        Class,
        &[("T", vec![object()])],
        Some(object()),
        vec![serializable.clone()],
    );
    define(
        registry,
        "java.util.Date",
        Class,
        &[],
        Some(object()),
        vec![
            serializable.clone(),
            cloneable.clone(),
            generic("java.lang.Comparable", &[class("java.util.Date")]),
        ],
    );

    define(
        registry,
        "java.lang.Iterable",
        Interface,
        &[("T", vec![object()])],
        None,
        vec![],
    );
    define(
        registry,
        "java.util.Collection",
        Interface,
        &[("E", vec![object()])],
        None,
        vec![generic("java.lang.Iterable", &[var("E")])],
    );
    let list = define(
        registry,
        "java.util.List",
        Interface,
        &[("E", vec![object()])],
        None,
        vec![generic("java.util.Collection", &[var("E")])],
    );
    add_method(
        registry,
        list,
        "get",
        &[],
        vec![TypeDescriptor::Base(BaseType::Int)],
        Some(var("E")),
        false,
    );
    add_method(
        registry,
        list,
        "add",
        &[],
        vec![var("E")],
        Some(TypeDescriptor::Base(BaseType::Boolean)),
        false,
    );
    define(
        registry,
        "java.util.Set",
        Interface,
        &[("E", vec![object()])],
        None,
        vec![generic("java.util.Collection", &[var("E")])],
    );
    define(
        registry,
        "java.util.AbstractCollection",
        Class,
        &[("E", vec![object()])],
        Some(object()),
        vec![generic("java.util.Collection", &[var("E")])],
    );
    define(
        registry,
        "java.util.AbstractList",
        Class,
        &[("E", vec![object()])],
        Some(generic("java.util.AbstractCollection", &[var("E")])),
        vec![generic("java.util.List", &[var("E")])],
    );
    define(
        registry,
        "java.util.ArrayList",
        Class,
        &[("E", vec![object()])],
        Some(generic("java.util.AbstractList", &[var("E")])),
        vec![
            generic("java.util.List", &[var("E")]),
            cloneable.clone(),
            serializable.clone(),
        ],
    );
    define(
        registry,
        "java.util.HashSet",
        Class,
        &[("E", vec![object()])],
        Some(generic("java.util.AbstractCollection", &[var("E")])),
        vec![
            generic("java.util.Set", &[var("E")]),
            cloneable.clone(),
            serializable.clone(),
        ],
    );

    let map_params = [("K", vec![object()]), ("V", vec![object()])];
    define(registry, "java.util.Map", Interface, &map_params, None, vec![]);
    define(
        registry,
        "java.util.AbstractMap",
        Class,
        &map_params,
        Some(object()),
        vec![generic("java.util.Map", &[var("K"), var("V")])],
    );
    define(
        registry,
        "java.util.HashMap",
        Class,
        &map_params,
        Some(generic("java.util.AbstractMap", &[var("K"), var("V")])),
        vec![
            generic("java.util.Map", &[var("K"), var("V")]),
            cloneable,
            serializable,
        ],
    );

    let optional = define(
        registry,
        "java.util.Optional",
        Class,
        &[("T", vec![object()])],
        Some(object()),
        vec![],
    );
    add_method(registry, optional, "get", &[], vec![], Some(var("T")), false);
    // `static <T> Optional<T> of(T value)` shadows the class-level `T`.
    add_method(
        registry,
        optional,
        "of",
        &["T"],
        vec![var("T")],
        Some(generic("java.util.Optional", &[var("T")])),
        true,
    );
}
