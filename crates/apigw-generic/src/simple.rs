use crate::registry::{is_subclass, ClassId, ClassKind, TypeEnv};
use crate::types::GenericType;

const SIMPLE_CLASS_NAMES: &[&str] = &[
    "java.lang.Boolean",
    "java.lang.Byte",
    "java.lang.Character",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Float",
    "java.lang.Double",
    "java.lang.Void",
    "java.lang.CharSequence",
    "java.lang.String",
    "java.lang.StringBuffer",
    "java.lang.StringBuilder",
    "java.lang.Class",
];

/// Leaf types for serialization: primitives and `void`, boxes, text, `Class`, enums, and
/// subclasses of `Number` or `Date`, plus anything the environment marks as simple.
pub fn is_simple_type(env: &dyn TypeEnv, ty: &GenericType) -> bool {
    ty.raw_class()
        .is_some_and(|raw| is_simple_class(env, raw))
}

pub fn is_simple_class(env: &dyn TypeEnv, id: ClassId) -> bool {
    if env.is_configured_simple_class(id) {
        return true;
    }
    let Some(def) = env.class(id) else {
        return false;
    };
    if matches!(def.kind, ClassKind::Primitive | ClassKind::Enum)
        || SIMPLE_CLASS_NAMES.contains(&def.name.as_str())
    {
        return true;
    }
    let wk = env.well_known();
    [wk.number, wk.date, wk.enum_]
        .into_iter()
        .any(|base| is_subclass(env, id, base))
}
