//! Generic type algebra over a declared class hierarchy.
//!
//! Types are immutable [`GenericType`] graphs: static types (classes, arrays, parameterized
//! types) and dynamic types (type variables, wildcards, unions). They are built by the factory
//! functions ([`class_type`], [`parameterized`], [`from_descriptor`], ...) against a [`TypeEnv`],
//! usually a [`ClassRegistry`], and transformed by the algebra:
//!
//! - [`resolve`] / [`resolve_in_context`] substitute type variables,
//! - [`combine`] unifies a formal type with an actual type into a [`VariableBinding`],
//! - [`intersect`] computes the most specific common type,
//! - [`as_super_type`] / [`as_sub_type`] move along the class hierarchy,
//! - [`is_assignable_from`] checks assignability,
//! - [`replace`] and [`visit`] rewrite and traverse type graphs.
//!
//! Incompatible types are an expected outcome and are reported as `Ok(None)` or `Ok(false)`.
//! [`TypeError`] is reserved for malformed definitions, conflicting bindings and variables a
//! resolver cannot supply.

#![forbid(unsafe_code)]

mod assign;
mod binding;
mod cache;
mod combine;
mod convert;
mod display;
mod error;
mod factory;
mod intersect;
mod jdk;
mod members;
mod model;
mod registry;
mod resolve;
mod simple;
mod traverse;
mod types;

pub use crate::assign::is_assignable_from;
pub use crate::binding::VariableBinding;
pub use crate::cache::TypeCache;
pub use crate::combine::combine;
pub use crate::convert::{
    as_sub_type, as_super_type, element_type, interfaces, key_type, map_entry_types, superclass,
    value_type,
};
pub use crate::display::TypeDisplay;
pub use crate::error::{Result, TypeError};
pub use crate::factory::{
    array, class_type, declared_type, from_descriptor, object_type, parameterized, require_class,
    to_descriptor, type_variable, type_variable_bounds, unbounded_wildcard, union, wildcard,
    TypeScope,
};
pub use crate::intersect::intersect;
pub use crate::members::{
    collect_fields, declared_fields, declared_methods, field, infer_method_binding,
    instantiate_return_type, GenericField, GenericMethod,
};
pub use crate::model::{class_models_schema, ClassModel, FieldModel, MethodModel};
pub use crate::registry::{
    is_subclass, ClassDef, ClassId, ClassKind, ClassRegistry, FieldDef, GenericDeclaration,
    MethodDef, TypeEnv, TypeParamDef, TypeVarId, WellKnownTypes,
};
pub use crate::resolve::{resolve, resolve_in_context, ContextResolver, TypeVariableResolver};
pub use crate::simple::{is_simple_class, is_simple_type};
pub use crate::traverse::{replace, visit, TypeVisitor};
pub use crate::types::{
    ArrayType, ClassType, ContainerKind, GenericType, ParameterizedType, RawType, TypeKind,
    TypeVariable, UnionType, WildcardType,
};
