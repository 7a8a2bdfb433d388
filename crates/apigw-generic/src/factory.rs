//! Construction of [`GenericType`] nodes and the bridge to and from [`TypeDescriptor`]s.
//!
//! This is the only place static types are built, so it is also where the collection/map
//! specialization is decided: every class or parameterized type records whether its raw class
//! implements `java.util.Collection` or `java.util.Map`.

use std::sync::Arc;

use apigw_signature::{ClassDescriptor, TypeDescriptor, WildcardDescriptor};

use crate::error::{Result, TypeError};
use crate::registry::{
    class_name, is_subclass, needs_owner, ClassId, ClassKind, GenericDeclaration, TypeEnv,
    TypeVarId,
};
use crate::types::{
    ArrayType, ClassType, ContainerKind, GenericType, ParameterizedType, TypeKind, TypeVariable,
    UnionType, WildcardType,
};

/// Where type variable names in a descriptor are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeScope {
    /// No variables are in scope.
    Empty,
    /// The class's own variables, then those of enclosing classes while the class is inner.
    Class(ClassId),
    /// The method's variables first, then the class scope.
    Method { class: ClassId, index: u32 },
}

impl TypeScope {
    pub fn of(declaration: GenericDeclaration) -> Self {
        match declaration {
            GenericDeclaration::Class(class) => TypeScope::Class(class),
            GenericDeclaration::Method { class, index } => TypeScope::Method { class, index },
        }
    }

    fn describe(self, env: &dyn TypeEnv) -> String {
        match self {
            TypeScope::Empty => "an empty scope".to_string(),
            TypeScope::Class(class) => format!("class `{}`", class_name(env, class)),
            TypeScope::Method { class, index } => {
                let method = env
                    .class(class)
                    .and_then(|def| def.methods.get(index as usize))
                    .map(|method| method.name.as_str())
                    .unwrap_or("<unknown>");
                format!("method `{method}` of `{}`", class_name(env, class))
            }
        }
    }
}

pub fn require_class(env: &dyn TypeEnv, name: &str) -> Result<ClassId> {
    env.lookup_class(name).ok_or_else(|| TypeError::UnknownClass {
        name: name.to_string(),
    })
}

fn unknown_class(env: &dyn TypeEnv, id: ClassId) -> TypeError {
    TypeError::UnknownClass {
        name: class_name(env, id),
    }
}

fn container_kind(env: &dyn TypeEnv, id: ClassId) -> ContainerKind {
    let wk = env.well_known();
    if is_subclass(env, id, wk.collection) {
        ContainerKind::Collection
    } else if is_subclass(env, id, wk.map) {
        ContainerKind::Map
    } else {
        ContainerKind::Plain
    }
}

/// `java.lang.Object` as a type.
pub fn object_type(env: &dyn TypeEnv) -> GenericType {
    GenericType::new(TypeKind::Class(ClassType {
        id: env.well_known().object,
        container: ContainerKind::Plain,
    }))
}

/// The type of a class used by name.
///
/// Non-generic classes become class types. Generic classes (and inner classes of generic
/// classes) become parameterized types: with `keep_vars` the arguments are the declared
/// variables themselves (the class's formal type), otherwise each argument is a wildcard bounded
/// by the variable's declared bounds, which is how a raw use such as `List` is understood.
///
/// A raw use met again while its own bounds are being expanded (`class Node<T extends Node>`)
/// takes unbounded wildcards instead, so `Node` becomes `Node<? extends Node<?>>`.
pub fn class_type(env: &dyn TypeEnv, id: ClassId, keep_vars: bool) -> Result<GenericType> {
    class_type_in(env, id, keep_vars, &mut Vec::new())
}

/// [`class_type`] with the raw uses currently being expanded.
fn class_type_in(
    env: &dyn TypeEnv,
    id: ClassId,
    keep_vars: bool,
    expanding: &mut Vec<ClassId>,
) -> Result<GenericType> {
    // Nested results depend on what encloses them, so only top-level results are memoised.
    let top_level = expanding.is_empty();
    if top_level {
        if let Some(cached) = env
            .type_cache()
            .and_then(|cache| cache.class_type(id, keep_vars))
        {
            return Ok(cached);
        }
    }

    let def = env.class(id).ok_or_else(|| unknown_class(env, id))?;
    let owner = match def.enclosing {
        Some(enclosing) if needs_owner(env, id) => {
            Some(class_type_in(env, enclosing, keep_vars, expanding)?)
        }
        _ => None,
    };

    let ty = if def.type_params.is_empty() && owner.is_none() {
        GenericType::new(TypeKind::Class(ClassType {
            id,
            container: container_kind(env, id),
        }))
    } else if keep_vars {
        let args = def
            .type_params
            .iter()
            .map(|param| type_variable(env, *param))
            .collect::<Result<Vec<_>>>()?;
        parameterized(env, id, owner, args)?
    } else if expanding.contains(&id) {
        let args = def
            .type_params
            .iter()
            .map(|_| unbounded_wildcard(env))
            .collect();
        parameterized(env, id, owner, args)?
    } else {
        expanding.push(id);
        let args = def
            .type_params
            .iter()
            .map(|param| {
                let bounds = bounds_in(env, &variable(env, *param)?, expanding)?;
                Ok(wildcard(env, bounds, None))
            })
            .collect::<Result<Vec<_>>>();
        expanding.pop();
        parameterized(env, id, owner, args?)?
    };

    if top_level {
        if let Some(cache) = env.type_cache() {
            cache.insert_class_type(id, keep_vars, ty.clone());
        }
    }
    Ok(ty)
}

/// Build `raw<args>` nested in `owner`.
///
/// The argument count must match the class's declared variables. An owner is required exactly
/// when the class is an inner class of a generic class; an owner supplied for any other class is
/// dropped.
pub fn parameterized(
    env: &dyn TypeEnv,
    raw: ClassId,
    owner: Option<GenericType>,
    args: Vec<GenericType>,
) -> Result<GenericType> {
    let def = env.class(raw).ok_or_else(|| unknown_class(env, raw))?;
    if args.len() != def.type_params.len() {
        return Err(TypeError::ArityMismatch {
            class: def.name.clone(),
            expected: def.type_params.len(),
            found: args.len(),
        });
    }

    let owner = if needs_owner(env, raw) {
        match owner {
            Some(owner) if owner.as_parameterized().is_some() => Some(owner),
            _ => {
                return Err(TypeError::MissingOwner {
                    class: def.name.clone(),
                })
            }
        }
    } else {
        if let Some(owner) = owner {
            tracing::trace!(
                target = "apigw.generic",
                class = %def.name,
                owner = %owner.display(env),
                "dropping owner of a class that does not need one"
            );
        }
        None
    };

    if owner.is_none() && args.is_empty() {
        return Err(TypeError::NotParameterized {
            class: def.name.clone(),
        });
    }

    Ok(GenericType::new(TypeKind::Parameterized(ParameterizedType {
        raw,
        owner,
        args,
        params: Arc::from(def.type_params.as_slice()),
        container: container_kind(env, raw),
    })))
}

pub fn array(component: GenericType) -> GenericType {
    GenericType::new(TypeKind::Array(ArrayType { component }))
}

/// `? extends upper_bounds... super lower_bound`. An empty bound list means `Object`.
pub fn wildcard(
    env: &dyn TypeEnv,
    upper_bounds: Vec<GenericType>,
    lower_bound: Option<GenericType>,
) -> GenericType {
    let upper_bounds = if upper_bounds.is_empty() {
        vec![object_type(env)]
    } else {
        upper_bounds
    };
    GenericType::new(TypeKind::Wildcard(WildcardType {
        upper_bounds,
        lower_bound,
    }))
}

/// `?`
pub fn unbounded_wildcard(env: &dyn TypeEnv) -> GenericType {
    wildcard(env, Vec::new(), None)
}

/// A union over `possible`. Nested unions are flattened and members sharing a raw type keep
/// only their first occurrence.
pub fn union(
    env: &dyn TypeEnv,
    declared: GenericType,
    possible: Vec<GenericType>,
) -> Result<GenericType> {
    let mut members = Vec::with_capacity(possible.len());
    for ty in possible {
        push_union_member(env, &mut members, ty)?;
    }
    if members.is_empty() {
        return Err(TypeError::EmptyUnion {
            declared: declared.display(env).to_string(),
        });
    }
    Ok(GenericType::new(TypeKind::Union(UnionType {
        declared,
        possible: members,
    })))
}

pub(crate) fn push_union_member(
    env: &dyn TypeEnv,
    members: &mut Vec<GenericType>,
    ty: GenericType,
) -> Result<()> {
    if let Some(union) = ty.as_union() {
        for member in &union.possible {
            push_union_member(env, members, member.clone())?;
        }
        return Ok(());
    }
    if !ty.is_static() {
        return Err(TypeError::InvalidUnionMember {
            member: ty.display(env).to_string(),
        });
    }
    let raw = ty.raw_type(env);
    if !members.iter().any(|member| member.raw_type(env) == raw) {
        members.push(ty);
    }
    Ok(())
}

pub(crate) fn variable(env: &dyn TypeEnv, id: TypeVarId) -> Result<TypeVariable> {
    let def = env
        .type_param(id)
        .ok_or_else(|| TypeError::UnknownTypeVariable {
            name: format!("#{}", id.to_raw()),
            scope: "the environment".to_string(),
        })?;
    Ok(TypeVariable {
        declaration: def.declaration,
        name: Arc::from(def.name.as_str()),
        id,
    })
}

pub fn type_variable(env: &dyn TypeEnv, id: TypeVarId) -> Result<GenericType> {
    Ok(GenericType::new(TypeKind::Variable(variable(env, id)?)))
}

/// Declared upper bounds of `var`, interpreted in the scope of its declaration.
///
/// Bounds are converted on every call and may mention `var` itself.
pub fn type_variable_bounds(env: &dyn TypeEnv, var: &TypeVariable) -> Result<Vec<GenericType>> {
    bounds_in(env, var, &mut Vec::new())
}

fn bounds_in(
    env: &dyn TypeEnv,
    var: &TypeVariable,
    expanding: &mut Vec<ClassId>,
) -> Result<Vec<GenericType>> {
    let def = env
        .type_param(var.id)
        .ok_or_else(|| TypeError::UnknownTypeVariable {
            name: var.name.to_string(),
            scope: "the environment".to_string(),
        })?;
    if def.bounds.is_empty() {
        return Ok(vec![object_type(env)]);
    }
    let scope = TypeScope::of(def.declaration);
    def.bounds
        .iter()
        .map(|bound| from_descriptor_in(env, bound, scope, expanding))
        .collect()
}

fn find_param(env: &dyn TypeEnv, params: &[TypeVarId], name: &str) -> Option<TypeVarId> {
    params
        .iter()
        .copied()
        .find(|param| env.type_param(*param).is_some_and(|def| def.name == name))
}

fn lookup_variable(env: &dyn TypeEnv, scope: TypeScope, name: &str) -> Option<TypeVarId> {
    let mut current = match scope {
        TypeScope::Empty => return None,
        TypeScope::Class(class) => class,
        TypeScope::Method { class, index } => {
            let method = env.class(class)?.methods.get(index as usize)?;
            if let Some(id) = find_param(env, &method.type_params, name) {
                return Some(id);
            }
            class
        }
    };
    loop {
        let def = env.class(current)?;
        if let Some(id) = find_param(env, &def.type_params, name) {
            return Some(id);
        }
        if def.is_static {
            return None;
        }
        current = def.enclosing?;
    }
}

/// Convert a descriptor into a type, looking variables up in `scope`.
///
/// A class descriptor without arguments is a raw use (see [`class_type`]).
pub fn from_descriptor(
    env: &dyn TypeEnv,
    desc: &TypeDescriptor,
    scope: TypeScope,
) -> Result<GenericType> {
    from_descriptor_in(env, desc, scope, &mut Vec::new())
}

fn from_descriptor_in(
    env: &dyn TypeEnv,
    desc: &TypeDescriptor,
    scope: TypeScope,
    expanding: &mut Vec<ClassId>,
) -> Result<GenericType> {
    match desc {
        TypeDescriptor::Base(base) => {
            class_type_in(env, require_class(env, base.keyword())?, false, expanding)
        }
        TypeDescriptor::Class(class) => from_class_descriptor(env, class, scope, expanding),
        TypeDescriptor::Array(component) => Ok(array(from_descriptor_in(
            env, component, scope, expanding,
        )?)),
        TypeDescriptor::Variable(name) => {
            let id = lookup_variable(env, scope, name).ok_or_else(|| {
                TypeError::UnknownTypeVariable {
                    name: name.clone(),
                    scope: scope.describe(env),
                }
            })?;
            type_variable(env, id)
        }
        TypeDescriptor::Wildcard(wildcard_desc) => {
            if wildcard_desc.lower_bounds.len() > 1 {
                return Err(TypeError::UnsupportedDescriptor {
                    descriptor: desc.to_string(),
                    reason: "wildcard with several lower bounds",
                });
            }
            let uppers = wildcard_desc
                .upper_bounds
                .iter()
                .map(|bound| from_descriptor_in(env, bound, scope, expanding))
                .collect::<Result<Vec<_>>>()?;
            let lower = wildcard_desc
                .lower_bounds
                .first()
                .map(|bound| from_descriptor_in(env, bound, scope, expanding))
                .transpose()?;
            Ok(wildcard(env, uppers, lower))
        }
    }
}

fn from_class_descriptor(
    env: &dyn TypeEnv,
    class: &ClassDescriptor,
    scope: TypeScope,
    expanding: &mut Vec<ClassId>,
) -> Result<GenericType> {
    let id = require_class(env, &class.name)?;
    let owner = if needs_owner(env, id) {
        match &class.owner {
            Some(owner) => Some(from_class_descriptor(env, owner, scope, expanding)?),
            None if class.args.is_empty() => return class_type_in(env, id, false, expanding),
            None => {
                return Err(TypeError::MissingOwner {
                    class: class.name.clone(),
                })
            }
        }
    } else {
        None
    };

    if class.args.is_empty() && owner.is_none() {
        return class_type_in(env, id, false, expanding);
    }
    let args = class
        .args
        .iter()
        .map(|arg| from_descriptor_in(env, arg, scope, expanding))
        .collect::<Result<Vec<_>>>()?;
    parameterized(env, id, owner, args)
}

/// Convert a type back into a descriptor. A union becomes its declared type.
pub fn to_descriptor(env: &dyn TypeEnv, ty: &GenericType) -> Result<TypeDescriptor> {
    match ty.kind() {
        TypeKind::Class(class) => {
            let def = env.class(class.id).ok_or_else(|| unknown_class(env, class.id))?;
            if def.kind != ClassKind::Primitive {
                return Ok(TypeDescriptor::class(def.name.clone()));
            }
            apigw_signature::BaseType::from_keyword(&def.name)
                .map(TypeDescriptor::Base)
                .ok_or_else(|| TypeError::UnsupportedDescriptor {
                    descriptor: def.name.clone(),
                    reason: "`void` has no type descriptor",
                })
        }
        TypeKind::Array(array) => Ok(TypeDescriptor::array(to_descriptor(
            env,
            &array.component,
        )?)),
        TypeKind::Parameterized(ty) => {
            let def = env.class(ty.raw).ok_or_else(|| unknown_class(env, ty.raw))?;
            let owner = match &ty.owner {
                Some(owner) => match to_descriptor(env, owner)? {
                    TypeDescriptor::Class(owner) => Some(Box::new(owner)),
                    other => {
                        return Err(TypeError::UnsupportedDescriptor {
                            descriptor: other.to_string(),
                            reason: "owner type is not a class",
                        })
                    }
                },
                None => None,
            };
            let args = ty
                .args
                .iter()
                .map(|arg| to_descriptor(env, arg))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeDescriptor::Class(ClassDescriptor {
                name: def.name.clone(),
                owner,
                args,
            }))
        }
        TypeKind::Variable(var) => Ok(TypeDescriptor::variable(var.name.to_string())),
        TypeKind::Wildcard(wildcard) => {
            let upper_bounds = wildcard
                .upper_bounds
                .iter()
                .map(|bound| to_descriptor(env, bound))
                .collect::<Result<Vec<_>>>()?;
            let lower_bounds = wildcard
                .lower_bound
                .iter()
                .map(|bound| to_descriptor(env, bound))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeDescriptor::Wildcard(WildcardDescriptor {
                upper_bounds,
                lower_bounds,
            }))
        }
        TypeKind::Union(union) => to_descriptor(env, &union.declared),
    }
}

/// A parameterized type re-expressed over its raw class's own variables; other types are
/// returned as they are.
pub fn declared_type(env: &dyn TypeEnv, ty: &GenericType) -> Result<GenericType> {
    let Some(parameterized) = ty.as_parameterized() else {
        return Ok(ty.clone());
    };
    let args = parameterized
        .params
        .iter()
        .map(|param| type_variable(env, *param))
        .collect::<Result<Vec<_>>>()?;
    if args == parameterized.args {
        return Ok(ty.clone());
    }
    Ok(GenericType::with_parameterized_parts(
        parameterized,
        parameterized.owner.clone(),
        args,
    ))
}
