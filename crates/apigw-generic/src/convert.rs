use std::collections::HashMap;

use crate::combine::combine;
use crate::error::{Result, TypeError};
use crate::factory::{
    class_type, from_descriptor, object_type, type_variable_bounds, wildcard, TypeScope,
};
use crate::registry::{class_name, is_subclass, ClassId, TypeEnv, TypeVarId};
use crate::resolve::{resolve, resolve_in_context};
use crate::types::{GenericType, TypeKind, TypeVariable};

/// View `ty` as its ancestor `target`, substituting type arguments along the way.
///
/// `ArrayList<String>` viewed as `java.util.Collection` is `Collection<String>`. Returns `None`
/// when `target` is not an ancestor. Variables and wildcards are viewed through their upper
/// bounds (the first bound that reaches `target` wins); unions have no single ancestor view.
///
/// Every static type converts to `Object`; arrays additionally convert to `Cloneable` and
/// `Serializable`.
pub fn as_super_type(
    env: &dyn TypeEnv,
    ty: &GenericType,
    target: ClassId,
) -> Result<Option<GenericType>> {
    let mut seen_type_vars = Vec::new();
    super_type_inner(env, ty, target, &mut seen_type_vars)
}

fn super_type_inner(
    env: &dyn TypeEnv,
    ty: &GenericType,
    target: ClassId,
    seen_type_vars: &mut Vec<TypeVarId>,
) -> Result<Option<GenericType>> {
    match ty.kind() {
        TypeKind::Class(_) | TypeKind::Parameterized(_) => {
            let Some(raw) = ty.raw_class() else {
                return Ok(None);
            };
            if !is_subclass(env, raw, target) {
                return Ok(None);
            }
            if raw == target {
                return Ok(Some(ty.clone()));
            }
            if target == env.well_known().object {
                return Ok(Some(object_type(env)));
            }

            if let Some(super_class) = superclass(env, ty)? {
                if let Some(found) = super_type_inner(env, &super_class, target, seen_type_vars)? {
                    return Ok(Some(found));
                }
            }
            for iface in interfaces(env, ty)? {
                if let Some(found) = super_type_inner(env, &iface, target, seen_type_vars)? {
                    return Ok(Some(found));
                }
            }

            tracing::debug!(
                target = "apigw.generic",
                ty = %ty.display(env),
                ancestor = %class_name(env, target),
                "declared supertypes do not reach a nominal ancestor"
            );
            Ok(None)
        }
        TypeKind::Array(_) => {
            let wk = env.well_known();
            if target == wk.object || target == wk.cloneable || target == wk.serializable {
                Ok(Some(class_type(env, target, false)?))
            } else {
                Ok(None)
            }
        }
        TypeKind::Variable(var) => {
            if seen_type_vars.contains(&var.id) {
                return Ok(None);
            }
            seen_type_vars.push(var.id);
            for bound in type_variable_bounds(env, var)? {
                if let Some(found) = super_type_inner(env, &bound, target, seen_type_vars)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        TypeKind::Wildcard(wildcard) => {
            for bound in &wildcard.upper_bounds {
                if let Some(found) = super_type_inner(env, bound, target, seen_type_vars)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        TypeKind::Union(_) => Ok(None),
    }
}

/// Instantiate the subclass `target` so that it views back as `ty`.
///
/// The formal type of `target` is lifted to `ty`'s raw class, unified with `ty`, and the
/// resulting binding substituted back into the formal type. Variables of `target` that `ty`
/// does not constrain become wildcards bounded by their declared bounds, one wildcard per
/// variable.
///
/// `ArrayList` as a subtype of `List<String>` is `ArrayList<String>`. Returns `None` when
/// `target` is not a subclass of `ty`'s raw class or no consistent instantiation exists.
pub fn as_sub_type(
    env: &dyn TypeEnv,
    ty: &GenericType,
    target: ClassId,
) -> Result<Option<GenericType>> {
    let Some(raw) = ty.raw_class() else {
        return Ok(None);
    };
    if !is_subclass(env, target, raw) {
        return Ok(None);
    }

    let formal = class_type(env, target, true)?;
    let Some(ancestor) = as_super_type(env, &formal, raw)? else {
        return Err(TypeError::InconsistentHierarchy {
            class: class_name(env, target),
            ancestor: class_name(env, raw),
        });
    };
    let binding = match combine(env, &ancestor, ty) {
        Ok(Some(binding)) => binding,
        Ok(None) | Err(TypeError::ConflictingBinding { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut fresh: HashMap<TypeVarId, GenericType> = HashMap::new();
    let mut resolver = |var: &TypeVariable| -> Result<GenericType> {
        if let Some(bound) = binding.get(var) {
            return Ok(bound.clone());
        }
        if let Some(existing) = fresh.get(&var.id) {
            return Ok(existing.clone());
        }
        let unconstrained = wildcard(env, type_variable_bounds(env, var)?, None);
        fresh.insert(var.id, unconstrained.clone());
        Ok(unconstrained)
    };
    Ok(Some(resolve(&formal, &mut resolver)?))
}

fn resolve_against(
    env: &dyn TypeEnv,
    declared: GenericType,
    ty: &GenericType,
) -> Result<GenericType> {
    if ty.as_parameterized().is_some() {
        resolve_in_context(env, &declared, ty)
    } else {
        Ok(declared)
    }
}

/// The direct superclass of a static type, resolved against `ty` when it is parameterized.
///
/// `Object`, interfaces and primitives have none; arrays have `Object`.
pub fn superclass(env: &dyn TypeEnv, ty: &GenericType) -> Result<Option<GenericType>> {
    if ty.as_array().is_some() {
        return Ok(Some(object_type(env)));
    }
    let Some(raw) = ty.raw_class() else {
        return Ok(None);
    };
    let def = env.class(raw).ok_or_else(|| TypeError::UnknownClass {
        name: class_name(env, raw),
    })?;
    let Some(desc) = &def.super_class else {
        return Ok(None);
    };
    let declared = from_descriptor(env, desc, TypeScope::Class(raw))?;
    Ok(Some(resolve_against(env, declared, ty)?))
}

/// The directly implemented interfaces of a static type, resolved like [`superclass`].
pub fn interfaces(env: &dyn TypeEnv, ty: &GenericType) -> Result<Vec<GenericType>> {
    if ty.as_array().is_some() {
        let wk = env.well_known();
        return Ok(vec![
            class_type(env, wk.cloneable, false)?,
            class_type(env, wk.serializable, false)?,
        ]);
    }
    let Some(raw) = ty.raw_class() else {
        return Ok(Vec::new());
    };
    let def = env.class(raw).ok_or_else(|| TypeError::UnknownClass {
        name: class_name(env, raw),
    })?;
    def.interfaces
        .iter()
        .map(|desc| {
            let declared = from_descriptor(env, desc, TypeScope::Class(raw))?;
            resolve_against(env, declared, ty)
        })
        .collect()
}

/// Element type of an array or of a collection type (its `Collection<E>` argument).
pub fn element_type(env: &dyn TypeEnv, ty: &GenericType) -> Result<Option<GenericType>> {
    if let Some(array) = ty.as_array() {
        return Ok(Some(array.component.clone()));
    }
    if !ty.is_collection_like() {
        return Ok(None);
    }
    let collection = as_super_type(env, ty, env.well_known().collection)?;
    Ok(collection
        .as_ref()
        .and_then(GenericType::as_parameterized)
        .and_then(|collection| collection.args.first().cloned()))
}

/// Key and value types of a map type (its `Map<K, V>` arguments).
pub fn map_entry_types(
    env: &dyn TypeEnv,
    ty: &GenericType,
) -> Result<Option<(GenericType, GenericType)>> {
    if !ty.is_map() {
        return Ok(None);
    }
    let map = as_super_type(env, ty, env.well_known().map)?;
    Ok(map
        .as_ref()
        .and_then(GenericType::as_parameterized)
        .and_then(|map| match map.args.as_slice() {
            [key, value] => Some((key.clone(), value.clone())),
            _ => None,
        }))
}

pub fn key_type(env: &dyn TypeEnv, ty: &GenericType) -> Result<Option<GenericType>> {
    Ok(map_entry_types(env, ty)?.map(|(key, _)| key))
}

pub fn value_type(env: &dyn TypeEnv, ty: &GenericType) -> Result<Option<GenericType>> {
    Ok(map_entry_types(env, ty)?.map(|(_, value)| value))
}
