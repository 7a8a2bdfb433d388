use crate::convert::{as_sub_type, as_super_type};
use crate::error::{Result, TypeError};
use crate::factory::{array, type_variable_bounds, variable};
use crate::registry::TypeEnv;
use crate::resolve::resolve_in_context;
use crate::types::{
    ArrayType, ClassType, GenericType, ParameterizedType, TypeKind, UnionType, WildcardType,
};

/// The most specific type that is an instance of both `a` and `b`.
///
/// Returns `Ok(None)` when the two types have nothing in common. The result is symmetric in
/// meaning but not always in shape: a wildcard intersected with a static type keeps the
/// wildcard, a union intersected with a union keeps the left declared type.
pub fn intersect(
    env: &dyn TypeEnv,
    a: &GenericType,
    b: &GenericType,
) -> Result<Option<GenericType>> {
    if a == b {
        return Ok(Some(a.clone()));
    }
    match a.kind() {
        TypeKind::Class(class) => intersect_class(env, a, class, b),
        TypeKind::Array(array_ty) => intersect_array(env, a, array_ty, b),
        TypeKind::Parameterized(parameterized) => {
            let Some(other) = b.as_parameterized() else {
                return intersect(env, b, a);
            };
            if parameterized.raw == other.raw {
                return intersect_same_raw(env, parameterized, other);
            }
            if let Some(aligned) = as_sub_type(env, b, parameterized.raw)? {
                if let Some(aligned) = aligned.as_parameterized() {
                    return intersect_same_raw(env, parameterized, aligned);
                }
            }
            if let Some(aligned) = as_sub_type(env, a, other.raw)? {
                if let Some(aligned) = aligned.as_parameterized() {
                    return intersect_same_raw(env, other, aligned);
                }
            }
            Ok(None)
        }
        // distinct variables share no instances we can name
        TypeKind::Variable(_) => Ok(None),
        TypeKind::Wildcard(wildcard) => intersect_wildcard(env, a, wildcard, b),
        TypeKind::Union(union) => Ok(intersect_union(union, b)),
    }
}

fn intersect_class(
    env: &dyn TypeEnv,
    a: &GenericType,
    class: &ClassType,
    b: &GenericType,
) -> Result<Option<GenericType>> {
    if b.is_dynamic() {
        return intersect(env, b, a);
    }
    if as_super_type(env, b, class.id)?.is_some() {
        return Ok(Some(b.clone()));
    }
    if let Some(raw) = b.raw_class() {
        if as_super_type(env, a, raw)?.is_some() {
            return Ok(Some(a.clone()));
        }
    }
    Ok(None)
}

fn intersect_array(
    env: &dyn TypeEnv,
    a: &GenericType,
    array_ty: &ArrayType,
    b: &GenericType,
) -> Result<Option<GenericType>> {
    match b.kind() {
        TypeKind::Array(other) => {
            let Some(component) = intersect(env, &array_ty.component, &other.component)? else {
                return Ok(None);
            };
            if component == array_ty.component {
                Ok(Some(a.clone()))
            } else if component == other.component {
                Ok(Some(b.clone()))
            } else {
                Ok(Some(array(component)))
            }
        }
        TypeKind::Class(class) => Ok(as_super_type(env, a, class.id)?.map(|_| a.clone())),
        TypeKind::Parameterized(_) => Ok(None),
        TypeKind::Variable(_) | TypeKind::Wildcard(_) | TypeKind::Union(_) => {
            intersect(env, b, a)
        }
    }
}

/// A static type already implied by one of the upper bounds leaves the wildcard unchanged;
/// any other static type becomes an additional upper bound.
fn intersect_wildcard(
    env: &dyn TypeEnv,
    a: &GenericType,
    wildcard: &WildcardType,
    b: &GenericType,
) -> Result<Option<GenericType>> {
    if !b.is_static() {
        return Ok(None);
    }
    for bound in &wildcard.upper_bounds {
        if bound == b {
            return Ok(Some(a.clone()));
        }
        if let Some(raw) = b.raw_class() {
            if as_super_type(env, bound, raw)?.as_ref() == Some(b) {
                return Ok(Some(a.clone()));
            }
        }
    }
    let mut upper_bounds = wildcard.upper_bounds.clone();
    upper_bounds.push(b.clone());
    Ok(Some(GenericType::new(TypeKind::Wildcard(WildcardType {
        upper_bounds,
        lower_bound: wildcard.lower_bound.clone(),
    }))))
}

fn intersect_union(union: &UnionType, b: &GenericType) -> Option<GenericType> {
    match b.kind() {
        TypeKind::Class(_) | TypeKind::Array(_) | TypeKind::Parameterized(_) => {
            union.possible.iter().any(|member| member == b).then(|| b.clone())
        }
        TypeKind::Union(other) => {
            let possible: Vec<GenericType> = union
                .possible
                .iter()
                .filter(|member| other.possible.contains(member))
                .cloned()
                .collect();
            if possible.is_empty() {
                return None;
            }
            Some(GenericType::new(TypeKind::Union(UnionType {
                declared: union.declared.clone(),
                possible,
            })))
        }
        TypeKind::Variable(_) | TypeKind::Wildcard(_) => None,
    }
}

/// Intersect two instantiations of the same raw class argument by argument.
///
/// After the arguments are intersected, each argument is narrowed once more against its
/// variable's bounds resolved in the partial result, left to right, since a later variable's
/// bound may mention an earlier variable. A bound that has no intersection with the argument
/// is skipped.
pub(crate) fn intersect_same_raw(
    env: &dyn TypeEnv,
    a: &ParameterizedType,
    b: &ParameterizedType,
) -> Result<Option<GenericType>> {
    debug_assert_eq!(a.raw, b.raw);
    if a.args.len() != b.args.len() {
        return Err(TypeError::ArityMismatch {
            class: crate::registry::class_name(env, a.raw),
            expected: a.args.len(),
            found: b.args.len(),
        });
    }
    let owner = match (&a.owner, &b.owner) {
        (Some(owner), Some(other)) => match intersect(env, owner, other)? {
            Some(owner) => Some(owner),
            None => return Ok(None),
        },
        (None, None) => None,
        (owner, other) => {
            let describe = |owner: &Option<GenericType>| {
                owner
                    .as_ref()
                    .map(|owner| owner.display(env).to_string())
                    .unwrap_or_else(|| "<none>".to_string())
            };
            return Err(TypeError::OwnerMismatch {
                formal: describe(owner),
                actual: describe(other),
            });
        }
    };

    let mut args = Vec::with_capacity(a.args.len());
    for (arg, other) in a.args.iter().zip(&b.args) {
        match intersect(env, arg, other)? {
            Some(arg) => args.push(arg),
            None => return Ok(None),
        }
    }

    let mut result = GenericType::with_parameterized_parts(a, owner.clone(), args.clone());
    for (idx, param) in a.params.iter().enumerate() {
        let var = variable(env, *param)?;
        for bound in type_variable_bounds(env, &var)? {
            let resolved = resolve_in_context(env, &bound, &result)?;
            match intersect(env, &args[idx], &resolved)? {
                Some(narrowed) if narrowed != args[idx] => {
                    args[idx] = narrowed;
                    result = GenericType::with_parameterized_parts(a, owner.clone(), args.clone());
                }
                _ => {}
            }
        }
    }
    Ok(Some(result))
}
