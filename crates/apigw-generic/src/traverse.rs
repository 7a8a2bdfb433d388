//! Structural rewriting and bottom-up traversal of type graphs.

use crate::error::Result;
use crate::factory::{array, push_union_member};
use crate::registry::TypeEnv;
use crate::types::{GenericType, TypeKind, UnionType, WildcardType};

/// Rewrite `ty` with `replacer`.
///
/// The hook sees a node before its components: whatever it returns has its components
/// (array component, owner and arguments, wildcard bounds, union members) replaced in turn.
/// A hook that returns a type containing the node it was given keeps expanding it.
///
/// A union member replaced by another union is flattened into the enclosing union, keeping the
/// first member of each raw type. Replacing a union member with a variable or wildcard is a
/// [`crate::TypeError::InvalidUnionMember`].
pub fn replace<F>(env: &dyn TypeEnv, ty: &GenericType, replacer: &mut F) -> Result<GenericType>
where
    F: FnMut(&GenericType) -> GenericType,
{
    let ty = replacer(ty);
    match ty.kind() {
        TypeKind::Class(_) | TypeKind::Variable(_) => Ok(ty),
        TypeKind::Array(array_ty) => {
            let component = replace(env, &array_ty.component, replacer)?;
            if component == array_ty.component {
                Ok(ty)
            } else {
                Ok(array(component))
            }
        }
        TypeKind::Parameterized(parameterized) => {
            let owner = parameterized
                .owner
                .as_ref()
                .map(|owner| replace(env, owner, replacer))
                .transpose()?;
            let args = parameterized
                .args
                .iter()
                .map(|arg| replace(env, arg, replacer))
                .collect::<Result<Vec<_>>>()?;
            if owner == parameterized.owner && args == parameterized.args {
                Ok(ty)
            } else {
                Ok(GenericType::with_parameterized_parts(
                    parameterized,
                    owner,
                    args,
                ))
            }
        }
        TypeKind::Wildcard(wildcard) => {
            let upper_bounds = wildcard
                .upper_bounds
                .iter()
                .map(|bound| replace(env, bound, replacer))
                .collect::<Result<Vec<_>>>()?;
            let lower_bound = wildcard
                .lower_bound
                .as_ref()
                .map(|bound| replace(env, bound, replacer))
                .transpose()?;
            if upper_bounds == wildcard.upper_bounds && lower_bound == wildcard.lower_bound {
                Ok(ty)
            } else {
                Ok(GenericType::new(TypeKind::Wildcard(WildcardType {
                    upper_bounds,
                    lower_bound,
                })))
            }
        }
        TypeKind::Union(union) => {
            let mut possible = Vec::with_capacity(union.possible.len());
            for member in &union.possible {
                let member = replace(env, member, replacer)?;
                push_union_member(env, &mut possible, member)?;
            }
            if possible == union.possible {
                Ok(ty)
            } else {
                Ok(GenericType::new(TypeKind::Union(UnionType {
                    declared: union.declared.clone(),
                    possible,
                })))
            }
        }
    }
}

/// Receives every node of a type graph after its children.
pub trait TypeVisitor {
    type Report;

    /// `children` holds the reports of the array component, the parameterized arguments or
    /// the union members, in order. Other nodes have no children.
    fn visit_type(&mut self, ty: &GenericType, children: Vec<Self::Report>) -> Self::Report;
}

/// Post-order traversal of `ty`.
pub fn visit<V>(ty: &GenericType, visitor: &mut V) -> V::Report
where
    V: TypeVisitor + ?Sized,
{
    let children = match ty.kind() {
        TypeKind::Array(array_ty) => vec![visit(&array_ty.component, visitor)],
        TypeKind::Parameterized(parameterized) => parameterized
            .args
            .iter()
            .map(|arg| visit(arg, visitor))
            .collect(),
        TypeKind::Union(union) => union
            .possible
            .iter()
            .map(|member| visit(member, visitor))
            .collect(),
        TypeKind::Class(_) | TypeKind::Variable(_) | TypeKind::Wildcard(_) => Vec::new(),
    };
    visitor.visit_type(ty, children)
}
