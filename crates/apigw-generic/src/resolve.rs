use crate::error::{Result, TypeError};
use crate::factory::array;
use crate::registry::TypeEnv;
use crate::types::{GenericType, TypeKind, TypeVariable, UnionType, WildcardType};

/// Supplies the replacement for every type variable [`resolve`] meets.
///
/// A resolver that cannot produce a type must return an error; there is no fallback.
pub trait TypeVariableResolver {
    fn resolve(&mut self, var: &TypeVariable) -> Result<GenericType>;
}

impl<F> TypeVariableResolver for F
where
    F: FnMut(&TypeVariable) -> Result<GenericType>,
{
    fn resolve(&mut self, var: &TypeVariable) -> Result<GenericType> {
        self(var)
    }
}

/// Looks variables up in the arguments of a parameterized declaring context, walking out
/// through its owners.
pub struct ContextResolver<'a> {
    env: &'a dyn TypeEnv,
    context: &'a GenericType,
}

impl<'a> ContextResolver<'a> {
    /// Fails with [`TypeError::NotParameterized`] unless `context` is a parameterized type.
    pub fn new(env: &'a dyn TypeEnv, context: &'a GenericType) -> Result<Self> {
        if context.as_parameterized().is_none() {
            return Err(TypeError::NotParameterized {
                class: context.display(env).to_string(),
            });
        }
        Ok(Self { env, context })
    }
}

impl TypeVariableResolver for ContextResolver<'_> {
    fn resolve(&mut self, var: &TypeVariable) -> Result<GenericType> {
        self.context
            .as_parameterized()
            .and_then(|context| context.find_type_argument(var))
            .cloned()
            .ok_or_else(|| TypeError::UnresolvedVariable {
                variable: var.name.to_string(),
                context: self.context.display(self.env).to_string(),
            })
    }
}

/// Replace every type variable reachable from `ty` with what `resolver` returns for it.
///
/// Subtrees without variables are shared with the input; if nothing changes the result is the
/// input node itself. Wildcard bounds and union members are resolved too.
pub fn resolve(ty: &GenericType, resolver: &mut dyn TypeVariableResolver) -> Result<GenericType> {
    match ty.kind() {
        TypeKind::Class(_) => Ok(ty.clone()),
        TypeKind::Array(array_ty) => {
            let component = resolve(&array_ty.component, resolver)?;
            if component == array_ty.component {
                Ok(ty.clone())
            } else {
                Ok(array(component))
            }
        }
        TypeKind::Parameterized(parameterized) => {
            let owner = parameterized
                .owner
                .as_ref()
                .map(|owner| resolve(owner, resolver))
                .transpose()?;
            let args = resolve_all(&parameterized.args, resolver)?;
            if owner == parameterized.owner && args == parameterized.args {
                Ok(ty.clone())
            } else {
                Ok(GenericType::with_parameterized_parts(
                    parameterized,
                    owner,
                    args,
                ))
            }
        }
        TypeKind::Variable(var) => resolver.resolve(var),
        TypeKind::Wildcard(wildcard) => {
            let upper_bounds = resolve_all(&wildcard.upper_bounds, resolver)?;
            let lower_bound = wildcard
                .lower_bound
                .as_ref()
                .map(|bound| resolve(bound, resolver))
                .transpose()?;
            if upper_bounds == wildcard.upper_bounds && lower_bound == wildcard.lower_bound {
                Ok(ty.clone())
            } else {
                Ok(GenericType::new(TypeKind::Wildcard(WildcardType {
                    upper_bounds,
                    lower_bound,
                })))
            }
        }
        TypeKind::Union(union) => {
            let possible = resolve_all(&union.possible, resolver)?;
            if possible == union.possible {
                Ok(ty.clone())
            } else {
                Ok(GenericType::new(TypeKind::Union(UnionType {
                    declared: union.declared.clone(),
                    possible,
                })))
            }
        }
    }
}

fn resolve_all(
    types: &[GenericType],
    resolver: &mut dyn TypeVariableResolver,
) -> Result<Vec<GenericType>> {
    types.iter().map(|ty| resolve(ty, resolver)).collect()
}

/// Resolve `ty` against a parameterized declaring context.
///
/// Every variable in `ty` must be declared by the context's raw class or one of its owners;
/// otherwise this fails with [`TypeError::UnresolvedVariable`].
pub fn resolve_in_context(
    env: &dyn TypeEnv,
    ty: &GenericType,
    context: &GenericType,
) -> Result<GenericType> {
    let mut resolver = ContextResolver::new(env, context)?;
    resolve(ty, &mut resolver)
}
