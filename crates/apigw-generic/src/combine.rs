use crate::binding::VariableBinding;
use crate::convert::as_super_type;
use crate::error::{Result, TypeError};
use crate::factory::type_variable_bounds;
use crate::registry::{is_subclass, ClassId, TypeEnv, TypeVarId};
use crate::types::{GenericType, TypeKind, TypeVariable};

/// Match a formal type against an actual type and infer the formal's variables.
///
/// Returns `Ok(None)` when `actual` is not a valid instantiation of `formal`. Errors are
/// reserved for broken invariants: owner presence or argument counts that disagree after both
/// sides were brought to the same raw class, and bindings for the same variable that cannot be
/// reconciled.
pub fn combine(
    env: &dyn TypeEnv,
    formal: &GenericType,
    actual: &GenericType,
) -> Result<Option<VariableBinding>> {
    Combiner {
        env,
        active: Vec::new(),
    }
    .combine(formal, actual)
}

/// Whether a value of the static type `actual` is an instance of the raw class `target`.
pub(crate) fn raw_accepts(env: &dyn TypeEnv, target: ClassId, actual: &GenericType) -> bool {
    match actual.kind() {
        TypeKind::Class(class) => is_subclass(env, class.id, target),
        TypeKind::Parameterized(ty) => is_subclass(env, ty.raw, target),
        TypeKind::Array(_) => {
            let wk = env.well_known();
            target == wk.object || target == wk.cloneable || target == wk.serializable
        }
        _ => false,
    }
}

struct Combiner<'env> {
    env: &'env dyn TypeEnv,
    /// Variables whose bounds are being checked; a bound that mentions its own variable
    /// (`E extends Enum<E>`) binds it without re-checking the bounds.
    active: Vec<TypeVarId>,
}

impl Combiner<'_> {
    fn combine(
        &mut self,
        formal: &GenericType,
        actual: &GenericType,
    ) -> Result<Option<VariableBinding>> {
        match formal.kind() {
            TypeKind::Class(class) => {
                if formal == actual || self.accepts(class.id, actual)? {
                    Ok(Some(VariableBinding::empty()))
                } else {
                    Ok(None)
                }
            }
            TypeKind::Array(array) => match actual.kind() {
                TypeKind::Array(actual_array) => {
                    self.combine(&array.component, &actual_array.component)
                }
                _ => Ok(None),
            },
            TypeKind::Parameterized(parameterized) => {
                if !actual.is_static() {
                    return Ok(None);
                }
                let Some(aligned) = as_super_type(self.env, actual, parameterized.raw)? else {
                    return Ok(None);
                };
                let Some(aligned_ty) = aligned.as_parameterized() else {
                    return Ok(None);
                };

                let mut binding = VariableBinding::empty();
                match (&parameterized.owner, &aligned_ty.owner) {
                    (Some(owner), Some(actual_owner)) => {
                        let Some(b) = self.combine(owner, actual_owner)? else {
                            return Ok(None);
                        };
                        binding = binding.merge(self.env, b)?;
                    }
                    (None, None) => {}
                    _ => {
                        return Err(TypeError::OwnerMismatch {
                            formal: formal.display(self.env).to_string(),
                            actual: actual.display(self.env).to_string(),
                        })
                    }
                }

                if parameterized.args.len() != aligned_ty.args.len() {
                    return Err(TypeError::ArityMismatch {
                        class: formal.display(self.env).to_string(),
                        expected: parameterized.args.len(),
                        found: aligned_ty.args.len(),
                    });
                }
                for (arg, actual_arg) in parameterized.args.iter().zip(&aligned_ty.args) {
                    let Some(b) = self.combine(arg, actual_arg)? else {
                        return Ok(None);
                    };
                    binding = binding.merge(self.env, b)?;
                }
                Ok(Some(binding))
            }
            TypeKind::Variable(var) => {
                let binding = VariableBinding::single(var.clone(), actual.clone());
                if formal == actual || self.active.contains(&var.id) {
                    return Ok(Some(binding));
                }

                self.active.push(var.id);
                let result = self.combine_bounds(var, actual, binding);
                self.active.pop();
                result
            }
            TypeKind::Wildcard(wildcard) => {
                let mut binding = VariableBinding::empty();
                for bound in &wildcard.upper_bounds {
                    let Some(b) = self.combine(bound, actual)? else {
                        return Ok(None);
                    };
                    binding = binding.merge(self.env, b)?;
                }
                if let Some(lower) = &wildcard.lower_bound {
                    let Some(b) = self.combine(actual, lower)? else {
                        return Ok(None);
                    };
                    binding = binding.merge(self.env, b)?;
                }
                Ok(Some(binding))
            }
            TypeKind::Union(union) => {
                let mut binding = VariableBinding::empty();
                for member in &union.possible {
                    let Some(b) = self.combine(member, actual)? else {
                        return Ok(None);
                    };
                    binding = binding.merge(self.env, b)?;
                }
                Ok(Some(binding))
            }
        }
    }

    /// Every declared bound of `var` must accept `actual` as well.
    fn combine_bounds(
        &mut self,
        var: &TypeVariable,
        actual: &GenericType,
        mut binding: VariableBinding,
    ) -> Result<Option<VariableBinding>> {
        for bound in type_variable_bounds(self.env, var)? {
            let Some(b) = self.combine(&bound, actual)? else {
                return Ok(None);
            };
            binding = binding.merge(self.env, b)?;
        }
        Ok(Some(binding))
    }

    fn bounds_accept(&mut self, target: ClassId, var: &TypeVariable) -> Result<bool> {
        for bound in type_variable_bounds(self.env, var)? {
            if self.accepts(target, &bound)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `actual` is known to be an instance of the non-generic class `target`.
    ///
    /// Dynamic actual types qualify through their upper bounds: a variable or wildcard when any
    /// bound qualifies, a union only when every member does.
    fn accepts(&mut self, target: ClassId, actual: &GenericType) -> Result<bool> {
        match actual.kind() {
            TypeKind::Class(_) | TypeKind::Parameterized(_) | TypeKind::Array(_) => {
                Ok(raw_accepts(self.env, target, actual))
            }
            TypeKind::Variable(var) => {
                if self.active.contains(&var.id) {
                    return Ok(false);
                }
                self.active.push(var.id);
                let result = self.bounds_accept(target, var);
                self.active.pop();
                result
            }
            TypeKind::Wildcard(wildcard) => {
                for bound in &wildcard.upper_bounds {
                    if self.accepts(target, bound)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TypeKind::Union(union) => {
                for member in &union.possible {
                    if !self.accepts(target, member)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
