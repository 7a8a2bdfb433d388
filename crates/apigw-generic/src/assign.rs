use crate::combine::combine;
use crate::convert::as_super_type;
use crate::error::{Result, TypeError};
use crate::factory::type_variable_bounds;
use crate::registry::{TypeEnv, TypeVarId};
use crate::types::{GenericType, TypeKind};

/// Whether every instance of `candidate` is also an instance of `target`.
///
/// Static targets view the candidate as the target's raw class and require the view to be an
/// instantiation of the target. Dynamic candidates are checked through all of their upper
/// bounds. A variable target only accepts itself; a wildcard target needs all upper bounds to
/// accept the candidate and the candidate to accept the lower bound; a union target needs every
/// member to accept it.
pub fn is_assignable_from(
    env: &dyn TypeEnv,
    target: &GenericType,
    candidate: &GenericType,
) -> Result<bool> {
    Assignability {
        env,
        seen_type_vars: Vec::new(),
    }
    .check(target, candidate)
}

struct Assignability<'env> {
    env: &'env dyn TypeEnv,
    seen_type_vars: Vec<TypeVarId>,
}

impl Assignability<'_> {
    fn check(&mut self, target: &GenericType, candidate: &GenericType) -> Result<bool> {
        if target == candidate {
            return Ok(true);
        }
        match target.kind() {
            TypeKind::Class(_) | TypeKind::Array(_) | TypeKind::Parameterized(_) => {
                self.check_static(target, candidate)
            }
            TypeKind::Variable(_) => Ok(false),
            TypeKind::Wildcard(wildcard) => {
                for bound in &wildcard.upper_bounds {
                    if !self.check(bound, candidate)? {
                        return Ok(false);
                    }
                }
                match &wildcard.lower_bound {
                    Some(lower) => self.check(candidate, lower),
                    None => Ok(true),
                }
            }
            TypeKind::Union(union) => {
                for member in &union.possible {
                    if !self.check(member, candidate)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn check_static(&mut self, target: &GenericType, candidate: &GenericType) -> Result<bool> {
        match candidate.kind() {
            TypeKind::Class(_) | TypeKind::Parameterized(_) | TypeKind::Array(_) => {
                if let (Some(target_array), Some(candidate_array)) =
                    (target.as_array(), candidate.as_array())
                {
                    return self.check(&target_array.component, &candidate_array.component);
                }
                let Some(raw) = target.raw_class() else {
                    return Ok(false);
                };
                let Some(view) = as_super_type(self.env, candidate, raw)? else {
                    return Ok(false);
                };
                match combine(self.env, target, &view) {
                    Ok(binding) => Ok(binding.is_some()),
                    Err(TypeError::ConflictingBinding { .. }) => Ok(false),
                    Err(err) => Err(err),
                }
            }
            TypeKind::Variable(var) => {
                if self.seen_type_vars.contains(&var.id) {
                    return Ok(false);
                }
                self.seen_type_vars.push(var.id);
                let mut accepted = true;
                for bound in type_variable_bounds(self.env, var)? {
                    if !self.check(target, &bound)? {
                        accepted = false;
                        break;
                    }
                }
                self.seen_type_vars.pop();
                Ok(accepted)
            }
            TypeKind::Wildcard(wildcard) => {
                for bound in &wildcard.upper_bounds {
                    if !self.check(target, bound)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            TypeKind::Union(union) => {
                for member in &union.possible {
                    if !self.check(target, member)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
