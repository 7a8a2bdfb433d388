use std::collections::BTreeMap;

use crate::error::{Result, TypeError};
use crate::intersect::intersect;
use crate::registry::TypeEnv;
use crate::types::{GenericType, TypeVariable};

/// An immutable assignment of types to type variables, as produced by [`crate::combine`].
///
/// Iteration order is deterministic (by declaration, then name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBinding {
    map: BTreeMap<TypeVariable, GenericType>,
}

impl VariableBinding {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(var: TypeVariable, ty: GenericType) -> Self {
        Self {
            map: BTreeMap::from([(var, ty)]),
        }
    }

    pub fn get(&self, var: &TypeVariable) -> Option<&GenericType> {
        self.map.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVariable, &GenericType)> {
        self.map.iter()
    }

    /// Bind `var` to `ty` on top of this binding. See [`VariableBinding::merge`].
    pub fn add(self, env: &dyn TypeEnv, var: TypeVariable, ty: GenericType) -> Result<Self> {
        self.merge(env, Self::single(var, ty))
    }

    /// Union of two bindings.
    ///
    /// A variable bound on both sides is bound to the intersection of both types; when the two
    /// types have no intersection the merge fails with [`TypeError::ConflictingBinding`].
    pub fn merge(self, env: &dyn TypeEnv, other: VariableBinding) -> Result<Self> {
        if self.is_empty() {
            return Ok(other);
        }
        if other.is_empty() {
            return Ok(self);
        }
        let (mut base, incoming) = if other.len() > self.len() {
            (other, self)
        } else {
            (self, other)
        };

        for (var, ty) in incoming.map {
            let Some(existing) = base.map.get(&var) else {
                base.map.insert(var, ty);
                continue;
            };
            match intersect(env, existing, &ty)? {
                Some(narrowed) if narrowed == *existing => {}
                Some(narrowed) => {
                    base.map.insert(var, narrowed);
                }
                None => {
                    return Err(TypeError::ConflictingBinding {
                        variable: var.name.to_string(),
                        first: existing.display(env).to_string(),
                        second: ty.display(env).to_string(),
                    })
                }
            }
        }
        Ok(base)
    }
}

impl IntoIterator for VariableBinding {
    type Item = (TypeVariable, GenericType);
    type IntoIter = std::collections::btree_map::IntoIter<TypeVariable, GenericType>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::class_type;
    use crate::registry::ClassRegistry;

    fn list_variable(env: &ClassRegistry) -> TypeVariable {
        let list = class_type(env, env.lookup_class("java.util.List").unwrap(), true).unwrap();
        list.as_parameterized().unwrap().args[0]
            .as_variable()
            .unwrap()
            .clone()
    }

    fn class(env: &ClassRegistry, name: &str) -> GenericType {
        class_type(env, env.lookup_class(name).unwrap(), false).unwrap()
    }

    #[test]
    fn merging_narrows_a_shared_variable() {
        let env = ClassRegistry::with_minimal_jdk();
        let var = list_variable(&env);
        let number = class(&env, "java.lang.Number");
        let integer = class(&env, "java.lang.Integer");

        let binding = VariableBinding::single(var.clone(), number)
            .add(&env, var.clone(), integer.clone())
            .unwrap();
        assert_eq!(binding.len(), 1);
        assert_eq!(binding.get(&var), Some(&integer));
    }

    #[test]
    fn merging_unrelated_types_conflicts() {
        let env = ClassRegistry::with_minimal_jdk();
        let var = list_variable(&env);
        let err = VariableBinding::single(var.clone(), class(&env, "java.lang.String"))
            .add(&env, var, class(&env, "java.lang.Integer"))
            .unwrap_err();
        assert!(matches!(err, TypeError::ConflictingBinding { .. }), "{err}");
    }

    #[test]
    fn merging_with_an_empty_binding_is_identity() {
        let env = ClassRegistry::with_minimal_jdk();
        let var = list_variable(&env);
        let binding = VariableBinding::single(var, class(&env, "java.lang.String"));
        let merged = binding.clone().merge(&env, VariableBinding::empty()).unwrap();
        assert_eq!(merged, binding);
        assert!(VariableBinding::empty().is_empty());
    }
}
