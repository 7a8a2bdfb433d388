//! Fields and methods of a class, typed in the context of a concrete instantiation.

use std::collections::{HashMap, HashSet};

use crate::binding::VariableBinding;
use crate::combine::combine;
use crate::convert::superclass;
use crate::error::{Result, TypeError};
use crate::factory::{from_descriptor, type_variable_bounds, variable, wildcard, TypeScope};
use crate::registry::{class_name, ClassId, GenericDeclaration, TypeEnv, TypeVarId};
use crate::resolve::{resolve, resolve_in_context};
use crate::types::{GenericType, TypeKind, TypeVariable};

/// A field with its declared type and its type as seen from a particular owner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericField {
    pub name: String,
    pub declaring_class: ClassId,
    pub declared_type: GenericType,
    pub resolved_type: GenericType,
    pub is_static: bool,
    pub is_public: bool,
}

impl GenericField {
    pub fn replace_resolved_type(&self, resolved_type: GenericType) -> Self {
        Self {
            resolved_type,
            ..self.clone()
        }
    }
}

/// A method whose class-level variables are resolved against an owner type. Method-level
/// variables are kept as variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMethod {
    pub name: String,
    pub declaring_class: ClassId,
    pub index: u32,
    pub type_params: Vec<TypeVariable>,
    pub params: Vec<GenericType>,
    /// `None` for `void`.
    pub return_type: Option<GenericType>,
    pub is_static: bool,
}

fn resolve_member_type(
    env: &dyn TypeEnv,
    declared: &GenericType,
    owner: &GenericType,
) -> Result<GenericType> {
    if owner.as_parameterized().is_some() {
        resolve_in_context(env, declared, owner)
    } else {
        Ok(declared.clone())
    }
}

/// Fields declared directly by `owner`'s raw class, in declaration order.
///
/// Arrays and dynamic types have no declared fields.
pub fn declared_fields(env: &dyn TypeEnv, owner: &GenericType) -> Result<Vec<GenericField>> {
    let Some(raw) = owner.raw_class() else {
        return Ok(Vec::new());
    };
    let def = env.class(raw).ok_or_else(|| TypeError::UnknownClass {
        name: class_name(env, raw),
    })?;
    def.fields
        .iter()
        .map(|field| {
            let declared_type = from_descriptor(env, &field.ty, TypeScope::Class(raw))?;
            let resolved_type = resolve_member_type(env, &declared_type, owner)?;
            Ok(GenericField {
                name: field.name.clone(),
                declaring_class: raw,
                declared_type,
                resolved_type,
                is_static: field.is_static,
                is_public: field.is_public,
            })
        })
        .collect()
}

/// The field `name` declared directly by `owner`'s raw class.
pub fn field(env: &dyn TypeEnv, owner: &GenericType, name: &str) -> Result<Option<GenericField>> {
    Ok(declared_fields(env, owner)?
        .into_iter()
        .find(|field| field.name == name))
}

/// Fields of `ty` and of every superclass, nearest first.
///
/// Each superclass is resolved against the level below it, so inherited fields are typed in
/// terms of `ty`'s arguments. A field hidden by a same-named field further down is skipped.
pub fn collect_fields(env: &dyn TypeEnv, ty: &GenericType) -> Result<Vec<GenericField>> {
    let mut fields = Vec::new();
    let mut names = HashSet::new();
    let mut current = Some(ty.clone());
    while let Some(level) = current {
        for field in declared_fields(env, &level)? {
            if names.insert(field.name.clone()) {
                fields.push(field);
            }
        }
        current = superclass(env, &level)?;
    }
    Ok(fields)
}

/// Methods declared directly by `owner`'s raw class, in declaration order.
pub fn declared_methods(env: &dyn TypeEnv, owner: &GenericType) -> Result<Vec<GenericMethod>> {
    let Some(raw) = owner.raw_class() else {
        return Ok(Vec::new());
    };
    let def = env.class(raw).ok_or_else(|| TypeError::UnknownClass {
        name: class_name(env, raw),
    })?;

    let mut resolver = |var: &TypeVariable| -> Result<GenericType> {
        if let GenericDeclaration::Method { .. } = var.declaration {
            return Ok(GenericType::new(TypeKind::Variable(var.clone())));
        }
        owner
            .as_parameterized()
            .and_then(|context| context.find_type_argument(var))
            .cloned()
            .ok_or_else(|| TypeError::UnresolvedVariable {
                variable: var.name.to_string(),
                context: owner.display(env).to_string(),
            })
    };

    let mut methods = Vec::with_capacity(def.methods.len());
    for (index, method) in def.methods.iter().enumerate() {
        let index = crate::model::method_index(&def.name, index)?;
        let scope = TypeScope::Method { class: raw, index };
        let params = method
            .params
            .iter()
            .map(|param| resolve(&from_descriptor(env, param, scope)?, &mut resolver))
            .collect::<Result<Vec<_>>>()?;
        let return_type = method
            .return_type
            .as_ref()
            .map(|ret| resolve(&from_descriptor(env, ret, scope)?, &mut resolver))
            .transpose()?;
        let type_params = method
            .type_params
            .iter()
            .map(|param| variable(env, *param))
            .collect::<Result<Vec<_>>>()?;
        methods.push(GenericMethod {
            name: method.name.clone(),
            declaring_class: raw,
            index,
            type_params,
            params,
            return_type,
            is_static: method.is_static,
        });
    }
    Ok(methods)
}

/// Infer the method's variables from actual argument types.
///
/// Returns `Ok(None)` when the argument count differs, an argument is incompatible with its
/// parameter, or two arguments bind a variable to types without a common subtype.
pub fn infer_method_binding(
    env: &dyn TypeEnv,
    method: &GenericMethod,
    args: &[GenericType],
) -> Result<Option<VariableBinding>> {
    if method.params.len() != args.len() {
        return Ok(None);
    }
    let mut binding = VariableBinding::empty();
    for (param, arg) in method.params.iter().zip(args) {
        let merged = match combine(env, param, arg) {
            Ok(Some(inferred)) => binding.merge(env, inferred),
            Ok(None) => return Ok(None),
            Err(err) => Err(err),
        };
        binding = match merged {
            Ok(binding) => binding,
            Err(TypeError::ConflictingBinding { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
    }
    Ok(Some(binding))
}

/// Substitute `binding` into the method's return type.
///
/// Variables the binding leaves open become wildcards of their declared bounds. `void` methods
/// yield `None`.
pub fn instantiate_return_type(
    env: &dyn TypeEnv,
    method: &GenericMethod,
    binding: &VariableBinding,
) -> Result<Option<GenericType>> {
    let Some(return_type) = &method.return_type else {
        return Ok(None);
    };
    let mut fresh: HashMap<TypeVarId, GenericType> = HashMap::new();
    let mut resolver = |var: &TypeVariable| -> Result<GenericType> {
        if let Some(bound) = binding.get(var) {
            return Ok(bound.clone());
        }
        if let Some(existing) = fresh.get(&var.id) {
            return Ok(existing.clone());
        }
        let open = wildcard(env, type_variable_bounds(env, var)?, None);
        fresh.insert(var.id, open.clone());
        Ok(open)
    };
    Ok(Some(resolve(return_type, &mut resolver)?))
}
