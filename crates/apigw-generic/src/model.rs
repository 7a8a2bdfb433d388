//! Class declarations as data.
//!
//! A model file is a JSON array of [`ClassModel`]s, each describing a class the way a class-file
//! stub does: a binary name, optional JVM generic signatures, and fields and methods with their
//! signatures.
//!
//! ```json
//! [
//!   {
//!     "name": "com.example.Box",
//!     "signature": "<T:Ljava/lang/Object;>Ljava/lang/Object;",
//!     "fields": [{ "name": "value", "signature": "TT;" }]
//!   },
//!   {
//!     "name": "com.example.IntBox",
//!     "signature": "Lcom/example/Box<Ljava/lang/Integer;>;"
//!   }
//! ]
//! ```

use std::collections::HashSet;

use apigw_signature::{
    parse_class_signature, parse_method_signature, parse_type_signature, TypeDescriptor,
};
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};
use crate::factory::{class_type, from_descriptor, TypeScope};
use crate::registry::{
    ClassDef, ClassId, ClassKind, ClassRegistry, FieldDef, GenericDeclaration, MethodDef, TypeEnv,
    TypeVarId,
};

fn default_true() -> bool {
    true
}

/// Methods are addressed by `u32` index within their class.
pub(crate) fn method_index(class: &str, index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| TypeError::Model {
        class: class.to_string(),
        reason: format!("method index {index} does not fit in 32 bits"),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassModel {
    /// Binary name, e.g. `com.example.Outer$Inner`.
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    /// Binary name of the enclosing class of a nested class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    /// `false` for inner classes, which see the type variables of their enclosing class.
    #[serde(rename = "static", default = "default_true")]
    pub is_static: bool,
    /// JVM class signature. When present it supersedes `super_class` and `interfaces`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Raw superclass name; defaults to `java.lang.Object` for classes and enums.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodModel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldModel {
    pub name: String,
    /// JVM type signature, e.g. `Ljava/util/List<TT;>;` or `I`.
    pub signature: String,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "public", default = "default_true")]
    pub is_public: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MethodModel {
    pub name: String,
    /// JVM method signature, e.g. `<T:Ljava/lang/Object;>(TT;)Ljava/util/List<TT;>;`.
    pub signature: String,
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

/// JSON schema of a model file.
#[must_use]
pub fn class_models_schema() -> RootSchema {
    schemars::schema_for!(Vec<ClassModel>)
}

impl ClassRegistry {
    /// Define every class of `models`.
    ///
    /// All names are interned before anything is defined, so models may refer to each other in
    /// any order. Once the batch is defined, every stored descriptor is converted once; a
    /// reference to a class that is still undefined or to an undeclared type variable fails the
    /// load. Definitions made before a failure stay in the registry.
    pub fn load_models(&mut self, models: &[ClassModel]) -> Result<Vec<ClassId>> {
        let mut seen = HashSet::new();
        for model in models {
            if !seen.insert(model.name.as_str()) {
                return Err(TypeError::Model {
                    class: model.name.clone(),
                    reason: "defined more than once".to_string(),
                });
            }
        }

        let ids: Vec<ClassId> = models
            .iter()
            .map(|model| self.intern_class_id(&model.name))
            .collect();
        for (model, id) in models.iter().zip(&ids) {
            let def = self.class_def_from_model(*id, model)?;
            self.define_class(*id, def);
        }
        for id in &ids {
            self.validate_class(*id)?;
        }

        tracing::debug!(
            target = "apigw.generic",
            classes = ids.len(),
            "loaded class models"
        );
        Ok(ids)
    }

    /// [`ClassRegistry::load_models`] over a JSON array of models.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<ClassId>> {
        let models: Vec<ClassModel> = serde_json::from_str(json)?;
        self.load_models(&models)
    }

    fn class_def_from_model(&mut self, id: ClassId, model: &ClassModel) -> Result<ClassDef> {
        let mut def = ClassDef::new(model.name.clone(), model.kind);
        def.is_static = model.is_static;
        def.enclosing = model
            .enclosing
            .as_deref()
            .map(|name| self.intern_class_id(name));

        let has_superclass = matches!(model.kind, ClassKind::Class | ClassKind::Enum)
            && model.name != apigw_signature::OBJECT_CLASS_NAME;
        match &model.signature {
            Some(signature) => {
                let signature = parse_class_signature(signature)?;
                def.type_params = signature
                    .type_parameters
                    .into_iter()
                    .map(|param| {
                        self.add_type_param(param.name, GenericDeclaration::Class(id), param.bounds)
                    })
                    .collect();
                if has_superclass {
                    def.super_class = Some(TypeDescriptor::Class(signature.super_class));
                }
                def.interfaces = signature
                    .interfaces
                    .into_iter()
                    .map(TypeDescriptor::Class)
                    .collect();
            }
            None => {
                if has_superclass {
                    def.super_class = Some(match &model.super_class {
                        Some(name) => TypeDescriptor::class(name.clone()),
                        None => TypeDescriptor::object(),
                    });
                }
                def.interfaces = model
                    .interfaces
                    .iter()
                    .map(|name| TypeDescriptor::class(name.clone()))
                    .collect();
            }
        }

        for field in &model.fields {
            def.fields.push(FieldDef {
                name: field.name.clone(),
                ty: parse_type_signature(&field.signature)?,
                is_static: field.is_static,
                is_public: field.is_public,
            });
        }
        for (index, method) in model.methods.iter().enumerate() {
            let signature = parse_method_signature(&method.signature)?;
            let declaration = GenericDeclaration::Method {
                class: id,
                index: method_index(&model.name, index)?,
            };
            let type_params = signature
                .type_parameters
                .into_iter()
                .map(|param| self.add_type_param(param.name, declaration, param.bounds))
                .collect();
            def.methods.push(MethodDef {
                name: method.name.clone(),
                type_params,
                params: signature.parameters,
                return_type: signature.return_type,
                is_static: method.is_static,
            });
        }
        Ok(def)
    }

    fn validate_class(&self, id: ClassId) -> Result<()> {
        let env: &dyn TypeEnv = self;
        let Some(def) = env.class(id) else {
            return Ok(());
        };
        if let Some(enclosing) = def.enclosing {
            if env.class(enclosing).is_none() {
                return Err(TypeError::Model {
                    class: def.name.clone(),
                    reason: "enclosing class is not defined".to_string(),
                });
            }
        }

        class_type(env, id, true)?;
        let scope = TypeScope::Class(id);
        for param in &def.type_params {
            self.validate_bounds(*param, scope)?;
        }
        for supertype in def.supertypes() {
            from_descriptor(env, supertype, scope)?;
        }
        for field in &def.fields {
            from_descriptor(env, &field.ty, scope)?;
        }
        for (index, method) in def.methods.iter().enumerate() {
            let scope = TypeScope::Method {
                class: id,
                index: method_index(&def.name, index)?,
            };
            for param in &method.type_params {
                self.validate_bounds(*param, scope)?;
            }
            for ty in method.params.iter().chain(method.return_type.iter()) {
                from_descriptor(env, ty, scope)?;
            }
        }
        Ok(())
    }

    fn validate_bounds(&self, param: TypeVarId, scope: TypeScope) -> Result<()> {
        let env: &dyn TypeEnv = self;
        if let Some(def) = env.type_param(param) {
            for bound in &def.bounds {
                from_descriptor(env, bound, scope)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_indices_beyond_u32_are_model_errors() {
        assert_eq!(method_index("com.example.Big", 7).unwrap(), 7);

        let Ok(huge) = usize::try_from(u64::from(u32::MAX) + 1) else {
            return;
        };
        let err = method_index("com.example.Big", huge).unwrap_err();
        assert!(matches!(err, TypeError::Model { .. }), "{err}");
    }
}
