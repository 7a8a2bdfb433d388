use std::collections::HashMap;

use parking_lot::RwLock;

use crate::registry::ClassId;
use crate::types::GenericType;

/// Memoised results of [`crate::class_type`], keyed by class and `keep_vars`.
///
/// Owned by the registry and cleared whenever a class is (re)defined. Lookups take a read lock;
/// results are the same whether or not a cache is installed.
#[derive(Debug, Default)]
pub struct TypeCache {
    class_types: RwLock<HashMap<(ClassId, bool), GenericType>>,
}

impl TypeCache {
    pub fn class_type(&self, id: ClassId, keep_vars: bool) -> Option<GenericType> {
        self.class_types.read().get(&(id, keep_vars)).cloned()
    }

    pub fn insert_class_type(&self, id: ClassId, keep_vars: bool, ty: GenericType) {
        let mut class_types = self.class_types.write();
        if class_types.insert((id, keep_vars), ty).is_none() {
            tracing::trace!(
                target = "apigw.generic",
                class = %id,
                keep_vars,
                entries = class_types.len(),
                "cached class type"
            );
        }
    }

    pub fn clear(&self) {
        self.class_types.write().clear();
    }

    pub fn len(&self) -> usize {
        self.class_types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
