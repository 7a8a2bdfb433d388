use std::collections::{HashMap, HashSet};
use std::fmt;

use apigw_signature::{TypeDescriptor, OBJECT_CLASS_NAME};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::TypeCache;
use crate::jdk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// The entity that declares a type variable. Together with the variable's name it forms the
/// variable's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericDeclaration {
    Class(ClassId),
    /// `index` addresses [`ClassDef::methods`].
    Method { class: ClassId, index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
    Primitive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeDescriptor,
    pub is_static: bool,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<TypeDescriptor>,
    /// `None` for `void`.
    pub return_type: Option<TypeDescriptor>,
    pub is_static: bool,
}

/// A class as the runtime declares it.
///
/// Supertypes and member types are kept as descriptors and only turned into
/// [`crate::GenericType`]s when an operation asks for them, so declarations may freely refer to
/// classes and variables that are defined later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub enclosing: Option<ClassId>,
    /// Static nested classes do not see the type variables of their enclosing class.
    pub is_static: bool,
    pub super_class: Option<TypeDescriptor>,
    pub interfaces: Vec<TypeDescriptor>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            enclosing: None,
            is_static: true,
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Declared supertypes: the superclass (if any) followed by the interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.super_class.iter().chain(self.interfaces.iter())
    }
}

/// A formal type parameter. Bounds may mention the parameter itself (`E extends Enum<E>`); they
/// are interpreted in the scope of [`TypeParamDef::declaration`] on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    pub declaration: GenericDeclaration,
    pub bounds: Vec<TypeDescriptor>,
}

/// Classes the algebra itself needs to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub collection: ClassId,
    pub map: ClassId,
    pub number: ClassId,
    pub date: ClassId,
    pub enum_: ClassId,
}

/// Read access to class and type-parameter definitions.
///
/// Every algebra operation takes a `&dyn TypeEnv`; the types themselves only carry ids.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    /// Classes registered as simple on top of the built-in list.
    fn is_configured_simple_class(&self, _id: ClassId) -> bool {
        false
    }

    fn type_cache(&self) -> Option<&TypeCache> {
        None
    }
}

/// Binary name of `id`, or a placeholder for ids the environment does not know.
pub(crate) fn class_name(env: &dyn TypeEnv, id: ClassId) -> String {
    match env.class(id) {
        Some(def) => def.name.clone(),
        None => format!("<class {id}>"),
    }
}

/// Nominal subtyping between raw classes (`Class.isAssignableFrom`).
///
/// Every non-primitive class is a subclass of `Object`, interfaces included.
pub fn is_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup {
        return true;
    }
    let Some(def) = env.class(sub) else {
        return false;
    };
    if sup == env.well_known().object {
        return def.kind != ClassKind::Primitive;
    }

    let mut seen = HashSet::from([sub]);
    let mut queue = vec![sub];
    while let Some(current) = queue.pop() {
        let Some(def) = env.class(current) else {
            continue;
        };
        for supertype in def.supertypes() {
            let Some(id) = supertype.class_name().and_then(|name| env.lookup_class(name)) else {
                continue;
            };
            if id == sup {
                return true;
            }
            if seen.insert(id) {
                queue.push(id);
            }
        }
    }
    false
}

/// Whether a parameterized use of `id` must spell out its enclosing type: true for inner
/// (non-static) classes whose enclosing chain declares type parameters.
pub(crate) fn needs_owner(env: &dyn TypeEnv, id: ClassId) -> bool {
    let mut current = id;
    loop {
        let Some(def) = env.class(current) else {
            return false;
        };
        if def.is_static {
            return false;
        }
        let Some(enclosing) = def.enclosing else {
            return false;
        };
        match env.class(enclosing) {
            Some(outer) if !outer.type_params.is_empty() => return true,
            Some(_) => current = enclosing,
            None => return false,
        }
    }
}

/// The in-memory class table.
///
/// Definition is two-phase: [`ClassRegistry::intern_class_id`] hands out an id for a name before
/// the class is defined, so classes can refer to each other (and to themselves) in any order.
#[derive(Debug)]
pub struct ClassRegistry {
    classes: Vec<Option<ClassDef>>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
    simple_classes: HashSet<ClassId>,
    cache: Option<TypeCache>,
}

/// Id of the next entry of a registry table.
fn table_index(len: usize) -> u32 {
    u32::try_from(len).expect("too many registry entries allocated")
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl ClassRegistry {
    /// An empty registry. The well-known platform names are interned but undefined; callers are
    /// expected to define them (see [`ClassRegistry::load_models`]).
    pub fn new() -> Self {
        let mut classes = Vec::new();
        let mut class_by_name = HashMap::new();
        let mut intern = |name: &str| {
            let id = ClassId(table_index(classes.len()));
            classes.push(None);
            class_by_name.insert(name.to_string(), id);
            id
        };
        let well_known = WellKnownTypes {
            object: intern(OBJECT_CLASS_NAME),
            cloneable: intern("java.lang.Cloneable"),
            serializable: intern("java.io.Serializable"),
            collection: intern("java.util.Collection"),
            map: intern("java.util.Map"),
            number: intern("java.lang.Number"),
            date: intern("java.util.Date"),
            enum_: intern("java.lang.Enum"),
        };

        Self {
            classes,
            class_by_name,
            type_params: Vec::new(),
            well_known,
            simple_classes: HashSet::new(),
            cache: None,
        }
    }

    /// A registry seeded with the platform classes the algebra relies on.
    pub fn with_minimal_jdk() -> Self {
        let mut registry = Self::new();
        jdk::define_minimal_jdk(&mut registry);
        registry
    }

    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let id = ClassId(table_index(self.classes.len()));
        self.classes.push(None);
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    /// (Re)define the class behind `id`.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let idx = id.0 as usize;
        if idx >= self.classes.len() {
            self.classes.resize(idx + 1, None);
        }
        self.class_by_name.insert(def.name.clone(), id);
        self.classes[idx] = Some(def);
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_type_param(
        &mut self,
        name: impl Into<String>,
        declaration: GenericDeclaration,
        bounds: Vec<TypeDescriptor>,
    ) -> TypeVarId {
        let id = TypeVarId(table_index(self.type_params.len()));
        self.type_params.push(TypeParamDef {
            name: name.into(),
            declaration,
            bounds,
        });
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn is_defined(&self, id: ClassId) -> bool {
        matches!(self.classes.get(id.0 as usize), Some(Some(_)))
    }

    /// Names interned but never defined.
    pub fn undefined_classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .class_by_name
            .iter()
            .filter(|(_, id)| !self.is_defined(**id))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Treat `id` as a simple (leaf) type in addition to the built-in list.
    pub fn mark_simple_class(&mut self, id: ClassId) {
        self.simple_classes.insert(id);
    }

    /// Turn memoisation of [`crate::class_type`] on or off.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        match (enabled, self.cache.is_some()) {
            (true, false) => self.cache = Some(TypeCache::default()),
            (false, true) => self.cache = None,
            _ => {}
        }
    }
}

impl TypeEnv for ClassRegistry {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name).filter(|id| self.is_defined(*id))
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    fn is_configured_simple_class(&self, id: ClassId) -> bool {
        self.simple_classes.contains(&id)
    }

    fn type_cache(&self) -> Option<&TypeCache> {
        self.cache.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ids_follow_table_length() {
        assert_eq!(table_index(0), 0);
        assert_eq!(table_index(41), 41);
    }

    #[test]
    fn interned_but_undefined_classes_are_not_visible() {
        let mut registry = ClassRegistry::with_minimal_jdk();
        let id = registry.intern_class_id("com.example.Later");
        assert_eq!(registry.lookup_class("com.example.Later"), None);
        assert!(registry.undefined_classes().contains(&"com.example.Later"));

        registry.define_class(id, ClassDef::new("com.example.Later", ClassKind::Class));
        assert_eq!(registry.lookup_class("com.example.Later"), Some(id));
    }

    #[test]
    fn subclassing_follows_interfaces_and_stops_at_primitives() {
        let registry = ClassRegistry::with_minimal_jdk();
        let id = |name: &str| registry.lookup_class(name).unwrap();
        let wk = registry.well_known();

        assert!(is_subclass(&registry, id("java.util.ArrayList"), wk.collection));
        assert!(is_subclass(&registry, id("java.util.List"), wk.object));
        assert!(is_subclass(&registry, id("java.lang.Integer"), wk.number));
        assert!(!is_subclass(&registry, id("int"), wk.object));
        assert!(!is_subclass(&registry, wk.collection, id("java.util.List")));
    }
}
