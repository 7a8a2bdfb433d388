use std::sync::Arc;

use crate::display::TypeDisplay;
use crate::registry::{ClassId, GenericDeclaration, TypeEnv, TypeVarId};

/// An immutable node of the generic type graph.
///
/// Cloning is cheap (a reference count bump). Equality is structural; operations that leave a
/// subtree untouched hand back the very same node, which [`GenericType::ptr_eq`] can observe.
///
/// Values are produced by the factory functions ([`crate::class_type`], [`crate::parameterized`],
/// [`crate::from_descriptor`], ...) and by the algebra operations; there is no public constructor
/// that bypasses the factory's checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericType(Arc<TypeKind>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class(ClassType),
    Array(ArrayType),
    Parameterized(ParameterizedType),
    Variable(TypeVariable),
    Wildcard(WildcardType),
    Union(UnionType),
}

/// Which derived views a static type exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerKind {
    #[default]
    Plain,
    /// The raw class implements `java.util.Collection`.
    Collection,
    /// The raw class implements `java.util.Map`.
    Map,
}

/// A non-generic class used as a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub id: ClassId,
    pub container: ContainerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub component: GenericType,
}

/// `Raw<args...>`, optionally nested in a parameterized owner (`Outer<T>.Inner<U>`).
///
/// `params` are the raw class's declared variables, in declaration order; `args` has the same
/// length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    pub raw: ClassId,
    pub owner: Option<GenericType>,
    pub args: Vec<GenericType>,
    pub params: Arc<[TypeVarId]>,
    pub container: ContainerKind,
}

/// A reference to a declared type variable. Identity is `(declaration, name)`; bounds live in
/// the environment and are looked up through [`crate::type_variable_bounds`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVariable {
    pub declaration: GenericDeclaration,
    pub name: Arc<str>,
    pub id: TypeVarId,
}

/// `? extends A & B` or `? super L`. All upper bounds must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub upper_bounds: Vec<GenericType>,
    pub lower_bound: Option<GenericType>,
}

/// A value declared as `declared` whose actual shape is one of `possible`.
///
/// `possible` only holds static types, with no two members sharing a raw type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionType {
    pub declared: GenericType,
    pub possible: Vec<GenericType>,
}

/// The erased class a static type stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    Class(ClassId),
    Array(Box<RawType>),
}

impl GenericType {
    pub(crate) fn new(kind: TypeKind) -> Self {
        Self(Arc::new(kind))
    }

    /// Rebuild a parameterized node with new parts, keeping raw class and declared variables.
    pub(crate) fn with_parameterized_parts(
        ty: &ParameterizedType,
        owner: Option<GenericType>,
        args: Vec<GenericType>,
    ) -> Self {
        Self::new(TypeKind::Parameterized(ParameterizedType {
            raw: ty.raw,
            owner,
            args,
            params: ty.params.clone(),
            container: ty.container,
        }))
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(a: &GenericType, b: &GenericType) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Class, array and parameterized types have a fixed raw type.
    pub fn is_static(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Class(_) | TypeKind::Array(_) | TypeKind::Parameterized(_)
        )
    }

    /// Variables, wildcards and unions are only pinned down through bounds or a registry.
    pub fn is_dynamic(&self) -> bool {
        !self.is_static()
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self.kind() {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self.kind() {
            TypeKind::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match self.kind() {
            TypeKind::Parameterized(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&TypeVariable> {
        match self.kind() {
            TypeKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_wildcard(&self) -> Option<&WildcardType> {
        match self.kind() {
            TypeKind::Wildcard(wildcard) => Some(wildcard),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self.kind() {
            TypeKind::Union(union) => Some(union),
            _ => None,
        }
    }

    /// The raw class of a class or parameterized type.
    pub fn raw_class(&self) -> Option<ClassId> {
        match self.kind() {
            TypeKind::Class(class) => Some(class.id),
            TypeKind::Parameterized(ty) => Some(ty.raw),
            _ => None,
        }
    }

    /// The erased type of a static type. Arrays of dynamic components erase to `Object[]`.
    pub fn raw_type(&self, env: &dyn TypeEnv) -> Option<RawType> {
        match self.kind() {
            TypeKind::Class(class) => Some(RawType::Class(class.id)),
            TypeKind::Parameterized(ty) => Some(RawType::Class(ty.raw)),
            TypeKind::Array(array) => {
                let component = array
                    .component
                    .raw_type(env)
                    .unwrap_or(RawType::Class(env.well_known().object));
                Some(RawType::Array(Box::new(component)))
            }
            _ => None,
        }
    }

    pub fn container(&self) -> ContainerKind {
        match self.kind() {
            TypeKind::Class(class) => class.container,
            TypeKind::Parameterized(ty) => ty.container,
            _ => ContainerKind::Plain,
        }
    }

    /// Arrays and collection types: anything with an element type.
    pub fn is_collection_like(&self) -> bool {
        matches!(self.kind(), TypeKind::Array(_)) || self.container() == ContainerKind::Collection
    }

    pub fn is_map(&self) -> bool {
        self.container() == ContainerKind::Map
    }

    /// Whether a type variable occurs anywhere in this type.
    pub fn contains_variables(&self) -> bool {
        match self.kind() {
            TypeKind::Class(_) => false,
            TypeKind::Array(array) => array.component.contains_variables(),
            TypeKind::Parameterized(ty) => {
                ty.owner.as_ref().is_some_and(GenericType::contains_variables)
                    || ty.args.iter().any(GenericType::contains_variables)
            }
            TypeKind::Variable(_) => true,
            TypeKind::Wildcard(wildcard) => {
                wildcard.upper_bounds.iter().any(GenericType::contains_variables)
                    || wildcard
                        .lower_bound
                        .as_ref()
                        .is_some_and(GenericType::contains_variables)
            }
            TypeKind::Union(union) => union.possible.iter().any(GenericType::contains_variables),
        }
    }

    /// Render the type with class names taken from `env`.
    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> TypeDisplay<'a> {
        TypeDisplay::new(env, self)
    }
}

impl ParameterizedType {
    /// The argument bound to `var` here or in an enclosing owner.
    pub fn find_type_argument(&self, var: &TypeVariable) -> Option<&GenericType> {
        if let Some(idx) = self.params.iter().position(|param| *param == var.id) {
            return self.args.get(idx);
        }
        self.owner
            .as_ref()
            .and_then(GenericType::as_parameterized)
            .and_then(|owner| owner.find_type_argument(var))
    }
}
