use std::fmt;

use crate::registry::{ClassId, TypeEnv};
use crate::types::{GenericType, TypeKind};

/// Source-like rendering of a [`GenericType`], e.g. `java.util.Map<K, java.util.List<? extends T>>`.
pub struct TypeDisplay<'a> {
    env: &'a dyn TypeEnv,
    ty: &'a GenericType,
}

impl<'a> TypeDisplay<'a> {
    pub(crate) fn new(env: &'a dyn TypeEnv, ty: &'a GenericType) -> Self {
        Self { env, ty }
    }

    fn with(&self, ty: &'a GenericType) -> TypeDisplay<'a> {
        TypeDisplay { env: self.env, ty }
    }

    fn class_name(&self, id: ClassId) -> String {
        crate::registry::class_name(self.env, id)
    }

    fn write_list(
        &self,
        f: &mut fmt::Formatter<'_>,
        types: &'a [GenericType],
        separator: &str,
    ) -> fmt::Result {
        for (idx, ty) in types.iter().enumerate() {
            if idx > 0 {
                f.write_str(separator)?;
            }
            write!(f, "{}", self.with(ty))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty.kind() {
            TypeKind::Class(class) => f.write_str(&self.class_name(class.id)),
            TypeKind::Array(array) => write!(f, "{}[]", self.with(&array.component)),
            TypeKind::Parameterized(ty) => {
                let name = self.class_name(ty.raw);
                match ty.owner.as_ref().and_then(|owner| {
                    let owner_name = self.class_name(owner.raw_class()?);
                    let simple = name.strip_prefix(&owner_name)?.strip_prefix('$')?;
                    Some((owner, simple.to_string()))
                }) {
                    Some((owner, simple)) => write!(f, "{}.{simple}", self.with(owner))?,
                    None => f.write_str(&name)?,
                }
                if !ty.args.is_empty() {
                    f.write_str("<")?;
                    self.write_list(f, &ty.args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeKind::Variable(var) => f.write_str(&var.name),
            TypeKind::Wildcard(wildcard) => {
                if let Some(lower) = &wildcard.lower_bound {
                    return write!(f, "? super {}", self.with(lower));
                }
                let object = self.env.well_known().object;
                let uppers: Vec<&GenericType> = wildcard
                    .upper_bounds
                    .iter()
                    .filter(|upper| upper.as_class().map(|class| class.id) != Some(object))
                    .collect();
                if uppers.is_empty() {
                    return f.write_str("?");
                }
                f.write_str("? extends ")?;
                for (idx, upper) in uppers.into_iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{}", self.with(upper))?;
                }
                Ok(())
            }
            TypeKind::Union(union) => {
                write!(f, "union[{}](", self.with(&union.declared))?;
                self.write_list(f, &union.possible, ",")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
