use std::fmt;

use crate::error::{Result, SignatureError};

/// Binary name of the root class every reference type converts to.
pub const OBJECT_CLASS_NAME: &str = "java.lang.Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub const ALL: [BaseType; 8] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
    ];

    /// The source-level keyword, which is also the binary name of the primitive class.
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<BaseType> {
        BaseType::ALL.into_iter().find(|ty| ty.keyword() == keyword)
    }

    pub fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub(crate) fn from_descriptor_char(c: char) -> Option<BaseType> {
        BaseType::ALL.into_iter().find(|ty| ty.descriptor_char() == c)
    }
}

/// A reference to a (possibly parameterized) class.
///
/// `name` is always the full binary name (`com.example.Outer$Inner`). `owner` is only present
/// when the signature spelled the enclosing type explicitly, e.g. `Outer<T>.Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDescriptor {
    pub name: String,
    pub owner: Option<Box<ClassDescriptor>>,
    pub args: Vec<TypeDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            args,
        }
    }

    pub fn nested(owner: ClassDescriptor, simple_name: &str, args: Vec<TypeDescriptor>) -> Self {
        Self {
            name: format!("{}${}", owner.name, simple_name),
            owner: Some(Box::new(owner)),
            args,
        }
    }

    pub fn is_object(&self) -> bool {
        self.owner.is_none() && self.args.is_empty() && self.name == OBJECT_CLASS_NAME
    }

    fn write_signature(&self, out: &mut String) -> Result<()> {
        match &self.owner {
            Some(owner) => {
                let simple = self
                    .name
                    .strip_prefix(owner.name.as_str())
                    .and_then(|rest| rest.strip_prefix('$'))
                    .ok_or_else(|| SignatureError::Unrepresentable {
                        descriptor: self.to_string(),
                        reason: "nested class name does not extend its owner's name",
                    })?;
                owner.write_signature(out)?;
                out.push('.');
                out.push_str(simple);
            }
            None => out.push_str(&self.name.replace('.', "/")),
        }
        if !self.args.is_empty() {
            out.push('<');
            for arg in &self.args {
                arg.write_type_argument(out)?;
            }
            out.push('>');
        }
        Ok(())
    }
}

/// Bounds of a wildcard type argument, in the shape reflection reports them: an unbounded or
/// `super`-bounded wildcard still has `Object` as its upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardDescriptor {
    pub upper_bounds: Vec<TypeDescriptor>,
    pub lower_bounds: Vec<TypeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Base(BaseType),
    Class(ClassDescriptor),
    Array(Box<TypeDescriptor>),
    Variable(String),
    Wildcard(WildcardDescriptor),
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        TypeDescriptor::Class(ClassDescriptor::new(name, Vec::new()))
    }

    pub fn parameterized(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Class(ClassDescriptor::new(name, args))
    }

    pub fn object() -> Self {
        TypeDescriptor::class(OBJECT_CLASS_NAME)
    }

    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(component))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        TypeDescriptor::Variable(name.into())
    }

    /// `?`
    pub fn unbounded_wildcard() -> Self {
        TypeDescriptor::Wildcard(WildcardDescriptor {
            upper_bounds: vec![TypeDescriptor::object()],
            lower_bounds: Vec::new(),
        })
    }

    /// `? extends upper`
    pub fn extends(upper: TypeDescriptor) -> Self {
        TypeDescriptor::Wildcard(WildcardDescriptor {
            upper_bounds: vec![upper],
            lower_bounds: Vec::new(),
        })
    }

    /// `? super lower`
    pub fn super_of(lower: TypeDescriptor) -> Self {
        TypeDescriptor::Wildcard(WildcardDescriptor {
            upper_bounds: vec![TypeDescriptor::object()],
            lower_bounds: vec![lower],
        })
    }

    fn is_object(&self) -> bool {
        matches!(self, TypeDescriptor::Class(class) if class.is_object())
    }

    /// Binary name of the class this descriptor erases to, if it is a class reference.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Class(class) => Some(&class.name),
            _ => None,
        }
    }

    /// Print the descriptor as a JVM type signature (`Ljava/util/List<TT;>;`).
    ///
    /// Wildcards are only expressible inside a type argument list and with at most one bound.
    pub fn to_signature(&self) -> Result<String> {
        let mut out = String::new();
        self.write_signature(&mut out)?;
        Ok(out)
    }

    fn write_signature(&self, out: &mut String) -> Result<()> {
        match self {
            TypeDescriptor::Base(base) => out.push(base.descriptor_char()),
            TypeDescriptor::Class(class) => {
                out.push('L');
                class.write_signature(out)?;
                out.push(';');
            }
            TypeDescriptor::Array(component) => {
                out.push('[');
                component.write_signature(out)?;
            }
            TypeDescriptor::Variable(name) => {
                out.push('T');
                out.push_str(name);
                out.push(';');
            }
            TypeDescriptor::Wildcard(_) => {
                return Err(SignatureError::Unrepresentable {
                    descriptor: self.to_string(),
                    reason: "wildcards may only appear as type arguments",
                });
            }
        }
        Ok(())
    }

    fn write_type_argument(&self, out: &mut String) -> Result<()> {
        let TypeDescriptor::Wildcard(wildcard) = self else {
            return self.write_signature(out);
        };
        let unrepresentable = |reason| SignatureError::Unrepresentable {
            descriptor: self.to_string(),
            reason,
        };

        match (wildcard.upper_bounds.as_slice(), wildcard.lower_bounds.as_slice()) {
            ([], []) => out.push('*'),
            ([upper], []) if upper.is_object() => out.push('*'),
            ([upper], []) => {
                out.push('+');
                upper.write_signature(out)?;
            }
            (uppers, [lower]) if uppers.iter().all(TypeDescriptor::is_object) => {
                out.push('-');
                lower.write_signature(out)?;
            }
            (_, [_]) => return Err(unrepresentable("wildcard has both upper and lower bounds")),
            (_, []) => return Err(unrepresentable("wildcard has several upper bounds")),
            _ => return Err(unrepresentable("wildcard has several lower bounds")),
        }
        Ok(())
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => {
                let simple = self
                    .name
                    .strip_prefix(owner.name.as_str())
                    .and_then(|rest| rest.strip_prefix('$'))
                    .unwrap_or(&self.name);
                write!(f, "{owner}.{simple}")?;
            }
            None => f.write_str(&self.name)?,
        }
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Base(base) => f.write_str(base.keyword()),
            TypeDescriptor::Class(class) => write!(f, "{class}"),
            TypeDescriptor::Array(component) => write!(f, "{component}[]"),
            TypeDescriptor::Variable(name) => f.write_str(name),
            TypeDescriptor::Wildcard(wildcard) => {
                if let Some(lower) = wildcard.lower_bounds.first() {
                    return write!(f, "? super {lower}");
                }
                let uppers: Vec<&TypeDescriptor> = wildcard
                    .upper_bounds
                    .iter()
                    .filter(|upper| !upper.is_object())
                    .collect();
                if uppers.is_empty() {
                    return f.write_str("?");
                }
                f.write_str("? extends ")?;
                for (idx, upper) in uppers.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{upper}")?;
                }
                Ok(())
            }
        }
    }
}

/// A formal type parameter: `T extends Bound1 & Bound2`.
///
/// An omitted class bound is represented by an explicit `Object` bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameterDescriptor {
    pub name: String,
    pub bounds: Vec<TypeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameterDescriptor>,
    pub super_class: ClassDescriptor,
    pub interfaces: Vec<ClassDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameterDescriptor>,
    pub parameters: Vec<TypeDescriptor>,
    /// `None` for `void`.
    pub return_type: Option<TypeDescriptor>,
}
