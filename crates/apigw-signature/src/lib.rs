//! Type descriptors and JVM generic signatures.
//!
//! A [`TypeDescriptor`] is the shape a reflective runtime reports for a declared type: a class
//! (optionally parameterized and nested in a parameterized owner), an array, a type variable
//! referenced by name, or a wildcard. Descriptors are plain data; they know nothing about class
//! hierarchies. `apigw-generic` turns them into resolved generic types.
//!
//! Signatures follow JVMS 4.7.9.1, with binary names using `.` as the package separator once
//! parsed (`java.util.Map$Entry`).

#![forbid(unsafe_code)]

mod descriptor;
mod error;
mod parse;

pub use crate::descriptor::{
    BaseType, ClassDescriptor, ClassSignature, MethodSignature, TypeDescriptor,
    TypeParameterDescriptor, WildcardDescriptor, OBJECT_CLASS_NAME,
};
pub use crate::error::{Result, SignatureError};
pub use crate::parse::{
    parse_class_signature, parse_field_signature, parse_method_signature, parse_type_signature,
};
