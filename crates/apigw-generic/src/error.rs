use apigw_signature::SignatureError;

pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors raised by the type engine.
///
/// Incompatibility between two well-formed types is never an error: operations report it as
/// `Ok(None)` or `Ok(false)`. Everything here is either a malformed definition, a binding
/// conflict, or a variable a resolver could not supply.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("`{class}` declares {expected} type parameters but {found} type arguments were supplied")]
    ArityMismatch {
        class: String,
        expected: usize,
        found: usize,
    },

    #[error("owner type of `{formal}` does not match the owner of `{actual}`")]
    OwnerMismatch { formal: String, actual: String },

    #[error("`{class}` is an inner class of a generic type and needs an owner type")]
    MissingOwner { class: String },

    #[error("`{class}` is neither generic nor nested in a generic type")]
    NotParameterized { class: String },

    #[error("unknown class `{name}`")]
    UnknownClass { name: String },

    #[error("type variable `{name}` is not declared in {scope}")]
    UnknownTypeVariable { name: String, scope: String },

    #[error("unsupported descriptor `{descriptor}`: {reason}")]
    UnsupportedDescriptor {
        descriptor: String,
        reason: &'static str,
    },

    #[error("union member `{member}` is not a static type")]
    InvalidUnionMember { member: String },

    #[error("union declared as `{declared}` has no possible types")]
    EmptyUnion { declared: String },

    #[error("`{class}` does not reach `{ancestor}` through its declared supertypes")]
    InconsistentHierarchy { class: String, ancestor: String },

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("invalid class model `{class}`: {reason}")]
    Model { class: String, reason: String },

    #[error("json error: {message}")]
    Json { message: String },

    #[error("type variable `{variable}` is bound to both `{first}` and `{second}`")]
    ConflictingBinding {
        variable: String,
        first: String,
        second: String,
    },

    #[error("type variable `{variable}` has no binding in `{context}`")]
    UnresolvedVariable { variable: String, context: String },
}

impl From<serde_json::Error> for TypeError {
    fn from(err: serde_json::Error) -> Self {
        TypeError::Json {
            message: err.to_string(),
        }
    }
}
