pub type Result<T> = std::result::Result<T, SignatureError>;

/// Errors produced while parsing or printing generic signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature `{signature}`: {reason}")]
    Invalid {
        signature: String,
        reason: &'static str,
    },

    #[error("`{descriptor}` cannot be expressed as a signature: {reason}")]
    Unrepresentable {
        descriptor: String,
        reason: &'static str,
    },
}

impl SignatureError {
    pub(crate) fn invalid(signature: &str, reason: &'static str) -> Self {
        SignatureError::Invalid {
            signature: signature.to_string(),
            reason,
        }
    }
}
