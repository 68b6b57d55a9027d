use crate::scene::model::ObjectKind;

pub type CompgraphResult<T> = Result<T, CompgraphError>;

#[derive(thiserror::Error, Debug)]
pub enum CompgraphError {
    #[error("unsupported object kind: {kind} ({context})")]
    UnsupportedKind { kind: String, context: &'static str },

    #[error("invariant violation [{rule}] at {node}: {detail}")]
    InvariantViolation {
        rule: &'static str,
        node: String,
        detail: String,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompgraphError {
    pub fn unsupported_kind(kind: ObjectKind, context: &'static str) -> Self {
        Self::UnsupportedKind {
            kind: format!("{kind:?}"),
            context,
        }
    }

    pub fn unsupported_kind_name(kind: impl Into<String>, context: &'static str) -> Self {
        Self::UnsupportedKind {
            kind: kind.into(),
            context,
        }
    }

    pub fn invariant(
        rule: &'static str,
        node: impl std::fmt::Debug,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvariantViolation {
            rule,
            node: format!("{node:?}"),
            detail: detail.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the two fatal fault classes raised by the engine itself.
    pub fn is_engine_fault(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind { .. } | Self::InvariantViolation { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
