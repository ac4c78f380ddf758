use oplist_uuid::UuidError;

/// Errors raised when a record cannot be constructed or mutated.
///
/// There is no partial construction: a constructor either returns a fully valid value or one of
/// these errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A scalar field is outside its allowed domain (for example `page < 1`).
    #[error("{field} out of range: got {value}, expected {expected}")]
    Range {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },

    /// A cross-field or cross-entity rule is violated.
    ///
    /// Displays as the bare message so callers can match on the documented wording.
    #[error("{0}")]
    Invariant(String),

    /// A value arriving from an untyped boundary does not fit a closed set or expected shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Several independent rules failed at once.
    #[error("{} violations: {}", .0.len(), join_messages(.0))]
    Violations(Vec<ModelError>),
}

impl ModelError {
    pub(crate) fn range(field: &'static str, value: i64, expected: &'static str) -> Self {
        Self::Range {
            field,
            value,
            expected,
        }
    }

    /// Folds independently collected failures into one error.
    ///
    /// A single failure is returned as itself so its message is not wrapped.
    pub(crate) fn collect(errors: impl IntoIterator<Item = Option<ModelError>>) -> Self {
        let mut errors: Vec<ModelError> = errors.into_iter().flatten().collect();
        if errors.len() == 1 {
            if let Some(only) = errors.pop() {
                return only;
            }
        }
        Self::Violations(errors)
    }

    /// Returns every individual failure, flattening [`ModelError::Violations`].
    pub fn violations(&self) -> Vec<&ModelError> {
        match self {
            Self::Violations(errors) => errors.iter().flat_map(ModelError::violations).collect(),
            other => vec![other],
        }
    }
}

impl From<UuidError> for ModelError {
    fn from(err: UuidError) -> Self {
        match err {
            UuidError::InvalidInput(msg) => Self::TypeMismatch(msg),
        }
    }
}

fn join_messages(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Type alias for Results that can fail with a [`ModelError`].
pub type ModelResult<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_unwraps_single_failure() {
        let err = ModelError::collect([None, Some(ModelError::Invariant("boom".into())), None]);
        assert_eq!(err, ModelError::Invariant("boom".into()));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn collect_keeps_every_failure_in_order() {
        let err = ModelError::collect([
            Some(ModelError::range("page", 0, ">= 1")),
            None,
            Some(ModelError::Invariant("second".into())),
        ]);

        let violations = err.violations();
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations[0], ModelError::Range { field: "page", .. }));
        assert_eq!(violations[1].to_string(), "second");
        assert!(err.to_string().starts_with("2 violations: page out of range"));
    }

    #[test]
    fn uuid_errors_become_type_mismatch() {
        let err: ModelError = UuidError::InvalidInput("bad id".into()).into();
        assert_eq!(err, ModelError::TypeMismatch("bad id".into()));
        assert_eq!(err.to_string(), "type mismatch: bad id");
    }
}
