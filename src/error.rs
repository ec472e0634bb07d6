/// Broad failure categories.
///
/// The kind decides the process exit code and lets callers (and tests) branch
/// on what went wrong without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, unreadable or unwritable path.
    Io,
    /// Missing or mistyped column.
    Schema,
    /// A value supplied by the user is outside its domain.
    InvalidInput,
    /// Not enough usable data to proceed.
    Data,
    /// Categorical value outside the fitted vocabulary.
    UnknownCategory,
    /// Persisted pipeline is corrupt or does not match the request.
    Artifact,
    /// Numerical failure while fitting a model.
    Training,
    /// Terminal backend failure.
    Terminal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Io | ErrorKind::Schema | ErrorKind::InvalidInput => 2,
            ErrorKind::Data => 3,
            ErrorKind::UnknownCategory | ErrorKind::Artifact | ErrorKind::Training => 4,
            ErrorKind::Terminal => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message)
    }

    pub fn unknown_category(column: &str, value: &str) -> Self {
        Self::new(
            ErrorKind::UnknownCategory,
            format!("Unknown `{column}` category '{value}'."),
        )
    }

    pub fn artifact(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Artifact, message)
    }

    pub fn training(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Training, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::io("x").exit_code(), 2);
        assert_eq!(AppError::data("x").exit_code(), 3);
        assert_eq!(AppError::unknown_category("cut", "Excellent").exit_code(), 4);
    }

    #[test]
    fn unknown_category_names_column_and_value() {
        let err = AppError::unknown_category("cut", "Excellent");
        assert_eq!(err.kind(), ErrorKind::UnknownCategory);
        assert!(err.to_string().contains("cut"));
        assert!(err.to_string().contains("Excellent"));
    }
}
