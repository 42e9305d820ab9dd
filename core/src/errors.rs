use std::fmt;
use std::io::Error;

/// Problems with a request that are the caller's to fix. The `Display` text is
/// safe to return to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBody,
    MissingAddress,
    InvalidAddress,
    UnknownBlockchain(String),
    UnsupportedBlockchain(String),
}
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBody => write!(f, "Invalid request body"),
            ValidationError::MissingAddress => write!(f, "Missing address"),
            ValidationError::InvalidAddress => write!(f, "Invalid address"),
            ValidationError::UnknownBlockchain(_) => write!(f, "Invalid blockchain"),
            ValidationError::UnsupportedBlockchain(_) => write!(f, "Unimplemented blockchain"),
        }
    }
}
impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum HistoryError {
    Validation(ValidationError),
    Lookup(Error),
    Timeout,
}
impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Validation(e) => write!(f, "{e}"),
            HistoryError::Lookup(e) => write!(f, "Ledger lookup failed: {e}"),
            HistoryError::Timeout => write!(f, "Request deadline exceeded"),
        }
    }
}
impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::Validation(e) => Some(e),
            HistoryError::Lookup(e) => Some(e),
            HistoryError::Timeout => None,
        }
    }
}
impl From<ValidationError> for HistoryError {
    fn from(value: ValidationError) -> Self {
        HistoryError::Validation(value)
    }
}
impl From<Error> for HistoryError {
    fn from(value: Error) -> Self {
        HistoryError::Lookup(value)
    }
}
impl HistoryError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, HistoryError::Validation(_))
    }
}
