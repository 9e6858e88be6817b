use std::fmt;

/// Stable machine-readable codes carried in FAIL envelopes.
///
/// `as_str` is the wire form clients match on; `message` is the
/// human-readable companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    OutOfRangeIndex,
    EmptyInventory,
    NotExistTeamcode,
    NoItem,
    CannotUpdate,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OutOfRangeIndex => "OUT_OF_RANGE_INDEX",
            ErrorCode::EmptyInventory => "EMPTY_INVENTORY",
            ErrorCode::NotExistTeamcode => "NOT_EXIST_TEAMCODE",
            ErrorCode::NoItem => "noItem",
            ErrorCode::CannotUpdate => "cannotUpdate",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::OutOfRangeIndex => "The index is outside the inventory range",
            ErrorCode::EmptyInventory => "There is no item at that inventory slot",
            ErrorCode::NotExistTeamcode => "No waiting room exists for that team code",
            ErrorCode::NoItem => "Not enough materials in the laboratory",
            ErrorCode::CannotUpdate => "The laboratory cannot be upgraded at this level",
            ErrorCode::ServiceUnavailable => "The computation service is temporarily unavailable",
        }
    }
}

/// Application-level error propagated out of event handlers.
///
/// The router converts these into FAIL envelopes at the handler boundary;
/// none of them closes the connection.
#[derive(Debug)]
pub enum GameError {
    /// Structurally valid input that fails a domain rule.
    Validation(ErrorCode),
    /// A referenced entity does not exist.
    NotFound(ErrorCode),
    /// The compute collaborator was unreachable or timed out.
    External(String),
    /// A cache or document-store operation failed.
    Store(String),
    /// The inbound frame could not be parsed into an event.
    Protocol(String),
}

impl GameError {
    /// The code a FAIL envelope should carry for this error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            GameError::Validation(code) | GameError::NotFound(code) => Some(*code),
            GameError::External(_) | GameError::Store(_) => Some(ErrorCode::ServiceUnavailable),
            GameError::Protocol(_) => None,
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Validation(code) | GameError::NotFound(code) => {
                write!(f, "{}: {}", code.as_str(), code.message())
            }
            GameError::External(detail) => write!(f, "logic service error: {detail}"),
            GameError::Store(detail) => write!(f, "store error: {detail}"),
            GameError::Protocol(detail) => write!(f, "protocol error: {detail}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<redis::RedisError> for GameError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!(?err, "redis error");
        GameError::Store(err.to_string())
    }
}

impl From<mongodb::error::Error> for GameError {
    fn from(err: mongodb::error::Error) -> Self {
        tracing::error!(?err, "mongodb error");
        GameError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(?err, "logic request error");
        GameError::External(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(ErrorCode::OutOfRangeIndex.as_str(), "OUT_OF_RANGE_INDEX");
        assert_eq!(ErrorCode::NoItem.as_str(), "noItem");
        assert_eq!(ErrorCode::CannotUpdate.as_str(), "cannotUpdate");
    }

    #[test]
    fn protocol_errors_carry_no_code() {
        assert!(GameError::Protocol("bad frame".into()).code().is_none());
        assert_eq!(
            GameError::External("timeout".into()).code(),
            Some(ErrorCode::ServiceUnavailable)
        );
    }
}
