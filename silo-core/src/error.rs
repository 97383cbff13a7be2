use regex::Regex;
use std::{
    fmt::{self, Display, Formatter},
    sync::LazyLock,
};

/// Errors raised by the ORM itself.
///
/// They travel inside [`anyhow::Error`] like every other error in the crate, use
/// `error.downcast_ref::<OrmError>()` to inspect the kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrmError {
    /// A raw value could not be coerced to the native type of a field.
    #[error("Invalid value for {field}: {value} ({reason})")]
    Conversion {
        field: String,
        value: String,
        reason: String,
    },
    /// A converted value violates a range, precision, length or membership constraint.
    #[error("{field} out of range - {value} {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },
    /// Structurally invalid model, field or engine declaration.
    #[error("Schema error: {0}")]
    Schema(String),
    /// The queryset does not allow the requested operation in its current state.
    #[error("Query state error: {0}")]
    QueryState(String),
    /// The model does not declare a field with this name.
    #[error("Model `{model}` has no field `{field}`")]
    UnknownField { model: String, field: String },
    /// Database level operation rejected before reaching the server.
    #[error("{0}")]
    Database(String),
    /// Failure reported by the server.
    #[error("{0}")]
    Server(ServerError),
}

impl OrmError {
    pub fn conversion(
        field: impl Into<String>,
        value: impl fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        OrmError::Conversion {
            field: field.into(),
            value: format!("{value:?}"),
            reason: reason.into(),
        }
    }

    pub fn validation(
        field: impl Into<String>,
        value: impl Display,
        reason: impl Into<String>,
    ) -> Self {
        OrmError::Validation {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        OrmError::Schema(message.into())
    }

    pub fn query_state(message: impl Into<String>) -> Self {
        OrmError::QueryState(message.into())
    }

    /// Return the kind of a generic error, if it originated in this crate.
    pub fn of(error: &anyhow::Error) -> Option<&OrmError> {
        error.downcast_ref::<OrmError>()
    }
}

/// Error reported by the server, with the numeric code extracted from the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub code: u32,
    pub message: String,
}

static ERROR_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        // Servers prior to 19.3.3
        Regex::new(
            r"(?s)^Code: (?P<code>\d+), e\.displayText\(\) = (?P<type1>[^ \n]+): (?P<msg>.+?), e\.what\(\) = (?P<type2>[^ \n]+)",
        )
        .expect("valid regex"),
        Regex::new(r"(?s)^Code: (?P<code>\d+), e\.displayText\(\) = (?P<type1>[^ \n]+): (?P<msg>.+)")
            .expect("valid regex"),
    ]
});

impl ServerError {
    pub const UNKNOWN_DATABASE: u32 = 81;

    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Extract code and message from a server error body. Bodies that do not follow
    /// any known layout produce code 0 and the whole text as message.
    pub fn parse(body: &str) -> Self {
        for pattern in ERROR_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(body) {
                let code = captures["code"].parse().unwrap_or_default();
                return Self::new(code, captures["msg"].trim());
            }
        }
        Self::new(0, body.trim())
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ServerError {}

impl From<ServerError> for OrmError {
    fn from(value: ServerError) -> Self {
        OrmError::Server(value)
    }
}
