use crate::Result;
use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

/// Payload of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    /// Sent in order as a single streamed body, chunk boundaries carry no meaning.
    Chunks(Vec<String>),
}

impl Body {
    /// Concatenated payload.
    pub fn to_text(&self) -> String {
        match self {
            Body::Text(v) => v.clone(),
            Body::Chunks(v) => v.concat(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Body::Text(v) => v.len(),
            Body::Chunks(v) => v.iter().map(String::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.into())
    }
}

/// Statement sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Default database of the statement, absent while the database does not exist.
    pub database: Option<String>,
    pub body: Body,
    /// Server settings attached to the request.
    pub settings: BTreeMap<String, String>,
    /// Ask the server to refuse writes.
    pub readonly: bool,
    pub timeout: Duration,
}

/// Successful answer of the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub text: String,
}

impl Response {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Lines of the body, without the line terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

/// Connection to the server, the only place where the crate suspends.
///
/// Failures reported by the server must be returned as
/// [`OrmError::Server`](crate::OrmError::Server), [`ServerError::parse`](crate::ServerError::parse)
/// extracts code and message from the error body.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: Transport> Transport for &T {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).send(request)
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).send(request)
    }
}
