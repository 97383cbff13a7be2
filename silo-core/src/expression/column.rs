use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

/// Reference to a column of the queried table, usable in expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Col {
    name: Cow<'static, str>,
}

impl Col {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_cow(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    pub(crate) fn into_name(self) -> Cow<'static, str> {
        self.name
    }
}

impl Display for Col {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.name)
    }
}
