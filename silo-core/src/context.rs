use std::fmt::{self, Display, Formatter};

/// Dotted server version, compared component by component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion(pub Vec<u32>);

impl ServerVersion {
    /// Keep the numeric components of a version string, `"20.3.7.46"` or `"1.1.54310"`.
    pub fn parse(version: &str) -> Self {
        ServerVersion(
            version
                .trim()
                .split('.')
                .filter_map(|v| v.parse().ok())
                .collect(),
        )
    }

    pub fn at_least(&self, version: &[u32]) -> bool {
        self.0.as_slice() >= version
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        ServerVersion(vec![1, 1, 0])
    }
}

impl Display for ServerVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Database dependent details needed to render statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlContext {
    pub db_name: String,
    pub server_version: ServerVersion,
}

impl DdlContext {
    pub fn new(db_name: impl Into<String>, server_version: ServerVersion) -> Self {
        Self {
            db_name: db_name.into(),
            server_version,
        }
    }

    /// Custom partitioning key syntax, introduced in 1.1.54310.
    pub fn has_partition_key_support(&self) -> bool {
        self.server_version.at_least(&[1, 1, 54310])
    }

    pub fn has_codec_support(&self) -> bool {
        self.server_version.at_least(&[19, 1, 16])
    }

    pub fn has_low_cardinality_support(&self) -> bool {
        self.server_version.at_least(&[19, 0])
    }

    /// Versions 1.1.53981 and below lack the `timezone()` function.
    pub fn has_timezone_support(&self) -> bool {
        self.server_version > ServerVersion(vec![1, 1, 53981])
    }
}

impl Default for DdlContext {
    fn default() -> Self {
        Self {
            db_name: "default".into(),
            server_version: ServerVersion(vec![20, 3]),
        }
    }
}
