use std::fmt;

/// The version token that resolves to the newest release on the update center.
pub const LATEST: &str = "latest";

/// Extension of archives as published by the update center.
pub const REMOTE_EXTENSION: &str = "hpi";

/// Errors that reject a manifest line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecifierError {
    #[error("expected `name` or `name:version`, found {0} separators")]
    TooManySeparators(usize),

    #[error("plugin name is empty")]
    EmptyName,

    #[error("version after `:` is empty")]
    EmptyVersion,

    #[error("invalid character {0:?} in {1}")]
    InvalidCharacter(char, &'static str),
}

/// How a specifier asks for its version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// No version given: fetch `latest` and pin whatever arrives.
    Unversioned,
    /// An explicit token, which may itself be `latest`.
    Explicit(String),
}

/// One manifest line: `name` or `name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    pub name: String,
    pub version: Version,
}

impl Specifier {
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Version::Unversioned,
        }
    }

    pub fn explicit(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Version::Explicit(version.into()),
        }
    }

    /// Parse a single manifest line. Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, SpecifierError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let separators = line.matches(':').count();
        let spec = match line.split_once(':') {
            None => Self::unversioned(line),
            Some(_) if separators > 1 => {
                return Err(SpecifierError::TooManySeparators(separators));
            }
            Some((name, version)) => {
                let version = version.trim();
                if version.is_empty() {
                    return Err(SpecifierError::EmptyVersion);
                }
                Self::explicit(name.trim(), version)
            }
        };

        if spec.name.is_empty() {
            return Err(SpecifierError::EmptyName);
        }
        check_token(&spec.name, "name")?;
        if let Version::Explicit(version) = &spec.version {
            check_token(version, "version")?;
        }

        Ok(Some(spec))
    }

    /// The token used to build the remote URL: `latest` when unversioned,
    /// otherwise the explicit version verbatim.
    pub fn effective_version(&self) -> &str {
        match &self.version {
            Version::Unversioned => LATEST,
            Version::Explicit(v) => v,
        }
    }

    /// True when a successful fetch should leave a pin marker behind.
    pub fn is_pinned(&self) -> bool {
        matches!(self.version, Version::Unversioned)
    }

    /// Remote archive URL under the given update center base.
    ///
    /// - `latest` → `{base}/latest/{name}.hpi`
    /// - otherwise → `{base}/download/plugins/{name}/{version}/{name}.hpi`
    pub fn remote_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let name = &self.name;
        match self.effective_version() {
            LATEST => format!("{base}/{LATEST}/{name}.{REMOTE_EXTENSION}"),
            version => {
                format!("{base}/download/plugins/{name}/{version}/{name}.{REMOTE_EXTENSION}")
            }
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Version::Unversioned => write!(f, "{}", self.name),
            Version::Explicit(v) => write!(f, "{}:{v}", self.name),
        }
    }
}

/// Names and versions end up as URL path segments and file names.
fn check_token(token: &str, what: &'static str) -> Result<(), SpecifierError> {
    match token
        .chars()
        .find(|c| c.is_whitespace() || *c == '/' || *c == '\\')
    {
        Some(c) => Err(SpecifierError::InvalidCharacter(c, what)),
        None => Ok(()),
    }
}
