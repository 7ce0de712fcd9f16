use std::fmt;

use thiserror::Error;

use url::Url as UrlParser;

/// Backend base address, e.g. `https://forgeiq.example.com` or `http://localhost:8000/v1`.
///
/// Stored without a trailing slash so that routes can be appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

#[derive(Error, Debug)]
pub enum BaseUrlError {
    #[error("base address is empty")]
    Empty,
    #[error("contains userinfo")]
    ContainsUserinfo,
    #[error("scheme `{0}` is not allowed")]
    WrongScheme(String),
    #[error("base address does not contain a host")]
    EmptyHost,
    #[error("base address must not carry a query or fragment")]
    HasQueryOrFragment,
    #[error("could not parse the base address")]
    Invalid(url::ParseError),
}

impl BaseUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full URL for a backend route.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = BaseUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BaseUrlError::Empty);
        }

        let url = UrlParser::parse(trimmed).map_err(BaseUrlError::Invalid)?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(BaseUrlError::WrongScheme(scheme.to_string()));
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(BaseUrlError::ContainsUserinfo);
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(BaseUrlError::EmptyHost);
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(BaseUrlError::HasQueryOrFragment);
        }

        Ok(BaseUrl(url.as_str().trim_end_matches('/').to_string()))
    }
}

impl TryFrom<&str> for BaseUrl {
    type Error = BaseUrlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}
