use std::fmt;

use thiserror::Error;

pub const MAX_SEGMENT_LENGTH: usize = 128;
const API_PREFIX: &str = "/api/";

/// A backend route that is safe to append to the base address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiPath(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiPathError {
    #[error("route must start with /api/")]
    MissingPrefix,
    #[error("route contains an empty segment")]
    EmptySegment,
    #[error("route segment is too long")]
    SegmentTooLong,
    #[error("route segment `{0}` contains invalid characters")]
    InvalidCharacters(String),
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn check_segment(segment: &str) -> Result<(), ApiPathError> {
    if segment.is_empty() {
        return Err(ApiPathError::EmptySegment);
    }
    if segment.len() > MAX_SEGMENT_LENGTH {
        return Err(ApiPathError::SegmentTooLong);
    }
    if segment == "." || segment == ".." || !segment.chars().all(is_segment_char) {
        return Err(ApiPathError::InvalidCharacters(segment.to_string()));
    }
    Ok(())
}

impl ApiPath {
    pub fn parse(input: &str) -> Result<Self, ApiPathError> {
        let Some(rest) = input.strip_prefix(API_PREFIX) else {
            return Err(ApiPathError::MissingPrefix);
        };
        for segment in rest.split('/') {
            check_segment(segment)?;
        }
        Ok(Self(input.to_string()))
    }

    /// Appends one caller-supplied identifier (project id, DAG id, ...) as a new segment.
    pub fn child(&self, segment: &str) -> Result<Self, ApiPathError> {
        check_segment(segment)?;
        Ok(Self(format!("{}/{}", self.0, segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
