use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::ResourceId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("resource title cannot be empty")]
    EmptyTitle,

    #[error("resource url is not valid: {0}")]
    InvalidUrl(String),

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}

//
// ─── RESOURCE KIND ─────────────────────────────────────────────────────────────
//

/// The medium of a recommended learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Article,
    Tutorial,
}

impl ResourceKind {
    /// Stable lowercase name, also used as the persisted representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Article => "article",
            ResourceKind::Tutorial => "tutorial",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "article" => Ok(Self::Article),
            "tutorial" => Ok(Self::Tutorial),
            other => Err(ResourceError::UnknownKind(other.to_string())),
        }
    }
}

//
// ─── RESOURCE ──────────────────────────────────────────────────────────────────
//

/// One recommended learning resource attached to a roadmap step.
///
/// Resource order within a step is display order, not a behavioral invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub kind: ResourceKind,
    pub url: String,
    pub source: String,
}

impl Resource {
    /// Builds a resource, validating the title and URL.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::EmptyTitle` for a blank title and
    /// `ResourceError::InvalidUrl` when the URL does not parse.
    pub fn new(
        id: ResourceId,
        title: impl Into<String>,
        kind: ResourceKind,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ResourceError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ResourceError::EmptyTitle);
        }

        let url = url.into();
        Url::parse(&url).map_err(|_| ResourceError::InvalidUrl(url.clone()))?;

        Ok(Self {
            id,
            title,
            kind,
            url,
            source: source.into(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_valid_resource() {
        let resource = Resource::new(
            ResourceId::new("res1"),
            "Introduction to Rust",
            ResourceKind::Video,
            "https://example.com/intro",
            "YouTube",
        )
        .unwrap();
        assert_eq!(resource.kind, ResourceKind::Video);
        assert_eq!(resource.source, "YouTube");
    }

    #[test]
    fn rejects_empty_title() {
        let err = Resource::new(
            ResourceId::new("res1"),
            "   ",
            ResourceKind::Article,
            "https://example.com",
            "Medium",
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::EmptyTitle));
    }

    #[test]
    fn rejects_invalid_url() {
        let err = Resource::new(
            ResourceId::new("res1"),
            "Broken link",
            ResourceKind::Tutorial,
            "not a url",
            "Udemy",
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidUrl(_)));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            ResourceKind::Video,
            ResourceKind::Article,
            ResourceKind::Tutorial,
        ] {
            let parsed: ResourceKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let err = "podcast".parse::<ResourceKind>().unwrap_err();
        assert!(matches!(err, ResourceError::UnknownKind(_)));
    }
}
