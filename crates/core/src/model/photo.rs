use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::PhotoId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhotoError {
    #[error("invalid photo URL")]
    InvalidUrl,

    #[error("unknown photo category: {0}")]
    UnknownCategory(String),
}

/// Occasion a photo depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    Birthday,
    Childhood,
    Business,
    Wedding,
    Holiday,
    Family,
    Celebration,
    Milestone,
    Other,
}

impl PhotoCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Childhood => "childhood",
            Self::Business => "business",
            Self::Wedding => "wedding",
            Self::Holiday => "holiday",
            Self::Family => "family",
            Self::Celebration => "celebration",
            Self::Milestone => "milestone",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoCategory {
    type Err = PhotoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "birthday" => Ok(Self::Birthday),
            "childhood" => Ok(Self::Childhood),
            "business" => Ok(Self::Business),
            "wedding" => Ok(Self::Wedding),
            "holiday" => Ok(Self::Holiday),
            "family" => Ok(Self::Family),
            "celebration" => Ok(Self::Celebration),
            "milestone" => Ok(Self::Milestone),
            "other" => Ok(Self::Other),
            other => Err(PhotoError::UnknownCategory(other.to_string())),
        }
    }
}

/// The photo an interview is anchored on.
///
/// Everything except the id is optional; a missing description is replaced
/// with a generic one when the narrative request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoContext {
    id: PhotoId,
    description: Option<String>,
    category: Option<PhotoCategory>,
    url: Option<String>,
    #[serde(default)]
    people: Vec<String>,
}

impl PhotoContext {
    #[must_use]
    pub fn new(id: PhotoId) -> Self {
        Self {
            id,
            description: None,
            category: None,
            url: None,
            people: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into().trim().to_string();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: PhotoCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_people<I, S>(mut self, people: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.people = people
            .into_iter()
            .map(|p| p.into().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Attach the photo's location.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::InvalidUrl` if the value does not parse as a URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Result<Self, PhotoError> {
        let url = url.into().trim().to_string();
        if Url::parse(&url).is_err() {
            return Err(PhotoError::InvalidUrl);
        }
        self.url = Some(url);
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<PhotoCategory> {
        self.category
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn people(&self) -> &[String] {
        &self.people
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_description_is_treated_as_absent() {
        let photo = PhotoContext::new(PhotoId::new("1")).with_description("   ");
        assert_eq!(photo.description(), None);
    }

    #[test]
    fn url_must_parse() {
        let err = PhotoContext::new(PhotoId::new("1"))
            .with_url("not a url")
            .unwrap_err();
        assert_eq!(err, PhotoError::InvalidUrl);

        let photo = PhotoContext::new(PhotoId::new("1"))
            .with_url("https://images.example.com/bakery.jpg")
            .unwrap();
        assert_eq!(photo.url(), Some("https://images.example.com/bakery.jpg"));
    }

    #[test]
    fn photo_serializes_category_as_snake_case() {
        let photo = PhotoContext::new(PhotoId::new("2"))
            .with_description("Wedding celebration")
            .with_category(PhotoCategory::Wedding);
        let json = serde_json::to_string(&photo).unwrap();
        assert!(json.contains("\"category\":\"wedding\""));
        let back: PhotoContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, photo);
    }
}
