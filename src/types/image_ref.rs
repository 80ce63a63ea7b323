// ABOUTME: Container image reference parsing, validation, and retagging.
// ABOUTME: Handles formats like app, app:tag, registry/ns/app:tag@digest.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("image reference has an empty component: {0}")]
    EmptyComponent(String),
}

/// A container image reference: optional registry host, repository path,
/// optional tag and digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

fn is_ref_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }
        if let Some(c) = input.chars().find(|c| !is_ref_char(*c)) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (rest, digest) = match input.split_once('@') {
            Some((head, d)) => (head, Some(d.to_string())),
            None => (input, None),
        };

        // A trailing ":tag" is a tag only if it contains no slash; otherwise
        // the colon belongs to a registry port (e.g. localhost:5000/app).
        let (rest, tag) = match rest.rsplit_once(':') {
            Some((head, t)) if !t.contains('/') => (head, Some(t.to_string())),
            _ => (rest, None),
        };

        // The first path component is a registry host if it looks like one:
        // contains a dot or port colon, or is "localhost".
        let (registry, repository) = match rest.split_once('/') {
            Some((host, path))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (Some(host.to_string()), path.to_string())
            }
            _ => (None, rest.to_string()),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(ParseImageRefError::EmptyComponent(input.to_string()));
        }

        // An untagged, undigested reference means "latest".
        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Build a local reference from a name and tag, no registry.
    pub fn local(name: &str, tag: &str) -> Result<Self, ParseImageRefError> {
        Self::parse(&format!("{name}:{tag}"))
    }

    /// The same image re-addressed under `registry/namespace/…`, dropping any
    /// previous registry prefix. Used to produce the push target.
    pub fn qualified(&self, registry: &str, namespace: &str) -> Self {
        let repository = match self.repository.rsplit_once('/') {
            Some((_, base)) => format!("{namespace}/{base}"),
            None => format!("{}/{}", namespace, self.repository),
        };
        Self {
            registry: Some(registry.to_string()),
            repository,
            tag: self.tag.clone(),
            digest: self.digest.clone(),
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}
