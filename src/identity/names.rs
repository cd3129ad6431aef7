use std::fmt;

use super::IdentityError;

/// A validated, non-empty container name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    /// Accepts `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(IdentityError::EmptyContainerName);
        };
        let valid = first.is_ascii_alphanumeric()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if !valid {
            return Err(IdentityError::InvalidContainer(name));
        }
        Ok(Self(name))
    }

    /// Derive a name from an image: its basename with the tag appended after
    /// a dash, e.g. `registry.fedoraproject.org/fedora-toolbox:40` gives
    /// `fedora-toolbox-40`.
    pub fn from_image(image: &ImageRef) -> Result<Self, IdentityError> {
        let basename = image.basename()?;
        let name = match basename.split_once(':') {
            Some((name, tag)) if !tag.is_empty() => format!("{name}-{tag}"),
            Some((name, _)) => name.to_string(),
            None => basename.to_string(),
        };
        Self::new(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-empty image reference such as `quay.io/toolbx/arch-toolbox:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(image: impl Into<String>) -> Result<Self, IdentityError> {
        let image = image.into();
        let image = image.trim();
        if image.is_empty() {
            return Err(IdentityError::EmptyImage);
        }
        Ok(Self(image.to_string()))
    }

    /// Last path component without any digest, tag included.
    pub fn basename(&self) -> Result<&str, IdentityError> {
        let without_digest = self.0.split('@').next().unwrap_or_default();
        let basename = without_digest.rsplit('/').next().unwrap_or_default();
        if basename.is_empty() || basename.starts_with(':') {
            return Err(IdentityError::ImageWithoutBasename(self.0.clone()));
        }
        Ok(basename)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
