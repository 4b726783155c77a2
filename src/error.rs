pub type Result<T> = std::result::Result<T, StippleError>;

#[derive(Debug, thiserror::Error)]
pub enum StippleError {
    /// A shape is missing an attribute it cannot be drawn without.
    #[error("<{tag}> is missing required attribute `{attribute}`")]
    MissingAttribute { tag: String, attribute: String },

    /// A geometry attribute is present but cannot be read as numbers.
    #[error("<{tag}> has invalid `{attribute}` value {value:?}")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        value: String,
    },

    /// Path data that cannot be interpreted. `position` is a byte offset into `d`.
    #[error("malformed path data at offset {position}: {reason}")]
    MalformedPath { position: usize, reason: String },

    #[error("Stipple could not read the markup")]
    Xml(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Stipple encountered a backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Stipple encountered an error")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StippleError {
    pub(crate) fn missing(tag: &str, attribute: &str) -> Self {
        StippleError::MissingAttribute {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn invalid(tag: &str, attribute: &str, value: impl Into<String>) -> Self {
        StippleError::InvalidAttribute {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub(crate) fn malformed_path(position: usize, reason: impl Into<String>) -> Self {
        StippleError::MalformedPath {
            position,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for StippleError {
    fn from(err: std::io::Error) -> Self {
        StippleError::Other(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::Error> for StippleError {
    fn from(err: cairo::Error) -> Self {
        StippleError::Backend(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<png::EncodingError> for StippleError {
    fn from(err: png::EncodingError) -> Self {
        StippleError::Backend(Box::new(err))
    }
}

#[cfg(feature = "svg")]
impl From<quick_xml::Error> for StippleError {
    fn from(err: quick_xml::Error) -> Self {
        StippleError::Xml(Box::new(err))
    }
}
