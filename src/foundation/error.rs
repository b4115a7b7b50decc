/// Convenience result type used across meltscr.
pub type MeltResult<T> = Result<T, MeltError>;

/// Top-level error taxonomy used by table, persistence and transition APIs.
#[derive(thiserror::Error, Debug)]
pub enum MeltError {
    /// A file could not be opened, read, written or renamed.
    ///
    /// Short reads and short writes land here as `UnexpectedEof` / `WriteZero`.
    #[error("io error: {context}: {source}")]
    Io {
        /// What was being attempted, including the path.
        context: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A tables file was only partially readable.
    ///
    /// The tables decoded before the failure were kept; the failing entry and every entry after
    /// it were discarded.
    #[error("io error: tables file truncated after {recovered} of {declared} tables: {source}")]
    PartialLoad {
        /// Tables successfully read and kept.
        recovered: u32,
        /// Table count announced by the file header.
        declared: u32,
        /// Failure that stopped the read.
        #[source]
        source: Box<MeltError>,
    },

    /// Invalid parameters, settings or on-disk record contents.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing settings.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MeltError {
    /// Build a [`MeltError::Io`] value.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a [`MeltError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MeltError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for the I/O class of failures (including partial loads).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::PartialLoad { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
