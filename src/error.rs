use thiserror::Error;

#[derive(Debug, Error)]
pub enum YamlfigError {
    /// The document was structurally incompatible with the destination, or
    /// the destination's current state could not be re-serialized for
    /// layering.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read document stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid env variable prefix '{prefix}': {source}")]
    InvalidEnvPrefix {
        prefix: String,
        source: regex::Error,
    },

    #[error("cyclic shape: '{type_name}' transitively contains its own type")]
    CyclicShape { type_name: String },
}

impl YamlfigError {
    /// Recover a deferred stream failure from the read path.
    ///
    /// Streams surface construction failures as `io::Error::other(YamlfigError)`
    /// on their first read; unwrap those back so every call site sees the
    /// original error kind.
    pub(crate) fn from_stream_read(error: std::io::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(inner) => inner,
            Err(error) => Self::Io(error),
        }
    }
}
