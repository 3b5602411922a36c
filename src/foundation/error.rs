use std::path::PathBuf;
use std::time::Duration;

/// Convenience result type used across reelcut.
pub type ReelResult<T> = Result<T, ReelError>;

/// Which framing card a card-generation failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRole {
    /// Card placed before the first clip.
    Intro,
    /// Card placed after the last clip.
    Outro,
}

impl std::fmt::Display for CardRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intro => f.write_str("intro"),
            Self::Outro => f.write_str("outro"),
        }
    }
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided configuration, transcript or card data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The external encoder exited unsuccessfully.
    #[error("encoder error: {label} exited with {status}: {stderr}")]
    Encoder {
        /// Human-readable name of the invocation (clip id, card role, "concat").
        label: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured diagnostic output of the encoder.
        stderr: String,
    },

    /// The external encoder ran past its deadline and was killed.
    #[error("encoder timeout: {label} exceeded {timeout:?}")]
    Timeout {
        /// Human-readable name of the invocation.
        label: String,
        /// Bound that was exceeded.
        timeout: Duration,
    },

    /// The run was cancelled by its caller.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// An input needed for assembly does not exist on disk.
    #[error("missing input: '{}'", .0.display())]
    MissingInput(PathBuf),

    /// A reel order references clips that were never produced, or repeats one.
    #[error("ordering error: {0}")]
    Ordering(String),

    /// Intro or outro card generation failed; the reel cannot be produced.
    #[error("card error: {role} card failed: {source}")]
    Card {
        /// Card that failed.
        role: CardRole,
        /// Underlying cause.
        #[source]
        source: Box<ReelError>,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Ordering`] value.
    pub fn ordering(msg: impl Into<String>) -> Self {
        Self::Ordering(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`ReelError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Wrap `source` as the failure of the `role` card.
    pub fn card(role: CardRole, source: ReelError) -> Self {
        Self::Card {
            role,
            source: Box::new(source),
        }
    }

    /// `true` when the error came from the caller cancelling the run.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Card { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
