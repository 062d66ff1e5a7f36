use std::io;
use thiserror::Error;

/// Errors that abort generation of a program.
///
/// These are design-time mistakes in the calling code (bad widths, radii or increments) or
/// geometry that cannot be realised. Recoverable oddities in the input are corrected silently
/// and reported through [`Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("compensation width must be positive, got {0}")]
    InvalidWidth(f64),

    #[error("radius must not be zero")]
    ZeroRadius,

    #[error("radius ({radius:.8}) is less than half the distance from start to end (D={discriminant:.8})")]
    InvalidRadius { radius: f64, discriminant: f64 },

    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    #[error("path collapsed to {points} point(s) while removing unreachable corners")]
    DegeneratePath { points: usize },

    #[error("invalid {name} ({value}): {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("matrix is not invertible")]
    NonInvertible,

    #[error("feed move requested before a feed rate was set")]
    MissingFeedrate,

    #[error("bad path entry {entry:?}: {reason}")]
    PathSyntax { entry: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Warnings collected while generating a toolpath.
///
/// Every warning is also logged through `tracing` when it is recorded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning attributed to `operation`.
    pub fn warn(&mut self, operation: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation, "{message}");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Take over the warnings of another operation.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}
