//! Error types for Trellis.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Result type alias for Trellis operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for model declaration, rendering and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Derived attributes depend on each other in a cycle.
    CyclicDerivation {
        /// Keys along the cycle, first key repeated at the end.
        path: Vec<String>,
    },
    /// The same key was declared twice in one schema.
    DuplicateDeclaration {
        key: String,
    },
    /// A view constructor failed.
    ViewConstruction {
        view: &'static str,
        message: String,
    },
    /// A template or patch could not be rendered.
    Render {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CyclicDerivation { path } => {
                f.write_str("Cyclic derived attributes: ")?;
                for (i, key) in path.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    f.write_str(key)?;
                }
                Ok(())
            }
            Error::DuplicateDeclaration { key } => {
                write!(f, "Duplicate declaration for key: {}", key)
            }
            Error::ViewConstruction { view, message } => {
                write!(f, "Failed to construct view {}: {}", view, message)
            }
            Error::Render { message } => {
                write!(f, "Render failed: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a cyclic derivation error from the keys along the cycle.
    pub fn cyclic_derivation<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::CyclicDerivation {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a duplicate declaration error.
    pub fn duplicate_declaration(key: impl Into<String>) -> Self {
        Error::DuplicateDeclaration { key: key.into() }
    }

    /// Creates a view construction error.
    pub fn view_construction(view: &'static str, message: impl Into<String>) -> Self {
        Error::ViewConstruction {
            view,
            message: message.into(),
        }
    }

    /// Creates a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Error::Render {
            message: message.into(),
        }
    }
}
