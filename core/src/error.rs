//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`; every other string-carrying
/// variant must be constructed explicitly.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The target file does not exist in the tree.
    #[from(ignore)]
    #[display("File not found: {_0}")]
    FileNotFound(String),

    /// No module descriptor was found between the start directory and the root.
    #[from(ignore)]
    #[display("Could not find a module descriptor starting from '{_0}'")]
    ModuleNotFound(String),

    /// More than one module descriptor lives in the nearest matching directory.
    #[from(ignore)]
    #[display("More than one module matches in '{_0}'. Use the module option to pick one")]
    MultipleModules(String),

    /// A path input was not absolute or could not be normalized.
    #[from(ignore)]
    #[display("Invalid path: {_0}")]
    InvalidPath(String),

    /// The metadata object declares the same collection key more than once.
    #[from(ignore)]
    #[display("Property '{_0}' is declared more than once in the module metadata")]
    AmbiguousDeclaration(String),

    /// The descriptor text could not be interpreted.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// Option loading or validation failed.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = AppError::AmbiguousDeclaration("declarations".into());
        assert_eq!(
            err.to_string(),
            "Property 'declarations' is declared more than once in the module metadata"
        );
        let err = AppError::FileNotFound("/src/app/app.module.ts".into());
        assert_eq!(err.to_string(), "File not found: /src/app/app.module.ts");
    }
}
