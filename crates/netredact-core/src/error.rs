//! Engine error types.

use thiserror::Error;

/// Errors raised during engine construction.
#[derive(Error, Debug)]
pub enum RedactError {
    /// Deterministic mode was requested without a secret key.
    #[error("deterministic mode requires a secret key")]
    MissingSecret,

    /// The keyed replacement function could not be initialized.
    #[error("failed to initialize keyed replacement function")]
    KeyDerivation,
}
