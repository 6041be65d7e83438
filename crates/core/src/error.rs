//! Error types for `krishi-core`.

use thiserror::Error;

/// Domain errors surfaced by portal operations and the record store.
#[derive(Debug, Error)]
pub enum Error {
    /// No account exists under the given username.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Registration attempted with a username that is already taken.
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    /// Password did not match the stored one.
    #[error("incorrect password")]
    InvalidCredentials,

    /// The acting principal is not allowed to perform this operation.
    #[error("operation not permitted for this account")]
    AuthorizationDenied,

    /// A 1-based catalog position outside the current catalog bounds.
    #[error("{kind} {id} is out of range (1..={len})")]
    IdOutOfRange {
        /// Which catalog was addressed.
        kind: &'static str,
        /// The rejected position.
        id: u32,
        /// Current catalog length.
        len: usize,
    },

    /// The user already has an application for this subsidy.
    #[error("already applied for subsidy {0}")]
    AlreadyApplied(u32),

    /// Approval attempted on an application that is already approved.
    #[error("application for subsidy {0} is already approved")]
    AlreadyApproved(u32),

    /// Rejection attempted on an application that is still pending.
    #[error("application for subsidy {0} is already pending")]
    AlreadyPending(u32),

    /// The targeted user never applied for this subsidy.
    #[error("no application for subsidy {0}")]
    ApplicationNotFound(u32),

    /// A field value violates the data-layer contract.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A persisted record that cannot be parsed back into a user.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the data file.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Convenience result type defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
