//! Sync failure classification
//!
//! Every sync invocation is a single attempt; all of these are terminal
//! for that invocation and none trigger an automatic retry. The first
//! four carry user-actionable messages; transport errors are logged with
//! full diagnostic detail by the engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the sync engine and mirror client
#[derive(Error, Debug)]
pub enum SyncError {
    /// The service-account credential file is absent; no network call
    /// was made
    #[error(
        "Credential file '{path}' not found. Place your service account key there to enable sync."
    )]
    MissingCredential { path: PathBuf },

    /// The remote resource does not exist
    #[error("Remote mirror '{target}' was not found. Check the link, key or name.")]
    NotFound { target: String },

    /// The remote resource exists but is not an editable sheet
    /// (typically a binary spreadsheet upload that must be converted)
    #[error(
        "Remote mirror '{target}' is not an editable sheet: {details}. \
         Convert it to the hosted sheet format and try again."
    )]
    WrongFormat { target: String, details: String },

    /// The credential has no access to the resource
    #[error(
        "Permission denied for mirror '{target}'. \
         Share it with the service account as an editor."
    )]
    PermissionDenied { target: String },

    /// Mirror API rejected the request for some other reason
    #[error("Mirror API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Network-level failure
    #[error("Sync transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No mirror target is configured and none was supplied
    #[error("No mirror target configured. Run an interactive sync with a link, key or name first.")]
    NoTarget,

    /// Local store failure while reconciling a download
    #[error("Failed to apply downloaded records: {0}")]
    Apply(String),
}

impl SyncError {
    /// Classify an HTTP error response from the mirror API
    ///
    /// 404 means the resource is missing, 403 means the service account
    /// was not granted access, and a 400 complaining that the operation
    /// is not supported is the signature of a non-editable binary
    /// spreadsheet sitting behind the key.
    pub fn from_response(status: u16, body: &str, target: &str) -> Self {
        match status {
            404 => SyncError::NotFound {
                target: target.to_string(),
            },
            403 => SyncError::PermissionDenied {
                target: target.to_string(),
            },
            400 if body.contains("operation is not supported") => SyncError::WrongFormat {
                target: target.to_string(),
                details: body.trim().to_string(),
            },
            _ => SyncError::Api {
                status,
                body: body.trim().to_string(),
            },
        }
    }

    /// Whether this failure occurred before any network traffic
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, SyncError::MissingCredential { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = SyncError::from_response(404, "no such sheet", "ABC123");
        assert!(matches!(err, SyncError::NotFound { .. }));
        assert!(err.to_string().contains("ABC123"));
    }

    #[test]
    fn test_permission_denied_classification() {
        let err = SyncError::from_response(403, "forbidden", "ABC123");
        assert!(matches!(err, SyncError::PermissionDenied { .. }));
        assert!(err.to_string().contains("service account"));
    }

    #[test]
    fn test_wrong_format_classification() {
        let err = SyncError::from_response(
            400,
            "This operation is not supported for this document",
            "ABC123",
        );
        assert!(matches!(err, SyncError::WrongFormat { .. }));
        assert!(err.to_string().contains("not an editable sheet"));
    }

    #[test]
    fn test_other_400_is_api_error() {
        let err = SyncError::from_response(400, "bad range", "ABC123");
        assert!(matches!(err, SyncError::Api { status: 400, .. }));
    }

    #[test]
    fn test_missing_credential_message() {
        let err = SyncError::MissingCredential {
            path: PathBuf::from("service_account.json"),
        };
        assert!(err.is_missing_credential());
        assert!(err.to_string().contains("service_account.json"));
    }
}
