//! Updater-specific error types and exit code mapping

/// Updater error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// Missing or invalid settings (CLI args / config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// The Modrinth API returned a non-success status.
    #[error("modrinth api failed for {slug}: {status} - {body}")]
    ApiRejected {
        /// Project slug that was queried.
        slug: String,
        /// HTTP status code.
        status: u16,
        /// Response body (may be truncated).
        body: String,
    },

    /// The Modrinth API request could not be completed.
    #[error("modrinth request failed for {slug}: {reason}")]
    ApiRequest {
        /// Project slug that was queried.
        slug: String,
        /// Underlying transport error.
        reason: String,
    },

    /// No release or beta version matches the game version and loader.
    #[error("no compatible release or beta version for {slug} (MC {game_version}, loader {loader})")]
    NoCompatibleVersion {
        /// Project slug that was queried.
        slug: String,
        /// Requested Minecraft version.
        game_version: String,
        /// Requested mod loader.
        loader: String,
    },

    /// Downloading a jar file failed.
    #[error("download failed for {url}: {reason}")]
    Download {
        /// File URL that was requested.
        url: String,
        /// Underlying transport error.
        reason: String,
    },

    /// JSON parsing failed (API response or overrides file).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (directory scan, file write, delete).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpdaterError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | All mods up to date          |
    /// | 1    | One or more mods failed      |
    /// | 2    | Fatal configuration error    |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exits_with_two() {
        let err = UpdaterError::Config("missing mods_dir".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn per_mod_errors_exit_with_one() {
        let err = UpdaterError::NoCompatibleVersion {
            slug: "sodium".to_owned(),
            game_version: "1.20.1".to_owned(),
            loader: "fabric".to_owned(),
        };
        assert_eq!(err.exit_code(), 1);

        let err = UpdaterError::ApiRejected {
            slug: "sodium".to_owned(),
            status: 404,
            body: "not found".to_owned(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn display_includes_context() {
        let err = UpdaterError::NoCompatibleVersion {
            slug: "lithium".to_owned(),
            game_version: "1.21".to_owned(),
            loader: "fabric".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains("lithium"));
        assert!(message.contains("MC 1.21"));
        assert!(message.contains("fabric"));
    }
}
