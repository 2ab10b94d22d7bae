use std::path::PathBuf;

use crate::error::TokenkeeperError;
use crate::oauth::token::AuthorizationRecord;

/// Per-profile record files under a single cache directory.
#[derive(Debug, Clone)]
pub struct TokenCache {
    root: PathBuf,
}

impl TokenCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, profile: &str) -> PathBuf {
        self.root.join(format!("{profile}.json"))
    }

    /// `Ok(None)` if no record exists; a malformed record is an error, not a miss.
    pub fn read(&self, profile: &str) -> Result<Option<AuthorizationRecord>, TokenkeeperError> {
        let path = self.path(profile);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(TokenkeeperError::CacheIo { path, source }),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| TokenkeeperError::CacheParse { path, source })
    }

    /// Replace the record for `profile`. The content is fully serialized and
    /// written to a sibling temp file, then renamed over the record.
    pub fn write(&self, profile: &str, record: &AuthorizationRecord) -> Result<(), TokenkeeperError> {
        let path = self.path(profile);
        let data = serde_json::to_string_pretty(record).map_err(|e| TokenkeeperError::CacheIo {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        let tmp = self.root.join(format!(".{profile}.json.tmp"));
        let result = std::fs::create_dir_all(&self.root)
            .and_then(|()| std::fs::write(&tmp, data))
            .and_then(|()| std::fs::rename(&tmp, &path));
        if let Err(source) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(TokenkeeperError::CacheIo { path, source });
        }

        tracing::debug!(profile, path = %path.display(), "Cached token record");
        Ok(())
    }
}
