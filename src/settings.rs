// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fmt, path::PathBuf};

use serde::Deserialize;
use zeroize::Zeroize;

use crate::error::PushError;

/// Configuration for token-based APNs authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct ApnsSettings {
    pub key_id: String,
    pub team_id: String,
    pub private_key_path: PathBuf,
}

impl ApnsSettings {
    /// Read the private key container from disk and bundle it with the
    /// identifiers into a [`Credentials`] set.
    pub fn load(&self) -> Result<Credentials, PushError> {
        let private_key = std::fs::read(&self.private_key_path).map_err(|error| {
            PushError::InvalidKey(format!(
                "could not read key file {}: {error}",
                self.private_key_path.display()
            ))
        })?;
        Ok(Credentials {
            team_id: self.team_id.clone(),
            key_id: self.key_id.clone(),
            private_key,
        })
    }
}

/// Provider credentials for one send: team identifier, key identifier and
/// the PEM bytes of the `.p8` key container. Loaded fresh per call; the key
/// bytes are zeroized on drop.
#[derive(Clone)]
pub struct Credentials {
    pub team_id: String,
    pub key_id: String,
    pub private_key: Vec<u8>,
}

impl Credentials {
    pub fn new(
        team_id: impl Into<String>,
        key_id: impl Into<String>,
        private_key: Vec<u8>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            key_id: key_id.into(),
            private_key,
        }
    }
}

// Key material must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_key_material() {
        let credentials = Credentials::new("TEAM123456", "KEY1234567", b"secret scalar".to_vec());
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("TEAM123456"));
        assert!(rendered.contains("KEY1234567"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn loading_missing_key_file_is_invalid_key() {
        let settings = ApnsSettings {
            key_id: "KEY1234567".to_owned(),
            team_id: "TEAM123456".to_owned(),
            private_key_path: PathBuf::from("/nonexistent/AuthKey_KEY1234567.p8"),
        };
        assert!(matches!(settings.load(), Err(PushError::InvalidKey(_))));
    }
}
