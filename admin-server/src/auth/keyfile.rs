//! On-disk secret key material
//!
//! A JSON file `{private_key, aes_key}` (both base64), written with mode
//! 0600. When the file is absent new key material is generated and persisted,
//! so first boot on a clean host is self-contained.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shared::{AppError, ErrorCode};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct KeyFile {
    private_key: String,
    aes_key: String,
}

/// Decoded key material
pub struct KeyMaterial {
    pub private_key: Vec<u8>,
    pub aes_key: Vec<u8>,
}

fn config_err(msg: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::ConfigError, msg)
}

/// Load the key file, generating and persisting one when absent
pub fn load_or_generate(path: &Path) -> Result<KeyMaterial, AppError> {
    if path.exists() {
        return load(path);
    }

    let mut rng = rand::thread_rng();
    let mut private_key = vec![0u8; 32];
    let mut aes_key = vec![0u8; 32];
    rng.fill_bytes(&mut private_key);
    rng.fill_bytes(&mut aes_key);

    let file = KeyFile {
        private_key: BASE64.encode(&private_key),
        aes_key: BASE64.encode(&aes_key),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| config_err(format!("encode key file: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| config_err(format!("create key dir: {e}")))?;
    }
    std::fs::write(path, json).map_err(|e| config_err(format!("write key file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| config_err(format!("chmod key file: {e}")))?;
    }

    tracing::info!(path = %path.display(), "Generated new secret key file");
    Ok(KeyMaterial {
        private_key,
        aes_key,
    })
}

fn load(path: &Path) -> Result<KeyMaterial, AppError> {
    let json =
        std::fs::read_to_string(path).map_err(|e| config_err(format!("read key file: {e}")))?;
    let file: KeyFile =
        serde_json::from_str(&json).map_err(|e| config_err(format!("parse key file: {e}")))?;
    Ok(KeyMaterial {
        private_key: BASE64
            .decode(&file.private_key)
            .map_err(|e| config_err(format!("decode private_key: {e}")))?,
        aes_key: BASE64
            .decode(&file.aes_key)
            .map_err(|e| config_err(format!("decode aes_key: {e}")))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_load() {
        let dir = std::env::temp_dir().join(format!("keyfile-test-{}", std::process::id()));
        let path = dir.join("secret.json");
        let _ = std::fs::remove_file(&path);

        let generated = load_or_generate(&path).unwrap();
        assert_eq!(generated.aes_key.len(), 32);
        assert!(path.exists());

        let loaded = load_or_generate(&path).unwrap();
        assert_eq!(loaded.aes_key, generated.aes_key);
        assert_eq!(loaded.private_key, generated.private_key);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
