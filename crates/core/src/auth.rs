//! Password hash file with atomic update; verifies or creates credentials.
//!
//! The module is the only writer of `data/users.json`; a process-level lock
//! serializes writers, mirroring the teacher's single-writer discipline for
//! shared mutable tables (`ConnectionManager`'s internal `HashMap`s).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{MudError, MudResult};

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize, Default)]
struct UsersFile(HashMap<String, String>);

pub struct AuthStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuthStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> MudResult<UsersFile> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| MudError::Data(format!("corrupt users file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UsersFile::default()),
            Err(e) => Err(MudError::Io(e)),
        }
    }

    fn save(&self, file: &UsersFile) -> MudResult<()> {
        let json = serde_json::to_string_pretty(file)
            .map_err(|e| MudError::Data(format!("failed to serialize users file: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp_path)?;
            f.write_all(json.as_bytes())?;
            f.sync_all()?;
        }
        set_owner_only(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Verifies `password` for `username`. Returns `Ok(true)` on match,
    /// `Ok(false)` on a clean mismatch, and `Err` only for genuine I/O or
    /// data corruption.
    pub fn verify(&self, username: &str, password: &str) -> MudResult<bool> {
        let key = username.to_ascii_lowercase();
        let file = self.load()?;
        match file.0.get(&key) {
            Some(hash) => Ok(bcrypt::verify(password, hash).unwrap_or(false)),
            None => Ok(false),
        }
    }

    pub fn exists(&self, username: &str) -> MudResult<bool> {
        let key = username.to_ascii_lowercase();
        Ok(self.load()?.0.contains_key(&key))
    }

    /// Registers a new user. Rejects passwords under 8 characters.
    pub fn register(&self, username: &str, password: &str) -> MudResult<()> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(MudError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().unwrap();
        let mut file = self.load()?;
        let key = username.to_ascii_lowercase();
        if file.0.contains_key(&key) {
            return Err(MudError::Validation("user already exists".to_string()));
        }

        let hash = bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| MudError::Data(format!("hash failure: {e}")))?;
        file.0.insert(key, hash);
        self.save(&file)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> MudResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> MudResult<()> {
    Ok(())
}

/// Validates and sanitizes a proposed username per spec §4.5: 3-20 chars,
/// alphanumeric and underscore only, after stripping control bytes (except
/// tab/newline) and trimming whitespace.
pub fn sanitize_username(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|&c| !c.is_control() || c == '\t' || c == '\n')
        .collect();
    stripped.trim().to_string()
}

pub fn validate_username(username: &str) -> MudResult<()> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(MudError::Validation(
            "username must be 3-20 characters".to_string(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(MudError::Validation(
            "username may only contain letters, numbers, and underscores".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile_like::TempPath;

    mod tempfile_like {
        use std::env;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub struct TempPath(pub PathBuf);

        impl TempPath {
            pub fn new(name: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut p = env::temp_dir();
                p.push(format!("mud-core-test-{name}-{n}-{}.json", std::process::id()));
                TempPath(p)
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[test]
    fn register_then_verify_succeeds() {
        let path = TempPath::new("users");
        let store = AuthStore::new(path.0.clone());
        store.register("Neo", "correct horse battery staple").unwrap();
        assert!(store.verify("neo", "correct horse battery staple").unwrap());
        assert!(!store.verify("neo", "wrong password").unwrap());
    }

    #[test]
    fn register_rejects_short_password() {
        let path = TempPath::new("users2");
        let store = AuthStore::new(path.0.clone());
        let err = store.register("neo", "short").unwrap_err();
        assert!(matches!(err, MudError::Validation(_)));
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("neo_1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn sanitize_strips_control_bytes_and_trims() {
        assert_eq!(sanitize_username("  neo\x07  "), "neo");
    }
}
