//! Key directory storage.
//!
//! Key files are named `UTC--<timestamp>--<address>` so a directory listing
//! sorts them by creation time, matching go-ethereum's layout.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::EncryptedKeyFile;
use crate::crypto::Address;
use crate::error::{Error, Result};

/// File name prefix of key files.
pub const KEY_FILE_PREFIX: &str = "UTC--";

/// Default key directory, relative to the working directory.
pub const DEFAULT_KEY_DIR: &str = "./keystore";

/// A directory of encrypted key files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDir {
    path: PathBuf,
}

impl KeyDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `file` to a new `UTC--...` file and returns its path.
    ///
    /// The directory is created with mode 0700 and the file with 0600 on
    /// Unix. Existing files are never overwritten.
    pub fn store(&self, file: &EncryptedKeyFile) -> Result<PathBuf> {
        let address = file
            .address()
            .ok_or_else(|| Error::malformed("key file has no address"))?;

        self.ensure_dir()?;
        let path = self.path.join(key_file_name(Utc::now(), &address));
        let json = file.to_json()?;

        write_new_file(&path, |handle| {
            handle.write_all(json.as_bytes())?;
            handle.sync_all()
        })?;

        info!(path = %path.display(), address = %address, "stored key file");
        Ok(path)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.path.exists() {
            fs::create_dir_all(&self.path)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&self.path, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }

    /// Lists key files sorted by name, oldest first.
    ///
    /// A missing directory yields an empty list.
    pub fn key_files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let is_key_file = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(KEY_FILE_PREFIX));
            if is_key_file && entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Reads and parses the key file at `path`.
    pub fn load(&self, path: &Path) -> Result<EncryptedKeyFile> {
        load_key_file(path)
    }

    /// Loads the oldest key file in the directory.
    pub fn load_first(&self) -> Result<(PathBuf, EncryptedKeyFile)> {
        let path = self
            .key_files()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoKeyFile(self.path.clone()))?;
        let file = self.load(&path)?;
        Ok((path, file))
    }

    /// Finds the key file for `address` by its file name.
    pub fn find(&self, address: &Address) -> Result<(PathBuf, EncryptedKeyFile)> {
        let suffix = format!("--{}", address.to_hex());
        let path = self
            .key_files()?
            .into_iter()
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.to_ascii_lowercase().ends_with(&suffix))
            })
            .ok_or_else(|| Error::NoKeyFile(self.path.clone()))?;
        let file = self.load(&path)?;
        Ok((path, file))
    }
}

/// Creates `path` (0600 on Unix, never overwriting) and fills it with `write`.
///
/// A failed write removes the partial file.
fn write_new_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut handle = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            Error::AlreadyExists(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    if let Err(e) = write(&mut handle) {
        drop(handle);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "could not remove partial key file");
        }
        return Err(Error::Io(e));
    }
    Ok(())
}

impl Default for KeyDir {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_DIR)
    }
}

/// Reads and parses a key file from disk.
pub fn load_key_file(path: &Path) -> Result<EncryptedKeyFile> {
    debug!(path = %path.display(), "loading key file");
    let bytes = fs::read(path)?;
    EncryptedKeyFile::from_slice(&bytes)
}

/// `UTC--2006-01-02T15-04-05.000000000Z--<address>`
pub fn key_file_name(created: DateTime<Utc>, address: &Address) -> String {
    format!(
        "{}{}--{}",
        KEY_FILE_PREFIX,
        created.format("%Y-%m-%dT%H-%M-%S%.9fZ"),
        address.to_hex()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::crypto::Keypair;
    use crate::keystore::ScryptParams;

    const TEST_COST: ScryptParams = ScryptParams::new(10, 8, 1);

    fn new_file() -> (Keypair, EncryptedKeyFile) {
        let keypair = Keypair::generate().unwrap();
        let file = EncryptedKeyFile::encrypt(&keypair, "store-test", TEST_COST).unwrap();
        (keypair, file)
    }

    #[test]
    fn test_key_file_name() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let address: Address = "7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(
            key_file_name(created, &address),
            "UTC--2024-03-05T07-08-09.000000000Z--7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_store_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = KeyDir::new(temp_dir.path().join("keystore"));
        let (keypair, file) = new_file();

        let path = dir.store(&file).unwrap();
        assert!(path.exists());

        let (first_path, loaded) = dir.load_first().unwrap();
        assert_eq!(first_path, path);
        assert_eq!(loaded, file);
        assert_eq!(
            loaded.decrypt("store-test").unwrap().address(),
            keypair.address()
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let dir = KeyDir::new(temp_dir.path().join("keystore"));
        let (_, file) = new_file();

        let path = dir.store(&file).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let dir_mode = fs::metadata(dir.path()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_missing_dir_has_no_key_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = KeyDir::new(temp_dir.path().join("absent"));

        assert!(dir.key_files().unwrap().is_empty());
        assert!(matches!(dir.load_first(), Err(Error::NoKeyFile(_))));
    }

    #[test]
    fn test_ignores_other_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = KeyDir::new(temp_dir.path());
        fs::write(temp_dir.path().join("password.txt"), "secret").unwrap();
        fs::create_dir(temp_dir.path().join("UTC--not-a-file")).unwrap();

        assert!(dir.key_files().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_address() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = KeyDir::new(temp_dir.path());
        let (first, first_file) = new_file();
        let (second, second_file) = new_file();
        dir.store(&first_file).unwrap();
        dir.store(&second_file).unwrap();

        let (_, found) = dir.find(second.address()).unwrap();
        assert_eq!(found.address(), Some(*second.address()));
        let (_, found) = dir.find(first.address()).unwrap();
        assert_eq!(found.address(), Some(*first.address()));

        let stranger = Keypair::generate().unwrap();
        assert!(matches!(
            dir.find(stranger.address()),
            Err(Error::NoKeyFile(_))
        ));
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("UTC--partial");

        let result = write_new_file(&path, |handle| {
            handle.write_all(b"{ \"crypto\":")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        });

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!path.exists());
        assert!(KeyDir::new(temp_dir.path()).key_files().unwrap().is_empty());
    }

    #[test]
    fn test_existing_file_not_overwritten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("UTC--taken");
        fs::write(&path, "original").unwrap();

        let result = write_new_file(&path, |handle| handle.write_all(b"replacement"));
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_garbage_file_is_malformed_not_io() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("UTC--garbage");
        fs::write(&path, b"{ truncated").unwrap();

        assert!(matches!(
            load_key_file(&path),
            Err(Error::MalformedKeyFile(_))
        ));
        assert!(matches!(
            load_key_file(&temp_dir.path().join("missing")),
            Err(Error::Io(_))
        ));
    }
}
