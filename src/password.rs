//! Password sources.
//!
//! Everything that needs a password asks a [`PasswordSource`], so the CLI can
//! prompt on the terminal while tests and automation supply fixed values.
//! Passwords are held in [`Zeroizing`] buffers and never logged.

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Password file looked up inside the key directory when none is given.
pub const PASSWORD_FILE_NAME: &str = "password.txt";

/// Supplies passwords on request.
pub trait PasswordSource {
    /// Returns the next password. `prompt` is shown to interactive users.
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>>;
}

/// Reads a new password twice and checks that both entries match.
///
/// Fails with `PasswordMismatch` before any key derivation happens.
pub fn read_new_password(source: &mut dyn PasswordSource) -> Result<Zeroizing<String>> {
    let password = source.read_password("Enter wallet password: ")?;
    let confirmation = source.read_password("Confirm wallet password: ")?;

    if *password != *confirmation {
        return Err(Error::PasswordMismatch);
    }
    Ok(password)
}

/// Prompts on the terminal without echoing input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptPassword;

impl PasswordSource for PromptPassword {
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        let password = Zeroizing::new(rpassword::prompt_password(prompt)?);
        if password.is_empty() {
            return Err(Error::EmptyPassword);
        }
        Ok(password)
    }
}

/// Reads the password from a file, e.g. `keystore/password.txt`.
///
/// A single trailing line ending is stripped. The file is re-read on every
/// request, so confirmation always matches.
#[derive(Debug, Clone)]
pub struct FilePassword {
    path: PathBuf,
}

impl FilePassword {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PasswordSource for FilePassword {
    fn read_password(&mut self, _prompt: &str) -> Result<Zeroizing<String>> {
        let content = Zeroizing::new(fs::read_to_string(&self.path)?);
        let trimmed = content
            .strip_suffix("\r\n")
            .or_else(|| content.strip_suffix('\n'))
            .unwrap_or(content.as_str());

        if trimmed.is_empty() {
            return Err(Error::EmptyPassword);
        }
        Ok(Zeroizing::new(trimmed.to_string()))
    }
}

/// Returns scripted answers in order; the last one repeats once exhausted.
#[derive(Debug, Clone)]
pub struct FixedPassword {
    answers: Vec<String>,
    next: usize,
}

impl FixedPassword {
    /// Always answers with `password`.
    pub fn new(password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self::sequence([password])
    }

    /// Answers with each entry of `answers` in turn.
    pub fn sequence<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl PasswordSource for FixedPassword {
    fn read_password(&mut self, _prompt: &str) -> Result<Zeroizing<String>> {
        let index = self.next.min(self.answers.len().saturating_sub(1));
        let answer = self.answers.get(index).ok_or(Error::EmptyPassword)?;
        self.next += 1;
        Ok(Zeroizing::new(answer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_match() {
        let mut source = FixedPassword::new("hunter22");
        let password = read_new_password(&mut source).unwrap();
        assert_eq!(password.as_str(), "hunter22");
    }

    #[test]
    fn test_confirmation_mismatch() {
        let mut source = FixedPassword::sequence(["first", "second"]);
        assert!(matches!(
            read_new_password(&mut source),
            Err(Error::PasswordMismatch)
        ));
    }

    #[test]
    fn test_sequence_repeats_last() {
        let mut source = FixedPassword::sequence(["a", "b"]);
        assert_eq!(source.read_password("").unwrap().as_str(), "a");
        assert_eq!(source.read_password("").unwrap().as_str(), "b");
        assert_eq!(source.read_password("").unwrap().as_str(), "b");
    }

    #[test]
    fn test_empty_sequence() {
        let mut source = FixedPassword::sequence(Vec::<String>::new());
        assert!(matches!(
            source.read_password(""),
            Err(Error::EmptyPassword)
        ));
    }

    #[test]
    fn test_file_password_strips_newline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("password.txt");
        fs::write(&path, "s3cret pass\n").unwrap();

        let mut source = FilePassword::new(&path);
        assert_eq!(source.read_password("").unwrap().as_str(), "s3cret pass");
        assert!(read_new_password(&mut source).is_ok());
    }

    #[test]
    fn test_file_password_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("password.txt");
        fs::write(&path, "\n").unwrap();

        let mut source = FilePassword::new(&path);
        assert!(matches!(
            source.read_password(""),
            Err(Error::EmptyPassword)
        ));
    }

    #[test]
    fn test_file_password_missing_is_io() {
        let mut source = FilePassword::new("/nonexistent/password.txt");
        assert!(matches!(source.read_password(""), Err(Error::Io(_))));
    }
}
