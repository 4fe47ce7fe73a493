//! Flat-file persistence for the payment gate
//!
//! Both stores keep one token per line. Files are read once at startup and
//! only ever appended to afterwards.

pub mod ledger;
pub mod verified;

pub use ledger::TransactionLedger;
pub use verified::VerifiedUsers;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or appending to a backing file failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads a newline-delimited token file into a set.
///
/// Surrounding whitespace is trimmed and blank lines are skipped.
async fn read_tokens(path: &Path) -> Result<HashSet<String>, StorageError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Same as [`read_tokens`], but a missing file yields an empty set.
async fn read_tokens_or_empty(path: &Path) -> Result<HashSet<String>, StorageError> {
    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashSet::new()),
        _ => read_tokens(path).await,
    }
}

/// Appends a single token line, creating the file if needed.
///
/// Hand-edited files may lack a trailing newline; one is inserted first so the
/// new token never merges with the last existing line.
async fn append_token(path: &Path, token: &str) -> Result<(), StorageError> {
    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;

    let line = if ends_without_newline(&mut file)
        .await
        .map_err(|e| StorageError::io(path, e))?
    {
        format!("\n{token}\n")
    } else {
        format!("{token}\n")
    };

    file.write_all(line.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))
}

/// `true` if the file is non-empty and its last byte is not `\n`.
async fn ends_without_newline(file: &mut tokio::fs::File) -> std::io::Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_tokens_trims_and_skips_blank_lines() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ids.txt");
        tokio::fs::write(&path, "  TXN1 \n\n\tTXN2\r\n   \n").await?;

        let tokens = read_tokens(&path).await?;
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("TXN1"));
        assert!(tokens.contains("TXN2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_only_when_allowed() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.txt");

        assert!(read_tokens_or_empty(&path).await?.is_empty());
        assert!(matches!(
            read_tokens(&path).await,
            Err(StorageError::Io { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_append_creates_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("used.txt");

        append_token(&path, "A").await?;
        append_token(&path, "B").await?;

        assert_eq!(tokio::fs::read_to_string(&path).await?, "A\nB\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_append_after_missing_trailing_newline() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("used.txt");
        tokio::fs::write(&path, "A").await?;

        append_token(&path, "B").await?;
        append_token(&path, "C").await?;

        assert_eq!(tokio::fs::read_to_string(&path).await?, "A\nB\nC\n");
        Ok(())
    }
}
