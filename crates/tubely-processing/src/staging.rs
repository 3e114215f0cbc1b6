//! Staging of inbound uploads on local disk.
//!
//! A [`StagedFile`] owns its path through a [`TempPath`] guard, so the file is
//! removed whenever the handle is dropped: on success, on error, on panic, and
//! when the request future is cancelled mid-flight.

use crate::error::ProcessingError;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

const STAGED_PREFIX: &str = "tubely-upload-";

/// Creates staged files in one directory.
#[derive(Debug, Clone)]
pub struct StagingStore {
    dir: PathBuf,
}

impl StagingStore {
    /// Use `dir`, or the OS temp directory when `None`. The directory is
    /// created if missing.
    pub fn new(dir: Option<&Path>) -> io::Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };
        std::fs::create_dir_all(&dir)?;
        let dir = dir.canonicalize()?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `reader` into a fresh temp file, reading at most `limit + 1` bytes.
    ///
    /// Returns [`ProcessingError::TooLarge`] (and leaves nothing behind) when
    /// the stream is longer than `limit`. The returned file is rewound to byte zero.
    pub async fn stage<R>(&self, reader: R, limit: u64) -> Result<StagedFile, ProcessingError>
    where
        R: AsyncRead + Unpin,
    {
        let (file, path) = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(ProcessingError::Staging)?
            .into_parts();
        let mut file = File::from_std(file);

        let mut limited = reader.take(limit.saturating_add(1));
        let copied = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(ProcessingError::Staging)?;

        if copied > limit {
            tracing::debug!(limit, path = %path.display(), "Upload exceeded staging limit");
            return Err(ProcessingError::TooLarge { limit });
        }

        file.flush().await.map_err(ProcessingError::Staging)?;
        file.rewind().await.map_err(ProcessingError::Staging)?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = copied,
            "Upload staged"
        );

        Ok(StagedFile {
            file,
            path,
            len: copied,
        })
    }
}

/// A file on local disk that is deleted when dropped.
#[derive(Debug)]
pub struct StagedFile {
    // Declared before `path` so the handle closes before the file is unlinked.
    file: File,
    path: TempPath,
    len: u64,
}

impl StagedFile {
    /// Take ownership of a file another step produced at `path`.
    ///
    /// The guard is passed in rather than a bare path so callers can establish
    /// ownership before the file exists.
    pub async fn adopt(path: TempPath) -> Result<Self, ProcessingError> {
        let file = File::open(&path).await.map_err(ProcessingError::Read)?;
        let len = file.metadata().await.map_err(ProcessingError::Read)?.len();
        Ok(Self { file, path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn rewind(&mut self) -> Result<(), ProcessingError> {
        self.file
            .rewind()
            .await
            .map(|_| ())
            .map_err(ProcessingError::Read)
    }

    /// Read the whole file from byte zero.
    pub async fn read_all(&mut self) -> Result<Bytes, ProcessingError> {
        self.rewind().await?;
        let mut buf = Vec::with_capacity(self.len as usize);
        self.file
            .read_to_end(&mut buf)
            .await
            .map_err(ProcessingError::Read)?;
        Ok(Bytes::from(buf))
    }

    /// Delete the file now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<(), ProcessingError> {
        let StagedFile { file, path, .. } = self;
        drop(file);
        path.close().map_err(ProcessingError::Staging)
    }
}

/// Read `reader` into memory, failing with [`ProcessingError::TooLarge`] past `limit` bytes.
pub async fn read_bounded<R>(reader: R, limit: u64) -> Result<Bytes, ProcessingError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .await
        .map_err(ProcessingError::Read)?;

    if buf.len() as u64 > limit {
        return Err(ProcessingError::TooLarge { limit });
    }
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staged_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_copies_and_rewinds() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(Some(dir.path())).unwrap();

        let mut staged = store.stage(&b"hello world"[..], 11).await.unwrap();
        assert_eq!(staged.len(), 11);
        assert!(staged.path().starts_with(store.dir()));

        let mut first = [0u8; 5];
        staged.file.read_exact(&mut first).await.unwrap();
        assert_eq!(&first, b"hello");

        assert_eq!(staged.read_all().await.unwrap().as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_rewind_restarts_reads() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(Some(dir.path())).unwrap();
        let mut staged = store.stage(&b"abcdef"[..], 6).await.unwrap();

        let mut head = [0u8; 3];
        staged.file.read_exact(&mut head).await.unwrap();
        staged.rewind().await.unwrap();
        staged.file.read_exact(&mut head).await.unwrap();
        assert_eq!(&head, b"abc");
    }

    #[tokio::test]
    async fn test_stage_over_limit_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(Some(dir.path())).unwrap();

        let err = store.stage(&b"0123456789X"[..], 10).await.unwrap_err();
        assert!(matches!(err, ProcessingError::TooLarge { limit: 10 }));
        assert_eq!(staged_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_and_close_remove_file() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(Some(dir.path())).unwrap();

        let staged = store.stage(&b"abc"[..], 10).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());

        let staged = store.stage(&b"abc"[..], 10).await.unwrap();
        let path = staged.path().to_path_buf();
        staged.close().unwrap();
        assert!(!path.exists());
        assert_eq!(staged_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_adopt_owns_foreign_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("input.processing");
        let guard = TempPath::try_from_path(&out).unwrap();
        std::fs::write(&out, b"normalized").unwrap();

        let mut adopted = StagedFile::adopt(guard).await.unwrap();
        assert_eq!(adopted.len(), 10);
        assert_eq!(adopted.read_all().await.unwrap().as_ref(), b"normalized");
        drop(adopted);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_read_bounded() {
        assert_eq!(read_bounded(&b"png"[..], 3).await.unwrap().as_ref(), b"png");
        assert!(matches!(
            read_bounded(&b"pngx"[..], 3).await,
            Err(ProcessingError::TooLarge { limit: 3 })
        ));
    }
}
