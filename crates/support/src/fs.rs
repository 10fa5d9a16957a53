use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub mod in_memory;
pub mod local;

#[derive(Debug, thiserror::Error)]
pub enum FileSystemError {
    #[error("File {0:?} already exists")]
    FileAlreadyExists(PathBuf),
    #[error("Directory {0:?} already exists")]
    DirectoryAlreadyExists(PathBuf),
    #[error("Ancestor {0:?} doesn't exists")]
    AncestorDoesntExists(PathBuf),
    #[error("Ancestor {0:?} is not a directory")]
    AncestorNotDirectory(PathBuf),
    #[error("File {0:?} not found")]
    FileNotFound(PathBuf),
    #[error("File {0:?} is a directory")]
    FileIsDirectory(PathBuf),
    #[error("Directory {0:?} not found")]
    DirectoryNotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type FileSystemResult<T> = Result<T, FileSystemError>;

/// An entry directly under a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[async_trait]
pub trait FileSystem {
    async fn create_dir<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send;

    async fn create_dir_all<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send;

    async fn read<P>(&self, path: P) -> FileSystemResult<Vec<u8>>
    where
        P: AsRef<Path> + Send;

    async fn write<P, C>(&self, path: P, contents: C) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
        C: AsRef<[u8]> + Send;

    /// Entries directly under `path`, sorted by name. Names that are not valid UTF-8 are skipped.
    async fn list_dir<P>(&self, path: P) -> FileSystemResult<Vec<DirEntry>>
    where
        P: AsRef<Path> + Send;

    async fn exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path> + Send;
}
