use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DirEntry, FileSystem, FileSystemError, FileSystemResult};

#[derive(Debug, Clone, PartialEq)]
pub enum InMemoryFile {
    File(Vec<u8>),
    Directory,
}

/// Filesystem double keeping every path in a map; used to drive provisioning in tests.
#[derive(Default, Debug, Clone)]
pub struct InMemoryFileSystem {
    files: Arc<RwLock<BTreeMap<PathBuf, InMemoryFile>>>,
}

impl InMemoryFileSystem {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, InMemoryFile)>,
        P: Into<PathBuf>,
    {
        Self {
            files: Arc::new(RwLock::new(
                files.into_iter().map(|(p, f)| (p.into(), f)).collect(),
            )),
        }
    }

    /// Filesystem holding `dirs` (and every ancestor of them) as directories.
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut files = BTreeMap::new();
        for dir in dirs {
            for ancestor in dir.as_ref().ancestors() {
                if !ancestor.as_os_str().is_empty() {
                    files.insert(ancestor.to_path_buf(), InMemoryFile::Directory);
                }
            }
        }

        Self {
            files: Arc::new(RwLock::new(files)),
        }
    }

    pub async fn get(&self, path: impl AsRef<Path>) -> Option<InMemoryFile> {
        self.files.read().await.get(path.as_ref()).cloned()
    }

    pub async fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.get(path).await, Some(InMemoryFile::Directory))
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

fn check_ancestors(
    files: &BTreeMap<PathBuf, InMemoryFile>,
    path: &Path,
) -> FileSystemResult<()> {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            continue;
        }

        match files.get(ancestor) {
            Some(InMemoryFile::Directory) => {},
            Some(InMemoryFile::File(_)) => {
                return Err(FileSystemError::AncestorNotDirectory(ancestor.to_owned()))
            },
            None => return Err(FileSystemError::AncestorDoesntExists(ancestor.to_owned())),
        }
    }

    Ok(())
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    async fn create_dir<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();
        let mut files = self.files.write().await;

        match files.get(path) {
            Some(InMemoryFile::File(_)) => {
                return Err(FileSystemError::FileAlreadyExists(path.to_owned()))
            },
            Some(InMemoryFile::Directory) => {
                return Err(FileSystemError::DirectoryAlreadyExists(path.to_owned()))
            },
            None => {},
        }

        check_ancestors(&files, path)?;
        files.insert(path.to_owned(), InMemoryFile::Directory);

        Ok(())
    }

    async fn create_dir_all<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();
        let mut files = self.files.write().await;
        let mut ancestors = path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .collect::<Vec<&Path>>();
        ancestors.reverse();

        for ancestor in ancestors {
            match files.get(ancestor) {
                Some(InMemoryFile::Directory) => continue,
                Some(InMemoryFile::File(_)) => {
                    return Err(FileSystemError::AncestorNotDirectory(ancestor.to_owned()))
                },
                None => {
                    files.insert(ancestor.to_owned(), InMemoryFile::Directory);
                },
            }
        }

        Ok(())
    }

    async fn read<P>(&self, path: P) -> FileSystemResult<Vec<u8>>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();

        match self.files.read().await.get(path) {
            Some(InMemoryFile::File(content)) => Ok(content.clone()),
            Some(InMemoryFile::Directory) => {
                Err(FileSystemError::FileIsDirectory(path.to_owned()))
            },
            None => Err(FileSystemError::FileNotFound(path.to_owned())),
        }
    }

    async fn write<P, C>(&self, path: P, contents: C) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
        C: AsRef<[u8]> + Send,
    {
        let path = path.as_ref();
        let mut files = self.files.write().await;

        check_ancestors(&files, path)?;

        if let Some(InMemoryFile::Directory) = files.get(path) {
            return Err(FileSystemError::FileIsDirectory(path.to_owned()));
        }

        files.insert(
            path.to_owned(),
            InMemoryFile::File(contents.as_ref().to_vec()),
        );

        Ok(())
    }

    async fn list_dir<P>(&self, path: P) -> FileSystemResult<Vec<DirEntry>>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();
        let files = self.files.read().await;

        match files.get(path) {
            Some(InMemoryFile::Directory) => {},
            Some(InMemoryFile::File(_)) => {
                return Err(FileSystemError::AncestorNotDirectory(path.to_owned()))
            },
            None => return Err(FileSystemError::DirectoryNotFound(path.to_owned())),
        }

        let mut entries = files
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, file)| {
                let name = child.file_name()?.to_str()?.to_string();
                Some(DirEntry {
                    name,
                    is_dir: matches!(file, InMemoryFile::Directory),
                })
            })
            .collect::<Vec<_>>();

        entries.sort();
        Ok(entries)
    }

    async fn exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path> + Send,
    {
        self.files.read().await.contains_key(path.as_ref())
    }
}
