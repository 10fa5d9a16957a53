use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use super::{DirEntry, FileSystem, FileSystemResult};

#[derive(Default, Debug, Clone)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn create_dir<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
    {
        tokio::fs::create_dir(path).await.map_err(Into::into)
    }

    async fn create_dir_all<P>(&self, path: P) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
    {
        tokio::fs::create_dir_all(path).await.map_err(Into::into)
    }

    async fn read<P>(&self, path: P) -> FileSystemResult<Vec<u8>>
    where
        P: AsRef<Path> + Send,
    {
        tokio::fs::read(path).await.map_err(Into::into)
    }

    async fn write<P, C>(&self, path: P, contents: C) -> FileSystemResult<()>
    where
        P: AsRef<Path> + Send,
        C: AsRef<[u8]> + Send,
    {
        tokio::fs::write(path, contents).await.map_err(Into::into)
    }

    async fn list_dir<P>(&self, path: P) -> FileSystemResult<Vec<DirEntry>>
    where
        P: AsRef<Path> + Send,
    {
        let mut read_dir = tokio::fs::read_dir(path).await?;
        let mut entries = vec![];

        while let Some(entry) = read_dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // follows symlinks, a linked instance directory still counts
            let is_dir = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_dir(),
                Err(e) => {
                    warn!("can't stat {}, listing it as a file: {e}", entry.path().display());
                    false
                },
            };
            entries.push(DirEntry { name, is_dir });
        }

        entries.sort();
        Ok(entries)
    }

    async fn exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path> + Send,
    {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn setup() -> String {
        let test_dir = format!("/tmp/unit_test_{}", Uuid::new_v4());
        std::fs::create_dir(&test_dir).unwrap();
        test_dir
    }

    fn teardown(test_dir: String) {
        std::fs::remove_dir_all(test_dir).unwrap();
    }

    #[tokio::test]
    async fn create_dir_should_create_a_new_directory_at_path() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        let new_dir = format!("{test_dir}/gaia-node-101");
        fs.create_dir(&new_dir).await.unwrap();

        let new_dir_path = Path::new(&new_dir);
        assert!(new_dir_path.exists() && new_dir_path.is_dir());
        teardown(test_dir);
    }

    #[tokio::test]
    async fn create_dir_should_bubble_up_error_if_directory_already_exists() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        let new_dir = format!("{test_dir}/gaia-node-101");
        // intentionally create the dir before calling function to force error
        std::fs::create_dir(&new_dir).unwrap();
        let err = fs.create_dir(&new_dir).await.unwrap_err();

        assert_eq!(err.to_string(), "File exists (os error 17)");
        teardown(test_dir);
    }

    #[tokio::test]
    async fn create_dir_all_should_create_missing_ancestors() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        let new_dir = format!("{test_dir}/home/gaia-node-info");
        fs.create_dir_all(&new_dir).await.unwrap();
        // calling it again on an existing tree is fine
        fs.create_dir_all(&new_dir).await.unwrap();

        assert!(Path::new(&new_dir).is_dir());
        teardown(test_dir);
    }

    #[tokio::test]
    async fn write_then_read_should_return_contents() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        let file_path = format!("{test_dir}/node_info_101.txt");
        fs.write(&file_path, b"Node ID: 0xabc\n\xff").await.unwrap();

        assert_eq!(fs.read(&file_path).await.unwrap(), b"Node ID: 0xabc\n\xff");
        teardown(test_dir);
    }

    #[tokio::test]
    async fn read_should_bubble_up_error_if_file_is_missing() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        let err = fs
            .read(format!("{test_dir}/missing"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No such file or directory (os error 2)");
        teardown(test_dir);
    }

    #[tokio::test]
    async fn list_dir_should_return_sorted_entries_flagging_directories() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        std::fs::create_dir(format!("{test_dir}/gaia-node-102")).unwrap();
        std::fs::create_dir(format!("{test_dir}/gaia-node-101")).unwrap();
        std::fs::write(format!("{test_dir}/notes.txt"), "x").unwrap();

        let entries = fs.list_dir(&test_dir).await.unwrap();

        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "gaia-node-101".into(),
                    is_dir: true
                },
                DirEntry {
                    name: "gaia-node-102".into(),
                    is_dir: true
                },
                DirEntry {
                    name: "notes.txt".into(),
                    is_dir: false
                },
            ]
        );
        teardown(test_dir);
    }

    #[tokio::test]
    async fn list_dir_should_keep_dangling_symlinks_as_files() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        std::os::unix::fs::symlink(
            format!("{test_dir}/missing"),
            format!("{test_dir}/gaia-node-101"),
        )
        .unwrap();

        let entries = fs.list_dir(&test_dir).await.unwrap();

        assert_eq!(
            entries,
            vec![DirEntry {
                name: "gaia-node-101".into(),
                is_dir: false
            }]
        );
        teardown(test_dir);
    }

    #[tokio::test]
    async fn exists_should_reflect_the_filesystem() {
        let test_dir = setup();
        let fs = LocalFileSystem;

        assert!(fs.exists(&test_dir).await);
        assert!(!fs.exists(format!("{test_dir}/nope")).await);
        teardown(test_dir);
    }
}
