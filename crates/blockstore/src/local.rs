use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::BlockStoreError;
use crate::{BlockPath, BlockStore, BlockStoreResult};

/// A [`BlockStore`] backed by the local filesystem.
///
/// Grounded on the same atomic-publish discipline the columnar writer uses
/// for its own files (`sstable::writer`): write to a temp file, `sync_all`,
/// rename over the destination, then best-effort `fsync` the parent
/// directory so the rename itself survives a crash on filesystems (ext4,
/// XFS) that don't journal directory entries.
pub struct LocalBlockStore {
    root: PathBuf,
}

impl LocalBlockStore {
    pub fn new(root: impl AsRef<Path>) -> BlockStoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // `path` is always forward-slash separated by callers; split and
        // rejoin through `Path::join` so this also works on Windows.
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }
}

impl BlockStore for LocalBlockStore {
    fn put(&self, path: &str, bytes: &[u8]) -> BlockStoreResult<()> {
        let dest = self.resolve(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = dest.with_extension("tmp");
        {
            let mut f = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp)?;
            f.write_all(bytes)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &dest)?;
        if let Some(parent) = dest.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn get(&self, path: &str) -> BlockStoreResult<Vec<u8>> {
        let dest = self.resolve(path);
        fs::read(&dest).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlockStoreError::NotFound(path.to_string())
            } else {
                BlockStoreError::Io(e)
            }
        })
    }

    fn list(&self, prefix: &str) -> BlockStoreResult<Vec<BlockPath>> {
        let mut out = Vec::new();
        let base = self.resolve(prefix);
        let (scan_dir, name_prefix) = if base.is_dir() {
            (base.clone(), String::new())
        } else {
            (
                base.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                base.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            )
        };
        if !scan_dir.exists() {
            return Ok(out);
        }
        Self::walk(&self.root, &scan_dir, &name_prefix, &mut out)?;
        Ok(out)
    }

    fn delete(&self, path: &str) -> BlockStoreResult<()> {
        let dest = self.resolve(path);
        match fs::remove_file(&dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlockStoreError::Io(e)),
        }
    }
}

impl LocalBlockStore {
    fn walk(root: &Path, dir: &Path, name_prefix: &str, out: &mut Vec<BlockPath>) -> BlockStoreResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::walk(root, &path, "", out)?;
                continue;
            }
            if !name_prefix.is_empty() {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                if !name.starts_with(name_prefix) {
                    continue;
                }
            }
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let rel_str = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
            out.push(rel_str);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlockStore::new(dir.path()).unwrap();
        store.put("tables/t1/file-1.sst", b"hello").unwrap();
        assert_eq!(store.get("tables/t1/file-1.sst").unwrap(), b"hello");
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlockStore::new(dir.path()).unwrap();
        let err = store.get("nope").unwrap_err();
        assert!(matches!(err, BlockStoreError::NotFound(_)));
    }

    #[test]
    fn delete_missing_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlockStore::new(dir.path()).unwrap();
        store.delete("nope").unwrap();
    }

    #[test]
    fn list_returns_prefixed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlockStore::new(dir.path()).unwrap();
        store.put("tables/t1/a.sst", b"1").unwrap();
        store.put("tables/t1/b.sst", b"2").unwrap();
        store.put("tables/t2/c.sst", b"3").unwrap();
        let mut listed = store.list("tables/t1").unwrap();
        listed.sort();
        assert_eq!(listed, vec!["tables/t1/a.sst", "tables/t1/b.sst"]);
    }

    #[test]
    fn put_overwrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlockStore::new(dir.path()).unwrap();
        store.put("x", b"first").unwrap();
        store.put("x", b"second").unwrap();
        assert_eq!(store.get("x").unwrap(), b"second");
    }
}
