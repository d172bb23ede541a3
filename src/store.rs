//! Disk-backed chunk store.
//!
//! Each accepted chunk is persisted as its own `packet<N>` artifact, keyed
//! by sequence number, holding exactly the chunk's true bytes (never the
//! zero padding).  Entries are write-once: a duplicate insert is a no-op.
//! The reassembler drains and deletes the artifacts; if the process dies
//! mid-transfer the leftovers simply remain on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-name prefix of every chunk artifact.
pub const CHUNK_FILE_PREFIX: &str = "packet";

/// Write-once mapping from sequence number to chunk bytes.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Store rooted at `dir` (the directory must already exist).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact backing chunk `seq`.
    pub fn path_for(&self, seq: u32) -> PathBuf {
        self.dir.join(format!("{CHUNK_FILE_PREFIX}{seq}"))
    }

    /// Persist chunk `seq`.  If the artifact already exists the call is a
    /// no-op and the original bytes are kept.
    pub fn insert(&self, seq: u32, bytes: &[u8]) -> io::Result<()> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_for(seq))
        {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read chunk `seq` back, or `None` when it was never stored.
    pub fn read(&self, seq: u32) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(seq)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete the artifact backing chunk `seq`.
    pub fn remove(&self, seq: u32) -> io::Result<()> {
        fs::remove_file(self.path_for(seq))
    }

    /// `true` when chunk `seq` has been stored.
    pub fn contains(&self, seq: u32) -> bool {
        self.path_for(seq).exists()
    }

    /// Directory the artifacts live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path());

        store.insert(1, b"first chunk").unwrap();
        assert!(store.contains(1));
        assert_eq!(store.read(1).unwrap().unwrap(), b"first chunk");
        assert_eq!(store.read(2).unwrap(), None);
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path());

        store.insert(7, b"original").unwrap();
        store.insert(7, b"retransmitted copy").unwrap();
        assert_eq!(store.read(7).unwrap().unwrap(), b"original");
    }

    #[test]
    fn remove_deletes_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path());

        store.insert(3, b"bytes").unwrap();
        store.remove(3).unwrap();
        assert!(!store.contains(3));
    }

    #[test]
    fn artifacts_are_named_by_sequence_number() {
        let store = ChunkStore::new("/tmp/x");
        assert_eq!(store.path_for(12).file_name().unwrap(), "packet12");
    }
}
