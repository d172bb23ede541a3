//! Output-file reassembly.
//!
//! Once every chunk of a transfer is in the [`ChunkStore`], the stored
//! artifacts are concatenated in strict ascending sequence order into the
//! destination file.  Each chunk contributes exactly its true byte length —
//! the final file is byte-for-byte the announced `file_size`, never padded
//! to a chunk boundary.  Artifacts are deleted as they are drained.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::store::ChunkStore;

/// Concatenate chunks `1..=total_chunks` from `store` into `output`.
///
/// Returns the number of bytes written, which always equals the session's
/// `file_size` on success.  A missing chunk is an
/// [`Error::IncompleteTransfer`] — the reception loops only terminate once
/// every chunk is stored, so hitting it means an internal invariant broke.
pub fn reassemble(store: &ChunkStore, session: &Session, output: &Path) -> Result<u64> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let mut written = 0u64;

    for seq in 1..=session.total_chunks {
        let bytes = store
            .read(seq)?
            .ok_or(Error::IncompleteTransfer { seq })?;
        debug_assert_eq!(
            bytes.len(),
            session.chunk_len(seq),
            "stored chunk {seq} has the wrong length"
        );
        writer.write_all(&bytes)?;
        written += bytes.len() as u64;
        store.remove(seq)?;
    }

    writer.flush()?;
    log::info!(
        "reassembled {} chunk(s) into {} ({written} bytes)",
        session.total_chunks,
        output.display()
    );
    Ok(written)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
