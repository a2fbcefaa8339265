use std::io::{Read, Write};
use std::path::Path;

use flate2::{Compression, GzBuilder};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::TransferError;
use crate::types::{FileEntry, HashedFile};

/// Compression level used for both hashing and upload.
pub const GZIP_LEVEL: u32 = 9;

/// OS byte written to the gzip header (3 = Unix), matching zlib's default.
pub const GZIP_OS_UNIX: u8 = 3;

const READ_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// `Write` sink that feeds everything into a SHA-256 hasher.
struct HashWriter(Sha256);

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Streams `path` through a gzip encoder with pinned parameters into `sink`.
///
/// The header carries mtime 0 and no file name, so output depends on the
/// content bytes alone.
fn gzip_into<W: Write>(path: &Path, sink: W) -> Result<W, TransferError> {
    let io_err = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };
    let enc_err = |source| TransferError::Encoding {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(GZIP_OS_UNIX)
        .write(sink, Compression::new(GZIP_LEVEL));

    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n]).map_err(enc_err)?;
    }
    encoder.finish().map_err(enc_err)
}

// ---------------------------------------------------------------------------
// Public helpers
// ---------------------------------------------------------------------------

/// Computes the content digest of a file: lowercase hex SHA-256 of its
/// gzip-compressed bytes.
pub fn content_digest(path: &Path) -> Result<String, TransferError> {
    let HashWriter(hasher) = gzip_into(path, HashWriter(Sha256::new()))?;
    let digest = hex::encode(hasher.finalize());
    trace!(path = %path.display(), %digest, "hashed file");
    Ok(digest)
}

/// Returns the gzip-compressed bytes of a file, exactly as hashed by
/// [`content_digest`].
pub fn compress_file(path: &Path) -> Result<Vec<u8>, TransferError> {
    gzip_into(path, Vec::new())
}

/// Gzip-compresses an in-memory buffer with the pinned parameters.
pub fn compress_bytes(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(GZIP_OS_UNIX)
        .write(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Computes the content digest of an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> std::io::Result<String> {
    let compressed = compress_bytes(data)?;
    Ok(hex::encode(Sha256::digest(&compressed)))
}

/// Hashes every entry once, in input order.
pub fn hash_entries(entries: &[FileEntry]) -> Result<Vec<HashedFile>, TransferError> {
    entries
        .iter()
        .map(|entry| {
            let digest = content_digest(&entry.source_path)?;
            Ok(HashedFile::new(entry.clone(), digest))
        })
        .collect()
}
