//! Streaming MD5 computation for files referenced by a manifest.
//!
//! Files are read in fixed-size chunks so memory use does not grow with file
//! size. The chunk size never changes the resulting digest.

use crate::md5_digest::Md5Digest;
use camino::Utf8Path;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};

/// Chunk size used by [`compute_md5`].
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Compute the MD5 digest of the file at `path`.
///
/// # Errors
///
/// Returns the I/O error unchanged if the file cannot be opened or read.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use hathi_checksum::digest::compute_md5;
///
/// let digest = compute_md5(Utf8Path::new("page0001.jp2"))?;
/// println!("{digest}");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn compute_md5(path: &Utf8Path) -> io::Result<Md5Digest> {
    compute_md5_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
}

/// Compute the MD5 digest of the file at `path`, reading `chunk_size` bytes
/// at a time.
///
/// # Errors
///
/// Returns the I/O error unchanged if the file cannot be opened or read.
pub fn compute_md5_with_chunk_size(path: &Utf8Path, chunk_size: usize) -> io::Result<Md5Digest> {
    let file = File::open(path)?;
    md5_of_reader(file, chunk_size)
}

/// Compute the MD5 digest of everything `reader` yields.
///
/// A `chunk_size` of zero is treated as one byte.
///
/// # Errors
///
/// Returns the first read error other than [`io::ErrorKind::Interrupted`].
pub fn md5_of_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<Md5Digest> {
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Md5Digest::from_output(&hasher.finalize()))
}
