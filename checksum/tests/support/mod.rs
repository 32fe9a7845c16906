//! Shared helpers for building package trees in integration tests.

use camino::{Utf8Path, Utf8PathBuf};
use hathi_checksum::digest::md5_of_reader;
use hathi_checksum::manifest::MANIFEST_FILE_NAME;
use std::fs;
use tempfile::TempDir;

/// A digest that never matches real content.
pub const STALE_DIGEST: &str = "00000000000000000000000000000000";

/// A temporary root holding a single package directory named `pkg`.
pub struct PackageTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl PackageTree {
    /// Create an empty package directory under a fresh temporary root.
    pub fn create() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8 temp path");
        fs::create_dir_all(root.join("pkg")).expect("create package dir");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn package(&self) -> Utf8PathBuf {
        self.root.join("pkg")
    }

    pub fn manifest(&self) -> Utf8PathBuf {
        self.package().join(MANIFEST_FILE_NAME)
    }

    /// Write a content file into the package.
    pub fn write_file(&self, name: &str, contents: &[u8]) {
        fs::write(self.package().join(name), contents).expect("write package file");
    }

    /// Write the manifest from `(digest, name)` pairs.
    pub fn write_manifest(&self, entries: &[(&str, &str)]) {
        let text: String = entries
            .iter()
            .map(|(digest, name)| format!("{digest} *{name}\n"))
            .collect();
        fs::write(self.manifest(), text).expect("write manifest");
    }

    pub fn manifest_bytes(&self) -> Vec<u8> {
        fs::read(self.manifest()).expect("read manifest")
    }
}

/// MD5 of an in-memory buffer as lower-case hex.
pub fn md5_hex(contents: &[u8]) -> String {
    md5_of_reader(contents, 8192)
        .expect("hash in-memory buffer")
        .to_string()
}
