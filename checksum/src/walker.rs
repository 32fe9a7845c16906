//! Package discovery below a root directory.
//!
//! A package is any directory that directly contains a `checksum.md5`
//! manifest. The walker is a trait so the scan can be driven from a fixed
//! list of directories in tests or by callers with their own discovery
//! rules.

use crate::error::{ChecksumError, Result};
use crate::manifest::MANIFEST_FILE_NAME;
use camino::{Utf8Path, Utf8PathBuf};

/// Enumerates package directories below a root.
pub trait PackageWalker {
    /// Returns every package directory under `root`, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read.
    fn packages(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>>;
}

/// Recursive walker over the real filesystem.
///
/// Directories are visited in lexical order, the root included. Symbolic
/// links to directories are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryWalker;

impl PackageWalker for DirectoryWalker {
    fn packages(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        if !root.is_dir() {
            return Err(ChecksumError::WalkFailed {
                path: root.to_owned(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a directory",
                ),
            });
        }
        let mut packages = Vec::new();
        collect_packages(root, &mut packages)?;
        Ok(packages)
    }
}

fn collect_packages(dir: &Utf8Path, packages: &mut Vec<Utf8PathBuf>) -> Result<()> {
    let walk_failed = |source| ChecksumError::WalkFailed {
        path: dir.to_owned(),
        source,
    };

    let mut subdirs = Vec::new();
    let mut has_manifest = false;
    for entry in dir.read_dir_utf8().map_err(walk_failed)? {
        let entry = entry.map_err(walk_failed)?;
        let file_type = entry.file_type().map_err(walk_failed)?;
        if file_type.is_dir() {
            subdirs.push(entry.path().to_owned());
        } else if file_type.is_file() && entry.file_name() == MANIFEST_FILE_NAME {
            has_manifest = true;
        }
    }

    if has_manifest {
        packages.push(dir.to_owned());
    }

    subdirs.sort();
    for subdir in subdirs {
        collect_packages(&subdir, packages)?;
    }
    Ok(())
}

/// Walker returning a fixed list of package directories.
#[derive(Debug, Clone, Default)]
pub struct FixedPackages(pub Vec<Utf8PathBuf>);

impl PackageWalker for FixedPackages {
    fn packages(&self, _root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn tree() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8");
        for package in ["b_pkg", "a_pkg", "nested/c_pkg"] {
            let path = root.join(package);
            fs::create_dir_all(&path).expect("mkdir");
            fs::write(path.join(MANIFEST_FILE_NAME), "").expect("manifest");
        }
        fs::create_dir_all(root.join("not_a_package")).expect("mkdir");
        fs::write(root.join("not_a_package/readme.txt"), "x").expect("file");
        (dir, root)
    }

    #[rstest]
    fn finds_packages_in_lexical_order(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;
        let packages = DirectoryWalker.packages(&root).expect("walk succeeds");
        assert_eq!(
            packages,
            vec![
                root.join("a_pkg"),
                root.join("b_pkg"),
                root.join("nested/c_pkg"),
            ]
        );
    }

    #[rstest]
    fn root_with_manifest_is_a_package(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;
        fs::write(root.join(MANIFEST_FILE_NAME), "").expect("manifest");
        let packages = DirectoryWalker.packages(&root).expect("walk succeeds");
        assert_eq!(packages.first(), Some(&root));
    }

    #[test]
    fn missing_root_fails() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().join("absent")).expect("utf8");
        let err = DirectoryWalker.packages(&root).expect_err("missing root");
        assert!(matches!(err, ChecksumError::WalkFailed { .. }));
    }

    #[cfg(unix)]
    #[rstest]
    fn symlinked_directories_are_not_followed(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;
        let outside = TempDir::new().expect("temp dir");
        let outside_pkg = Utf8PathBuf::try_from(outside.path().join("linked_pkg")).expect("utf8");
        fs::create_dir_all(&outside_pkg).expect("mkdir");
        fs::write(outside_pkg.join(MANIFEST_FILE_NAME), "").expect("manifest");
        std::os::unix::fs::symlink(&outside_pkg, root.join("link_to_pkg")).expect("symlink");
        std::os::unix::fs::symlink(root.join("a_pkg"), root.join("z_alias")).expect("symlink");

        let packages = DirectoryWalker.packages(&root).expect("walk succeeds");

        assert_eq!(
            packages,
            vec![
                root.join("a_pkg"),
                root.join("b_pkg"),
                root.join("nested/c_pkg"),
            ]
        );
    }
}
