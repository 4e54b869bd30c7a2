//! Temporary data directories for catalog tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A data directory that is removed when dropped.
pub struct TestDataDir {
    dir: tempfile::TempDir,
}

impl TestDataDir {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("vector_data")
            .tempdir()
            .expect("Failed to create temporary data directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the directory (not created).
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write bytes that are not a valid container under `name`.
    pub fn write_corrupt(&self, name: &str) -> PathBuf {
        let path = self.file(name);
        let mut f = File::create(&path).expect("Failed to create corrupt file");
        let junk: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();
        f.write_all(&junk).expect("Failed to write corrupt file");
        path
    }
}

impl Default for TestDataDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Move a file's modification time `secs` seconds into the future.
///
/// Filesystems with coarse timestamps could otherwise report an unchanged
/// mtime for a file rewritten within the same tick.
pub fn bump_mtime(path: &Path, secs: u64) {
    let f = File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file for mtime update");
    f.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .expect("Failed to set modification time");
}
