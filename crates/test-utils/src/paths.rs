//! Locating optional archive samples and scratch directories.
//!
//! Real NORA3 and ERA5 files are too large to commit. Tests that want one
//! look it up by file name under `$TEST_DATA_DIR`, then `testdata/` at the
//! workspace root, and skip themselves when it is absent.

use std::path::PathBuf;

/// Environment variable naming a directory of sample archive files.
pub const TEST_DATA_ENV: &str = "TEST_DATA_DIR";

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/test-utils -> workspace root
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Full path of a sample archive file such as `fc2020010100_004_fp.nc`,
/// if present.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let from_env = std::env::var_os(TEST_DATA_ENV).map(|dir| PathBuf::from(dir).join(name));
    let in_workspace = workspace_root().join("testdata").join(name);

    from_env
        .into_iter()
        .chain(std::iter::once(in_workspace))
        .find(|path| path.exists())
}

/// Scratch directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create scratch directory")
}

/// Scratch directory whose name starts with `prefix`, e.g. `archive_`.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create scratch directory")
}
