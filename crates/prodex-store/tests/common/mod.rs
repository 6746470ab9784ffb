use prodex_store::SqliteComponentRepo;
use std::path::PathBuf;
use tempfile::TempDir;

/// Path of a file under tests/fixtures
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Repository in a fresh temporary directory; keep the TempDir alive
#[allow(dead_code)]
pub fn temp_repo() -> (TempDir, SqliteComponentRepo) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let repo = SqliteComponentRepo::open(dir.path().join("components.db"))
        .expect("Failed to open repository");
    (dir, repo)
}
