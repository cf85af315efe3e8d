//! Per-account storage directories.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::system::types::StorageError;

/// Storage directory for an account under `root`.
pub fn storage_path(root: &Path, filesystem_identifier: &str) -> PathBuf {
	root.join(filesystem_identifier)
}

/// Create `path` and its parents if missing, then confirm it is a writable directory.
pub fn ensure_path(path: &Path) -> Result<(), StorageError> {
	fs::create_dir_all(path)?;

	let metadata = fs::metadata(path)?;
	if !metadata.is_dir() || metadata.permissions().readonly() {
		return Err(StorageError::NotWritable(path.display().to_string()));
	}
	Ok(())
}

/// Recursively delete `path`. Failures are logged and otherwise ignored.
pub fn delete_recursively(path: &Path) {
	let result = if path.is_dir() {
		fs::remove_dir_all(path)
	} else {
		fs::remove_file(path)
	};

	match result {
		Ok(()) => info!("Deleted {}", path.display()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => {}
		Err(e) => error!("Failed to delete {}: {}", path.display(), e),
	}
}

/// Delete every entry under `root` except the exempt paths.
///
/// # Arguments
/// * `root` - Directory holding the per-account storage directories.
/// * `exempt` - Storage paths of sessions that must survive.
pub fn wipe_all<'a>(root: &Path, exempt: impl IntoIterator<Item = &'a Path>) -> Result<(), StorageError> {
	let exempt: HashSet<PathBuf> = exempt
		.into_iter()
		.filter_map(|path| std::path::absolute(path).ok())
		.collect();

	let entries = match fs::read_dir(root) {
		Ok(entries) => entries,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
		Err(e) => return Err(e.into()),
	};

	for entry in entries {
		let path = entry?.path();
		let absolute = std::path::absolute(&path)?;
		if exempt.contains(&absolute) {
			info!("Keeping {}", path.display());
			continue;
		}
		delete_recursively(&path);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wipe_all_keeps_exempt_sessions() {
		let root = tempfile::tempdir().expect("tempdir");
		let kept = storage_path(root.path(), "S1");
		let wiped = storage_path(root.path(), "S2");
		ensure_path(&kept.join("btc")).expect("S1");
		ensure_path(&wiped.join("eth")).expect("S2");
		fs::write(wiped.join("eth").join("blocks.db"), b"data").expect("write");
		fs::write(kept.join("btc").join("blocks.db"), b"data").expect("write");

		wipe_all(root.path(), [kept.as_path()]).expect("wipe");

		assert!(kept.join("btc").join("blocks.db").exists());
		assert!(!wiped.exists());
	}

	#[test]
	fn test_wipe_all_tolerates_missing_root() {
		let root = tempfile::tempdir().expect("tempdir");
		let missing = root.path().join("absent");
		assert!(wipe_all(&missing, std::iter::empty::<&Path>()).is_ok());
	}

	#[test]
	fn test_delete_recursively_removes_tree() {
		let root = tempfile::tempdir().expect("tempdir");
		let path = storage_path(root.path(), "account");
		ensure_path(&path.join("nested")).expect("create");

		delete_recursively(&path);
		assert!(!path.exists());
		delete_recursively(&path);
	}
}
