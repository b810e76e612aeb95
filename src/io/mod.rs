//! Persisted task files.
//!
//! One binary-encoded task per file, named `task<NNNNN>:000.bin` where
//! `<NNNNN>` is the 5-digit template id. A listing operation enumerates
//! a directory and parses ids back out of the filenames.

use std::path::{Path, PathBuf};

use crate::error::{SimError, SimResult};
use crate::scene::task::Task;

const TASK_NAME_PREFIX: &str = "task";
const TASK_NAME_SUFFIX: &str = ":000.bin";

/// File name for a task id, e.g. `task00045:000.bin` for id 45.
#[must_use]
pub fn task_file_name(task_id: i32) -> String {
    format!("{TASK_NAME_PREFIX}{task_id:05}{TASK_NAME_SUFFIX}")
}

/// Parse a task id out of a file name.
///
/// # Errors
///
/// Returns `TaskFileName` if the name does not match the template.
pub fn parse_task_id(file_name: &str) -> SimResult<i32> {
    file_name
        .strip_prefix(TASK_NAME_PREFIX)
        .and_then(|rest| rest.strip_suffix(TASK_NAME_SUFFIX))
        .and_then(|digits| digits.parse::<i32>().ok())
        .ok_or_else(|| SimError::TaskFileName {
            name: file_name.to_string(),
        })
}

/// List the task ids present in a directory.
///
/// Non-file entries are skipped; a file with a malformed name is an
/// error. Ids are returned sorted so the listing does not depend on
/// directory iteration order.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or contains a file
/// with a malformed name.
pub fn list_tasks<P: AsRef<Path>>(task_folder: P) -> SimResult<Vec<i32>> {
    let task_folder = task_folder.as_ref();
    log::debug!("listing tasks in {}", task_folder.display());
    let mut task_ids = Vec::new();
    for entry in std::fs::read_dir(task_folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        task_ids.push(parse_task_id(&name)?);
    }
    task_ids.sort_unstable();
    Ok(task_ids)
}

/// Path of a task file within a directory.
#[must_use]
pub fn task_path<P: AsRef<Path>>(task_folder: P, task_id: i32) -> PathBuf {
    task_folder.as_ref().join(task_file_name(task_id))
}

/// Load a task from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_task<P: AsRef<Path>>(path: P) -> SimResult<Task> {
    let bytes = std::fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|e| SimError::serialization(e.to_string()))
}

/// Load a task by id from a directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_task_by_id<P: AsRef<Path>>(task_folder: P, task_id: i32) -> SimResult<Task> {
    load_task(task_path(task_folder, task_id))
}

/// Save a task to a file.
///
/// # Errors
///
/// Returns an error if the task cannot be encoded or the file written.
pub fn save_task<P: AsRef<Path>>(task: &Task, path: P) -> SimResult<()> {
    let bytes = bincode::serialize(task).map_err(|e| SimError::serialization(e.to_string()))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scene::task::SpatialRelationship;
    use crate::scene::{build_box, Scene};

    fn sample_task() -> Task {
        let mut scene = Scene::new(32, 32);
        scene.bodies.push(build_box(0.0, 0.0, 4.0, 4.0, 0.0, false));
        scene.bodies.push(build_box(10.0, 0.0, 4.0, 4.0, 0.0, true));
        Task {
            scene,
            body_id1: 0,
            body_id2: 1,
            relationships: vec![SpatialRelationship::Touching],
            phantom_shape: None,
            tier: "BALL".to_string(),
        }
    }

    #[test]
    fn test_task_file_name() {
        assert_eq!(task_file_name(45), "task00045:000.bin");
        assert_eq!(task_file_name(12345), "task12345:000.bin");
    }

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("task00045:000.bin").unwrap(), 45);
        assert_eq!(parse_task_id("task12345:000.bin").unwrap(), 12345);
        assert!(parse_task_id("task0004:woops.bin").is_err());
        assert!(parse_task_id("notatask").is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for id in [0, 1, 45, 99_999] {
            assert_eq!(parse_task_id(&task_file_name(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task();
        let path = task_path(dir.path(), 45);
        save_task(&task, &path).unwrap();
        let loaded = load_task_by_id(dir.path(), 45).unwrap();
        assert_eq!(loaded, task);
    }

    #[test]
    fn test_list_tasks_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task();
        for id in [7, 3, 45] {
            save_task(&task, task_path(dir.path(), id)).unwrap();
        }
        // Subdirectories are skipped.
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let ids = list_tasks(dir.path()).unwrap();
        assert_eq!(ids, vec![3, 7, 45]);
    }

    #[test]
    fn test_list_tasks_rejects_malformed_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"nope").unwrap();
        assert!(list_tasks(dir.path()).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_task_by_id(dir.path(), 99);
        assert!(matches!(result, Err(SimError::Io(_))));
    }
}
