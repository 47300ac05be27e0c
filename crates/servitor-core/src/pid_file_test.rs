use tempfile::tempdir;

use crate::PidFile;

#[test]
fn test_create_and_remove() {
    let dir = tempdir().unwrap();
    let pid_file = PidFile::new(dir.path().join("run").join("worker.pid"));
    assert_eq!(None, pid_file.read().unwrap());

    let guard = pid_file.create().unwrap();
    assert_eq!(Some(std::process::id() as i32), pid_file.read().unwrap());

    drop(guard);
    assert!(!pid_file.path().exists());
}

#[test]
fn test_invalid_contents() {
    let dir = tempdir().unwrap();
    let pid_file = PidFile::new(dir.path().join("worker.pid"));
    std::fs::write(pid_file.path(), "not a pid").unwrap();
    assert!(pid_file.read().is_err());
}

#[test]
fn test_for_label() {
    let pid_file = PidFile::for_label(&"com.test.worker".parse().unwrap());
    assert_eq!("worker.pid", pid_file.path().file_name().unwrap());
}
