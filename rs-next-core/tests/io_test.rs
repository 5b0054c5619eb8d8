use std::fs;

use std::path::PathBuf;

use rs_next_core::io::{history_path, list_histories, load_history, save_vocabulary, snapshot_path, History};
use rs_next_core::PredictError;

#[test]
fn history_keeps_alphabetic_lines() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("unix.txt");
	fs::write(&path, "ls\n\n#comment\n 12:00\ncd\r\nvim notes\n**EOF**\n").unwrap();

	assert_eq!(load_history(&path).unwrap(), vec!["ls", "cd", "vim notes"]);
}

#[test]
fn cached_history_writes_and_reuses_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("actions.txt");
	fs::write(&path, "mesh.select_all\nmesh.delete\n").unwrap();

	let history = History::load(&path, true).unwrap();
	assert_eq!(history.symbols(), &["mesh.select_all".to_owned(), "mesh.delete".to_owned()]);

	let snapshot = dir.path().join("actions.bin");
	assert!(snapshot.exists());
	assert_eq!(History::load(&path, true).unwrap(), history);
}

#[test]
fn uncached_history_leaves_no_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("plain.txt");
	fs::write(&path, "a\nb\n").unwrap();

	assert_eq!(History::load(&path, false).unwrap().len(), 2);
	assert!(!dir.path().join("plain.bin").exists());
}

#[test]
fn missing_history_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	assert!(History::load(dir.path().join("nope.txt"), true).is_err());
}

#[test]
fn vocabulary_is_written_one_symbol_per_line() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("vocab.txt");
	save_vocabulary(&path, ["undo", "redo"]).unwrap();
	assert_eq!(fs::read_to_string(&path).unwrap(), "undo\nredo\n");
}

#[test]
fn snapshot_sits_next_to_its_history() {
	assert_eq!(snapshot_path("data/unix.txt").unwrap(), PathBuf::from("data/unix.bin"));
	assert!(snapshot_path("").is_err());
}

#[test]
fn history_names_resolve_inside_the_data_dir() {
	assert_eq!(history_path("data", "unix").unwrap(), PathBuf::from("data/unix.txt"));
	assert_eq!(history_path("data", "blender.2024").unwrap(), PathBuf::from("data/blender.2024.txt"));

	for name in ["", ".", "..", "../secret", "nested/unix", "unix/", "/etc/passwd"] {
		assert!(
			matches!(history_path("data", name), Err(PredictError::InvalidParameter(_))),
			"{name:?} accepted"
		);
	}
}

#[test]
fn histories_are_listed_by_name() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("unix.txt"), "").unwrap();
	fs::write(dir.path().join("blender.txt"), "").unwrap();
	fs::write(dir.path().join("blender.bin"), "").unwrap();
	fs::create_dir(dir.path().join("nested.txt")).unwrap();

	let names = list_histories(dir.path()).unwrap();
	assert_eq!(names, vec!["blender", "unix"]);
	assert_eq!(history_path(dir.path(), &names[1]).unwrap(), dir.path().join("unix.txt"));
}
