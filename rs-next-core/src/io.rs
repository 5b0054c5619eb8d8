use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::{fs, io};

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

const HISTORY_EXTENSION: &str = "txt";
const SNAPSHOT_EXTENSION: &str = "bin";

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a history file, one symbol per line.
///
/// Only lines starting with an alphabetic character are kept; blank lines,
/// comments, timestamps and other noise are skipped.
pub fn load_history<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	Ok(read_lines(filename)?
		.into_iter()
		.filter(|line| line.chars().next().is_some_and(char::is_alphabetic))
		.collect())
}

/// Writes one symbol per line.
pub fn save_vocabulary<P, I, S>(filename: P, symbols: I) -> io::Result<()>
where
	P: AsRef<Path>,
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut writer = BufWriter::new(File::create(filename)?);
	for symbol in symbols {
		writeln!(writer, "{}", symbol.as_ref())?;
	}
	writer.flush()
}

/// A parsed symbol stream, cached as a binary snapshot next to its source.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct History {
	symbols: Vec<String>,
}

impl History {
	pub fn new(symbols: Vec<String>) -> Self {
		Self { symbols }
	}

	/// Loads a history from a text file.
	///
	/// - With `cache`, a `.bin` snapshot next to the file is used when it is
	///   at least as recent as the text; otherwise the text is parsed and
	///   the snapshot rewritten.
	/// - Uses `postcard` for compact serialization/deserialization.
	pub fn load<P: AsRef<Path>>(filepath: P, cache: bool) -> PredictResult<Self> {
		let filepath = filepath.as_ref();
		if !cache {
			return Ok(Self::new(load_history(filepath)?));
		}

		let snapshot = snapshot_path(filepath)?;
		if is_fresh(&snapshot, filepath) {
			let bytes = fs::read(&snapshot)?;
			let history: History = postcard::from_bytes(&bytes)?;
			tracing::debug!(path = %snapshot.display(), symbols = history.len(), "history snapshot loaded");
			return Ok(history);
		}

		let history = Self::new(load_history(filepath)?);
		let bytes = postcard::to_stdvec(&history)?;
		fs::write(&snapshot, bytes)?;
		tracing::debug!(path = %filepath.display(), symbols = history.len(), "history parsed, snapshot written");
		Ok(history)
	}

	pub fn symbols(&self) -> &[String] {
		&self.symbols
	}

	pub fn into_symbols(self) -> Vec<String> {
		self.symbols
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}
}

/// True when `snapshot` exists and is not older than `source`.
fn is_fresh(snapshot: &Path, source: &Path) -> bool {
	let modified = |path: &Path| fs::metadata(path).and_then(|meta| meta.modified()).ok();
	match (modified(snapshot), modified(source)) {
		(Some(snapshot), Some(source)) => snapshot >= source,
		(Some(_), None) => true,
		_ => false,
	}
}

/// Path of the binary snapshot cached next to a history file.
///
/// `data/unix.txt` is cached as `data/unix.bin`.
pub fn snapshot_path<P: AsRef<Path>>(source: P) -> PredictResult<PathBuf> {
	let source = source.as_ref();
	if source.file_stem().is_none() {
		return Err(PredictError::invalid(format!("history path {} has no file name", source.display())));
	}
	Ok(source.with_extension(SNAPSHOT_EXTENSION))
}

/// Resolves the history called `name` inside `dir` (`<dir>/<name>.txt`).
///
/// # Errors
/// `name` must be a single plain path component: separators, `..` and
/// empty names are rejected.
pub fn history_path<P: AsRef<Path>>(dir: P, name: &str) -> PredictResult<PathBuf> {
	let mut components = Path::new(name).components();
	let single = matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
	if !single || name.chars().any(std::path::is_separator) {
		return Err(PredictError::invalid(format!("invalid history name {name:?}")));
	}
	Ok(dir.as_ref().join(format!("{name}.{HISTORY_EXTENSION}")))
}

/// Names of the histories stored in `dir`, sorted.
///
/// A history is any `.txt` file; its name is the file stem, the form
/// `history_path` accepts back.
pub fn list_histories<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
	let mut names = Vec::new();
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() || path.extension() != Some(OsStr::new(HISTORY_EXTENSION)) {
			continue;
		}
		if let Some(stem) = path.file_stem() {
			names.push(stem.to_string_lossy().into_owned());
		}
	}
	names.sort();
	Ok(names)
}
