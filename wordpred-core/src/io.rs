use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::env;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::text::Language;

/// Kinds of artifacts written next to each other in a model directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Artifact {
	Backoff,
	Splits,
	Eval,
	TrainStats,
}

impl Artifact {
	fn suffix(self) -> &'static str {
		match self {
			Artifact::Backoff => "backoff",
			Artifact::Splits => "splits",
			Artifact::Eval => "eval",
			Artifact::TrainStats => "trainstats",
		}
	}
}

/// Path of a JSON artifact for `lang` inside `dir`.
///
/// Example: `models` + `Hebrew` + `Backoff` → `models/he_backoff.json`
pub fn artifact_path<P: AsRef<Path>>(dir: P, lang: Language, artifact: Artifact) -> PathBuf {
	dir.as_ref().join(format!("{}_{}.json", lang.tag(), artifact.suffix()))
}

/// Byte order mark some editors put at the start of UTF-8 files.
const BOM: char = '\u{FEFF}';

/// Reads a text file and returns its non-empty lines.
///
/// - Reads the entire file into memory
/// - Drops a leading byte order mark
/// - Splits on `\n` / `\r\n`
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	let contents = contents.strip_prefix(BOM).unwrap_or(&contents);
	Ok(contents.lines().filter(|l| !l.is_empty()).map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `models/en_backoff.json` + `"bin"` → `models/en_backoff.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let mut writer = BufWriter::new(File::create(path)?);
	serde_json::to_writer_pretty(&mut writer, value)?;
	writer.flush()?;
	Ok(())
}

/// Reads a JSON document into `T`.
pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
	let reader = BufReader::new(File::open(path)?);
	Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn artifact_names() {
		let path = artifact_path("models", Language::English, Artifact::Backoff);
		assert_eq!(path, PathBuf::from("models/en_backoff.json"));
		let path = artifact_path("out", Language::Hebrew, Artifact::TrainStats);
		assert_eq!(path, PathBuf::from("out/he_trainstats.json"));
	}

	#[test]
	fn output_path_swaps_extension() {
		let path = build_output_path("models/en_backoff.json", "bin").unwrap();
		assert_eq!(path, PathBuf::from("models/en_backoff.bin"));
	}

	#[test]
	fn json_round_trip_and_listing() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("values.json");
		write_json(&path, &vec![1, 2, 3]).unwrap();
		let values: Vec<i32> = read_json(&path).unwrap();
		assert_eq!(values, vec![1, 2, 3]);
		assert_eq!(list_files(dir.path().join("nested"), "json").unwrap(), vec!["values.json"]);
	}

	#[test]
	fn read_lines_skips_blank_lines() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, "i want water\r\n\nhelp me\n").unwrap();
		assert_eq!(read_lines(&path).unwrap(), vec!["i want water", "help me"]);
	}

	#[test]
	fn read_lines_drops_leading_bom() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, "\u{FEFF}hello there\nbye\n").unwrap();
		let lines = read_lines(&path).unwrap();
		assert_eq!(lines, vec!["hello there", "bye"]);
		assert_eq!(crate::text::normalizer::tokenize(&lines[0]), vec!["hello", "there"]);
	}

	#[test]
	fn dot_folder_is_the_working_directory() {
		let cwd = env::current_dir().unwrap();
		assert_eq!(normalize_folder("."), cwd);
		assert_eq!(normalize_folder("./"), cwd);
		assert_eq!(normalize_folder("models"), PathBuf::from("models"));
	}
}
