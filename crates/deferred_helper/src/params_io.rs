//! JSON document I/O for persisted pass parameters.
//!
//! A parameter file is a JSON object that may be shared with other tools.
//! The helper only owns the `"deferred"` key, so saving is a
//! read-merge-write: the existing document is loaded, that key is replaced,
//! and the whole document is written back pretty-printed.
//!
//! # Example
//!
//! ```ignore
//! use deferred_helper::params_io::{merge_section, read_document, write_document_pretty};
//!
//! let mut doc = read_document("json/main.json")?.unwrap_or_else(empty_document);
//! merge_section(&mut doc, DEFERRED_KEY, section);
//! write_document_pretty("json/main.json", &doc)?;
//! ```

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Top-level key holding every pass's parameter group.
pub const DEFERRED_KEY: &str = "deferred";

/// Errors that can occur while reading or writing a parameter document.
#[derive(Debug)]
pub enum ParamsIoError {
    /// File system error
    Io(std::io::Error),
    /// JSON parse or serialization error
    Json(String),
}

impl std::fmt::Display for ParamsIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamsIoError::Io(e) => write!(f, "IO error: {}", e),
            ParamsIoError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ParamsIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParamsIoError::Io(e) => Some(e),
            ParamsIoError::Json(_) => None,
        }
    }
}

impl From<std::io::Error> for ParamsIoError {
    fn from(e: std::io::Error) -> Self {
        ParamsIoError::Io(e)
    }
}

impl From<serde_json::Error> for ParamsIoError {
    fn from(e: serde_json::Error) -> Self {
        ParamsIoError::Json(e.to_string())
    }
}

/// Result type for parameter document operations.
pub type ParamsIoResult<T> = Result<T, ParamsIoError>;

/// An empty JSON object.
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// Read a JSON document.
///
/// Returns `Ok(None)` when the file does not exist. Any other failure,
/// including malformed JSON, is an error.
pub fn read_document<P: AsRef<Path>>(path: P) -> ParamsIoResult<Option<Value>> {
    let file = match File::open(path.as_ref()) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);
    let doc: Value = serde_json::from_reader(reader)?;
    Ok(Some(doc))
}

/// Replace `key` in `doc` with `section`, keeping every other key.
///
/// A document that is not a JSON object is replaced by one.
pub fn merge_section(doc: &mut Value, key: &str, section: Value) {
    if !doc.is_object() {
        *doc = empty_document();
    }
    if let Value::Object(map) = doc {
        map.insert(key.to_string(), section);
    }
}

/// Write a document as pretty-printed JSON, creating parent directories.
pub fn write_document_pretty<P: AsRef<Path>>(path: P, doc: &Value) -> ParamsIoResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Create `dir` if it is missing. Returns `true` when it already existed.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> ParamsIoResult<bool> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        return Ok(true);
    }
    std::fs::create_dir_all(dir)?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result = read_document(dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = read_document(file.path());
        assert!(matches!(result, Err(ParamsIoError::Json(_))));
    }

    #[test]
    fn test_merge_keeps_other_keys() {
        let mut doc = json!({ "window": { "width": 1280 }, "deferred": { "old": 1 } });
        merge_section(&mut doc, DEFERRED_KEY, json!({ "Bloom": { "enabled": true } }));

        assert_eq!(doc["window"]["width"], 1280);
        assert!(doc["deferred"].get("old").is_none());
        assert_eq!(doc["deferred"]["Bloom"]["enabled"], true);
    }

    #[test]
    fn test_merge_into_non_object() {
        let mut doc = json!([1, 2, 3]);
        merge_section(&mut doc, DEFERRED_KEY, json!({}));
        assert!(doc.is_object());
        assert!(doc.get(DEFERRED_KEY).is_some());
    }

    #[test]
    fn test_write_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("json").join("renderers").join("main.json");

        let doc = json!({ "deferred": {} });
        write_document_pretty(&path, &doc).unwrap();

        let loaded = read_document(&path).unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_ensure_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("json");

        assert!(!ensure_dir(&target).unwrap());
        assert!(target.is_dir());
        assert!(ensure_dir(&target).unwrap());
    }
}
