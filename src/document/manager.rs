//! Component F: concurrency-safe URI -> Document map, driving transitive
//! `load()` resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};

use super::document::Document;
use super::parse::{Deadline, ParseError};
use super::point::Range;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("not found: {0}")]
    NotFound(Url),
    #[error("only file URIs are supported, got {0}")]
    UnsupportedScheme(String),
    #[error("parse failure: {0}")]
    ParseFailure(#[from] ParseError),
    #[error("failed to resolve {0}: {1}")]
    ResolveFailure(String, String),
}

/// Reads file contents for a resolved path. Abstracted so tests can supply
/// an in-memory filesystem; production wiring uses `std::fs::read`.
pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

pub struct StdFileReader;

impl FileReader for StdFileReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

pub struct DocumentManager {
    cache: Mutex<HashMap<Url, Document>>,
    workspace_root: Mutex<Option<PathBuf>>,
    reader: Box<dyn FileReader>,
}

impl DocumentManager {
    pub fn new(reader: Box<dyn FileReader>) -> Self {
        DocumentManager {
            cache: Mutex::new(HashMap::new()),
            workspace_root: Mutex::new(None),
            reader,
        }
    }

    pub fn initialize(&self, workspace_root: Option<PathBuf>) {
        *self.workspace_root.lock().unwrap() = workspace_root;
    }

    pub fn keys(&self) -> Vec<Url> {
        self.cache.lock().unwrap().keys().cloned().collect()
    }

    pub fn remove(&self, uri: &Url) {
        self.cache.lock().unwrap().remove(uri);
    }

    pub fn read(&self, uri: &Url) -> Result<Document, ManagerError> {
        {
            let cache = self.cache.lock().unwrap();
            if let Some(doc) = cache.get(uri) {
                return Ok(doc.copy());
            }
        }
        let bytes = self.read_bytes(uri)?;
        self.write(uri, bytes).map(|(doc, _)| doc)
    }

    pub fn write(&self, uri: &Url, bytes: Vec<u8>) -> Result<(Document, Vec<Diagnostic>), ManagerError> {
        let canonical = self.canonicalize(uri)?;
        let mut scratch = HashMap::new();
        let mut to_commit = HashMap::new();
        let doc = self.parse_transitively(&canonical, bytes, &mut scratch, &mut to_commit)?;

        let mut cache = self.cache.lock().unwrap();
        for (u, d) in to_commit {
            cache.insert(u, d);
        }
        cache.insert(canonical.clone(), doc.copy());
        drop(cache);

        let diagnostics = doc.diagnostics_with(Vec::new());
        Ok((doc, diagnostics))
    }

    fn read_bytes(&self, uri: &Url) -> Result<Vec<u8>, ManagerError> {
        let path = self.resolve_path(uri, None)?;
        self.reader
            .read(&path)
            .map_err(|e| ManagerError::ResolveFailure(uri.to_string(), e.to_string()))
    }

    fn canonicalize(&self, uri: &Url) -> Result<Url, ManagerError> {
        if uri.scheme() != "file" {
            return Err(ManagerError::UnsupportedScheme(uri.scheme().to_string()));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| ManagerError::ResolveFailure(uri.to_string(), "invalid file path".into()))?;
        let canonical = path.canonicalize().unwrap_or(path);
        Url::from_file_path(&canonical)
            .map_err(|_| ManagerError::ResolveFailure(uri.to_string(), "cannot canonicalize".into()))
    }

    fn resolve_path(&self, uri: &Url, relative_to: Option<&Path>) -> Result<PathBuf, ManagerError> {
        if uri.scheme() != "file" {
            return Err(ManagerError::UnsupportedScheme(uri.scheme().to_string()));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| ManagerError::ResolveFailure(uri.to_string(), "invalid file path".into()))?;
        if path.is_relative() {
            let base = relative_to
                .map(Path::to_path_buf)
                .or_else(|| self.workspace_root.lock().unwrap().clone())
                .unwrap_or_else(|| PathBuf::from("."));
            Ok(base.join(path))
        } else {
            Ok(path)
        }
    }

    fn resolve_load_uri(&self, importer: &Url, file: &str) -> Result<Url, ManagerError> {
        if let Ok(direct) = Url::parse(file) {
            if direct.scheme() == "file" {
                return self.canonicalize(&direct);
            }
            return Err(ManagerError::UnsupportedScheme(direct.scheme().to_string()));
        }
        let importer_dir = importer
            .to_file_path()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let resolved = importer_dir.join(file);
        let canonical = resolved.canonicalize().unwrap_or(resolved);
        Url::from_file_path(&canonical)
            .map_err(|_| ManagerError::ResolveFailure(file.to_string(), "cannot resolve".into()))
    }

    /// Parses `uri` and, recursively, every document it transitively
    /// `load()`s, tracking in-flight URIs in `scratch` to detect cycles.
    /// Successfully parsed dependencies accumulate in `to_commit`; nothing
    /// is written to the shared cache until the whole call succeeds.
    fn parse_transitively(
        &self,
        uri: &Url,
        bytes: Vec<u8>,
        scratch: &mut HashMap<Url, ()>,
        to_commit: &mut HashMap<Url, Document>,
    ) -> Result<Document, ManagerError> {
        if scratch.contains_key(uri) {
            return Err(ManagerError::ResolveFailure(
                uri.to_string(),
                format!("circular load: {uri}"),
            ));
        }
        scratch.insert(uri.clone(), ());

        let mut doc = Document::new(uri.clone(), bytes, Deadline::none())?;

        let loads = doc.loads.clone();
        for load in &loads {
            let dep_range = load.range;
            let dep_uri = match self.resolve_load_uri(uri, &load.file) {
                Ok(u) => u,
                Err(e) => {
                    push_load_diag(&mut doc, dep_range, &e.to_string());
                    continue;
                }
            };

            let dep_doc = if let Some(cached) = to_commit.get(&dep_uri).cloned() {
                Some(cached)
            } else {
                match self.read_bytes(&dep_uri) {
                    Ok(dep_bytes) => {
                        match self.parse_transitively(&dep_uri, dep_bytes, scratch, to_commit) {
                            Ok(parsed) => {
                                to_commit.insert(dep_uri.clone(), parsed.clone());
                                Some(parsed)
                            }
                            Err(e) => {
                                push_load_diag(&mut doc, dep_range, &e.to_string());
                                None
                            }
                        }
                    }
                    Err(_) => {
                        push_load_diag(
                            &mut doc,
                            dep_range,
                            &format!("unable to read {}", dep_uri.path()),
                        );
                        None
                    }
                }
            };

            if let Some(dep_doc) = dep_doc {
                for binding in &load.bindings {
                    let original_symbol = dep_doc
                        .symbols
                        .iter()
                        .find(|s| s.name == binding.original)
                        .cloned();
                    let original_signature = dep_doc.signatures.get(&binding.original).cloned();
                    doc.extend_with_binding(
                        dep_range,
                        &binding.alias,
                        original_symbol.as_ref(),
                        original_signature.as_ref(),
                        &dep_doc.uri,
                    );
                }
                for d in &dep_doc.diagnostics {
                    let mut redirected = d.clone();
                    redirected.range = dep_range.into();
                    push_raw_diag(&mut doc, dep_range, redirected);
                }
            }
        }

        scratch.remove(uri);
        Ok(doc)
    }
}

fn push_load_diag(doc: &mut Document, range: Range, message: &str) {
    if let Some(load) = doc.loads.iter_mut().find(|l| l.range == range) {
        load.diagnostics.push(Diagnostic {
            range: range.into(),
            severity: Some(DiagnosticSeverity::ERROR),
            message: message.to_string(),
            ..Default::default()
        });
    }
}

fn push_raw_diag(doc: &mut Document, range: Range, d: Diagnostic) {
    if let Some(load) = doc.loads.iter_mut().find(|l| l.range == range) {
        load.diagnostics.push(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex as StdMutex;

    struct MemoryFs(StdMutex<StdHashMap<PathBuf, Vec<u8>>>);

    impl FileReader for MemoryFs {
        fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            self.0
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }

    fn manager_with(files: Vec<(&str, &str)>) -> DocumentManager {
        let mut map = StdHashMap::new();
        for (path, content) in files {
            map.insert(PathBuf::from(path), content.as_bytes().to_vec());
        }
        DocumentManager::new(Box::new(MemoryFs(StdMutex::new(map))))
    }

    #[test]
    fn write_then_read_roundtrips_bytes() {
        let manager = manager_with(vec![]);
        let uri = Url::from_file_path("/main.star").unwrap();
        let (doc, _) = manager.write(&uri, b"x = 1\n".to_vec()).unwrap();
        assert_eq!(doc.input, b"x = 1\n");
        let read_back = manager.read(&uri).unwrap();
        assert_eq!(read_back.input, b"x = 1\n");
    }

    #[test]
    fn circular_load_is_flagged_on_both_files() {
        let manager = manager_with(vec![
            ("/a.star", "load('b.star', 'x')\ny = True\n"),
            ("/b.star", "load('a.star', 'y')\nx = True\n"),
        ]);
        let uri = Url::from_file_path("/a.star").unwrap();
        let doc = manager.read(&uri).unwrap();
        let all = doc.diagnostics_with(Vec::new());
        assert!(all.iter().any(|d| d.message.contains("circular load")));
    }

    #[test]
    fn cross_file_load_binds_function_symbol() {
        let manager = manager_with(vec![
            ("/dep.star", "def foo():\n    \"\"\"foos\"\"\"\n    pass\n"),
            ("/main.star", "load('dep.star', 'foo')\nfoo()\n"),
        ]);
        let uri = Url::from_file_path("/main.star").unwrap();
        let doc = manager.read(&uri).unwrap();
        let foo = doc.symbols.iter().find(|s| s.name == "foo");
        assert!(foo.is_some());
        assert!(doc.signatures.contains_key("foo"));
    }
}
