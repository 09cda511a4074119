//! CLI front door.
//!
//! Helpers behind the `refinfer` subcommands:
//! - `infer` - run variable inference over one document or a directory
//! - `mappings` - list the AST node mappings recorded in a document
//!
//! ## Error Handling
//!
//! All functions return `Result<T, RefinferError>`. Document errors are
//! converted through the bridges in `error_bridges`, keeping the path of
//! the offending file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use refinfer_core::error::RefinferError;
use refinfer_core::output::{InferResponse, MappingsResponse};
use refinfer_core::util::generate_snapshot_id;
use refinfer_mapping::{BodyMapper, DiffDocument, InferenceOptions};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::report;

/// A decoded document with the digest of its bytes.
#[derive(Debug)]
pub struct LoadedDocument {
    pub path: String,
    pub snapshot_id: String,
    pub document: DiffDocument,
}

/// Read, digest and decode the document at `path`.
pub fn load_document(path: &Path) -> Result<LoadedDocument, RefinferError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RefinferError::file_not_found(&display),
        _ => RefinferError::internal(format!("failed to read {display}: {e}")),
    })?;
    let snapshot_id = generate_snapshot_id(&bytes);
    let json = String::from_utf8(bytes).map_err(|e| RefinferError::MalformedDocument {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let document = DiffDocument::from_json(&json).map_err(|e| e.in_file(&display))?;
    debug!(
        path = %path.display(),
        snapshot_id = %snapshot_id,
        fragments = document.store.fragment_count(),
        mappings = document.mappings.len(),
        "document loaded"
    );
    Ok(LoadedDocument {
        path: display,
        snapshot_id,
        document,
    })
}

/// Run inference over one loaded document.
pub fn infer_document(loaded: &LoadedDocument, options: InferenceOptions) -> InferResponse {
    let doc = &loaded.document;
    let mut mapper = BodyMapper::new(&doc.store)
        .with_class_diff(&doc.class_diff)
        .with_options(options);
    mapper.add_mappings(doc.mappings.iter().cloned());
    mapper.set_non_mapped_leaves(
        doc.non_mapped_leaves_t1.clone(),
        doc.non_mapped_leaves_t2.clone(),
    );
    mapper.infer();
    let (mappings, refactorings) = mapper.into_parts();
    report::infer_response(
        &loaded.snapshot_id,
        &loaded.path,
        &doc.store,
        &mappings,
        &refactorings,
    )
}

/// Load the document at `path` and run inference over it.
pub fn run_infer(path: &Path, options: InferenceOptions) -> Result<InferResponse, RefinferError> {
    let loaded = load_document(path)?;
    let response = infer_document(&loaded, options);
    info!(
        path = %loaded.path,
        mappings = response.summary.mappings,
        extract = response.summary.extract_variable,
        inline = response.summary.inline_variable,
        "inferred"
    );
    Ok(response)
}

/// Collect the `*.json` documents under `dir`, sorted by path.
pub fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>, RefinferError> {
    let display = dir.display().to_string();
    if !dir.exists() {
        return Err(RefinferError::file_not_found(display));
    }
    if !dir.is_dir() {
        return Err(RefinferError::invalid_args_with_details(
            format!("not a directory: {display}"),
            serde_json::json!({ "path": display }),
        ));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Run inference over every document under `dir`.
///
/// Stops at the first document that fails to load.
pub fn run_infer_dir(
    dir: &Path,
    options: InferenceOptions,
) -> Result<Vec<InferResponse>, RefinferError> {
    let files = collect_documents(dir)?;
    info!(dir = %dir.display(), documents = files.len(), "batch inference");
    files.iter().map(|path| run_infer(path, options)).collect()
}

/// List the node mappings of the document at `path`.
///
/// With `src`, only mappings whose source renders as `src` are listed.
pub fn run_mappings(path: &Path, src: Option<&str>) -> Result<MappingsResponse, RefinferError> {
    let loaded = load_document(path)?;
    let store = &loaded.document.ast_mappings;
    if let Some(src) = src {
        debug!(src, count = store.count_src(src), "filtering node mappings");
    }
    let mappings = store
        .iter()
        .filter(|m| match src {
            Some(s) => m.src.to_string() == s,
            None => true,
        })
        .map(ToString::to_string)
        .collect();
    Ok(MappingsResponse::new(loaded.snapshot_id, mappings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY: &str = r#"{ "file_path": "A.java" }"#;

    #[test]
    fn collect_documents_is_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("b.json"), EMPTY).unwrap();
        fs::write(temp.path().join("nested").join("a.json"), EMPTY).unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let files = collect_documents(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("b.json"), PathBuf::from("nested").join("a.json")]
        );
    }

    #[test]
    fn missing_directory_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = collect_documents(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, RefinferError::FileNotFound { .. }));
    }

    #[test]
    fn plain_file_as_directory_is_invalid_argument() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.json");
        fs::write(&file, EMPTY).unwrap();
        match collect_documents(&file).unwrap_err() {
            RefinferError::InvalidArguments { details, .. } => {
                assert_eq!(details.unwrap()["path"], file.display().to_string())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn snapshot_id_follows_the_bytes() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.json");
        let b = temp.path().join("b.json");
        fs::write(&a, EMPTY).unwrap();
        fs::write(&b, EMPTY).unwrap();
        let first = load_document(&a).unwrap();
        let second = load_document(&b).unwrap();
        assert_eq!(first.snapshot_id, second.snapshot_id);
        assert!(first.snapshot_id.starts_with("snap_"));

        fs::write(&b, r#"{ "file_path": "B.java" }"#).unwrap();
        assert_ne!(load_document(&b).unwrap().snapshot_id, first.snapshot_id);
    }

    #[test]
    fn empty_document_infers_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.json");
        fs::write(&path, EMPTY).unwrap();
        let response = run_infer(&path, InferenceOptions::default()).unwrap();
        assert_eq!(response.status, "ok");
        assert!(response.mappings.is_empty());
        assert!(response.refactorings.is_empty());
    }

    #[test]
    fn malformed_document_keeps_its_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        match run_infer(&path, InferenceOptions::default()).unwrap_err() {
            RefinferError::MalformedDocument { path: p, .. } => {
                assert_eq!(p, path.display().to_string())
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
