//! Character embedding tables in GloVe text format.
//!
//! Each line holds a token followed by its vector components, separated by
//! whitespace. Only single-character tokens are kept; word vectors are
//! skipped without being parsed. A leading word2vec-style `count dimension`
//! line is tolerated.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cde_map::{CharTableEmbedder, Embedder};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Loads a character table, naming the embedder after the file stem.
pub fn read_char_embeddings(path: &Path) -> Result<CharTableEmbedder> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let name = path
        .file_stem()
        .map_or_else(|| "char-table".to_string(), |s| s.to_string_lossy().into_owned());
    let embedder = read_char_embeddings_from(BufReader::new(file), &name, path)?;
    info!(
        path = %path.display(),
        characters = embedder.len(),
        dimension = embedder.dimension(),
        "loaded character embeddings"
    );
    Ok(embedder)
}

pub fn read_char_embeddings_from<R: BufRead>(
    reader: R,
    name: &str,
    origin: &Path,
) -> Result<CharTableEmbedder> {
    let mut table: BTreeMap<char, Vec<f32>> = BTreeMap::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| IngestError::read(origin, e))?;
        let mut fields = line.split_whitespace();
        let Some(token) = fields.next() else {
            continue;
        };
        if line_no == 1 && is_header(&line) {
            continue;
        }

        let mut chars = token.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            skipped += 1;
            continue;
        };
        if table.contains_key(&c) {
            continue;
        }
        let vector = fields
            .map(|field| match field.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(IngestError::EmbeddingLine {
                    path: origin.to_path_buf(),
                    line: line_no,
                    reason: format!("component {field:?} is not a finite number"),
                }),
            })
            .collect::<Result<Vec<f32>>>()?;
        if vector.is_empty() {
            return Err(IngestError::EmbeddingLine {
                path: origin.to_path_buf(),
                line: line_no,
                reason: format!("token {token:?} has no vector"),
            });
        }
        table.insert(c, vector);
    }

    debug!(characters = table.len(), skipped, "parsed embedding table");
    CharTableEmbedder::new(name, table).map_err(|source| IngestError::Embeddings {
        path: origin.to_path_buf(),
        source,
    })
}

fn is_header(line: &str) -> bool {
    let fields: Vec<&str> = line.split_whitespace().collect();
    fields.len() == 2 && fields.iter().all(|f| f.parse::<usize>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Result<CharTableEmbedder> {
        read_char_embeddings_from(text.as_bytes(), "test", Path::new("vectors.txt"))
    }

    #[test]
    fn test_keeps_single_characters_only() {
        let embedder = load("3 2\nthe 9 9\na 1 0\nb 0 1\n").unwrap();
        assert_eq!(embedder.len(), 2);
        assert_eq!(embedder.dimension(), 2);
        assert_eq!(embedder.embed("A_b").unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_bad_component_names_line() {
        let err = load("a 1 0\nb 0 x\n").unwrap_err();
        assert!(matches!(err, IngestError::EmbeddingLine { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_components_are_rejected() {
        let err = load("a 1 0\nb 0 1\nc nan 1\nd 1 1\n").unwrap_err();
        assert!(matches!(err, IngestError::EmbeddingLine { line: 3, .. }));
        let err = load("a inf 0\n").unwrap_err();
        assert!(matches!(err, IngestError::EmbeddingLine { line: 1, .. }));
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let err = load("a 1 0\nb 0 1 2\n").unwrap_err();
        assert!(matches!(err, IngestError::Embeddings { .. }));
    }
}
