use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Cursor};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// One directed arc, `source -> target`, as written in the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Edges in file line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EdgeList {
    edges: Vec<Edge>,
}

impl EdgeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    pub fn as_slice(&self) -> &[Edge] {
        &self.edges
    }

    /// One `source,target` line per edge.
    pub fn to_csv_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EdgeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in &self.edges {
            writeln!(f, "{},{}", edge.source, edge.target)?;
        }
        Ok(())
    }
}

impl From<Vec<Edge>> for EdgeList {
    fn from(edges: Vec<Edge>) -> Self {
        EdgeList { edges }
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

impl IntoIterator for EdgeList {
    type Item = Edge;
    type IntoIter = std::vec::IntoIter<Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.into_iter()
    }
}

/// Whole file contents. Anything that keeps the file from being read,
/// including the path naming a directory, is a `FileAccess` error.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_edge_list(path: impl AsRef<Path>) -> Result<EdgeList> {
    let path = path.as_ref();
    let contents = read_input(path)?;
    let edges = parse_edges(Cursor::new(contents))?;
    debug!("Read {} edges from {}", edges.len(), path.display());
    Ok(edges)
}

/// Reads to end of input. Blank lines are skipped, every other line must
/// contain a comma; the first comma separates source from target.
pub fn parse_edges<R: BufRead>(reader: R) -> Result<EdgeList> {
    let mut edges = EdgeList::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| Error::Read { line: i + 1, source })?;
        let line = strip_line_end(&line);
        if line.is_empty() {
            continue;
        }

        let (source, target) = line.split_once(',').ok_or_else(|| Error::Format {
            line: i + 1,
            content: line.to_string(),
        })?;
        edges.push(Edge::new(source, target));
    }

    Ok(edges)
}

// `lines()` already drops "\n" and "\r\n"; a lone trailing '\r' can remain.
pub(crate) fn strip_line_end(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

//test module
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<EdgeList> {
        parse_edges(Cursor::new(text))
    }

    #[test]
    fn test_parse_cycle() {
        let edges = parse("n1,n2\nn2,n3\nn3,n1\n").unwrap();
        assert_eq!(
            edges.as_slice(),
            &[
                Edge::new("n1", "n2"),
                Edge::new("n2", "n3"),
                Edge::new("n3", "n1"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_single_line_without_newline() {
        let edges = parse("A,B").unwrap();
        assert_eq!(edges.as_slice(), &[Edge::new("A", "B")]);
    }

    #[test]
    fn test_line_count_matches_edge_count() {
        let text: String = (0..100).map(|i| format!("a{},b{}\n", i, i + 1)).collect();
        let edges = parse(&text).unwrap();
        assert_eq!(edges.len(), 100);
        assert_eq!(edges.as_slice()[42], Edge::new("a42", "b43"));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let edges = parse("A,B\r\n\r\n\nC,D\r\n").unwrap();
        assert_eq!(edges.as_slice(), &[Edge::new("A", "B"), Edge::new("C", "D")]);
    }

    #[test]
    fn test_labels_kept_verbatim() {
        let edges = parse(" A , B\n").unwrap();
        assert_eq!(edges.as_slice(), &[Edge::new(" A ", " B")]);
    }

    #[test]
    fn test_split_on_first_comma() {
        let edges = parse("A,B,C\n").unwrap();
        assert_eq!(edges.as_slice(), &[Edge::new("A", "B,C")]);
    }

    #[test]
    fn test_missing_comma_reports_line() {
        let err = parse("A,B\nC,D\nbroken\nE,F\n").unwrap_err();
        match err {
            Error::Format { line, content } => {
                assert_eq!(line, 3);
                assert_eq!(content, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_round_trip() {
        let text = "x,y\ny,z\nz,x\nx,x\n";
        let edges = parse(text).unwrap();
        assert_eq!(edges.to_csv_string(), text);
        assert_eq!(parse(&edges.to_csv_string()).unwrap(), edges);
    }

    #[test]
    fn test_round_trip_drops_crlf_and_blank_lines() {
        let edges = parse("x,y\r\n\r\ny,z\r\n\nz,x").unwrap();
        assert_eq!(edges.to_csv_string(), "x,y\ny,z\nz,x\n");
        assert_eq!(parse(&edges.to_csv_string()).unwrap(), edges);
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let err = parse_edges(Cursor::new(&b"A,B\nC,\xff\xfe\n"[..])).unwrap_err();
        match err {
            Error::Read { line, ref source } => {
                assert_eq!(line, 2);
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_directory_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_edge_list(dir.path()).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_read_edge_list_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "P0,P1\nP1,P2\n").unwrap();

        let edges = read_edge_list(file.path()).unwrap();
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_edge_list(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_json_shape() {
        let edges = parse("A,B\n").unwrap();
        let json = serde_json::to_string(&edges).unwrap();
        assert_eq!(json, r#"[{"source":"A","target":"B"}]"#);
    }
}
