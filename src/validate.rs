//! Strict input checks, stricter than what the parser itself accepts.

use std::io::{BufRead, Cursor};
use std::path::Path;

use tracing::debug;

use crate::edge_list::{parse_edges, read_input, strip_line_end, EdgeList};
use crate::error::{Error, Result};
use crate::graph::LabelGraph;

pub fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => Ok(()),
        _ => Err(Error::NotCsv(path.to_path_buf())),
    }
}

/// Every non-blank line carries exactly one comma.
pub fn check_format<R: BufRead>(reader: R) -> Result<()> {
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| Error::Read { line: i + 1, source })?;
        let line = strip_line_end(&line);
        if line.is_empty() {
            continue;
        }
        match line.matches(',').count() {
            1 => {}
            0 => {
                return Err(Error::Format {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
            _ => {
                return Err(Error::ExtraComma {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(())
}

pub fn check_acyclic(graph: &LabelGraph) -> Result<()> {
    match graph.find_cycle() {
        Some(node) => Err(Error::Cyclic(node)),
        None => Ok(()),
    }
}

/// Existing `.csv` file, one comma per line, no cycles.
pub fn validate_input(path: impl AsRef<Path>) -> Result<EdgeList> {
    let path = path.as_ref();
    check_extension(path)?;

    let contents = read_input(path)?;
    check_format(Cursor::new(&contents))?;

    let edges = parse_edges(Cursor::new(&contents))?;
    check_acyclic(&LabelGraph::from_edges(&edges))?;

    debug!("{} passed validation", path.display());
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_check_extension() {
        assert!(check_extension(Path::new("case1.csv")).is_ok());
        assert!(check_extension(Path::new("dir.csv/case1.txt")).is_err());
        assert!(check_extension(Path::new("case1")).is_err());
        assert!(check_extension(Path::new("case1.csvx")).is_err());
    }

    #[test]
    fn test_check_format() {
        assert!(check_format(Cursor::new("a,b\n\nb,c\r\n")).is_ok());
        assert!(check_format(Cursor::new("")).is_ok());

        match check_format(Cursor::new("a,b\na,b,c\n")) {
            Err(Error::ExtraComma { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
        match check_format(Cursor::new(&b"a,b\n\xff,c\n"[..])) {
            Err(Error::Read { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
        match check_format(Cursor::new("ab\n")) {
            Err(Error::Format { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_input() {
        let dir = tempfile::tempdir().unwrap();

        let dag = write_temp(&dir, "dag.csv", "P0,P1\nP1,P2\nP0,P2\n");
        assert_eq!(validate_input(&dag).unwrap().len(), 3);

        let cyclic = write_temp(&dir, "cycle.csv", "n1,n2\nn2,n3\nn3,n1\n");
        assert!(matches!(validate_input(&cyclic), Err(Error::Cyclic(_))));

        let txt = write_temp(&dir, "dag.txt", "P0,P1\n");
        assert!(matches!(validate_input(&txt), Err(Error::NotCsv(_))));

        let folder = dir.path().join("folder.csv");
        std::fs::create_dir(&folder).unwrap();
        assert!(matches!(
            validate_input(&folder),
            Err(Error::FileAccess { .. })
        ));

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            validate_input(&missing),
            Err(Error::FileAccess { .. })
        ));
    }
}
