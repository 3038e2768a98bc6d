//! JSON persistence for candidate algorithms.
//!
//! A candidate file is an array of triples, each triple an array of three
//! n×n arrays of numbers.

use crate::error::FactorError;
use crate::triple::Triple;
use std::fs;
use std::path::Path;

pub fn triples_from_json(json: &str) -> Result<Vec<Triple>, FactorError> {
    Ok(serde_json::from_str(json)?)
}

pub fn triples_to_json(triples: &[Triple]) -> Result<String, FactorError> {
    Ok(serde_json::to_string_pretty(triples)?)
}

pub fn load_triples(path: impl AsRef<Path>) -> Result<Vec<Triple>, FactorError> {
    let json = fs::read_to_string(path)?;
    triples_from_json(&json)
}

pub fn save_triples(path: impl AsRef<Path>, triples: &[Triple]) -> Result<(), FactorError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, triples_to_json(triples)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::naive_seed;

    #[test]
    fn test_save_and_load_candidate() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("rank64.json");
        let seed = naive_seed(4);

        save_triples(&path, &seed)?;
        let loaded = load_triples(&path)?;
        assert_eq!(loaded, seed);
        Ok(())
    }

    #[test]
    fn test_empty_candidate_file() {
        let triples = triples_from_json("[]").unwrap();
        assert!(triples.is_empty());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        // Two factors instead of three.
        let json = "[[[[1.0]],[[1.0]]]]";
        assert!(triples_from_json(json).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_triples("/nonexistent/candidate.json").unwrap_err();
        assert!(matches!(err, FactorError::Io(_)));
    }
}
