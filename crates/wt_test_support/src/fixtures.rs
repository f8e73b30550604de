//! TOML fixture files shared by the engine test suites.
//!
//! Every file starts with `format = "wikirt-fixture-v1"` followed by a list
//! of `[[cases]]`. Each case names its wikitext `source`, the `dom` the
//! parser would produce for it, and an `expect` table whose shape belongs to
//! the suite reading the file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::dom_spec::{BuiltDocument, NodeSpec, build_document};

pub const FIXTURE_FORMAT_V1: &str = "wikirt-fixture-v1";

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse fixture {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("unsupported fixture format '{0}' (expected '{FIXTURE_FORMAT_V1}')")]
    Format(String),
    #[error("duplicate case id '{0}'")]
    DuplicateCase(String),
    #[error("duplicate node label '{0}'")]
    DuplicateLabel(String),
    #[error("unknown {0} value '{1}'")]
    UnknownValue(&'static str, String),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureFile<E> {
    pub format: String,
    pub cases: Vec<FixtureCase<E>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase<E> {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub dom: Vec<NodeSpec>,
    pub expect: E,
}

impl<E> FixtureCase<E> {
    pub fn build(&self) -> Result<BuiltDocument, FixtureError> {
        build_document(&self.dom)
    }
}

pub fn parse_fixture<E: DeserializeOwned>(
    content: &str,
    path: &Path,
) -> Result<FixtureFile<E>, FixtureError> {
    let file: FixtureFile<E> = toml::from_str(content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if file.format != FIXTURE_FORMAT_V1 {
        return Err(FixtureError::Format(file.format));
    }
    let mut seen = BTreeSet::new();
    for case in &file.cases {
        if !seen.insert(case.id.as_str()) {
            return Err(FixtureError::DuplicateCase(case.id.clone()));
        }
    }
    Ok(file)
}

pub fn load_fixture<E: DeserializeOwned>(path: &Path) -> Result<FixtureFile<E>, FixtureError> {
    let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixture(&content, path)
}

/// Cases whose id contains the `WIKIRT_FIXTURE_FILTER` substring, or all of
/// them when the variable is unset.
pub fn filter_cases<E>(cases: Vec<FixtureCase<E>>) -> Vec<FixtureCase<E>> {
    match std::env::var("WIKIRT_FIXTURE_FILTER").ok().as_deref() {
        None | Some("") => cases,
        Some(filter) => cases
            .into_iter()
            .filter(|case| case.id.contains(filter))
            .collect(),
    }
}
