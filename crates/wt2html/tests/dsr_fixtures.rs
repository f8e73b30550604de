use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use wt_test_support::{FixtureCase, filter_cases, load_fixture};
use wt2html::{DsrOptions, compute_dsr};
use wtdom::debug::outline;
use wtdom::traverse::{elements, first_containment_violation};
use wtdom::{Diagnostics, Document, DomSourceRange};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DsrExpect {
    #[serde(default)]
    dsr: BTreeMap<String, [usize; 4]>,
    #[serde(default)]
    diagnostics: Vec<String>,
}

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dsr.toml")
}

fn run(doc: &mut Document, source: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    compute_dsr(doc, source.len(), &DsrOptions::default(), &mut diagnostics);
    diagnostics
}

fn snapshot(doc: &Document) -> Vec<Option<DomSourceRange>> {
    elements(doc, doc.root())
        .into_iter()
        .map(|id| doc.data(id).and_then(|d| d.dsr))
        .collect()
}

fn check_case(case: &FixtureCase<DsrExpect>) -> Result<(), String> {
    let built = case.build().map_err(|err| err.to_string())?;
    let labels = built.labels.clone();
    let mut doc = built.doc;

    let diagnostics = run(&mut doc, &case.source);
    let kinds: Vec<String> = diagnostics.iter().map(|d| d.kind.to_string()).collect();
    if kinds != case.expect.diagnostics {
        return Err(format!(
            "diagnostics: expected {:?}, got {kinds:?}",
            case.expect.diagnostics
        ));
    }

    for (label, [start, end, open, close]) in &case.expect.dsr {
        let Some(&id) = labels.get(label) else {
            return Err(format!("no node labelled '{label}'"));
        };
        let expected = DomSourceRange::known(*start, *end, *open, *close);
        let actual = doc.data(id).and_then(|d| d.dsr);
        if actual != Some(expected) {
            return Err(format!(
                "{label}: expected {expected:?}, got {actual:?}\n{}",
                outline(&doc, doc.root(), 200).join("\n")
            ));
        }
    }

    if case.expect.diagnostics.is_empty() {
        if let Some((parent, child)) = first_containment_violation(&doc, doc.root()) {
            return Err(format!(
                "{child:?} escapes its parent {parent:?}\n{}",
                outline(&doc, doc.root(), 200).join("\n")
            ));
        }
        let first = snapshot(&doc);
        let again = run(&mut doc, &case.source);
        if !again.is_empty() {
            return Err(format!("second run reported {again:?}"));
        }
        if snapshot(&doc) != first {
            return Err("second run changed the computed ranges".to_string());
        }
    }
    Ok(())
}

#[test]
fn dsr_fixtures() {
    let path = fixture_path();
    let file = load_fixture::<DsrExpect>(&path).unwrap_or_else(|err| panic!("{err}"));
    let cases = filter_cases(file.cases);
    assert!(!cases.is_empty(), "no DSR fixtures selected from {path:?}");

    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| {
            check_case(case)
                .err()
                .map(|msg| format!("[{}] {msg}", case.id))
        })
        .collect();
    assert!(
        failures.is_empty(),
        "{} of {} DSR fixtures failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}
