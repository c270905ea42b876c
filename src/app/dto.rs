use crate::domain::level::Granularity;
use crate::domain::modification::Selection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Result of a `select` run, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    pub level: Granularity,
    pub standalone: bool,
    pub total_tests: usize,
    /// Triggering node → tests selected through it.
    pub included: BTreeMap<String, BTreeSet<String>>,
    /// Tests no changed node reaches; the build tool skips them.
    pub excluded: BTreeSet<String>,
}

impl SelectionReport {
    pub fn new(level: Granularity, standalone: bool, selection: Selection) -> Self {
        let mut included = BTreeMap::new();
        let mut excluded = BTreeSet::new();
        for (trigger, tests) in selection {
            match trigger {
                Some(node) => {
                    included.insert(node, tests);
                }
                None => excluded.extend(tests),
            }
        }
        let total_tests = excluded.len() + included.values().map(BTreeSet::len).sum::<usize>();
        Self {
            level,
            standalone,
            total_tests,
            included,
            excluded,
        }
    }

    pub fn selected_tests(&self) -> BTreeSet<&str> {
        self.included.values().flatten().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_splits_selection() {
        let mut selection = Selection::new();
        selection.insert(Some("B.n()".into()), BTreeSet::from(["T.a()".to_string()]));
        selection.insert(None, BTreeSet::from(["T.b()".to_string(), "T.c()".to_string()]));

        let report = SelectionReport::new(Granularity::Method, false, selection);
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.selected_tests(), BTreeSet::from(["T.a()"]));
        assert_eq!(report.excluded.len(), 2);
    }
}
