use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of classes in the raw MiraBest labelling.
pub const RAW_CLASSES: usize = 10;

/// Which of the two disjoint pools a file set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Train,
    Test,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::Train => "train",
            PoolKind::Test => "test",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping from raw MiraBest labels to training labels.
///
/// Raw classes 0-4 are FRI sources and 5-7 FRII; 8 and 9 are hybrids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassScheme {
    /// All ten raw classes, labels unchanged.
    Full,
    /// Binary FRI / FRII, hybrids dropped.
    #[default]
    NoHybrids,
}

impl ClassScheme {
    pub fn n_classes(&self) -> usize {
        match self {
            ClassScheme::Full => RAW_CLASSES,
            ClassScheme::NoHybrids => 2,
        }
    }

    /// Training label for a raw label, or `None` when the sample is dropped.
    pub fn map(&self, raw: u8) -> Option<usize> {
        let raw = raw as usize;
        match self {
            ClassScheme::Full if raw < RAW_CLASSES => Some(raw),
            ClassScheme::NoHybrids => match raw {
                0..=4 => Some(0),
                5..=7 => Some(1),
                _ => None,
            },
            ClassScheme::Full => None,
        }
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            ClassScheme::Full => &[
                "FRI confident standard",
                "FRI confident wide-angle tail",
                "FRI confident head-tail",
                "FRI uncertain standard",
                "FRI uncertain wide-angle tail",
                "FRII confident standard",
                "FRII confident double-double",
                "FRII uncertain standard",
                "Hybrid confident",
                "Hybrid uncertain",
            ],
            ClassScheme::NoHybrids => &["FRI", "FRII"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hybrids_mapping() {
        let scheme = ClassScheme::NoHybrids;
        let mapped: Vec<Option<usize>> = (0..10).map(|r| scheme.map(r)).collect();
        assert_eq!(
            mapped,
            vec![
                Some(0),
                Some(0),
                Some(0),
                Some(0),
                Some(0),
                Some(1),
                Some(1),
                Some(1),
                None,
                None
            ]
        );
        assert_eq!(scheme.n_classes(), scheme.class_names().len());
    }

    #[test]
    fn test_full_mapping_keeps_labels() {
        let scheme = ClassScheme::Full;
        assert_eq!(scheme.map(7), Some(7));
        assert_eq!(scheme.map(10), None);
        assert_eq!(scheme.class_names().len(), RAW_CLASSES);
    }

    #[test]
    fn test_default_scheme() {
        assert_eq!(ClassScheme::default(), ClassScheme::NoHybrids);
        assert_eq!(PoolKind::Test.to_string(), "test");
    }
}
