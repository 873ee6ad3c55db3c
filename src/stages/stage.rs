//! Ordered developmental stages and per-gene assignments

use std::fmt;

/// One of the three ordered phases of the time course
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Initiation,
    PrimaryResponse,
    SecondaryResponse,
}

impl Stage {
    /// All stages in temporal order
    pub const ALL: [Stage; 3] = [
        Stage::Initiation,
        Stage::PrimaryResponse,
        Stage::SecondaryResponse,
    ];

    /// 1-based stage number
    pub fn as_number(&self) -> usize {
        match self {
            Stage::Initiation => 1,
            Stage::PrimaryResponse => 2,
            Stage::SecondaryResponse => 3,
        }
    }

    /// Human-readable stage name
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Initiation => "initiation",
            Stage::PrimaryResponse => "primary response",
            Stage::SecondaryResponse => "secondary response",
        }
    }

    /// The stage immediately before this one
    pub fn earlier(&self) -> Option<Stage> {
        match self {
            Stage::Initiation => None,
            Stage::PrimaryResponse => Some(Stage::Initiation),
            Stage::SecondaryResponse => Some(Stage::PrimaryResponse),
        }
    }

    /// The stage immediately after this one
    pub fn later(&self) -> Option<Stage> {
        match self {
            Stage::Initiation => Some(Stage::PrimaryResponse),
            Stage::PrimaryResponse => Some(Stage::SecondaryResponse),
            Stage::SecondaryResponse => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-gene stage labels, assigned once per run and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAssignment {
    labels: Vec<Stage>,
}

impl StageAssignment {
    pub fn new(labels: Vec<Stage>) -> Self {
        StageAssignment { labels }
    }

    /// Number of genes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Stage label of a gene by row index
    pub fn stage_of(&self, gene: usize) -> Stage {
        self.labels[gene]
    }

    pub fn labels(&self) -> &[Stage] {
        &self.labels
    }

    /// Gene indices assigned to a stage, in row order
    pub fn genes_in(&self, stage: Stage) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == stage)
            .map(|(i, _)| i)
            .collect()
    }

    /// Gene counts per stage in temporal order
    pub fn histogram(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for label in &self.labels {
            counts[label.as_number() - 1] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Initiation < Stage::PrimaryResponse);
        assert!(Stage::PrimaryResponse < Stage::SecondaryResponse);
        assert_eq!(Stage::Initiation.as_number(), 1);
        assert_eq!(Stage::SecondaryResponse.as_number(), 3);
    }

    #[test]
    fn test_stage_neighbors() {
        assert_eq!(Stage::Initiation.earlier(), None);
        assert_eq!(Stage::Initiation.later(), Some(Stage::PrimaryResponse));
        assert_eq!(
            Stage::SecondaryResponse.earlier(),
            Some(Stage::PrimaryResponse)
        );
        assert_eq!(Stage::SecondaryResponse.later(), None);
    }

    #[test]
    fn test_assignment_queries() {
        let assignment = StageAssignment::new(vec![
            Stage::PrimaryResponse,
            Stage::Initiation,
            Stage::SecondaryResponse,
            Stage::PrimaryResponse,
        ]);

        assert_eq!(assignment.len(), 4);
        assert_eq!(assignment.stage_of(1), Stage::Initiation);
        assert_eq!(assignment.genes_in(Stage::PrimaryResponse), vec![0, 3]);
        assert_eq!(assignment.histogram(), [1, 2, 1]);
    }
}
