//! Time-axis windows for the three stages

use std::ops::Range;

use crate::error::{Result, TristageError};

use super::Stage;

/// Stage windows over the time axis
///
/// Interval ranges index the columns of the change-rate matrix (one column
/// per consecutive time-point pair); point ranges index the columns of the
/// expression matrix. The boundary is the 1-based time-point index ending
/// the initiation window; `primary_intervals` is the number of change
/// intervals given to the primary response. A boundary below 2 leaves the
/// initiation window empty, and a boundary plus interval count reaching the
/// end of the axis leaves the secondary-response window empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWindows {
    n_timepoints: usize,
    breaks: [usize; 2],
}

impl StageWindows {
    pub fn new(boundary: usize, primary_intervals: usize, n_timepoints: usize) -> Result<Self> {
        if n_timepoints < 2 {
            return Err(TristageError::InvalidTimeAxis {
                reason: "At least two time points are required to derive stage windows"
                    .to_string(),
            });
        }

        let n_intervals = n_timepoints - 1;
        let first = boundary.saturating_sub(1).min(n_intervals);
        let second = (first + primary_intervals).min(n_intervals);

        Ok(StageWindows {
            n_timepoints,
            breaks: [first, second],
        })
    }

    pub fn n_timepoints(&self) -> usize {
        self.n_timepoints
    }

    /// Change-interval columns belonging to a stage
    pub fn interval_range(&self, stage: Stage) -> Range<usize> {
        match stage {
            Stage::Initiation => 0..self.breaks[0],
            Stage::PrimaryResponse => self.breaks[0]..self.breaks[1],
            Stage::SecondaryResponse => self.breaks[1]..self.n_timepoints - 1,
        }
    }

    /// Time-point columns spanned by a stage's intervals
    ///
    /// Empty when the stage holds no interval.
    pub fn point_range(&self, stage: Stage) -> Range<usize> {
        let intervals = self.interval_range(stage);
        if intervals.is_empty() {
            intervals
        } else {
            intervals.start..intervals.end + 1
        }
    }

    pub fn n_intervals(&self, stage: Stage) -> usize {
        self.interval_range(stage).len()
    }

    /// Earliest stage that owns at least one change interval
    pub fn earliest_stage(&self) -> Stage {
        for stage in Stage::ALL {
            if !self.interval_range(stage).is_empty() {
                return stage;
            }
        }
        Stage::SecondaryResponse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_partition_intervals() {
        let windows = StageWindows::new(2, 1, 5).unwrap();

        assert_eq!(windows.interval_range(Stage::Initiation), 0..1);
        assert_eq!(windows.interval_range(Stage::PrimaryResponse), 1..2);
        assert_eq!(windows.interval_range(Stage::SecondaryResponse), 2..4);

        assert_eq!(windows.point_range(Stage::Initiation), 0..2);
        assert_eq!(windows.point_range(Stage::PrimaryResponse), 1..3);
        assert_eq!(windows.point_range(Stage::SecondaryResponse), 2..5);

        assert_eq!(windows.earliest_stage(), Stage::Initiation);
    }

    #[test]
    fn test_low_boundary_empties_initiation() {
        for boundary in [0, 1] {
            let windows = StageWindows::new(boundary, 2, 5).unwrap();
            assert_eq!(windows.n_intervals(Stage::Initiation), 0);
            assert!(windows.point_range(Stage::Initiation).is_empty());
            assert_eq!(windows.interval_range(Stage::PrimaryResponse), 0..2);
            assert_eq!(windows.earliest_stage(), Stage::PrimaryResponse);
        }
    }

    #[test]
    fn test_late_boundary_empties_secondary() {
        let windows = StageWindows::new(4, 1, 5).unwrap();
        assert_eq!(windows.interval_range(Stage::Initiation), 0..3);
        assert_eq!(windows.interval_range(Stage::PrimaryResponse), 3..4);
        assert!(windows.interval_range(Stage::SecondaryResponse).is_empty());
        assert!(windows.point_range(Stage::SecondaryResponse).is_empty());
    }

    #[test]
    fn test_overlong_parameters_clamp_to_axis() {
        let windows = StageWindows::new(10, 10, 5).unwrap();
        assert_eq!(windows.interval_range(Stage::Initiation), 0..4);
        assert!(windows.interval_range(Stage::PrimaryResponse).is_empty());
        assert!(windows.interval_range(Stage::SecondaryResponse).is_empty());
        assert_eq!(windows.earliest_stage(), Stage::Initiation);
    }

    #[test]
    fn test_too_few_timepoints_rejected() {
        assert!(StageWindows::new(2, 1, 1).is_err());
    }
}
