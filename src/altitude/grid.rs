use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AltitudeError;

pub const DEFAULT_MAX_POINTS: usize = 20_000;
pub const DEFAULT_MAX_STEP_SECONDS: i64 = 3600;
/// Largest step a deployment may allow.
pub const STEP_SECONDS_CEILING: i64 = 86_400;

/// Bounds on what a single window may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridLimits {
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_max_step_seconds")]
    pub max_step_seconds: i64,
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

fn default_max_step_seconds() -> i64 {
    DEFAULT_MAX_STEP_SECONDS
}

impl GridLimits {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_points == 0 {
            return Err("max_points must be at least 1".into());
        }
        if !(1..=STEP_SECONDS_CEILING).contains(&self.max_step_seconds) {
            return Err(format!(
                "max_step_seconds must be between 1 and {}, got {}",
                STEP_SECONDS_CEILING, self.max_step_seconds
            ));
        }
        Ok(())
    }
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            max_step_seconds: DEFAULT_MAX_STEP_SECONDS,
        }
    }
}

/// A validated sampling window. Construction fails rather than producing a
/// window that would exceed the configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_seconds: i64,
    #[serde(skip)]
    step_ms: i64,
    #[serde(skip)]
    points: usize,
}

impl TimeWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: i64,
        limits: &GridLimits,
    ) -> Result<Self, AltitudeError> {
        if start >= end {
            return Err(AltitudeError::InvalidWindow(
                "Start time must be before end time".into(),
            ));
        }
        if step_seconds < 1 {
            return Err(AltitudeError::InvalidWindow(format!(
                "step_seconds must be at least 1, got {}",
                step_seconds
            )));
        }
        if step_seconds > limits.max_step_seconds {
            return Err(AltitudeError::InvalidWindow(format!(
                "step_seconds must be at most {}, got {}",
                limits.max_step_seconds, step_seconds
            )));
        }

        let step_ms = step_seconds.checked_mul(1000).ok_or_else(|| {
            AltitudeError::InvalidWindow(format!("step_seconds {} is out of range", step_seconds))
        })?;

        let requested = count_points(start, end, step_ms);
        if requested > limits.max_points as u64 {
            return Err(AltitudeError::TooManyPoints {
                requested,
                max: limits.max_points,
            });
        }

        Ok(Self {
            start,
            end,
            step_seconds,
            step_ms,
            points: requested as usize,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn step_seconds(&self) -> i64 {
        self.step_seconds
    }

    pub fn point_count(&self) -> usize {
        self.points
    }

    pub fn grid(&self) -> TimeGrid {
        TimeGrid {
            start: self.start,
            step_ms: self.step_ms,
            count: self.points,
        }
    }
}

/// `floor((end - start) / step) + 1`, computed on whole milliseconds.
fn count_points(start: DateTime<Utc>, end: DateTime<Utc>, step_ms: i64) -> u64 {
    let span_ms = (end - start).num_milliseconds();
    (span_ms / step_ms) as u64 + 1
}

/// Evenly spaced sample instants over a [`TimeWindow`].
#[derive(Debug, Clone, Copy)]
pub struct TimeGrid {
    start: DateTime<Utc>,
    step_ms: i64,
    count: usize,
}

impl TimeGrid {
    /// Each instant is `start + i * step`, so there is no accumulated drift.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = DateTime<Utc>> + '_ {
        (0..self.count).map(move |i| self.start + Duration::milliseconds(i as i64 * self.step_ms))
    }

    pub fn point_count(&self) -> usize {
        self.count
    }
}
