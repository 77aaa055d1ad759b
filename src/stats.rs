use crate::models::{Measure, SeriesPoint, Year};
use serde::Serialize;

/// A mean that remembers whether it had anything to average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Average {
    pub value: f64,
    pub samples: usize,
    /// Set when no present values were found; `value` is then 0.
    pub insufficient_data: bool,
}

impl Average {
    pub fn of(values: impl IntoIterator<Item = Measure>) -> Self {
        let (sum, samples) = values
            .into_iter()
            .filter_map(Measure::value)
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

        if samples == 0 {
            return Self {
                value: 0.0,
                samples: 0,
                insufficient_data: true,
            };
        }

        Self {
            value: sum / samples as f64,
            samples,
            insufficient_data: false,
        }
    }

    pub fn as_measure(&self) -> Measure {
        if self.insufficient_data {
            Measure::Missing
        } else {
            Measure::Present(self.value)
        }
    }
}

/// Mean rate across the rows of one year.
pub fn mean_rate_for_year(points: &[SeriesPoint], year: Year) -> Average {
    Average::of(
        points
            .iter()
            .filter(|point| point.year == year)
            .map(|point| point.value),
    )
}
