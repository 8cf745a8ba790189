/// Reduction of the sample window to a single averaged reading
use crate::engine::buffer::SampleBuffer;
use crate::models::AggregateResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// The buffer held no samples at all
    Empty,
    /// Samples were examined but none had both fields valid
    NoUsableData { total: usize },
    Ready(AggregateResult),
}

/// Calculate the mean temperature and humidity over the valid pairs in `buffer`
///
/// Only samples where both fields are valid contribute to either sum. Sums are
/// accumulated in f64 so that a full window does not lose precision.
pub fn aggregate(buffer: &SampleBuffer) -> Aggregation {
    let total = buffer.len();
    if total == 0 {
        return Aggregation::Empty;
    }

    let (temp_sum, humid_sum, count) = buffer.valid_pairs().fold(
        (0.0f64, 0.0f64, 0usize),
        |(ts, hs, n), (t, h)| (ts + f64::from(t), hs + f64::from(h), n + 1),
    );

    if count == 0 {
        return Aggregation::NoUsableData { total };
    }

    Aggregation::Ready(AggregateResult {
        temperature: (temp_sum / count as f64) as f32,
        humidity: (humid_sum / count as f64) as f32,
        valid_count: count,
        total_count: total,
    })
}
