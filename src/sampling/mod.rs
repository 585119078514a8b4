//! Reduction of raw coverage arrays into plot-ready series.
//!
//! A track's sampling size `s` defines the bucket width. Random and mean
//! sampling use buckets of `b = s - 1` values, median sampling uses buckets of
//! `s` values. Sampling sizes below [`MIN_SAMPLING_SIZE`] disable reduction.
//!
//! | Strategy | Point per bucket | Position |
//! |----------|------------------|----------|
//! | none     | every value      | `start + i` |
//! | random   | one random value | `start + chosen`, region end for a short last bucket |
//! | mean     | integer mean     | bucket center, `end - r/2` for a remainder of `r` |
//! | median   | lower median     | bucket center, `end - r/2` for a remainder of `r` |
//!
//! Every bucket, including a trailing partial one, yields exactly one point.

use rand::Rng;

use crate::core::coverage::{CoverageTrack, MIN_SAMPLING_SIZE};
use crate::core::types::SamplingType;

/// An ordered plot series with strictly increasing positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(u64, u32)>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest value in the series, 0 when empty
    pub fn max_value(&self) -> u32 {
        self.points.iter().map(|&(_, v)| v).max().unwrap_or(0)
    }
}

/// Strategy actually applied to a track: small sampling sizes force
/// [`SamplingType::None`] regardless of the request.
pub fn effective_strategy(track: &CoverageTrack<'_>, requested: SamplingType) -> SamplingType {
    if track.sampling_size < MIN_SAMPLING_SIZE {
        SamplingType::None
    } else {
        requested
    }
}

/// Reduce one track's coverage with the requested strategy.
///
/// The input array is never modified. `rng` is only consulted for
/// [`SamplingType::Random`].
pub fn reduce<R: Rng + ?Sized>(
    track: &CoverageTrack<'_>,
    requested: SamplingType,
    rng: &mut R,
) -> Series {
    let info = track.info;
    let coverage = info.coverage.as_slice();

    let points = match effective_strategy(track, requested) {
        SamplingType::None => sample_none(info.start, coverage),
        SamplingType::Random => {
            sample_random(info.start, info.end, coverage, track.sampling_size - 1, rng)
        }
        SamplingType::Mean => sample_mean(info.start, info.end, coverage, track.sampling_size - 1),
        SamplingType::Median => sample_median(info.start, info.end, coverage, track.sampling_size),
    };

    Series {
        label: info.source.clone(),
        points,
    }
}

/// Reduce every track, keeping track order
pub fn reduce_all<R: Rng + ?Sized>(
    tracks: &[CoverageTrack<'_>],
    requested: SamplingType,
    rng: &mut R,
) -> Vec<Series> {
    tracks.iter().map(|t| reduce(t, requested, rng)).collect()
}

fn sample_none(start: u64, coverage: &[u32]) -> Vec<(u64, u32)> {
    coverage
        .iter()
        .enumerate()
        .map(|(i, &value)| (start + i as u64, value))
        .collect()
}

fn sample_random<R: Rng + ?Sized>(
    start: u64,
    end: u64,
    coverage: &[u32],
    bucket: usize,
    rng: &mut R,
) -> Vec<(u64, u32)> {
    let n = coverage.len();
    let mut points = Vec::with_capacity(n.div_ceil(bucket));

    for i in (0..n).step_by(bucket) {
        let chosen = i + rng.gen_range(0..bucket);

        if i + bucket > n {
            // Short last bucket: clamp the index and anchor the point at the region end
            let index = chosen.min(n - 1);
            points.push((end, coverage[index]));
        } else {
            points.push((start + chosen as u64, coverage[chosen]));
        }
    }

    points
}

fn sample_mean(start: u64, end: u64, coverage: &[u32], bucket: usize) -> Vec<(u64, u32)> {
    let mut points = Vec::with_capacity(coverage.len() / bucket + 1);
    let mut sum: u64 = 0;
    let mut count = 0usize;

    for (i, &value) in coverage.iter().enumerate() {
        sum += u64::from(value);
        count += 1;

        if count == bucket {
            let position = start + (i - bucket / 2) as u64;
            points.push((position, integer_mean(sum, count)));
            sum = 0;
            count = 0;
        }
    }

    if count > 0 {
        points.push((end.saturating_sub((count / 2) as u64), integer_mean(sum, count)));
    }

    points
}

fn sample_median(start: u64, end: u64, coverage: &[u32], bucket: usize) -> Vec<(u64, u32)> {
    let mut points = Vec::with_capacity(coverage.len() / bucket + 1);
    let mut values: Vec<u32> = Vec::with_capacity(bucket);

    for (i, &value) in coverage.iter().enumerate() {
        values.push(value);

        if values.len() == bucket {
            let position = start + (i - bucket / 2) as u64;
            points.push((position, lower_median(&mut values)));
            values.clear();
        }
    }

    if !values.is_empty() {
        let remainder = values.len();
        points.push((
            end.saturating_sub((remainder / 2) as u64),
            lower_median(&mut values),
        ));
    }

    points
}

#[allow(clippy::cast_possible_truncation)] // Mean of u32 values fits in u32
fn integer_mean(sum: u64, count: usize) -> u32 {
    (sum / count as u64) as u32
}

/// Sorts in place and returns the lower of the two middle values on even lengths
fn lower_median(values: &mut [u32]) -> u32 {
    values.sort_unstable();
    values[(values.len() - 1) / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coverage::CoverageInfo;
    use crate::core::types::SourceKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn info(start: u64, coverage: Vec<u32>) -> CoverageInfo {
        let end = start + coverage.len() as u64 - 1;
        CoverageInfo::new("hts_test", SourceKind::Alignment, start, end, coverage)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_none_is_identity() {
        let info = info(100, vec![5, 0, 3, 9]);
        let track = CoverageTrack::new(&info).with_sampling_size(10);
        let series = reduce(&track, SamplingType::None, &mut rng());

        assert_eq!(series.label, "hts_test");
        assert_eq!(series.points, vec![(100, 5), (101, 0), (102, 3), (103, 9)]);
    }

    #[test]
    fn test_small_sampling_size_forces_none() {
        let info = info(1, (0..20).collect());
        for size in [0, 1, 2] {
            let track = CoverageTrack::new(&info).with_sampling_size(size);
            assert_eq!(effective_strategy(&track, SamplingType::Mean), SamplingType::None);
            let series = reduce(&track, SamplingType::Median, &mut rng());
            assert_eq!(series.len(), 20);
            assert_eq!(series.points[0], (1, 0));
            assert_eq!(series.points[19], (20, 19));
        }
    }

    #[test]
    fn test_mean_buckets_and_remainder() {
        // sampling size 5 -> buckets of 4
        let info = info(100, (1..=10).collect());
        let track = CoverageTrack::new(&info).with_sampling_size(5);
        let series = reduce(&track, SamplingType::Mean, &mut rng());

        assert_eq!(series.points, vec![(101, 2), (105, 6), (108, 9)]);
    }

    #[test]
    fn test_mean_point_count() {
        for n in 1..60u32 {
            let info = info(1, vec![1; n as usize]);
            let track = CoverageTrack::new(&info).with_sampling_size(8);
            let bucket = 7;
            let expected = n as usize / bucket + usize::from(n as usize % bucket > 0);
            let series = reduce(&track, SamplingType::Mean, &mut rng());
            assert_eq!(series.len(), expected, "n = {n}");
            assert!(series.points.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }

    #[test]
    fn test_median_lower_middle_tie_break() {
        let info = info(10, vec![4, 1, 3, 2, 8, 6, 7, 5, 9]);
        let track = CoverageTrack::new(&info).with_sampling_size(4);
        let series = reduce(&track, SamplingType::Median, &mut rng());

        assert_eq!(series.points, vec![(11, 2), (15, 6), (18, 9)]);
    }

    #[test]
    fn test_median_uses_full_sampling_size() {
        for n in 1..60u32 {
            let info = info(1, (0..n).collect());
            let track = CoverageTrack::new(&info).with_sampling_size(6);
            let expected = n as usize / 6 + usize::from(n as usize % 6 > 0);
            let series = reduce(&track, SamplingType::Median, &mut rng());
            assert_eq!(series.len(), expected, "n = {n}");
        }
    }

    #[test]
    fn test_median_does_not_mutate_input() {
        let info = info(1, vec![9, 3, 7, 1, 5]);
        let track = CoverageTrack::new(&info).with_sampling_size(3);
        let _ = reduce(&track, SamplingType::Median, &mut rng());
        assert_eq!(info.coverage, vec![9, 3, 7, 1, 5]);
    }

    #[test]
    fn test_random_picks_within_bucket() {
        // Values equal their index so the emitted value reveals the chosen index
        let info = info(1000, (0..103).collect());
        let track = CoverageTrack::new(&info).with_sampling_size(11);
        let bucket = 10;

        let mut rng = rng();
        for _ in 0..20 {
            let series = reduce(&track, SamplingType::Random, &mut rng);
            assert_eq!(series.len(), 103usize.div_ceil(bucket));

            for (k, &(position, value)) in series.points.iter().enumerate() {
                let bucket_start = (k * bucket) as u32;
                assert!(value >= bucket_start && value < bucket_start + bucket as u32);
                if k + 1 < series.len() {
                    assert_eq!(position, 1000 + u64::from(value));
                }
            }

            // 103 values in buckets of 10 leave a short last bucket
            assert_eq!(series.points.last().unwrap().0, info.end);
        }
    }

    #[test]
    fn test_random_point_count() {
        let mut rng = rng();
        for n in 1..80usize {
            let info = info(1, vec![3; n]);
            let track = CoverageTrack::new(&info).with_sampling_size(4);
            let series = reduce(&track, SamplingType::Random, &mut rng);
            assert_eq!(series.len(), n.div_ceil(3), "n = {n}");
            assert!(series.points.windows(2).all(|w| w[0].0 < w[1].0));
            if n % 3 != 0 {
                assert_eq!(series.points.last().unwrap().0, info.end);
            }
        }
    }

    #[test]
    fn test_empty_coverage() {
        let info = CoverageInfo::new("OM", SourceKind::OpticalMap, 1, 100, Vec::new());
        let track = CoverageTrack::new(&info).with_sampling_size(10);
        for strategy in [
            SamplingType::None,
            SamplingType::Random,
            SamplingType::Mean,
            SamplingType::Median,
        ] {
            assert!(reduce(&track, strategy, &mut rng()).is_empty());
        }
    }

    #[test]
    fn test_reduce_all_keeps_order() {
        let a = info(1, vec![1, 2, 3]);
        let mut b = info(1, vec![4, 5, 6]);
        b.source = "OM".to_string();
        let tracks = [CoverageTrack::new(&a), CoverageTrack::new(&b)];

        let series = reduce_all(&tracks, SamplingType::Mean, &mut rng());
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "OM");
        assert_eq!(series[1].max_value(), 6);
    }
}
