//! Display metrics derived from a client's cumulative progress.
//!
//! Every function here is total: empty histories and zero totals degrade to `0`
//! (or [`QualityTrend::Unknown`]) instead of failing, because the leaderboard renders
//! these values for every client unconditionally.

use serde::{Deserialize, Serialize};

use super::domain::ClientProgress;

/// Share of the combined score contributed by on-time delivery, in percent.
pub const SPEED_WEIGHT_PCT: u32 = 60;
/// Share of the combined score contributed by the quality average, in percent.
pub const QUALITY_WEIGHT_PCT: u32 = 40;

/// Number of most recent scores compared against the window before them.
pub const TREND_WINDOW: usize = 3;
/// Mean difference (in score points) a window must exceed to count as a trend.
pub const TREND_THRESHOLD: u32 = 5;

/// Direction of a client's recent quality scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTrend {
    Improving,
    Declining,
    Stable,
    Unknown,
}

impl QualityTrend {
    pub fn label(&self) -> &'static str {
        match self {
            QualityTrend::Improving => "improving",
            QualityTrend::Declining => "declining",
            QualityTrend::Stable => "stable",
            QualityTrend::Unknown => "not enough data",
        }
    }
}

/// Weighted ranking score held in hundredths of a point so equal scores compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CombinedScore(u32);

impl CombinedScore {
    pub fn hundredths(&self) -> u32 {
        self.0
    }

    /// Score on the 0-100 scale used for display.
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

/// Percentage of deliveries that landed on or before their deadline.
pub fn speed_score(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    round_half_up_ratio(100 * completed, total) as u8
}

/// Mean of all recorded quality scores, rounded half up.
pub fn quality_average(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u64 = scores.iter().map(|score| u64::from(*score)).sum();
    round_half_up_ratio(sum, scores.len() as u64).min(100) as u8
}

/// Coarse two-window heuristic: the mean of the last three scores against the mean of
/// the three before them. It is not a statistical test.
pub fn quality_trend(scores: &[u8]) -> QualityTrend {
    if scores.len() < TREND_WINDOW * 2 {
        return QualityTrend::Unknown;
    }

    let split = scores.len() - TREND_WINDOW;
    let recent = window_sum(&scores[split..]);
    let previous = window_sum(&scores[split - TREND_WINDOW..split]);

    // Compare sums instead of means to stay in integers.
    let threshold = i64::from(TREND_THRESHOLD) * TREND_WINDOW as i64;
    let difference = recent - previous;
    if difference > threshold {
        QualityTrend::Improving
    } else if difference < -threshold {
        QualityTrend::Declining
    } else {
        QualityTrend::Stable
    }
}

/// `0.6 * speed + 0.4 * quality`.
pub fn combined_score(speed: u8, quality: u8) -> CombinedScore {
    CombinedScore(SPEED_WEIGHT_PCT * u32::from(speed) + QUALITY_WEIGHT_PCT * u32::from(quality))
}

/// All derived metrics for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorecard {
    pub speed_score: u8,
    pub quality_average: u8,
    pub quality_trend: QualityTrend,
    pub combined_score: CombinedScore,
}

impl Scorecard {
    pub fn for_client(client: &ClientProgress) -> Self {
        Self::from_counters(
            client.on_time_completed,
            client.on_time_total,
            &client.quality_scores,
        )
    }

    pub fn from_counters(on_time_completed: u32, on_time_total: u32, scores: &[u8]) -> Self {
        let speed_score = speed_score(on_time_completed, on_time_total);
        let quality_average = quality_average(scores);
        Self {
            speed_score,
            quality_average,
            quality_trend: quality_trend(scores),
            combined_score: combined_score(speed_score, quality_average),
        }
    }
}

fn round_half_up_ratio(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

fn window_sum(window: &[u8]) -> i64 {
    window.iter().map(|score| i64::from(*score)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn speed_score_is_zero_without_deliveries() {
        assert_eq!(speed_score(0, 0), 0);
        assert_eq!(speed_score(7, 0), 0);
    }

    #[test]
    fn speed_score_rounds_half_up() {
        assert_eq!(speed_score(1, 3), 33);
        assert_eq!(speed_score(2, 3), 67);
        assert_eq!(speed_score(1, 8), 13);
        assert_eq!(speed_score(1, 200), 1);
        assert_eq!(speed_score(5, 5), 100);
    }

    #[test]
    fn quality_average_rounds_half_up() {
        assert_eq!(quality_average(&[]), 0);
        assert_eq!(quality_average(&[80, 85]), 83);
        assert_eq!(quality_average(&[70, 71, 71]), 71);
        assert_eq!(quality_average(&[100, 100]), 100);
    }

    #[test]
    fn trend_needs_six_scores() {
        assert_eq!(quality_trend(&[10, 90, 10, 90, 10]), QualityTrend::Unknown);
    }

    #[test]
    fn trend_detects_improvement_and_decline() {
        assert_eq!(
            quality_trend(&[50, 50, 50, 90, 90, 90]),
            QualityTrend::Improving
        );
        assert_eq!(
            quality_trend(&[95, 90, 92, 70, 72, 71]),
            QualityTrend::Declining
        );
    }

    #[test]
    fn trend_only_looks_at_the_last_six_scores() {
        assert_eq!(
            quality_trend(&[10, 10, 80, 80, 80, 85, 85, 85]),
            QualityTrend::Stable
        );
    }

    #[test]
    fn trend_threshold_is_strict() {
        // means differ by exactly five points
        assert_eq!(quality_trend(&[70, 70, 70, 75, 75, 75]), QualityTrend::Stable);
        assert_eq!(quality_trend(&[70, 70, 70, 75, 75, 76]), QualityTrend::Improving);
        assert_eq!(quality_trend(&[75, 75, 75, 70, 70, 70]), QualityTrend::Stable);
        assert_eq!(quality_trend(&[75, 75, 76, 70, 70, 70]), QualityTrend::Declining);
    }

    #[test]
    fn combined_score_blends_sixty_forty() {
        assert_eq!(combined_score(100, 80).hundredths(), 9_200);
        assert_eq!(combined_score(50, 90).hundredths(), 6_600);
        assert!((combined_score(100, 80).value() - 92.0).abs() < f64::EPSILON);
        assert!((combined_score(33, 71).value() - 48.2).abs() < 1e-9);
    }

    #[test]
    fn scorecard_bundles_all_metrics() {
        let card = Scorecard::from_counters(3, 4, &[60, 60, 60, 80, 80, 80]);
        assert_eq!(card.speed_score, 75);
        assert_eq!(card.quality_average, 70);
        assert_eq!(card.quality_trend, QualityTrend::Improving);
        assert_eq!(card.combined_score, combined_score(75, 70));
    }

    proptest! {
        #[test]
        fn quality_average_matches_rounded_mean(scores in prop::collection::vec(0u8..=100, 1..40)) {
            let average = quality_average(&scores);
            let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
            let expected = (f64::from(sum) / scores.len() as f64 + 0.5).floor() as u8;
            prop_assert_eq!(average, expected);
            prop_assert!(average <= 100);
        }

        #[test]
        fn speed_score_stays_in_percent_range(total in 1u32..500, completed in 0u32..500) {
            let completed = completed.min(total);
            let score = speed_score(completed, total);
            prop_assert!(score <= 100);
            if completed == total {
                prop_assert_eq!(score, 100);
            }
        }
    }
}
