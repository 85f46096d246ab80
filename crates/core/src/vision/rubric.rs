use crate::types::{RubricScores, VideoFrameStats, VideoRatios};

/// Turn accumulated seconds into shares of the video duration.
pub fn compute_ratios(stats: &VideoFrameStats) -> VideoRatios {
    let duration = if stats.total_time > 0.0 {
        stats.total_time
    } else {
        1.0
    };

    let avg_movement = if stats.movement_scores.is_empty() {
        0.0
    } else {
        stats.movement_scores.iter().sum::<f64>() / stats.movement_scores.len() as f64
    };

    VideoRatios {
        focus: stats.focused_sec / duration,
        reading: stats.reading_sec / duration,
        happy: stats.happy_sec / duration,
        neutral: stats.neutral_sec / duration,
        angry: stats.angry_sec / duration,
        board_work: stats.board_work_sec / duration,
        closed_posture: stats.closed_posture_sec / duration,
        stationary: stats.stationary_sec / duration,
        gestures_per_min: stats.writing_count / (duration / 60.0),
        max_reading_streak: stats.max_reading_streak,
        avg_movement,
    }
}

pub fn compute_rubric(ratios: &VideoRatios) -> RubricScores {
    let mut engagement: f64 = 60.0;
    if ratios.gestures_per_min > 8.0 {
        engagement += 20.0;
    }
    if ratios.focus + ratios.board_work > 0.8 {
        engagement += 20.0;
    }

    let mut delivery: f64 = 50.0;
    if ratios.board_work > 0.15 {
        delivery += 25.0;
    }
    if ratios.focus > 0.4 {
        delivery += 25.0;
    }

    let mut professionalism: f64 = 80.0;
    if ratios.happy > 0.1 {
        professionalism += 20.0;
    }
    if ratios.angry > 0.05 {
        professionalism -= 30.0;
    }
    if ratios.closed_posture > 0.4 {
        professionalism -= 10.0;
    }
    if ratios.reading > 0.3 {
        professionalism -= 20.0;
    }

    let engagement = engagement.clamp(0.0, 100.0);
    let delivery = delivery.clamp(0.0, 100.0);
    let professionalism = professionalism.clamp(0.0, 100.0);

    RubricScores {
        engagement,
        delivery,
        professionalism,
        visual_score: engagement * 0.4 + delivery * 0.3 + professionalism * 0.3,
    }
}

/// Share of time spent at the board or facing the class, as a percentage.
pub fn teaching_score(ratios: &VideoRatios) -> f64 {
    (ratios.board_work + ratios.focus) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_divides_by_one() {
        let stats = VideoFrameStats {
            focused_sec: 0.5,
            ..VideoFrameStats::default()
        };
        assert_eq!(compute_ratios(&stats).focus, 0.5);
    }

    #[test]
    fn strong_lesson_maxes_out() {
        let ratios = VideoRatios {
            focus: 0.7,
            board_work: 0.2,
            happy: 0.2,
            gestures_per_min: 12.0,
            ..VideoRatios::default()
        };
        let rubric = compute_rubric(&ratios);
        assert_eq!(rubric.engagement, 100.0);
        assert_eq!(rubric.delivery, 100.0);
        assert_eq!(rubric.professionalism, 100.0);
        assert_eq!(rubric.visual_score, 100.0);
        assert!((teaching_score(&ratios) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn penalties_stack() {
        let ratios = VideoRatios {
            angry: 0.1,
            closed_posture: 0.5,
            reading: 0.4,
            ..VideoRatios::default()
        };
        let rubric = compute_rubric(&ratios);
        assert_eq!(rubric.engagement, 60.0);
        assert_eq!(rubric.delivery, 50.0);
        assert_eq!(rubric.professionalism, 20.0);
        assert!((rubric.visual_score - (24.0 + 15.0 + 6.0)).abs() < 1e-9);
    }
}
