use crate::types::{DisturbanceBucket, EmotionSegment};

pub const BUCKET_SECONDS: f64 = 30.0;

/// Partition `[0, total_duration)` into 30 second buckets and collect the
/// disturbances of every segment that starts inside each one.
///
/// Events keep first-seen order and are deduplicated per bucket.
pub fn build_disturbance_timeline(
    total_duration: f64,
    segments: &[EmotionSegment],
) -> Vec<DisturbanceBucket> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Vec::new();
    }

    let count = (total_duration / BUCKET_SECONDS).ceil() as usize;
    (0..count)
        .map(|index| {
            let start = index as f64 * BUCKET_SECONDS;
            let end = (start + BUCKET_SECONDS).min(total_duration);

            let mut events: Vec<String> = Vec::new();
            for segment in segments
                .iter()
                .filter(|segment| segment.start >= start && segment.start < end)
            {
                for event in &segment.disturbances {
                    if !events.contains(event) {
                        events.push(event.clone());
                    }
                }
            }

            DisturbanceBucket {
                start,
                end,
                has_disturbance: !events.is_empty(),
                events,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmotionLabel, RawEmotion};

    fn segment(start: f64, disturbances: &[&str]) -> EmotionSegment {
        EmotionSegment {
            start,
            end: start + 10.0,
            emotion: EmotionLabel::Neutral,
            confidence: 0.5,
            raw_emotion: RawEmotion::default(),
            disturbances: disturbances.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn buckets_cover_duration_contiguously() {
        for total in [0.5, 29.9, 30.0, 30.1, 95.0, 3601.0] {
            let buckets = build_disturbance_timeline(total, &[]);
            assert_eq!(buckets.len(), (total / 30.0).ceil() as usize, "total {total}");
            assert_eq!(buckets[0].start, 0.0);
            assert_eq!(buckets.last().unwrap().end, total);
            for pair in buckets.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn empty_or_invalid_duration_has_no_buckets() {
        assert!(build_disturbance_timeline(0.0, &[segment(0.0, &["Noise"])]).is_empty());
        assert!(build_disturbance_timeline(f64::NAN, &[]).is_empty());
    }

    #[test]
    fn events_are_unioned_per_bucket() {
        let segments = vec![
            segment(40.0, &["Chatter"]),
            segment(0.0, &["Door slam"]),
            segment(10.0, &["Chatter", "Door slam"]),
            segment(20.0, &[]),
            segment(65.0, &[]),
        ];
        let buckets = build_disturbance_timeline(70.0, &segments);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].events, vec!["Door slam", "Chatter"]);
        assert!(buckets[0].has_disturbance);
        assert_eq!(buckets[1].events, vec!["Chatter"]);
        assert!(!buckets[2].has_disturbance);
        assert_eq!(buckets[2].end, 70.0);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let segments = vec![segment(5.0, &["Bell"])];
        assert_eq!(
            build_disturbance_timeline(45.0, &segments),
            build_disturbance_timeline(45.0, &segments)
        );
    }
}
