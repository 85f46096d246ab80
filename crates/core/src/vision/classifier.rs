use crate::{
    format::format_timestamp,
    types::{VideoEvent, VideoEventType, VideoFrameStats},
    vision::{
        ANGER_FRAMES, BROW_DOWN_THRESHOLD, CLOSED_POSTURE_SPAN, EVENT_BUCKET_SECONDS,
        LOOK_DOWN_THRESHOLD, POINTING_OFFSET, SMILE_THRESHOLD, STATIONARY_DISTANCE,
        STATIONARY_FRAMES, STICKY_FRAMES,
        landmarks::{FrameObservation, Landmark, UpperBody},
    },
};

/// The single behaviour a frame is attributed to, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    Writing,
    Pointing,
    Angry,
    Reading,
    Happy,
    Focused,
}

impl FrameClass {
    pub fn status(&self) -> &'static str {
        match self {
            FrameClass::Writing => "✍️ Writing on Board",
            FrameClass::Pointing => "👉 Pointing / Gesturing",
            FrameClass::Angry => "😠 Expression: Angry",
            FrameClass::Reading => "👀 Reading / Looking Down",
            FrameClass::Happy => "😊 Happy / Smiling",
            FrameClass::Focused => "✅ Focused on Class",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StickyCounter {
    remaining: u8,
}

impl StickyCounter {
    fn arm(&mut self) {
        self.remaining = STICKY_FRAMES;
    }

    /// Active on the trigger frame and for `STICKY_FRAMES` frames after it.
    fn step(&mut self, triggered: bool) -> bool {
        if triggered {
            self.arm();
            true
        } else if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
struct BucketTally {
    frames: u32,
    writing: u32,
    pointing: u32,
    angry: u32,
    happy: u32,
    reading: u32,
}

impl BucketTally {
    fn record(&mut self, class: FrameClass) {
        self.frames += 1;
        match class {
            FrameClass::Writing => self.writing += 1,
            FrameClass::Pointing => self.pointing += 1,
            FrameClass::Angry => self.angry += 1,
            FrameClass::Reading => self.reading += 1,
            FrameClass::Happy => self.happy += 1,
            FrameClass::Focused => {}
        }
    }

    fn dominant(&self) -> (VideoEventType, &'static str) {
        if self.writing > 2 {
            (VideoEventType::BoardWork, "Writing on Board")
        } else if self.pointing > 2 {
            (VideoEventType::Gesture, "Pointing / Explaining")
        } else if self.angry > 2 {
            (VideoEventType::Emotion, "Stern/Angry Expression")
        } else if self.happy > 2 {
            (VideoEventType::Emotion, "Smiling / Positive")
        } else if self.reading as f64 > self.frames as f64 * 0.5 {
            (VideoEventType::Gaze, "Reading Notes")
        } else {
            (VideoEventType::Engagement, "Teaching (Focused)")
        }
    }
}

/// Reduces per-frame model output into running statistics and an event log.
///
/// Frames must be fed in timestamp order, one per step.
#[derive(Debug)]
pub struct FrameClassifier {
    step: f64,
    stats: VideoFrameStats,
    events: Vec<VideoEvent>,
    prev_nose: Option<Landmark>,
    stationary_frames: u32,
    angry_frames: u32,
    writing: StickyCounter,
    pointing: StickyCounter,
    tally: BucketTally,
}

impl FrameClassifier {
    pub fn new(duration: f64, step: f64) -> Self {
        Self {
            step,
            stats: VideoFrameStats {
                total_time: duration,
                ..VideoFrameStats::default()
            },
            events: Vec::new(),
            prev_nose: None,
            stationary_frames: 0,
            angry_frames: 0,
            writing: StickyCounter::default(),
            pointing: StickyCounter::default(),
            tally: BucketTally::default(),
        }
    }

    pub fn observe(&mut self, t: f64, observation: &FrameObservation) -> FrameClass {
        let step = self.step;

        let mut is_angry = false;
        let mut is_reading = false;
        let mut is_happy = false;
        if let Some(face) = &observation.face {
            let shapes = &face.blendshapes;
            if shapes.brow_down() > BROW_DOWN_THRESHOLD {
                self.angry_frames += 1;
                if self.angry_frames == ANGER_FRAMES {
                    self.push_event(t, VideoEventType::Emotion, "😠 Sustained Anger");
                }
                is_angry = self.angry_frames >= ANGER_FRAMES;
            } else {
                self.angry_frames = 0;
            }

            if shapes.smile() > SMILE_THRESHOLD {
                is_happy = true;
                self.stats.happy_sec += step;
            }
            is_reading = shapes.look_down() > LOOK_DOWN_THRESHOLD;
        }

        let body = observation.pose.as_ref().and_then(|pose| pose.upper_body());
        let (writing_trigger, pointing_trigger) = match body {
            Some(body) => {
                self.track_movement(t, &body);
                self.track_posture(&body);
                (raised_wrist(&body), extended_wrist(&body))
            }
            None => (false, false),
        };

        let writing = self.writing.step(writing_trigger);
        let pointing = if writing {
            if pointing_trigger {
                self.pointing.arm();
            }
            false
        } else {
            self.pointing.step(pointing_trigger)
        };

        let class = if writing {
            self.stats.board_work_sec += step;
            self.stats.writing_count += 1.0;
            FrameClass::Writing
        } else if pointing {
            self.stats.writing_count += 0.5;
            FrameClass::Pointing
        } else if is_angry {
            self.stats.angry_sec += step;
            FrameClass::Angry
        } else if is_reading {
            self.stats.reading_sec += step;
            self.stats.current_reading_streak += step;
            self.stats.max_reading_streak = self
                .stats
                .max_reading_streak
                .max(self.stats.current_reading_streak);
            FrameClass::Reading
        } else {
            self.stats.current_reading_streak = 0.0;
            self.stats.focused_sec += step;
            if is_happy {
                FrameClass::Happy
            } else {
                self.stats.neutral_sec += step;
                FrameClass::Focused
            }
        };
        self.tally.record(class);

        if is_bucket_boundary(t, step) {
            let (event_type, desc) = self.tally.dominant();
            self.push_event(t, event_type, desc);
            self.tally = BucketTally::default();
        }

        class
    }

    fn track_movement(&mut self, t: f64, body: &UpperBody) {
        if let Some(prev) = self.prev_nose {
            let distance = body.nose.distance_2d(&prev);
            let score = (distance * 5000.0).min(100.0);
            self.stats.movement_scores.push(score);
            self.stats.movement_intensity = self.stats.movement_intensity * 0.9 + score * 0.1;

            if distance < STATIONARY_DISTANCE {
                self.stats.stationary_sec += self.step;
                self.stationary_frames += 1;
                if self.stationary_frames == STATIONARY_FRAMES {
                    self.push_event(t, VideoEventType::Engagement, "Stationary > 30s");
                }
            } else {
                self.stationary_frames = 0;
            }
        }
        self.prev_nose = Some(body.nose);
    }

    fn track_posture(&mut self, body: &UpperBody) {
        let span = (body.left_wrist.x - body.right_wrist.x).abs();
        let wrists_low =
            body.left_wrist.y > body.left_shoulder.y && body.right_wrist.y > body.right_shoulder.y;
        if span < CLOSED_POSTURE_SPAN && wrists_low {
            self.stats.closed_posture_sec += self.step;
        }
    }

    fn push_event(&mut self, t: f64, event_type: VideoEventType, desc: &str) {
        self.events.push(VideoEvent {
            time: format_timestamp(t),
            time_seconds: t,
            event_type,
            desc: desc.to_string(),
        });
    }

    pub fn stats(&self) -> &VideoFrameStats {
        &self.stats
    }

    pub fn events(&self) -> &[VideoEvent] {
        &self.events
    }

    pub fn finish(self) -> (VideoFrameStats, Vec<VideoEvent>) {
        (self.stats, self.events)
    }
}

fn raised_wrist(body: &UpperBody) -> bool {
    body.left_wrist.y < body.left_shoulder.y || body.right_wrist.y < body.right_shoulder.y
}

fn extended_wrist(body: &UpperBody) -> bool {
    (body.left_wrist.x - body.left_shoulder.x).abs() > POINTING_OFFSET
        || (body.right_wrist.x - body.right_shoulder.x).abs() > POINTING_OFFSET
}

/// True on the first frame at or past each 5 second mark.
fn is_bucket_boundary(t: f64, step: f64) -> bool {
    let second = t.floor() as i64;
    second % EVENT_BUCKET_SECONDS == 0 && second != (t - step).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{
        STEP_SECONDS,
        landmarks::{Blendshapes, FaceResult, PoseResult},
    };

    fn face(pairs: &[(&str, f64)]) -> FrameObservation {
        FrameObservation {
            face: Some(FaceResult {
                blendshapes: Blendshapes::from_pairs(pairs.iter().copied()),
                landmarks: Vec::new(),
            }),
            pose: None,
        }
    }

    fn angry() -> FrameObservation {
        face(&[("browDownLeft", 0.9), ("browDownRight", 0.9)])
    }

    /// Shoulders at y=0.4, wrists placed as given, nose at `nose_x`.
    fn pose(nose_x: f64, left_wrist: (f64, f64), right_wrist: (f64, f64)) -> FrameObservation {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); 33];
        landmarks[0] = Landmark::new(nose_x, 0.2);
        landmarks[11] = Landmark::new(0.45, 0.4);
        landmarks[12] = Landmark::new(0.55, 0.4);
        landmarks[15] = Landmark::new(left_wrist.0, left_wrist.1);
        landmarks[16] = Landmark::new(right_wrist.0, right_wrist.1);
        FrameObservation {
            face: None,
            pose: Some(PoseResult { landmarks }),
        }
    }

    fn run(frames: &[FrameObservation]) -> FrameClassifier {
        let mut classifier = FrameClassifier::new(frames.len() as f64 * STEP_SECONDS, STEP_SECONDS);
        for (i, frame) in frames.iter().enumerate() {
            classifier.observe(i as f64 * STEP_SECONDS, frame);
        }
        classifier
    }

    fn anger_events(classifier: &FrameClassifier) -> usize {
        classifier
            .events()
            .iter()
            .filter(|event| event.desc == "😠 Sustained Anger")
            .count()
    }

    #[test]
    fn thirty_nine_angry_frames_emit_nothing() {
        let mut frames = vec![angry(); 39];
        frames.extend(vec![face(&[]); 10]);
        let classifier = run(&frames);
        assert_eq!(anger_events(&classifier), 0);
        assert_eq!(classifier.stats().angry_sec, 0.0);
    }

    #[test]
    fn fortieth_angry_frame_emits_once() {
        let mut classifier = FrameClassifier::new(30.0, STEP_SECONDS);
        for i in 0..39 {
            classifier.observe(i as f64 * STEP_SECONDS, &angry());
        }
        assert_eq!(anger_events(&classifier), 0);

        assert_eq!(classifier.observe(39.0 * STEP_SECONDS, &angry()), FrameClass::Angry);
        assert_eq!(anger_events(&classifier), 1);
        let event = classifier
            .events()
            .iter()
            .find(|event| event.desc == "😠 Sustained Anger")
            .unwrap();
        assert_eq!(event.time, "00:09");

        for i in 40..80 {
            classifier.observe(i as f64 * STEP_SECONDS, &angry());
        }
        assert_eq!(anger_events(&classifier), 1);
    }

    #[test]
    fn writing_persists_four_frames_after_trigger() {
        let raised = pose(0.5, (0.45, 0.1), (0.55, 0.6));
        let lowered = pose(0.5, (0.45, 0.6), (0.55, 0.6));

        let mut classifier = FrameClassifier::new(10.0, STEP_SECONDS);
        assert_eq!(classifier.observe(0.25, &raised), FrameClass::Writing);
        for i in 0..4 {
            let t = 0.5 + i as f64 * STEP_SECONDS;
            assert_eq!(classifier.observe(t, &lowered), FrameClass::Writing, "frame {i}");
        }
        assert_ne!(classifier.observe(1.5, &lowered), FrameClass::Writing);
        assert_eq!(classifier.stats().writing_count, 5.0);
        assert_eq!(classifier.stats().board_work_sec, 5.0 * STEP_SECONDS);
    }

    #[test]
    fn pointing_yields_to_writing_and_counts_half() {
        let pointing = pose(0.5, (0.1, 0.6), (0.55, 0.6));
        let mut classifier = FrameClassifier::new(10.0, STEP_SECONDS);
        assert_eq!(classifier.observe(0.25, &pointing), FrameClass::Pointing);
        assert_eq!(classifier.stats().writing_count, 0.5);

        let both = pose(0.5, (0.1, 0.1), (0.55, 0.6));
        assert_eq!(classifier.observe(0.5, &both), FrameClass::Writing);
    }

    #[test]
    fn stationary_event_after_thirty_seconds() {
        let still = pose(0.5, (0.45, 0.6), (0.55, 0.6));
        let classifier = run(&vec![still; 125]);
        let stationary: Vec<_> = classifier
            .events()
            .iter()
            .filter(|event| event.desc == "Stationary > 30s")
            .collect();
        assert_eq!(stationary.len(), 1);
        // The first frame has no previous nose, so the 120th still frame is frame 120.
        assert_eq!(stationary[0].time_seconds, 120.0 * STEP_SECONDS);
        assert_eq!(stationary[0].event_type, VideoEventType::Engagement);
    }

    #[test]
    fn closed_posture_needs_both_wrists_low() {
        let closed = pose(0.5, (0.48, 0.6), (0.52, 0.6));
        let half_raised = pose(0.5, (0.48, 0.6), (0.52, 0.3));
        let classifier = run(&[closed.clone(), closed, half_raised]);
        assert_eq!(classifier.stats().closed_posture_sec, 2.0 * STEP_SECONDS);
    }

    #[test]
    fn movement_scores_are_capped_and_smoothed() {
        let classifier = run(&[
            pose(0.5, (0.45, 0.6), (0.55, 0.6)),
            pose(0.51, (0.45, 0.6), (0.55, 0.6)),
            pose(0.9, (0.45, 0.6), (0.55, 0.6)),
        ]);
        let scores = &classifier.stats().movement_scores;
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 50.0).abs() < 1e-6);
        assert_eq!(scores[1], 100.0);
        assert!((classifier.stats().movement_intensity - (5.0 * 0.9 + 10.0)).abs() < 1e-6);
    }

    #[test]
    fn buckets_close_every_five_seconds() {
        let smiling = face(&[("mouthSmileLeft", 0.8), ("mouthSmileRight", 0.8)]);
        let classifier = run(&vec![smiling; 40]);
        let buckets: Vec<_> = classifier
            .events()
            .iter()
            .map(|event| (event.time.as_str(), event.desc.as_str()))
            .collect();
        // t=0 closes a one-frame bucket, t=5 closes the next twenty frames.
        assert_eq!(
            buckets,
            vec![("00:00", "Teaching (Focused)"), ("00:05", "Smiling / Positive")]
        );
        assert_eq!(classifier.stats().happy_sec, 40.0 * STEP_SECONDS);
        assert_eq!(classifier.stats().neutral_sec, 0.0);
    }

    #[test]
    fn reading_majority_and_streak() {
        let reading = face(&[("eyeLookDownLeft", 0.9), ("eyeLookDownRight", 0.9)]);
        let mut frames = vec![reading.clone(); 8];
        frames.push(face(&[]));
        frames.extend(vec![reading; 12]);
        let classifier = run(&frames);

        assert_eq!(classifier.stats().max_reading_streak, 12.0 * STEP_SECONDS);
        assert_eq!(classifier.stats().reading_sec, 20.0 * STEP_SECONDS);
        assert_eq!(classifier.events().last().unwrap().desc, "Reading Notes");
    }
}
