use crate::types::AnalysisReport;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_range(start: f64, end: f64) -> String {
    format!("{}–{}", format_timestamp(start), format_timestamp(end))
}

/// Format an analysis report as human-readable markdown
pub fn format_report_readable(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Classroom Report: {}\n\n", report.media_name));
    output.push_str(&format!(
        "**Duration:** {} | **Report:** {}\n\n",
        format_timestamp(report.duration_secs),
        report.id
    ));

    if let Some(ai) = &report.ai {
        output.push_str(&format!(
            "**Subject:** {} | **Overall rating:** {:.1}/5\n\n",
            ai.subject, ai.overall_rating
        ));

        output.push_str("## Scores\n\n");
        output.push_str(&format!(
            "• Clarity: {:.0}\n• Examples: {:.0}\n• Doubt resolution: {:.0}\n• Engagement: {:.0}\n• Simplification: {:.0}\n\n",
            ai.metrics.clarity_score,
            ai.metrics.example_quality,
            ai.metrics.doubt_resolution,
            ai.metrics.student_engagement,
            ai.metrics.content_simplification
        ));

        let sections = [
            ("Timeline", &ai.timeline_narrative),
            ("Body Language", &ai.video_analysis.visual_summary),
            ("Interaction", &ai.interaction_summary),
            ("Classroom Environment", &ai.disturbance_conclusion),
            ("Areas to Improve", &ai.metrics.areas_to_improve),
            ("Way to Improve", &ai.metrics.way_to_improve),
            ("Feedback", &ai.feedback),
        ];
        for (title, body) in sections {
            if !body.is_empty() {
                output.push_str(&format!("## {}\n\n{}\n\n", title, body));
            }
        }

        let coverage = &ai.syllabus_coverage;
        if !coverage.covered_topics.is_empty() || !coverage.missing_topics.is_empty() {
            output.push_str("## Syllabus Coverage\n\n");
            for topic in &coverage.covered_topics {
                output.push_str(&format!("✓ {}\n", topic));
            }
            for topic in &coverage.missing_topics {
                output.push_str(&format!("✗ {}\n", topic));
            }
            output.push('\n');
        }
    }

    if let Some(audio) = &report.audio_report
        && !audio.timeline.is_empty()
    {
        output.push_str("## Interaction Timeline\n\n");
        for turn in &audio.timeline {
            output.push_str(&format!(
                "[{}] {} ({}): {}\n",
                format_range(turn.start, turn.end),
                turn.speaker,
                turn.emotion,
                turn.content
            ));
        }
        output.push('\n');
    }

    if let Some(signal) = &report.signal {
        output.push_str("## Voice\n\n");
        output.push_str(&format!(
            "Average pitch {:.0} Hz | Loudness (RMS) {:.3} | Pace {:.0} bpm\n\n",
            signal.avg_pitch_hz, signal.avg_rms, signal.estimated_pace_bpm
        ));
    }

    if let Some(video) = &report.video {
        output.push_str("## Presence\n\n");
        output.push_str(&format!(
            "Engagement {:.0} | Delivery {:.0} | Professionalism {:.0} | Visual score {:.0}\n\n",
            video.rubric.engagement,
            video.rubric.delivery,
            video.rubric.professionalism,
            video.rubric.visual_score
        ));
        for event in &video.events {
            output.push_str(&format!(
                "[{}] {}: {}\n",
                event.time,
                event.event_type.as_str(),
                event.desc
            ));
        }
        output.push('\n');
    }

    let disturbed: Vec<_> = report
        .disturbance_timeline
        .iter()
        .filter(|bucket| bucket.has_disturbance)
        .collect();
    if !disturbed.is_empty() {
        output.push_str("## Disturbances\n\n");
        for bucket in disturbed {
            output.push_str(&format!(
                "[{}] {}\n",
                format_range(bucket.start, bucket.end),
                bucket.events.join(", ")
            ));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_zero_padded() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.9), "01:05");
        assert_eq!(format_timestamp(600.0), "10:00");
        assert_eq!(format_range(30.0, 45.5), "00:30–00:45");
    }
}
