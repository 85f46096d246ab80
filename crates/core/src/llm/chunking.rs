/// How media reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// The whole file goes inline in one request.
    Standard,
    /// Audio is split into WAV windows, summarized, then synthesized.
    Chunked,
}

pub fn submission_mode(size_bytes: u64, inline_limit_bytes: u64) -> SubmissionMode {
    if size_bytes <= inline_limit_bytes {
        SubmissionMode::Standard
    } else {
        SubmissionMode::Chunked
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub start_sample: usize,
    pub end_sample: usize,
}

impl ChunkWindow {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Fixed-length windows covering `[0, total)`; the last one is truncated.
pub fn plan_chunks(total_secs: f64, chunk_secs: f64, sample_rate: u32) -> Vec<ChunkWindow> {
    if !total_secs.is_finite() || total_secs <= 0.0 || chunk_secs <= 0.0 {
        return Vec::new();
    }

    let count = (total_secs / chunk_secs).ceil() as usize;
    let rate = f64::from(sample_rate);
    (0..count)
        .map(|index| {
            let start = index as f64 * chunk_secs;
            let end = (start + chunk_secs).min(total_secs);
            ChunkWindow {
                index,
                start,
                end,
                start_sample: (start * rate).floor() as usize,
                end_sample: (end * rate).floor() as usize,
            }
        })
        .collect()
}
