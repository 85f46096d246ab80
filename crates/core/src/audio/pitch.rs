/// Estimates the fundamental frequency of a short window of samples.
pub trait PitchDetector: Send + Sync {
    /// Returns the pitch in Hz, or `None` when the window is unvoiced.
    fn detect(&self, window: &[f32]) -> Option<f64>;
}

pub const DEFAULT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 0.1;

/// Time-domain YIN estimator (de Cheveigné & Kawahara, 2002).
#[derive(Debug, Clone)]
pub struct Yin {
    sample_rate: f64,
    threshold: f64,
    probability_threshold: f64,
}

impl Yin {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            threshold: DEFAULT_THRESHOLD,
            probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
        }
    }

    /// Cumulative mean normalized difference over the first half of `window`.
    fn normalized_difference(window: &[f32]) -> Vec<f64> {
        // Largest power of two that fits, halved.
        let size = 1usize << window.len().ilog2();
        let half = size / 2;
        let mut yin = vec![0.0f64; half];

        for tau in 1..half {
            let mut sum = 0.0;
            for i in 0..half {
                let delta = window[i] as f64 - window[i + tau] as f64;
                sum += delta * delta;
            }
            yin[tau] = sum;
        }

        yin[0] = 1.0;
        let mut running = 0.0;
        for (tau, value) in yin.iter_mut().enumerate().skip(1) {
            running += *value;
            *value = if running > 0.0 {
                *value * tau as f64 / running
            } else {
                1.0
            };
        }
        yin
    }

    fn refine(yin: &[f64], tau: usize) -> f64 {
        let x0 = if tau < 1 { tau } else { tau - 1 };
        let x2 = if tau + 1 < yin.len() { tau + 1 } else { tau };

        if x0 == tau {
            return if yin[tau] <= yin[x2] { tau as f64 } else { x2 as f64 };
        }
        if x2 == tau {
            return if yin[tau] <= yin[x0] { tau as f64 } else { x0 as f64 };
        }

        let (s0, s1, s2) = (yin[x0], yin[tau], yin[x2]);
        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator == 0.0 {
            return tau as f64;
        }
        tau as f64 + (s2 - s0) / denominator
    }
}

impl PitchDetector for Yin {
    fn detect(&self, window: &[f32]) -> Option<f64> {
        if window.len() < 4 {
            return None;
        }
        let yin = Self::normalized_difference(window);

        let mut tau = 2;
        let mut found = None;
        while tau < yin.len() {
            if yin[tau] < self.threshold {
                while tau + 1 < yin.len() && yin[tau + 1] < yin[tau] {
                    tau += 1;
                }
                found = Some(tau);
                break;
            }
            tau += 1;
        }

        let tau = found?;
        let probability = 1.0 - yin[tau];
        if probability <= self.probability_threshold {
            return None;
        }

        let period = Self::refine(&yin, tau);
        (period > 0.0).then(|| self.sample_rate / period)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.6)
            .collect()
    }

    #[test]
    fn detects_voice_range_sine() {
        let yin = Yin::new(16_000);
        let pitch = yin.detect(&sine(220.0, 16_000, 2048)).unwrap();
        assert!((pitch - 220.0).abs() < 2.0, "got {pitch}");

        let pitch = yin.detect(&sine(130.0, 16_000, 2048)).unwrap();
        assert!((pitch - 130.0).abs() < 2.0, "got {pitch}");
    }

    #[test]
    fn silence_is_unvoiced() {
        let yin = Yin::new(16_000);
        assert_eq!(yin.detect(&[0.0; 2048]), None);
    }
}
