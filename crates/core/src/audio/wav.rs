use bytes::{BufMut, Bytes, BytesMut};

use crate::media::DecodedAudio;

pub const WAV_HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = 2;

/// Convert a float sample to PCM16.
///
/// Negative values scale by 32768 and non-negative values by 32767, so -1.0
/// maps to `i16::MIN` and 1.0 to `i16::MAX`.
pub fn float_to_pcm16(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32768.0) as i16
    } else {
        (sample * 32767.0) as i16
    }
}

/// Encode `[start_sample, end_sample)` of the first channel as a mono PCM16 WAV.
///
/// The data chunk always holds `end_sample - start_sample` samples: positions
/// past the end of the source are written as silence, so the declared and
/// actual lengths never disagree. An inverted range yields an empty data chunk.
pub fn encode_wav(audio: &DecodedAudio, start_sample: usize, end_sample: usize) -> Bytes {
    let frames = end_sample.saturating_sub(start_sample);
    let data_len = frames * BLOCK_ALIGN as usize;
    let sample_rate = audio.sample_rate();

    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + data_len);
    buf.put_slice(b"RIFF");
    buf.put_u32_le((WAV_HEADER_LEN - 8 + data_len) as u32);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1);
    buf.put_u16_le(1);
    buf.put_u32_le(sample_rate);
    buf.put_u32_le(sample_rate * BLOCK_ALIGN as u32);
    buf.put_u16_le(BLOCK_ALIGN);
    buf.put_u16_le(BITS_PER_SAMPLE);

    buf.put_slice(b"data");
    buf.put_u32_le(data_len as u32);

    let source = audio.channel_data();
    for index in start_sample..start_sample + frames {
        let value = source.get(index).copied().map_or(0, float_to_pcm16);
        buf.put_i16_le(value);
    }

    buf.freeze()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn ramp(len: usize) -> DecodedAudio {
        let samples = (0..len).map(|i| i as f32 / len as f32 * 2.0 - 1.0).collect();
        DecodedAudio::new(22_050, samples)
    }

    #[test]
    fn asymmetric_scaling() {
        assert_eq!(float_to_pcm16(-1.0), -32768);
        assert_eq!(float_to_pcm16(1.0), 32767);
        assert_eq!(float_to_pcm16(0.0), 0);
        assert_eq!(float_to_pcm16(-0.5), -16384);
        assert_eq!(float_to_pcm16(0.5), 16383);
        assert_eq!(float_to_pcm16(3.0), 32767);
        assert_eq!(float_to_pcm16(-3.0), -32768);
    }

    #[test]
    fn header_decodes_to_input_format() {
        let audio = ramp(1_000);
        let wav = encode_wav(&audio, 100, 600);
        assert_eq!(wav.len(), 500 * 2 + WAV_HEADER_LEN);

        let reader = hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 500);

        let first: i16 = reader.into_samples().next().unwrap().unwrap();
        assert_eq!(first, float_to_pcm16(audio.channel_data()[100]));
    }

    #[test]
    fn range_ending_exactly_at_source_end_has_no_padding() {
        let audio = DecodedAudio::new(8_000, vec![0.25; 10]);
        let wav = encode_wav(&audio, 6, 10);
        assert_eq!(wav.len(), 4 * 2 + WAV_HEADER_LEN);
        let data = &wav[WAV_HEADER_LEN..];
        assert!(data.chunks(2).all(|pair| i16::from_le_bytes([pair[0], pair[1]]) == 8191));
    }

    #[test]
    fn range_past_source_end_is_zero_padded() {
        let audio = DecodedAudio::new(8_000, vec![0.25; 10]);
        let wav = encode_wav(&audio, 8, 14);
        assert_eq!(wav.len(), 6 * 2 + WAV_HEADER_LEN);
        assert_eq!(&wav[40..44], &12u32.to_le_bytes());

        let samples: Vec<i16> = wav[WAV_HEADER_LEN..]
            .chunks(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples, vec![8191, 8191, 0, 0, 0, 0]);
    }

    #[test]
    fn inverted_range_is_header_only() {
        let audio = ramp(10);
        let wav = encode_wav(&audio, 5, 2);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(&wav[4..8], &36u32.to_le_bytes());
    }
}
