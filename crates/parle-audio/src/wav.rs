use std::io::Cursor;

use parle_core::error::{ParleError, Result};

/// Encodes captured f32 samples as a mono 16-bit PCM WAV document.
///
/// Interleaved multi-channel input is downmixed by averaging each frame.
/// Samples are clamped to [-1.0, 1.0] before conversion so hot input cannot
/// wrap around.
pub fn encode_wav_mono16(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    if channels == 0 {
        return Err(ParleError::Audio("Channel count must be non-zero".to_string()));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| ParleError::Audio(format!("Failed to create WAV writer: {e}")))?;
        for frame in samples.chunks(channels as usize) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            let clamped = mono.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * 32767.0) as i16)
                .map_err(|e| ParleError::Audio(format!("Failed to write WAV sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| ParleError::Audio(format!("Failed to finalize WAV: {e}")))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_mono_input_passes_through() {
        let bytes = encode_wav_mono16(&[0.0, 0.5, -0.5], 1, 48_000).unwrap();
        let (spec, samples) = read_back(&bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples, vec![0, 16383, -16383]);
    }

    #[test]
    fn test_stereo_frames_are_averaged() {
        // Frame 1 averages to 0.5, frame 2 to 0.0.
        let bytes = encode_wav_mono16(&[1.0, 0.0, 0.5, -0.5], 2, 44_100).unwrap();
        let (spec, samples) = read_back(&bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(samples, vec![16383, 0]);
    }

    #[test]
    fn test_hot_samples_are_clamped() {
        let bytes = encode_wav_mono16(&[2.0, -3.0], 1, 16_000).unwrap();
        let (_, samples) = read_back(&bytes);
        assert_eq!(samples, vec![32767, -32767]);
    }

    #[test]
    fn test_empty_capture_yields_valid_header() {
        let bytes = encode_wav_mono16(&[], 1, 16_000).unwrap();
        let (spec, samples) = read_back(&bytes);
        assert_eq!(spec.sample_rate, 16_000);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_zero_channels_is_rejected() {
        assert!(matches!(
            encode_wav_mono16(&[0.0], 0, 16_000),
            Err(ParleError::Audio(_))
        ));
    }
}
