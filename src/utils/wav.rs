//! WAV container framing for raw PCM audio
//!
//! Wraps little-endian linear PCM into a canonical 44-byte-header RIFF/WAVE
//! container so browsers and other players can decode it without a codec.
//! The header layout is written explicitly so the output is byte-for-byte
//! deterministic for identical inputs.

use bytes::{BufMut, Bytes, BytesMut};
use hound::{SampleFormat, WavSpec};
use thiserror::Error;

/// Size of the canonical PCM WAV header in bytes
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the `fmt ` chunk body for plain PCM
const PCM_FMT_CHUNK_SIZE: u32 = 16;

/// WAVE_FORMAT_PCM
const PCM_FORMAT_TAG: u16 = 1;

/// Errors that can occur while framing PCM audio
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("Unsupported sample format: only 16-bit integer PCM can be framed")]
    UnsupportedFormat,

    #[error("Invalid channel count: {0}")]
    InvalidChannels(u16),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("PCM payload too large for a WAV container: {0} bytes")]
    PayloadTooLarge(usize),
}

pub type WavResult<T> = Result<T, WavError>;

/// Format descriptor for 16-bit mono PCM at the given rate.
#[inline]
pub fn mono_pcm16(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Frame raw PCM bytes into a WAV container described by `spec`.
///
/// The resulting buffer is `WAV_HEADER_SIZE + pcm.len()` bytes long. The RIFF
/// size field is `36 + pcm.len()` and the data size field is `pcm.len()`.
pub fn frame_pcm(pcm: &[u8], spec: WavSpec) -> WavResult<Bytes> {
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavError::UnsupportedFormat);
    }
    if spec.channels == 0 {
        return Err(WavError::InvalidChannels(spec.channels));
    }
    if spec.sample_rate == 0 {
        return Err(WavError::InvalidSampleRate(spec.sample_rate));
    }

    let data_size =
        u32::try_from(pcm.len()).map_err(|_| WavError::PayloadTooLarge(pcm.len()))?;
    let riff_size = data_size
        .checked_add(36)
        .ok_or(WavError::PayloadTooLarge(pcm.len()))?;

    let bytes_per_sample = spec.bits_per_sample / 8;
    let block_align = spec
        .channels
        .checked_mul(bytes_per_sample)
        .ok_or(WavError::InvalidChannels(spec.channels))?;
    let byte_rate = spec
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or(WavError::InvalidSampleRate(spec.sample_rate))?;

    let mut buf = BytesMut::with_capacity(WAV_HEADER_SIZE + pcm.len());

    // RIFF header
    buf.put_slice(b"RIFF");
    buf.put_u32_le(riff_size);
    buf.put_slice(b"WAVE");

    // fmt chunk
    buf.put_slice(b"fmt ");
    buf.put_u32_le(PCM_FMT_CHUNK_SIZE);
    buf.put_u16_le(PCM_FORMAT_TAG);
    buf.put_u16_le(spec.channels);
    buf.put_u32_le(spec.sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(spec.bits_per_sample);

    // data chunk
    buf.put_slice(b"data");
    buf.put_u32_le(data_size);
    buf.put_slice(pcm);

    Ok(buf.freeze())
}

/// Frame 16-bit mono PCM at `sample_rate` into a WAV container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> WavResult<Bytes> {
    frame_pcm(pcm, mono_pcm16(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ])
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([buf[offset], buf[offset + 1]])
    }

    #[test]
    fn test_empty_payload_produces_bare_header() {
        let wav = pcm_to_wav(&[], 24000).unwrap();

        assert_eq!(wav.len(), WAV_HEADER_SIZE);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn test_header_fields_for_24khz_mono() {
        let pcm = vec![0x11u8; 1000];
        let wav = pcm_to_wav(&pcm, 24000).unwrap();

        assert_eq!(wav.len(), WAV_HEADER_SIZE + 1000);
        assert_eq!(u32_at(&wav, 4), 36 + 1000);
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1); // PCM
        assert_eq!(u16_at(&wav, 22), 1); // channels
        assert_eq!(u32_at(&wav, 24), 24000); // sample rate
        assert_eq!(u32_at(&wav, 28), 48000); // byte rate
        assert_eq!(u16_at(&wav, 32), 2); // block align
        assert_eq!(u16_at(&wav, 34), 16); // bits per sample
        assert_eq!(u32_at(&wav, 40), 1000);
        assert_eq!(&wav[WAV_HEADER_SIZE..], &pcm[..]);
    }

    #[test]
    fn test_stereo_byte_rate_and_block_align() {
        let spec = WavSpec {
            channels: 2,
            ..mono_pcm16(16000)
        };
        let wav = frame_pcm(&[0u8; 8], spec).unwrap();

        assert_eq!(u16_at(&wav, 22), 2);
        assert_eq!(u32_at(&wav, 28), 16000 * 2 * 2);
        assert_eq!(u16_at(&wav, 32), 4);
    }

    #[test]
    fn test_framing_is_deterministic() {
        let pcm: Vec<u8> = (0..480u32).map(|i| (i % 251) as u8).collect();
        let first = pcm_to_wav(&pcm, 24000).unwrap();
        let second = pcm_to_wav(&pcm, 24000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_decodes_with_hound() {
        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 1234, -4321];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = pcm_to_wav(&pcm, 24000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap();
        assert_eq!(reader.spec(), mono_pcm16(24000));

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_rejects_non_pcm16_specs() {
        let float_spec = WavSpec {
            sample_format: SampleFormat::Float,
            bits_per_sample: 32,
            ..mono_pcm16(24000)
        };
        assert_eq!(
            frame_pcm(&[], float_spec),
            Err(WavError::UnsupportedFormat)
        );

        let eight_bit = WavSpec {
            bits_per_sample: 8,
            ..mono_pcm16(24000)
        };
        assert_eq!(frame_pcm(&[], eight_bit), Err(WavError::UnsupportedFormat));
    }

    #[test]
    fn test_rejects_zero_channels_and_rate() {
        let no_channels = WavSpec {
            channels: 0,
            ..mono_pcm16(24000)
        };
        assert_eq!(
            frame_pcm(&[], no_channels),
            Err(WavError::InvalidChannels(0))
        );
        assert_eq!(pcm_to_wav(&[], 0), Err(WavError::InvalidSampleRate(0)));
    }

    #[test]
    fn test_header_overflow_is_an_error() {
        assert_eq!(
            pcm_to_wav(&[0u8; 4], 3_000_000_000),
            Err(WavError::InvalidSampleRate(3_000_000_000))
        );

        let wide = WavSpec {
            channels: u16::MAX,
            ..mono_pcm16(24000)
        };
        assert_eq!(
            frame_pcm(&[], wide),
            Err(WavError::InvalidChannels(u16::MAX))
        );

        // largest rate whose byte rate still fits
        let wav = pcm_to_wav(&[], u32::MAX / 2).unwrap();
        assert_eq!(u32_at(&wav, 28), (u32::MAX / 2) * 2);
    }
}
