use crate::error::{Result, SpectraChirpError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

pub const WAV_HEADER_SIZE: usize = 44;
pub const BYTES_PER_SAMPLE: usize = 2;

/// Decoded audio held in memory: one sample vector per channel, all the
/// same length, values nominally in [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![samples],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(SpectraChirpError::InvalidAudioBuffer(
                "buffer has no channels".into(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(SpectraChirpError::InvalidAudioBuffer(
                "sample rate must be positive".into(),
            ));
        }
        let len = self.channels[0].len();
        if self.channels.iter().any(|c| c.len() != len) {
            return Err(SpectraChirpError::InvalidAudioBuffer(
                "channels have differing sample counts".into(),
            ));
        }
        Ok(())
    }
}

/// Convert one float sample to signed 16-bit PCM.
///
/// Clamps to [-1, 1], then scales negative values by 32768 and non-negative
/// values by 32767, truncating toward zero (so 0.5 maps to 16383 and -0.5 to
/// -16384).
fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Serialize an [`AudioBuffer`] into a canonical 16-bit PCM WAV byte stream.
///
/// Only channel 0 is serialized, but the header declares the buffer's full
/// channel count and sizes the data chunk as `samples * channels * 2` bytes;
/// for multi-channel buffers the region past the mono samples is zero-filled.
/// This matches the upload format the decode service already accepts.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    buffer.validate()?;

    let num_channels = buffer.num_channels();
    let samples = &buffer.channels[0];
    let data_length = samples.len() * num_channels * BYTES_PER_SAMPLE;
    let byte_rate = buffer.sample_rate * num_channels as u32 * BYTES_PER_SAMPLE as u32;
    let block_align = (num_channels * BYTES_PER_SAMPLE) as u16;

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + data_length);

    out.extend_from_slice(b"RIFF");
    out.write_u32::<LittleEndian>(36 + data_length as u32).unwrap();
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(num_channels as u16).unwrap();
    out.write_u32::<LittleEndian>(buffer.sample_rate).unwrap();
    out.write_u32::<LittleEndian>(byte_rate).unwrap();
    out.write_u16::<LittleEndian>(block_align).unwrap();
    out.write_u16::<LittleEndian>(16).unwrap();

    out.extend_from_slice(b"data");
    out.write_u32::<LittleEndian>(data_length as u32).unwrap();

    for &sample in samples {
        out.write_i16::<LittleEndian>(sample_to_i16(sample)).unwrap();
    }
    out.resize(WAV_HEADER_SIZE + data_length, 0);

    Ok(out)
}

/// Parse a canonical 16-bit PCM WAV byte stream back into float samples.
///
/// Returns the samples and the sample rate. Only the fixed 44-byte mono
/// header layout produced by the signal service is accepted.
pub fn decode_wav(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    if data.len() < WAV_HEADER_SIZE {
        return Err(SpectraChirpError::InvalidWav(format!(
            "too short: {} bytes",
            data.len()
        )));
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(SpectraChirpError::InvalidWav("missing RIFF/WAVE magic".into()));
    }
    if &data[12..16] != b"fmt " {
        return Err(SpectraChirpError::InvalidWav("missing fmt chunk".into()));
    }

    let mut cursor = Cursor::new(&data[16..]);
    let fmt_len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let format_tag = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let num_channels = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let sample_rate = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let _byte_rate = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let _block_align = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
    let bits_per_sample = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;

    if fmt_len != 16 || format_tag != 1 {
        return Err(SpectraChirpError::InvalidWav(format!(
            "unsupported format (fmt len {}, tag {})",
            fmt_len, format_tag
        )));
    }
    if bits_per_sample != 16 {
        return Err(SpectraChirpError::InvalidWav(format!(
            "unsupported bit depth: {}",
            bits_per_sample
        )));
    }
    // interleaved data would be misread as mono
    if num_channels != 1 {
        return Err(SpectraChirpError::InvalidWav(format!(
            "expected mono audio, got {} channels",
            num_channels
        )));
    }
    if &data[36..40] != b"data" {
        return Err(SpectraChirpError::InvalidWav("missing data chunk".into()));
    }

    let mut cursor = Cursor::new(&data[40..]);
    let data_length = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))? as usize;
    if data.len() < WAV_HEADER_SIZE + data_length {
        return Err(SpectraChirpError::InvalidWav(format!(
            "data chunk declares {} bytes but only {} present",
            data_length,
            data.len() - WAV_HEADER_SIZE
        )));
    }

    let mut cursor = Cursor::new(&data[WAV_HEADER_SIZE..WAV_HEADER_SIZE + data_length]);
    let mut samples = Vec::with_capacity(data_length / BYTES_PER_SAMPLE);
    for _ in 0..data_length / BYTES_PER_SAMPLE {
        let value = cursor
            .read_i16::<LittleEndian>()
            .map_err(|e| SpectraChirpError::InvalidWav(e.to_string()))?;
        // mirrors the asymmetric scaling used on encode
        let sample = if value < 0 {
            value as f32 / 32768.0
        } else {
            value as f32 / 32767.0
        };
        samples.push(sample);
    }

    Ok((samples, sample_rate))
}
