//! Minimal RIFF/WAVE PCM16 codec. Samples are interleaved and normalised to
//! [-1.0, 1.0].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("Not a RIFF/WAVE file")]
    NotWave,
    #[error("Unsupported WAV encoding: {0}")]
    Unsupported(String),
    #[error("WAV file is truncated or missing the {0} chunk")]
    MissingChunk(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl Audio {
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: 1,
            samples,
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

fn u16_at(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32_at(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn decode(data: &[u8]) -> Result<Audio, WavError> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format: Option<(u16, u32)> = None;
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32_at(data, pos + 4).ok_or(WavError::NotWave)? as usize;
        let body_start = pos + 8;
        let body_end = body_start.saturating_add(size).min(data.len());
        let body = &data[body_start..body_end];

        match id {
            b"fmt " => {
                let tag = u16_at(body, 0).ok_or(WavError::MissingChunk("fmt"))?;
                let channels = u16_at(body, 2).ok_or(WavError::MissingChunk("fmt"))?;
                let sample_rate = u32_at(body, 4).ok_or(WavError::MissingChunk("fmt"))?;
                let bits = u16_at(body, 14).ok_or(WavError::MissingChunk("fmt"))?;
                if tag != 1 || bits != 16 {
                    return Err(WavError::Unsupported(format!(
                        "format tag {tag}, {bits} bits per sample (expected PCM16)"
                    )));
                }
                if channels == 0 {
                    return Err(WavError::Unsupported("zero channels".to_string()));
                }
                format = Some((channels, sample_rate));
            }
            b"data" => {
                let (channels, sample_rate) = format.ok_or(WavError::MissingChunk("fmt"))?;
                let samples = body
                    .chunks_exact(2)
                    .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
                    .collect();
                return Ok(Audio {
                    sample_rate,
                    channels,
                    samples,
                });
            }
            _ => {}
        }

        // Chunks are word-aligned.
        pos = body_start.saturating_add(size).saturating_add(size & 1);
    }

    Err(WavError::MissingChunk("data"))
}

pub fn encode(audio: &Audio) -> Vec<u8> {
    let channels = audio.channels.max(1);
    let data_len = (audio.samples.len() * 2) as u32;
    let block_align = channels * 2;
    let byte_rate = audio.sample_rate * u32::from(block_align);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in &audio.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        out.extend_from_slice(&((clamped * 32767.0).round() as i16).to_le_bytes());
    }
    out
}
