//! Synthetic audio and simple PCM effects. None of this aims for fidelity:
//! speech and music are tone stacks, effects are sample-domain one-liners.

use std::f32::consts::TAU;

use rustfft::{num_complex::Complex, FftPlanner};
use serde_json::json;

use super::wav::{self, Audio};
use super::{OpError, Output, Params};

pub const SYNTH_OPERATIONS: &[&str] = &["speech", "music"];
pub const FILE_OPERATIONS: &[&str] = &[
    "reverb",
    "echo",
    "distortion",
    "normalize",
    "noise_gate",
    "analyze",
];

const SPEECH_RATE: u32 = 22_050;
const MUSIC_RATE: u32 = 44_100;
const MAX_SYNTH_SECONDS: f32 = 60.0;
/// Spectral features look at the first ~3 s at 22.05 kHz.
const MAX_SPECTRUM_FRAMES: usize = 1 << 16;
const DOMINANT_PEAKS: usize = 10;
const ROLLOFF_SHARE: f64 = 0.85;

pub fn run(operation: &str, params: Params<'_>, source: Option<&[u8]>) -> Result<Output, OpError> {
    match operation {
        "speech" => Ok(wav_output(synthesize_speech(params)?)),
        "music" => Ok(wav_output(synthesize_music(params))),
        op if FILE_OPERATIONS.contains(&op) => {
            let bytes = source.ok_or_else(|| OpError::MissingSource(op.to_string()))?;
            let audio = wav::decode(bytes)?;
            if op == "analyze" {
                return Output::json(&analyze(&audio));
            }
            Ok(wav_output(apply_effect(op, audio, params)))
        }
        other => Err(OpError::Unsupported {
            family: super::Family::Audio,
            operation: other.to_string(),
        }),
    }
}

fn wav_output(audio: Audio) -> Output {
    let metadata = json!({
        "sample_rate": audio.sample_rate,
        "channels": audio.channels,
        "duration_seconds": audio.duration_seconds(),
    });
    Output {
        bytes: wav::encode(&audio),
        extension: "wav",
        metadata,
    }
}

fn sine(freq: f32, t: f32) -> f32 {
    (TAU * freq * t).sin()
}

// ─── Synthesis ──────────────────────────────────────────────────────────────

/// 0.1 s per character at speed 1.0; three partials under a decay envelope.
fn synthesize_speech(params: Params<'_>) -> Result<Audio, OpError> {
    let text = params.str_or("text", "").trim();
    if text.is_empty() {
        return Err(OpError::InvalidInput("speech requires non-empty 'text'".to_string()));
    }
    let speed = params.f64_or("speed", 1.0).clamp(0.25, 4.0) as f32;
    let pitch = params.f64_or("pitch", 1.0).clamp(0.25, 4.0) as f32;

    let duration = (text.chars().count() as f32 * 0.1 / speed).min(MAX_SYNTH_SECONDS);
    let base = 200.0 * pitch;
    let rate = SPEECH_RATE as f32;
    let len = (duration * rate) as usize;

    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let tone = 0.3 * sine(base, t) + 0.2 * sine(base * 2.5, t) + 0.1 * sine(base * 4.0, t);
            tone * (-0.5 * t).exp()
        })
        .collect();
    Ok(Audio::mono(SPEECH_RATE, samples))
}

fn key_frequency(key: &str) -> f32 {
    match key.trim().to_ascii_uppercase().as_str() {
        "C" => 261.63,
        "D" => 293.66,
        "E" => 329.63,
        "F" => 349.23,
        "G" => 392.00,
        "B" => 493.88,
        _ => 440.00,
    }
}

/// Major-triad partials pulsed at the tempo.
fn synthesize_music(params: Params<'_>) -> Audio {
    let duration = (params.f64_or("duration", 10.0) as f32).clamp(1.0, MAX_SYNTH_SECONDS);
    let tempo = (params.f64_or("tempo", 120.0) as f32).clamp(20.0, 300.0);
    let base = key_frequency(params.str_or("key", "A"));
    let mood = params.str_or("mood", "neutral");

    let rate = MUSIC_RATE as f32;
    let beat = tempo / 60.0;
    let len = (duration * rate) as usize;

    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let mut chord: f32 = [1.0f32, 1.25, 1.5, 2.0]
                .iter()
                .map(|h| (0.3 / h) * sine(base * h, t))
                .sum();
            chord *= 0.5 * sine(beat, t) + 0.5;
            match mood {
                "calm" => chord * 0.5,
                "energetic" => chord * 1.2 + 0.2 * sine(base * 3.0, t),
                _ => chord,
            }
        })
        .collect();
    Audio::mono(MUSIC_RATE, samples)
}

// ─── Effects ────────────────────────────────────────────────────────────────

fn apply_effect(op: &str, mut audio: Audio, params: Params<'_>) -> Audio {
    let channels = usize::from(audio.channels.max(1));
    let rate = audio.sample_rate as f64;
    let samples = &mut audio.samples;

    match op {
        "reverb" => {
            let room = params.f64_or("room_size", 0.5).clamp(0.0, 1.0);
            let damp = params.f64_or("dampening", 0.5).clamp(0.0, 1.0) as f32;
            let max_delay = (rate * 0.1 * room) as usize * channels;
            let dry = samples.clone();
            for tap in 1..5 {
                let delay = max_delay * tap / 4;
                let gain = (1.0 - damp).powi(tap as i32);
                add_delayed(samples, &dry, delay, gain);
            }
        }
        "echo" => {
            let delay_ms = params.f64_or("delay_ms", 300.0).clamp(0.0, 5_000.0);
            let feedback = params.f64_or("feedback", 0.3).clamp(0.0, 1.0) as f32;
            let delay = (rate * delay_ms / 1000.0) as usize * channels;
            let dry = samples.clone();
            add_delayed(samples, &dry, delay, feedback);
        }
        "distortion" => {
            let gain = params.f64_or("gain", 2.0) as f32;
            let threshold = (params.f64_or("threshold", 0.5) as f32).clamp(0.0, 1.0);
            for s in samples.iter_mut() {
                *s = (*s * gain).clamp(-threshold, threshold);
            }
        }
        "normalize" => {
            let loudest = peak(samples);
            if loudest > 0.0 {
                for s in samples.iter_mut() {
                    *s /= loudest;
                }
            }
        }
        "noise_gate" => {
            let threshold = params.f64_or("threshold", 0.01) as f32;
            let ratio = (params.f64_or("ratio", 10.0) as f32).max(1.0);
            for s in samples.iter_mut() {
                if s.abs() <= threshold {
                    *s /= ratio;
                }
            }
        }
        _ => {}
    }
    audio
}

/// Adds `dry` shifted by `delay` samples; the tail past the original length is cut.
fn add_delayed(out: &mut [f32], dry: &[f32], delay: usize, gain: f32) {
    if delay == 0 {
        return;
    }
    for (target, source) in out.iter_mut().skip(delay).zip(dry) {
        *target += source * gain;
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

// ─── Analysis ───────────────────────────────────────────────────────────────

fn analyze(audio: &Audio) -> serde_json::Value {
    let n = audio.samples.len();
    let rms = if n == 0 {
        0.0
    } else {
        (audio.samples.iter().map(|s| f64::from(*s).powi(2)).sum::<f64>() / n as f64).sqrt()
    };
    let crossings = audio
        .samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    let zero_crossing_rate = if n > 1 {
        crossings as f64 / (n - 1) as f64
    } else {
        0.0
    };

    let spectrum = spectrum(audio);
    json!({
        "duration_seconds": audio.duration_seconds(),
        "sample_rate": audio.sample_rate,
        "channels": audio.channels,
        "rms": rms,
        "zero_crossing_rate": zero_crossing_rate,
        "peak": peak(&audio.samples),
        "dominant_frequencies": spectrum.dominant_frequencies,
        "spectral_centroid": round2(spectrum.centroid),
        "spectral_bandwidth": round2(spectrum.bandwidth),
        "spectral_rolloff": round2(spectrum.rolloff),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Averages interleaved channels into one.
fn mixdown(audio: &Audio, max_frames: usize) -> Vec<f32> {
    let channels = usize::from(audio.channels.max(1));
    audio
        .samples
        .chunks_exact(channels)
        .take(max_frames)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[derive(Debug, Default, PartialEq)]
struct Spectrum {
    /// Strongest local maxima in Hz, loudest first.
    dominant_frequencies: Vec<f64>,
    centroid: f64,
    bandwidth: f64,
    rolloff: f64,
}

/// Magnitude-weighted features of one FFT over the whole (capped) signal.
fn spectrum(audio: &Audio) -> Spectrum {
    let mono = mixdown(audio, MAX_SPECTRUM_FRAMES);
    let n = mono.len();
    if n < 2 || audio.sample_rate == 0 {
        return Spectrum::default();
    }

    let mut buffer: Vec<Complex<f32>> = mono.iter().map(|s| Complex::new(*s, 0.0)).collect();
    FftPlanner::<f32>::new()
        .plan_fft_forward(n)
        .process(&mut buffer);

    let bin_hz = f64::from(audio.sample_rate) / n as f64;
    let magnitudes: Vec<f64> = buffer[..n / 2 + 1]
        .iter()
        .map(|c| f64::from(c.norm()))
        .collect();
    let total: f64 = magnitudes.iter().sum();
    if total <= f64::EPSILON {
        return Spectrum::default();
    }

    let frequency = |bin: usize| bin as f64 * bin_hz;
    let centroid = magnitudes
        .iter()
        .enumerate()
        .map(|(bin, m)| frequency(bin) * m)
        .sum::<f64>()
        / total;
    let bandwidth = (magnitudes
        .iter()
        .enumerate()
        .map(|(bin, m)| (frequency(bin) - centroid).powi(2) * m)
        .sum::<f64>()
        / total)
        .sqrt();

    let mut cumulative: f64 = 0.0;
    let rolloff_bin = magnitudes
        .iter()
        .position(|m| {
            cumulative += m;
            cumulative >= ROLLOFF_SHARE * total
        })
        .unwrap_or(magnitudes.len() - 1);

    let mut peaks: Vec<usize> = (1..magnitudes.len().saturating_sub(1))
        .filter(|&bin| {
            magnitudes[bin] > magnitudes[bin - 1] && magnitudes[bin] >= magnitudes[bin + 1]
        })
        .collect();
    peaks.sort_by(|a, b| magnitudes[*b].total_cmp(&magnitudes[*a]));

    Spectrum {
        dominant_frequencies: peaks
            .into_iter()
            .take(DOMINANT_PEAKS)
            .map(|bin| round2(frequency(bin)))
            .collect(),
        centroid,
        bandwidth,
        rolloff: frequency(rolloff_bin),
    }
}
