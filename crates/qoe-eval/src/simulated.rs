//! In-memory codec and scorer
//!
//! A deterministic stand-in for the real encoder/decoder and perceptual
//! scorer, used by tests and by `--simulate` runs. It reproduces the trade
//! offs the controllers reason about:
//! - lower bitrate means coarser quantisation
//! - FEC costs bitrate but recovers a lost frame when the next one arrives
//! - longer frames cost less header overhead but each loss removes more audio

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use qoe_core::Configuration;

use crate::{Codec, CodecError, QualityScorer, ScoreError};

/// Mono PCM, samples nominally in -1.0..=1.0
#[derive(Clone, Debug, PartialEq)]
pub struct PcmSignal {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl PcmSignal {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        PcmSignal {
            sample_rate,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Speech-like test signal: voiced syllables with a drifting pitch,
    /// separated by short low-level pauses.
    pub fn synthetic_speech(seed: u64, seconds: f64, sample_rate: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let total = (seconds * sample_rate as f64) as usize;
        let rate = sample_rate as f32;
        let mut samples = Vec::with_capacity(total);
        let mut phase = 0.0f32;

        while samples.len() < total {
            let syllable = (rate * rng.gen_range(0.15..0.30)) as usize;
            let pitch = rng.gen_range(100.0f32..220.0);
            let energy = rng.gen_range(0.3f32..0.7);

            for n in 0..syllable {
                let t = n as f32 / syllable as f32;
                let envelope = (std::f32::consts::PI * t).sin();
                let f0 = pitch * (1.0 + 0.05 * (2.0 * std::f32::consts::PI * 5.0 * t).sin());
                phase += 2.0 * std::f32::consts::PI * f0 / rate;

                let voiced = phase.sin() + 0.5 * (2.0 * phase).sin() + 0.25 * (3.0 * phase).sin();
                samples.push(energy * envelope * voiced / 1.75);
            }

            let pause = (rate * rng.gen_range(0.05..0.15)) as usize;
            for _ in 0..pause {
                samples.push(rng.gen_range(-0.005f32..0.005));
            }
        }

        samples.truncate(total);
        PcmSignal::new(sample_rate, samples)
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Share of the bitrate spent on FEC redundancy
const FEC_BITRATE_SHARE: f64 = 0.2;

/// Per-packet header bytes
const PACKET_OVERHEAD_BYTES: f64 = 3.0;

/// Gain applied to a repeated frame during concealment
const CONCEALMENT_DECAY: f32 = 0.5;

/// Deterministic simulated codec.
///
/// Randomness is seeded from the run seed together with the configuration
/// and the loss rate, so the same job always degrades the same way
/// regardless of which worker runs it or in what order.
#[derive(Clone, Debug)]
pub struct SimulatedCodec {
    seed: u64,
}

impl SimulatedCodec {
    pub fn new(seed: u64) -> Self {
        SimulatedCodec { seed }
    }

    fn rng_for(&self, config: &Configuration, loss_percent: f64) -> StdRng {
        let mut state = self.seed;
        for word in [
            config.bitrate as u64,
            config.frame_size_ms as u64,
            config.complexity as u64,
            config.use_fec as u64,
            loss_percent.to_bits(),
        ] {
            state = splitmix64(state ^ word);
        }
        StdRng::seed_from_u64(state)
    }

    /// Quantiser resolution in bits for a configuration
    fn resolution_bits(config: &Configuration) -> f64 {
        let mut kbps = config.bitrate_kbps();
        if config.use_fec {
            kbps *= 1.0 - FEC_BITRATE_SHARE;
        }
        kbps -= PACKET_OVERHEAD_BYTES * 8.0 / config.frame_size_ms as f64;
        1.6 * kbps.max(1.0).log2() + 0.15 * config.complexity as f64
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn quantise(frame: &[f32], bits: f64) -> Vec<f32> {
    let step = (2.0 / 2f64.powf(bits)) as f32;
    frame.iter().map(|s| (s / step).round() * step).collect()
}

impl Codec for SimulatedCodec {
    type Signal = PcmSignal;

    fn process(
        &self,
        config: &Configuration,
        source: &PcmSignal,
        loss_percent: f64,
    ) -> Result<PcmSignal, CodecError> {
        let frame_len =
            ((source.sample_rate as usize * config.frame_size_ms as usize) / 1000).max(1);
        let loss_rate = (loss_percent / 100.0).clamp(0.0, 1.0);
        let bits = Self::resolution_bits(config);
        let mut rng = self.rng_for(config, loss_percent);

        let frames: Vec<&[f32]> = source.samples.chunks(frame_len).collect();
        let lost: Vec<bool> = frames.iter().map(|_| rng.gen::<f64>() < loss_rate).collect();

        let mut out = Vec::with_capacity(source.samples.len());
        let mut previous: Vec<f32> = Vec::new();

        for (i, frame) in frames.iter().enumerate() {
            let decoded = if !lost[i] {
                quantise(frame, bits)
            } else if config.use_fec && lost.get(i + 1) == Some(&false) {
                // redundant copy carried by the next packet, at lower resolution
                quantise(frame, bits - 2.0)
            } else {
                let mut concealed: Vec<f32> = previous
                    .iter()
                    .map(|s| s * CONCEALMENT_DECAY)
                    .collect();
                concealed.resize(frame.len(), 0.0);
                concealed
            };
            out.extend_from_slice(&decoded);
            previous = decoded;
        }

        Ok(PcmSignal::new(source.sample_rate, out))
    }
}

// ============================================================================
// Scorer
// ============================================================================

/// Segment length for segmental SNR
const SEGMENT_MS: u32 = 20;

const SNR_FLOOR_DB: f64 = -10.0;
const SNR_CEIL_DB: f64 = 35.0;

pub const MOS_MIN: f64 = 1.0;
pub const MOS_MAX: f64 = 4.5;

/// Maps segmental SNR onto the MOS range.
///
/// Segments where the reference is near-silent are ignored; per-segment SNR
/// is clamped before averaging so a single perfect or destroyed segment
/// cannot dominate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnrScorer;

impl SnrScorer {
    pub fn segmental_snr_db(
        reference: &PcmSignal,
        degraded: &PcmSignal,
    ) -> Result<f64, ScoreError> {
        if reference.sample_rate != degraded.sample_rate {
            return Err(ScoreError::Incompatible(format!(
                "sample rates differ: {} vs {}",
                reference.sample_rate, degraded.sample_rate
            )));
        }

        let len = reference.len().min(degraded.len());
        let segment = ((reference.sample_rate * SEGMENT_MS) / 1000).max(1) as usize;

        let mut total = 0.0;
        let mut segments = 0usize;
        for start in (0..len).step_by(segment) {
            let end = (start + segment).min(len);
            let (mut signal, mut noise) = (0.0f64, 0.0f64);
            for (r, d) in reference.samples[start..end]
                .iter()
                .zip(&degraded.samples[start..end])
            {
                let (r, d) = (*r as f64, *d as f64);
                signal += r * r;
                noise += (r - d) * (r - d);
            }
            if signal < 1e-6 * (end - start) as f64 {
                continue;
            }
            let snr = 10.0 * (signal / noise.max(1e-12)).log10();
            total += snr.clamp(SNR_FLOOR_DB, SNR_CEIL_DB);
            segments += 1;
        }

        if segments == 0 {
            return Err(ScoreError::Incompatible(
                "reference has no active segments".into(),
            ));
        }
        Ok(total / segments as f64)
    }
}

impl QualityScorer<PcmSignal> for SnrScorer {
    fn score(&self, reference: &PcmSignal, degraded: &PcmSignal) -> Result<f64, ScoreError> {
        let snr = Self::segmental_snr_db(reference, degraded)?;
        let t = (snr - SNR_FLOOR_DB) / (SNR_CEIL_DB - SNR_FLOOR_DB);
        Ok(MOS_MIN + (MOS_MAX - MOS_MIN) * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn speech() -> PcmSignal {
        PcmSignal::synthetic_speech(7, 2.0, 16_000)
    }

    #[test]
    fn test_synthetic_speech_shape() {
        let signal = speech();
        assert_eq!(signal.len(), 32_000);
        assert!(signal.samples.iter().all(|s| s.abs() <= 1.0));
        assert!(signal.samples.iter().any(|s| s.abs() > 0.1));
        assert_eq!(signal, PcmSignal::synthetic_speech(7, 2.0, 16_000));
    }

    #[test]
    fn test_codec_is_deterministic() {
        let codec = SimulatedCodec::new(42);
        let config = Configuration::new(16_000, 40, 5, true);
        let a = codec.process(&config, &speech(), 5.0).unwrap();
        let b = codec.process(&config, &speech(), 5.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), speech().len());
    }

    #[test]
    fn test_identical_signal_scores_max() {
        let s = speech();
        assert_eq!(SnrScorer.score(&s, &s).unwrap(), MOS_MAX);
    }

    #[test]
    fn test_bitrate_improves_clean_quality() {
        let codec = SimulatedCodec::new(1);
        let source = speech();
        let low = codec
            .process(&Configuration::new(8_000, 20, 5, false), &source, 0.0)
            .unwrap();
        let high = codec
            .process(&Configuration::new(48_000, 20, 5, false), &source, 0.0)
            .unwrap();
        assert!(SnrScorer.score(&source, &high).unwrap() > SnrScorer.score(&source, &low).unwrap());
    }

    #[test]
    fn test_loss_degrades_quality() {
        let codec = SimulatedCodec::new(1);
        let source = speech();
        let config = Configuration::new(24_000, 20, 5, false);
        let clean = codec.process(&config, &source, 0.0).unwrap();
        let lossy = codec.process(&config, &source, 30.0).unwrap();
        assert!(
            SnrScorer.score(&source, &clean).unwrap() > SnrScorer.score(&source, &lossy).unwrap()
        );
    }

    #[test]
    fn test_fec_helps_under_loss() {
        let codec = SimulatedCodec::new(3);
        let source = PcmSignal::synthetic_speech(3, 8.0, 16_000);
        let plain = codec
            .process(&Configuration::new(24_000, 20, 5, false), &source, 20.0)
            .unwrap();
        let fec = codec
            .process(&Configuration::new(24_000, 20, 5, true), &source, 20.0)
            .unwrap();
        assert!(
            SnrScorer.score(&source, &fec).unwrap() > SnrScorer.score(&source, &plain).unwrap()
        );
    }

    #[test]
    fn test_scorer_rejects_mismatch() {
        let a = PcmSignal::new(16_000, vec![0.5; 320]);
        let b = PcmSignal::new(8_000, vec![0.5; 320]);
        assert!(matches!(SnrScorer.score(&a, &b), Err(ScoreError::Incompatible(_))));

        let silent = PcmSignal::new(16_000, vec![0.0; 320]);
        assert!(SnrScorer.score(&silent, &silent).is_err());
    }

    proptest! {
        #[test]
        fn prop_score_in_mos_range(
            seed in any::<u64>(),
            loss in 0.0f64..=100.0,
            bitrate_idx in 0usize..6,
            fec in any::<bool>(),
        ) {
            let bitrates = [8_000, 12_000, 16_000, 24_000, 32_000, 48_000];
            let config = Configuration::new(bitrates[bitrate_idx], 20, 5, fec);
            let source = PcmSignal::synthetic_speech(seed, 0.5, 16_000);
            let degraded = SimulatedCodec::new(seed).process(&config, &source, loss).unwrap();
            let score = SnrScorer.score(&source, &degraded).unwrap();
            prop_assert!((MOS_MIN..=MOS_MAX).contains(&score));
        }
    }
}
