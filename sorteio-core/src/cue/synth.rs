//! Tone synthesis for the cue catalogue.
//!
//! Every cue is a few oscillator voices with exponential pitch and gain
//! ramps, rendered once into a mono buffer that lasts exactly
//! [`Cue::duration`].

use crate::cue::Cue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

pub const SAMPLE_RATE: u32 = 44_100;

/// Gain every envelope decays to.
const FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wave {
    Sine,
    Square,
    Sawtooth,
    Noise,
}

/// One oscillator: starts at `start`, sweeps from `from_hz` to `to_hz` over
/// `sweep`, and decays from `gain` to [`FLOOR`] over `length`.
#[derive(Debug, Clone, Copy)]
struct Voice {
    wave: Wave,
    start: f32,
    length: f32,
    from_hz: f32,
    to_hz: f32,
    sweep: f32,
    gain: f32,
}

impl Voice {
    fn steady(wave: Wave, start: f32, length: f32, hz: f32, gain: f32) -> Self {
        Self {
            wave,
            start,
            length,
            from_hz: hz,
            to_hz: hz,
            sweep: length,
            gain,
        }
    }

    fn frequency(&self, t: f32) -> f32 {
        exp_ramp(self.from_hz, self.to_hz, (t / self.sweep).min(1.0))
    }

    fn envelope(&self, t: f32) -> f32 {
        exp_ramp(self.gain, FLOOR, t / self.length)
    }
}

fn exp_ramp(from: f32, to: f32, progress: f32) -> f32 {
    from * (to / from).powf(progress)
}

fn voices(cue: Cue, rng: &mut StdRng) -> Vec<Voice> {
    match cue {
        Cue::Airhorn => vec![Voice::steady(Wave::Sawtooth, 0.0, 0.05, 200.0, 0.5)],
        Cue::Drumroll => (0..20)
            .map(|i| Voice::steady(Wave::Square, i as f32 * 0.05, 0.05, 100.0, 0.1))
            .collect(),
        Cue::Applause => (0..100)
            .map(|_| {
                let hz = rng.random_range(500.0..1500.0);
                Voice::steady(Wave::Noise, rng.random_range(0.0..1.0), 0.1, hz, 0.05)
            })
            .collect(),
        Cue::Buzzer => vec![Voice::steady(Wave::Square, 0.0, 0.4, 150.0, 0.4)],
        Cue::Ding => vec![Voice {
            wave: Wave::Sine,
            start: 0.0,
            length: 0.3,
            from_hz: 1200.0,
            to_hz: 900.0,
            sweep: 0.3,
            gain: 0.4,
        }],
        Cue::Whistle => vec![Voice {
            wave: Wave::Sine,
            start: 0.0,
            length: 0.3,
            from_hz: 2000.0,
            to_hz: 3000.0,
            sweep: 0.2,
            gain: 0.3,
        }],
        Cue::Tada => [523.0, 659.0, 784.0, 1047.0]
            .into_iter()
            .enumerate()
            .map(|(i, hz)| Voice::steady(Wave::Sine, i as f32 * 0.1, 0.3, hz, 0.2))
            .collect(),
        Cue::Success => vec![Voice {
            wave: Wave::Sine,
            start: 0.0,
            length: 0.3,
            from_hz: 800.0,
            to_hz: 1200.0,
            sweep: 0.1,
            gain: 0.3,
        }],
    }
}

/// Render `cue` as mono samples in `[-1.0, 1.0]` at [`SAMPLE_RATE`].
pub fn render(cue: Cue) -> Vec<f32> {
    let rate = SAMPLE_RATE as f32;
    let total = (cue.duration().as_secs_f32() * rate).round() as usize;
    let mut samples = vec![0.0f32; total];
    // Fixed seed: the same cue always sounds the same.
    let mut rng = StdRng::seed_from_u64(cue as u64);

    for voice in voices(cue, &mut rng) {
        let first = (voice.start * rate) as usize;
        let count = (voice.length * rate) as usize;
        let mut phase = 0.0f32;

        for (n, sample) in samples.iter_mut().skip(first).take(count).enumerate() {
            let t = n as f32 / rate;
            let value = match voice.wave {
                Wave::Sine => (phase * TAU).sin(),
                Wave::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                Wave::Sawtooth => 2.0 * phase - 1.0,
                Wave::Noise => rng.random_range(-1.0..1.0),
            };
            *sample += value * voice.envelope(t);
            phase = (phase + voice.frequency(t) / rate).fract();
        }
    }

    for sample in &mut samples {
        *sample = sample.clamp(-1.0, 1.0);
    }
    samples
}
