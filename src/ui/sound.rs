/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).
/// A missing audio device also yields no engine; the game runs silent.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_stomp: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
        sfx_coin: Arc<Vec<u8>>,
        sfx_hurt: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_sweep(330.0, 880.0, 0.12))),
                sfx_stomp: Arc::new(make_wav(&gen_stomp())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_coin: Arc::new(make_wav(&gen_coin())),
                sfx_hurt: Arc::new(make_wav(&gen_sweep(600.0, 200.0, 0.15))),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_stomp(&self) { self.play(&self.sfx_stomp); }
        pub fn play_bump(&self) { self.play(&self.sfx_bump); }
        pub fn play_coin(&self) { self.play(&self.sfx_coin); }
        pub fn play_hurt(&self) { self.play(&self.sfx_hurt); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pitch sweep from `f0` to `f1` with a fade out. Jump goes up, hurt
    /// goes down.
    pub(super) fn gen_sweep(f0: f32, f1: f32, duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = f0 + (f1 - f0) * t;
                phase += freq / SAMPLE_RATE as f32;
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = (phase * TAU).sin() * 0.7 + (phase * 3.0 * TAU).sin() * 0.3;
                wave * (1.0 - t).powf(0.6) * 0.25
            })
            .collect()
    }

    /// Stomp: short low thud with a noise attack
    fn gen_stomp() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * (180.0 - t * 100.0) * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let mix = if t < 0.2 { noise * 0.5 + tone * 0.5 } else { tone };
                mix * (1.0 - t) * 0.35
            })
            .collect()
    }

    /// Notes as `(frequency, seconds)` played back to back. `harmonics`
    /// weights the 1st, 2nd, 3rd... partials; `decay` is how far each
    /// note's envelope falls by its end.
    pub(super) fn melody(notes: &[(f32, f32)], harmonics: &[f32], decay: f32, gain: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * decay;
                let wave: f32 = harmonics.iter().enumerate()
                    .map(|(k, w)| (t * freq * (k + 1) as f32 * TAU).sin() * w)
                    .sum();
                wave * env * gain
            }));
        }
        samples
    }

    fn fade_tail(samples: &mut [f32], fraction: usize) {
        let len = samples.len() / fraction;
        let start = samples.len() - len;
        for (k, s) in samples[start..].iter_mut().enumerate() {
            *s *= (len - k) as f32 / len as f32;
        }
    }

    /// Bump: two quick low knocks, hard-clipped to a square
    fn gen_bump() -> Vec<f32> {
        melody(&[(140.0, 0.04), (110.0, 0.04)], &[1.0], 1.0, 1.0)
            .into_iter()
            .map(|v| v.signum() * v.abs().min(0.2))
            .collect()
    }

    /// Question block opened: B5 then a ringing E6
    fn gen_coin() -> Vec<f32> {
        melody(&[(988.0, 0.06), (1319.0, 0.18)], &[0.7, 0.3], 0.9, 0.3)
    }

    /// Death: falling minor run, faded out
    fn gen_die() -> Vec<f32> {
        let mut s = melody(
            &[(494.0, 0.1), (415.0, 0.1), (349.0, 0.1), (294.0, 0.1), (247.0, 0.2)],
            &[1.0],
            0.3,
            0.3,
        );
        fade_tail(&mut s, 3);
        s
    }

    /// Course clear: G4 C5 E5 G5, then a held C6
    fn gen_clear() -> Vec<f32> {
        let mut notes = vec![(392.0, 0.09), (523.0, 0.09), (659.0, 0.09), (784.0, 0.09)];
        notes.push((1047.0, 0.35));
        let mut s = melody(&notes, &[0.6, 0.3, 0.1], 0.3, 0.3);
        fade_tail(&mut s, 4);
        s
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self) {}
    pub fn play_stomp(&self) {}
    pub fn play_bump(&self) {}
    pub fn play_coin(&self) {}
    pub fn play_hurt(&self) {}
    pub fn play_die(&self) {}
    pub fn play_clear(&self) {}
}
