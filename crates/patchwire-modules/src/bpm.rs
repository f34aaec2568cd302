//! Tempo estimation: onset autocorrelation and tap tempo.
//!
//! [`detect_bpm`] is an offline analysis meant for a background job. It
//! reduces the signal to a 100 Hz onset curve (half-wave rectified energy
//! difference) and autocorrelates it over the lags of 60-200 BPM.
//!
//! ```text
//! R(l) = Σ o[n]·o[n+l] / (N - l),   bpm = 60·f_env / l
//! ```
//!
//! The smallest-lag local peak within 90% of the strongest one wins, which
//! keeps a steady pulse from being reported at half its tempo.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Slowest tempo reported.
pub const MIN_BPM: f32 = 60.0;
/// Fastest tempo reported.
pub const MAX_BPM: f32 = 200.0;

/// Longest stretch of audio analysed, in seconds.
const MAX_ANALYSIS_SECS: f32 = 30.0;

/// Onset envelope rate in Hz.
const ENVELOPE_RATE: f32 = 100.0;

/// Half-wave rectified energy difference at `sample_rate / hop` frames per second.
fn onset_curve(samples: &[f32], hop: usize) -> Vec<f32> {
    let window = hop * 2;
    if samples.len() < window {
        return Vec::new();
    }
    let frames = (samples.len() - window) / hop + 1;
    let mut onsets = Vec::with_capacity(frames);
    let mut prev = 0.0;
    for k in 0..frames {
        let start = k * hop;
        let energy: f32 = samples[start..start + window].iter().map(|x| x * x).sum();
        onsets.push((energy - prev).max(0.0));
        prev = energy;
    }
    onsets
}

/// Normalized autocorrelation of `x` at one lag.
fn autocorr(x: &[f32], lag: usize) -> f32 {
    let n = x.len() - lag;
    let sum: f32 = x[..n].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
    sum / n as f32
}

/// Estimates the tempo of `samples` recorded at `sample_rate`.
///
/// Returns `None` for silence or for audio shorter than two beats at the
/// slowest tempo.
pub fn detect_bpm(samples: &[f32], sample_rate: f32) -> Option<f32> {
    if sample_rate <= 0.0 {
        return None;
    }
    let limit = ((MAX_ANALYSIS_SECS * sample_rate) as usize).min(samples.len());
    let hop = ((sample_rate / ENVELOPE_RATE).round() as usize).max(1);
    let frame_rate = sample_rate / hop as f32;
    let onsets = onset_curve(&samples[..limit], hop);

    let min_lag = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(1);
    let max_lag = (60.0 * frame_rate / MIN_BPM).ceil() as usize;
    if onsets.len() < max_lag * 2 + 2 {
        return None;
    }

    // One lag of margin on each side for peak picking.
    let lo = min_lag.saturating_sub(1).max(1);
    let hi = max_lag + 1;
    let acf: Vec<f32> = (lo..=hi).map(|lag| autocorr(&onsets, lag)).collect();
    let strongest = acf.iter().copied().fold(0.0_f32, f32::max);
    if strongest <= f32::EPSILON {
        return None;
    }

    let peak = (1..acf.len() - 1).find(|&i| {
        let lag = lo + i;
        (min_lag..=max_lag).contains(&lag)
            && acf[i] >= acf[i - 1]
            && acf[i] >= acf[i + 1]
            && acf[i] >= strongest * 0.9
    })?;

    // Parabolic interpolation around the chosen lag.
    let (a, b, c) = (acf[peak - 1], acf[peak], acf[peak + 1]);
    let denom = a - 2.0 * b + c;
    let offset = if denom.abs() > f32::EPSILON {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };
    let lag = (lo + peak) as f32 + offset;
    let bpm = 60.0 * frame_rate / lag;
    tracing::debug!(bpm, lag, "bpm_detected");
    Some(bpm)
}

/// Taps older than this, relative to the newest, are forgotten.
pub const TAP_WINDOW: Duration = Duration::from_secs(2);

/// Tempo from manual taps.
///
/// The estimate is `60 / mean interval` over the taps of the last two
/// seconds, and needs at least two of them.
#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
}

impl TapTempo {
    /// Creates an empty tap history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tap now and returns the updated estimate.
    pub fn tap(&mut self) -> Option<f32> {
        self.tap_at(Instant::now())
    }

    /// Records a tap at `at` and returns the updated estimate.
    pub fn tap_at(&mut self, at: Instant) -> Option<f32> {
        self.taps.push_back(at);
        while self
            .taps
            .front()
            .is_some_and(|&t| at.saturating_duration_since(t) >= TAP_WINDOW)
        {
            self.taps.pop_front();
        }
        self.bpm()
    }

    /// Current estimate.
    pub fn bpm(&self) -> Option<f32> {
        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let intervals = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;
        let span = last.saturating_duration_since(*first).as_secs_f32();
        if span <= 0.0 {
            return None;
        }
        Some(60.0 * intervals as f32 / span)
    }

    /// Number of taps in the window.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns true when no taps are held.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Forgets every tap.
    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_track(bpm: f32, secs: f32, sample_rate: f32) -> Vec<f32> {
        let len = (secs * sample_rate) as usize;
        let period = (60.0 * sample_rate / bpm) as usize;
        let click = (sample_rate / 100.0) as usize;
        (0..len)
            .map(|i| if i % period < click { 0.8 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_detects_click_tempo() {
        let sr = 8000.0;
        let bpm = detect_bpm(&click_track(120.0, 10.0, sr), sr).unwrap();
        assert!((bpm - 120.0).abs() < 3.0, "detected {bpm}");
    }

    #[test]
    fn test_slow_tempo_not_doubled() {
        let sr = 8000.0;
        let bpm = detect_bpm(&click_track(75.0, 12.0, sr), sr).unwrap();
        assert!((bpm - 75.0).abs() < 3.0, "detected {bpm}");
    }

    #[test]
    fn test_silence_and_short_input() {
        assert_eq!(detect_bpm(&[0.0; 80000], 8000.0), None);
        assert_eq!(detect_bpm(&[0.5; 100], 8000.0), None);
        assert_eq!(detect_bpm(&[], 48000.0), None);
    }

    #[test]
    fn test_tap_tempo_mean_interval() {
        let start = Instant::now();
        let mut taps = TapTempo::new();
        assert_eq!(taps.tap_at(start), None);
        taps.tap_at(start + Duration::from_millis(500));
        let bpm = taps.tap_at(start + Duration::from_millis(1000)).unwrap();
        assert!((bpm - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_tap_window_forgets_old_taps() {
        let start = Instant::now();
        let mut taps = TapTempo::new();
        taps.tap_at(start);
        taps.tap_at(start + Duration::from_millis(400));
        // A long pause starts a new estimate.
        assert_eq!(taps.tap_at(start + Duration::from_secs(5)), None);
        assert_eq!(taps.len(), 1);
        let bpm = taps.tap_at(start + Duration::from_millis(5750)).unwrap();
        assert!((bpm - 80.0).abs() < 0.01);
        taps.reset();
        assert!(taps.is_empty());
    }
}
