//! Integration tests for patchwire-cli.
//!
//! Runs the `patchwire` binary: module listing, demo rendering to WAV,
//! patch export and re-rendering, and config handling.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn patchwire_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_patchwire"))
}

fn read_wav(path: &Path) -> (hound::WavSpec, Vec<f32>) {
    let mut reader = hound::WavReader::open(path).expect("output should be a WAV file");
    let spec = reader.spec();
    let samples = reader.samples::<f32>().map(Result::unwrap).collect();
    (spec, samples)
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// `patchwire modules`
// ---------------------------------------------------------------------------

#[test]
fn cli_modules_lists_every_kind() {
    let output = patchwire_bin().arg("modules").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Modules"));
    for kind in [
        "split", "endpoint", "gain", "sum", "pan", "crossfade", "reverb", "reverse_delay",
        "convolve", "slowdown", "normalize", "shuffle", "formant", "pitch_jitter", "constant",
        "oscillator", "lfo", "player", "bandpass", "clip", "bitcrusher", "envelope",
        "sample_hold", "hold", "static", "vocoder",
    ] {
        assert!(stdout.contains(kind), "listing should contain '{kind}'");
    }
}

#[test]
fn cli_modules_detail_shows_ports_and_params() {
    let output = patchwire_bin().args(["modules", "player"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Inputs:"));
    assert!(stdout.contains("cue"));
    assert!(stdout.contains("cue_time"));
    assert!(stdout.contains("crossfade"));
}

#[test]
fn cli_modules_unknown_kind_fails() {
    let output = patchwire_bin().args(["modules", "theremin"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown module"));
}

// ---------------------------------------------------------------------------
// `patchwire render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_demo_writes_stereo_wav() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("tone.wav");
    let output = patchwire_bin()
        .args(["render", "tone", "--seconds", "0.5", "--sample-rate", "24000", "--output"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let (spec, samples) = read_wav(&out);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 24000);
    assert_eq!(samples.len(), 2 * 12000);
    assert!(rms(&samples[4000..]) > 0.01);
    assert!(samples.iter().all(|x| x.abs() <= 1.0));
}

#[test]
fn cli_render_list_and_missing_target() {
    let output = patchwire_bin().args(["render", "--list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for demo in ["tone", "handoff", "spectral", "split", "convolve"] {
        assert!(stdout.contains(demo));
    }

    let dir = TempDir::new().unwrap();
    let output = patchwire_bin()
        .args(["render", "--output"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_handoff_reports_tempo() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("handoff.wav");
    let output = patchwire_bin()
        .args(["render", "handoff", "--seconds", "4", "--sample-rate", "16000", "--output"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BPM"), "got: {stdout}");
    let (_, samples) = read_wav(&out);
    // The second player is audible after the first one's cue at 2.5 s.
    assert!(rms(&samples[2 * 56000..]) > 0.01);
}

// ---------------------------------------------------------------------------
// `patchwire export` and config
// ---------------------------------------------------------------------------

#[test]
fn cli_export_then_render_patch() {
    let dir = TempDir::new().unwrap();
    let patch = dir.path().join("split.json");
    let output = patchwire_bin().arg("export").arg("split").arg(&patch).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(patch.exists());

    let out = dir.path().join("split.wav");
    let output = patchwire_bin()
        .args(["render", "--seconds", "0.25", "--bit-depth", "16", "--patch"])
        .arg(&patch)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.len(), 2 * 12000);
}

#[test]
fn cli_config_sets_sample_rate() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("patchwire.toml");
    std::fs::write(&config, "sample_rate = 22050.0\nblock_size = 100\nlog_filter = \"warn\"\n")
        .unwrap();
    let out = dir.path().join("spectral.wav");
    let output = patchwire_bin()
        .arg("--config")
        .arg(&config)
        .args(["render", "spectral", "--seconds", "0.2", "--output"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let (spec, samples) = read_wav(&out);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(samples.len(), 2 * 4410);
}

#[test]
fn cli_bad_config_fails_with_context() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "block_size = \"many\"").unwrap();
    let output = patchwire_bin()
        .arg("--config")
        .arg(&config)
        .arg("modules")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading config"));
}
