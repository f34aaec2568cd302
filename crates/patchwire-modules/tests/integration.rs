//! Integration tests for the module library.
//!
//! Drives real modules through a `Graph` or an `Engine` the way the device
//! callback does: the cue/crossfade handoff between players, overlap-add
//! latency, fan-out through `Split` and live splicing into a running patch.

use patchwire_core::{Engine, Graph, Module, ModuleId, PortId, SampleBuffer, StereoBuffer};
use patchwire_modules::{
    Convolve, Endpoint, Formant, Gain, Oscillator, PlayState, Player, PlayerHandle, Reverb, Split,
    Sum,
};

const SR: f32 = 8000.0;

// ============================================================================
// Helpers
// ============================================================================

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

/// A player holding `secs` seconds of DC at 1.0.
fn dc_player(graph: &mut Graph, secs: f32, cue_time: f32, crossfade: f32) -> (ModuleId, PlayerHandle) {
    let player = Player::new(SR);
    player.params().set(Player::CUE_TIME, cue_time);
    player.params().set(Player::CROSSFADE, crossfade);
    let mut handle = player.handle();
    handle.load(SampleBuffer::from_mono(&vec![1.0; (secs * SR) as usize], SR));
    (graph.add(Box::new(player)), handle)
}

/// Pulls `total` frames from a player and returns its left channel and the
/// absolute frame of every cue it emitted.
fn run_player(graph: &mut Graph, id: ModuleId, total: usize, block: usize) -> (Vec<f32>, Vec<usize>) {
    let mut audio = Vec::with_capacity(total);
    let mut cues = Vec::new();
    while audio.len() < total {
        let offset = audio.len();
        let n = block.min(total - offset);
        audio.extend_from_slice(&graph.pull(id, n).into_audio().left);
        let player = graph.module_as::<Player>(id).unwrap();
        cues.extend(player.last_cue().events().iter().map(|(f, _)| offset + f));
    }
    (audio, cues)
}

// ============================================================================
// Cue and crossfade
// ============================================================================

#[test]
fn cue_fires_at_threshold_and_fade_reaches_zero() {
    // L = 4 s, T = 1 s, D = 0.5 s at R = 8 kHz.
    let mut graph = Graph::new(SR);
    let (a, handle) = dc_player(&mut graph, 4.0, -1.0, 0.5);
    handle.play();
    let (audio, cues) = run_player(&mut graph, a, 32000, 256);

    assert_eq!(cues.len(), 1);
    let cue = cues[0];
    assert!((cue as i64 - 24000).abs() <= 1, "cue at {cue}");

    let fade = (0.5 * SR) as usize;
    assert_eq!(audio[cue], 1.0);
    assert!(audio[cue + fade - 1] > 0.0);
    assert_eq!(audio[cue + fade], 0.0);
    assert!(audio[cue + fade..].iter().all(|&x| x == 0.0));
    // The envelope is linear.
    assert!((audio[cue + fade / 2] - 0.5).abs() < 1e-3);
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Idle);
}

#[test]
fn zero_crossfade_emits_cue_and_keeps_playing() {
    let mut graph = Graph::new(SR);
    let (a, handle) = dc_player(&mut graph, 2.0, -0.5, 0.0);
    handle.play();
    let (audio, cues) = run_player(&mut graph, a, 14000, 500);
    assert_eq!(cues, vec![12000]);
    assert!(audio[12000..].iter().all(|&x| x == 1.0));
}

#[test]
fn loop_rearms_cue_every_pass() {
    let mut graph = Graph::new(SR);
    let (a, handle) = dc_player(&mut graph, 1.0, -0.5, 0.0);
    graph.params(a).unwrap().set_bool(Player::LOOP, true);
    handle.play();
    let (audio, cues) = run_player(&mut graph, a, 16000, 333);

    assert_eq!(cues.len(), 2, "cues at {cues:?}");
    assert!((cues[0] as i64 - 4000).abs() <= 1);
    // One pass plays frames 0..n-1 of the track.
    assert!((cues[1] as i64 - (4000 + 7999)).abs() <= 1);
    assert!(audio.iter().all(|&x| x == 1.0));
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Playing);
}

#[test]
fn zero_cue_time_fires_on_last_frame() {
    let mut graph = Graph::new(SR);
    let (a, handle) = dc_player(&mut graph, 1.0, 0.0, 0.0);
    handle.play();
    let (audio, cues) = run_player(&mut graph, a, 40 * 256, 256);
    assert_eq!(cues, vec![7999]);
    assert_eq!(audio[7998], 1.0);
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Idle);
}

#[test]
fn zero_cue_time_fires_every_loop_pass() {
    let mut graph = Graph::new(SR);
    let (a, handle) = dc_player(&mut graph, 1.0, 0.0, 0.0);
    graph.params(a).unwrap().set_bool(Player::LOOP, true);
    handle.play();
    let (audio, cues) = run_player(&mut graph, a, 17000, 256);
    assert_eq!(cues, vec![7999, 15998]);
    assert!(audio.iter().all(|&x| x == 1.0));
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Playing);
}

#[test]
fn zero_cue_time_chains_into_next_player() {
    let mut graph = Graph::new(SR);
    let (a, handle_a) = dc_player(&mut graph, 1.0, 0.0, 0.0);
    let (b, _handle_b) = dc_player(&mut graph, 1.0, 0.0, 0.0);
    graph.connect(PortId::output(a, 1), PortId::input(b, 0)).unwrap();
    handle_a.play();
    for _ in 0..40 {
        graph.pull(a, 256);
        graph.pull(b, 256);
    }
    let receiver = graph.module_as::<Player>(b).unwrap();
    assert!(receiver.playhead() > 0.0);
}

/// Two DC players crossfading through a mixer, with the sender on `sender_input`.
fn crossfade_through_mix(sender_input: usize) -> (Graph, ModuleId, ModuleId, Vec<f32>) {
    let mut graph = Graph::new(SR);
    let (a, handle_a) = dc_player(&mut graph, 4.0, -1.0, 0.5);
    let (b, _handle_b) = dc_player(&mut graph, 2.0, 0.0, 0.0);
    let mix = graph.add(Box::new(Sum::new(SR)));
    let params = graph.params(mix).unwrap();
    params.set(Sum::INPUT_DB, 0.0);
    params.set(Sum::INPUT_DB + 1, 0.0);

    let receiver_input = 1 - sender_input;
    graph.connect(PortId::output(a, 0), PortId::input(mix, sender_input)).unwrap();
    graph.connect(PortId::output(b, 0), PortId::input(mix, receiver_input)).unwrap();
    graph.connect(PortId::output(a, 1), PortId::input(b, 0)).unwrap();

    handle_a.play();
    let mut out = Vec::new();
    while out.len() < 38000 {
        out.extend_from_slice(&graph.pull(mix, 500).into_audio().left);
    }
    (graph, a, b, out)
}

#[test]
fn receiver_fades_in_with_sender_duration() {
    let (graph, a, b, out) = crossfade_through_mix(0);

    // A linear crossfade of two DC tracks sums to a flat line.
    for (i, &x) in out.iter().enumerate() {
        assert!((x - 1.0).abs() < 1e-4, "frame {i}: {x}");
    }
    let receiver = graph.module_as::<Player>(b).unwrap();
    assert_eq!(receiver.state(), PlayState::Playing);
    assert_eq!(graph.params(b).unwrap().get(Player::CROSSFADE), 0.5);
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Idle);
}

#[test]
fn handoff_is_flat_when_receiver_is_pulled_first() {
    let (graph, a, b, out) = crossfade_through_mix(1);

    for (i, &x) in out.iter().enumerate() {
        assert!((x - 1.0).abs() < 1e-4, "frame {i}: {x}");
    }
    assert_eq!(graph.module_as::<Player>(b).unwrap().state(), PlayState::Playing);
    assert_eq!(graph.module_as::<Player>(a).unwrap().state(), PlayState::Idle);
    // Cue at 3 s plus a 0.5 s fade: one advance per block.
    assert!((graph.module_as::<Player>(a).unwrap().playhead() - 28000.0).abs() <= 1.0);
}

#[test]
fn busy_receiver_ignores_cues() {
    let mut graph = Graph::new(SR);
    let (a, handle_a) = dc_player(&mut graph, 1.0, -0.5, 0.0);
    let (b, handle_b) = dc_player(&mut graph, 4.0, 0.0, 0.0);
    graph.connect(PortId::output(a, 1), PortId::input(b, 0)).unwrap();
    handle_a.play();
    handle_b.play();
    for _ in 0..10 {
        graph.pull(a, 500);
        graph.pull(b, 500);
    }
    // B started at frame 0 and was not restarted by A's cue at 4000.
    let playhead = graph.module_as::<Player>(b).unwrap().playhead();
    assert!((playhead - 5000.0).abs() < 1e-9);
}

// ============================================================================
// Overlap-add latency
// ============================================================================

#[test]
fn formant_identity_is_pure_delay() {
    let sr = 48000.0;
    let mut reference = Graph::new(sr);
    let osc_ref = reference.add(Box::new(Oscillator::new(sr)));

    let mut graph = Graph::new(sr);
    let osc = graph.add(Box::new(Oscillator::new(sr)));
    let formant = graph.add(Box::new(Formant::new(sr)));
    graph.connect(PortId::output(osc, 0), PortId::input(formant, 0)).unwrap();

    let mut dry = Vec::new();
    let mut wet = Vec::new();
    for &n in &[100, 512, 37, 1024, 2000, 64, 1] {
        dry.extend_from_slice(&reference.pull(osc_ref, n).into_audio().left);
        wet.extend_from_slice(&graph.pull(formant, n).into_audio().left);
    }
    let latency = graph.module(formant).unwrap().latency_samples();
    assert_eq!(latency, 1024);
    assert!(rms(&wet[..latency]) < 1e-4);
    for n in latency..wet.len() {
        assert!((wet[n] - dry[n - latency]).abs() < 1e-3, "sample {n}");
    }
}

// ============================================================================
// Fan-out and live editing
// ============================================================================

#[test]
fn split_feeds_two_sinks_without_double_advance() {
    let sr = 48000.0;
    let build_sink = |graph: &mut Graph| {
        let sink = graph.add(Box::new(Endpoint::new(sr)));
        graph.params(sink).unwrap().set(Endpoint::VOLUME, 0.0);
        sink
    };

    let mut single = Graph::new(sr);
    let osc = single.add(Box::new(Oscillator::new(sr)));
    single.params(osc).unwrap().set(Oscillator::AMPLITUDE, 0.25);
    let sink = build_sink(&mut single);
    single.connect(PortId::output(osc, 0), PortId::input(sink, 0)).unwrap();

    let mut fanned = Graph::new(sr);
    let osc = fanned.add(Box::new(Oscillator::new(sr)));
    fanned.params(osc).unwrap().set(Oscillator::AMPLITUDE, 0.25);
    let split = fanned.add(Box::new(Split::new(sr)));
    fanned.connect(PortId::output(osc, 0), PortId::input(split, 0)).unwrap();
    for output in 0..2 {
        let sink = build_sink(&mut fanned);
        fanned.connect(PortId::output(split, output), PortId::input(sink, 0)).unwrap();
    }

    let mut one = Engine::new(single);
    let mut two = Engine::new(fanned);
    let mut a = StereoBuffer::new(256);
    let mut b = StereoBuffer::new(256);
    for _ in 0..20 {
        assert!(one.render(&mut a));
        assert!(two.render(&mut b));
        for i in 0..256 {
            assert!((b.left[i] - 2.0 * a.left[i]).abs() < 1e-5);
        }
    }
}

#[test]
fn splice_reverb_into_running_patch() {
    let sr = 48000.0;
    let mut graph = Graph::new(sr);
    let osc = graph.add(Box::new(Oscillator::new(sr)));
    let gain = graph.add(Box::new(Gain::new(sr)));
    let sink = graph.add(Box::new(Endpoint::new(sr)));
    graph.params(sink).unwrap().set(Endpoint::VOLUME, 0.0);
    graph.connect(PortId::output(osc, 0), PortId::input(gain, 0)).unwrap();
    graph.connect(PortId::output(gain, 0), PortId::input(sink, 0)).unwrap();

    let mut engine = Engine::new(graph);
    let mut out = StereoBuffer::new(512);
    engine.render(&mut out);

    let reverb = engine
        .edit(|g| {
            let reverb = g.add(Box::new(Reverb::new(sr)));
            g.insert_module(reverb, PortId::output(gain, 0), PortId::input(sink, 0))
                .map(|_| reverb)
        })
        .unwrap();
    engine.edit(|g| {
        assert_eq!(g.peer(PortId::input(reverb, 0)), Some(PortId::output(gain, 0)));
        assert_eq!(g.peer(PortId::input(sink, 0)), Some(PortId::output(reverb, 0)));
    });

    let mut energy = Vec::new();
    for _ in 0..20 {
        engine.render(&mut out);
        assert!(out.left.iter().all(|x| x.is_finite()));
        energy.extend_from_slice(&out.left);
    }
    assert!(rms(&energy) > 0.05);

    // Removing the gain bridges the oscillator straight into the reverb.
    let removal = engine.edit(|g| g.remove_module(gain)).unwrap();
    assert_eq!(
        removal.bridged,
        Some((PortId::output(osc, 0), PortId::input(reverb, 0)))
    );
}

#[test]
fn convolver_loads_while_rendering() {
    let sr = 48000.0;
    let mut graph = Graph::new(sr);
    let osc = graph.add(Box::new(Oscillator::new(sr)));
    let convolve = Convolve::new(sr);
    let handle = convolve.handle();
    let conv = graph.add(Box::new(convolve));
    graph.connect(PortId::output(osc, 0), PortId::input(conv, 0)).unwrap();

    let mut reference = Graph::new(sr);
    let osc_ref = reference.add(Box::new(Oscillator::new(sr)));

    // Bypassed until an impulse response arrives.
    for _ in 0..4 {
        let dry = reference.pull(osc_ref, 256).into_audio();
        let out = graph.pull(conv, 256).into_audio();
        assert_eq!(out, dry);
    }
    assert_eq!(graph.module(conv).unwrap().latency_samples(), 0);

    let mut ir = vec![0.0; 2400];
    ir[0] = 0.5;
    ir[2399] = 0.25;
    assert!(handle.load(&ir));

    let mut wet = Vec::new();
    for _ in 0..40 {
        let out = graph.pull(conv, 256).into_audio();
        assert!(out.left.iter().all(|x| x.is_finite()));
        wet.extend_from_slice(&out.left);
    }
    assert_eq!(graph.module(conv).unwrap().latency_samples(), 512);
    assert!(rms(&wet[4096..]) > 0.1);

    handle.clear();
    assert_eq!(graph.module(conv).unwrap().latency_samples(), 512);
    graph.pull(conv, 256);
    assert_eq!(graph.module(conv).unwrap().latency_samples(), 0);
}
