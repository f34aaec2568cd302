//! Built-in demo patches.
//!
//! Each demo builds a complete graph ending in one or more endpoints. Sample
//! players get synthesized tracks so the demos need no audio files.

use patchwire_core::{Graph, Lcg, Module, ModuleId, PortId, SampleBuffer};
use patchwire_modules::{
    Convolve, Endpoint, Formant, Normalize, Oscillator, Pan, PitchJitter, Player, PlayerHandle,
    Reverb, ReverseDelay, Shuffle, Split, Sum, Waveform,
};

/// A built graph plus control handles that must outlive rendering.
pub struct Demo {
    pub graph: Graph,
    pub players: Vec<PlayerHandle>,
}

/// A named demo constructor.
pub struct DemoInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(f32) -> anyhow::Result<Demo>,
}

pub const DEMOS: &[DemoInfo] = &[
    DemoInfo {
        name: "tone",
        description: "Triangle oscillator, panned, into a reverb",
        build: tone,
    },
    DemoInfo {
        name: "handoff",
        description: "Two players handing off with a cue and a 1 s crossfade",
        build: handoff,
    },
    DemoInfo {
        name: "spectral",
        description: "Saw through a formant shift, pitch jitter and chunk shuffle",
        build: spectral,
    },
    DemoInfo {
        name: "split",
        description: "One oscillator split into a reverb and a reverse delay",
        build: split,
    },
    DemoInfo {
        name: "convolve",
        description: "Square wave convolved with a synthetic room response",
        build: convolve,
    },
];

pub fn find(name: &str) -> Option<&'static DemoInfo> {
    DEMOS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

fn wire(
    graph: &mut Graph,
    from: ModuleId,
    output: usize,
    to: ModuleId,
    input: usize,
) -> anyhow::Result<()> {
    graph.connect(PortId::output(from, output), PortId::input(to, input))?;
    Ok(())
}

fn endpoint(graph: &mut Graph, sample_rate: f32, volume_db: f32) -> ModuleId {
    let sink = graph.add(Box::new(Endpoint::new(sample_rate)));
    if let Some(params) = graph.params(sink) {
        params.set(Endpoint::VOLUME, volume_db);
    }
    sink
}

fn oscillator(graph: &mut Graph, sample_rate: f32, freq: f32, waveform: Waveform) -> ModuleId {
    let osc = Oscillator::new(sample_rate);
    osc.params().set(Oscillator::FREQUENCY, freq);
    osc.params().set(Oscillator::WAVEFORM, waveform as usize as f32);
    graph.add(Box::new(osc))
}

fn tone(sample_rate: f32) -> anyhow::Result<Demo> {
    let mut graph = Graph::new(sample_rate);
    let osc = oscillator(&mut graph, sample_rate, 220.0, Waveform::Triangle);
    let pan = graph.add(Box::new(Pan::new(sample_rate)));
    let reverb = Reverb::new(sample_rate);
    reverb.params().set(Reverb::MIX, 0.4);
    reverb.params().set(Reverb::ROOM, 0.8);
    let reverb = graph.add(Box::new(reverb));
    let sink = endpoint(&mut graph, sample_rate, -6.0);

    if let Some(params) = graph.params(pan) {
        params.set(Pan::PAN, -0.3);
    }
    wire(&mut graph, osc, 0, pan, 0)?;
    wire(&mut graph, pan, 0, reverb, 0)?;
    wire(&mut graph, reverb, 0, sink, 0)?;
    Ok(Demo {
        graph,
        players: Vec::new(),
    })
}

/// A click track at `bpm` over a sine at `freq`.
fn synth_track(sample_rate: f32, secs: f32, freq: f32, bpm: f32) -> SampleBuffer {
    let len = (secs * sample_rate) as usize;
    let beat = (60.0 / bpm * sample_rate) as usize;
    let samples: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let tone = (core::f32::consts::TAU * freq * t).sin() * 0.3;
            let since = i % beat.max(1);
            let click = if since < 200 {
                (1.0 - since as f32 / 200.0) * 0.6
            } else {
                0.0
            };
            tone + click
        })
        .collect();
    SampleBuffer::from_mono(&samples, sample_rate)
}

fn handoff(sample_rate: f32) -> anyhow::Result<Demo> {
    let mut graph = Graph::new(sample_rate);

    let first = Player::new(sample_rate);
    first.params().set(Player::CUE_TIME, -1.5);
    first.params().set(Player::CROSSFADE, 1.0);
    let mut first_handle = first.handle();
    first_handle.load(synth_track(sample_rate, 4.0, 220.0, 120.0));

    let second = Player::new(sample_rate);
    second.params().set(Player::PITCH, 1.25);
    let mut second_handle = second.handle();
    second_handle.load(synth_track(sample_rate, 6.0, 330.0, 96.0));

    let first = graph.add(Box::new(first));
    let second = graph.add(Box::new(second));
    let mix = graph.add(Box::new(Sum::new(sample_rate)));
    let sink = endpoint(&mut graph, sample_rate, -3.0);

    wire(&mut graph, first, 0, mix, 0)?;
    wire(&mut graph, second, 0, mix, 1)?;
    wire(&mut graph, first, 1, second, 0)?;
    wire(&mut graph, mix, 0, sink, 0)?;

    first_handle.play();
    Ok(Demo {
        graph,
        players: vec![first_handle, second_handle],
    })
}

fn spectral(sample_rate: f32) -> anyhow::Result<Demo> {
    let mut graph = Graph::new(sample_rate);
    let osc = oscillator(&mut graph, sample_rate, 110.0, Waveform::Saw);
    let formant = Formant::new(sample_rate);
    formant.params().set(Formant::RATIO, 1.5);
    let formant = graph.add(Box::new(formant));
    let jitter = PitchJitter::new(sample_rate);
    jitter.params().set(PitchJitter::DEPTH, 40.0);
    let jitter = graph.add(Box::new(jitter));
    let shuffle = Shuffle::new(sample_rate);
    shuffle.params().set(Shuffle::INTENSITY, 0.3);
    let shuffle = graph.add(Box::new(shuffle));
    let sink = endpoint(&mut graph, sample_rate, -9.0);

    wire(&mut graph, osc, 0, formant, 0)?;
    wire(&mut graph, formant, 0, jitter, 0)?;
    wire(&mut graph, jitter, 0, shuffle, 0)?;
    wire(&mut graph, shuffle, 0, sink, 0)?;
    Ok(Demo {
        graph,
        players: Vec::new(),
    })
}

fn split(sample_rate: f32) -> anyhow::Result<Demo> {
    let mut graph = Graph::new(sample_rate);
    let osc = oscillator(&mut graph, sample_rate, 330.0, Waveform::Square);
    let split = graph.add(Box::new(Split::new(sample_rate)));
    let reverb = graph.add(Box::new(Reverb::new(sample_rate)));
    let reverse = graph.add(Box::new(ReverseDelay::new(sample_rate)));
    let mix = graph.add(Box::new(Sum::new(sample_rate)));
    let sink = endpoint(&mut graph, sample_rate, -12.0);

    wire(&mut graph, osc, 0, split, 0)?;
    wire(&mut graph, split, 0, reverb, 0)?;
    wire(&mut graph, split, 1, reverse, 0)?;
    wire(&mut graph, reverb, 0, mix, 0)?;
    wire(&mut graph, reverse, 0, mix, 1)?;
    wire(&mut graph, mix, 0, sink, 0)?;
    Ok(Demo {
        graph,
        players: Vec::new(),
    })
}

/// Exponentially decaying deterministic noise, `secs` long.
fn room_response(sample_rate: f32, secs: f32) -> Vec<f32> {
    let len = (secs * sample_rate) as usize;
    let mut rng = Lcg::default();
    (0..len)
        .map(|i| {
            let noise = rng.next_bipolar();
            let decay = (-6.0 * i as f32 / len as f32).exp();
            if i == 0 { 1.0 } else { noise * decay * 0.3 }
        })
        .collect()
}

fn convolve(sample_rate: f32) -> anyhow::Result<Demo> {
    let mut graph = Graph::new(sample_rate);
    let osc = oscillator(&mut graph, sample_rate, 165.0, Waveform::Square);
    let convolve = Convolve::new(sample_rate);
    if !convolve.handle().load(&room_response(sample_rate, 0.8)) {
        anyhow::bail!("impulse response rejected");
    }
    let convolve = graph.add(Box::new(convolve));
    let normalize = Normalize::new(sample_rate);
    normalize.params().set(Normalize::TARGET, 0.8);
    let normalize = graph.add(Box::new(normalize));
    let sink = endpoint(&mut graph, sample_rate, -6.0);

    wire(&mut graph, osc, 0, convolve, 0)?;
    wire(&mut graph, convolve, 0, normalize, 0)?;
    wire(&mut graph, normalize, 0, sink, 0)?;
    Ok(Demo {
        graph,
        players: Vec::new(),
    })
}
