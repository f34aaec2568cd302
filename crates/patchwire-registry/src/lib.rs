//! Module registry and factory for patchwire signal graphs.
//!
//! A [`ModuleRegistry`] is an ordinary owned value: build one with
//! [`ModuleRegistry::new`], pass it by reference to whatever needs to
//! instantiate modules by kind (patch loading, the CLI) and drop it when
//! done. There is no global instance.
//!
//! Each entry pairs a [`ModuleDescriptor`] with a constructor. The
//! descriptor's port schema and parameter count are read from a probe
//! instance at registration time, so they always match what
//! [`create`](ModuleRegistry::create) returns.
//!
//! # Example
//!
//! ```rust
//! use patchwire_registry::{ModuleCategory, ModuleRegistry};
//!
//! let registry = ModuleRegistry::new();
//!
//! for module in registry.all() {
//!     println!("{}: {}", module.name, module.description);
//! }
//!
//! let reverb = registry.create("reverb", 48000.0).unwrap();
//! assert_eq!(reverb.kind(), "reverb");
//!
//! for module in registry.in_category(ModuleCategory::Spectral) {
//!     println!("Spectral module: {}", module.name);
//! }
//! ```

use patchwire_core::{Module, PortSpec};
use patchwire_modules::{
    Bandpass, Bitcrusher, Clip, Constant, Convolve, Crossfade, Endpoint, Envelope, Formant, Gain,
    Hold, Lfo, Normalize, Oscillator, Pan, PitchJitter, Player, Reverb, ReverseDelay, SampleHold,
    Shuffle, Slowdown, Split, StaticNoise, Sum, Vocoder,
};

/// Sample rate used when probing a constructor for its schema.
const PROBE_RATE: f32 = 48000.0;

/// Category of module for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleCategory {
    /// Fan-out, mixing, panning and output sinks
    Routing,
    /// Time-domain audio effects
    Effect,
    /// STFT-based processors
    Spectral,
    /// Oscillators and control generators
    Source,
    /// Sample playback
    Playback,
}

impl ModuleCategory {
    /// Every category, in display order.
    pub const ALL: [ModuleCategory; 5] = [
        ModuleCategory::Routing,
        ModuleCategory::Effect,
        ModuleCategory::Spectral,
        ModuleCategory::Source,
        ModuleCategory::Playback,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            ModuleCategory::Routing => "Routing",
            ModuleCategory::Effect => "Effect",
            ModuleCategory::Spectral => "Spectral",
            ModuleCategory::Source => "Source",
            ModuleCategory::Playback => "Playback",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            ModuleCategory::Routing => "Split, sum, pan, crossfade, gain and output endpoints",
            ModuleCategory::Effect => "Reverb, delay, convolution and block-level effects",
            ModuleCategory::Spectral => "Overlap-add FFT processors",
            ModuleCategory::Source => "Oscillators, LFOs and constant control values",
            ModuleCategory::Playback => "Sample players with cue and crossfade handoff",
        }
    }
}

/// Describes a module kind in the registry.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Unique kind id, matching [`Module::kind`].
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the module.
    pub description: &'static str,
    /// Category for organization.
    pub category: ModuleCategory,
    /// Input port schema.
    pub inputs: Vec<PortSpec>,
    /// Output port schema.
    pub outputs: Vec<PortSpec>,
    /// Number of parameters.
    pub param_count: usize,
}

impl ModuleDescriptor {
    /// True for modules with no inputs.
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    /// True for modules with no outputs; the engine pulls these.
    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Constructor for a module at a given sample rate.
pub type ModuleFactory = fn(f32) -> Box<dyn Module>;

struct RegistryEntry {
    descriptor: ModuleDescriptor,
    factory: ModuleFactory,
}

/// Registry of instantiable module kinds.
pub struct ModuleRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Creates a registry with every built-in module registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_modules();
        registry
    }

    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(26),
        }
    }

    fn register_builtin_modules(&mut self) {
        use ModuleCategory::{Effect, Playback, Routing, Source, Spectral};

        // Routing
        self.register(
            "split",
            "Split",
            "Pulls its input once per block for two consumers",
            Routing,
            |sr| Box::new(Split::new(sr)),
        );
        self.register(
            "endpoint",
            "Endpoint",
            "Output sink with a volume fader",
            Routing,
            |sr| Box::new(Endpoint::new(sr)),
        );
        self.register(
            "gain",
            "Gain",
            "Linear gain stage",
            Routing,
            |sr| Box::new(Gain::new(sr)),
        );
        self.register(
            "sum",
            "Sum",
            "Four-input mixer with a master level",
            Routing,
            |sr| Box::new(Sum::new(sr)),
        );
        self.register(
            "pan",
            "Pan",
            "Equal-power stereo panner",
            Routing,
            |sr| Box::new(Pan::new(sr)),
        );
        self.register(
            "crossfade",
            "Crossfade",
            "Linear blend of two inputs",
            Routing,
            |sr| Box::new(Crossfade::new(sr)),
        );

        // Effects
        self.register(
            "reverb",
            "Reverb",
            "Comb and allpass room reverb",
            Effect,
            |sr| Box::new(Reverb::new(sr)),
        );
        self.register(
            "reverse_delay",
            "Reverse Delay",
            "Delay line read backwards",
            Effect,
            |sr| Box::new(ReverseDelay::new(sr)),
        );
        self.register(
            "convolve",
            "Convolve",
            "FFT convolution with a loaded impulse response",
            Effect,
            |sr| Box::new(Convolve::new(sr)),
        );
        self.register(
            "slowdown",
            "Slowdown",
            "Skips or repeats whole input blocks",
            Effect,
            |sr| Box::new(Slowdown::new(sr)),
        );
        self.register(
            "normalize",
            "Normalize",
            "Per-block peak normalization",
            Effect,
            |sr| Box::new(Normalize::new(sr)),
        );
        self.register(
            "shuffle",
            "Shuffle",
            "Reorders chunks within each block",
            Effect,
            |sr| Box::new(Shuffle::new(sr)),
        );
        self.register(
            "bandpass",
            "Bandpass",
            "High-pass and low-pass band limiter",
            Effect,
            |sr| Box::new(Bandpass::new(sr)),
        );
        self.register(
            "clip",
            "Clip",
            "Absolute or peak-relative hard clipper",
            Effect,
            |sr| Box::new(Clip::new(sr)),
        );
        self.register(
            "bitcrusher",
            "Bitcrusher",
            "Bit depth and sample rate reduction",
            Effect,
            |sr| Box::new(Bitcrusher::new(sr)),
        );
        self.register(
            "envelope",
            "Envelope",
            "ADSR envelope on audio or as DC",
            Effect,
            |sr| Box::new(Envelope::new(sr)),
        );
        self.register(
            "sample_hold",
            "Sample & Hold",
            "Random pitch jumps at a fixed rate",
            Effect,
            |sr| Box::new(SampleHold::new(sr)),
        );
        self.register(
            "hold",
            "Hold",
            "Loops the last few blocks on demand",
            Effect,
            |sr| Box::new(Hold::new(sr)),
        );

        // Spectral
        self.register(
            "formant",
            "Formant",
            "Spectral envelope shift with phase kept",
            Spectral,
            |sr| Box::new(Formant::new(sr)),
        );
        self.register(
            "pitch_jitter",
            "Pitch Jitter",
            "Random-walk spectral pitch wobble",
            Spectral,
            |sr| Box::new(PitchJitter::new(sr)),
        );
        self.register(
            "vocoder",
            "Vocoder",
            "Eight-band channel vocoder",
            Spectral,
            |sr| Box::new(Vocoder::new(sr)),
        );

        // Sources
        self.register(
            "constant",
            "Constant",
            "Fixed control value",
            Source,
            |sr| Box::new(Constant::new(sr)),
        );
        self.register(
            "oscillator",
            "Oscillator",
            "Sine, triangle, square and saw oscillator",
            Source,
            |sr| Box::new(Oscillator::new(sr)),
        );
        self.register(
            "lfo",
            "LFO",
            "Sine control oscillator",
            Source,
            |sr| Box::new(Lfo::new(sr)),
        );
        self.register(
            "static",
            "Static",
            "Filtered white noise",
            Source,
            |sr| Box::new(StaticNoise::new(sr)),
        );

        // Playback
        self.register(
            "player",
            "Player",
            "Sample player with cue and crossfade handoff",
            Playback,
            |sr| Box::new(Player::new(sr)),
        );
    }

    /// Registers a module kind, replacing any entry with the same id.
    ///
    /// The constructor is called once to read the port schema and parameter
    /// count.
    pub fn register(
        &mut self,
        id: &'static str,
        name: &'static str,
        description: &'static str,
        category: ModuleCategory,
        factory: ModuleFactory,
    ) {
        let probe = factory(PROBE_RATE);
        if probe.kind() != id {
            tracing::warn!(id, kind = probe.kind(), "registered id differs from module kind");
        }
        let descriptor = ModuleDescriptor {
            id,
            name,
            description,
            category,
            inputs: probe.inputs().to_vec(),
            outputs: probe.outputs().to_vec(),
            param_count: probe.params().len(),
        };
        let entry = RegistryEntry {
            descriptor,
            factory,
        };
        if let Some(existing) = self.entries.iter_mut().find(|e| e.descriptor.id == id) {
            tracing::debug!(id, "registry_replace");
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Returns descriptors for all registered modules.
    pub fn all(&self) -> Vec<&ModuleDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for modules in a specific category.
    pub fn in_category(&self, category: ModuleCategory) -> Vec<&ModuleDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by kind id.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Create a module instance by kind id.
    ///
    /// Returns `None` if the id is not registered.
    pub fn create(&self, id: &str, sample_rate: f32) -> Option<Box<dyn Module>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| (e.factory)(sample_rate))
    }

    /// Find a parameter index by name, short name or string id.
    ///
    /// Matching is case-insensitive. Creates a temporary instance to scan
    /// the descriptors.
    pub fn param_index_by_name(&self, id: &str, param: &str) -> Option<usize> {
        let module = self.create(id, PROBE_RATE)?;
        let lower = param.to_lowercase();
        module.params().descriptors().iter().position(|d| {
            d.name.to_lowercase() == lower
                || d.short_name.to_lowercase() == lower
                || d.string_id == lower
        })
    }

    /// Returns the number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
