//! Blocks: the unit of data exchanged between ports.
//!
//! A [`Block`] carries exactly N frames of one [`DataType`]. Audio blocks are
//! stereo sample pairs, control blocks hold one scalar per frame, and MIDI/cue
//! blocks are sparse event lists tagged with the frame they occur on.
//!
//! Every type has a silent default ([`Block::silence`]) which the evaluator
//! substitutes for unconnected inputs, unconnected outputs and failed modules.
//! Connections between mismatched types go through [`Block::coerce_to`].

use serde::{Deserialize, Serialize};

use crate::buffer::StereoBuffer;

/// The kind of data a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Stereo sample pairs.
    Audio,
    /// One scalar per frame.
    Control,
    /// Discrete MIDI events.
    Midi,
    /// One-shot handoff triggers.
    Cue,
}

impl DataType {
    /// Lowercase name used in logs and listings.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Audio => "audio",
            DataType::Control => "control",
            DataType::Midi => "midi",
            DataType::Cue => "cue",
        }
    }

    /// True for types carrying one value per frame (audio and control).
    pub const fn is_sampled(self) -> bool {
        matches!(self, DataType::Audio | DataType::Control)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw three-byte MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Status byte (message type and channel).
    pub status: u8,
    /// First data byte.
    pub data1: u8,
    /// Second data byte.
    pub data2: u8,
}

/// A cue trigger.
///
/// `crossfade_secs` is the emitter's crossfade duration; a receiving player
/// adopts it for its fade-in. Zero means a hard cut.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CueTrigger {
    /// Crossfade duration advertised by the sender, in seconds.
    pub crossfade_secs: f32,
}

/// A sparse list of events over a block of `frames` frames.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBlock<T> {
    frames: usize,
    events: Vec<(usize, T)>,
}

impl<T> EventBlock<T> {
    /// An empty block spanning `frames` frames.
    pub fn empty(frames: usize) -> Self {
        Self {
            frames,
            events: Vec::new(),
        }
    }

    /// Number of frames this block spans.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Adds an event at `frame`. Events past the end of the block are dropped.
    pub fn push(&mut self, frame: usize, event: T) {
        if frame < self.frames {
            self.events.push((frame, event));
        }
    }

    /// Events in insertion order as `(frame, event)` pairs.
    pub fn events(&self) -> &[(usize, T)] {
        &self.events
    }

    /// Returns true if the block holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The first event with its frame, if any.
    pub fn first(&self) -> Option<&(usize, T)> {
        self.events.iter().min_by_key(|(frame, _)| *frame)
    }

    fn conform(&mut self, frames: usize) {
        self.events.retain(|(frame, _)| *frame < frames);
        self.frames = frames;
    }
}

/// One block of data flowing through a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Stereo audio.
    Audio(StereoBuffer),
    /// One scalar per frame.
    Control(Vec<f32>),
    /// MIDI events.
    Midi(EventBlock<MidiEvent>),
    /// Cue triggers.
    Cue(EventBlock<CueTrigger>),
}

impl Block {
    /// The type-appropriate default: zeroed audio, 0.0 control, no events.
    pub fn silence(data_type: DataType, frames: usize) -> Self {
        match data_type {
            DataType::Audio => Block::Audio(StereoBuffer::new(frames)),
            DataType::Control => Block::Control(vec![0.0; frames]),
            DataType::Midi => Block::Midi(EventBlock::empty(frames)),
            DataType::Cue => Block::Cue(EventBlock::empty(frames)),
        }
    }

    /// The data type of this block.
    pub fn data_type(&self) -> DataType {
        match self {
            Block::Audio(_) => DataType::Audio,
            Block::Control(_) => DataType::Control,
            Block::Midi(_) => DataType::Midi,
            Block::Cue(_) => DataType::Cue,
        }
    }

    /// Number of frames in the block.
    pub fn frames(&self) -> usize {
        match self {
            Block::Audio(buf) => buf.len(),
            Block::Control(values) => values.len(),
            Block::Midi(events) => events.frames(),
            Block::Cue(events) => events.frames(),
        }
    }

    /// Pads with the default value or truncates so the block spans exactly `frames`.
    pub fn conform(mut self, frames: usize) -> Self {
        match &mut self {
            Block::Audio(buf) => buf.resize(frames),
            Block::Control(values) => values.resize(frames, 0.0),
            Block::Midi(events) => events.conform(frames),
            Block::Cue(events) => events.conform(frames),
        }
        self
    }

    /// Converts the block to `data_type`.
    ///
    /// | from \ to | Audio | Control | Cue |
    /// |-----------|-------|---------|-----|
    /// | Audio | - | mid `(l+r)/2` | rising edge ≥ 0.5 within the block |
    /// | Control | both channels | - | rising edge ≥ 0.5 within the block |
    /// | Cue | 1.0 on trigger frames | 1.0 on trigger frames | - |
    ///
    /// MIDI has no conversion in either direction and becomes the target's default.
    /// [`Graph::receive`](crate::Graph::receive) keeps the edge state of a cue
    /// input between blocks, so a held level triggers only once.
    pub fn coerce_to(self, data_type: DataType) -> Self {
        if self.data_type() == data_type {
            return self;
        }
        match data_type {
            DataType::Audio => Block::Audio(self.into_audio()),
            DataType::Control => Block::Control(self.into_control()),
            DataType::Midi => Block::Midi(self.into_midi()),
            DataType::Cue => Block::Cue(self.into_cues()),
        }
    }

    /// Returns the block as stereo audio, converting if necessary.
    pub fn into_audio(self) -> StereoBuffer {
        match self {
            Block::Audio(buf) => buf,
            Block::Control(values) => StereoBuffer::from_mono(&values),
            Block::Cue(_) => StereoBuffer::from_mono(&self.into_control()),
            Block::Midi(events) => StereoBuffer::new(events.frames()),
        }
    }

    /// Returns the block as control values, converting if necessary.
    pub fn into_control(self) -> Vec<f32> {
        match self {
            Block::Control(values) => values,
            Block::Audio(buf) => (0..buf.len()).map(|i| buf.mid(i)).collect(),
            Block::Cue(events) => {
                let mut values = vec![0.0; events.frames()];
                for (frame, _) in events.events() {
                    values[*frame] = 1.0;
                }
                values
            }
            Block::Midi(events) => vec![0.0; events.frames()],
        }
    }

    /// Returns the block as cue triggers, converting if necessary.
    ///
    /// Sampled signals trigger on each frame where the value rises to 0.5 or
    /// above; the signal is taken to be zero before the first frame. Use
    /// [`into_cues_from`](Self::into_cues_from) to continue edge detection
    /// across consecutive blocks.
    pub fn into_cues(self) -> EventBlock<CueTrigger> {
        self.into_cues_from(0.0).0
    }

    /// Like [`into_cues`](Self::into_cues), with `previous` as the level just
    /// before the first frame.
    ///
    /// Also returns the level of the last frame, to pass as `previous` for the
    /// next block. A level held at or above 0.5 triggers once, on the block
    /// where it rises. Event blocks pass `previous` through unchanged.
    pub fn into_cues_from(self, previous: f32) -> (EventBlock<CueTrigger>, f32) {
        match self {
            Block::Cue(events) => (events, previous),
            Block::Midi(events) => (EventBlock::empty(events.frames()), previous),
            other => {
                let values = other.into_control();
                let mut events = EventBlock::empty(values.len());
                let mut previous = previous;
                for (frame, &value) in values.iter().enumerate() {
                    if value >= 0.5 && previous < 0.5 {
                        events.push(frame, CueTrigger::default());
                    }
                    previous = value;
                }
                (events, previous)
            }
        }
    }

    /// Returns the block as MIDI events; other types carry none.
    pub fn into_midi(self) -> EventBlock<MidiEvent> {
        match self {
            Block::Midi(events) => events,
            other => EventBlock::empty(other.frames()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_per_type() {
        for dt in [
            DataType::Audio,
            DataType::Control,
            DataType::Midi,
            DataType::Cue,
        ] {
            let block = Block::silence(dt, 64);
            assert_eq!(block.data_type(), dt);
            assert_eq!(block.frames(), 64);
        }
        assert_eq!(Block::silence(DataType::Audio, 4).into_audio().peak(), 0.0);
        assert!(Block::silence(DataType::Cue, 4).into_cues().is_empty());
    }

    #[test]
    fn test_conform_pads_and_truncates() {
        let block = Block::Control(vec![1.0, 2.0]).conform(4);
        assert_eq!(block, Block::Control(vec![1.0, 2.0, 0.0, 0.0]));

        let mut cues = EventBlock::empty(8);
        cues.push(1, CueTrigger::default());
        cues.push(6, CueTrigger::default());
        let block = Block::Cue(cues).conform(4).into_cues();
        assert_eq!(block.frames(), 4);
        assert_eq!(block.events().len(), 1);
        assert_eq!(block.events()[0].0, 1);
    }

    #[test]
    fn test_event_push_past_end_dropped() {
        let mut events = EventBlock::empty(2);
        events.push(2, CueTrigger::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_audio_to_control_is_mid() {
        let audio = Block::Audio(StereoBuffer::from_channels(vec![1.0, 0.0], vec![0.0, -1.0]));
        assert_eq!(audio.coerce_to(DataType::Control), Block::Control(vec![0.5, -0.5]));
    }

    #[test]
    fn test_control_to_cue_rising_edges() {
        let control = Block::Control(vec![0.0, 0.7, 0.9, 0.1, 0.5]);
        let cues = control.into_cues();
        let frames: Vec<usize> = cues.events().iter().map(|(f, _)| *f).collect();
        assert_eq!(frames, vec![1, 4]);
    }

    #[test]
    fn test_held_level_triggers_once_across_blocks() {
        let (first, level) = Block::Control(vec![0.0, 1.0, 1.0]).into_cues_from(0.0);
        assert_eq!(first.events().len(), 1);
        let (second, level) = Block::Control(vec![1.0, 1.0]).into_cues_from(level);
        assert!(second.is_empty());
        let (third, _) = Block::Control(vec![0.0, 0.8]).into_cues_from(level);
        assert_eq!(third.events()[0].0, 1);
    }

    #[test]
    fn test_cue_to_audio_impulses() {
        let mut cues = EventBlock::empty(3);
        cues.push(2, CueTrigger { crossfade_secs: 1.0 });
        let audio = Block::Cue(cues).into_audio();
        assert_eq!(audio.left, vec![0.0, 0.0, 1.0]);
        assert_eq!(audio.right, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_midi_coerces_to_default() {
        let mut midi = EventBlock::empty(2);
        midi.push(
            0,
            MidiEvent {
                status: 0x90,
                data1: 60,
                data2: 100,
            },
        );
        let audio = Block::Midi(midi.clone()).coerce_to(DataType::Audio);
        assert_eq!(audio, Block::silence(DataType::Audio, 2));
        let back = Block::Control(vec![1.0, 1.0]).coerce_to(DataType::Midi);
        assert_eq!(back, Block::silence(DataType::Midi, 2));
    }
}
