//! Sample player with cue handoff and crossfades.
//!
//! A [`Player`] plays a [`SampleBuffer`] published through its
//! [`SampleSlot`] and announces, on its cue output, when the remaining time
//! drops below its cue threshold. A second player whose cue input is wired
//! to that output starts on the trigger frame. When the emitter has a
//! crossfade duration, it fades itself out over that duration and the
//! receiver fades in over the same duration, so two players chained through
//! a [`Sum`](crate::Sum) hand over without a gap.
//!
//! ```text
//!              cue fires (remaining ≤ T)
//!                  │
//!   A  ── Playing ─┴─ CrossfadingOut ── 1 → 0 over D ──▶ Idle
//!   B  ── Idle ────┬─ CrossfadingIn ─── 0 → 1 over D ──▶ Playing
//!                  └ trigger frame
//! ```
//!
//! Everything the control thread does goes through a [`PlayerHandle`]:
//! track loading is a slot swap, transport commands travel over a channel
//! that `generate` drains without blocking, and tempo detection runs on a
//! background job.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use patchwire_core::{
    BackgroundJob, Block, CueTrigger, EventBlock, Module, ModuleError, ModuleState,
    ParamDescriptor, ParamStore, ParamUnit, PortIo, PortSpec, SampleBuffer, SampleSlot,
    StereoBuffer,
};

use crate::bpm::{TapTempo, detect_bpm};

const INPUTS: [PortSpec; 1] = [PortSpec::cue("cue in")];
const OUTPUTS: [PortSpec; 2] = [PortSpec::audio("audio"), PortSpec::cue("cue out")];

/// Key under which the playhead is serialized.
const PLAYHEAD_KEY: &str = "playhead";

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Stopped or paused; outputs silence and listens for cues.
    Idle,
    /// Playing at full gain.
    Playing,
    /// Fading out after emitting a cue; stops when the gain reaches 0.
    CrossfadingOut,
    /// Fading in after being cued by a crossfading sender.
    CrossfadingIn,
}

/// Transport commands sent by a [`PlayerHandle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Resume, or restart if the playhead sits at the end.
    Play,
    /// Pause at the current position.
    Stop,
    /// Move the playhead to a position in seconds and re-arm the cue.
    Scrub(f32),
}

/// Cue-driven sample player.
///
/// # Parameters
///
/// - `cue_time`: -300-0 s, cue fires when this much time remains (default -5)
/// - `crossfade`: 0-30 s, fade duration advertised with the cue (default 0)
/// - `pitch`: 0.5-2.0 playback rate (default 1.0)
/// - `reverse`: play toward the start
/// - `loop`: restart at the end and re-arm the cue
pub struct Player {
    slot: SampleSlot,
    track: Option<Arc<SampleBuffer>>,
    commands: Receiver<PlayerCommand>,
    command_tx: Sender<PlayerCommand>,
    state: PlayState,
    playhead: f64,
    cue_sent: bool,
    prev_remaining: Option<f64>,
    fade_pos: usize,
    fade_total: usize,
    last_cue: EventBlock<CueTrigger>,
    cue_fresh: bool,
    cached_audio: Option<StereoBuffer>,
    sample_rate: f32,
    params: ParamStore,
}

impl Player {
    /// Cue threshold in seconds before the end (≤ 0).
    pub const CUE_TIME: usize = 0;
    /// Crossfade duration in seconds.
    pub const CROSSFADE: usize = 1;
    /// Playback rate.
    pub const PITCH: usize = 2;
    /// Reverse toggle.
    pub const REVERSE: usize = 3;
    /// Loop toggle.
    pub const LOOP: usize = 4;

    /// Creates an idle player with no track.
    pub fn new(sample_rate: f32) -> Self {
        let (command_tx, commands) = unbounded();
        Self {
            slot: SampleSlot::new(),
            track: None,
            commands,
            command_tx,
            state: PlayState::Idle,
            playhead: 0.0,
            cue_sent: false,
            prev_remaining: None,
            fade_pos: 0,
            fade_total: 1,
            last_cue: EventBlock::empty(0),
            cue_fresh: false,
            cached_audio: None,
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Cue Time", "cue_time", -300.0, 0.0, -5.0)
                    .with_unit(ParamUnit::Seconds)
                    .with_short_name("Cue"),
                ParamDescriptor::custom("Crossfade", "crossfade", 0.0, 30.0, 0.0)
                    .with_unit(ParamUnit::Seconds)
                    .with_short_name("XFade"),
                ParamDescriptor::custom("Pitch", "pitch", 0.5, 2.0, 1.0)
                    .with_unit(ParamUnit::Ratio),
                ParamDescriptor::toggle("Reverse", "reverse", false),
                ParamDescriptor::toggle("Loop", "loop", false),
            ]),
        }
    }

    /// A control-thread handle for loading tracks and sending commands.
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            slot: self.slot.clone(),
            commands: self.command_tx.clone(),
            bpm_job: BackgroundJob::new(),
            bpm: None,
            taps: TapTempo::new(),
            sample_rate: self.sample_rate,
        }
    }

    /// Current transport state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Playhead in track frames.
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Returns true once the cue has fired for the current pass.
    pub fn cue_sent(&self) -> bool {
        self.cue_sent
    }

    /// Cue events produced by the most recently rendered block.
    pub fn last_cue(&self) -> &EventBlock<CueTrigger> {
        &self.last_cue
    }

    fn start_position(&self, len: usize) -> f64 {
        if self.params.get_bool(Self::REVERSE) {
            len.saturating_sub(1) as f64
        } else {
            0.0
        }
    }

    fn at_end(&self, len: usize) -> bool {
        if self.params.get_bool(Self::REVERSE) {
            self.playhead <= 0.0
        } else {
            self.playhead >= len.saturating_sub(1) as f64
        }
    }

    fn rearm(&mut self) {
        self.cue_sent = false;
        self.prev_remaining = None;
    }

    fn fade_frames(&self, secs: f32) -> usize {
        ((f64::from(secs) * f64::from(self.sample_rate)).round() as usize).max(1)
    }

    /// Picks up a newly published track; a change stops playback at the start.
    fn sync_track(&mut self) {
        let current = self.slot.load();
        let same = match (&self.track, &current) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        tracing::debug!(
            frames = current.as_ref().map_or(0, |t| t.len()),
            "player_track_changed"
        );
        self.track = current;
        self.state = PlayState::Idle;
        self.playhead = self.start_position(self.track_len());
        self.rearm();
    }

    fn track_len(&self) -> usize {
        self.track.as_ref().map_or(0, |t| t.len())
    }

    fn apply(&mut self, command: PlayerCommand) {
        let len = self.track_len();
        match command {
            PlayerCommand::Play => {
                if len < 2 {
                    return;
                }
                if self.at_end(len) {
                    self.playhead = self.start_position(len);
                    self.rearm();
                }
                self.state = PlayState::Playing;
            }
            PlayerCommand::Stop => self.state = PlayState::Idle,
            PlayerCommand::Scrub(secs) => {
                let track_sr = self.track.as_ref().map_or(self.sample_rate, |t| t.sample_rate);
                let target = f64::from(secs.max(0.0)) * f64::from(track_sr);
                self.playhead = target.min(len.saturating_sub(1) as f64);
                self.rearm();
            }
        }
    }

    /// Starts playback from a cue received at `frame`.
    fn start_from_cue(&mut self, trigger: CueTrigger) {
        let len = self.track_len();
        if len < 2 {
            tracing::debug!("cue received with no track loaded");
            return;
        }
        self.playhead = self.start_position(len);
        self.rearm();
        if trigger.crossfade_secs > 0.0 {
            self.params.set(Self::CROSSFADE, trigger.crossfade_secs);
            self.fade_pos = 0;
            self.fade_total = self.fade_frames(trigger.crossfade_secs);
            self.state = PlayState::CrossfadingIn;
        } else {
            self.state = PlayState::Playing;
        }
    }

    /// Drains commands, listens for a cue and renders one block.
    fn advance(&mut self, frames: usize, io: &mut PortIo<'_>) -> StereoBuffer {
        self.sync_track();
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }

        let mut start = 0;
        if self.state == PlayState::Idle && io.is_input_connected(0) {
            let incoming = io.receive_cues(0, frames);
            if let Some(&(frame, trigger)) = incoming.first() {
                self.start_from_cue(trigger);
                start = frame;
            }
        }

        let (audio, cues) = self.render(frames, start);
        self.last_cue = cues;
        audio
    }

    fn render(&mut self, frames: usize, start: usize) -> (StereoBuffer, EventBlock<CueTrigger>) {
        let mut out = StereoBuffer::new(frames);
        let mut cues = EventBlock::empty(frames);
        let Some(track) = self.track.clone() else {
            self.state = PlayState::Idle;
            return (out, cues);
        };
        let len = track.len();
        if len < 2 {
            self.state = PlayState::Idle;
            return (out, cues);
        }

        let threshold = -f64::from(self.params.get(Self::CUE_TIME));
        let crossfade = self.params.get(Self::CROSSFADE);
        let pitch = f64::from(self.params.get(Self::PITCH));
        let reverse = self.params.get_bool(Self::REVERSE);
        let looping = self.params.get_bool(Self::LOOP);
        let track_sr = f64::from(track.sample_rate);
        let direction = if reverse { -1.0 } else { 1.0 };
        let step = pitch * direction * track_sr / f64::from(self.sample_rate);
        let last = (len - 1) as f64;

        for i in start..frames {
            if self.state == PlayState::Idle {
                break;
            }
            if self.at_end(len) {
                // A threshold shorter than the last frame fires on the end frame.
                if !self.cue_sent {
                    cues.push(
                        i,
                        CueTrigger {
                            crossfade_secs: crossfade,
                        },
                    );
                    self.cue_sent = true;
                    tracing::debug!(frame = i, playhead = self.playhead, "player_cue_at_end");
                }
                if looping {
                    self.playhead = self.start_position(len);
                    self.rearm();
                    self.state = PlayState::Playing;
                } else {
                    self.playhead = self.playhead.clamp(0.0, last);
                    self.state = PlayState::Idle;
                    tracing::debug!("player_reached_end");
                    break;
                }
            }

            let remaining_frames = if reverse {
                self.playhead
            } else {
                len as f64 - self.playhead
            };
            let remaining = remaining_frames / track_sr / pitch;
            if !self.cue_sent
                && self
                    .prev_remaining
                    .is_some_and(|prev| prev > threshold && remaining <= threshold)
            {
                cues.push(
                    i,
                    CueTrigger {
                        crossfade_secs: crossfade,
                    },
                );
                self.cue_sent = true;
                tracing::debug!(frame = i, playhead = self.playhead, "player_cue");
                if crossfade > 0.0 {
                    self.fade_pos = 0;
                    self.fade_total = self.fade_frames(crossfade);
                    self.state = PlayState::CrossfadingOut;
                }
            }
            self.prev_remaining = Some(remaining);

            let gain = match self.state {
                PlayState::Idle => break,
                PlayState::Playing => 1.0,
                PlayState::CrossfadingIn => {
                    if self.fade_pos >= self.fade_total {
                        self.state = PlayState::Playing;
                        1.0
                    } else {
                        let g = self.fade_pos as f32 / self.fade_total as f32;
                        self.fade_pos += 1;
                        g
                    }
                }
                PlayState::CrossfadingOut => {
                    if self.fade_pos >= self.fade_total {
                        self.state = PlayState::Idle;
                        tracing::debug!("player_faded_out");
                        break;
                    }
                    let g = 1.0 - self.fade_pos as f32 / self.fade_total as f32;
                    self.fade_pos += 1;
                    g
                }
            };

            let (l, r) = interpolate(&track.audio, self.playhead);
            out.left[i] = l * gain;
            out.right[i] = r * gain;
            self.playhead += step;
        }
        (out, cues)
    }
}

/// Linear interpolation at a fractional frame, holding the last frame.
fn interpolate(audio: &StereoBuffer, pos: f64) -> (f32, f32) {
    let len = audio.len();
    let pos = pos.max(0.0);
    let index = pos as usize;
    if index + 1 >= len {
        return audio.frame(len.saturating_sub(1));
    }
    let frac = (pos - index as f64) as f32;
    let (l0, r0) = audio.frame(index);
    let (l1, r1) = audio.frame(index + 1);
    (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
}

impl Module for Player {
    fn kind(&self) -> &'static str {
        "player"
    }

    fn inputs(&self) -> &[PortSpec] {
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        &OUTPUTS
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        if let Some(audio) = self.cached_audio.take() {
            if audio.len() == frames {
                return Ok(Block::Audio(audio));
            }
        }
        let audio = self.advance(frames, io);
        self.cue_fresh = io.is_output_connected(1);
        Ok(Block::Audio(audio))
    }

    /// Output 1 carries the cues of the current block. Whichever output is
    /// pulled first renders the block; the other is served from the result,
    /// so the playhead advances once per block in either order.
    fn generate_port(
        &mut self,
        output: usize,
        frames: usize,
        io: &mut PortIo<'_>,
    ) -> Result<Block, ModuleError> {
        if output != 1 {
            return self.generate(frames, io);
        }
        if self.cue_fresh && self.last_cue.frames() == frames {
            self.cue_fresh = false;
            return Ok(Block::Cue(self.last_cue.clone()));
        }
        let audio = self.advance(frames, io);
        self.cue_fresh = false;
        self.cached_audio = Some(audio);
        Ok(Block::Cue(self.last_cue.clone()))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.state = PlayState::Idle;
        self.playhead = self.start_position(self.track_len());
        self.rearm();
        self.last_cue = EventBlock::empty(0);
        self.cue_fresh = false;
        self.cached_audio = None;
    }

    fn serialize(&self) -> ModuleState {
        let mut state = self.params.snapshot();
        state.insert(PLAYHEAD_KEY.to_string(), serde_json::Value::from(self.playhead));
        state
    }

    fn deserialize(&mut self, state: &ModuleState) -> Result<(), ModuleError> {
        self.params.restore(state)?;
        if let Some(value) = state.get(PLAYHEAD_KEY) {
            self.playhead = value
                .as_f64()
                .filter(|p| p.is_finite() && *p >= 0.0)
                .ok_or_else(|| ModuleError::invalid_state(PLAYHEAD_KEY, "expected a position"))?;
        }
        Ok(())
    }
}

/// Control-thread side of a [`Player`].
pub struct PlayerHandle {
    slot: SampleSlot,
    commands: Sender<PlayerCommand>,
    bpm_job: BackgroundJob<Option<f32>>,
    bpm: Option<f32>,
    taps: TapTempo,
    sample_rate: f32,
}

impl PlayerHandle {
    /// Publishes a track and starts tempo detection in the background.
    ///
    /// The player stops and rewinds on its next block.
    pub fn load(&mut self, track: SampleBuffer) {
        let track = Arc::new(track);
        self.slot.store_arc(Arc::clone(&track));
        self.bpm = None;
        let submitted = self.bpm_job.submit("patchwire-bpm", move || {
            detect_bpm(&track.mono(), track.sample_rate)
        });
        if let Err(err) = submitted {
            tracing::warn!("could not start tempo detection: {err}");
        }
    }

    /// Removes the track.
    pub fn unload(&mut self) {
        self.slot.clear();
        self.bpm_job.cancel();
        self.bpm = None;
    }

    fn send(&self, command: PlayerCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!(?command, "player is gone, command dropped");
        }
    }

    /// Resumes playback.
    pub fn play(&self) {
        self.send(PlayerCommand::Play);
    }

    /// Pauses playback.
    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    /// Seeks to `secs` into the track and re-arms the cue.
    pub fn scrub(&self, secs: f32) {
        self.send(PlayerCommand::Scrub(secs));
    }

    /// Latest detected tempo; never blocks.
    pub fn detected_bpm(&mut self) -> Option<f32> {
        if let Some(result) = self.bpm_job.poll() {
            self.bpm = result;
        }
        self.bpm
    }

    /// Blocks until the running detection finishes. Offline use only.
    pub fn wait_for_bpm(&mut self) -> Option<f32> {
        if let Some(result) = self.bpm_job.wait() {
            self.bpm = result;
        }
        self.bpm
    }

    /// Records a tap now and returns the tapped tempo.
    pub fn tap(&mut self) -> Option<f32> {
        self.taps.tap()
    }

    /// Records a tap at `at`.
    pub fn tap_at(&mut self, at: Instant) -> Option<f32> {
        self.taps.tap_at(at)
    }

    /// Tempo from the current taps.
    pub fn tapped_bpm(&self) -> Option<f32> {
        self.taps.bpm()
    }

    /// Forgets all taps.
    pub fn reset_taps(&mut self) {
        self.taps.reset();
    }

    /// Graph sample rate the player was created at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
