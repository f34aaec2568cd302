//! Parameter descriptors and the lock-free parameter store.
//!
//! Every module exposes a flat, ordered list of scalar parameters. The values
//! live in a [`ParamStore`]: a shared array of atomics holding `f32` bit
//! patterns. The module keeps one clone and reads it each block; the control
//! thread keeps another and writes to it. Neither side ever takes a lock, and
//! because each value is a single 32-bit word a read can never observe a torn
//! write.
//!
//! Enumerated and boolean parameters are stepped scalars (`step = 1.0`),
//! read with [`ParamStore::get_index`] and [`ParamStore::get_bool`].
//!
//! # Example
//!
//! ```rust
//! use patchwire_core::{ParamDescriptor, ParamStore};
//!
//! let params = ParamStore::new(vec![ParamDescriptor::mix().with_default(0.3)]);
//! let control = params.clone();
//! control.set(0, 1.5);
//! assert_eq!(params.get(0), 1.0); // clamped to range
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;

use crate::error::ModuleError;
use crate::module::ModuleState;

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamUnit {
    /// Decibels.
    Decibels,
    /// Hertz.
    Hertz,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Cents (hundredths of a semitone).
    Cents,
    /// Frequency or pitch ratio.
    Ratio,
    /// Samples.
    Samples,
    /// Dimensionless.
    #[default]
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Seconds => " s",
            ParamUnit::Cents => " ct",
            ParamUnit::Ratio => "x",
            ParamUnit::Samples => " smp",
            ParamUnit::None => "",
        }
    }
}

/// Metadata for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Full display name, e.g. "Room Size".
    pub name: &'static str,
    /// Abbreviated name for constrained displays.
    pub short_name: &'static str,
    /// Stable identifier used for serialization, e.g. `"room"`.
    pub string_id: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Initial value.
    pub default: f32,
    /// Step size; `0.0` means continuous.
    pub step: f32,
}

impl ParamDescriptor {
    /// Creates a continuous dimensionless parameter.
    pub const fn custom(
        name: &'static str,
        string_id: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name: name,
            string_id,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.0,
        }
    }

    /// Dry/wet mix, 0 to 1.
    pub const fn mix() -> Self {
        Self::custom("Mix", "mix", 0.0, 1.0, 0.5)
    }

    /// Gain in decibels.
    pub const fn gain_db(
        name: &'static str,
        string_id: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, string_id, min, max, default).with_unit(ParamUnit::Decibels)
    }

    /// Time in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        string_id: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, string_id, min, max, default).with_unit(ParamUnit::Milliseconds)
    }

    /// Frequency in hertz.
    pub const fn rate_hz(
        name: &'static str,
        string_id: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::custom(name, string_id, min, max, default).with_unit(ParamUnit::Hertz)
    }

    /// An on/off switch.
    pub const fn toggle(name: &'static str, string_id: &'static str, default: bool) -> Self {
        Self::custom(name, string_id, 0.0, 1.0, if default { 1.0 } else { 0.0 }).with_step(1.0)
    }

    /// A choice among `count` options, stored as `0..count`.
    pub const fn choice(name: &'static str, string_id: &'static str, count: usize) -> Self {
        Self::custom(name, string_id, 0.0, (count - 1) as f32, 0.0).with_step(1.0)
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the step size.
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Sets the default value.
    pub const fn with_default(mut self, default: f32) -> Self {
        self.default = default;
        self
    }

    /// Sets the short display name.
    pub const fn with_short_name(mut self, short_name: &'static str) -> Self {
        self.short_name = short_name;
        self
    }

    /// Clamps a value to range and snaps it to the step grid.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        let clamped = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let steps = libm::roundf((clamped - self.min) / self.step);
            (self.min + steps * self.step).min(self.max)
        } else {
            clamped
        }
    }

    /// Formats a value with its unit suffix.
    pub fn format_value(&self, value: f32) -> String {
        if self.step >= 1.0 {
            format!("{value:.0}{}", self.unit.suffix())
        } else {
            format!("{value:.2}{}", self.unit.suffix())
        }
    }
}

struct StoreInner {
    descriptors: Vec<ParamDescriptor>,
    values: Vec<AtomicU32>,
}

/// Shared, lock-free parameter values for one module.
///
/// Cloning is cheap and every clone refers to the same values.
#[derive(Clone)]
pub struct ParamStore {
    inner: Arc<StoreInner>,
}

impl ParamStore {
    /// Creates a store with every parameter at its default.
    pub fn new(descriptors: Vec<ParamDescriptor>) -> Self {
        let values = descriptors
            .iter()
            .map(|d| AtomicU32::new(d.default.to_bits()))
            .collect();
        Self {
            inner: Arc::new(StoreInner {
                descriptors,
                values,
            }),
        }
    }

    /// A store with no parameters.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.inner.descriptors.len()
    }

    /// Returns true when there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.inner.descriptors.is_empty()
    }

    /// All descriptors in index order.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.inner.descriptors
    }

    /// Descriptor at `index`.
    pub fn descriptor(&self, index: usize) -> Option<&ParamDescriptor> {
        self.inner.descriptors.get(index)
    }

    /// Current value at `index`; `0.0` when out of range.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.inner
            .values
            .get(index)
            .map_or(0.0, |v| f32::from_bits(v.load(Ordering::Relaxed)))
    }

    /// Current value interpreted as a switch.
    #[inline]
    pub fn get_bool(&self, index: usize) -> bool {
        self.get(index) >= 0.5
    }

    /// Current value interpreted as a choice index.
    #[inline]
    pub fn get_index(&self, index: usize) -> usize {
        let v = self.get(index);
        if v <= 0.0 { 0 } else { libm::roundf(v) as usize }
    }

    /// Writes a value, clamped to the descriptor's range.
    ///
    /// Returns false if `index` is out of range.
    pub fn set(&self, index: usize, value: f32) -> bool {
        let (Some(desc), Some(slot)) = (
            self.inner.descriptors.get(index),
            self.inner.values.get(index),
        ) else {
            return false;
        };
        slot.store(desc.clamp(value).to_bits(), Ordering::Relaxed);
        true
    }

    /// Writes a switch value.
    pub fn set_bool(&self, index: usize, on: bool) -> bool {
        self.set(index, if on { 1.0 } else { 0.0 })
    }

    /// Finds a parameter by `string_id`, falling back to a case-insensitive name match.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let descs = &self.inner.descriptors;
        descs
            .iter()
            .position(|d| d.string_id == id)
            .or_else(|| descs.iter().position(|d| d.name.eq_ignore_ascii_case(id)))
    }

    /// Reads a parameter by id.
    pub fn get_by_id(&self, id: &str) -> Option<f32> {
        self.index_of(id).map(|i| self.get(i))
    }

    /// Writes a parameter by id.
    pub fn set_by_id(&self, id: &str, value: f32) -> Result<(), ModuleError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ModuleError::UnknownParam(id.to_string()))?;
        self.set(index, value);
        Ok(())
    }

    /// Resets every parameter to its default.
    pub fn reset_defaults(&self) {
        for (desc, slot) in self.inner.descriptors.iter().zip(&self.inner.values) {
            slot.store(desc.default.to_bits(), Ordering::Relaxed);
        }
    }

    /// Captures all values keyed by `string_id`.
    pub fn snapshot(&self) -> ModuleState {
        let mut state = ModuleState::new();
        for (index, desc) in self.inner.descriptors.iter().enumerate() {
            state.insert(desc.string_id.to_string(), Value::from(self.get(index)));
        }
        state
    }

    /// Restores values from a snapshot.
    ///
    /// Keys that do not name a parameter are ignored so modules can store
    /// extra state alongside their parameters. A known key with a non-numeric
    /// value is an error, and nothing after it is applied.
    pub fn restore(&self, state: &ModuleState) -> Result<(), ModuleError> {
        for (index, desc) in self.inner.descriptors.iter().enumerate() {
            let Some(value) = state.get(desc.string_id) else {
                continue;
            };
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            }
            .ok_or_else(|| ModuleError::invalid_state(desc.string_id, "expected a number"))?;
            self.set(index, number as f32);
        }
        Ok(())
    }
}

impl core::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (index, desc) in self.inner.descriptors.iter().enumerate() {
            map.entry(&desc.string_id, &self.get(index));
        }
        map.finish()
    }
}
