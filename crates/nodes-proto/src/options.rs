//! Codec configuration.

use serde::Deserialize;

use crate::constants::DEFAULT_MAX_RECORD_SIZE;

/// Knobs for the encoder.
///
/// Loadable from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Store fresh key lists as deltas between consecutive sorted ids.
    /// Readers must be configured with the same setting.
    pub keys_delta: bool,
    /// Allow value lists to be stored relative to their minimum id.
    pub values_offsets: bool,
    /// Replace structurally identical subtrees with a reference to the first one.
    pub dedup_nodes: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            keys_delta: false,
            values_offsets: true,
            dedup_nodes: true,
        }
    }
}

/// Knobs for the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Largest length prefix accepted for a single message.
    pub max_record_size: usize,
    /// Key lists were written with [`EncodeOptions::keys_delta`].
    pub keys_delta: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            keys_delta: false,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_record_size(mut self, max_record_size: usize) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    pub fn with_keys_delta(mut self, keys_delta: bool) -> Self {
        self.keys_delta = keys_delta;
        self
    }
}
