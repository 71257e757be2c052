//! Signal graph: routes an externally supplied source into a full-band
//! analysis tap on the audible path and two band-limited analysis branches.

mod biquad;
mod graph;
mod tap;

pub use biquad::{Biquad, FilterKind};
pub use graph::{AudioContext, AudioSink, Connection, NodeId, NullSink, Patchbay, SignalGraph};
pub use tap::AnalysisTap;

/// Time-domain window of the full-band tap.
pub const FULL_BAND_FFT_SIZE: usize = 2048;
/// Magnitude bins exposed by the full-band tap.
pub const FREQUENCY_BIN_COUNT: usize = FULL_BAND_FFT_SIZE / 2;
/// Time-domain window of each band tap.
pub const BAND_FFT_SIZE: usize = 1024;
/// Channels a source may carry into the band splitter.
pub const SPLITTER_OUTPUTS: usize = 2;

/// Identifier the transport assigns to each playable source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Opaque handle to an audio source owned by the transport. The engine only
/// records its shape; samples arrive through [`SignalGraph::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceHandle {
    id: SourceId,
    channels: u16,
    sample_rate: u32,
}

impl SourceHandle {
    pub fn new(id: SourceId, channels: u16, sample_rate: u32) -> Self {
        Self {
            id,
            channels,
            sample_rate,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn node(&self) -> NodeId {
        NodeId::Source(self.id)
    }
}
