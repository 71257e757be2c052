//! Core library for the Video Noise visualiser.
//!
//! An audio source is routed into analysis taps, each display refresh turns
//! their contents into drive metrics and conditioned waveforms, and the
//! active theme draws from those onto a surface. Each module owns one stage
//! of that pipeline; [`EngineSession`] ties them together.

pub mod analysis;
pub mod audio;
pub mod conditioning;
pub mod config;
pub mod error;
pub mod record;
pub mod render;
pub mod session;
pub mod theme;
pub mod timeline;

pub use analysis::{AnalysisFrame, Metrics};
pub use audio::{AudioContext, AudioSink, NullSink, SignalGraph, SourceHandle, SourceId};
pub use conditioning::BandWaves;
pub use config::{AudioConfig, EngineConfig};
pub use error::{Result, VideoNoiseError};
pub use record::{FrameRecorder, RecordingSettings};
pub use render::{DisplayList, RasterSurface, Surface, SurfaceSize};
pub use session::{EngineSession, TickOutcome};
pub use theme::{GalaxyConfig, MonoWaveConfig, Palette, ParticlesConfig, ThemeConfigs, ThemeId};
pub use timeline::{FrameHandle, FrameHost, FrameScheduler, QueuedFrameHost, SchedulerState};
