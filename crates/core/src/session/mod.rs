//! Top-level lifetime owner tying the signal graph, theme selection, frame
//! loop and drawing surface together.

use std::time::Duration;

use serde_json::Value;

use crate::{
    analysis::AnalysisFrame,
    audio::{AudioContext, AudioSink, SignalGraph, SourceHandle},
    conditioning::condition_bands,
    config::{AudioConfig, EngineConfig},
    render::{Surface, SurfaceSize},
    theme::{FrameInputs, Palette, ThemeConfigs, ThemeId},
    timeline::{
        FrameHandle, FrameHost, FrameScheduler, PlaybackClock, QueuedFrameHost, SchedulerState,
    },
    Result,
};

/// What a refresh callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was rendered and the next callback requested.
    Drawn,
    /// Stale or post-stop callback; nothing happened.
    Skipped,
    /// No signal graph yet. The loop stopped and needs another `start`.
    Idle,
}

/// One engine instance bound to one surface and one refresh host.
pub struct EngineSession<S: Surface, H: FrameHost> {
    audio: AudioConfig,
    themes: ThemeConfigs,
    theme: ThemeId,
    context: AudioContext,
    graph: Option<SignalGraph>,
    scheduler: FrameScheduler,
    clock: PlaybackClock,
    surface: S,
    surface_size: SurfaceSize,
    host: H,
}

impl<S: Surface, H: FrameHost> EngineSession<S, H> {
    pub fn new(
        config: EngineConfig,
        surface: S,
        host: H,
        sink: Box<dyn AudioSink>,
    ) -> Result<Self> {
        config.validate()?;
        let EngineConfig {
            audio,
            theme,
            mut themes,
        } = config;
        themes.sanitize();
        let context = AudioContext::new(audio.sample_rate, sink)?;

        Ok(Self {
            audio,
            themes,
            theme,
            context,
            graph: None,
            scheduler: FrameScheduler::new(),
            clock: PlaybackClock::default(),
            surface,
            surface_size: SurfaceSize::default(),
            host,
        })
    }

    /// Replaces the signal graph with one built for `source`. On failure the
    /// previous graph stays disconnected and the session has no graph.
    pub fn attach_source(&mut self, source: SourceHandle) -> Result<()> {
        if let Some(previous) = self.graph.take() {
            previous.teardown(&mut self.context);
        }

        let graph = SignalGraph::build(&mut self.context, source, &self.audio)?;
        tracing::info!(
            source = source.id().get(),
            channels = source.channels(),
            sample_rate = source.sample_rate(),
            "attached audio source"
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Disconnects the current graph, if any.
    pub fn detach_source(&mut self) -> bool {
        let Some(graph) = self.graph.take() else {
            return false;
        };
        graph.teardown(&mut self.context);
        tracing::info!(source = graph.source().id().get(), "detached audio source");
        true
    }

    /// Feeds one block of interleaved source samples through the graph.
    /// Without a graph nothing is connected and the block is dropped.
    pub fn process_audio(&mut self, samples: &[f32]) -> Result<()> {
        match self.graph.as_mut() {
            Some(graph) => graph.process(&mut self.context, samples),
            None => Ok(()),
        }
    }

    /// Takes effect on the next drawn frame.
    pub fn select_theme(&mut self, id: ThemeId) {
        tracing::debug!(theme = %id, "theme selected");
        self.theme = id;
    }

    pub fn update_theme_config(&mut self, id: ThemeId, patch: &Value) -> Result<()> {
        self.themes.update(id, patch)?;
        tracing::debug!(theme = %id, "theme settings updated");
        Ok(())
    }

    /// Unknown ids are kept but draw with the default palette.
    pub fn select_palette(&mut self, id: &str) {
        self.themes.mono_wave.palette = id.to_string();
        if !self.themes.mono_wave.has_known_palette() {
            tracing::warn!(palette = id, fallback = self.palette().id, "unknown palette");
        }
        tracing::debug!(palette = %self.palette().id, "palette selected");
    }

    /// Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        let started = self.scheduler.start(&mut self.host);
        if started {
            tracing::info!(theme = %self.theme, "frame loop started");
        }
        started
    }

    /// Safe to call when already stopped.
    pub fn stop(&mut self) -> bool {
        let stopped = self.scheduler.stop(&mut self.host);
        if stopped {
            tracing::info!("frame loop stopped");
        }
        stopped
    }

    /// Resizes the backing raster. Not part of any tick.
    pub fn resize_surface(&mut self, width: f32, height: f32, pixel_density: f32) -> Result<()> {
        let size = SurfaceSize::new(width, height, pixel_density)?;
        self.surface.resize(size)?;
        self.surface_size = size;
        tracing::debug!(
            width,
            height,
            pixel_density = size.pixel_density,
            backing_width = size.backing_width(),
            backing_height = size.backing_height(),
            "surface resized"
        );
        Ok(())
    }

    /// Refresh callback. The host passes the handle it returned from
    /// `request_frame` and its current timestamp.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Duration) -> Result<TickOutcome> {
        if !self.scheduler.begin_tick(handle) {
            return Ok(TickOutcome::Skipped);
        }

        match self.draw_frame(now) {
            Ok(true) => {
                self.scheduler.schedule_next(&mut self.host);
                Ok(TickOutcome::Drawn)
            }
            Ok(false) => {
                tracing::debug!("no signal graph, frame loop idle until restarted");
                self.scheduler.halt();
                Ok(TickOutcome::Idle)
            }
            Err(err) => {
                tracing::error!(%err, "frame failed, stopping loop");
                self.scheduler.halt();
                Err(err)
            }
        }
    }

    /// Samples, conditions and renders one frame. Session state is read
    /// fresh on every call.
    fn draw_frame(&mut self, now: Duration) -> Result<bool> {
        let Some(graph) = self.graph.as_mut() else {
            return Ok(false);
        };

        let frame = AnalysisFrame::capture(graph)?;
        let metrics = frame.metrics();
        let size = self.surface_size.logical();
        let bands = self
            .theme
            .needs_bands()
            .then(|| condition_bands(&frame, &self.themes.mono_wave, size));

        let inputs = FrameInputs {
            metrics,
            elapsed: self.clock.elapsed(now),
            size,
            bands: bands.as_ref(),
        };
        let list = self.themes.render(self.theme, &inputs);
        self.surface.present(&list)?;

        tracing::trace!(
            theme = %self.theme,
            energy = metrics.energy,
            bass_glow = metrics.bass_glow,
            commands = list.len(),
            "frame drawn"
        );
        Ok(true)
    }

    pub fn theme(&self) -> ThemeId {
        self.theme
    }

    pub fn themes(&self) -> &ThemeConfigs {
        &self.themes
    }

    pub fn palette(&self) -> Palette {
        self.themes.mono_wave.palette()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn graph(&self) -> Option<&SignalGraph> {
        self.graph.as_ref()
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface_size
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<S: Surface> EngineSession<S, QueuedFrameHost> {
    /// Simulates one display refresh: delivers every queued callback and
    /// reports the last one that was not skipped.
    pub fn refresh(&mut self, now: Duration) -> Result<Option<TickOutcome>> {
        let mut outcome = None;
        for handle in self.host.drain() {
            match self.on_frame(handle, now)? {
                TickOutcome::Skipped => {}
                other => outcome = Some(other),
            }
        }
        Ok(outcome)
    }
}
