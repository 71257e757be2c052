use std::fmt;

use crate::{
    audio::{
        AnalysisTap, Biquad, SourceHandle, SourceId, BAND_FFT_SIZE, FULL_BAND_FFT_SIZE,
        SPLITTER_OUTPUTS,
    },
    config::AudioConfig,
    Result, VideoNoiseError,
};

/// Audible output of the host audio facility.
pub trait AudioSink {
    /// Receives one block of interleaved samples.
    fn write(&mut self, samples: &[f32], channels: u16);
}

/// Sink that discards everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _samples: &[f32], _channels: u16) {}
}

/// Addressable node of the signal topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Source(SourceId),
    Splitter,
    LowPass,
    HighPass,
    FullTap,
    LowTap,
    HighTap,
    Destination,
}

/// Directed edge from one node output into another node's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub output: usize,
    pub to: NodeId,
}

/// The set of live connections inside an [`AudioContext`].
#[derive(Debug, Default, Clone)]
pub struct Patchbay {
    connections: Vec<Connection>,
}

impl Patchbay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge. Connecting an existing edge again changes nothing.
    pub fn connect(&mut self, from: NodeId, output: usize, to: NodeId) {
        let connection = Connection { from, output, to };
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
    }

    /// Removes every outgoing edge of `node` and returns how many were
    /// removed. Safe to call on nodes that were never connected.
    pub fn disconnect(&mut self, node: NodeId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|connection| connection.from != node);
        before - self.connections.len()
    }

    pub fn is_connected(&self, from: NodeId, output: usize, to: NodeId) -> bool {
        self.connections.contains(&Connection { from, output, to })
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn inputs_of(&self, node: NodeId) -> impl Iterator<Item = &Connection> + '_ {
        self.connections
            .iter()
            .filter(move |connection| connection.to == node)
    }

    pub fn outputs_of(&self, node: NodeId) -> impl Iterator<Item = &Connection> + '_ {
        self.connections
            .iter()
            .filter(move |connection| connection.from == node)
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Host audio facility: sample clock, audible output and wiring.
pub struct AudioContext {
    sample_rate: u32,
    patchbay: Patchbay,
    sink: Box<dyn AudioSink>,
}

impl AudioContext {
    pub fn new(sample_rate: u32, sink: Box<dyn AudioSink>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VideoNoiseError::AudioUnavailable(
                "audio context needs a positive sample rate".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            patchbay: Patchbay::new(),
            sink,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn patchbay(&self) -> &Patchbay {
        &self.patchbay
    }
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.sample_rate)
            .field("connections", &self.patchbay.connections.len())
            .finish()
    }
}

/// Analysis topology for one attached source: a full-band tap on the audible
/// path plus low and high band branches, each with its own tap.
#[derive(Debug)]
pub struct SignalGraph {
    source: SourceHandle,
    low_pass: Biquad,
    high_pass: Biquad,
    full_tap: AnalysisTap,
    low_tap: AnalysisTap,
    high_tap: AnalysisTap,
}

impl SignalGraph {
    /// Validates the source and wires it into the context.
    pub fn build(
        context: &mut AudioContext,
        source: SourceHandle,
        config: &AudioConfig,
    ) -> Result<Self> {
        if !(1..=SPLITTER_OUTPUTS as u16).contains(&source.channels()) {
            return Err(VideoNoiseError::UnsupportedSource {
                channels: source.channels(),
            });
        }

        if source.sample_rate() != context.sample_rate {
            return Err(VideoNoiseError::SampleRateMismatch {
                source_rate: source.sample_rate(),
                context_rate: context.sample_rate,
            });
        }

        let rate = context.sample_rate;
        let graph = Self {
            source,
            low_pass: Biquad::low_pass(rate, config.low_cutoff_hz, config.filter_q),
            high_pass: Biquad::high_pass(rate, config.high_cutoff_hz, config.filter_q),
            full_tap: AnalysisTap::with_spectrum(FULL_BAND_FFT_SIZE, config),
            low_tap: AnalysisTap::time_domain(BAND_FFT_SIZE),
            high_tap: AnalysisTap::time_domain(BAND_FFT_SIZE),
        };

        // Clear any stale edges on the shared nodes before wiring.
        graph.teardown(context);
        graph.connect(context);

        tracing::debug!(
            source = source.id().get(),
            channels = source.channels(),
            connections = context.patchbay.connections.len(),
            "signal graph connected"
        );
        Ok(graph)
    }

    fn nodes(&self) -> [NodeId; 7] {
        [
            self.source.node(),
            NodeId::Splitter,
            NodeId::LowPass,
            NodeId::HighPass,
            NodeId::FullTap,
            NodeId::LowTap,
            NodeId::HighTap,
        ]
    }

    fn connect(&self, context: &mut AudioContext) {
        let bay = &mut context.patchbay;
        let source = self.source.node();

        bay.connect(source, 0, NodeId::Splitter);
        for channel in 0..SPLITTER_OUTPUTS {
            bay.connect(NodeId::Splitter, channel, NodeId::LowPass);
            bay.connect(NodeId::Splitter, channel, NodeId::HighPass);
        }
        bay.connect(NodeId::LowPass, 0, NodeId::LowTap);
        bay.connect(NodeId::HighPass, 0, NodeId::HighTap);

        bay.connect(source, 0, NodeId::FullTap);
        bay.connect(NodeId::FullTap, 0, NodeId::Destination);
    }

    /// Disconnects every node this graph wired. Idempotent.
    pub fn teardown(&self, context: &mut AudioContext) {
        for node in self.nodes() {
            context.patchbay.disconnect(node);
        }
    }

    pub fn source(&self) -> SourceHandle {
        self.source
    }

    pub fn full_tap(&self) -> &AnalysisTap {
        &self.full_tap
    }

    pub fn full_tap_mut(&mut self) -> &mut AnalysisTap {
        &mut self.full_tap
    }

    pub fn low_tap(&self) -> &AnalysisTap {
        &self.low_tap
    }

    pub fn high_tap(&self) -> &AnalysisTap {
        &self.high_tap
    }

    /// Runs one block of interleaved source samples through the connected
    /// paths and forwards the audible path to the context's sink.
    pub fn process(&mut self, context: &mut AudioContext, samples: &[f32]) -> Result<()> {
        let channels = self.source.channels() as usize;
        if samples.len() % channels != 0 {
            return Err(VideoNoiseError::msg(format!(
                "block of {} samples is not a whole number of {channels}-channel frames",
                samples.len()
            )));
        }

        let routing = Routing::resolve(&context.patchbay, self.source.node());
        for frame in samples.chunks_exact(channels) {
            if routing.full_tap {
                let mono = frame.iter().sum::<f32>() / channels as f32;
                self.full_tap.push(mono);
            }

            let mut low_in = 0.0;
            let mut high_in = 0.0;
            for (channel, sample) in frame.iter().enumerate() {
                if routing.low_channels[channel] {
                    low_in += sample;
                }
                if routing.high_channels[channel] {
                    high_in += sample;
                }
            }

            let low = self.low_pass.process(low_in);
            if routing.low_tap {
                self.low_tap.push(low);
            }
            let high = self.high_pass.process(high_in);
            if routing.high_tap {
                self.high_tap.push(high);
            }
        }

        for _ in 0..routing.outputs {
            context.sink.write(samples, self.source.channels());
        }

        Ok(())
    }
}

/// Which paths of the fixed topology currently carry signal.
#[derive(Debug, Default)]
struct Routing {
    full_tap: bool,
    low_channels: [bool; SPLITTER_OUTPUTS],
    high_channels: [bool; SPLITTER_OUTPUTS],
    low_tap: bool,
    high_tap: bool,
    outputs: usize,
}

impl Routing {
    fn resolve(bay: &Patchbay, source: NodeId) -> Self {
        let mut routing = Routing {
            full_tap: bay.is_connected(source, 0, NodeId::FullTap),
            low_tap: bay.is_connected(NodeId::LowPass, 0, NodeId::LowTap),
            high_tap: bay.is_connected(NodeId::HighPass, 0, NodeId::HighTap),
            ..Default::default()
        };

        if bay.is_connected(source, 0, NodeId::Splitter) {
            for channel in 0..SPLITTER_OUTPUTS {
                routing.low_channels[channel] =
                    bay.is_connected(NodeId::Splitter, channel, NodeId::LowPass);
                routing.high_channels[channel] =
                    bay.is_connected(NodeId::Splitter, channel, NodeId::HighPass);
            }
        }

        if routing.full_tap {
            routing.outputs = bay
                .outputs_of(NodeId::FullTap)
                .filter(|connection| connection.to == NodeId::Destination)
                .count();
        }

        routing
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink {
        blocks: Rc<RefCell<Vec<Vec<f32>>>>,
    }

    impl AudioSink for RecordingSink {
        fn write(&mut self, samples: &[f32], _channels: u16) {
            self.blocks.borrow_mut().push(samples.to_vec());
        }
    }

    fn context_with_sink() -> (AudioContext, RecordingSink) {
        let sink = RecordingSink::default();
        let context = AudioContext::new(48_000, Box::new(sink.clone())).unwrap();
        (context, sink)
    }

    #[test]
    fn patchbay_ignores_duplicate_edges_and_repeated_disconnects() {
        let mut bay = Patchbay::new();
        bay.connect(NodeId::FullTap, 0, NodeId::Destination);
        bay.connect(NodeId::FullTap, 0, NodeId::Destination);
        assert_eq!(bay.connections().len(), 1);

        assert_eq!(bay.disconnect(NodeId::FullTap), 1);
        assert_eq!(bay.disconnect(NodeId::FullTap), 0);
        assert_eq!(bay.disconnect(NodeId::Splitter), 0);
        assert!(bay.is_empty());
    }

    #[test]
    fn builds_expected_topology() {
        let (mut context, _) = context_with_sink();
        let source = SourceHandle::new(SourceId::new(1), 2, 48_000);
        let graph = SignalGraph::build(&mut context, source, &AudioConfig::default()).unwrap();

        let bay = context.patchbay();
        assert!(bay.is_connected(source.node(), 0, NodeId::FullTap));
        assert!(bay.is_connected(NodeId::FullTap, 0, NodeId::Destination));
        assert!(bay.is_connected(NodeId::Splitter, 0, NodeId::LowPass));
        assert!(bay.is_connected(NodeId::Splitter, 1, NodeId::LowPass));
        assert!(bay.is_connected(NodeId::Splitter, 1, NodeId::HighPass));
        assert!(bay.is_connected(NodeId::HighPass, 0, NodeId::HighTap));

        assert_eq!(graph.full_tap().fft_size(), 2048);
        assert_eq!(graph.full_tap().frequency_bin_count(), 1024);
        assert_eq!(graph.low_tap().fft_size(), 1024);
        assert!(!graph.high_tap().has_spectrum());
    }

    #[test]
    fn rejects_unsupported_sources() {
        let (mut context, _) = context_with_sink();
        let config = AudioConfig::default();

        let silent = SourceHandle::new(SourceId::new(1), 0, 48_000);
        assert!(matches!(
            SignalGraph::build(&mut context, silent, &config),
            Err(VideoNoiseError::UnsupportedSource { channels: 0 })
        ));

        let surround = SourceHandle::new(SourceId::new(2), 6, 48_000);
        assert!(SignalGraph::build(&mut context, surround, &config).is_err());

        let resampled = SourceHandle::new(SourceId::new(3), 2, 44_100);
        assert!(matches!(
            SignalGraph::build(&mut context, resampled, &config),
            Err(VideoNoiseError::SampleRateMismatch { .. })
        ));
        assert!(context.patchbay().is_empty());
    }

    #[test]
    fn rebuilding_leaves_a_single_output_path() {
        let (mut context, sink) = context_with_sink();
        let config = AudioConfig::default();
        let first = SourceHandle::new(SourceId::new(1), 2, 48_000);
        let second = SourceHandle::new(SourceId::new(2), 1, 48_000);

        let old = SignalGraph::build(&mut context, first, &config).unwrap();
        old.teardown(&mut context);
        old.teardown(&mut context);
        let mut graph = SignalGraph::build(&mut context, second, &config).unwrap();

        let bay = context.patchbay();
        assert_eq!(bay.outputs_of(first.node()).count(), 0);
        assert_eq!(bay.inputs_of(NodeId::Destination).count(), 1);
        assert_eq!(bay.inputs_of(NodeId::FullTap).count(), 1);

        graph.process(&mut context, &[0.25; 64]).unwrap();
        assert_eq!(sink.blocks.borrow().len(), 1);
    }

    #[test]
    fn stereo_channels_fold_into_band_filters() {
        let (mut context, _) = context_with_sink();
        let source = SourceHandle::new(SourceId::new(7), 2, 48_000);
        let mut graph = SignalGraph::build(&mut context, source, &AudioConfig::default()).unwrap();

        // Right channel only: the low band must still see it.
        let block: Vec<f32> = (0..4096)
            .flat_map(|n| {
                let x = (2.0 * std::f32::consts::PI * 60.0 * n as f32 / 48_000.0).sin();
                [0.0, 0.5 * x]
            })
            .collect();
        graph.process(&mut context, &block).unwrap();

        let mut low = [128u8; 1024];
        graph.low_tap().byte_time_domain_data(&mut low);
        assert!(low.iter().any(|&byte| byte.abs_diff(128) > 20));

        let mut high = [0u8; 1024];
        graph.high_tap().byte_time_domain_data(&mut high);
        assert!(high.iter().all(|&byte| byte.abs_diff(128) <= 2));
    }

    #[test]
    fn disconnected_graph_stays_silent() {
        let (mut context, sink) = context_with_sink();
        let source = SourceHandle::new(SourceId::new(1), 1, 48_000);
        let mut graph = SignalGraph::build(&mut context, source, &AudioConfig::default()).unwrap();
        graph.teardown(&mut context);

        graph.process(&mut context, &[0.9; 256]).unwrap();
        assert!(sink.blocks.borrow().is_empty());
        let mut full = [0u8; 2048];
        graph.full_tap().byte_time_domain_data(&mut full);
        assert!(full.iter().all(|&byte| byte == 128));
    }

    #[test]
    fn rejects_partial_frames() {
        let (mut context, _) = context_with_sink();
        let source = SourceHandle::new(SourceId::new(1), 2, 48_000);
        let mut graph = SignalGraph::build(&mut context, source, &AudioConfig::default()).unwrap();
        assert!(graph.process(&mut context, &[0.0; 3]).is_err());
    }
}
