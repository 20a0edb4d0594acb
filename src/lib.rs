pub mod annotate;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod detection;
pub mod distributor;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod rectify;
pub mod stream;

pub use annotate::Annotator;
pub use catalog::{Catalog, ReferenceEntry};
pub use classify::Classifier;
pub use config::{OutputSize, RecognitionConfig};
pub use detection::ShapeDetector;
pub use distributor::{Aggregator, Partition, RunSummary, WorkDistributor, WorkerReport, WorkerState};
pub use error::CardScanError;
pub use features::{Descriptor, DescriptorSet, FeatureExtractor};
pub use models::{AnnotatedFrame, Candidate, Frame, MatchResult, OrientedRect, Overlay};
pub use pipeline::{DebugConfig, FramePipeline, FrameStats, PipelineContext};
pub use stream::{FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource, MemorySink, MemorySource};
