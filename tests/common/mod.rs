#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from cardscan for tests
pub use cardscan::{
    AnnotatedFrame, Annotator, Catalog, FeatureExtractor, Frame, FramePipeline, MatchResult,
    MemorySink, MemorySource, OrientedRect, Partition, RecognitionConfig, WorkDistributor,
};
