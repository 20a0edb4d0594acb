mod common;

use cardscan::distributor::{Aggregator, WorkerState};
use cardscan::{CardScanError, FrameSource};
use common::*;
use image::{Rgb, RgbImage};
use std::collections::HashSet;

fn gray_frame(level: u8) -> RgbImage {
    RgbImage::from_pixel(64, 48, Rgb([level, level, level]))
}

fn annotated(index: usize) -> AnnotatedFrame {
    AnnotatedFrame {
        index,
        image: RgbImage::new(1, 1),
        overlays: Vec::new(),
    }
}

#[test]
fn test_partition_covers_every_index_once() {
    for workers in 1..8 {
        let partition = Partition::new(workers).unwrap();
        for len in 0..50 {
            let mut seen = HashSet::new();
            for worker in 0..workers {
                for index in partition.owned(worker, len) {
                    assert!(partition.owns(worker, index));
                    assert!(seen.insert(index), "index {} assigned twice", index);
                }
            }
            assert_eq!(seen.len(), len);
            assert!((0..len).all(|i| seen.contains(&i)));
        }
    }
}

#[test]
fn test_partition_rejects_zero_workers() {
    assert!(matches!(Partition::new(0), Err(CardScanError::InvalidWorkerCount)));
}

#[test]
fn test_aggregator_reorders() {
    let mut aggregator = Aggregator::new();

    assert!(aggregator.push(annotated(2)).unwrap().is_empty());
    assert!(aggregator.push(annotated(1)).unwrap().is_empty());
    assert_eq!(aggregator.pending(), 2);

    let released: Vec<usize> = aggregator
        .push(annotated(0))
        .unwrap()
        .iter()
        .map(|f| f.index)
        .collect();
    assert_eq!(released, vec![0, 1, 2]);
    assert_eq!(aggregator.next_index(), 3);
    assert_eq!(aggregator.finish().unwrap(), 3);
}

#[test]
fn test_aggregator_rejects_duplicates() {
    let mut aggregator = Aggregator::new();
    aggregator.push(annotated(0)).unwrap();
    aggregator.push(annotated(2)).unwrap();

    assert!(matches!(aggregator.push(annotated(0)), Err(CardScanError::DuplicateFrame(0))));
    assert!(matches!(aggregator.push(annotated(2)), Err(CardScanError::DuplicateFrame(2))));
}

#[test]
fn test_aggregator_reports_gap() {
    let mut aggregator = Aggregator::new();
    aggregator.push(annotated(0)).unwrap();
    aggregator.push(annotated(3)).unwrap();

    assert!(matches!(
        aggregator.finish(),
        Err(CardScanError::MissingFrames { next: 1, pending: 1 })
    ));
}

#[test]
fn test_ten_frames_three_workers() -> anyhow::Result<()> {
    let catalog = Catalog::default();
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog);
    let partition = Partition::new(3)?;

    let mut source = MemorySource::new((0..10).map(|i| gray_frame(i * 20)).collect());
    let mut sink = MemorySink::new();
    let summary = WorkDistributor::new(&pipeline, partition, &config).run(&mut source, &mut sink)?;

    assert_eq!(summary.frames_read, 10);
    assert_eq!(summary.frames_written, 10);
    assert!(sink.closed);
    assert_eq!(sink.frames.len(), 10);

    // Frame i was filled with level i * 20, so the sink order shows the source order
    for (i, frame) in sink.frames.iter().enumerate() {
        assert_eq!(frame.dimensions(), (480, 360));
        let level = (i * 20) as u8;
        assert_eq!(*frame.get_pixel(0, 0), Rgb([level, level, level]));
        assert_eq!(*frame.get_pixel(240, 180), Rgb([level, level, level]));
    }

    let frames: Vec<usize> = summary.workers.iter().map(|r| r.frames).collect();
    assert_eq!(frames, vec![4, 3, 3]);
    assert!(summary.workers.iter().all(|r| r.state == WorkerState::Done));
    assert!(summary.workers.iter().all(|r| r.skipped == 0));
    Ok(())
}

#[test]
fn test_more_workers_than_frames() -> anyhow::Result<()> {
    let catalog = Catalog::default();
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog);

    let mut source = MemorySource::new((0..3).map(|i| gray_frame(i * 50)).collect());
    let mut sink = MemorySink::new();
    let summary = WorkDistributor::new(&pipeline, Partition::new(8)?, &config).run(&mut source, &mut sink)?;

    assert_eq!(summary.frames_written, 3);
    assert_eq!(summary.workers.len(), 8);
    assert_eq!(summary.workers.iter().map(|r| r.frames).sum::<usize>(), 3);
    Ok(())
}

#[test]
fn test_empty_stream() -> anyhow::Result<()> {
    let catalog = Catalog::default();
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog);

    let mut source = MemorySource::default();
    let mut sink = MemorySink::new();
    let summary = WorkDistributor::new(&pipeline, Partition::new(2)?, &config).run(&mut source, &mut sink)?;

    assert_eq!(summary.frames_read, 0);
    assert!(sink.frames.is_empty());
    assert!(sink.closed);
    Ok(())
}

/// Yields `good` frames, then fails
struct FailingSource {
    good: usize,
    served: usize,
}

impl FrameSource for FailingSource {
    fn next_frame(&mut self) -> cardscan::error::Result<Option<RgbImage>> {
        if self.served == self.good {
            return Err(CardScanError::FrameRead {
                index: self.served,
                reason: "corrupt frame".to_string(),
            });
        }
        self.served += 1;
        Ok(Some(gray_frame(self.served as u8)))
    }
}

#[test]
fn test_read_failure_ends_stream() -> anyhow::Result<()> {
    let catalog = Catalog::default();
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog);

    let mut source = FailingSource { good: 5, served: 0 };
    let mut sink = MemorySink::new();
    let summary = WorkDistributor::new(&pipeline, Partition::new(2)?, &config).run(&mut source, &mut sink)?;

    assert_eq!(summary.frames_read, 5);
    assert_eq!(sink.frames.len(), 5);
    assert!(sink.closed);
    Ok(())
}

#[test]
fn test_cards_recognized_across_workers() -> anyhow::Result<()> {
    let (catalog, _) = test_catalog(4);
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog);

    let frames: Vec<RgbImage> = (0..4)
        .map(|i| frame_with_card(&references(4)[i].0, 320, 240, 110, 50))
        .collect();
    let mut source = MemorySource::new(frames);
    let mut sink = MemorySink::new();
    let summary = WorkDistributor::new(&pipeline, Partition::new(2)?, &config).run(&mut source, &mut sink)?;

    assert_eq!(summary.frames_written, 4);
    assert!(summary.overlays >= 4);
    Ok(())
}

#[test]
fn test_worker_failure_aborts_run() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("crops");

    let (catalog, _) = test_catalog(2);
    let config = test_config();
    let pipeline = FramePipeline::new(&config, &catalog).with_debug(debug_dir.clone())?;
    // Frame 0's crop directory cannot be created
    std::fs::write(debug_dir.join("00000"), "in the way")?;

    let frames: Vec<RgbImage> = (0..4)
        .map(|i| frame_with_card(&references(2)[i % 2].0, 320, 240, 110, 50))
        .collect();
    let mut source = MemorySource::new(frames);
    let mut sink = MemorySink::new();
    let result = WorkDistributor::new(&pipeline, Partition::new(2)?, &config).run(&mut source, &mut sink);

    assert!(result.is_err());
    assert!(!sink.closed);
    Ok(())
}
