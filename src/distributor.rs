//! Frame-parallel execution across a fixed pool of workers.
//!
//! The coordinator is the only reader of the source. It tags every frame with
//! its sequence index and hands it to the worker that owns that index under
//! [`Partition`]. Workers run the [`FramePipeline`] on their frames and send
//! the annotated results back; the [`Aggregator`] restores source order before
//! frames reach the sink.
use anyhow::Result;
use image::imageops::{self, FilterType};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread;

use crate::config::{OutputSize, RecognitionConfig};
use crate::error::CardScanError;
use crate::models::{AnnotatedFrame, Frame};
use crate::pipeline::{FramePipeline, FrameStats};
use crate::stream::{FrameSink, FrameSource};

/// Round-robin assignment: frame `i` belongs to worker `i mod W`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    workers: usize,
}

impl Partition {
    pub fn new(workers: usize) -> crate::error::Result<Self> {
        if workers == 0 {
            return Err(CardScanError::InvalidWorkerCount);
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn owner(&self, index: usize) -> usize {
        index % self.workers
    }

    pub fn owns(&self, worker: usize, index: usize) -> bool {
        self.owner(index) == worker
    }

    /// Indices in `[0, len)` owned by `worker`
    pub fn owned(&self, worker: usize, len: usize) -> impl Iterator<Item = usize> {
        (worker..len).step_by(self.workers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Reading,
    Processing,
    Done,
}

/// What one worker did over a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub state: WorkerState,
    pub frames: usize,
    /// Frames received that belong to another worker; a routing guard, 0 in a normal run
    pub skipped: usize,
    pub candidates: usize,
    pub dropped: usize,
    pub overlays: usize,
}

impl WorkerReport {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            state: WorkerState::Idle,
            frames: 0,
            skipped: 0,
            candidates: 0,
            dropped: 0,
            overlays: 0,
        }
    }

    fn record(&mut self, stats: FrameStats) {
        self.frames += 1;
        self.candidates += stats.candidates;
        self.dropped += stats.dropped;
        self.overlays += stats.overlays;
    }
}

/// Reorders annotated frames by sequence index
#[derive(Debug, Default)]
pub struct Aggregator {
    next: usize,
    pending: BTreeMap<usize, AnnotatedFrame>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `frame` and return every frame that is now contiguous with
    /// what was already released, in index order.
    pub fn push(&mut self, frame: AnnotatedFrame) -> crate::error::Result<Vec<AnnotatedFrame>> {
        if frame.index < self.next || self.pending.contains_key(&frame.index) {
            return Err(CardScanError::DuplicateFrame(frame.index));
        }
        self.pending.insert(frame.index, frame);

        let mut ready = Vec::new();
        while let Some(frame) = self.pending.remove(&self.next) {
            ready.push(frame);
            self.next += 1;
        }
        Ok(ready)
    }

    /// Index of the next frame to release
    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fails if any frame is still waiting on a gap
    pub fn finish(self) -> crate::error::Result<usize> {
        if !self.pending.is_empty() {
            return Err(CardScanError::MissingFrames {
                next: self.next,
                pending: self.pending.len(),
            });
        }
        Ok(self.next)
    }
}

/// Totals of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames_read: usize,
    pub frames_written: usize,
    pub overlays: usize,
    pub workers: Vec<WorkerReport>,
}

/// Drives a fixed pool of workers over a frame source
pub struct WorkDistributor<'p, 'c> {
    pipeline: &'p FramePipeline<'c>,
    partition: Partition,
    output_size: OutputSize,
    channel_capacity: usize,
}

impl<'p, 'c> WorkDistributor<'p, 'c> {
    pub fn new(pipeline: &'p FramePipeline<'c>, partition: Partition, config: &RecognitionConfig) -> Self {
        Self {
            pipeline,
            partition,
            output_size: config.output_size,
            channel_capacity: config.channel_capacity.max(1),
        }
    }

    /// Process every frame of `source` and append the annotated frames to
    /// `sink` in source order, then close the sink.
    pub fn run(&self, source: &mut dyn FrameSource, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        let workers = self.partition.workers();
        tracing::info!(workers, "starting frame distribution");

        thread::scope(|scope| {
            let (result_tx, result_rx) = mpsc::channel::<AnnotatedFrame>();
            let mut senders = Vec::with_capacity(workers);
            let mut handles = Vec::with_capacity(workers);

            for worker in 0..workers {
                let (frame_tx, frame_rx) = mpsc::sync_channel::<Frame>(self.channel_capacity);
                senders.push(frame_tx);
                let results = result_tx.clone();
                let pipeline = self.pipeline;
                let partition = self.partition;
                handles.push(scope.spawn(move || run_worker(worker, partition, pipeline, frame_rx, results)));
            }
            drop(result_tx);

            let mut aggregator = Aggregator::new();
            let mut written = 0usize;
            let read = self.dispatch(source, &senders, &result_rx, &mut aggregator, sink, &mut written);

            // Closing the input channels lets every worker reach Done.
            drop(senders);

            let mut reports = Vec::with_capacity(workers);
            let mut worker_error = None;
            for (worker, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(e)) => {
                        worker_error.get_or_insert(e);
                    }
                    Err(_) => {
                        worker_error.get_or_insert(anyhow::anyhow!("Worker {} panicked", worker));
                    }
                }
            }
            if let Some(e) = worker_error {
                return Err(e);
            }
            let frames_read = read?;

            for frame in result_rx.iter() {
                self.collect(frame, &mut aggregator, sink, &mut written)?;
            }
            aggregator.finish()?;
            sink.close()?;

            let overlays = reports.iter().map(|r| r.overlays).sum();
            tracing::info!(frames_read, frames_written = written, overlays, "frame distribution finished");

            Ok(RunSummary {
                frames_read,
                frames_written: written,
                overlays,
                workers: reports,
            })
        })
    }

    /// Read the source to the end, routing each frame to its owner and
    /// writing results that are already in order along the way.
    fn dispatch(
        &self,
        source: &mut dyn FrameSource,
        senders: &[SyncSender<Frame>],
        results: &Receiver<AnnotatedFrame>,
        aggregator: &mut Aggregator,
        sink: &mut dyn FrameSink,
        written: &mut usize,
    ) -> Result<usize> {
        let mut index = 0usize;
        loop {
            let image = match source.next_frame() {
                Ok(Some(image)) => image,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "frame source failed, treating as end of stream");
                    break;
                }
            };

            let owner = self.partition.owner(index);
            senders[owner]
                .send(Frame::new(index, image))
                .map_err(|_| anyhow::anyhow!("Worker {} stopped before frame {}", owner, index))?;
            index += 1;

            while let Ok(frame) = results.try_recv() {
                self.collect(frame, aggregator, sink, written)?;
            }
        }
        Ok(index)
    }

    fn collect(
        &self,
        frame: AnnotatedFrame,
        aggregator: &mut Aggregator,
        sink: &mut dyn FrameSink,
        written: &mut usize,
    ) -> Result<()> {
        for ready in aggregator.push(frame)? {
            let OutputSize { width, height } = self.output_size;
            if ready.image.dimensions() == (width, height) {
                sink.append_frame(&ready.image)?;
            } else {
                let resized = imageops::resize(&ready.image, width, height, FilterType::Triangle);
                sink.append_frame(&resized)?;
            }
            *written += 1;
        }
        Ok(())
    }
}

/// Worker loop: Reading, then Processing for each owned frame, until the
/// input channel closes. The coordinator only routes frames to their owner,
/// so the ownership check is a guard and `skipped` stays 0 in a normal run.
fn run_worker(
    worker: usize,
    partition: Partition,
    pipeline: &FramePipeline<'_>,
    frames: Receiver<Frame>,
    results: Sender<AnnotatedFrame>,
) -> Result<WorkerReport> {
    let mut report = WorkerReport::new(worker);

    loop {
        report.state = WorkerState::Reading;
        let Ok(frame) = frames.recv() else {
            break;
        };

        if !partition.owns(worker, frame.index) {
            tracing::warn!(worker, frame = frame.index, "received a frame owned by another worker");
            report.skipped += 1;
            report.state = WorkerState::Idle;
            continue;
        }

        report.state = WorkerState::Processing;
        let (annotated, stats) = pipeline.process(frame)?;
        report.record(stats);
        results
            .send(annotated)
            .map_err(|_| anyhow::anyhow!("Coordinator stopped receiving results from worker {}", worker))?;
        report.state = WorkerState::Idle;
    }

    report.state = WorkerState::Done;
    tracing::debug!(worker, frames = report.frames, overlays = report.overlays, "worker done");
    Ok(report)
}
