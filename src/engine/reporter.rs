/// The control cycle tying scheduler, sensor, buffer, aggregator and uploader together
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::ScheduleConfig;
use crate::engine::aggregator::{aggregate, Aggregation};
use crate::engine::buffer::{Insertion, SampleBuffer};
use crate::engine::scheduler::{ScheduleMode, Scheduler};
use crate::engine::uploader::{UploadOutcome, Uploader};
use crate::models::{DisplayStatus, Sample};
use crate::peripherals::{ClockSource, CloudMirror, CloudSync, SensorReader, StatusDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Sampling,
    Aggregating,
    Uploading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    NothingToAggregate,
    /// Buffer held only unusable samples and was cleared
    NoUsableData { discarded: usize },
    Upload(UploadOutcome),
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub mode: ScheduleMode,
    pub sampled: Option<Sample>,
    pub report: Option<ReportOutcome>,
    /// States entered during the tick, always ending in `Idle`
    pub states: Vec<EngineState>,
}

/// External collaborators the engine drives
pub struct Collaborators {
    pub clock: Box<dyn ClockSource>,
    pub sensor: Box<dyn SensorReader>,
    pub uploader: Uploader,
    pub cloud: Box<dyn CloudSync>,
    pub display: Box<dyn StatusDisplay>,
}

/// Sampling-and-reporting engine. Sole owner of the sample buffer.
pub struct ReportingEngine {
    scheduler: Scheduler,
    buffer: SampleBuffer,
    mirror: CloudMirror,
    state: EngineState,
    connected: bool,
    io: Collaborators,
}

impl ReportingEngine {
    pub fn new(schedule: &ScheduleConfig, io: Collaborators) -> Self {
        ReportingEngine {
            scheduler: Scheduler::new(schedule),
            buffer: SampleBuffer::new(schedule.buffer_capacity, schedule.buffer_policy),
            mirror: CloudMirror::new(),
            state: EngineState::Idle,
            // provisioning has already succeeded when the engine is built
            connected: true,
            io,
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn mirror(&self) -> &CloudMirror {
        &self.mirror
    }

    fn enter(&mut self, state: EngineState, trace: &mut Vec<EngineState>) {
        if state != self.state {
            debug!("Engine {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        trace.push(state);
    }

    /// Run one control cycle. Never fails: faults end up in the outcome,
    /// the buffer contents and the scheduler mode.
    pub async fn tick(&mut self, now: Instant) -> CycleOutcome {
        let mut trace = Vec::new();
        let wall = self.io.clock.now();
        let mode = self.scheduler.update_mode(wall);

        let mut sampled = None;
        if self.scheduler.sample_due(now, wall) {
            if self.buffer.is_accepting() {
                self.enter(EngineState::Sampling, &mut trace);
                sampled = Some(self.sample(now).await);
                tokio::task::yield_now().await;
            } else {
                debug!("Buffer full under bounded policy, sampling paused");
            }
        }

        let mut report = None;
        if self
            .scheduler
            .take_report_due(now, wall, self.buffer.is_full())
        {
            report = Some(self.report(&mut trace).await);
            tokio::task::yield_now().await;
        }

        self.enter(EngineState::Idle, &mut trace);

        self.mirror.flush(self.io.cloud.as_ref()).await;
        self.io.display.show(&DisplayStatus {
            temperature: self.mirror.values().temperature,
            humidity: self.mirror.values().humidity,
            connected: self.connected,
            clock_synced: wall.is_some(),
            buffered: self.buffer.len(),
        });

        CycleOutcome {
            mode,
            sampled,
            report,
            states: trace,
        }
    }

    async fn sample(&mut self, now: Instant) -> Sample {
        let sample = Sample::from_raw(self.io.sensor.read().await);
        self.scheduler.record_sample(now);

        if sample.valid_pair().is_none() {
            warn!(
                "Sensor reading partly invalid: temperature={:?}, humidity={:?}",
                sample.temperature, sample.humidity
            );
        }

        if let Insertion::Evicted(oldest) = self.buffer.insert(sample) {
            debug!("Buffer full, evicted oldest sample {:?}", oldest);
        }
        self.mirror.update(&sample);

        info!(
            "Sample {}/{}: temperature={:?}, humidity={:?}",
            self.buffer.len(),
            self.buffer.capacity(),
            sample.temperature,
            sample.humidity
        );
        sample
    }

    async fn report(&mut self, trace: &mut Vec<EngineState>) -> ReportOutcome {
        self.enter(EngineState::Aggregating, trace);

        match aggregate(&self.buffer) {
            Aggregation::Empty => {
                info!("Report due but no samples buffered");
                ReportOutcome::NothingToAggregate
            }
            Aggregation::NoUsableData { total } => {
                warn!("No valid samples among {}, discarding window", total);
                self.buffer.clear();
                ReportOutcome::NoUsableData { discarded: total }
            }
            Aggregation::Ready(result) => {
                self.enter(EngineState::Uploading, trace);
                let outcome = self.io.uploader.upload(&result, &mut self.buffer).await;
                match outcome {
                    UploadOutcome::Skipped => self.connected = false,
                    UploadOutcome::Delivered(_) | UploadOutcome::Rejected(_) => {
                        self.connected = true
                    }
                    UploadOutcome::Failed(_) => {}
                }
                ReportOutcome::Upload(outcome)
            }
        }
    }
}
