use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use bb_core::{Image, ImageView};
use log::{debug, warn};

use crate::config::SharedConfig;
use crate::gate::{GatePermit, ReadyGate};
use crate::pipeline::{FrameAnalysis, FrameStages, PipelineError};

/// Outcome of one frame processed on the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Sample(FrameAnalysis),
    Failed(PipelineError),
}

struct Job {
    frame: Image<u8>,
    permit: GatePermit,
}

/// Runs the frame stages on one dedicated thread.
///
/// Producers call [`offer`](Self::offer) from any thread. A frame is accepted
/// only if the previous one has been fully processed and its event delivered;
/// otherwise it is dropped and `offer` returns `false`.
pub struct PipelineWorker {
    config: SharedConfig,
    gate: ReadyGate,
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    pub fn spawn(config: SharedConfig) -> io::Result<(Self, Receiver<WorkerEvent>)> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (event_tx, event_rx) = mpsc::channel();

        let thread_config = config.clone();
        let handle = thread::Builder::new()
            .name("ballbar-pipeline".into())
            .spawn(move || run(thread_config, job_rx, event_tx))?;

        Ok((
            Self {
                config,
                gate: ReadyGate::new(),
                tx: Some(job_tx),
                handle: Some(handle),
            },
            event_rx,
        ))
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn gate(&self) -> &ReadyGate {
        &self.gate
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Hands `frame` to the worker if it is idle.
    pub fn offer(&self, frame: Image<u8>) -> bool {
        let Some(permit) = self.gate.try_acquire() else {
            debug!("worker busy, dropping frame");
            return false;
        };
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(Job { frame, permit }).is_err() {
            warn!("pipeline worker has exited, dropping frame");
            return false;
        }
        true
    }

    /// Copies `frame` only when the worker will accept it.
    pub fn offer_view(&self, frame: &ImageView<'_, u8>) -> bool {
        if !self.gate.is_ready() {
            debug!("worker busy, dropping frame");
            return false;
        }
        self.offer(frame.to_image())
    }

    /// Stops accepting frames and waits for the in-flight one to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("pipeline worker panicked");
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(config: SharedConfig, jobs: Receiver<Job>, events: Sender<WorkerEvent>) {
    let mut stages = FrameStages::new(&config.snapshot());

    for Job { frame, permit } in jobs {
        let cfg = config.snapshot();
        let event = match stages.run(&frame.as_view(), &cfg) {
            Ok(Some(analysis)) => Some(WorkerEvent::Sample(analysis)),
            Ok(None) => None,
            Err(err) => Some(WorkerEvent::Failed(err)),
        };

        if let Some(event) = event
            && events.send(event).is_err()
        {
            debug!("event receiver dropped, stopping pipeline worker");
            return;
        }
        drop(permit);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use approx::assert_abs_diff_eq;
    use bb_core::Image;

    use super::{PipelineWorker, WorkerEvent};
    use crate::config::{PipelineConfig, SharedConfig};
    use crate::pipeline::PipelineError;
    use crate::units::GeometryError;

    fn stripe_frame(height: usize, center: f64) -> Image<u8> {
        let width = 8;
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            let d = y as f64 - center;
            let v = 5.0 + 240.0 * (-(d * d) / 32.0).exp();
            data[y * width..(y + 1) * width].fill(v.round() as u8);
        }
        Image::from_vec(width, height, data).expect("valid frame")
    }

    fn wait_ready(worker: &PipelineWorker) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !worker.is_ready() {
            assert!(Instant::now() < deadline, "worker never became ready");
            std::thread::yield_now();
        }
    }

    #[test]
    fn processes_offered_frames_in_order() {
        let config = SharedConfig::new(PipelineConfig {
            sensor_size_mm: 1.0,
            ..PipelineConfig::default()
        });
        let (worker, events) = PipelineWorker::spawn(config).expect("spawn");

        for center in [40.0, 60.0] {
            wait_ready(&worker);
            assert!(worker.offer(stripe_frame(100, center)));
            match events.recv_timeout(Duration::from_secs(10)) {
                Ok(WorkerEvent::Sample(a)) => {
                    assert!(a.peak_found);
                    assert_abs_diff_eq!(a.sample.pixel_position, center, epsilon = 0.05);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        worker.shutdown();
    }

    #[test]
    fn frames_offered_while_busy_are_dropped() {
        let (worker, events) = PipelineWorker::spawn(SharedConfig::default()).expect("spawn");

        // Holding the permit makes the worker look busy to producers.
        let held = worker.gate().try_acquire().expect("idle worker");
        assert!(!worker.offer(stripe_frame(64, 30.0)));
        assert!(!worker.offer_view(&stripe_frame(64, 30.0).as_view()));
        drop(held);

        assert!(worker.offer(stripe_frame(64, 30.0)));
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(10)),
            Ok(WorkerEvent::Sample(_))
        ));
        wait_ready(&worker);
        drop(worker);

        assert!(events.try_recv().is_err(), "dropped frames emit nothing");
    }

    #[test]
    fn invalid_geometry_is_reported_as_event() {
        let config = SharedConfig::new(PipelineConfig {
            sensor_size_mm: f64::INFINITY,
            ..PipelineConfig::default()
        });
        let (worker, events) = PipelineWorker::spawn(config.clone()).expect("spawn");

        assert!(worker.offer(stripe_frame(32, 16.0)));
        assert_eq!(
            events.recv_timeout(Duration::from_secs(10)),
            Ok(WorkerEvent::Failed(PipelineError::InvalidGeometry(
                GeometryError::InvalidSensorSize(f64::INFINITY)
            )))
        );

        wait_ready(&worker);
        config.update(|cfg| cfg.sensor_size_mm = 0.5);
        assert!(worker.offer(stripe_frame(32, 16.0)));
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(10)),
            Ok(WorkerEvent::Sample(_))
        ));
    }
}
