//! The render worker: the one thread that drives the native renderer in
//! asynchronous mode.
//!
//! The worker owns the port. The owning thread hands it one [`RenderJob`] at a
//! time and gets a [`JobReport`] back over a channel; it never waits for a
//! frame unless it asks to (`flush`).

use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::canvas::scheduler::RenderJob;
use crate::errors::CanvasError;
use crate::render::port::{ColorModel, NativeRenderPort, RenderBuffer};

/// Callback run on the worker thread after every finished job, so a host can
/// schedule `tick()` on its UI thread.
pub type Wakeup = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
pub(crate) enum WorkerCommand {
    Render { epoch: u64, job: RenderJob },
    Dispose,
    Shutdown,
}

/// Result of one job, produced on the worker thread.
#[derive(Debug)]
pub(crate) struct JobReport {
    pub epoch: u64,
    pub job: RenderJob,
    /// New buffer, if the job had to reallocate.
    pub buffer: Option<RenderBuffer>,
    pub result: Result<usize, CanvasError>,
}

/// Runs one job against `port`: reallocate if the size changed, move, render.
pub(crate) fn execute(
    port: &mut dyn NativeRenderPort,
    epoch: u64,
    mut job: RenderJob,
    num_buffers: u32,
    color_model: ColorModel,
) -> JobReport {
    let mut buffer = None;
    if job.needs_resize() {
        match port.allocate(job.target.width(), job.target.height(), num_buffers, color_model) {
            Ok(b) => buffer = Some(b),
            Err(e) => {
                return JobReport {
                    epoch,
                    job,
                    buffer: None,
                    result: Err(CanvasError::AllocationFailure(e)),
                }
            }
        }
    }

    port.move_to(job.target.x(), job.target.y());
    let result = port.render_frame().map_err(CanvasError::RenderFailure);
    if let Ok(slot) = result {
        job.slot = Some(slot);
    }

    JobReport {
        epoch,
        job,
        buffer,
        result,
    }
}

pub(crate) struct RenderWorker {
    cmd_tx: mpsc::UnboundedSender<WorkerCommand>,
    report_rx: mpsc::UnboundedReceiver<JobReport>,
    wakeup: Arc<RwLock<Option<Wakeup>>>,
    join_handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Moves `port` onto a new thread called `name`.
    pub(crate) fn spawn(
        name: &str,
        mut port: Box<dyn NativeRenderPort + Send>,
        num_buffers: u32,
        color_model: ColorModel,
    ) -> Result<Self, CanvasError> {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<WorkerCommand>();
        let (report_tx, report_rx) = mpsc::unbounded_channel::<JobReport>();
        let wakeup: Arc<RwLock<Option<Wakeup>>> = Arc::new(RwLock::new(None));
        let worker_wakeup = wakeup.clone();

        let join_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                log::debug!("render worker for {} started", port.name());

                while let Some(cmd) = cmd_rx.blocking_recv() {
                    match cmd {
                        WorkerCommand::Render { epoch, job } => {
                            let report = execute(&mut *port, epoch, job, num_buffers, color_model);
                            if report_tx.send(report).is_err() {
                                break;
                            }
                            let wake = worker_wakeup.read().unwrap_or_else(PoisonError::into_inner).clone();
                            if let Some(wake) = wake {
                                wake();
                            }
                        }
                        WorkerCommand::Dispose => port.dispose(),
                        WorkerCommand::Shutdown => break,
                    }
                }

                port.dispose();
                log::debug!("render worker for {} exiting", port.name());
            })
            .map_err(|e| {
                log::error!("cannot spawn render worker {name}: {e}");
                CanvasError::WorkerGone
            })?;

        Ok(Self {
            cmd_tx,
            report_rx,
            wakeup,
            join_handle: Some(join_handle),
        })
    }

    pub(crate) fn set_wakeup(&self, wakeup: Option<Wakeup>) {
        *self.wakeup.write().unwrap_or_else(PoisonError::into_inner) = wakeup;
    }

    pub(crate) fn dispatch(&self, epoch: u64, job: RenderJob) -> Result<(), CanvasError> {
        self.cmd_tx
            .send(WorkerCommand::Render { epoch, job })
            .map_err(|_| CanvasError::WorkerGone)
    }

    pub(crate) fn dispose_port(&self) -> Result<(), CanvasError> {
        self.cmd_tx
            .send(WorkerCommand::Dispose)
            .map_err(|_| CanvasError::WorkerGone)
    }

    /// A finished job, if there is one. Never blocks.
    pub(crate) fn try_report(&mut self) -> Result<Option<JobReport>, CanvasError> {
        match self.report_rx.try_recv() {
            Ok(report) => Ok(Some(report)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(CanvasError::WorkerGone),
        }
    }

    /// Blocks until the job in flight reports. Refuses to block a thread that
    /// drives an async runtime.
    pub(crate) fn wait_report(&mut self) -> Result<JobReport, CanvasError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(CanvasError::BlockingInRuntime { operation: "flush" });
        }
        self.report_rx.blocking_recv().ok_or(CanvasError::WorkerGone)
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                log::error!("render worker panicked");
            }
        }
    }
}
