//! Native rendering canvas.
//!
//! A [`NativeCanvas`] lets a native renderer paint straight into memory that is
//! shared with a display surface, while the user pans and resizes the view.
//! It wires the pieces of the pipeline together:
//!
//! input -> [`InputCoalescer`] -> viewport -> [`RenderScheduler`] ->
//! [`NativeRenderPort`] -> [`BufferPublisher`] -> [`DisplaySurface`]
//!
//! The thread creating the canvas is its owning thread; all methods must be
//! called there. In synchronous mode every request renders inline. In
//! asynchronous mode the port lives on a single worker thread, requests return
//! immediately, and finished frames are committed by [`NativeCanvas::tick`].
//!
//! # Example
//!
//! ```
//! use native_canvas::canvas::NativeCanvas;
//! use native_canvas::config::CanvasConfig;
//! use native_canvas::event::InputEvent;
//! use native_canvas::render::backends::null::NullPort;
//! use native_canvas::render::MemorySurface;
//!
//! # fn main() -> Result<(), native_canvas::errors::CanvasError> {
//! let mut canvas = NativeCanvas::new(CanvasConfig::default(), Box::new(NullPort::new()), MemorySurface::new())?;
//! canvas.resize(300, 200)?;
//! canvas.handle_input(&InputEvent::press(10.0, 10.0))?;
//! canvas.handle_input(&InputEvent::drag(0.0, 0.0))?;
//!
//! let frame = canvas.committed().unwrap();
//! assert_eq!((frame.viewport.x(), frame.viewport.y()), (10, 10));
//! assert_eq!(frame.window.width, 300);
//! # Ok(()) }
//! ```

pub mod input;
pub mod scheduler;
pub mod worker;

use uuid::Uuid;

use crate::config::CanvasConfig;
use crate::errors::CanvasError;
use crate::event::InputEvent;
use crate::render::port::NativeRenderPort;
use crate::render::publisher::{BufferPublisher, CommittedFrame, OwningThread};
use crate::render::surface::DisplaySurface;
use crate::render::Viewport;

use input::{InputCoalescer, ScrollClassifier};
use scheduler::{Dispatch, JobOutcome, RenderScheduler, SchedulerState};
use worker::{JobReport, RenderWorker, Wakeup};

/// A unique identifier for a canvas, used to tell canvases apart in logs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CanvasId(Uuid);

impl CanvasId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CanvasId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CanvasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum Driver {
    /// The port is called on the owning thread.
    Inline(Box<dyn NativeRenderPort + Send>),
    /// The port lives on the worker thread.
    Worker(RenderWorker),
}

pub struct NativeCanvas<S: DisplaySurface> {
    id: CanvasId,
    config: CanvasConfig,
    owner: OwningThread,
    driver: Driver,
    publisher: BufferPublisher<S>,
    scheduler: RenderScheduler,
    input: InputCoalescer,
    /// Latest requested viewport. Its size is a multiple of the view increment,
    /// so it is usually larger than the pane.
    viewport: Viewport,
    /// Size of the visible pane, once known.
    pane: Option<(u32, u32)>,
    /// Bumped on dispose so reports of earlier jobs are dropped.
    epoch: u64,
    disposed: bool,
    faulted: bool,
}

impl<S: DisplaySurface> NativeCanvas<S> {
    /// Creates a canvas rendering through `port` onto `surface`. The calling
    /// thread becomes the owning thread.
    pub fn new(
        config: CanvasConfig,
        port: Box<dyn NativeRenderPort + Send>,
        surface: S,
    ) -> Result<Self, CanvasError> {
        config.validate()?;

        let id = CanvasId::new();
        let driver = if config.asynchronous {
            Driver::Worker(RenderWorker::spawn(
                &config.worker_name,
                port,
                config.num_buffers,
                config.color_model,
            )?)
        } else {
            Driver::Inline(port)
        };
        log::debug!(
            "canvas {id} created ({} buffer(s), increment {}, {})",
            config.num_buffers,
            config.view_increment,
            if config.asynchronous { "asynchronous" } else { "synchronous" }
        );

        Ok(Self {
            id,
            publisher: BufferPublisher::new(surface, config.num_buffers, config.color_model),
            config,
            owner: OwningThread::current(),
            driver,
            scheduler: RenderScheduler::new(),
            input: InputCoalescer::default(),
            viewport: Viewport::EMPTY,
            pane: None,
            epoch: 0,
            disposed: false,
            faulted: false,
        })
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Latest requested viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// The frame currently shown on the surface.
    pub fn committed(&self) -> Option<&CommittedFrame> {
        self.publisher.committed()
    }

    pub fn surface(&self) -> &S {
        self.publisher.surface()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Replaces the policy that tells wheel scrolling from touch scrolling.
    pub fn set_scroll_classifier(&mut self, classifier: Box<dyn ScrollClassifier>) {
        self.input.set_classifier(classifier);
    }

    /// Registers a callback the worker runs after each finished job. Hosts use
    /// it to schedule [`tick`](Self::tick) on their UI thread. Has no effect in
    /// synchronous mode.
    pub fn set_wakeup(&mut self, wakeup: impl Fn() + Send + Sync + 'static) {
        if let Driver::Worker(worker) = &self.driver {
            let wakeup: Wakeup = std::sync::Arc::new(wakeup);
            worker.set_wakeup(Some(wakeup));
        }
    }

    /// The visible pane changed size. Requests a viewport at the same origin,
    /// rounded up to the view increment.
    pub fn resize(&mut self, pane_width: u32, pane_height: u32) -> Result<(), CanvasError> {
        self.owner.check("resize")?;
        self.ensure_usable()?;

        self.pane = Some((pane_width, pane_height));
        let viewport = self
            .viewport
            .quantized_resize(pane_width, pane_height, self.config.view_increment);
        self.request_render(viewport)
    }

    /// Feeds one input event through the coalescer and requests the resulting
    /// viewport, if any.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<(), CanvasError> {
        self.owner.check("handle_input")?;
        self.ensure_usable()?;

        match self.input.handle(event, self.viewport) {
            Some(viewport) => self.request_render(viewport),
            None => Ok(()),
        }
    }

    /// Asks for `viewport` to be rendered and shown. Empty viewports are ignored.
    ///
    /// Synchronously this renders and commits before returning. Asynchronously
    /// it only records the request; while a job is in flight, only the latest
    /// request survives.
    pub fn request_render(&mut self, viewport: Viewport) -> Result<(), CanvasError> {
        self.owner.check("request_render")?;
        self.ensure_usable()?;

        if viewport.is_empty() {
            return Ok(());
        }
        let dispatch = self.scheduler.request(viewport);
        self.viewport = viewport;

        match dispatch {
            Dispatch::Start => self.dispatch_next(),
            Dispatch::Coalesced => {
                log::trace!("canvas {}: coalesced {viewport:?}", self.id);
                Ok(())
            }
            Dispatch::Ignored => Ok(()),
        }
    }

    /// Commits a finished asynchronous job, if any, and dispatches the next one.
    /// Never blocks. Returns the newly committed frame.
    pub fn tick(&mut self) -> Result<Option<CommittedFrame>, CanvasError> {
        self.owner.check("tick")?;

        let report = match &mut self.driver {
            Driver::Worker(worker) => worker.try_report()?,
            Driver::Inline(_) => None,
        };
        match report {
            Some(report) => self.complete(report),
            None => Ok(None),
        }
    }

    /// Blocks until no job is scheduled or running, committing every frame on
    /// the way. Stops at the first failure.
    ///
    /// Inside an async runtime this returns [`CanvasError::BlockingInRuntime`]
    /// while a job is in flight; such hosts poll [`tick`](Self::tick) instead.
    pub fn flush(&mut self) -> Result<(), CanvasError> {
        self.owner.check("flush")?;

        while !self.scheduler.is_idle() {
            let report = match &mut self.driver {
                Driver::Worker(worker) => worker.wait_report()?,
                Driver::Inline(_) => return Ok(()),
            };
            self.complete(report)?;
        }
        Ok(())
    }

    /// Releases the surface binding and the renderer's resources and stops
    /// reacting to input. [`init`](Self::init) makes the canvas usable again.
    pub fn dispose(&mut self) -> Result<(), CanvasError> {
        self.owner.check("dispose")?;

        self.viewport = Viewport::EMPTY;
        self.input.reset();
        self.scheduler.reset();
        self.epoch += 1;
        self.publisher.release()?;

        match &mut self.driver {
            Driver::Inline(port) => port.dispose(),
            Driver::Worker(worker) => worker.dispose_port()?,
        }
        self.disposed = true;
        log::debug!("canvas {} disposed", self.id);
        Ok(())
    }

    /// Makes a disposed or faulted canvas usable again.
    pub fn init(&mut self) -> Result<(), CanvasError> {
        self.owner.check("init")?;

        if self.faulted && !self.disposed {
            self.dispose()?;
        }
        self.disposed = false;
        self.faulted = false;
        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), CanvasError> {
        if self.disposed {
            return Err(CanvasError::Disposed);
        }
        if self.faulted {
            return Err(CanvasError::Faulted);
        }
        Ok(())
    }

    fn visible_size(&self, viewport: &Viewport) -> (u32, u32) {
        self.pane.unwrap_or((viewport.width(), viewport.height()))
    }

    fn dispatch_next(&mut self) -> Result<(), CanvasError> {
        if matches!(self.driver, Driver::Inline(_)) {
            return self.run_inline();
        }

        let Some(job) = self.scheduler.begin() else {
            return Ok(());
        };
        log::trace!("canvas {}: dispatching {:?}", self.id, job.target);
        let result = match &self.driver {
            Driver::Worker(worker) => worker.dispatch(self.epoch, job),
            Driver::Inline(_) => Ok(()),
        };
        if result.is_err() {
            self.scheduler.reset();
        }
        result
    }

    /// Synchronous mode: one full cycle on the owning thread.
    fn run_inline(&mut self) -> Result<(), CanvasError> {
        let (visible_width, visible_height) = match self.scheduler.pending() {
            Some(target) => self.visible_size(&target),
            None => return Ok(()),
        };
        let Self {
            driver: Driver::Inline(port),
            publisher,
            scheduler,
            ..
        } = self
        else {
            return Ok(());
        };
        let Some(mut job) = scheduler.begin() else {
            return Ok(());
        };

        let allocation = if job.needs_resize() {
            publisher.ensure_capacity(&mut **port, &job.target).map(|_| ())
        } else {
            Ok(())
        };

        let (outcome, result) = match allocation {
            Err(e) => (JobOutcome::AllocationFailed, Err(e)),
            Ok(()) => {
                port.move_to(job.target.x(), job.target.y());
                match port.render_frame() {
                    Ok(slot) => {
                        job.slot = Some(slot);
                        let committed = publisher
                            .commit(slot, &job.target, visible_width, visible_height)
                            .map(|_| ());
                        (JobOutcome::Rendered { slot }, committed)
                    }
                    Err(e) => (JobOutcome::RenderFailed, Err(CanvasError::RenderFailure(e))),
                }
            }
        };

        scheduler.finish(&job, outcome);
        self.settle(&job, outcome, result)
    }

    /// Applies a report from the worker on the owning thread.
    fn complete(&mut self, report: JobReport) -> Result<Option<CommittedFrame>, CanvasError> {
        if report.epoch != self.epoch {
            log::debug!("canvas {}: dropping report of a disposed generation", self.id);
            return Ok(None);
        }

        let JobReport { job, buffer, result, .. } = report;
        if let Some(buffer) = buffer {
            self.publisher.rebind(buffer)?;
        }

        let (outcome, result) = match result {
            Ok(slot) => {
                let (visible_width, visible_height) = self.visible_size(&job.target);
                let committed = self
                    .publisher
                    .commit(slot, &job.target, visible_width, visible_height);
                (JobOutcome::Rendered { slot }, committed.map(Some))
            }
            Err(e @ CanvasError::AllocationFailure(_)) => (JobOutcome::AllocationFailed, Err(e)),
            Err(e) => (JobOutcome::RenderFailed, Err(e)),
        };

        let next = self.scheduler.finish(&job, outcome);
        let result = self.settle(&job, outcome, result);
        if next == Dispatch::Start && !self.faulted {
            self.dispatch_next()?;
        }
        result
    }

    /// Common bookkeeping after a job: logging and faulting.
    fn settle<T>(
        &mut self,
        job: &scheduler::RenderJob,
        outcome: JobOutcome,
        result: Result<T, CanvasError>,
    ) -> Result<T, CanvasError> {
        match (&outcome, &result) {
            (JobOutcome::AllocationFailed, Err(e)) => {
                log::error!("canvas {}: {e}; canvas is faulted", self.id);
                self.faulted = true;
                self.scheduler.reset();
            }
            (_, Err(e)) => log::warn!("canvas {}: rendering {:?} failed: {e}", self.id, job.target),
            (JobOutcome::Rendered { slot }, Ok(_)) => {
                log::trace!("canvas {}: committed {:?} from slot {slot}", self.id, job.target)
            }
            _ => {}
        }
        result
    }
}
