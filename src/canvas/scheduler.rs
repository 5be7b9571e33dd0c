//! Render scheduling state machine.
//!
//! The scheduler is a pure state machine; it never calls the renderer itself.
//! The canvas asks it what to do and reports back when a job is done:
//!
//! ```text
//! Idle --request--> Scheduled --begin--> Running --finish--> Idle
//!                       ^                   |
//!                       +----finish---------+  (mailbox not empty)
//! ```
//!
//! Requests go into a single-slot mailbox that is overwritten, never queued.
//! However many requests arrive while a job runs, at most one more job follows
//! it, and that job renders the most recent request.

use crate::render::Viewport;

/// State of a [`RenderScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Nothing to do
    #[default]
    Idle,
    /// A job has been dispatched but has not started yet
    Scheduled,
    /// A job is running
    Running,
}

/// What the caller has to do after a request or a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Dispatch a job: call [`RenderScheduler::begin`] and run it.
    Start,
    /// The request was stored; the cycle in progress picks it up.
    Coalesced,
    /// Nothing to do.
    Ignored,
}

/// One scheduling cycle: render `target`, knowing what was rendered before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderJob {
    pub target: Viewport,
    pub previous: Viewport,
    /// Slot the frame ended up in, once rendered.
    pub slot: Option<usize>,
}

impl RenderJob {
    /// The renderer needs a new buffer when the size changes.
    pub fn needs_resize(&self) -> bool {
        !self.target.same_size(&self.previous)
    }
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Rendered { slot: usize },
    /// The buffer for the target size exists, but the frame failed.
    RenderFailed,
    /// No buffer for the target size could be allocated.
    AllocationFailed,
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    state: SchedulerState,
    mailbox: Option<Viewport>,
    /// Last viewport handed to the renderer with a matching buffer.
    previous: Viewport,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    /// Latest request that has not started rendering yet.
    pub fn pending(&self) -> Option<Viewport> {
        self.mailbox
    }

    /// Viewport of the last job that got a buffer of its size.
    pub fn previous(&self) -> Viewport {
        self.previous
    }

    /// Records a render request. Empty viewports are ignored.
    pub fn request(&mut self, viewport: Viewport) -> Dispatch {
        if viewport.is_empty() {
            return Dispatch::Ignored;
        }

        self.mailbox = Some(viewport);
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::Scheduled;
                Dispatch::Start
            }
            SchedulerState::Scheduled | SchedulerState::Running => Dispatch::Coalesced,
        }
    }

    /// Starts the scheduled job: drains the mailbox into a [`RenderJob`].
    ///
    /// Returns `None` unless the scheduler is `Scheduled` with a pending request.
    pub fn begin(&mut self) -> Option<RenderJob> {
        if self.state != SchedulerState::Scheduled {
            return None;
        }
        let Some(target) = self.mailbox.take() else {
            self.state = SchedulerState::Idle;
            return None;
        };

        self.state = SchedulerState::Running;
        Some(RenderJob {
            target,
            previous: self.previous,
            slot: None,
        })
    }

    /// Ends the running job. Returns [`Dispatch::Start`] if a request arrived
    /// meanwhile and the next job has to be dispatched.
    pub fn finish(&mut self, job: &RenderJob, outcome: JobOutcome) -> Dispatch {
        if self.state != SchedulerState::Running {
            log::warn!("finish({outcome:?}) while {:?}", self.state);
            return Dispatch::Ignored;
        }

        match outcome {
            JobOutcome::Rendered { .. } | JobOutcome::RenderFailed => self.previous = job.target,
            JobOutcome::AllocationFailed => {}
        }

        if self.mailbox.is_some() {
            self.state = SchedulerState::Scheduled;
            Dispatch::Start
        } else {
            self.state = SchedulerState::Idle;
            Dispatch::Ignored
        }
    }

    /// Forgets pending work and history, back to a fresh `Idle`.
    pub fn reset(&mut self) {
        self.state = SchedulerState::Idle;
        self.mailbox = None;
        self.previous = Viewport::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(x: i32, w: u32) -> Viewport {
        Viewport::new(x, 0, w, 64).unwrap()
    }

    #[test]
    fn empty_viewport_is_ignored() {
        let mut s = RenderScheduler::new();
        assert_eq!(s.request(Viewport::EMPTY), Dispatch::Ignored);
        assert!(s.is_idle());
        assert_eq!(s.pending(), None);
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut s = RenderScheduler::new();
        assert_eq!(s.request(vp(0, 64)), Dispatch::Start);
        assert_eq!(s.state(), SchedulerState::Scheduled);

        let job = s.begin().unwrap();
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(job.target, vp(0, 64));
        assert_eq!(job.previous, Viewport::EMPTY);
        assert!(job.needs_resize());

        assert_eq!(s.finish(&job, JobOutcome::Rendered { slot: 0 }), Dispatch::Ignored);
        assert!(s.is_idle());
        assert_eq!(s.previous(), vp(0, 64));
    }

    #[test]
    fn requests_while_running_coalesce_to_the_latest() {
        let mut s = RenderScheduler::new();
        s.request(vp(0, 64));
        let first = s.begin().unwrap();

        for x in 1..=10 {
            assert_eq!(s.request(vp(x, 64)), Dispatch::Coalesced);
        }
        assert_eq!(s.finish(&first, JobOutcome::Rendered { slot: 0 }), Dispatch::Start);
        assert_eq!(s.state(), SchedulerState::Scheduled);

        let second = s.begin().unwrap();
        assert_eq!(second.target, vp(10, 64));
        assert_eq!(second.previous, vp(0, 64));
        assert!(!second.needs_resize());
        assert_eq!(s.finish(&second, JobOutcome::Rendered { slot: 1 }), Dispatch::Ignored);
        assert!(s.is_idle());
    }

    #[test]
    fn requests_while_scheduled_overwrite_the_mailbox() {
        let mut s = RenderScheduler::new();
        s.request(vp(1, 64));
        assert_eq!(s.request(vp(2, 64)), Dispatch::Coalesced);
        assert_eq!(s.begin().unwrap().target, vp(2, 64));
    }

    #[test]
    fn render_failure_returns_to_idle_without_retry() {
        let mut s = RenderScheduler::new();
        s.request(vp(0, 64));
        let job = s.begin().unwrap();
        assert_eq!(s.finish(&job, JobOutcome::RenderFailed), Dispatch::Ignored);
        assert!(s.is_idle());
        assert_eq!(s.pending(), None);
        assert_eq!(s.previous(), vp(0, 64));
    }

    #[test]
    fn allocation_failure_keeps_previous_size() {
        let mut s = RenderScheduler::new();
        s.request(vp(0, 64));
        let job = s.begin().unwrap();
        s.finish(&job, JobOutcome::Rendered { slot: 0 });

        s.request(vp(0, 128));
        let job = s.begin().unwrap();
        s.finish(&job, JobOutcome::AllocationFailed);
        assert_eq!(s.previous(), vp(0, 64));

        s.request(vp(0, 128));
        assert!(s.begin().unwrap().needs_resize());
    }

    #[test]
    fn begin_and_finish_out_of_order_are_ignored() {
        let mut s = RenderScheduler::new();
        assert!(s.begin().is_none());
        let job = RenderJob { target: vp(0, 64), previous: Viewport::EMPTY, slot: None };
        assert_eq!(s.finish(&job, JobOutcome::Rendered { slot: 0 }), Dispatch::Ignored);
        assert!(s.is_idle());
    }
}
