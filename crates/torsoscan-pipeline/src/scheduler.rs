//! Cooperative FIFO executor for pipeline tasks.
//!
//! The host owns the loop: it calls [`Scheduler::tick`] whenever it can
//! spare one bounded unit of geometric work (a timer, an event-loop turn
//! or a test harness). Each tick steps the current task exactly once.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Deferred task constructor.
pub type TaskFactory = Box<dyn FnOnce(&mut PipelineContext) -> Result<Box<dyn Task>>>;

type FinishedCallback = Box<dyn FnMut(&mut PipelineContext)>;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is running.
    Idle,
    /// A task is in flight; call again.
    Pending,
    /// The last queued task completed during this tick.
    Finished,
}

struct Running {
    task: Box<dyn Task>,
    steps: u64,
}

/// Runs queued tasks strictly in order, one step per tick.
pub struct Scheduler {
    ctx: PipelineContext,
    queue: VecDeque<TaskFactory>,
    current: Option<Running>,
    started: bool,
    on_finished: Option<FinishedCallback>,
}

impl Scheduler {
    /// Scheduler owning `ctx`.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            queue: VecDeque::new(),
            current: None,
            started: false,
            on_finished: None,
        }
    }

    /// Append a task constructor to the queue.
    pub fn enqueue<F, T>(&mut self, factory: F)
    where
        F: FnOnce(&mut PipelineContext) -> Result<T> + 'static,
        T: Task + 'static,
    {
        self.queue
            .push_back(Box::new(move |ctx| Ok(Box::new(factory(ctx)?) as Box<dyn Task>)));
    }

    /// Called with the context once the queue has drained.
    pub fn set_on_finished(&mut self, callback: impl FnMut(&mut PipelineContext) + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    /// Whether a run is in progress.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of tasks waiting behind the current one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Name of the task in flight.
    pub fn current_task(&self) -> Option<&'static str> {
        self.current.as_ref().map(|r| r.task.name())
    }

    /// Construct the first queued task. Does nothing when already started.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.launch_next()?;
        Ok(())
    }

    fn launch_next(&mut self) -> Result<Tick> {
        let Some(factory) = self.queue.pop_front() else {
            self.started = false;
            debug!("task queue drained");
            if let Some(callback) = self.on_finished.as_mut() {
                callback(&mut self.ctx);
            }
            return Ok(Tick::Finished);
        };
        match factory(&mut self.ctx) {
            Ok(task) => {
                debug!(task = task.name(), "task started");
                self.current = Some(Running { task, steps: 0 });
                Ok(Tick::Pending)
            }
            Err(err) => {
                warn!(error = %err, "task construction failed, aborting pipeline");
                self.queue.clear();
                self.started = false;
                Err(err)
            }
        }
    }

    /// Step the current task once.
    ///
    /// When it reports done, the next task is constructed in the same tick
    /// but not stepped. Errors abort the run and clear the queue.
    pub fn tick(&mut self) -> Result<Tick> {
        let Some(running) = self.current.as_mut() else {
            return Ok(Tick::Idle);
        };
        running.steps += 1;
        match running.task.step_once(&mut self.ctx) {
            Ok(StepOutcome::Continue) => Ok(Tick::Pending),
            Ok(StepOutcome::Done) => {
                if let Some(done) = self.current.take() {
                    info!(task = done.task.name(), steps = done.steps, "task done");
                }
                self.launch_next()
            }
            Err(err) => {
                if let Some(mut failed) = self.current.take() {
                    warn!(task = failed.task.name(), error = %err, "task failed");
                    failed.task.release();
                }
                self.queue.clear();
                self.started = false;
                Err(err)
            }
        }
    }

    /// Drop the queue and the in-flight task, releasing its scratch state.
    pub fn reset(&mut self) {
        if let Some(mut running) = self.current.take() {
            debug!(task = running.task.name(), "discarding in-flight task");
            running.task.release();
        }
        self.queue.clear();
        self.started = false;
    }

    /// Start if needed and tick until the queue drains. Returns the number
    /// of steps taken.
    pub fn run_until_idle(&mut self) -> Result<u64> {
        self.start()?;
        let mut steps = 0;
        while self.current.is_some() {
            steps += 1;
            if self.tick()? == Tick::Finished {
                break;
            }
        }
        Ok(steps)
    }

    /// The pipeline context.
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// The pipeline context, for seeding entries or swapping the object.
    pub fn context_mut(&mut self) -> &mut PipelineContext {
        &mut self.ctx
    }

    /// Give the context back.
    pub fn into_context(self) -> PipelineContext {
        self.ctx
    }
}
