//! Background task runner for the network-bound phases.
//!
//! Workers run on the tokio runtime and never touch session state. Each job
//! sends exactly one `TaskEvent` back to the owner over an unbounded channel;
//! the owner applies it (`Session::deliver`). There is no cancellation: a
//! started worker runs to completion and the owner discards stale results by
//! generation id.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::LlmError;
use crate::llm::LlmProvider;
use crate::profile::{LearningProfile, Profiler, Rewriter};
use crate::survey::content::RewriteSource;
use crate::survey::page::{Choice, PairContent};

/// Which network phase a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Profile,
    Rewrite,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Rewrite => write!(f, "rewrite"),
        }
    }
}

/// Result posted back to the owner.
#[derive(Debug)]
pub enum TaskEvent {
    ProfileReady {
        generation: u64,
        profile: LearningProfile,
        /// Time spent on both profile calls.
        elapsed: Duration,
    },
    RewritesReady {
        generation: u64,
        rewrites: Vec<Rewritten>,
    },
    Failed {
        generation: u64,
        phase: Phase,
        error: LlmError,
    },
}

impl TaskEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::ProfileReady { generation, .. }
            | Self::RewritesReady { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// One generated page and how long its rewrite took.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub interaction: usize,
    pub content: PairContent,
    pub elapsed: Duration,
}

/// Inputs for a profile job, owned by the worker.
#[derive(Debug, Clone)]
pub struct ProfileJob {
    pub generation: u64,
    pub selections: Vec<Choice>,
    pub opposite_selections: Vec<Choice>,
    pub pair_context: Vec<String>,
}

/// Inputs for a rewrite job: the driving profile and the sources to rewrite,
/// keyed by interaction number.
#[derive(Debug, Clone)]
pub struct RewriteJob {
    pub generation: u64,
    pub profile: String,
    pub sources: Vec<(usize, RewriteSource)>,
}

pub struct TaskRunner {
    llm: Arc<dyn LlmProvider>,
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl TaskRunner {
    /// Create a runner and the receiver its results are delivered to.
    pub fn new(llm: Arc<dyn LlmProvider>) -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { llm, tx }, rx)
    }

    pub fn spawn_profile(&self, job: ProfileJob) {
        let profiler = Profiler::new(Arc::clone(&self.llm));
        let tx = self.tx.clone();
        info!(generation = job.generation, "Spawning profile task");

        tokio::spawn(async move {
            let started = Instant::now();
            let event = match profiler
                .generate_profile(&job.selections, &job.opposite_selections, &job.pair_context)
                .await
            {
                Ok(profile) => TaskEvent::ProfileReady {
                    generation: job.generation,
                    profile,
                    elapsed: started.elapsed(),
                },
                Err(e) => {
                    error!(generation = job.generation, error = %e, "Profile generation failed");
                    TaskEvent::Failed {
                        generation: job.generation,
                        phase: Phase::Profile,
                        error: e,
                    }
                }
            };
            deliver(&tx, event);
        });
    }

    /// Rewrites run one after another, in interaction order.
    pub fn spawn_rewrites(&self, job: RewriteJob) {
        let rewriter = Rewriter::new(Arc::clone(&self.llm));
        let tx = self.tx.clone();
        info!(
            generation = job.generation,
            count = job.sources.len(),
            "Spawning rewrite task"
        );

        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut rewrites = Vec::with_capacity(job.sources.len());
            for (interaction, source) in &job.sources {
                let started = Instant::now();
                match rewriter.rewrite_pair(&job.profile, source, &mut rng).await {
                    Ok(content) => rewrites.push(Rewritten {
                        interaction: *interaction,
                        content,
                        elapsed: started.elapsed(),
                    }),
                    Err(e) => {
                        error!(
                            generation = job.generation,
                            interaction = *interaction,
                            error = %e,
                            "Rewrite failed"
                        );
                        deliver(
                            &tx,
                            TaskEvent::Failed {
                                generation: job.generation,
                                phase: Phase::Rewrite,
                                error: e,
                            },
                        );
                        return;
                    }
                }
            }
            deliver(
                &tx,
                TaskEvent::RewritesReady {
                    generation: job.generation,
                    rewrites,
                },
            );
        });
    }
}

fn deliver(tx: &mpsc::UnboundedSender<TaskEvent>, event: TaskEvent) {
    let generation = event.generation();
    if tx.send(event).is_err() {
        debug!(generation, "Owner gone, dropping task result");
    }
}
