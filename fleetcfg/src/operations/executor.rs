//! Plan execution engine.
//!
//! Targets run on a scoped pool of worker threads pulling batches from a
//! shared index. Targets writing the same artifact form one batch and run in
//! plan order on a single worker, so the last of them wins. Each target
//! resolves its triple through the session (sharing caches with every other
//! worker) and hands the result to the diff serializer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use chrono::Utc;

use crate::error::Result;
use crate::model::ConfigType;
use crate::output::ChangeReport;
use crate::session::Session;

use super::plan::{BuildPlan, BuildTarget};
use super::report::{ArtifactOutcome, BuildFailure, BuildReport};

/// Cooperative cancellation handle.
///
/// Cancelling stops workers from starting new targets; targets already
/// running finish normally, so no artifact is left half-written.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// Creates an untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes build plans.
///
/// # Examples
///
/// ```no_run
/// use fleetcfg::operations::{BuildExecutor, BuildPlan, BuildRequest};
/// use fleetcfg::session::{Session, SessionOptions};
///
/// let session = Session::new(SessionOptions::new("configs", "build")).unwrap();
/// let plan = BuildPlan::for_request(&session, &BuildRequest::new(vec!["prod".into()])).unwrap();
///
/// let report = BuildExecutor::new(&session).with_threads(4).execute(&plan);
/// println!("{}", report.summary());
/// ```
pub struct BuildExecutor<'a> {
    session: &'a Session,
    threads: usize,
    fail_fast: bool,
    cancellation: Cancellation,
}

enum Outcome {
    Done(ChangeReport),
    Failed(BuildFailure),
}

impl<'a> BuildExecutor<'a> {
    /// Creates an executor using one worker per available CPU.
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        let threads = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            session,
            threads,
            fail_fast: false,
            cancellation: Cancellation::new(),
        }
    }

    /// Sets the worker count (at least one).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Stops scheduling new targets after the first failure.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Uses an externally controlled cancellation handle.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// The cancellation handle of this executor.
    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Runs every target of the plan.
    ///
    /// Failures are recorded per target; they never abort other targets
    /// unless fail-fast is enabled.
    #[must_use]
    pub fn execute(&self, plan: &BuildPlan) -> BuildReport {
        let started_at = Utc::now();
        let next = AtomicUsize::new(0);
        let outcomes: Mutex<Vec<Option<Outcome>>> =
            Mutex::new((0..plan.targets.len()).map(|_| None).collect());

        let batches = self.batches(plan);
        let workers = self.threads.min(batches.len()).max(1);
        log::debug!(
            "executing {} targets in {} batches on {workers} workers",
            plan.len(),
            batches.len()
        );

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let Some(batch) = batches.get(next.fetch_add(1, Ordering::SeqCst)) else {
                        break;
                    };
                    for &index in batch {
                        if self.cancellation.is_cancelled() {
                            return;
                        }
                        let target = &plan.targets[index];
                        let outcome = match self.run(target) {
                            Ok(changes) => Outcome::Done(changes),
                            Err(e) => {
                                log::warn!("{target}: {e}");
                                if self.fail_fast {
                                    self.cancellation.cancel();
                                }
                                Outcome::Failed(BuildFailure::new(target.clone(), &e))
                            }
                        };
                        outcomes.lock().unwrap_or_else(PoisonError::into_inner)[index] =
                            Some(outcome);
                    }
                });
            }
        });

        let mut report = BuildReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.session.options().dry_run,
            cancelled: false,
            artifacts: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            warnings: plan.warnings.clone(),
        };
        let outcomes = outcomes.into_inner().unwrap_or_else(PoisonError::into_inner);
        for (target, outcome) in plan.targets.iter().zip(outcomes) {
            match outcome {
                Some(Outcome::Done(changes)) => report.artifacts.push(ArtifactOutcome {
                    target: target.clone(),
                    changes,
                }),
                Some(Outcome::Failed(failure)) => report.failures.push(failure),
                None => report.skipped.push(target.clone()),
            }
        }
        report.cancelled = !report.skipped.is_empty();
        report
    }

    /// Groups target indices by artifact path, keeping plan order inside and
    /// across groups. Targets with an unknown config type stay alone and
    /// fail when run.
    fn batches(&self, plan: &BuildPlan) -> Vec<Vec<usize>> {
        let mut batches: Vec<Vec<usize>> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();
        for (index, target) in plan.targets.iter().enumerate() {
            let Ok(config_type) = self.session.config_type(&target.config_type) else {
                batches.push(vec![index]);
                continue;
            };
            let path = self.session.layout().artifact_path(&target.component, config_type);
            match by_path.get(&path) {
                Some(&batch) => batches[batch].push(index),
                None => {
                    by_path.insert(path, batches.len());
                    batches.push(vec![index]);
                }
            }
        }
        batches
    }

    fn run(&self, target: &BuildTarget) -> Result<ChangeReport> {
        let config_type: &ConfigType = self.session.config_type(&target.config_type)?;
        self.session
            .generate(&target.component, config_type, &target.environment)
    }
}
