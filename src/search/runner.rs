//! Hyper-heuristic search loop.

use super::config::SearchConfig;
use super::types::{HeuristicKind, HyperProblem};
use crate::acceptance::{AcceptanceCriterion, AcceptanceState, AcceptanceVariant};
use crate::class::{Classifier, HeuristicClassTag, MoveOutcome};
use crate::error::{HyperError, SearchError};
use crate::profile::HeuristicProfile;
use crate::selection::{HeuristicId, HeuristicSelector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a [`SearchLoop`].
///
/// ```text
/// Initialized --start()--> Running --stop condition--> Converged
///                             |                           |
///                             +-----stop() / cancel-------+--> Terminated
/// ```
///
/// `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Initialized,
    Running,
    Converged,
    Terminated,
}

/// Why a run converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_iterations` iterations completed.
    IterationBudget,
    /// The best quality reached `quality_target`.
    QualityTarget,
    /// `time_limit` elapsed since `start()`.
    TimeLimit,
    /// No improvement of the best quality for `no_improvement_limit` iterations.
    Stagnation,
}

/// Summary of one iteration, returned by [`SearchLoop::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Heuristic that was applied.
    pub heuristic: HeuristicId,
    /// Class of the resulting move.
    pub tag: HeuristicClassTag,
    /// Whether the candidate replaced the current solution.
    pub accepted: bool,
    /// Quality of the candidate.
    pub candidate_quality: f64,
    /// Loop state after the iteration.
    pub state: SearchState,
}

/// Result of a hyper-heuristic search run.
#[derive(Debug, Clone)]
pub struct SearchResult<S: Clone> {
    /// The best solution found.
    pub best: S,

    /// Quality of the best solution.
    pub best_quality: f64,

    /// The current solution when the run ended.
    pub current: S,

    /// Quality of the current solution.
    pub current_quality: f64,

    /// Completed iterations.
    pub iterations: usize,

    /// Number of accepted candidates.
    pub accepted_moves: usize,

    /// Number of accepted `OnlyImproving` candidates.
    pub improving_moves: usize,

    /// Final acceptance temperature.
    pub final_temperature: f64,

    /// Why the run converged, if it did.
    pub stop_reason: Option<StopReason>,

    /// Loop state when the result was taken.
    pub state: SearchState,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// Final per-heuristic profiles.
    pub profiles: BTreeMap<HeuristicId, HeuristicProfile>,

    /// Category of each heuristic, as reported by the problem.
    pub heuristic_kinds: BTreeMap<HeuristicId, HeuristicKind>,

    /// Best quality sampled at regular intervals.
    pub quality_history: Vec<f64>,
}

/// Drives selection, heuristic application, classification, acceptance,
/// and profile updates for one search instance.
///
/// Single-threaded: an iteration completes before the next begins.
/// Independent instances may run on separate threads.
///
/// # Examples
///
/// ```ignore
/// let config = SearchConfig::default().with_max_iterations(1000).with_seed(42);
/// let mut search = SearchLoop::new(&problem, config)?;
/// search.start(initial)?;
/// let result = search.run()?;
/// ```
pub struct SearchLoop<P: HyperProblem, A = AcceptanceVariant> {
    problem: P,
    config: SearchConfig,
    classifier: Classifier,
    criterion: A,
    selector: HeuristicSelector,
    acceptance: AcceptanceState,
    rng: StdRng,
    state: SearchState,
    current: Option<P::Solution>,
    current_quality: f64,
    best: Option<P::Solution>,
    best_quality: f64,
    iterations: usize,
    accepted_moves: usize,
    improving_moves: usize,
    since_improvement: usize,
    stop_reason: Option<StopReason>,
    cancel: Option<Arc<AtomicBool>>,
    cancelled: bool,
    started_at: Option<Instant>,
    quality_history: Vec<f64>,
}

impl<P: HyperProblem> SearchLoop<P, AcceptanceVariant> {
    /// Creates a search loop using the configured acceptance variant.
    pub fn new(problem: P, config: SearchConfig) -> Result<Self, HyperError> {
        let criterion = config.acceptance;
        Self::with_criterion(problem, config, criterion)
    }

    /// Creates, starts, and runs a search to completion.
    pub fn solve(
        problem: P,
        initial: P::Solution,
        config: SearchConfig,
    ) -> Result<SearchResult<P::Solution>, SearchError<P::Error>> {
        let mut search = Self::new(problem, config)?;
        search.start(initial)?;
        search.run()
    }
}

impl<P: HyperProblem, A: AcceptanceCriterion> SearchLoop<P, A> {
    /// Creates a search loop with a caller-supplied acceptance criterion.
    ///
    /// Fails with `InvalidConfiguration` when the configuration is invalid
    /// or the problem registers no heuristics.
    pub fn with_criterion(problem: P, config: SearchConfig, criterion: A) -> Result<Self, HyperError> {
        config.validate()?;
        let count = problem.heuristic_count();
        if count == 0 {
            return Err(HyperError::InvalidConfiguration(
                "heuristic registry is empty".into(),
            ));
        }

        let classifier = config.classifier()?;
        let selector = HeuristicSelector::with_heuristics(config.selection, config.profile, count);
        let acceptance = AcceptanceState::new(
            config.initial_temperature,
            config.min_temperature,
            config.cooling,
            config.max_iterations,
        );
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));

        Ok(Self {
            problem,
            config,
            classifier,
            criterion,
            selector,
            acceptance,
            rng,
            state: SearchState::Initialized,
            current: None,
            current_quality: f64::INFINITY,
            best: None,
            best_quality: f64::INFINITY,
            iterations: 0,
            accepted_moves: 0,
            improving_moves: 0,
            since_improvement: 0,
            stop_reason: None,
            cancel: None,
            cancelled: false,
            started_at: None,
            quality_history: Vec::new(),
        })
    }

    /// Attaches a cancellation token, polled at every iteration boundary.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Evaluates the initial solution and moves to `Running`.
    ///
    /// Moves straight on to `Converged` if a stop condition already holds
    /// (for example `max_iterations == 0`).
    pub fn start(&mut self, initial: P::Solution) -> Result<(), SearchError<P::Error>> {
        if self.state != SearchState::Initialized {
            return Err(HyperError::InvalidState(format!(
                "start() requires Initialized state, found {:?}",
                self.state
            ))
            .into());
        }

        self.started_at = Some(Instant::now());
        let quality = match self.problem.evaluate(&initial) {
            Ok(q) => q,
            Err(e) => return Err(self.abort(e)),
        };

        self.best = Some(initial.clone());
        self.best_quality = quality;
        self.current = Some(initial);
        self.current_quality = quality;
        self.quality_history.push(quality);
        self.state = SearchState::Running;

        debug!(
            heuristics = self.selector.len(),
            criterion = self.criterion.name(),
            initial_quality = quality,
            "search started"
        );

        self.check_stop();
        Ok(())
    }

    /// Runs one iteration: select, apply, evaluate, classify, decide,
    /// update the profile, advance the acceptance state, check stop.
    ///
    /// An external failure aborts the run (`Terminated`) without touching
    /// any profile.
    pub fn step(&mut self) -> Result<StepReport, SearchError<P::Error>> {
        if self.state != SearchState::Running {
            return Err(HyperError::InvalidState(format!(
                "step() requires Running state, found {:?}",
                self.state
            ))
            .into());
        }
        if self.poll_cancel() {
            return Err(HyperError::InvalidState("search was cancelled".into()).into());
        }

        let current = self
            .current
            .as_ref()
            .ok_or_else(|| HyperError::InvalidState("no current solution".into()))?;

        let heuristic = self.selector.select(&mut self.rng)?;

        let applied_at = Instant::now();
        let candidate = match self.problem.apply_heuristic(heuristic, current, &mut self.rng) {
            Ok(c) => c,
            Err(e) => return Err(self.abort(e)),
        };
        let candidate_quality = match self.problem.evaluate(&candidate) {
            Ok(q) => q,
            Err(e) => return Err(self.abort(e)),
        };
        let elapsed = applied_at.elapsed();

        let outcome = MoveOutcome::new(self.current_quality, candidate_quality);
        let tag = self.classifier.classify_outcome(&outcome);
        let accepted = self
            .criterion
            .decide(&outcome, tag, &self.acceptance, &mut self.rng);

        self.selector.record(heuristic, tag, accepted, elapsed)?;

        let mut new_best = false;
        if accepted {
            self.accepted_moves += 1;
            if tag == HeuristicClassTag::OnlyImproving {
                self.improving_moves += 1;
            }
            if candidate_quality < self.best_quality {
                self.best = Some(candidate.clone());
                self.best_quality = candidate_quality;
                new_best = true;
            }
            self.current = Some(candidate);
            self.current_quality = candidate_quality;
        }
        if new_best {
            self.since_improvement = 0;
        } else {
            self.since_improvement += 1;
        }

        self.acceptance.advance();
        self.iterations += 1;
        if self.iterations % self.config.history_interval == 0 {
            self.quality_history.push(self.best_quality);
        }

        trace!(
            iteration = self.iterations,
            heuristic,
            kind = ?self.problem.heuristic_kind(heuristic),
            ?tag,
            accepted,
            delta = outcome.delta(),
            "step"
        );

        self.check_stop();
        if self.state == SearchState::Running {
            self.poll_cancel();
        }

        Ok(StepReport {
            heuristic,
            tag,
            accepted,
            candidate_quality,
            state: self.state,
        })
    }

    /// Steps until the run converges or is terminated, then returns the result.
    pub fn run(&mut self) -> Result<SearchResult<P::Solution>, SearchError<P::Error>> {
        if self.state == SearchState::Initialized {
            return Err(HyperError::InvalidState("run() called before start()".into()).into());
        }

        while self.state == SearchState::Running {
            if self.poll_cancel() {
                break;
            }
            self.step()?;
        }

        let result = self.result()?;
        info!(
            iterations = result.iterations,
            best_quality = result.best_quality,
            stop_reason = ?result.stop_reason,
            state = ?result.state,
            "search finished"
        );
        Ok(result)
    }

    /// Terminates the run. Has no effect once `Terminated`.
    pub fn stop(&mut self) {
        if self.state != SearchState::Terminated {
            debug!(from = ?self.state, iteration = self.iterations, "search stopped");
            self.state = SearchState::Terminated;
        }
    }

    /// Snapshot of the run so far.
    pub fn result(&self) -> Result<SearchResult<P::Solution>, HyperError> {
        let (best, current) = match (&self.best, &self.current) {
            (Some(b), Some(c)) => (b.clone(), c.clone()),
            _ => {
                return Err(HyperError::InvalidState(
                    "no solution available before start()".into(),
                ))
            }
        };

        let mut quality_history = self.quality_history.clone();
        if quality_history
            .last()
            .is_none_or(|&last| (last - self.best_quality).abs() > 1e-15)
        {
            quality_history.push(self.best_quality);
        }

        Ok(SearchResult {
            best,
            best_quality: self.best_quality,
            current,
            current_quality: self.current_quality,
            iterations: self.iterations,
            accepted_moves: self.accepted_moves,
            improving_moves: self.improving_moves,
            final_temperature: self.acceptance.temperature(),
            stop_reason: self.stop_reason,
            state: self.state,
            cancelled: self.cancelled,
            profiles: self.selector.profiles().clone(),
            heuristic_kinds: self
                .selector
                .profiles()
                .keys()
                .map(|&id| (id, self.problem.heuristic_kind(id)))
                .collect(),
            quality_history,
        })
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn best_quality(&self) -> f64 {
        self.best_quality
    }

    pub fn current_quality(&self) -> f64 {
        self.current_quality
    }

    pub fn selector(&self) -> &HeuristicSelector {
        &self.selector
    }

    pub fn acceptance_state(&self) -> &AcceptanceState {
        &self.acceptance
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Registered heuristics of the given category, in ascending id order.
    pub fn heuristics_of_kind(&self, kind: HeuristicKind) -> Vec<HeuristicId> {
        self.selector
            .profiles()
            .keys()
            .copied()
            .filter(|&id| self.problem.heuristic_kind(id) == kind)
            .collect()
    }

    fn check_stop(&mut self) {
        let reason = if self
            .config
            .quality_target
            .is_some_and(|target| self.best_quality <= target)
        {
            Some(StopReason::QualityTarget)
        } else if self.iterations >= self.config.max_iterations {
            Some(StopReason::IterationBudget)
        } else if self
            .config
            .time_limit
            .zip(self.started_at)
            .is_some_and(|(limit, started)| started.elapsed() >= limit)
        {
            Some(StopReason::TimeLimit)
        } else if self.config.no_improvement_limit > 0
            && self.since_improvement >= self.config.no_improvement_limit
        {
            Some(StopReason::Stagnation)
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!(
                ?reason,
                iteration = self.iterations,
                best_quality = self.best_quality,
                "search converged"
            );
            self.stop_reason = Some(reason);
            self.state = SearchState::Converged;
        }
    }

    /// Moves to `Terminated` if the cancellation flag is set.
    fn poll_cancel(&mut self) -> bool {
        let requested = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if requested {
            debug!(iteration = self.iterations, "search cancelled");
            self.cancelled = true;
            self.state = SearchState::Terminated;
        }
        requested
    }

    fn abort(&mut self, error: P::Error) -> SearchError<P::Error> {
        warn!(iteration = self.iterations, %error, "external function failed; aborting search");
        self.state = SearchState::Terminated;
        SearchError::Problem(error)
    }
}
