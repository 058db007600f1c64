//! The score coordinator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::scorer::Scorer;
use crate::store::{ResultStore, ReviewStore};
use crate::types::config::Config;
use crate::types::records::{InFlightMarker, RestaurantId, ScoreRecord};
use crate::types::responses::ScoreOutcome;
use crate::{JakasError, JakasResult};

use super::clock::{Clock, SystemClock};
use super::inflight::{InFlightGuard, InFlightTable};

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// How long a record stays fresh.
    pub ttl: Duration,

    /// Upper bound for one scorer invocation.
    pub scorer_timeout: Duration,

    /// Also treat a record as stale when its reviews changed.
    pub invalidate_on_review_change: bool,
}

impl CoordinatorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: config.cache.ttl(),
            scorer_timeout: config.scorer.timeout(),
            invalidate_on_review_change: config.cache.invalidate_on_review_change,
        }
    }
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Snapshot of coordinator counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Requests answered from a fresh record.
    pub ready: u64,
    /// Requests that found a computation in flight.
    pub pending: u64,
    /// Computations launched.
    pub started: u64,
    /// Computations that stored a record.
    pub succeeded: u64,
    /// Computations that ended without a record.
    pub failed: u64,
    /// Computations running right now.
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    ready: AtomicU64,
    pending: AtomicU64,
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Serves cached scores and launches at most one computation per restaurant.
///
/// Cloning is cheap; clones share stores, scorer and in-flight state.
#[derive(Clone)]
pub struct ScoreCoordinator {
    results: Arc<dyn ResultStore>,
    reviews: Arc<dyn ReviewStore>,
    scorer: Arc<dyn Scorer>,
    in_flight: Arc<InFlightTable>,
    clock: Arc<dyn Clock>,
    options: CoordinatorOptions,
    counters: Arc<Counters>,
}

impl ScoreCoordinator {
    /// Creates a coordinator over the given stores and scorer.
    pub fn new(
        results: Arc<dyn ResultStore>,
        reviews: Arc<dyn ReviewStore>,
        scorer: Arc<dyn Scorer>,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            results,
            reviews,
            scorer,
            in_flight: Arc::new(InFlightTable::new()),
            clock: Arc::new(SystemClock),
            options,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    /// Returns the score of `id`, or makes sure one is being computed.
    ///
    /// Never waits for the scorer. Storage errors are returned before any
    /// in-flight state changes; scorer errors never reach the caller.
    pub async fn request_score(&self, id: &RestaurantId) -> JakasResult<ScoreOutcome> {
        if let Some(record) = self.fresh_record(id).await? {
            self.counters.ready.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(restaurant_id = %id, "Serving cached score");
            return Ok(ScoreOutcome::Ready(record));
        }

        let Some(guard) = self.in_flight.try_acquire(id, self.clock.now()) else {
            self.counters.pending.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(restaurant_id = %id, "Score computation already in flight");
            return Ok(ScoreOutcome::Pending);
        };

        // A computation may have settled between the lookup and the acquire.
        // On error the guard is dropped here and the marker goes with it.
        if let Some(record) = self.fresh_record(id).await? {
            drop(guard);
            self.counters.ready.fetch_add(1, Ordering::Relaxed);
            return Ok(ScoreOutcome::Ready(record));
        }

        self.counters.started.fetch_add(1, Ordering::Relaxed);
        self.spawn_computation(guard);
        Ok(ScoreOutcome::Started)
    }

    /// Calls [`request_score`](Self::request_score) until the score is ready.
    ///
    /// Between attempts waits for the running computation to settle, then
    /// sleeps `interval`. Returns `Ok(None)` after `max_attempts` attempts.
    pub async fn await_score(
        &self,
        id: &RestaurantId,
        max_attempts: u32,
        interval: Duration,
    ) -> JakasResult<Option<ScoreRecord>> {
        for attempt in 1..=max_attempts {
            match self.request_score(id).await? {
                ScoreOutcome::Ready(record) => return Ok(Some(record)),
                outcome => {
                    tracing::debug!(
                        restaurant_id = %id,
                        attempt,
                        status = %outcome.status(),
                        "Score not ready yet"
                    );
                }
            }

            if attempt < max_attempts {
                self.in_flight.wait_settled(id).await;
                tokio::time::sleep(interval).await;
            }
        }

        tracing::warn!(restaurant_id = %id, max_attempts, "Score still not ready");
        Ok(None)
    }

    /// Whether a computation for `id` is running.
    pub fn is_in_flight(&self, id: &RestaurantId) -> bool {
        self.in_flight.contains(id)
    }

    /// Markers of every running computation.
    pub fn in_flight_markers(&self) -> Vec<InFlightMarker> {
        self.in_flight.markers()
    }

    /// Resolves once no computation for `id` is running.
    pub async fn wait_settled(&self, id: &RestaurantId) {
        self.in_flight.wait_settled(id).await;
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            ready: self.counters.ready.load(Ordering::Relaxed),
            pending: self.counters.pending.load(Ordering::Relaxed),
            started: self.counters.started.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.len(),
        }
    }

    async fn fresh_record(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>> {
        let Some(record) = self.results.get(id).await? else {
            return Ok(None);
        };

        if !record.is_fresh(self.options.ttl, self.clock.now()) {
            tracing::debug!(restaurant_id = %id, computed_at = %record.computed_at, "Score is stale");
            return Ok(None);
        }

        if self.options.invalidate_on_review_change {
            let digest = self.reviews.list_reviews(id).await?.digest();
            if digest != record.reviews_digest {
                tracing::debug!(restaurant_id = %id, "Reviews changed since last score");
                return Ok(None);
            }
        }

        Ok(Some(record))
    }

    fn spawn_computation(&self, guard: InFlightGuard) {
        let marker = guard.marker().clone();
        let span = tracing::info_span!(
            "score_computation",
            restaurant_id = %marker.restaurant_id,
            attempt_id = %marker.attempt_id,
        );

        let computation = Computation {
            results: Arc::clone(&self.results),
            reviews: Arc::clone(&self.reviews),
            scorer: Arc::clone(&self.scorer),
            clock: Arc::clone(&self.clock),
            counters: Arc::clone(&self.counters),
            scorer_timeout: self.options.scorer_timeout,
        };

        tracing::info!(
            restaurant_id = %marker.restaurant_id,
            attempt_id = %marker.attempt_id,
            "Score computation started"
        );

        tokio::spawn(computation.run(guard).instrument(span));
    }
}

/// Everything a detached computation needs, owned.
struct Computation {
    results: Arc<dyn ResultStore>,
    reviews: Arc<dyn ReviewStore>,
    scorer: Arc<dyn Scorer>,
    clock: Arc<dyn Clock>,
    counters: Arc<Counters>,
    scorer_timeout: Duration,
}

impl Computation {
    async fn run(self, guard: InFlightGuard) {
        let id = guard.marker().restaurant_id.clone();
        let started_at = guard.marker().started_at;

        match self.compute(&id).await {
            Ok(record) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    compare_fun = record.compare_fun,
                    reviews = record.review_count,
                    elapsed_ms = (self.clock.now() - started_at).num_milliseconds(),
                    "Score computation finished"
                );
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                if e.is_scorer() {
                    tracing::warn!(error = %e, "Score computation failed");
                } else {
                    tracing::error!(error = %e, "Score computation failed");
                }
            }
        }

        // The record, if any, is stored before the marker goes away
        drop(guard);
    }

    async fn compute(&self, id: &RestaurantId) -> JakasResult<ScoreRecord> {
        let reviews = self.reviews.list_reviews(id).await?;
        tracing::debug!(reviews = reviews.len(), scorer = self.scorer.name(), "Scoring reviews");

        let estimate = tokio::time::timeout(self.scorer_timeout, self.scorer.score(&reviews))
            .await
            .map_err(|_| {
                JakasError::ScorerTimeout(self.scorer.name().to_string(), self.scorer_timeout)
            })??;

        let record = ScoreRecord::new(id.clone(), estimate, &reviews, self.clock.now());
        self.results.put(record.clone()).await?;
        Ok(record)
    }
}
