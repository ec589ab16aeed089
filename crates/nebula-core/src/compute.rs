//! Parallel compute unit for combat math.
//!
//! Battles are the one CPU-heavy computation in a tick, so they run on a
//! dedicated OS thread. Requests carry copies of everything they need and
//! are correlated with responses by [`RequestId`]; the worker answers in
//! completion order. Each request waits at most the configured timeout.
//!
//! Tearing the unit down with [`ComputeUnit::dispose`] closes the job
//! channel and rejects every pending request with
//! [`ComputeError::Terminated`]. Requests already running on the worker
//! finish, but their responses are dropped.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nebula_fleet::{
    BattleOutcome, BattleRequest, DebrisRequest, PlunderRequest, calculate_debris,
    calculate_plunder, simulate_battle,
};
use nebula_types::{RequestId, Resources};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::ComputeConfig;

/// Errors returned to a caller waiting on the compute unit.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// No response arrived within the timeout.
    #[error("compute request {id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The request.
        id: RequestId,
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The unit was torn down before answering.
    #[error("compute unit terminated")]
    Terminated,

    /// The worker reported an error for this request.
    #[error("compute request {id} failed: {message}")]
    Failed {
        /// The request.
        id: RequestId,
        /// Worker-side error text.
        message: String,
    },

    /// The response payload did not match the request type.
    #[error("expected {expected} payload from compute unit")]
    UnexpectedPayload {
        /// Payload kind the caller asked for.
        expected: &'static str,
    },

    /// The worker thread could not be started.
    #[error("failed to spawn compute worker: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Work the compute unit accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ComputeRequest {
    /// Run a battle.
    SimulateBattle(BattleRequest),
    /// Work out plunder for a won battle.
    CalculatePlunder(PlunderRequest),
    /// Work out the debris left by ship losses.
    CalculateDebris(DebrisRequest),
}

/// Successful result of a [`ComputeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ComputePayload {
    /// Result of a battle.
    Battle(BattleOutcome),
    /// Plunder loaded.
    Plunder(Resources),
    /// Debris created.
    Debris(Resources),
}

/// A response from the worker, matched to its request by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    /// Id of the request this answers.
    pub id: RequestId,
    /// Payload on success, error text on failure.
    pub result: Result<ComputePayload, String>,
}

impl ComputeResponse {
    /// Whether the request succeeded.
    pub const fn ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Evaluate one request on the current thread.
pub fn solve(request: &ComputeRequest) -> Result<ComputePayload, String> {
    Ok(match request {
        ComputeRequest::SimulateBattle(battle) => ComputePayload::Battle(simulate_battle(battle)),
        ComputeRequest::CalculatePlunder(plunder) => {
            ComputePayload::Plunder(calculate_plunder(plunder))
        }
        ComputeRequest::CalculateDebris(debris) => ComputePayload::Debris(calculate_debris(debris)),
    })
}

struct Job {
    id: RequestId,
    request: ComputeRequest,
}

type Pending = Arc<Mutex<BTreeMap<RequestId, oneshot::Sender<ComputeResponse>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the worker thread.
#[derive(Debug)]
pub struct ComputeUnit {
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    pending: Pending,
    worker: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
}

impl ComputeUnit {
    /// Start a worker that evaluates requests with [`solve`].
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Spawn`] if the OS refuses the thread.
    pub fn spawn(config: &ComputeConfig) -> Result<Self, ComputeError> {
        Self::spawn_with(config, solve)
    }

    /// Start a worker with a custom evaluator.
    ///
    /// A panic inside `handler` is reported to the caller as
    /// [`ComputeError::Failed`] and the worker keeps serving.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Spawn`] if the OS refuses the thread.
    pub fn spawn_with<F>(config: &ComputeConfig, handler: F) -> Result<Self, ComputeError>
    where
        F: Fn(&ComputeRequest) -> Result<ComputePayload, String> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>();
        let pending: Pending = Arc::new(Mutex::new(BTreeMap::new()));
        let routes = Arc::clone(&pending);

        let worker = thread::Builder::new()
            .name(String::from("nebula-compute"))
            .spawn(move || {
                while let Ok(Job { id, request }) = rx.recv() {
                    let result = catch_unwind(AssertUnwindSafe(|| handler(&request)))
                        .unwrap_or_else(|_| Err(String::from("compute worker panicked")));
                    let waiter = lock(&routes).remove(&id);
                    match waiter {
                        Some(sender) => {
                            let _ = sender.send(ComputeResponse { id, result });
                        }
                        None => debug!(request_id = %id, "Dropping response for abandoned request"),
                    }
                }
                debug!("Compute worker stopped");
            })?;

        info!(timeout_ms = config.timeout_ms, "Compute unit started");
        Ok(Self {
            jobs: Mutex::new(Some(tx)),
            pending,
            worker: Mutex::new(Some(worker)),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Send `request` to the worker and wait for its response.
    ///
    /// # Errors
    ///
    /// - [`ComputeError::Terminated`] if the unit is disposed or the worker
    ///   is gone
    /// - [`ComputeError::Timeout`] if no response arrives in time; the
    ///   request is abandoned
    /// - [`ComputeError::Failed`] if the worker reports an error
    pub async fn request(&self, request: ComputeRequest) -> Result<ComputePayload, ComputeError> {
        let id = RequestId::new();
        let (tx, rx) = oneshot::channel();
        {
            let jobs = lock(&self.jobs);
            let sender = jobs.as_ref().ok_or(ComputeError::Terminated)?;
            lock(&self.pending).insert(id, tx);
            if sender.send(Job { id, request }).is_err() {
                lock(&self.pending).remove(&id);
                return Err(ComputeError::Terminated);
            }
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response
                .result
                .map_err(|message| ComputeError::Failed { id, message }),
            Ok(Err(_)) => Err(ComputeError::Terminated),
            Err(_) => {
                lock(&self.pending).remove(&id);
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(request_id = %id, timeout_ms, "Compute request timed out");
                Err(ComputeError::Timeout { id, timeout_ms })
            }
        }
    }

    /// Run a battle on the worker.
    ///
    /// # Errors
    ///
    /// Any [`ComputeError`] from [`request`](Self::request), or
    /// [`ComputeError::UnexpectedPayload`].
    pub async fn simulate_battle(&self, battle: BattleRequest) -> Result<BattleOutcome, ComputeError> {
        match self.request(ComputeRequest::SimulateBattle(battle)).await? {
            ComputePayload::Battle(outcome) => Ok(outcome),
            _ => Err(ComputeError::UnexpectedPayload { expected: "battle" }),
        }
    }

    /// Work out plunder on the worker.
    ///
    /// # Errors
    ///
    /// Any [`ComputeError`] from [`request`](Self::request), or
    /// [`ComputeError::UnexpectedPayload`].
    pub async fn calculate_plunder(&self, plunder: PlunderRequest) -> Result<Resources, ComputeError> {
        match self.request(ComputeRequest::CalculatePlunder(plunder)).await? {
            ComputePayload::Plunder(resources) => Ok(resources),
            _ => Err(ComputeError::UnexpectedPayload { expected: "plunder" }),
        }
    }

    /// Work out debris on the worker.
    ///
    /// # Errors
    ///
    /// Any [`ComputeError`] from [`request`](Self::request), or
    /// [`ComputeError::UnexpectedPayload`].
    pub async fn calculate_debris(&self, debris: DebrisRequest) -> Result<Resources, ComputeError> {
        match self.request(ComputeRequest::CalculateDebris(debris)).await? {
            ComputePayload::Debris(resources) => Ok(resources),
            _ => Err(ComputeError::UnexpectedPayload { expected: "debris" }),
        }
    }

    /// Requests waiting for a response.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Whether the unit still accepts requests.
    pub fn is_running(&self) -> bool {
        lock(&self.jobs).is_some()
    }

    /// Stop accepting work and reject everything pending.
    ///
    /// Idempotent. The worker thread exits once its current job is done.
    pub fn dispose(&self) {
        let Some(sender) = lock(&self.jobs).take() else {
            return;
        };
        drop(sender);
        let rejected = std::mem::take(&mut *lock(&self.pending));
        let count = rejected.len();
        drop(rejected);
        drop(lock(&self.worker).take());
        info!(rejected = count, "Compute unit disposed");
    }
}

impl Drop for ComputeUnit {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use nebula_types::{BattleWinner, ShipType};

    use super::*;

    fn config(timeout_ms: u64) -> ComputeConfig {
        ComputeConfig { timeout_ms }
    }

    fn battle() -> BattleRequest {
        BattleRequest {
            attacker_fleet: [(ShipType::Cruiser, 20)].into_iter().collect(),
            attacker_tech: nebula_fleet::CombatTech::default(),
            defender_fleet: [(ShipType::LightFighter, 2)].into_iter().collect(),
            defender_defenses: nebula_types::Defenses::new(),
            defender_tech: nebula_fleet::CombatTech::default(),
            max_rounds: nebula_fleet::MAX_ROUNDS,
        }
    }

    #[tokio::test]
    async fn battle_matches_local_simulation() {
        let unit = ComputeUnit::spawn(&config(10_000)).unwrap();
        let request = battle();
        let remote = unit.simulate_battle(request.clone()).await.unwrap();
        assert_eq!(remote, simulate_battle(&request));
        assert_eq!(remote.winner, BattleWinner::Attacker);
        assert_eq!(unit.pending(), 0);
    }

    #[tokio::test]
    async fn concurrent_requests_are_matched_by_id() {
        let unit = ComputeUnit::spawn(&config(10_000)).unwrap();
        let plunder = PlunderRequest {
            defender_resources: Resources::new(1_000, 1_000, 0),
            attacker_fleet: [(ShipType::LargeCargo, 1)].into_iter().collect(),
            carried: Resources::ZERO,
        };
        let debris = DebrisRequest {
            attacker_losses: [(ShipType::LightFighter, 10)].into_iter().collect(),
            defender_losses: nebula_types::Fleet::new(),
        };
        let (p, d) = tokio::join!(
            unit.calculate_plunder(plunder.clone()),
            unit.calculate_debris(debris.clone())
        );
        assert_eq!(p.unwrap(), calculate_plunder(&plunder));
        assert_eq!(d.unwrap(), calculate_debris(&debris));
    }

    #[tokio::test]
    async fn slow_worker_times_out() {
        let unit = ComputeUnit::spawn_with(&config(20), |request| {
            thread::sleep(Duration::from_millis(200));
            solve(request)
        })
        .unwrap();
        let result = unit.simulate_battle(battle()).await;
        assert!(matches!(result, Err(ComputeError::Timeout { timeout_ms: 20, .. })));
        assert_eq!(unit.pending(), 0);
    }

    #[tokio::test]
    async fn worker_errors_surface_as_failed() {
        let unit = ComputeUnit::spawn_with(&config(1_000), |_| Err(String::from("bad input"))).unwrap();
        let result = unit.simulate_battle(battle()).await;
        assert!(matches!(result, Err(ComputeError::Failed { ref message, .. }) if message == "bad input"));
    }

    #[tokio::test]
    async fn worker_panic_is_contained() {
        let unit = ComputeUnit::spawn_with(&config(1_000), |request| match request {
            ComputeRequest::SimulateBattle(_) => panic!("overflow in round loop"),
            other => solve(other),
        })
        .unwrap();
        let first = unit.simulate_battle(battle()).await;
        assert!(matches!(first, Err(ComputeError::Failed { .. })));
        let debris = unit.calculate_debris(DebrisRequest::default()).await;
        assert_eq!(debris.unwrap(), Resources::ZERO);
    }

    #[tokio::test]
    async fn mismatched_payload_is_rejected() {
        let unit = ComputeUnit::spawn_with(&config(1_000), |_| Ok(ComputePayload::Debris(Resources::ZERO)))
            .unwrap();
        let result = unit.simulate_battle(battle()).await;
        assert!(matches!(result, Err(ComputeError::UnexpectedPayload { expected: "battle" })));
    }

    #[tokio::test]
    async fn dispose_rejects_pending_and_new_requests() {
        let unit = Arc::new(
            ComputeUnit::spawn_with(&config(10_000), |request| {
                thread::sleep(Duration::from_millis(300));
                solve(request)
            })
            .unwrap(),
        );
        let waiting = {
            let unit = Arc::clone(&unit);
            tokio::spawn(async move { unit.simulate_battle(battle()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        unit.dispose();
        assert!(!unit.is_running());

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(ComputeError::Terminated)));
        let after = unit.calculate_debris(DebrisRequest::default()).await;
        assert!(matches!(after, Err(ComputeError::Terminated)));
    }

    #[test]
    fn wire_format_is_tagged() {
        let request = ComputeRequest::CalculateDebris(DebrisRequest::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json.get("type").and_then(serde_json::Value::as_str),
            Some("calculateDebris")
        );
        assert!(json.get("payload").is_some());

        let back: ComputeRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
