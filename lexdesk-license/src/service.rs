//! The licensing service exposed to the host process.
//!
//! One `LicenseService` is built at startup and shared by reference. It
//! computes the machine fingerprint once, owns the state store, and
//! serializes every write to the state file behind a single async mutex so
//! that "check, decide to start a trial, write the trial" cannot interleave
//! with an activation or a second auto-start.

use crate::access::{days_remaining, evaluate, AccessDecision};
use crate::activation::ActivationWatcher;
use crate::config::LicenseConfig;
use crate::device::MachineFingerprint;
use crate::error::{LicenseError, LicenseResult};
use crate::key::{check_license_key, embedded_secret, normalize_key};
use crate::record::{LicenseRecord, LicenseRecordStatus, StateRecord, TrialRecord, TrialStatus};
use crate::store::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result shape handed across the host/UI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// A successful result.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed result carrying the error's message.
    #[must_use]
    pub fn failed(error: &LicenseError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl<T> From<LicenseResult<T>> for OperationResult {
    fn from(result: LicenseResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Trial details for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfo {
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub duration_days: u32,
    pub days_remaining: u32,
    pub expired: bool,
}

impl TrialInfo {
    fn from_record(trial: &TrialRecord, now: DateTime<Utc>) -> Self {
        let ends_at = trial.ends_at();
        Self {
            started_at: trial.started_at,
            ends_at,
            duration_days: trial.duration_days,
            days_remaining: days_remaining(ends_at, now),
            expired: trial.status == TrialStatus::Expired || now >= ends_at,
        }
    }
}

/// Offline licensing for one installation.
#[derive(Debug)]
pub struct LicenseService {
    fingerprint: MachineFingerprint,
    store: StateStore,
    secret: Vec<u8>,
    config: LicenseConfig,
    write_lock: Mutex<()>,
}

impl LicenseService {
    /// Builds the service for this machine using the embedded secret and
    /// the state file location from `config`.
    pub fn open(config: LicenseConfig) -> LicenseResult<Self> {
        config.validate()?;
        let store = StateStore::new(config.state_path()?);
        let fingerprint = MachineFingerprint::generate();
        info!(
            machine_id = %fingerprint,
            path = %store.path().display(),
            "License service ready"
        );
        Ok(Self::with_parts(fingerprint, store, embedded_secret(), config))
    }

    /// Builds the service from explicit parts.
    #[must_use]
    pub fn with_parts(
        fingerprint: MachineFingerprint,
        store: StateStore,
        secret: impl Into<Vec<u8>>,
        config: LicenseConfig,
    ) -> Self {
        Self {
            fingerprint,
            store,
            secret: secret.into(),
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// The machine id the customer sends to the issuer.
    #[must_use]
    pub fn machine_id(&self) -> &str {
        self.fingerprint.as_str()
    }

    /// The fingerprint computed at startup.
    #[must_use]
    pub fn fingerprint(&self) -> &MachineFingerprint {
        &self.fingerprint
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Verifies `key` for this machine and persists a perpetual license.
    ///
    /// The key format is checked first; the state file is only written once
    /// the key verifies, and success is reported only after the write.
    pub async fn activate_license(
        &self,
        key: &str,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> LicenseResult<LicenseRecord> {
        if let Err(e) = check_license_key(key, self.machine_id(), &self.secret) {
            warn!("License activation rejected: {e}");
            return Err(e);
        }

        let record = LicenseRecord {
            license_key: normalize_key(key),
            machine_id: self.machine_id().to_string(),
            customer_name: non_empty(customer_name),
            customer_email: non_empty(customer_email),
            activated_at: Utc::now(),
            expires_at: None,
            status: LicenseRecordStatus::Active,
        };

        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_reset().await?.unwrap_or_default();
        state.license = Some(record.clone());
        self.store.save(&state).await?;

        info!(machine_id = %self.fingerprint, "License activated");
        Ok(record)
    }

    /// Current access decision. Read-only.
    pub async fn check_access(&self) -> LicenseResult<AccessDecision> {
        self.check_access_at(Utc::now()).await
    }

    /// Access decision at `now`. Read-only.
    ///
    /// A corrupted state file resolves to `Unactivated`; only I/O failures
    /// are returned as errors.
    pub async fn check_access_at(&self, now: DateTime<Utc>) -> LicenseResult<AccessDecision> {
        let decision = match self.store.load().await {
            Ok(state) => evaluate(state.as_ref(), self.machine_id(), now),
            Err(LicenseError::CorruptedState(_)) => AccessDecision::corrupted(),
            Err(e) => return Err(e),
        };
        debug!(?decision, "Access checked");
        Ok(decision)
    }

    /// Returns true if a license for this machine is in force.
    pub async fn is_licensed(&self) -> LicenseResult<bool> {
        Ok(self.check_access().await? == AccessDecision::Licensed)
    }

    /// Stored license, if any. A corrupted file reads as no license.
    pub async fn license_info(&self) -> LicenseResult<Option<LicenseRecord>> {
        Ok(self.load_or_reset().await?.and_then(|s| s.license))
    }

    /// Stored trial details, if a trial was ever started.
    pub async fn trial_info(&self) -> LicenseResult<Option<TrialInfo>> {
        self.trial_info_at(Utc::now()).await
    }

    /// Trial details evaluated at `now`.
    pub async fn trial_info_at(&self, now: DateTime<Utc>) -> LicenseResult<Option<TrialInfo>> {
        Ok(self
            .load_or_reset()
            .await?
            .and_then(|s| s.trial)
            .map(|t| TrialInfo::from_record(&t, now)))
    }

    /// Starts the one-time trial.
    ///
    /// Fails with `TrialAlreadyStarted`, leaving the stored trial untouched,
    /// if a trial was ever recorded, and with `LicensePresent` if any license
    /// record exists, including one bound to another machine.
    pub async fn start_trial(&self) -> LicenseResult<TrialRecord> {
        self.start_trial_at(Utc::now()).await
    }

    /// Starts the one-time trial at `now`.
    pub async fn start_trial_at(&self, now: DateTime<Utc>) -> LicenseResult<TrialRecord> {
        let _guard = self.write_lock.lock().await;
        self.start_trial_locked(now).await
    }

    /// Checks access and, if nothing was ever recorded, starts the trial and
    /// checks again, all in one critical section.
    ///
    /// The first time a lapsed trial is observed its stored status is set to
    /// `Expired`. A corrupted state file is replaced by a fresh trial, so
    /// garbling the file restarts the trial.
    pub async fn ensure_access(&self) -> LicenseResult<AccessDecision> {
        self.ensure_access_at(Utc::now()).await
    }

    /// [`ensure_access`](Self::ensure_access) at `now`.
    pub async fn ensure_access_at(&self, now: DateTime<Utc>) -> LicenseResult<AccessDecision> {
        let _guard = self.write_lock.lock().await;
        let (state, decision) = match self.store.load().await {
            Ok(state) => {
                let decision = evaluate(state.as_ref(), self.machine_id(), now);
                (state, decision)
            }
            Err(LicenseError::CorruptedState(_)) => (None, AccessDecision::corrupted()),
            Err(e) => return Err(e),
        };

        if decision.is_trial_eligible() {
            if decision == AccessDecision::corrupted() {
                warn!(
                    path = %self.store.path().display(),
                    "Replacing corrupted license state with a new trial; any earlier trial is lost"
                );
            }
            self.start_trial_locked(now).await?;
            let state = self.store.load().await?;
            return Ok(evaluate(state.as_ref(), self.machine_id(), now));
        }

        if decision == AccessDecision::TrialExpired {
            if let Some(mut state) = state {
                if let Some(trial) = state.trial.as_mut().filter(|t| t.status == TrialStatus::Active)
                {
                    trial.status = TrialStatus::Expired;
                    self.store.save(&state).await?;
                    info!("Trial period ended");
                }
            }
        }

        Ok(decision)
    }

    /// Removes the license by deleting the state file.
    pub async fn deactivate_license(&self) -> LicenseResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.erase().await?;
        info!(machine_id = %self.fingerprint, "License deactivated");
        Ok(())
    }

    /// Spawns a watcher that resolves once this machine is licensed.
    #[must_use]
    pub fn watch_activation(self: &Arc<Self>) -> ActivationWatcher {
        ActivationWatcher::spawn(Arc::clone(self), self.config.poll_interval())
    }

    async fn start_trial_locked(&self, now: DateTime<Utc>) -> LicenseResult<TrialRecord> {
        let mut state = self.load_or_reset().await?.unwrap_or_default();
        if state.trial.is_some() {
            return Err(LicenseError::TrialAlreadyStarted);
        }
        if state.license.is_some() {
            return Err(LicenseError::LicensePresent);
        }

        let trial = TrialRecord::start(now, self.config.trial_days);
        state.trial = Some(trial.clone());
        self.store.save(&state).await?;

        info!(days = trial.duration_days, "Trial started");
        Ok(trial)
    }

    /// Loads state, treating a corrupted file as absent.
    async fn load_or_reset(&self) -> LicenseResult<Option<StateRecord>> {
        match self.store.load().await {
            Ok(state) => Ok(state),
            Err(LicenseError::CorruptedState(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
