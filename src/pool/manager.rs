//! Pool façade.
//!
//! # Responsibilities
//! - Compose registry, health, sessions and sticky affinity behind one lock
//! - Keep acquire/release/record atomic against a consistent view
//! - Serve read-only snapshots for introspection

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::config::validation::{normalize_endpoint, validate_settings};
use crate::config::{EndpointConfig, PoolConfig, PoolSettings};
use crate::observability::metrics;
use crate::pool::endpoint::EndpointEntry;
use crate::pool::score::score;
use crate::pool::session::{Session, SessionTable};
use crate::pool::sticky::StickyTable;
use crate::pool::types::{
    AcquireOptions, Clock, EndpointSnapshot, Lease, PoolError, PoolResult, SystemClock,
};

/// Shared, thread-safe endpoint pool.
///
/// All state lives behind a single pool-wide lock: mutating operations take
/// the write half, snapshots take the read half. No method performs I/O or
/// suspends; callers run the actual network call between `acquire` and
/// `record_result`/`release`, outside any pool-held lock.
pub struct EndpointPool {
    inner: RwLock<PoolInner>,
    clock: Arc<dyn Clock>,
}

struct PoolInner {
    settings: PoolSettings,
    entries: HashMap<String, EndpointEntry>,
    next_order: u64,
    sessions: SessionTable,
    sticky: StickyTable,
}

impl EndpointPool {
    /// Create an empty pool with the wall clock.
    pub fn new(settings: PoolSettings) -> PoolResult<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create an empty pool with an injected time source.
    pub fn with_clock(settings: PoolSettings, clock: Arc<dyn Clock>) -> PoolResult<Self> {
        validate_settings(&settings)?;
        Ok(Self {
            inner: RwLock::new(PoolInner {
                settings,
                entries: HashMap::new(),
                next_order: 0,
                sessions: SessionTable::default(),
                sticky: StickyTable::default(),
            }),
            clock,
        })
    }

    /// Create a pool and register every endpoint from a loaded configuration.
    pub fn from_config(config: PoolConfig) -> PoolResult<Self> {
        let pool = Self::new(config.settings)?;
        for endpoint in config.endpoints {
            pool.register_endpoint(endpoint)?;
        }
        Ok(pool)
    }

    /// Register an endpoint, or replace the config of an existing one.
    ///
    /// Replacement removes every session and sticky binding referencing the
    /// endpoint and resets its health record; the entry keeps its original
    /// registration order. Returns the normalized configuration.
    pub fn register_endpoint(&self, config: EndpointConfig) -> PoolResult<EndpointConfig> {
        let config = normalize_endpoint(config)?;
        let mut inner = self.write();
        let default_latency = inner.settings.default_latency_ms;

        let replaced = inner.entries.get(&config.id).map(|entry| entry.order);
        let order = match replaced {
            Some(order) => {
                // Cascade before the new config goes live: nothing may keep
                // referencing the replaced version.
                let released = inner.sessions.remove_for_endpoint(&config.id);
                inner.sticky.purge_endpoint(&config.id);
                tracing::info!(
                    endpoint = %config.id,
                    released_sessions = released.len(),
                    "Endpoint config replaced"
                );
                order
            }
            None => {
                let order = inner.next_order;
                inner.next_order += 1;
                tracing::info!(endpoint = %config.id, weight = config.weight, "Endpoint registered");
                order
            }
        };

        inner.entries.insert(
            config.id.clone(),
            EndpointEntry::new(config.clone(), order, default_latency),
        );
        metrics::record_endpoint_health(&config.id, true);
        metrics::record_active_sessions(&config.id, 0);
        Ok(config)
    }

    /// Remove an endpoint along with its sessions and sticky bindings.
    /// Unknown ids are a no-op.
    pub fn remove_endpoint(&self, id: &str) {
        let mut inner = self.write();
        if inner.entries.remove(id).is_none() {
            return;
        }
        let released = inner.sessions.remove_for_endpoint(id);
        inner.sticky.purge_endpoint(id);
        tracing::info!(
            endpoint = %id,
            released_sessions = released.len(),
            "Endpoint removed"
        );
    }

    /// Acquire a lease on the best available endpoint.
    ///
    /// Expired sessions and bindings are swept first. A client id routes
    /// through the sticky table before scored selection; when the strict pass
    /// finds no candidate and fallback is allowed, selection is retried with
    /// health and cooldown checks relaxed. The capacity cap is never relaxed.
    pub fn acquire(&self, opts: AcquireOptions) -> PoolResult<Lease> {
        let now = self.clock.now();
        let mut guard = self.write();
        let inner = &mut *guard;

        inner.expire_sessions(now);
        inner.sticky.sweep_expired(now);

        // Sticky path: a known client stays on its endpoint as long as the
        // relaxed predicate holds; degraded is tolerated, a full cap is not.
        if let Some(client_id) = opts.client_id.as_deref() {
            if let Some(endpoint_id) = inner.sticky.lookup(client_id, now) {
                let reusable = inner
                    .entries
                    .get(&endpoint_id)
                    .map(|entry| entry.is_available(now, true));
                match reusable {
                    Some(true) => {
                        if let Some(lease) =
                            inner.mint_session(&endpoint_id, now, opts.ttl, Some(client_id))
                        {
                            let ttl = inner.sticky_ttl();
                            inner.sticky.bind(client_id, &endpoint_id, ttl, now);
                            tracing::debug!(
                                client = %client_id,
                                endpoint = %endpoint_id,
                                "Sticky reuse"
                            );
                            metrics::record_acquire(&endpoint_id, true);
                            return Ok(lease);
                        }
                    }
                    Some(false) => {}
                    None => inner.sticky.remove(client_id),
                }
            }
        }

        let mut selected = inner.select(now, false);
        if selected.is_none() && opts.allow_unhealthy_fallback {
            selected = inner.select(now, true);
        }
        let Some(endpoint_id) = selected else {
            tracing::warn!("No endpoint available");
            metrics::record_acquire_unavailable();
            return Err(PoolError::NotAvailable);
        };

        match inner.mint_session(&endpoint_id, now, opts.ttl, opts.client_id.as_deref()) {
            Some(lease) => {
                if let Some(client_id) = opts.client_id.as_deref() {
                    let ttl = inner.sticky_ttl();
                    inner.sticky.bind(client_id, &endpoint_id, ttl, now);
                }
                tracing::debug!(endpoint = %endpoint_id, session = %lease.session_id, "Lease minted");
                metrics::record_acquire(&endpoint_id, false);
                Ok(lease)
            }
            None => Err(PoolError::NotAvailable),
        }
    }

    /// Release a lease. Unknown or already-released ids return false.
    pub fn release(&self, session_id: &str) -> bool {
        let mut inner = self.write();
        inner.release_session(session_id)
    }

    /// Fold a reported outcome into the endpoint's health record, optionally
    /// releasing the session that produced it.
    pub fn record_result(
        &self,
        endpoint_id: &str,
        success: bool,
        latency_ms: Option<f64>,
        session_id: Option<&str>,
    ) -> PoolResult<()> {
        let now = self.clock.now();
        let mut guard = self.write();
        let inner = &mut *guard;
        let decay = inner.settings.ewma_decay;

        let Some(entry) = inner.entries.get_mut(endpoint_id) else {
            return Err(PoolError::UnknownEndpoint(endpoint_id.to_string()));
        };

        let flipped = entry
            .health
            .observe(success, latency_ms, now, decay, &entry.config);
        if flipped {
            if entry.health.healthy {
                tracing::info!(
                    endpoint = %endpoint_id,
                    success_ewma = entry.health.success_ewma,
                    "Endpoint recovered"
                );
            } else {
                tracing::warn!(
                    endpoint = %endpoint_id,
                    success_ewma = entry.health.success_ewma,
                    "Endpoint marked unhealthy"
                );
            }
            metrics::record_endpoint_health(endpoint_id, entry.health.healthy);
        }
        metrics::record_result(endpoint_id, success);

        if let Some(session_id) = session_id {
            inner.release_session(session_id);
        }
        Ok(())
    }

    /// Read-only projection of one endpoint.
    pub fn snapshot(&self, endpoint_id: &str) -> PoolResult<EndpointSnapshot> {
        let now = self.clock.now();
        let inner = self.read();
        inner
            .entries
            .get(endpoint_id)
            .map(|entry| inner.snapshot_entry(entry, now))
            .ok_or_else(|| PoolError::UnknownEndpoint(endpoint_id.to_string()))
    }

    /// Read-only projections of every endpoint, in registration order.
    pub fn describe_all(&self) -> Vec<EndpointSnapshot> {
        let now = self.clock.now();
        let inner = self.read();
        let mut entries: Vec<&EndpointEntry> = inner.entries.values().collect();
        entries.sort_by_key(|entry| entry.order);
        entries
            .into_iter()
            .map(|entry| inner.snapshot_entry(entry, now))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, PoolInner> {
        self.inner.read().expect("pool lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolInner> {
        self.inner.write().expect("pool lock poisoned")
    }
}

impl PoolInner {
    fn sticky_ttl(&self) -> Duration {
        Duration::from_secs(self.settings.sticky_ttl_secs)
    }

    /// Effective lease lifetime: per-call override, else the pool default.
    /// Zero means the lease never expires.
    fn session_ttl(&self, override_ttl: Option<Duration>) -> Option<Duration> {
        let ttl = override_ttl.unwrap_or(Duration::from_secs(self.settings.session_ttl_secs));
        (ttl > Duration::ZERO).then_some(ttl)
    }

    /// Release every session past its expiry and give back its capacity.
    fn expire_sessions(&mut self, now: Instant) {
        let expired = self.sessions.sweep_expired(now);
        if expired.is_empty() {
            return;
        }
        for session in &expired {
            if let Some(entry) = self.entries.get_mut(&session.endpoint_id) {
                entry.active_sessions = entry.active_sessions.saturating_sub(1);
                metrics::record_active_sessions(&session.endpoint_id, entry.active_sessions);
            }
        }
        tracing::debug!(count = expired.len(), "Expired sessions swept");
        metrics::record_sessions_expired(expired.len());
    }

    /// Pick the highest-scoring available endpoint.
    /// In case of tie, the earliest registration is selected (stability).
    fn select(&self, now: Instant, allow_unhealthy: bool) -> Option<String> {
        let mut candidates: Vec<&EndpointEntry> = self
            .entries
            .values()
            .filter(|entry| entry.is_available(now, allow_unhealthy))
            .collect();
        candidates.sort_by_key(|entry| entry.order);

        let mut best: Option<(&EndpointEntry, f64)> = None;
        for entry in candidates {
            let entry_score = score(entry, &self.settings, now);
            match best {
                Some((_, best_score)) if entry_score <= best_score => {}
                _ => best = Some((entry, entry_score)),
            }
        }
        best.map(|(entry, _)| entry.config.id.clone())
    }

    fn mint_session(
        &mut self,
        endpoint_id: &str,
        now: Instant,
        ttl: Option<Duration>,
        client_id: Option<&str>,
    ) -> Option<Lease> {
        let expires_at = self.session_ttl(ttl).map(|ttl| now + ttl);
        let entry = self.entries.get_mut(endpoint_id)?;

        let seq = entry.next_session_seq();
        let session_id = format!("{}:{}", entry.config.id, seq);
        entry.active_sessions += 1;
        metrics::record_active_sessions(endpoint_id, entry.active_sessions);

        let lease = Lease {
            session_id: session_id.clone(),
            endpoint_id: entry.config.id.clone(),
            address: entry.config.address.clone(),
            metadata: entry.config.metadata.clone(),
            acquired_at: now,
            expires_at,
        };
        self.sessions.insert(Session {
            id: session_id,
            endpoint_id: lease.endpoint_id.clone(),
            acquired_at: now,
            expires_at,
            client_id: client_id.map(str::to_string),
        });
        Some(lease)
    }

    fn release_session(&mut self, session_id: &str) -> bool {
        let Some(session) = self.sessions.remove(session_id) else {
            return false;
        };
        if let Some(entry) = self.entries.get_mut(&session.endpoint_id) {
            entry.active_sessions = entry.active_sessions.saturating_sub(1);
            metrics::record_active_sessions(&session.endpoint_id, entry.active_sessions);
        }
        true
    }

    fn snapshot_entry(&self, entry: &EndpointEntry, now: Instant) -> EndpointSnapshot {
        let health = &entry.health;
        let cooldown_remaining_secs = health
            .cooldown_until
            .map(|until| until.saturating_duration_since(now).as_secs_f64())
            .unwrap_or(0.0);
        EndpointSnapshot {
            id: entry.config.id.clone(),
            address: entry.config.address.clone(),
            weight: entry.config.weight,
            healthy: health.healthy,
            in_cooldown: health.in_cooldown(now),
            cooldown_remaining_secs,
            success_ewma: health.success_ewma,
            effective_success: health.effective_success(entry.config.warmup_samples),
            latency_ewma_ms: health.latency_ewma_ms,
            observations: health.observations,
            active_sessions: entry.active_sessions,
            max_sessions: entry.config.max_sessions,
            score: score(entry, &self.settings, now),
            metadata: entry.config.metadata.clone(),
        }
    }
}
