use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tierwise_core::{active_tiers_or_empty, CartRepository, RepositoryResult, TierRepository};
use tierwise_shared::models::events::CartNotification;
use crate::notify::{LastNotification, NotificationPolicy};
use crate::summary::{CartSummary, SummaryBuilder};

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub dedup_window_ms: i64,
    pub channel_capacity: usize,
    pub fallback_multiplier: f64,

    /// Users whose last summary is kept; the least recently refreshed is dropped first
    pub max_tracked_users: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 3000,
            channel_capacity: 100,
            fallback_multiplier: 2.0,
            max_tracked_users: 10_000,
        }
    }
}

struct UserState {
    summary: CartSummary,
    last_notification: Option<LastNotification>,
    refreshed_at: DateTime<Utc>,
}

/// One async lock per user with a refresh in flight.
///
/// Entries live only while someone holds or waits on them.
#[derive(Default)]
struct UserGates {
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserGates {
    async fn acquire(&self, user_id: &str) -> (Arc<Mutex<()>>, OwnedMutexGuard<()>) {
        let gate = self
            .gates
            .lock()
            .await
            .entry(user_id.to_string())
            .or_default()
            .clone();
        let guard = gate.clone().lock_owned().await;
        (gate, guard)
    }

    async fn release(&self, user_id: &str, gate: Arc<Mutex<()>>, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut gates = self.gates.lock().await;
        // The map and this caller hold the only references
        if Arc::strong_count(&gate) == 2 {
            gates.remove(user_id);
        }
    }
}

/// Shared source of cart summaries.
///
/// Every computation of a user's summary goes through `refresh`, which
/// compares it with the previously cached one and publishes at most one
/// notification on the broadcast channel. Readers that only want the data
/// never subscribe; the notification side channel is opt-in.
pub struct SummaryHub {
    carts: Arc<dyn CartRepository>,
    tiers: Arc<dyn TierRepository>,
    builder: SummaryBuilder,
    policy: NotificationPolicy,
    max_tracked_users: usize,
    gates: UserGates,
    state: RwLock<HashMap<String, UserState>>,
    tx: broadcast::Sender<CartNotification>,
}

impl SummaryHub {
    pub fn new(carts: Arc<dyn CartRepository>, tiers: Arc<dyn TierRepository>, config: HubConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            carts,
            tiers,
            builder: SummaryBuilder::new(config.fallback_multiplier),
            policy: NotificationPolicy::new(Duration::milliseconds(config.dedup_window_ms)),
            max_tracked_users: config.max_tracked_users.max(1),
            gates: UserGates::default(),
            state: RwLock::new(HashMap::new()),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartNotification> {
        self.tx.subscribe()
    }

    pub fn builder(&self) -> &SummaryBuilder {
        &self.builder
    }

    /// Last computed summary, computing it on first use.
    pub async fn current(&self, user_id: &str) -> RepositoryResult<CartSummary> {
        if let Some(state) = self.state.read().await.get(user_id) {
            return Ok(state.summary.clone());
        }
        self.refresh(user_id).await
    }

    /// Recomputes the summary from fresh cart and tier data.
    ///
    /// Refreshes of one user run one at a time from load to store, so the
    /// cached summary and the notifications follow the order of the reads.
    pub async fn refresh(&self, user_id: &str) -> RepositoryResult<CartSummary> {
        let (gate, guard) = self.gates.acquire(user_id).await;
        let result = self.refresh_locked(user_id).await;
        self.gates.release(user_id, gate, guard).await;
        result
    }

    async fn refresh_locked(&self, user_id: &str) -> RepositoryResult<CartSummary> {
        let cart = self.carts.get_cart(user_id).await?;
        let tiers = active_tiers_or_empty(self.tiers.as_ref()).await;
        let summary = self.builder.build(cart.as_ref(), &tiers);

        let now = Utc::now();
        let mut state = self.state.write().await;
        match state.get_mut(user_id) {
            Some(entry) => {
                let notification = self.policy.evaluate(
                    &entry.summary,
                    &summary,
                    entry.last_notification.as_ref(),
                    now,
                );
                if let Some(notification) = notification {
                    tracing::info!(
                        user_id,
                        kind = notification.kind.as_str(),
                        tier = %notification.tier_name,
                        "price notification"
                    );
                    entry.last_notification = Some(LastNotification {
                        kind: notification.kind,
                        tier_id: notification.tier_id,
                        at: now,
                    });
                    // No subscribers is fine
                    let _ = self.tx.send(CartNotification {
                        user_id: user_id.to_string(),
                        notification,
                    });
                }
                entry.summary = summary.clone();
                entry.refreshed_at = now;
            }
            None => {
                if state.len() >= self.max_tracked_users {
                    evict_oldest(&mut state);
                }
                state.insert(
                    user_id.to_string(),
                    UserState { summary: summary.clone(), last_notification: None, refreshed_at: now },
                );
            }
        }

        Ok(summary)
    }
}

fn evict_oldest(state: &mut HashMap<String, UserState>) {
    let oldest = state
        .iter()
        .min_by_key(|(_, s)| s.refreshed_at)
        .map(|(user_id, _)| user_id.clone());
    if let Some(user_id) = oldest {
        tracing::debug!(user_id = %user_id, "dropping cached cart summary");
        state.remove(&user_id);
    }
}
