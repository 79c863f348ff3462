//! Cart reconciliation engine
//!
//! One uniform cart API over two backends: the device-local guest
//! cart before login, the server cart after. Every mutation funnels
//! its result through the same shared state, so consumers (cart page,
//! header badge, checkout) never know which backend served them.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, RwLock, broadcast};

use lotus_client::{CartApi, ClientError, ClientResult};
use shared::models::{CartItem, CartPayload, ProductSnapshot};
use shared::money;

use crate::cart::guest::GuestCartStore;
use crate::error::{CartError, CartResult};
use crate::session::SessionStore;
use crate::signals::{SessionSignal, SignalHub};

/// Which backend currently owns the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Guest,
    Authenticated,
}

/// Mutation classes tracked by the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Increase,
    Decrease,
    Remove,
}

/// Shared cart state consumed by every display surface.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub total_amount: f64,
    /// Product ids included in checkout totals
    pub selected: HashSet<String>,
    /// Last mutation failure, cleared by the next successful mutation
    pub error: Option<String>,
}

impl CartState {
    fn recompute(items: &[CartItem]) -> f64 {
        money::cart_total(
            items
                .iter()
                .map(|item| (item.product_id.as_str(), item.product.price, item.quantity)),
        )
    }

    /// Full reload: every line starts selected.
    pub fn replace_with(&mut self, payload: &CartPayload) {
        self.items = payload.cart_items.clone();
        self.total_amount = Self::recompute(&self.items);
        self.selected = self
            .items
            .iter()
            .map(|item| item.product_id.clone())
            .collect();
        self.error = None;
    }

    /// Mutation result: keep the shopper's selection where the line
    /// survived, drop ids whose line is gone, select lines that are
    /// new in this response.
    pub fn apply_mutation(&mut self, payload: &CartPayload) {
        let previous: HashSet<String> = self
            .items
            .iter()
            .map(|item| item.product_id.clone())
            .collect();

        self.items = payload.cart_items.clone();
        self.total_amount = Self::recompute(&self.items);

        let current: HashSet<String> = self
            .items
            .iter()
            .map(|item| item.product_id.clone())
            .collect();
        self.selected.retain(|id| current.contains(id));
        for id in current {
            if !previous.contains(&id) {
                self.selected.insert(id);
            }
        }
        self.error = None;
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    /// Subtotal over selected lines only.
    pub fn selected_subtotal(&self) -> f64 {
        money::round_money(
            self.items
                .iter()
                .filter(|item| self.selected.contains(&item.product_id))
                .map(|item| item.line_total())
                .sum(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Quantity and stock for one cart line, as display code needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineView {
    pub quantity: u32,
    pub stock: u32,
}

/// Outcome tally of a guest-to-server cart migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Removes the in-flight marker when the operation resolves.
struct PendingGuard<'a> {
    engine: &'a CartEngine,
    key: (OpKind, String),
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.engine.lock_pending().remove(&self.key);
    }
}

/// The cart subsystem's single entry point.
pub struct CartEngine {
    state: Arc<RwLock<CartState>>,
    guest: Mutex<GuestCartStore>,
    client: CartApi,
    session: SessionStore,
    pending: StdMutex<HashSet<(OpKind, String)>>,
    hub: SignalHub,
}

impl CartEngine {
    /// `store_root` is the app data directory holding both the guest
    /// cart file and the persisted session.
    pub fn new(store_root: impl AsRef<Path>, client: CartApi, hub: SignalHub) -> Self {
        let root = store_root.as_ref();
        Self {
            state: Arc::new(RwLock::new(CartState::default())),
            guest: Mutex::new(GuestCartStore::open(root)),
            client,
            session: SessionStore::new(root),
            pending: StdMutex::new(HashSet::new()),
            hub,
        }
    }

    // ============ Mode ============

    /// The session file decides the mode; the engine never writes it.
    pub fn backend_mode(&self) -> BackendMode {
        if self.session.is_authenticated() {
            BackendMode::Authenticated
        } else {
            BackendMode::Guest
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn signals(&self) -> &SignalHub {
        &self.hub
    }

    // ============ Shared state ============

    pub fn state(&self) -> Arc<RwLock<CartState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> CartState {
        self.state.read().await.clone()
    }

    pub async fn item_quantity(&self, product_id: &str) -> u32 {
        self.state.read().await.quantity_of(product_id)
    }

    pub async fn line_view(&self, product_id: &str) -> Option<LineView> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| LineView {
                quantity: item.quantity,
                stock: item.product.stock,
            })
    }

    async fn record_error(&self, message: String) {
        self.state.write().await.error = Some(message);
    }

    /// 401 handling: wipe cart state and tell the rest of the app.
    /// Credential storage itself belongs to the auth layer.
    async fn expire_session(&self) {
        tracing::warn!("backend rejected the session token, clearing cart state");
        *self.state.write().await = CartState::default();
        self.hub.emit(SessionSignal::Unauthorized);
    }

    // ============ In-flight guard ============

    fn lock_pending(&self) -> MutexGuard<'_, HashSet<(OpKind, String)>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim the (kind, product) slot. `None` means the same mutation
    /// is still in flight and this call must be dropped, not queued.
    fn try_begin(&self, kind: OpKind, product_id: &str) -> Option<PendingGuard<'_>> {
        let key = (kind, product_id.to_string());
        if !self.lock_pending().insert(key.clone()) {
            tracing::debug!(?kind, product_id, "mutation already in flight, ignoring");
            return None;
        }
        Some(PendingGuard { engine: self, key })
    }

    // ============ Uniform operations ============

    pub async fn add_to_cart(&self, product: &ProductSnapshot, quantity: u32) -> CartResult<()> {
        let Some(_guard) = self.try_begin(OpKind::Add, &product.id) else {
            return Ok(());
        };

        match self.backend_mode() {
            BackendMode::Authenticated => {
                let result = self.client.add_item(&product.id, quantity).await;
                self.apply_auth_mutation(result).await
            }
            BackendMode::Guest => {
                self.run_guest(|store| store.add_item(product, quantity))
                    .await
            }
        }
    }

    pub async fn increase_quantity(&self, product_id: &str, amount: u32) -> CartResult<()> {
        let Some(_guard) = self.try_begin(OpKind::Increase, product_id) else {
            return Ok(());
        };

        match self.backend_mode() {
            BackendMode::Authenticated => {
                let result = self.client.increase_item(product_id, amount).await;
                self.apply_auth_mutation(result).await
            }
            BackendMode::Guest => {
                self.run_guest(|store| store.increase_quantity(product_id, amount))
                    .await
            }
        }
    }

    pub async fn decrease_quantity(&self, product_id: &str, amount: u32) -> CartResult<()> {
        let Some(_guard) = self.try_begin(OpKind::Decrease, product_id) else {
            return Ok(());
        };

        match self.backend_mode() {
            BackendMode::Authenticated => {
                let result = self.client.decrease_item(product_id, amount).await;
                self.apply_auth_mutation(result).await
            }
            BackendMode::Guest => {
                self.run_guest(|store| store.decrease_quantity(product_id, amount))
                    .await
            }
        }
    }

    pub async fn remove_item(&self, product_id: &str) -> CartResult<()> {
        let Some(_guard) = self.try_begin(OpKind::Remove, product_id) else {
            return Ok(());
        };

        match self.backend_mode() {
            BackendMode::Authenticated => match self.client.remove_item(product_id).await {
                // removing a line the server no longer has is not
                // worth surfacing
                Err(ClientError::NotFound(message)) => {
                    tracing::debug!(product_id, "remove on missing line: {}", message);
                    Ok(())
                }
                result => self.apply_auth_mutation(result).await,
            },
            BackendMode::Guest => self.run_guest(|store| store.remove_item(product_id)).await,
        }
    }

    pub async fn clear_cart(&self) -> CartResult<()> {
        match self.backend_mode() {
            BackendMode::Authenticated => {
                let result = self.client.clear().await;
                self.apply_auth_mutation(result).await
            }
            BackendMode::Guest => self.run_guest(|store| store.clear()).await,
        }
    }

    pub async fn refresh_cart(&self) -> CartResult<()> {
        match self.backend_mode() {
            BackendMode::Authenticated => match self.client.view().await {
                Ok(payload) => {
                    self.state.write().await.replace_with(&payload);
                    Ok(())
                }
                Err(err) => self.absorb_auth_error(err).await,
            },
            BackendMode::Guest => {
                let payload = {
                    let mut store = self.guest.lock().await;
                    store.reload();
                    store.cart().to_payload()
                };
                self.state.write().await.replace_with(&payload);
                Ok(())
            }
        }
    }

    /// Guest mutations never bubble an error to the caller; the
    /// failure lands in shared state for the UI to surface.
    async fn run_guest<F>(&self, op: F) -> CartResult<()>
    where
        F: FnOnce(&mut GuestCartStore) -> CartResult<shared::models::GuestCart>,
    {
        let outcome = {
            let mut store = self.guest.lock().await;
            op(&mut store)
        };

        match outcome {
            Ok(cart) => {
                self.state.write().await.apply_mutation(&cart.to_payload());
                Ok(())
            }
            Err(err) => {
                tracing::warn!("guest cart mutation failed: {}", err);
                self.record_error(err.to_string()).await;
                Ok(())
            }
        }
    }

    async fn apply_auth_mutation(&self, result: ClientResult<CartPayload>) -> CartResult<()> {
        match result {
            Ok(payload) => {
                self.state.write().await.apply_mutation(&payload);
                Ok(())
            }
            Err(err) => self.absorb_auth_error(err).await,
        }
    }

    /// Server-side failures are recorded and re-thrown, except a 401
    /// which is terminal for the session and absorbed here.
    async fn absorb_auth_error(&self, err: ClientError) -> CartResult<()> {
        match err {
            ClientError::Unauthorized => {
                self.expire_session().await;
                Ok(())
            }
            other => {
                let err = CartError::from(other);
                self.record_error(err.to_string()).await;
                Err(err)
            }
        }
    }

    // ============ Selection ============

    /// Flip one line's checkout membership. Unknown ids are ignored
    /// so the selection never references a missing line.
    pub async fn toggle_item_selection(&self, product_id: &str) {
        let mut state = self.state.write().await;
        if !state.items.iter().any(|item| item.product_id == product_id) {
            return;
        }
        if !state.selected.remove(product_id) {
            state.selected.insert(product_id.to_string());
        }
    }

    pub async fn select_all_items(&self, selected: bool) {
        let mut state = self.state.write().await;
        if selected {
            state.selected = state
                .items
                .iter()
                .map(|item| item.product_id.clone())
                .collect();
        } else {
            state.selected.clear();
        }
    }

    pub async fn selected_subtotal(&self) -> f64 {
        self.state.read().await.selected_subtotal()
    }

    // ============ Migration ============

    /// Move the guest cart into the server cart after login.
    ///
    /// Lines already present server-side are skipped, never summed.
    /// Per-line failures do not abort the rest. The guest cart is
    /// cleared only when at least one line migrated or was skipped,
    /// so a fully failed run loses nothing.
    pub async fn migrate_guest_cart(&self) -> CartResult<MigrationReport> {
        let guest_lines = {
            let store = self.guest.lock().await;
            store.cart().items.clone()
        };
        if guest_lines.is_empty() {
            tracing::debug!("guest cart is empty, nothing to migrate");
            return Ok(MigrationReport::default());
        }

        let server_payload = match self.client.view().await {
            Ok(payload) => payload,
            Err(ClientError::Unauthorized) => {
                self.expire_session().await;
                return Ok(MigrationReport::default());
            }
            Err(err) => {
                let err = CartError::from(err);
                self.record_error(err.to_string()).await;
                return Err(err);
            }
        };
        let server_ids: HashSet<&str> = server_payload
            .cart_items
            .iter()
            .map(|item| item.product_id.as_str())
            .collect();

        let mut report = MigrationReport::default();
        for line in &guest_lines {
            if server_ids.contains(line.product_id.as_str()) {
                tracing::debug!(product_id = %line.product_id, "already in server cart, skipping");
                report.skipped += 1;
                continue;
            }
            match self.client.add_item(&line.product_id, line.quantity).await {
                Ok(_) => report.migrated += 1,
                Err(ClientError::Unauthorized) => {
                    // session died mid-migration; keep the guest cart
                    // so nothing is lost
                    self.expire_session().await;
                    return Ok(report);
                }
                Err(err) => {
                    tracing::warn!(product_id = %line.product_id, "failed to migrate line: {}", err);
                    report.failed += 1;
                }
            }
        }

        if report.migrated + report.skipped > 0 {
            let mut store = self.guest.lock().await;
            if let Err(err) = store.clear() {
                tracing::warn!("failed to clear guest cart after migration: {}", err);
            }
        } else {
            tracing::warn!("every line failed to migrate, keeping the guest cart");
        }

        tracing::info!(
            migrated = report.migrated,
            skipped = report.skipped,
            failed = report.failed,
            "guest cart migration finished"
        );

        self.refresh_cart().await?;
        Ok(report)
    }

    // ============ Session transitions ============

    /// Run at startup: pick up a persisted token and load whichever
    /// cart the mode points at.
    pub async fn bootstrap(&self) -> CartResult<()> {
        self.client.transport().set_token(self.session.token()).await;
        self.refresh_cart().await
    }

    /// Token became available: migrate the guest cart, or just pull
    /// the server cart when there is nothing to migrate.
    pub async fn handle_login(&self) -> CartResult<MigrationReport> {
        self.client.transport().set_token(self.session.token()).await;

        let guest_empty = self.guest.lock().await.is_empty();
        if guest_empty {
            self.refresh_cart().await?;
            Ok(MigrationReport::default())
        } else {
            self.migrate_guest_cart().await
        }
    }

    /// Session ended deliberately: drop the token and show whatever
    /// the guest cart file holds.
    pub async fn handle_logout(&self) -> CartResult<()> {
        self.client.transport().set_token(None).await;

        let payload = {
            let mut store = self.guest.lock().await;
            store.reload();
            store.cart().to_payload()
        };
        self.state.write().await.replace_with(&payload);
        Ok(())
    }

    pub async fn handle_signal(&self, signal: SessionSignal) {
        let outcome = match signal {
            SessionSignal::LoggedIn => self.handle_login().await.map(|_| ()),
            SessionSignal::LoggedOut => self.handle_logout().await,
            SessionSignal::Unauthorized => {
                *self.state.write().await = CartState::default();
                Ok(())
            }
        };
        if let Err(err) = outcome {
            tracing::warn!("failed to apply session signal {:?}: {}", signal, err);
        }
    }

    /// Drive the engine from a signal subscription. Spawn this once.
    pub async fn run_signal_loop(self: Arc<Self>, mut rx: broadcast::Receiver<SessionSignal>) {
        loop {
            match rx.recv().await {
                Ok(signal) => self.handle_signal(signal).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("signal loop lagged, missed {} signals", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
