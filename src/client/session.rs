use std::{fmt::Display, str::FromStr};

use futures_util::future::join_all;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{domain::{pricing::round_money, Quantity}, models::CartItem, routes::cart::AddCartItemBody};

use super::{
    availability::BackendAvailability,
    catalog::{Catalog, CatalogProduct},
    queue::{CartAction, SyncOperation},
    remote::{Credentials, RemoteCart, RemoteError},
    storage::{clear_guest_cart, load_guest_cart, load_sync_queue, save_guest_cart, save_sync_queue, GuestCartEntry, LocalStorage}
};

/// Identifies a line on the read path. Local lines are keyed by product and
/// variant and render as `guest_<product>_<variant|base>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartItemId{
    Remote(Uuid),
    Local{ product_id: Uuid, variant_id: Option<Uuid> }
}

impl Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartItemId::Remote(id) => write!(f, "{}", id),
            CartItemId::Local{ product_id, variant_id: Some(variant_id) } => write!(f, "guest_{}_{}", product_id, variant_id),
            CartItemId::Local{ product_id, variant_id: None } => write!(f, "guest_{}_base", product_id)
        }
    }
}

impl FromStr for CartItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("{} is not a cart item id", s);

        let Some(key) = s.strip_prefix("guest_") else {
            return Uuid::parse_str(s).map(CartItemId::Remote).map_err(|_| invalid());
        };

        let (product, variant) = key.split_once('_').ok_or_else(invalid)?;
        let product_id = Uuid::parse_str(product).map_err(|_| invalid())?;
        let variant_id = match variant {
            "base" => None,
            other => Some(Uuid::parse_str(other).map_err(|_| invalid())?)
        };

        Ok(CartItemId::Local{ product_id, variant_id })
    }
}

/// Line of the cart as the storefront shows it
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine{
    pub id: CartItemId,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub product: Option<CatalogProduct>
}

/// Where a cart change ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome{
    /// Accepted by the server
    Synced,
    /// Waiting in the sync queue
    Queued,
    /// Written to the guest cart
    SavedLocally,
    /// The item was not found in the cart
    Unchanged
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport{
    pub migrated: usize,
    pub requeued: usize,
    /// Left in the guest cart because the server has no cart to take them
    pub kept: usize
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport{
    pub replayed: usize,
    pub dropped: usize,
    pub remaining: usize
}

/// Storefront cart. Guests keep their cart in local storage; signed-in
/// buyers use the server, with changes made while offline or during an
/// outage parked in the sync queue until the server takes them. When the
/// server has no cart routes at all, signed-in buyers keep using the guest
/// cart until a refresh finds the service again.
pub struct CartSession<S, R>{
    storage: S,
    remote: R,
    catalog: Catalog,
    availability: BackendAvailability,
    online: bool,
    credentials: Option<Credentials>,
    snapshot: Vec<CartItem>
}

impl<S: LocalStorage, R: RemoteCart> CartSession<S, R> {
    pub fn new(storage: S, remote: R, catalog: Catalog, availability: BackendAvailability) -> Self{
        CartSession{
            storage,
            remote,
            catalog,
            availability,
            online: true,
            credentials: None,
            snapshot: Vec::new()
        }
    }

    pub fn storage(&self) -> &S{
        &self.storage
    }

    pub fn is_authenticated(&self) -> bool{
        self.credentials.is_some()
    }

    pub fn is_online(&self) -> bool{
        self.online
    }

    fn local_only(&self) -> bool{
        !self.availability.is_available()
    }

    // Outages are retried on the next call; only a missing cart service
    // switches the session to the guest cart
    fn note_failure(&self, error: &RemoteError){
        if matches!(error, RemoteError::NotProvisioned(_)) {
            self.availability.mark_unavailable();
        }
    }

    fn enqueue(&self, user_id: Uuid, action: CartAction){
        let mut queue = load_sync_queue(&self.storage);
        queue.push(SyncOperation::new(user_id, action));
        save_sync_queue(&self.storage, &queue);
    }

    fn pending_operations(&self, user_id: Uuid) -> Vec<SyncOperation>{
        load_sync_queue(&self.storage)
            .into_iter()
            .filter(|op| op.user_id == user_id)
            .collect()
    }

    fn upsert_snapshot(&mut self, item: CartItem){
        match self.snapshot.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.snapshot.push(item)
        }
    }

    fn merge_guest_entry(&self, product_id: Uuid, variant_id: Option<Uuid>, quantity: Quantity){
        let mut cart = load_guest_cart(&self.storage);
        match cart.iter_mut().find(|e| e.product_id == product_id && e.variant_id == variant_id) {
            Some(entry) => {
                let merged = entry.quantity.saturating_add(quantity);
                if merged.get() < entry.quantity.get() + quantity.get() {
                    tracing::warn!(%product_id, quantity = merged.get(), "Guest cart line capped at the per-line maximum");
                }
                entry.quantity = merged;
            },
            None => cart.push(GuestCartEntry{ product_id, variant_id, quantity })
        }
        save_guest_cart(&self.storage, &cart);
    }

    // Returns false when no guest entry has the key
    fn set_guest_quantity(&self, product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> bool{
        let mut cart = load_guest_cart(&self.storage);
        let Some(index) = cart.iter().position(|e| e.product_id == product_id && e.variant_id == variant_id) else {
            return false;
        };

        if quantity <= 0 {
            cart.remove(index);
        } else {
            cart[index].quantity = Quantity::saturating(quantity);
        }
        save_guest_cart(&self.storage, &cart);
        true
    }

    // Folds every queued add for the key into the first one, which then
    // carries `quantity`
    fn set_pending_add_quantity(&self, user_id: Uuid, product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> bool{
        let mut queue = load_sync_queue(&self.storage);
        let Some(first) = queue.iter().position(|op| op.is_pending_add_for(user_id, product_id, variant_id)) else {
            return false;
        };

        let mut index = 0;
        queue.retain(|op| {
            let keep = index == first || !op.is_pending_add_for(user_id, product_id, variant_id);
            index += 1;
            keep
        });

        if quantity <= 0 {
            queue.remove(first);
        } else if let CartAction::Add{ quantity: pending, .. } = &mut queue[first].action {
            *pending = Quantity::saturating(quantity);
        }
        save_sync_queue(&self.storage, &queue);
        true
    }

    #[tracing::instrument("Adding to cart", skip(self), fields(authenticated = self.is_authenticated()))]
    pub async fn add_to_cart(&mut self, product_id: Uuid, variant_id: Option<Uuid>, quantity: Quantity) -> CartOutcome{
        let Some(credentials) = self.credentials.clone().filter(|_| !self.local_only()) else {
            self.merge_guest_entry(product_id, variant_id, quantity);
            return CartOutcome::SavedLocally;
        };

        if self.online {
            let body = AddCartItemBody{ product_id, variant_id, quantity: quantity.get() };
            match self.remote.add(&credentials, &body).await {
                Ok(item) => {
                    self.upsert_snapshot(item);
                    return CartOutcome::Synced;
                },
                Err(e) => {
                    tracing::warn!(error = ?e, "Remote add failed");
                    self.note_failure(&e);
                    if self.local_only() {
                        self.merge_guest_entry(product_id, variant_id, quantity);
                        return CartOutcome::SavedLocally;
                    }
                }
            }
        }

        self.enqueue(credentials.user_id, CartAction::Add{ product_id, variant_id, quantity });
        CartOutcome::Queued
    }

    /// A quantity of zero or less removes the line
    #[tracing::instrument("Updating cart quantity", skip(self), fields(item = %id))]
    pub async fn update_quantity(&mut self, id: CartItemId, quantity: i32) -> CartOutcome{
        if quantity <= 0 {
            return self.remove_from_cart(id).await;
        }

        match id {
            CartItemId::Local{ product_id, variant_id } => self.update_local(product_id, variant_id, quantity),
            CartItemId::Remote(cart_item_id) => {
                let Some(credentials) = self.credentials.clone().filter(|_| !self.local_only()) else {
                    return CartOutcome::Unchanged;
                };

                if self.online {
                    match self.remote.update(&credentials, cart_item_id, quantity).await {
                        Ok(Some(item)) => {
                            self.upsert_snapshot(item);
                            return CartOutcome::Synced;
                        },
                        Ok(None) => {
                            self.snapshot.retain(|item| item.id != cart_item_id);
                            return CartOutcome::Synced;
                        },
                        Err(e) => {
                            tracing::warn!(error = ?e, "Remote update failed");
                            self.note_failure(&e);
                            if self.local_only() {
                                return CartOutcome::Unchanged;
                            }
                        }
                    }
                }

                self.enqueue(credentials.user_id, CartAction::Update{ cart_item_id, quantity });
                CartOutcome::Queued
            }
        }
    }

    #[tracing::instrument("Removing from cart", skip(self), fields(item = %id))]
    pub async fn remove_from_cart(&mut self, id: CartItemId) -> CartOutcome{
        match id {
            CartItemId::Local{ product_id, variant_id } => self.update_local(product_id, variant_id, 0),
            CartItemId::Remote(cart_item_id) => {
                let Some(credentials) = self.credentials.clone().filter(|_| !self.local_only()) else {
                    return CartOutcome::Unchanged;
                };

                if self.online {
                    match self.remote.remove(&credentials, cart_item_id).await {
                        Ok(()) => {
                            self.snapshot.retain(|item| item.id != cart_item_id);
                            return CartOutcome::Synced;
                        },
                        Err(e) => {
                            tracing::warn!(error = ?e, "Remote removal failed");
                            self.note_failure(&e);
                            if self.local_only() {
                                return CartOutcome::Unchanged;
                            }
                        }
                    }
                }

                self.enqueue(credentials.user_id, CartAction::Remove{ cart_item_id });
                CartOutcome::Queued
            }
        }
    }

    // Local ids name either a guest entry or, for a signed-in buyer, an add
    // still waiting in the sync queue.
    fn update_local(&self, product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> CartOutcome{
        if let Some(credentials) = &self.credentials {
            if self.set_pending_add_quantity(credentials.user_id, product_id, variant_id, quantity) {
                return CartOutcome::Queued;
            }
        }

        if self.set_guest_quantity(product_id, variant_id, quantity) {
            CartOutcome::SavedLocally
        } else {
            CartOutcome::Unchanged
        }
    }

    #[tracing::instrument("Clearing cart", skip(self))]
    pub async fn clear_cart(&mut self) -> CartOutcome{
        let Some(credentials) = self.credentials.clone().filter(|_| !self.local_only()) else {
            clear_guest_cart(&self.storage);
            return CartOutcome::SavedLocally;
        };

        if self.online {
            match self.remote.clear(&credentials).await {
                Ok(()) => {
                    self.snapshot.clear();
                    let mut queue = load_sync_queue(&self.storage);
                    queue.retain(|op| op.user_id != credentials.user_id);
                    save_sync_queue(&self.storage, &queue);
                    return CartOutcome::Synced;
                },
                Err(e) => {
                    tracing::warn!(error = ?e, "Remote clear failed");
                    self.note_failure(&e);
                    if self.local_only() {
                        clear_guest_cart(&self.storage);
                        return CartOutcome::SavedLocally;
                    }
                }
            }
        }

        self.enqueue(credentials.user_id, CartAction::Clear);
        CartOutcome::Queued
    }

    /// Signs the buyer in and moves the guest cart to the server. Entries the
    /// server did not take are queued and the guest cart is emptied. If the
    /// server has no cart service the guest cart is left as it is.
    #[tracing::instrument("Logging in to cart", skip(self, credentials), fields(user_id = %credentials.user_id))]
    pub async fn login(&mut self, credentials: Credentials) -> MigrationReport{
        self.credentials = Some(credentials.clone());
        self.snapshot.clear();

        if self.local_only() && (!self.online || self.fetch_snapshot(&credentials).await.is_err()) {
            tracing::info!("Cart service not available, keeping the guest cart");
            return MigrationReport::default();
        }

        let report = self.migrate_guest_cart(&credentials).await;

        if self.online {
            self.process_sync_queue().await;
        }
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = ?e, "Could not load remote cart after login");
        }

        report
    }

    #[tracing::instrument("Migrating guest cart", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn migrate_guest_cart(&mut self, credentials: &Credentials) -> MigrationReport{
        let entries = load_guest_cart(&self.storage);
        let mut report = MigrationReport::default();
        if entries.is_empty() {
            return report;
        }

        let results: Vec<Option<Result<CartItem, RemoteError>>> = if self.online {
            let remote = &self.remote;
            join_all(entries.iter().map(|entry| async move {
                let body = AddCartItemBody{
                    product_id: entry.product_id,
                    variant_id: entry.variant_id,
                    quantity: entry.quantity.get()
                };
                remote.add(credentials, &body).await
            }))
            .await
            .into_iter()
            .map(Some)
            .collect()
        } else {
            entries.iter().map(|_| None).collect()
        };

        let mut queue = load_sync_queue(&self.storage);
        let mut kept = Vec::new();
        for (entry, result) in entries.into_iter().zip(results) {
            match result {
                Some(Ok(_)) => report.migrated += 1,
                Some(Err(e @ RemoteError::NotProvisioned(_))) => {
                    self.note_failure(&e);
                    kept.push(entry);
                    report.kept += 1;
                },
                failed => {
                    if let Some(Err(e)) = failed {
                        tracing::error!(error = ?e, product_id = %entry.product_id, "Failed to migrate guest cart entry");
                    }
                    queue.push(SyncOperation::new(credentials.user_id, CartAction::Add{
                        product_id: entry.product_id,
                        variant_id: entry.variant_id,
                        quantity: entry.quantity
                    }));
                    report.requeued += 1;
                }
            }
        }
        save_sync_queue(&self.storage, &queue);
        if kept.is_empty() {
            clear_guest_cart(&self.storage);
        } else {
            save_guest_cart(&self.storage, &kept);
        }

        tracing::info!(migrated = report.migrated, requeued = report.requeued, kept = report.kept, "Guest cart migrated");
        report
    }

    pub fn logout(&mut self){
        self.credentials = None;
        self.snapshot.clear();
    }

    async fn fetch_snapshot(&mut self, credentials: &Credentials) -> Result<(), RemoteError>{
        match self.remote.fetch(credentials).await {
            Ok(items) => {
                self.availability.mark_available();
                self.snapshot = items;
                Ok(())
            },
            Err(e) => {
                self.note_failure(&e);
                Err(e)
            }
        }
    }

    /// Reloads the server snapshot. When the cart service was missing and
    /// answers again, the guest cart moves to it and the queue is replayed.
    #[tracing::instrument("Refreshing cart", skip(self))]
    pub async fn refresh(&mut self) -> Result<(), RemoteError>{
        let Some(credentials) = self.credentials.clone() else {
            return Ok(());
        };
        if !self.online {
            return Ok(());
        }

        let was_local = self.local_only();
        self.fetch_snapshot(&credentials).await?;

        if was_local {
            tracing::info!("Cart service is back, moving the local cart to it");
            self.migrate_guest_cart(&credentials).await;
            self.process_sync_queue().await;
            self.fetch_snapshot(&credentials).await?;
        }
        Ok(())
    }

    /// Records a connectivity change; coming back online replays the queue
    pub async fn set_online(&mut self, online: bool){
        let was_online = std::mem::replace(&mut self.online, online);
        if online && !was_online {
            tracing::info!("Connection restored, processing sync queue");
            self.process_sync_queue().await;
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = ?e, "Could not reload remote cart");
            }
        }
    }

    /// Replays this buyer's queued operations in order. Each operation leaves
    /// the queue once the server accepts it and its result lands in the
    /// snapshot; a transient failure stops the replay and keeps the rest.
    /// Operations the server refuses outright are dropped.
    #[tracing::instrument("Processing sync queue", skip(self))]
    pub async fn process_sync_queue(&mut self) -> SyncReport{
        let mut report = SyncReport::default();
        let Some(credentials) = self.credentials.clone() else {
            return report;
        };
        if !self.online || self.local_only() {
            return report;
        }

        for op in self.pending_operations(credentials.user_id) {
            let result = match op.action {
                CartAction::Add{ product_id, variant_id, quantity } => {
                    let body = AddCartItemBody{ product_id, variant_id, quantity: quantity.get() };
                    let added = self.remote.add(&credentials, &body).await;
                    added.map(|item| self.upsert_snapshot(item))
                },
                CartAction::Update{ cart_item_id, quantity } => {
                    let updated = self.remote.update(&credentials, cart_item_id, quantity).await;
                    updated.map(|item| match item {
                        Some(item) => self.upsert_snapshot(item),
                        None => self.snapshot.retain(|existing| existing.id != cart_item_id)
                    })
                },
                CartAction::Remove{ cart_item_id } => {
                    let removed = self.remote.remove(&credentials, cart_item_id).await;
                    removed.map(|()| self.snapshot.retain(|existing| existing.id != cart_item_id))
                },
                CartAction::Clear => {
                    let cleared = self.remote.clear(&credentials).await;
                    cleared.map(|()| self.snapshot.clear())
                }
            };

            match result {
                Ok(()) => {
                    self.availability.mark_available();
                    report.replayed += 1;
                },
                Err(e) if e.is_transient() || matches!(e, RemoteError::NotProvisioned(_)) => {
                    tracing::warn!(error = ?e, op_id = %op.op_id, "Sync stopped, will retry later");
                    self.note_failure(&e);
                    break;
                },
                Err(e) => {
                    tracing::warn!(error = ?e, op_id = %op.op_id, "Dropping operation refused by the server");
                    report.dropped += 1;
                }
            }

            let mut queue = load_sync_queue(&self.storage);
            queue.retain(|queued| queued.op_id != op.op_id);
            save_sync_queue(&self.storage, &queue);
        }

        report.remaining = self.pending_operations(credentials.user_id).len();
        if report.replayed > 0 {
            tracing::info!(replayed = report.replayed, remaining = report.remaining, "Sync queue processed");
        }
        report
    }

    fn line(&self, id: CartItemId, product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> CartLine{
        CartLine{
            id,
            product_id,
            variant_id,
            quantity,
            product: self.catalog.get(product_id).cloned()
        }
    }

    fn guest_lines(&self) -> Vec<CartLine>{
        load_guest_cart(&self.storage)
            .into_iter()
            .map(|e| self.line(
                CartItemId::Local{ product_id: e.product_id, variant_id: e.variant_id },
                e.product_id,
                e.variant_id,
                e.quantity.get()
            ))
            .collect()
    }

    /// Current cart contents: the guest cart for guests or when the server has
    /// no cart service, otherwise the server snapshot with queued changes
    /// applied on top. Outages do not hide either of them.
    pub fn items(&self) -> Vec<CartLine>{
        let Some(credentials) = &self.credentials else {
            return self.guest_lines();
        };
        if self.local_only() {
            return self.guest_lines();
        }

        let mut lines: Vec<CartLine> = self.snapshot
            .iter()
            .map(|item| self.line(CartItemId::Remote(item.id), item.product_id, item.variant_id, item.quantity))
            .collect();

        for op in self.pending_operations(credentials.user_id) {
            match op.action {
                CartAction::Add{ product_id, variant_id, quantity } => {
                    match lines.iter_mut().find(|l| l.product_id == product_id && l.variant_id == variant_id) {
                        Some(line) => line.quantity = Quantity::saturating(line.quantity).saturating_add(quantity).get(),
                        None => lines.push(self.line(
                            CartItemId::Local{ product_id, variant_id },
                            product_id,
                            variant_id,
                            quantity.get()
                        ))
                    }
                },
                CartAction::Update{ cart_item_id, quantity } => {
                    if quantity <= 0 {
                        lines.retain(|l| l.id != CartItemId::Remote(cart_item_id));
                    } else if let Some(line) = lines.iter_mut().find(|l| l.id == CartItemId::Remote(cart_item_id)) {
                        line.quantity = quantity;
                    }
                },
                CartAction::Remove{ cart_item_id } => lines.retain(|l| l.id != CartItemId::Remote(cart_item_id)),
                CartAction::Clear => lines.clear()
            }
        }

        lines
    }

    pub fn item_count(&self) -> i64{
        self.items().iter().map(|l| i64::from(l.quantity)).sum()
    }

    /// Priced from the catalog snapshot; unknown products count as zero
    pub fn subtotal(&self) -> Decimal{
        let total: Decimal = self.items()
            .iter()
            .map(|l| l.product.as_ref().map_or(Decimal::ZERO, |p| p.price) * Decimal::from(l.quantity))
            .sum();
        round_money(total)
    }
}
