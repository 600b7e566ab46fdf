//! Client-held basket for one company at a time.
//!
//! The store owns the only mutation API over the persisted cart state.
//! Every mutation persists the whole state (last-writer-wins across
//! concurrently open views) and emits a [`CartEvent`] on the broadcast
//! channel so other views of the same store can refresh. Cross-view
//! synchronization is eventual and best-effort; there is no locking.

pub mod persistence;

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::cart::{clamp_quantity, CartItem, CartState, SelectionLine};
use crate::models::product::Product;

pub use persistence::{CartPersistence, InMemoryCartStore, JsonFileCartStore};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification emitted after each persisted mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { product_id: Uuid },
    QuantityChanged { product_id: Uuid, quantity: i32 },
    ItemRemoved { product_id: Uuid },
    /// The cart was replaced wholesale because a different company's product
    /// was added.
    Replaced { company_id: Uuid },
    Cleared,
    /// State was re-read from the shared store (another view wrote it).
    Reloaded,
}

#[derive(Clone)]
pub struct CartStore {
    state: Arc<RwLock<CartState>>,
    persistence: Arc<dyn CartPersistence>,
    events: broadcast::Sender<CartEvent>,
}

impl CartStore {
    /// Opens the store, loading whatever a previous session (or another
    /// view) persisted.
    pub fn open(persistence: Arc<dyn CartPersistence>) -> Result<Self, ServiceError> {
        let state = persistence.load()?.unwrap_or_default();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            persistence,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> CartState {
        self.read().clone()
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.read().company_id
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The cart contents as submission input.
    pub fn selection(&self) -> Vec<SelectionLine> {
        self.read().items.iter().map(SelectionLine::from).collect()
    }

    /// Adds a product to the cart.
    ///
    /// Same company (or empty cart): merge with an existing line or append a
    /// new one. Different company: the cart is replaced with a single-item
    /// cart for the new company. No mixed-company baskets, no merge prompt.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&self, product: &Product, quantity: i32) -> Result<CartEvent, ServiceError> {
        let quantity = clamp_quantity(quantity, product.stock);
        let mut state = self.write();

        let event = if state.company_id.is_some() && state.company_id != Some(product.company_id) {
            info!(
                old_company = ?state.company_id,
                new_company = %product.company_id,
                "cart switched companies; replacing contents"
            );
            *state = CartState {
                items: vec![CartItem::from_product(product, quantity)],
                company_id: Some(product.company_id),
            };
            CartEvent::Replaced {
                company_id: product.company_id,
            }
        } else {
            state.company_id = Some(product.company_id);
            match state
                .items
                .iter_mut()
                .find(|item| item.product_id == product.id)
            {
                Some(item) => {
                    item.quantity = clamp_quantity(item.quantity + quantity, product.stock);
                    item.known_stock = Some(product.stock);
                }
                None => state
                    .items
                    .push(CartItem::from_product(product, quantity)),
            }
            CartEvent::ItemAdded {
                product_id: product.id,
            }
        };

        self.persist_and_emit(&state, event.clone())?;
        Ok(event)
    }

    /// Sets a line's quantity, clamped at zero; zero removes the line.
    pub fn update_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartEvent, ServiceError> {
        let quantity = quantity.max(0);
        let mut state = self.write();

        let event = if quantity == 0 {
            Self::remove_line(&mut state, product_id)
        } else {
            match state
                .items
                .iter_mut()
                .find(|item| item.product_id == product_id)
            {
                Some(item) => {
                    item.quantity = match item.known_stock {
                        Some(stock) => clamp_quantity(quantity, stock),
                        None => quantity,
                    };
                    CartEvent::QuantityChanged {
                        product_id,
                        quantity: item.quantity,
                    }
                }
                None => {
                    return Err(ServiceError::NotFound(format!(
                        "product {product_id} is not in the cart"
                    )))
                }
            }
        };

        self.persist_and_emit(&state, event.clone())?;
        Ok(event)
    }

    pub fn remove_item(&self, product_id: Uuid) -> Result<CartEvent, ServiceError> {
        let mut state = self.write();
        let event = Self::remove_line(&mut state, product_id);
        self.persist_and_emit(&state, event.clone())?;
        Ok(event)
    }

    pub fn clear(&self) -> Result<(), ServiceError> {
        let mut state = self.write();
        *state = CartState::default();
        self.persist_and_emit(&state, CartEvent::Cleared)
    }

    /// Re-reads the shared store, adopting whatever the last writer
    /// persisted. Called when another view signals a change.
    pub fn reload(&self) -> Result<(), ServiceError> {
        let fresh = self.persistence.load()?.unwrap_or_default();
        *self.write() = fresh;
        let _ = self.events.send(CartEvent::Reloaded);
        Ok(())
    }

    fn remove_line(state: &mut CartState, product_id: Uuid) -> CartEvent {
        state.items.retain(|item| item.product_id != product_id);
        if state.items.is_empty() {
            // An emptied cart may start over with any company.
            state.company_id = None;
        }
        CartEvent::ItemRemoved { product_id }
    }

    fn persist_and_emit(&self, state: &CartState, event: CartEvent) -> Result<(), ServiceError> {
        self.persistence.save(state)?;
        // No subscribers is fine; notification is best-effort.
        let _ = self.events.send(event);
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
