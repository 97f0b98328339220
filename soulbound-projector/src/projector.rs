//! The projection logic: one function from recorded event to model delta.
//!
//! Application is infallible by construction. An event that cannot be
//! applied - unknown token, already burned, source never legitimized - is
//! logged and skipped rather than failing the run: the log is the source of
//! truth and a projector must be able to replay all of it.

use crate::model::{Collection, ReadModel, Token, TokenKey};
use crate::registry::{Route, SubscriptionManager};
use soulbound::event::{
    BaseUriSet, DefaultBurnAuthSet, Issued, Locked, MaxSupplySet, SbtCreated, Transfer, Unlocked,
};
use soulbound::{Address, DomainEvent, RecordedEvent, TokenId};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Applies recorded events to a [`ReadModel`], discovering issuance
/// instances through a [`SubscriptionManager`] as it goes.
#[derive(Debug, Clone)]
pub struct Projector {
    registry: SubscriptionManager,
    model: ReadModel,
}

impl Projector {
    /// Creates a projector rooted at the given factory address.
    pub fn new(factory: Address) -> Self {
        Self {
            registry: SubscriptionManager::new(factory),
            model: ReadModel::new(),
        }
    }

    /// The derived state accumulated so far.
    pub fn model(&self) -> &ReadModel {
        &self.model
    }

    /// The subscription state.
    pub fn registry(&self) -> &SubscriptionManager {
        &self.registry
    }

    /// Applies one recorded event.
    ///
    /// Events from untracked sources are buffered inside the registry; when
    /// a creation event legitimizes a source, its buffered events are
    /// applied immediately, in their original order, before this call
    /// returns.
    pub fn apply(&mut self, event: &RecordedEvent) {
        let mut queue = VecDeque::new();
        match self.registry.route(event.clone()) {
            Route::Apply(event) => queue.push_back(event),
            Route::Deferred => return,
        }
        while let Some(event) = queue.pop_front() {
            if let Some(new_source) = self.apply_tracked(&event) {
                queue.extend(self.registry.track(new_source));
            }
        }
    }

    /// Applies an event whose source is already tracked. Returns the
    /// address of a newly legitimized source, if the event introduced one.
    fn apply_tracked(&mut self, event: &RecordedEvent) -> Option<Address> {
        match &event.payload {
            DomainEvent::SbtCreated(payload) => return self.apply_created(event, payload),
            DomainEvent::Issued(payload) => self.apply_issued(event, payload),
            DomainEvent::Locked(Locked { token_id }) => {
                self.set_locked(&event.source, *token_id, true);
            }
            DomainEvent::Unlocked(Unlocked { token_id }) => {
                self.set_locked(&event.source, *token_id, false);
            }
            DomainEvent::Transfer(payload) => self.apply_transfer(event, payload),
            DomainEvent::BaseUriSet(payload) => self.apply_base_uri_set(event, payload),
            DomainEvent::MaxSupplySet(MaxSupplySet { max_supply }) => {
                let max_supply = *max_supply;
                self.update_collection_or_warn(event, move |collection| {
                    collection.max_supply = max_supply;
                });
            }
            DomainEvent::DefaultBurnAuthSet(DefaultBurnAuthSet { burn_auth }) => {
                let burn_auth = *burn_auth;
                self.update_collection_or_warn(event, move |collection| {
                    collection.default_burn_auth = burn_auth;
                });
            }
            DomainEvent::CreationFeeSet(_) | DomainEvent::FeesWithdrawn(_) => {
                // Factory bookkeeping; no derived entity carries it.
                debug!(kind = event.payload.kind(), "ignoring factory admin event");
            }
        }
        None
    }

    fn apply_created(&mut self, event: &RecordedEvent, payload: &SbtCreated) -> Option<Address> {
        self.model
            .record_creation(payload.creator.clone(), payload.sbt_address.clone());
        let inserted = self.model.insert_collection_if_absent(Collection {
            address: payload.sbt_address.clone(),
            creator: payload.creator.clone(),
            name: payload.name.clone(),
            symbol: payload.symbol.clone(),
            base_uri: payload.base_uri.clone(),
            image: payload.image.clone(),
            description: payload.description.clone(),
            max_supply: payload.max_supply,
            default_burn_auth: payload.default_burn_auth,
            created_at: event.timestamp,
            total_minted: 0,
        });
        if !inserted {
            debug!(collection = %payload.sbt_address, "collection already projected");
        }
        Some(payload.sbt_address.clone())
    }

    fn apply_issued(&mut self, event: &RecordedEvent, payload: &Issued) {
        let token = Token {
            collection: event.source.clone(),
            token_id: payload.token_id,
            holder: payload.holder.clone(),
            issuer: payload.issuer.clone(),
            burn_auth: payload.burn_auth,
            locked: true,
            burned: false,
            minted_at: event.timestamp,
        };
        if self.model.insert_token_if_absent(token) {
            self.model.record_holding(
                payload.holder.clone(),
                TokenKey {
                    collection: event.source.clone(),
                    token_id: payload.token_id,
                },
            );
            self.model.update_collection(&event.source, |collection| {
                collection.total_minted += 1;
            });
        } else {
            debug!(collection = %event.source, token_id = %payload.token_id, "mint already projected");
        }
    }

    fn apply_transfer(&mut self, event: &RecordedEvent, payload: &Transfer) {
        if !payload.to.is_zero() {
            // Live ownership is the instance's authority; the derived token
            // keeps its original holder as provenance.
            debug!(collection = %event.source, token_id = %payload.token_id, "non-burn transfer");
            return;
        }
        let key = TokenKey {
            collection: event.source.clone(),
            token_id: payload.token_id,
        };
        let updated = self.model.update_token(&key, |token| token.burned = true);
        if !updated {
            warn!(collection = %event.source, token_id = %payload.token_id, "burn for unknown token skipped");
        }
    }

    fn apply_base_uri_set(&mut self, event: &RecordedEvent, payload: &BaseUriSet) {
        let payload = payload.clone();
        self.update_collection_or_warn(event, move |collection| {
            collection.base_uri = payload.base_uri;
            collection.image = payload.image;
            collection.description = payload.description;
        });
    }

    fn set_locked(&mut self, collection: &Address, token_id: TokenId, locked: bool) {
        let key = TokenKey {
            collection: collection.clone(),
            token_id,
        };
        let updated = self.model.update_token(&key, |token| {
            if !token.burned {
                token.locked = locked;
            }
        });
        if !updated {
            warn!(%collection, %token_id, "lock update for unknown token skipped");
        }
    }

    fn update_collection_or_warn(
        &mut self,
        event: &RecordedEvent,
        update: impl FnOnce(&mut Collection),
    ) {
        if !self.model.update_collection(&event.source, update) {
            warn!(
                collection = %event.source,
                kind = event.payload.kind(),
                "configuration update for unknown collection skipped"
            );
        }
    }
}
