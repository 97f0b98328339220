//! The derived read model.
//!
//! Entities here are projections of the event log, never written directly by
//! the issuance side. Creation-style writes are idempotent upserts keyed by
//! stable identity, so re-applying a prefix of the log converges on the same
//! state instead of duplicating entities.

use serde::{Deserialize, Serialize};
use soulbound::{Address, BaseUri, BurnAuth, CollectionName, MaxSupply, Timestamp, TokenId, TokenSymbol};
use std::collections::HashMap;

/// An address that has created at least one collection through the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// The creator's address.
    pub address: Address,
    /// Addresses of the collections this creator has deployed, in creation
    /// order.
    pub collections: Vec<Address>,
}

/// A collection as derived from its creation and configuration events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// The issuance instance's address.
    pub address: Address,
    /// The address that created and issues for this collection.
    pub creator: Address,
    /// Collection name.
    pub name: CollectionName,
    /// Collection symbol.
    pub symbol: TokenSymbol,
    /// Metadata base URI.
    pub base_uri: BaseUri,
    /// Collection image URI.
    pub image: String,
    /// Collection description.
    pub description: String,
    /// Supply cap (0 = unbounded).
    pub max_supply: MaxSupply,
    /// Default burn-authorization policy.
    pub default_burn_auth: BurnAuth,
    /// When the creation event was appended.
    pub created_at: Timestamp,
    /// Number of tokens minted so far.
    pub total_minted: u64,
}

/// An address that has received at least one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// The holder's address.
    pub address: Address,
    /// Keys of the tokens minted to this holder, in mint order.
    pub tokens: Vec<TokenKey>,
}

/// Global identity of a token: collection address plus per-collection id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    /// The collection the token belongs to.
    pub collection: Address,
    /// The token's id within that collection.
    pub token_id: TokenId,
}

/// A token as derived from the event log.
///
/// `holder` records the address the token was originally minted to. Burning
/// sets `burned` but never removes the entity; the mint is part of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The collection the token belongs to.
    pub collection: Address,
    /// The token's id within the collection.
    pub token_id: TokenId,
    /// The address the token was minted to.
    pub holder: Address,
    /// The issuer that minted it.
    pub issuer: Address,
    /// The burn policy recorded at mint time.
    pub burn_auth: BurnAuth,
    /// Whether the token is currently locked.
    pub locked: bool,
    /// Whether the token has been burned.
    pub burned: bool,
    /// When the mint event was appended.
    pub minted_at: Timestamp,
}

/// The full derived state: every entity the projector maintains.
#[derive(Debug, Clone, Default)]
pub struct ReadModel {
    creators: HashMap<Address, Creator>,
    collections: HashMap<Address, Collection>,
    holders: HashMap<Address, Holder>,
    tokens: HashMap<TokenKey, Token>,
}

impl ReadModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a collection against its creator, creating the creator on
    /// first sight. Idempotent: re-recording the same collection is a no-op.
    pub fn record_creation(&mut self, creator: Address, collection: Address) {
        let entry = self
            .creators
            .entry(creator.clone())
            .or_insert_with(|| Creator {
                address: creator,
                collections: Vec::new(),
            });
        if !entry.collections.contains(&collection) {
            entry.collections.push(collection);
        }
    }

    /// Inserts a collection unless one already exists at that address.
    /// Returns whether the insert happened.
    pub fn insert_collection_if_absent(&mut self, collection: Collection) -> bool {
        if self.collections.contains_key(&collection.address) {
            return false;
        }
        self.collections
            .insert(collection.address.clone(), collection);
        true
    }

    /// Applies an in-place update to a collection, if it exists.
    pub fn update_collection(
        &mut self,
        address: &Address,
        update: impl FnOnce(&mut Collection),
    ) -> bool {
        self.collections.get_mut(address).map(update).is_some()
    }

    /// Records a token against its holder, creating the holder on first
    /// sight. Idempotent per token key.
    pub fn record_holding(&mut self, holder: Address, key: TokenKey) {
        let entry = self.holders.entry(holder.clone()).or_insert_with(|| Holder {
            address: holder,
            tokens: Vec::new(),
        });
        if !entry.tokens.contains(&key) {
            entry.tokens.push(key);
        }
    }

    /// Inserts a token unless one already exists for that key. Returns
    /// whether the insert happened.
    pub fn insert_token_if_absent(&mut self, token: Token) -> bool {
        let key = TokenKey {
            collection: token.collection.clone(),
            token_id: token.token_id,
        };
        if self.tokens.contains_key(&key) {
            return false;
        }
        self.tokens.insert(key, token);
        true
    }

    /// Applies an in-place update to a token, if it exists.
    pub fn update_token(&mut self, key: &TokenKey, update: impl FnOnce(&mut Token)) -> bool {
        self.tokens.get_mut(key).map(update).is_some()
    }

    /// Looks up a creator by address.
    pub fn creator(&self, address: &Address) -> Option<&Creator> {
        self.creators.get(address)
    }

    /// Looks up a collection by address.
    pub fn collection(&self, address: &Address) -> Option<&Collection> {
        self.collections.get(address)
    }

    /// Looks up a holder by address.
    pub fn holder(&self, address: &Address) -> Option<&Holder> {
        self.holders.get(address)
    }

    /// Looks up a token by key.
    pub fn token(&self, key: &TokenKey) -> Option<&Token> {
        self.tokens.get(key)
    }

    /// Number of known creators.
    pub fn creator_count(&self) -> usize {
        self.creators.len()
    }

    /// Number of known collections.
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    /// Number of known holders.
    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    /// Number of known tokens, burned ones included.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// All tokens in a collection, in id order.
    pub fn collection_tokens(&self, collection: &Address) -> Vec<&Token> {
        let mut tokens: Vec<&Token> = self
            .tokens
            .values()
            .filter(|token| &token.collection == collection)
            .collect();
        tokens.sort_by_key(|token| token.token_id);
        tokens
    }
}
