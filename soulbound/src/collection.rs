//! The per-organization issuance state machine.
//!
//! A `MembershipCollection` owns its token ledger, supply counter, per-holder
//! mint record, and per-token lock/burn state. Every public operation
//! validates its own precondition and permission, appends the corresponding
//! events to the log, and only then mutates local state - a returned error
//! means nothing was emitted and nothing changed. Once an event is appended
//! there is no rollback path.
//!
//! Token lifecycle: `Unminted -> Minted(Locked)`; `Locked <-> Unlocked`
//! (issuer-only, any time before burn); either state `-> Burned` (terminal,
//! gated by the token's burn-authorization policy).

use crate::errors::{IssuanceError, IssuanceResult};
use crate::event::{
    BaseUriSet, DefaultBurnAuthSet, DomainEvent, Issued, Locked, MaxSupplySet, Transfer, Unlocked,
};
use crate::event_log::EventLog;
use crate::types::{
    Address, BaseUri, BurnAuth, Capability, CollectionName, MaxSupply, Timestamp, TokenId,
    TokenSymbol,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration a collection is created with.
///
/// Assembled by the factory from the creation request; immutable fields
/// (address, issuer, name, symbol) never change afterwards.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// The collection's own ledger address.
    pub address: Address,
    /// The issuing organization; the only address allowed to mint, lock,
    /// pause, or reconfigure.
    pub issuer: Address,
    /// Collection name.
    pub name: CollectionName,
    /// Collection symbol.
    pub symbol: TokenSymbol,
    /// Metadata base URI.
    pub base_uri: BaseUri,
    /// Supply cap (0 = unbounded).
    pub max_supply: MaxSupply,
    /// Burn policy recorded on subsequently minted tokens.
    pub default_burn_auth: BurnAuth,
}

/// The tagged lifecycle state of one minted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Transfer is blocked. Tokens mint in this state.
    Locked,
    /// Transfer is possible; the issuer-controlled escape hatch is open.
    Unlocked,
    /// Destroyed. Terminal: no transition leaves this state.
    Burned,
}

impl TokenState {
    /// Whether the token's locked flag is set.
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }

    /// Whether the token has been burned.
    pub const fn is_burned(self) -> bool {
        matches!(self, Self::Burned)
    }

    fn lock(self) -> Option<Self> {
        match self {
            Self::Locked | Self::Unlocked => Some(Self::Locked),
            Self::Burned => None,
        }
    }

    fn unlock(self) -> Option<Self> {
        match self {
            Self::Locked | Self::Unlocked => Some(Self::Unlocked),
            Self::Burned => None,
        }
    }

    fn burn(self) -> Option<Self> {
        match self {
            Self::Locked | Self::Unlocked => Some(Self::Burned),
            Self::Burned => None,
        }
    }
}

/// The on-ledger record of one minted token.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    /// Current holder.
    pub holder: Address,
    /// The issuer at mint time.
    pub issuer: Address,
    /// The burn policy recorded at mint time.
    pub burn_auth: BurnAuth,
    /// When the token was minted.
    pub minted_at: Timestamp,
    /// Current lifecycle state.
    pub state: TokenState,
}

/// One organization's soul-bound token collection.
pub struct MembershipCollection {
    address: Address,
    issuer: Address,
    name: CollectionName,
    symbol: TokenSymbol,
    base_uri: BaseUri,
    max_supply: MaxSupply,
    default_burn_auth: BurnAuth,
    paused: bool,
    next_token_id: TokenId,
    minted: u64,
    tokens: HashMap<TokenId, TokenRecord>,
    // Lifetime mint slots: burning never removes an entry.
    ever_minted: HashSet<Address>,
    balances: HashMap<Address, u64>,
    log: Arc<dyn EventLog>,
}

impl MembershipCollection {
    /// Creates a collection from its configuration. The factory is the only
    /// intended caller; the creation event is the factory's to emit.
    pub fn new(config: CollectionConfig, log: Arc<dyn EventLog>) -> Self {
        Self {
            address: config.address,
            issuer: config.issuer,
            name: config.name,
            symbol: config.symbol,
            base_uri: config.base_uri,
            max_supply: config.max_supply,
            default_burn_auth: config.default_burn_auth,
            paused: false,
            next_token_id: TokenId::first(),
            minted: 0,
            tokens: HashMap::new(),
            ever_minted: HashSet::new(),
            balances: HashMap::new(),
            log,
        }
    }

    /// Mints the next sequential token to `holder`, locked.
    ///
    /// Issuer-only. Fails with `AlreadyMinted` if the holder ever held a
    /// token here (burn does not free the slot), `SupplyExhausted` if the
    /// cap is nonzero and reached, and `Paused` while minting is suspended.
    pub async fn mint(&mut self, caller: &Address, holder: Address) -> IssuanceResult<TokenId> {
        self.ensure_issuer(caller)?;
        self.ensure_not_paused()?;
        self.ensure_mintable(&holder)?;

        let token_id = self.next_token_id;
        let event = Issued {
            issuer: self.issuer.clone(),
            holder: holder.clone(),
            token_id,
            burn_auth: self.default_burn_auth,
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;
        self.apply_mint(holder, token_id);
        debug!(collection = %self.address, token = %token_id, "minted token");
        Ok(token_id)
    }

    /// Mints one token per address, atomically as a unit.
    ///
    /// The whole batch is validated first: a holder already present, a
    /// duplicate within the batch, or supply exhaustion partway through
    /// aborts everything with no partial effect.
    pub async fn mint_batch(
        &mut self,
        caller: &Address,
        holders: Vec<Address>,
    ) -> IssuanceResult<Vec<TokenId>> {
        self.ensure_issuer(caller)?;
        self.ensure_not_paused()?;
        if holders.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        for holder in &holders {
            self.ensure_mintable(holder)?;
            if !seen.insert(holder.clone()) {
                return Err(IssuanceError::AlreadyMinted(holder.clone()));
            }
        }
        if !self.max_supply.is_unlimited() {
            let cap: u64 = self.max_supply.into_inner();
            if self.minted + holders.len() as u64 > cap {
                return Err(IssuanceError::SupplyExhausted(cap));
            }
        }

        let mut token_id = self.next_token_id;
        let mut ids = Vec::with_capacity(holders.len());
        let mut events = Vec::with_capacity(holders.len());
        for holder in &holders {
            ids.push(token_id);
            events.push(DomainEvent::from(Issued {
                issuer: self.issuer.clone(),
                holder: holder.clone(),
                token_id,
                burn_auth: self.default_burn_auth,
            }));
            token_id = token_id.next();
        }
        self.log.append(self.address.clone(), events).await?;
        for (holder, id) in holders.into_iter().zip(ids.iter().copied()) {
            self.apply_mint(holder, id);
        }
        info!(collection = %self.address, count = ids.len(), "minted batch");
        Ok(ids)
    }

    /// Locks a token, blocking transfer. Issuer-only.
    pub async fn lock(&mut self, caller: &Address, token_id: TokenId) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        let next = self
            .live_token(token_id)?
            .state
            .lock()
            .ok_or(IssuanceError::NotFound(token_id))?;
        self.log
            .append(self.address.clone(), vec![Locked { token_id }.into()])
            .await?;
        self.set_state(token_id, next);
        Ok(())
    }

    /// Unlocks a token, opening the transfer escape hatch. Issuer-only.
    pub async fn unlock(&mut self, caller: &Address, token_id: TokenId) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        let next = self
            .live_token(token_id)?
            .state
            .unlock()
            .ok_or(IssuanceError::NotFound(token_id))?;
        self.log
            .append(self.address.clone(), vec![Unlocked { token_id }.into()])
            .await?;
        self.set_state(token_id, next);
        Ok(())
    }

    /// Transfers an unlocked token from its current holder to `to`.
    ///
    /// Fails with `TokenLocked` whenever the locked flag is set, and with
    /// `ZeroAddressTransfer` if `to` is the zero address — the burn signal
    /// can only be produced through `burn` and its authorization policy.
    /// The one-token-per-holder rule is deliberately not re-checked here:
    /// transfer already requires the issuer to have unlocked the token.
    pub async fn transfer(
        &mut self,
        from: &Address,
        to: Address,
        token_id: TokenId,
    ) -> IssuanceResult<()> {
        if to.is_zero() {
            return Err(IssuanceError::ZeroAddressTransfer(token_id));
        }
        let record = self.live_token(token_id)?;
        if record.holder != *from {
            return Err(IssuanceError::Unauthorized(from.clone()));
        }
        if record.state.is_locked() {
            return Err(IssuanceError::TokenLocked(token_id));
        }
        let event = Transfer {
            from: from.clone(),
            to: to.clone(),
            token_id,
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;
        self.decrement_balance(from);
        *self.balances.entry(to.clone()).or_insert(0) += 1;
        if let Some(record) = self.tokens.get_mut(&token_id) {
            record.holder = to;
        }
        Ok(())
    }

    /// Burns a token, if the caller is permitted by the token's
    /// burn-authorization policy.
    ///
    /// Emits the canonical burn signal: a transfer to the zero address.
    pub async fn burn(&mut self, caller: &Address, token_id: TokenId) -> IssuanceResult<()> {
        let record = self.live_token(token_id)?;
        let caller_is_issuer = *caller == record.issuer;
        let caller_is_holder = *caller == record.holder;
        if !record.burn_auth.allows(caller_is_issuer, caller_is_holder) {
            return Err(IssuanceError::BurnNotAuthorized(token_id));
        }
        let next = record
            .state
            .burn()
            .ok_or(IssuanceError::NotFound(token_id))?;
        let holder = record.holder.clone();
        let event = Transfer {
            from: holder.clone(),
            to: Address::zero(),
            token_id,
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;
        self.decrement_balance(&holder);
        self.set_state(token_id, next);
        info!(collection = %self.address, token = %token_id, "burned token");
        Ok(())
    }

    /// Suspends minting. Issuer-only; burn, lock, and unlock are unaffected.
    pub fn pause(&mut self, caller: &Address) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        self.paused = true;
        info!(collection = %self.address, "paused minting");
        Ok(())
    }

    /// Resumes minting. Issuer-only.
    pub fn unpause(&mut self, caller: &Address) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        self.paused = false;
        info!(collection = %self.address, "resumed minting");
        Ok(())
    }

    /// Updates the base URI along with the image/description metadata.
    /// Issuer-only.
    pub async fn set_base_uri(
        &mut self,
        caller: &Address,
        base_uri: BaseUri,
        image: String,
        description: String,
    ) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        let event = BaseUriSet {
            base_uri: base_uri.clone(),
            image,
            description,
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;
        self.base_uri = base_uri;
        Ok(())
    }

    /// Updates the supply cap. Issuer-only; affects subsequent mints.
    pub async fn set_max_supply(
        &mut self,
        caller: &Address,
        max_supply: MaxSupply,
    ) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        self.log
            .append(
                self.address.clone(),
                vec![MaxSupplySet { max_supply }.into()],
            )
            .await?;
        self.max_supply = max_supply;
        Ok(())
    }

    /// Updates the default burn policy. Issuer-only; recorded on subsequent
    /// mints, already-minted tokens keep their policy.
    pub async fn set_default_burn_auth(
        &mut self,
        caller: &Address,
        burn_auth: BurnAuth,
    ) -> IssuanceResult<()> {
        self.ensure_issuer(caller)?;
        self.log
            .append(
                self.address.clone(),
                vec![DefaultBurnAuthSet { burn_auth }.into()],
            )
            .await?;
        self.default_burn_auth = burn_auth;
        Ok(())
    }

    /// Reports whether this collection implements a standard capability
    /// set. Unsupported capabilities answer `false`, never an error.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Ownership
            | Capability::Metadata
            | Capability::Lockable
            | Capability::ConsensualBurn => true,
            Capability::Enumeration => false,
        }
    }

    /// The metadata location for a token: base URI with the decimal id
    /// appended.
    pub fn token_uri(&self, token_id: TokenId) -> IssuanceResult<String> {
        self.live_token(token_id)?;
        Ok(self.base_uri.for_token(token_id))
    }

    /// How many unburned tokens an address currently holds.
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Whether a token's locked flag is set.
    pub fn locked(&self, token_id: TokenId) -> IssuanceResult<bool> {
        Ok(self.live_token(token_id)?.state.is_locked())
    }

    /// The burn policy recorded on a token at mint time.
    pub fn burn_auth(&self, token_id: TokenId) -> IssuanceResult<BurnAuth> {
        Ok(self.live_token(token_id)?.burn_auth)
    }

    /// The current holder of a token.
    pub fn owner_of(&self, token_id: TokenId) -> IssuanceResult<&Address> {
        Ok(&self.live_token(token_id)?.holder)
    }

    /// The collection's ledger address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The issuing organization.
    pub fn issuer(&self) -> &Address {
        &self.issuer
    }

    /// Collection name.
    pub fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Collection symbol.
    pub fn symbol(&self) -> &TokenSymbol {
        &self.symbol
    }

    /// Current supply cap.
    pub fn max_supply(&self) -> MaxSupply {
        self.max_supply
    }

    /// How many tokens were ever minted, burned or not.
    pub fn total_minted(&self) -> u64 {
        self.minted
    }

    /// Whether minting is currently suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn ensure_issuer(&self, caller: &Address) -> IssuanceResult<()> {
        if *caller == self.issuer {
            Ok(())
        } else {
            Err(IssuanceError::Unauthorized(caller.clone()))
        }
    }

    fn ensure_not_paused(&self) -> IssuanceResult<()> {
        if self.paused {
            Err(IssuanceError::Paused)
        } else {
            Ok(())
        }
    }

    fn ensure_mintable(&self, holder: &Address) -> IssuanceResult<()> {
        if self.ever_minted.contains(holder) {
            return Err(IssuanceError::AlreadyMinted(holder.clone()));
        }
        if self.max_supply.is_exhausted_by(self.minted) {
            return Err(IssuanceError::SupplyExhausted(self.max_supply.into_inner()));
        }
        Ok(())
    }

    fn live_token(&self, token_id: TokenId) -> IssuanceResult<&TokenRecord> {
        self.tokens
            .get(&token_id)
            .filter(|record| !record.state.is_burned())
            .ok_or(IssuanceError::NotFound(token_id))
    }

    fn apply_mint(&mut self, holder: Address, token_id: TokenId) {
        self.tokens.insert(
            token_id,
            TokenRecord {
                holder: holder.clone(),
                issuer: self.issuer.clone(),
                burn_auth: self.default_burn_auth,
                minted_at: Timestamp::now(),
                state: TokenState::Locked,
            },
        );
        self.ever_minted.insert(holder.clone());
        *self.balances.entry(holder).or_insert(0) += 1;
        self.minted += 1;
        self.next_token_id = token_id.next();
    }

    fn set_state(&mut self, token_id: TokenId, state: TokenState) {
        if let Some(record) = self.tokens.get_mut(&token_id) {
            record.state = state;
        }
    }

    fn decrement_balance(&mut self, address: &Address) {
        if let Some(balance) = self.balances.get_mut(address) {
            *balance = balance.saturating_sub(1);
        }
    }
}
