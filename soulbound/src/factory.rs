//! The factory registry.
//!
//! The factory is the only path by which an issuance instance comes into
//! existence. It charges a configurable creation fee, owns the accumulated
//! fee balance, and emits a creation event carrying the new instance's
//! address and full configuration - the event the subscription manager uses
//! to start tracking the instance from its first emitted event.

use crate::collection::{CollectionConfig, MembershipCollection};
use crate::errors::{FactoryError, FactoryResult};
use crate::event::{CreationFeeSet, FeesWithdrawn, SbtCreated};
use crate::event_log::EventLog;
use crate::types::{
    Address, BaseUri, BurnAuth, CollectionName, FeeAmount, MaxSupply, TokenSymbol,
    DEFAULT_CREATION_FEE,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// The factory's global mutable state: owner and creation fee.
///
/// This record is owned exclusively by the factory and mutated only through
/// `initialize` and `set_creation_fee`; nothing else reads it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// The registry owner; may withdraw fees and change the creation fee.
    pub owner: Address,
    /// The fee required to create a collection.
    pub creation_fee: FeeAmount,
}

/// A request to create a new collection.
#[derive(Debug, Clone)]
pub struct CollectionParams {
    /// Collection name.
    pub name: CollectionName,
    /// Collection symbol.
    pub symbol: TokenSymbol,
    /// Metadata base URI.
    pub base_uri: BaseUri,
    /// Supply cap (0 = unbounded).
    pub max_supply: MaxSupply,
    /// Default burn-authorization policy.
    pub burn_auth: BurnAuth,
    /// Collection image URI.
    pub image: String,
    /// Collection description.
    pub description: String,
}

/// The factory registry for soul-bound token collections.
pub struct SbtFactory {
    address: Address,
    config: Option<FactoryConfig>,
    balance: FeeAmount,
    collections: Vec<Address>,
    log: Arc<dyn EventLog>,
}

impl SbtFactory {
    /// Creates an uninitialized factory bound to the given log. No
    /// operation other than `initialize` succeeds until it is called.
    pub fn new(address: Address, log: Arc<dyn EventLog>) -> Self {
        Self {
            address,
            config: None,
            balance: FeeAmount::zero(),
            collections: Vec::new(),
            log,
        }
    }

    /// One-time setup: records the owner and the default creation fee.
    ///
    /// Fails with `AlreadyInitialized` on any call after the first.
    pub fn initialize(&mut self, owner: Address) -> FactoryResult<()> {
        if self.config.is_some() {
            return Err(FactoryError::AlreadyInitialized);
        }
        self.config = Some(FactoryConfig {
            owner,
            creation_fee: FeeAmount::new(DEFAULT_CREATION_FEE),
        });
        info!(factory = %self.address, "factory initialized");
        Ok(())
    }

    /// Creates a new issuance instance for `creator`, charging the current
    /// creation fee.
    ///
    /// Fails with `InsufficientFee` before any effect if the payment does
    /// not cover the fee. On success the whole payment is added to the fee
    /// balance, the instance is registered for tracking, and the creation
    /// event is emitted with the instance's address and configuration.
    #[instrument(skip(self, params), fields(factory = %self.address))]
    pub async fn create_collection(
        &mut self,
        creator: Address,
        payment: FeeAmount,
        params: CollectionParams,
    ) -> FactoryResult<MembershipCollection> {
        let config = self.config.as_ref().ok_or(FactoryError::NotInitialized)?;
        if payment < config.creation_fee {
            return Err(FactoryError::InsufficientFee {
                required: config.creation_fee,
                paid: payment,
            });
        }

        let sbt_address = Address::generate();
        let event = SbtCreated {
            sbt_address: sbt_address.clone(),
            creator: creator.clone(),
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            base_uri: params.base_uri.clone(),
            max_supply: params.max_supply,
            default_burn_auth: params.burn_auth,
            image: params.image.clone(),
            description: params.description.clone(),
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;

        self.balance = self.balance.saturating_add(payment);
        self.collections.push(sbt_address.clone());
        info!(collection = %sbt_address, %creator, "created collection");

        Ok(MembershipCollection::new(
            CollectionConfig {
                address: sbt_address,
                issuer: creator,
                name: params.name,
                symbol: params.symbol,
                base_uri: params.base_uri,
                max_supply: params.max_supply,
                default_burn_auth: params.burn_auth,
            },
            Arc::clone(&self.log),
        ))
    }

    /// Transfers the entire accumulated fee balance to the registry owner.
    ///
    /// Owner-only. Returns the amount withdrawn.
    #[instrument(skip(self), fields(factory = %self.address))]
    pub async fn withdraw(&mut self, caller: &Address) -> FactoryResult<FeeAmount> {
        let owner = self.ensure_owner(caller)?.clone();
        let amount = self.balance;
        let event = FeesWithdrawn {
            to: owner,
            amount,
        };
        self.log
            .append(self.address.clone(), vec![event.into()])
            .await?;
        self.balance = FeeAmount::zero();
        info!(%amount, "withdrew fee balance");
        Ok(amount)
    }

    /// Changes the creation fee for subsequent creations only; collections
    /// already created are unaffected. Owner-only.
    #[instrument(skip(self), fields(factory = %self.address))]
    pub async fn set_creation_fee(
        &mut self,
        caller: &Address,
        fee: FeeAmount,
    ) -> FactoryResult<()> {
        self.ensure_owner(caller)?;
        self.log
            .append(self.address.clone(), vec![CreationFeeSet { fee }.into()])
            .await?;
        if let Some(config) = self.config.as_mut() {
            config.creation_fee = fee;
        }
        info!(%fee, "creation fee updated");
        Ok(())
    }

    /// The factory's ledger address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The current creation fee, if initialized.
    pub fn creation_fee(&self) -> Option<FeeAmount> {
        self.config.as_ref().map(|c| c.creation_fee)
    }

    /// The registry owner, if initialized.
    pub fn owner(&self) -> Option<&Address> {
        self.config.as_ref().map(|c| &c.owner)
    }

    /// The accumulated, not-yet-withdrawn fee balance.
    pub fn balance(&self) -> FeeAmount {
        self.balance
    }

    /// Addresses of every collection this factory has created, in creation
    /// order.
    pub fn collections(&self) -> &[Address] {
        &self.collections
    }

    fn ensure_owner(&self, caller: &Address) -> FactoryResult<&Address> {
        let config = self.config.as_ref().ok_or(FactoryError::NotInitialized)?;
        if *caller == config.owner {
            Ok(&config.owner)
        } else {
            Err(FactoryError::Unauthorized(caller.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturingLog;
    use crate::types::Capability;

    fn params() -> CollectionParams {
        CollectionParams {
            name: CollectionName::try_new("Fitness Gym Membership").unwrap(),
            symbol: TokenSymbol::try_new("FGM").unwrap(),
            base_uri: BaseUri::try_new("ipfs://base/").unwrap(),
            max_supply: MaxSupply::new(2),
            burn_auth: BurnAuth::IssuerOnly,
            image: "ipfs://image".to_string(),
            description: "A gym membership".to_string(),
        }
    }

    fn initialized_factory() -> (SbtFactory, CapturingLog, Address) {
        let log = CapturingLog::new();
        let owner = Address::generate();
        let mut factory = SbtFactory::new(Address::generate(), Arc::new(log.clone()));
        factory.initialize(owner.clone()).unwrap();
        (factory, log, owner)
    }

    #[test]
    fn initialize_sets_owner_and_default_fee_exactly_once() {
        let (mut factory, _log, owner) = initialized_factory();
        assert_eq!(factory.owner(), Some(&owner));
        assert_eq!(
            factory.creation_fee(),
            Some(FeeAmount::new(DEFAULT_CREATION_FEE))
        );
        assert_eq!(
            factory.initialize(Address::generate()),
            Err(FactoryError::AlreadyInitialized)
        );
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let log = CapturingLog::new();
        let mut factory = SbtFactory::new(Address::generate(), Arc::new(log));
        let caller = Address::generate();
        let result = factory
            .create_collection(caller.clone(), FeeAmount::new(DEFAULT_CREATION_FEE), params())
            .await;
        assert!(matches!(result, Err(FactoryError::NotInitialized)));
        assert!(matches!(
            factory.withdraw(&caller).await,
            Err(FactoryError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn create_collection_rejects_insufficient_fee_without_effect() {
        let (mut factory, log, _owner) = initialized_factory();
        let result = factory
            .create_collection(Address::generate(), FeeAmount::new(1), params())
            .await;
        assert_eq!(
            result.err(),
            Some(FactoryError::InsufficientFee {
                required: FeeAmount::new(DEFAULT_CREATION_FEE),
                paid: FeeAmount::new(1),
            })
        );
        assert!(log.is_empty());
        assert_eq!(factory.balance(), FeeAmount::zero());
        assert!(factory.collections().is_empty());
    }

    #[tokio::test]
    async fn create_collection_emits_creation_event_and_registers_address() {
        let (mut factory, log, _owner) = initialized_factory();
        let creator = Address::generate();
        let collection = factory
            .create_collection(
                creator.clone(),
                FeeAmount::new(DEFAULT_CREATION_FEE),
                params(),
            )
            .await
            .unwrap();

        assert_eq!(collection.issuer(), &creator);
        assert_eq!(factory.collections(), &[collection.address().clone()]);
        assert_eq!(factory.balance(), FeeAmount::new(DEFAULT_CREATION_FEE));

        let recorded = log.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].source, *factory.address());
        match &recorded[0].payload {
            crate::event::DomainEvent::SbtCreated(e) => {
                assert_eq!(&e.sbt_address, collection.address());
                assert_eq!(e.creator, creator);
                assert_eq!(e.max_supply, MaxSupply::new(2));
                assert_eq!(e.default_burn_auth, BurnAuth::IssuerOnly);
            }
            other => panic!("expected SbtCreated, got {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn created_collections_are_usable_issuance_instances() {
        let (mut factory, _log, _owner) = initialized_factory();
        let creator = Address::generate();
        let mut collection = factory
            .create_collection(
                creator.clone(),
                FeeAmount::new(DEFAULT_CREATION_FEE),
                params(),
            )
            .await
            .unwrap();
        let id = collection.mint(&creator, Address::generate()).await.unwrap();
        assert_eq!(u64::from(id), 0);
        assert!(collection.supports(Capability::Lockable));
    }

    #[tokio::test]
    async fn withdraw_pays_out_the_entire_balance_to_the_owner_only() {
        let (mut factory, log, owner) = initialized_factory();
        factory
            .create_collection(
                Address::generate(),
                FeeAmount::new(DEFAULT_CREATION_FEE),
                params(),
            )
            .await
            .unwrap();

        let outsider = Address::generate();
        assert_eq!(
            factory.withdraw(&outsider).await,
            Err(FactoryError::Unauthorized(outsider))
        );

        let amount = factory.withdraw(&owner).await.unwrap();
        assert_eq!(amount, FeeAmount::new(DEFAULT_CREATION_FEE));
        assert_eq!(factory.balance(), FeeAmount::zero());
        assert_eq!(log.kinds(), vec!["SbtCreated", "FeesWithdrawn"]);
    }

    #[tokio::test]
    async fn set_creation_fee_applies_to_subsequent_creations_only() {
        let (mut factory, _log, owner) = initialized_factory();
        let outsider = Address::generate();
        assert_eq!(
            factory
                .set_creation_fee(&outsider, FeeAmount::new(5))
                .await,
            Err(FactoryError::Unauthorized(outsider))
        );

        factory
            .set_creation_fee(&owner, FeeAmount::new(2 * DEFAULT_CREATION_FEE))
            .await
            .unwrap();
        assert_eq!(
            factory.creation_fee(),
            Some(FeeAmount::new(2 * DEFAULT_CREATION_FEE))
        );

        // The old fee no longer suffices.
        let result = factory
            .create_collection(
                Address::generate(),
                FeeAmount::new(DEFAULT_CREATION_FEE),
                params(),
            )
            .await;
        assert!(matches!(
            result,
            Err(FactoryError::InsufficientFee { .. })
        ));
    }
}
