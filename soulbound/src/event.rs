//! Domain events emitted by the factory and by issuance instances.
//!
//! These payloads are the fixed wire schema of the ledger boundary. Each
//! committed state transition appends exactly the events defined here; the
//! projector consumes them and nothing else. Once appended an event is
//! immutable and can never be retracted.

use crate::types::{
    Address, BaseUri, BurnAuth, CollectionName, FeeAmount, LogPosition, MaxSupply, Timestamp,
    TokenId, TokenSymbol,
};
use serde::{Deserialize, Serialize};

/// Emitted by the factory when a new collection comes into existence.
///
/// Carries the new instance's address and its full configuration; this is
/// the event the subscription manager uses to start tracking the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbtCreated {
    /// Address of the newly created issuance instance.
    pub sbt_address: Address,
    /// Address that paid for and owns the new collection.
    pub creator: Address,
    /// Collection name.
    pub name: CollectionName,
    /// Collection symbol.
    pub symbol: TokenSymbol,
    /// Metadata base URI.
    pub base_uri: BaseUri,
    /// Supply cap (0 = unbounded).
    pub max_supply: MaxSupply,
    /// Default burn-authorization policy for minted tokens.
    pub default_burn_auth: BurnAuth,
    /// Collection image URI (opaque).
    pub image: String,
    /// Collection description.
    pub description: String,
}

/// Emitted when a token is minted to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issued {
    /// The issuer performing the mint.
    pub issuer: Address,
    /// The holder receiving the token.
    pub holder: Address,
    /// The sequentially assigned token id.
    pub token_id: TokenId,
    /// The burn-authorization policy recorded for this token.
    pub burn_auth: BurnAuth,
}

/// Emitted when the issuer locks a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locked {
    /// The locked token.
    pub token_id: TokenId,
}

/// Emitted when the issuer unlocks a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlocked {
    /// The unlocked token.
    pub token_id: TokenId,
}

/// Emitted when token ownership changes.
///
/// A transfer with the zero address as destination is the canonical burn
/// signal; the projector flips the derived token's burned flag on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Previous holder.
    pub from: Address,
    /// New holder, or the zero address for a burn.
    pub to: Address,
    /// The transferred token.
    pub token_id: TokenId,
}

/// Emitted when the issuer updates the collection's base URI and the
/// associated image/description metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUriSet {
    /// The new base URI.
    pub base_uri: BaseUri,
    /// The new image URI.
    pub image: String,
    /// The new description.
    pub description: String,
}

/// Emitted when the issuer updates the supply cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxSupplySet {
    /// The new supply cap (0 = unbounded).
    pub max_supply: MaxSupply,
}

/// Emitted when the issuer updates the default burn-authorization policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultBurnAuthSet {
    /// The new default policy, applied to subsequent mints.
    pub burn_auth: BurnAuth,
}

/// Emitted when the registry owner changes the creation fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationFeeSet {
    /// The new fee, effective for subsequent creations only.
    pub fee: FeeAmount,
}

/// Emitted when the registry owner withdraws the accumulated fee balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesWithdrawn {
    /// The recipient (the registry owner).
    pub to: Address,
    /// The amount withdrawn.
    pub amount: FeeAmount,
}

/// All events the factory and issuance instances can append to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// A collection was created by the factory.
    SbtCreated(SbtCreated),
    /// A token was minted.
    Issued(Issued),
    /// A token was locked.
    Locked(Locked),
    /// A token was unlocked.
    Unlocked(Unlocked),
    /// Token ownership changed (zero destination = burn).
    Transfer(Transfer),
    /// Collection base URI / image / description changed.
    BaseUriSet(BaseUriSet),
    /// Collection supply cap changed.
    MaxSupplySet(MaxSupplySet),
    /// Collection default burn policy changed.
    DefaultBurnAuthSet(DefaultBurnAuthSet),
    /// Factory creation fee changed.
    CreationFeeSet(CreationFeeSet),
    /// Factory fee balance withdrawn.
    FeesWithdrawn(FeesWithdrawn),
}

impl DomainEvent {
    /// A short stable name for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SbtCreated(_) => "SbtCreated",
            Self::Issued(_) => "Issued",
            Self::Locked(_) => "Locked",
            Self::Unlocked(_) => "Unlocked",
            Self::Transfer(_) => "Transfer",
            Self::BaseUriSet(_) => "BaseUriSet",
            Self::MaxSupplySet(_) => "MaxSupplySet",
            Self::DefaultBurnAuthSet(_) => "DefaultBurnAuthSet",
            Self::CreationFeeSet(_) => "CreationFeeSet",
            Self::FeesWithdrawn(_) => "FeesWithdrawn",
        }
    }
}

impl From<SbtCreated> for DomainEvent {
    fn from(event: SbtCreated) -> Self {
        Self::SbtCreated(event)
    }
}

impl From<Issued> for DomainEvent {
    fn from(event: Issued) -> Self {
        Self::Issued(event)
    }
}

impl From<Locked> for DomainEvent {
    fn from(event: Locked) -> Self {
        Self::Locked(event)
    }
}

impl From<Unlocked> for DomainEvent {
    fn from(event: Unlocked) -> Self {
        Self::Unlocked(event)
    }
}

impl From<Transfer> for DomainEvent {
    fn from(event: Transfer) -> Self {
        Self::Transfer(event)
    }
}

impl From<BaseUriSet> for DomainEvent {
    fn from(event: BaseUriSet) -> Self {
        Self::BaseUriSet(event)
    }
}

impl From<MaxSupplySet> for DomainEvent {
    fn from(event: MaxSupplySet) -> Self {
        Self::MaxSupplySet(event)
    }
}

impl From<DefaultBurnAuthSet> for DomainEvent {
    fn from(event: DefaultBurnAuthSet) -> Self {
        Self::DefaultBurnAuthSet(event)
    }
}

impl From<CreationFeeSet> for DomainEvent {
    fn from(event: CreationFeeSet) -> Self {
        Self::CreationFeeSet(event)
    }
}

impl From<FeesWithdrawn> for DomainEvent {
    fn from(event: FeesWithdrawn) -> Self {
        Self::FeesWithdrawn(event)
    }
}

/// An event as it exists in the log: the payload plus the metadata the log
/// assigned at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Position in the global log (total order).
    pub position: LogPosition,
    /// The emitting address (factory or issuance instance).
    pub source: Address,
    /// When the event was appended.
    pub timestamp: Timestamp,
    /// The typed payload.
    pub payload: DomainEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issued() -> DomainEvent {
        DomainEvent::from(Issued {
            issuer: Address::generate(),
            holder: Address::generate(),
            token_id: TokenId::first(),
            burn_auth: BurnAuth::IssuerOnly,
        })
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(sample_issued().kind(), "Issued");
        let burn = DomainEvent::from(Transfer {
            from: Address::generate(),
            to: Address::zero(),
            token_id: TokenId::first(),
        });
        assert_eq!(burn.kind(), "Transfer");
    }

    #[test]
    fn events_roundtrip_through_json() {
        let event = DomainEvent::from(SbtCreated {
            sbt_address: Address::generate(),
            creator: Address::generate(),
            name: CollectionName::try_new("Fitness Gym Membership").unwrap(),
            symbol: TokenSymbol::try_new("FGM").unwrap(),
            base_uri: BaseUri::try_new("ipfs://base/").unwrap(),
            max_supply: MaxSupply::new(2),
            default_burn_auth: BurnAuth::IssuerOnly,
            image: "ipfs://image".to_string(),
            description: "A gym membership".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn tagged_serialization_names_the_event_kind() {
        let json = serde_json::to_value(sample_issued()).unwrap();
        assert_eq!(json["type"], "Issued");
    }

    #[test]
    fn recorded_event_roundtrips_with_metadata() {
        let recorded = RecordedEvent {
            position: LogPosition::start(),
            source: Address::generate(),
            timestamp: Timestamp::now(),
            payload: sample_issued(),
        };
        let json = serde_json::to_string(&recorded).unwrap();
        let back: RecordedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(recorded, back);
    }
}
