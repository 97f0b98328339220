//! Core domain types for the soulbound issuance system.
//!
//! All identifier and quantity types use smart constructors so that a value,
//! once constructed, is always valid - following the "parse, don't validate"
//! principle. Invalid addresses, names, or URIs are rejected at the edge and
//! never reach the state machines.

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 20-byte ledger address in lowercase `0x`-prefixed hex form.
///
/// Addresses identify every participant in the system: creators, holders,
/// the factory registry, and each issuance instance the factory deploys.
/// The all-zero address is reserved as the burn destination.
#[nutype(
    sanitize(trim, lowercase),
    validate(regex = r"^0x[0-9a-f]{40}$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct Address(String);

impl Address {
    /// Generates a fresh, effectively unique address.
    ///
    /// The first 16 bytes come from a `UUIDv7` so generated addresses sort
    /// roughly by creation time; the remaining 4 bytes are random.
    pub fn generate() -> Self {
        let uuid_bytes = Uuid::now_v7().into_bytes();
        let tail: [u8; 4] = rand::random();
        let mut hex = String::with_capacity(42);
        hex.push_str("0x");
        for byte in uuid_bytes.iter().chain(tail.iter()) {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self::try_new(hex).expect("generated address is always 20 bytes of hex")
    }

    /// The canonical zero address used as the burn destination.
    pub fn zero() -> Self {
        Self::try_new(format!("0x{}", "0".repeat(40))).expect("zero address is valid hex")
    }

    /// Returns whether this is the canonical zero address.
    pub fn is_zero(&self) -> bool {
        self.as_ref().bytes().skip(2).all(|b| b == b'0')
    }
}

/// The numeric identifier of a token within one collection.
///
/// Ids are assigned sequentially starting at 0 and are immutable once
/// assigned; `(collection address, token id)` is globally unique.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct TokenId(u64);

impl TokenId {
    /// The first token id in any collection (0).
    pub fn first() -> Self {
        Self::new(0)
    }

    /// Returns the next sequential token id.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

/// A position in the global event log.
///
/// Positions are assigned by the log at append time, start at 0, and
/// increase monotonically. They are the sole arbiter of event ordering.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct LogPosition(u64);

impl LogPosition {
    /// The position of the first event in the log.
    pub fn start() -> Self {
        Self::new(0)
    }

    /// Returns the position immediately after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

/// The human-readable name of a collection.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct CollectionName(String);

/// The short ticker-style symbol of a collection.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 16),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TokenSymbol(String);

/// The base URI a collection prepends to token ids to locate metadata.
///
/// The blob behind `base_uri ++ token_id` is stored by an external content
/// system and treated as opaque and immutable once referenced.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 2048),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct BaseUri(String);

impl BaseUri {
    /// Resolves the metadata location for a token: the base URI with the
    /// decimal token id appended.
    pub fn for_token(&self, token_id: TokenId) -> String {
        format!("{}{token_id}", self.as_ref())
    }
}

/// A payment amount in the ledger's native unit.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct FeeAmount(u128);

impl FeeAmount {
    /// Zero native units.
    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Adds another amount, saturating at the numeric bound.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self::new(self.into_inner().saturating_add(other.into_inner()))
    }
}

/// The default fee for creating a new collection: 0.01 native units
/// expressed in the smallest denomination (10^16).
pub const DEFAULT_CREATION_FEE: u128 = 10_000_000_000_000_000;

/// The maximum number of tokens a collection may ever mint.
///
/// A limit of 0 means the supply is unbounded; this sentinel comes from the
/// on-chain contract and is preserved here.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct MaxSupply(u64);

impl MaxSupply {
    /// An unbounded supply (the 0 sentinel).
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Returns whether this supply is unbounded.
    pub fn is_unlimited(&self) -> bool {
        self.into_inner() == 0
    }

    /// Returns whether `minted` tokens exhaust this supply.
    pub fn is_exhausted_by(&self, minted: u64) -> bool {
        !self.is_unlimited() && minted >= self.into_inner()
    }
}

/// Per-collection rule determining who may destroy a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurnAuth {
    /// Only the issuer may burn.
    IssuerOnly,
    /// Only the current holder may burn.
    OwnerOnly,
    /// Either the issuer or the current holder may burn.
    Both,
    /// Nobody may burn; the token is permanent.
    Neither,
}

impl BurnAuth {
    /// Evaluates this policy for a caller's relationship to the token.
    pub const fn allows(self, caller_is_issuer: bool, caller_is_holder: bool) -> bool {
        match self {
            Self::IssuerOnly => caller_is_issuer,
            Self::OwnerOnly => caller_is_holder,
            Self::Both => caller_is_issuer || caller_is_holder,
            Self::Neither => false,
        }
    }
}

/// Standard capability sets a collection can be probed for.
///
/// Mirrors on-chain interface detection: probing for a capability the
/// collection does not implement answers `false`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Token ownership and transfer surface.
    Ownership,
    /// Name/symbol/URI metadata surface.
    Metadata,
    /// Per-token lock flag gating transferability.
    Lockable,
    /// Issuer/holder consensual burn policy surface.
    ConsensualBurn,
    /// On-chain supply enumeration. Not implemented by membership
    /// collections.
    Enumeration,
}

/// A timestamp recording when an event was appended to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp from a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Creates a timestamp representing the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
