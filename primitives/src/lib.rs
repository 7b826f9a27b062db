//! Duopow shared primitive types.
//!
//! Every pallet in the workspace imports from this crate.
//! No pallet-specific logic lives here, only type aliases,
//! bounded containers and the trait interfaces pallets use to
//! talk to each other.
//!
//! Pallets never depend on each other's types directly;
//! they depend on primitives and get wired together by the runtime.

#![cfg_attr(not(feature = "std"), no_std)]

use frame_support::{traits::ConstU32, weights::Weight};
use sp_runtime::{BoundedVec, DispatchError, DispatchResult};

// ============================================================
// Identifiers and amounts
// ============================================================

/// External user id, supplied by the operator (e.g. the learning-platform
/// account number). Immutable once bound to an account.
pub type Uid = u64;

/// Experience points. Used both for cumulative reported XP and for the
/// spendable balance derived from it.
pub type Xp = u64;

/// Sequential incentive identifier. The first incentive gets id 1; ids are
/// never reused.
pub type IncentiveId = u32;

/// Number of claims an incentive can still serve.
pub type ClaimCount = u32;

/// Maximum length of an incentive's display name in bytes.
pub const MAX_INCENTIVE_NAME_LEN: u32 = 64;

pub type BoundedIncentiveName = BoundedVec<u8, ConstU32<MAX_INCENTIVE_NAME_LEN>>;

// ============================================================
// Trait interfaces: pallets depend on these, not on each other
// ============================================================

/// Interface that pallet-identity-registry exposes to other pallets.
pub trait IdentityInterface<AccountId> {
    /// The uid currently bound to `who`, if any.
    fn uid_of(who: &AccountId) -> Option<Uid>;
    /// The account currently bound to `uid`, if any.
    fn account_of(uid: Uid) -> Option<AccountId>;
}

/// Callbacks fired by the identity registry inside the same dispatch that
/// binds or releases a uid.
pub trait RegistrationHooks {
    /// A uid was bound for the first time. XP earned before this point is
    /// recorded but never becomes spendable.
    fn on_registered(uid: Uid, initial_xp: Xp);
    /// A uid was released. All per-uid ledger state must be dropped.
    fn on_unregistered(uid: Uid);
}

impl RegistrationHooks for () {
    fn on_registered(_uid: Uid, _initial_xp: Xp) {}
    fn on_unregistered(_uid: Uid) {}
}

/// Interface that pallet-xp-ledger exposes for claim settlement.
pub trait XpLedgerInterface {
    /// Spendable balance of `uid`, `None` if the uid has no ledger record.
    fn spendable_of(uid: Uid) -> Option<Xp>;
    /// Remove `amount` from the spendable balance of `uid`.
    fn debit(uid: Uid, amount: Xp) -> DispatchResult;
}

/// Capability of an incentive issuer to deliver the actual reward.
///
/// Claim settlement calls this after its own state is committed. An `Err`
/// aborts the whole claim, undoing the debit, the supply decrement and the
/// claim record.
pub trait IncentiveIssuer<AccountId> {
    fn claim(issuer: &AccountId, incentive: IncentiveId, receiver: &AccountId) -> DispatchResult;

    /// Worst-case weight of one `claim`. Charged on top of the settlement.
    fn deliver_weight() -> Weight;
}

/// No issuer wired: every delivery fails.
impl<AccountId> IncentiveIssuer<AccountId> for () {
    fn claim(_issuer: &AccountId, _incentive: IncentiveId, _receiver: &AccountId) -> DispatchResult {
        Err(DispatchError::Other("no incentive issuer configured"))
    }

    fn deliver_weight() -> Weight {
        Weight::zero()
    }
}

/// Interface that pallet-incentives exposes to issuer pallets.
pub trait IncentiveCatalog<AccountId> {
    /// The account that created `incentive`, if it exists.
    fn issuer_of(incentive: IncentiveId) -> Option<AccountId>;
}
