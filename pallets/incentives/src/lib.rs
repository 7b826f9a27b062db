//! # Incentives Pallet
//!
//! Catalog of incentives and the settlement of claims against them.
//!
//! Any signed account can publish an incentive: a name, the XP it costs and
//! how many times it can be claimed. The publisher becomes the incentive's
//! issuer, and its `IncentiveIssuer` capability delivers the actual reward.
//!
//! ## Claim settlement
//! A registered user claims an incentive at most once. Settlement runs in
//! checks → effects → interaction order:
//!
//! 1. checks: caller registered, pair not yet claimed, incentive exists,
//!    spendable balance covers the cost, supply left;
//! 2. effects: debit the XP balance, decrement the supply, record the
//!    `(uid, incentive)` pair;
//! 3. interaction: call the issuer.
//!
//! The issuer is untrusted and may call back into this pallet. Because all
//! effects are in storage before the call, a reentrant claim sees the
//! debited balance, the reduced supply and the recorded pair. If delivery
//! fails the dispatch returns an error and its storage layer discards the
//! effects, so a claim either fully happens or leaves no trace.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod mock;

pub(crate) const LOG_TARGET: &str = "runtime::incentives";

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use duopow_primitives::*;
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;

    // ================================================================
    // Pallet-local types
    // ================================================================

    /// On-chain record of a published incentive.
    #[derive(Clone, PartialEq, Eq, Encode, Decode, MaxEncodedLen, TypeInfo, Debug)]
    pub struct Incentive<AccountId> {
        /// Account whose issuer capability delivers the reward.
        pub issuer: AccountId,
        /// Display name. Not unique.
        pub name: BoundedIncentiveName,
        /// XP debited per claim. Always nonzero.
        pub required_xp: Xp,
        /// Supply at creation.
        pub supply_limit: ClaimCount,
        /// Claims left. Only ever decreases.
        pub remaining_supply: ClaimCount,
    }

    // ================================================================
    // Config
    // ================================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Interface to the identity registry (trait, not concrete type).
        type Identity: IdentityInterface<Self::AccountId>;

        /// Interface to the XP ledger for balance checks and debits.
        type XpLedger: XpLedgerInterface;

        /// Delivers rewards on behalf of incentive issuers.
        type Issuer: IncentiveIssuer<Self::AccountId>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn create_incentive() -> Weight;
        fn claim() -> Weight;
    }

    pub struct DefaultWeightInfo;
    impl WeightInfo for DefaultWeightInfo {
        fn create_incentive() -> Weight { Weight::from_parts(35_000_000, 0) }
        // Settlement only; delivery is charged through `Config::Issuer`.
        fn claim() -> Weight { Weight::from_parts(90_000_000, 0) }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ================================================================
    // Storage
    // ================================================================

    /// Map: IncentiveId → Incentive.
    #[pallet::storage]
    pub type Incentives<T: Config> =
        StorageMap<_, Blake2_128Concat, IncentiveId, Incentive<T::AccountId>, OptionQuery>;

    /// Last assigned incentive id. Ids start at 1, so 0 means none yet.
    #[pallet::storage]
    pub type IncentiveCount<T: Config> = StorageValue<_, IncentiveId, ValueQuery>;

    /// Consumed claims, keyed by (uid, incentive). Entries are never removed.
    #[pallet::storage]
    pub type Claimed<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat, Uid,
        Blake2_128Concat, IncentiveId,
        (),
        OptionQuery,
    >;

    /// Number of successfully delivered claims across all incentives.
    #[pallet::storage]
    pub type TotalClaims<T: Config> = StorageValue<_, u64, ValueQuery>;

    // ================================================================
    // Events
    // ================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A new incentive was published.
        IncentiveCreated {
            incentive_id: IncentiveId,
            issuer: T::AccountId,
            required_xp: Xp,
            supply_limit: ClaimCount,
        },
        /// A claim was settled and its reward delivered.
        IncentiveClaimed {
            incentive_id: IncentiveId,
            uid: Uid,
            account: T::AccountId,
        },
    }

    // ================================================================
    // Errors
    // ================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// The caller is not bound to a uid.
        NotRegistered,
        /// This uid already claimed this incentive.
        AlreadyClaimed,
        /// No incentive with this id.
        UnknownIncentive,
        /// Spendable XP is lower than the incentive's cost.
        InsufficientBalance,
        /// The incentive has no claims left.
        SupplyExhausted,
        /// Required XP and supply must both be nonzero.
        InvalidParameter,
        /// The issuer failed to deliver the reward.
        DeliveryFailed,
        /// The incentive id space is used up.
        TooManyIncentives,
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        #[cfg(feature = "try-runtime")]
        fn try_state(_n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
            Self::do_try_state()
        }
    }

    // ================================================================
    // Extrinsics
    // ================================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Publish an incentive. The caller becomes its issuer.
        ///
        /// The assigned id is reported in `IncentiveCreated`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::create_incentive())]
        pub fn create_incentive(
            origin: OriginFor<T>,
            name: BoundedIncentiveName,
            required_xp: Xp,
            supply_limit: ClaimCount,
        ) -> DispatchResult {
            let issuer = ensure_signed(origin)?;
            Self::do_create_incentive(issuer, name, required_xp, supply_limit).map(|_| ())
        }

        /// Redeem `required_xp` of the caller's balance for one unit of the
        /// incentive's supply.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::claim().saturating_add(T::Issuer::deliver_weight()))]
        pub fn claim(origin: OriginFor<T>, incentive_id: IncentiveId) -> DispatchResult {
            let who = ensure_signed(origin)?;

            // --- checks ---
            let uid = T::Identity::uid_of(&who).ok_or(Error::<T>::NotRegistered)?;
            ensure!(!Claimed::<T>::contains_key(uid, incentive_id), Error::<T>::AlreadyClaimed);
            let mut incentive =
                Incentives::<T>::get(incentive_id).ok_or(Error::<T>::UnknownIncentive)?;
            let spendable = T::XpLedger::spendable_of(uid).ok_or(Error::<T>::NotRegistered)?;
            ensure!(spendable >= incentive.required_xp, Error::<T>::InsufficientBalance);
            ensure!(incentive.remaining_supply > 0, Error::<T>::SupplyExhausted);

            // --- effects ---
            T::XpLedger::debit(uid, incentive.required_xp)?;
            // Nonzero, checked above.
            incentive.remaining_supply -= 1;
            Incentives::<T>::insert(incentive_id, &incentive);
            Claimed::<T>::insert(uid, incentive_id, ());

            // --- interaction ---
            T::Issuer::claim(&incentive.issuer, incentive_id, &who).map_err(|e| {
                log::warn!(
                    target: LOG_TARGET,
                    "issuer {:?} failed to deliver incentive {} to {:?}: {:?}",
                    incentive.issuer, incentive_id, who, e,
                );
                Error::<T>::DeliveryFailed
            })?;

            TotalClaims::<T>::mutate(|c| *c = c.saturating_add(1));

            log::debug!(
                target: LOG_TARGET,
                "uid {} claimed incentive {}, {} left",
                uid, incentive_id, incentive.remaining_supply,
            );
            Self::deposit_event(Event::IncentiveClaimed { incentive_id, uid, account: who });
            Ok(())
        }
    }

    // ================================================================
    // Internal helpers and queries
    // ================================================================

    impl<T: Config> Pallet<T> {
        /// Store a new incentive and return its id.
        pub fn do_create_incentive(
            issuer: T::AccountId,
            name: BoundedIncentiveName,
            required_xp: Xp,
            supply_limit: ClaimCount,
        ) -> Result<IncentiveId, DispatchError> {
            ensure!(required_xp > 0 && supply_limit > 0, Error::<T>::InvalidParameter);

            let incentive_id = IncentiveCount::<T>::try_mutate(|last| -> Result<IncentiveId, DispatchError> {
                *last = last.checked_add(1).ok_or(Error::<T>::TooManyIncentives)?;
                Ok(*last)
            })?;

            Incentives::<T>::insert(
                incentive_id,
                Incentive {
                    issuer: issuer.clone(),
                    name,
                    required_xp,
                    supply_limit,
                    remaining_supply: supply_limit,
                },
            );

            log::debug!(
                target: LOG_TARGET,
                "incentive {} published by {:?}: {} xp, supply {}",
                incentive_id, issuer, required_xp, supply_limit,
            );
            Self::deposit_event(Event::IncentiveCreated {
                incentive_id,
                issuer,
                required_xp,
                supply_limit,
            });
            Ok(incentive_id)
        }

        /// Claims left for `incentive_id`; zero for unknown ids.
        pub fn remaining_claims(incentive_id: IncentiveId) -> ClaimCount {
            Incentives::<T>::get(incentive_id)
                .map(|incentive| incentive.remaining_supply)
                .unwrap_or(0)
        }

        pub fn incentive(incentive_id: IncentiveId) -> Option<Incentive<T::AccountId>> {
            Incentives::<T>::get(incentive_id)
        }

        pub fn has_claimed(uid: Uid, incentive_id: IncentiveId) -> bool {
            Claimed::<T>::contains_key(uid, incentive_id)
        }

        pub fn incentive_count() -> IncentiveId {
            IncentiveCount::<T>::get()
        }

        pub fn total_claims() -> u64 {
            TotalClaims::<T>::get()
        }

        #[cfg(any(test, feature = "try-runtime"))]
        pub fn do_try_state() -> Result<(), sp_runtime::TryRuntimeError> {
            let last = IncentiveCount::<T>::get();
            let mut consumed: u64 = 0;
            for (id, incentive) in Incentives::<T>::iter() {
                ensure!(id >= 1 && id <= last, "incentive id outside the assigned range");
                ensure!(incentive.required_xp > 0, "incentive with zero cost");
                ensure!(
                    incentive.remaining_supply <= incentive.supply_limit,
                    "remaining supply above its limit"
                );
                consumed = consumed.saturating_add(u64::from(
                    incentive.supply_limit - incentive.remaining_supply,
                ));
            }
            ensure!(
                consumed == Claimed::<T>::iter().count() as u64,
                "consumed supply does not match recorded claims"
            );
            ensure!(consumed == TotalClaims::<T>::get(), "claim counter out of sync");
            Ok(())
        }
    }

    impl<T: Config> IncentiveCatalog<T::AccountId> for Pallet<T> {
        fn issuer_of(incentive: IncentiveId) -> Option<T::AccountId> {
            Incentives::<T>::get(incentive).map(|incentive| incentive.issuer)
        }
    }
}
