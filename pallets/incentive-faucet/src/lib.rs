//! # Incentive Faucet Pallet
//!
//! A token faucet that plugs into claim settlement as an incentive issuer.
//!
//! The issuer of an incentive attaches a reward program to it: a fixed
//! amount of the chain currency. Every settled claim of that incentive then
//! transfers the amount from the issuer's own free balance to the claimer.
//! The faucet never creates currency, so total issuance is unaffected.
//!
//! Without a program, or when the issuer cannot pay without being reaped,
//! delivery fails and the claim is reverted.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod mock;

pub(crate) const LOG_TARGET: &str = "runtime::incentive-faucet";

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use duopow_primitives::*;
    use frame_support::{
        pallet_prelude::*,
        traits::{Currency, ExistenceRequirement},
    };
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::{Saturating, Zero};

    pub type BalanceOf<T> =
        <<T as Config>::Currency as Currency<<T as frame_system::Config>::AccountId>>::Balance;

    // ================================================================
    // Config
    // ================================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Currency the rewards are paid in.
        type Currency: Currency<Self::AccountId>;

        /// Source of truth for which account issued an incentive.
        type Catalog: IncentiveCatalog<Self::AccountId>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn set_reward() -> Weight;
        fn clear_reward() -> Weight;
        fn deliver() -> Weight;
    }

    pub struct DefaultWeightInfo;
    impl WeightInfo for DefaultWeightInfo {
        fn set_reward() -> Weight { Weight::from_parts(25_000_000, 0) }
        fn clear_reward() -> Weight { Weight::from_parts(20_000_000, 0) }
        fn deliver() -> Weight { Weight::from_parts(55_000_000, 0) }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ================================================================
    // Storage
    // ================================================================

    /// Reward paid per claim, keyed by (issuer, incentive).
    #[pallet::storage]
    pub type RewardPrograms<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat, T::AccountId,
        Blake2_128Concat, IncentiveId,
        BalanceOf<T>,
        OptionQuery,
    >;

    /// Everything issuers have paid out through the faucet so far.
    #[pallet::storage]
    pub type TotalPaid<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

    // ================================================================
    // Events
    // ================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        RewardConfigured {
            incentive_id: IncentiveId,
            issuer: T::AccountId,
            amount: BalanceOf<T>,
        },
        RewardCleared {
            incentive_id: IncentiveId,
            issuer: T::AccountId,
        },
        /// A claim of `incentive_id` paid `amount` from `issuer` to `receiver`.
        RewardDelivered {
            incentive_id: IncentiveId,
            issuer: T::AccountId,
            receiver: T::AccountId,
            amount: BalanceOf<T>,
        },
    }

    // ================================================================
    // Errors
    // ================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// The catalog has no incentive with this id.
        UnknownIncentive,
        /// Only the incentive's issuer may manage its reward.
        NotIssuer,
        /// A reward of zero would deliver nothing.
        ZeroReward,
        /// No reward program is attached to this incentive.
        NoRewardProgram,
    }

    // ================================================================
    // Extrinsics
    // ================================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Attach or replace the reward paid for each claim of `incentive_id`.
        ///
        /// Each payout is taken from the issuer's free balance at delivery.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::set_reward())]
        pub fn set_reward(
            origin: OriginFor<T>,
            incentive_id: IncentiveId,
            amount: BalanceOf<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_issuer(&who, incentive_id)?;
            ensure!(!amount.is_zero(), Error::<T>::ZeroReward);

            RewardPrograms::<T>::insert(&who, incentive_id, amount);

            Self::deposit_event(Event::RewardConfigured { incentive_id, issuer: who, amount });
            Ok(())
        }

        /// Detach the reward program. Later claims of the incentive fail
        /// delivery until a new reward is set.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::clear_reward())]
        pub fn clear_reward(origin: OriginFor<T>, incentive_id: IncentiveId) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_issuer(&who, incentive_id)?;
            ensure!(
                RewardPrograms::<T>::take(&who, incentive_id).is_some(),
                Error::<T>::NoRewardProgram
            );

            Self::deposit_event(Event::RewardCleared { incentive_id, issuer: who });
            Ok(())
        }
    }

    // ================================================================
    // Helpers and queries
    // ================================================================

    impl<T: Config> Pallet<T> {
        fn ensure_issuer(who: &T::AccountId, incentive_id: IncentiveId) -> DispatchResult {
            let issuer = T::Catalog::issuer_of(incentive_id).ok_or(Error::<T>::UnknownIncentive)?;
            ensure!(&issuer == who, Error::<T>::NotIssuer);
            Ok(())
        }

        /// Free currency balance of `who`.
        pub fn reward_balance(who: &T::AccountId) -> BalanceOf<T> {
            T::Currency::free_balance(who)
        }

        pub fn reward_of(issuer: &T::AccountId, incentive_id: IncentiveId) -> Option<BalanceOf<T>> {
            RewardPrograms::<T>::get(issuer, incentive_id)
        }

        pub fn total_paid() -> BalanceOf<T> {
            TotalPaid::<T>::get()
        }
    }

    impl<T: Config> IncentiveIssuer<T::AccountId> for Pallet<T> {
        fn claim(
            issuer: &T::AccountId,
            incentive: IncentiveId,
            receiver: &T::AccountId,
        ) -> DispatchResult {
            let amount =
                RewardPrograms::<T>::get(issuer, incentive).ok_or(Error::<T>::NoRewardProgram)?;

            T::Currency::transfer(issuer, receiver, amount, ExistenceRequirement::KeepAlive)?;

            TotalPaid::<T>::mutate(|total| *total = total.saturating_add(amount));

            log::debug!(
                target: LOG_TARGET,
                "{:?} paid {:?} to {:?} for incentive {}",
                issuer, amount, receiver, incentive,
            );
            Self::deposit_event(Event::RewardDelivered {
                incentive_id: incentive,
                issuer: issuer.clone(),
                receiver: receiver.clone(),
                amount,
            });
            Ok(())
        }

        fn deliver_weight() -> Weight {
            T::WeightInfo::deliver()
        }
    }
}
