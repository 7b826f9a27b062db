//! # XP Ledger Pallet
//!
//! Holds the cumulative XP the operator has reported for each registered uid
//! and the spendable balance derived from it. Reports must strictly increase;
//! each accepted report credits exactly `new - old` to the spendable balance.
//!
//! XP earned before registration is the baseline: it is stored as
//! `cumulative_xp` but never credited.
//!
//! Records are created and deleted by the identity registry through
//! `RegistrationHooks`, so a record exists exactly while its uid is bound.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod mock;

pub(crate) const LOG_TARGET: &str = "runtime::xp-ledger";

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use duopow_primitives::*;
    use frame_support::{pallet_prelude::*, traits::EnsureOrigin};
    use frame_system::pallet_prelude::*;

    /// Per-uid XP state.
    #[derive(Clone, Copy, PartialEq, Eq, Encode, Decode, MaxEncodedLen, TypeInfo, Debug, Default)]
    pub struct XpRecord {
        /// Last reported cumulative XP. Never decreases.
        pub cumulative_xp: Xp,
        /// XP credited since registration and not yet spent on claims.
        pub spendable: Xp,
    }

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Origin allowed to report XP (the trusted operator).
        type ReporterOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Interface to the identity registry (trait, not concrete type).
        type Identity: IdentityInterface<Self::AccountId>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn report_xp() -> Weight;
    }

    pub struct DefaultWeightInfo;
    impl WeightInfo for DefaultWeightInfo {
        fn report_xp() -> Weight { Weight::from_parts(30_000_000, 0) }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Map: Uid → XpRecord.
    #[pallet::storage]
    pub type XpRecords<T: Config> = StorageMap<_, Blake2_128Concat, Uid, XpRecord, OptionQuery>;

    /// Total XP ever credited to spendable balances.
    #[pallet::storage]
    pub type TotalXpCredited<T: Config> = StorageValue<_, u128, ValueQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A new cumulative XP value was accepted.
        XpUpdated {
            uid: Uid,
            xp: Xp,
            /// Amount added to the spendable balance.
            credited: Xp,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// The uid (or account) has no ledger record.
        NotRegistered,
        /// Reported XP is not strictly greater than the stored value.
        NonMonotonicXp,
        /// Spendable balance is lower than the requested debit.
        InsufficientBalance,
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        #[cfg(feature = "try-runtime")]
        fn try_state(_n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
            Self::do_try_state()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Report the new cumulative XP of `uid`.
        ///
        /// XP is assumed never to be revoked upstream, so any value that is
        /// not strictly greater than the stored one is rejected.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::report_xp())]
        pub fn report_xp(origin: OriginFor<T>, uid: Uid, new_xp: Xp) -> DispatchResult {
            T::ReporterOrigin::ensure_origin(origin)?;

            let credited = XpRecords::<T>::try_mutate(uid, |maybe_record| -> Result<Xp, DispatchError> {
                let record = maybe_record.as_mut().ok_or(Error::<T>::NotRegistered)?;
                ensure!(new_xp > record.cumulative_xp, Error::<T>::NonMonotonicXp);

                // Cannot underflow: `new_xp > cumulative_xp` was just checked.
                let delta = new_xp - record.cumulative_xp;
                // spendable <= cumulative_xp - baseline, so this stays <= new_xp.
                record.spendable = record.spendable.saturating_add(delta);
                record.cumulative_xp = new_xp;
                Ok(delta)
            })?;

            TotalXpCredited::<T>::mutate(|t| *t = t.saturating_add(u128::from(credited)));

            log::debug!(target: LOG_TARGET, "uid {} reported {} xp (+{})", uid, new_xp, credited);
            Self::deposit_event(Event::XpUpdated { uid, xp: new_xp, credited });
            Ok(())
        }
    }

    impl<T: Config> Pallet<T> {
        /// Spendable balance of the uid bound to `who`.
        pub fn balance_of(who: &T::AccountId) -> Result<Xp, DispatchError> {
            T::Identity::uid_of(who)
                .and_then(|uid| XpRecords::<T>::get(uid))
                .map(|record| record.spendable)
                .ok_or_else(|| Error::<T>::NotRegistered.into())
        }

        pub fn record(uid: Uid) -> Option<XpRecord> {
            XpRecords::<T>::get(uid)
        }

        pub fn total_xp_credited() -> u128 {
            TotalXpCredited::<T>::get()
        }

        /// Every record belongs to a bound uid and never holds more
        /// spendable XP than it has reported.
        #[cfg(any(test, feature = "try-runtime"))]
        pub fn do_try_state() -> Result<(), sp_runtime::TryRuntimeError> {
            for (uid, record) in XpRecords::<T>::iter() {
                ensure!(T::Identity::account_of(uid).is_some(), "ledger record for unbound uid");
                ensure!(
                    record.spendable <= record.cumulative_xp,
                    "spendable balance exceeds reported xp"
                );
            }
            Ok(())
        }
    }

    impl<T: Config> RegistrationHooks for Pallet<T> {
        fn on_registered(uid: Uid, initial_xp: Xp) {
            XpRecords::<T>::insert(uid, XpRecord { cumulative_xp: initial_xp, spendable: 0 });
        }

        fn on_unregistered(uid: Uid) {
            XpRecords::<T>::remove(uid);
        }
    }

    impl<T: Config> XpLedgerInterface for Pallet<T> {
        fn spendable_of(uid: Uid) -> Option<Xp> {
            XpRecords::<T>::get(uid).map(|record| record.spendable)
        }

        fn debit(uid: Uid, amount: Xp) -> DispatchResult {
            XpRecords::<T>::try_mutate(uid, |maybe_record| -> DispatchResult {
                let record = maybe_record.as_mut().ok_or(Error::<T>::NotRegistered)?;
                record.spendable = record
                    .spendable
                    .checked_sub(amount)
                    .ok_or(Error::<T>::InsufficientBalance)?;
                log::debug!(
                    target: LOG_TARGET,
                    "uid {} spent {} xp, {} left", uid, amount, record.spendable,
                );
                Ok(())
            })
        }
    }
}
