//! # Identity Registry Pallet
//!
//! Binds opaque external user ids (`Uid`) to on-chain accounts, one to one.
//! The binding is maintained in both directions and every mutation updates
//! both maps inside the same dispatch, so at any point:
//!
//! `Accounts[uid] == who  <=>  Uids[who] == uid`
//!
//! ## Responsibilities
//! - Operator-gated `register` / `unregister` / `update_address`
//! - `EnsureOperator` origin capability, reusable by other pallets
//! - Operator handover, callable only by the current operator
//! - `RegistrationHooks` callbacks so the XP ledger follows the user lifecycle
//! - `IdentityInterface` trait for cross-pallet uid/account resolution

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

use frame_support::traits::EnsureOrigin;

pub(crate) const LOG_TARGET: &str = "runtime::identity-registry";

#[frame_support::pallet]
pub mod pallet {
    use super::{EnsureOperator, LOG_TARGET};
    use alloc::vec::Vec;
    use duopow_primitives::*;
    use frame_support::{pallet_prelude::*, traits::EnsureOrigin};
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::TrailingZeroInput;

    // ================================================================
    // Pallet configuration
    // ================================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// The overarching runtime event type.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Origin allowed to bind, rebind and release users.
        /// Chains normally wire this to [`EnsureOperator`].
        type RegistrarOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Ledger callbacks fired when a uid is bound or released.
        type OnRegistration: RegistrationHooks;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn register() -> Weight;
        fn unregister() -> Weight;
        fn update_address() -> Weight;
        fn transfer_operator() -> Weight;
    }

    pub struct DefaultWeightInfo;
    impl WeightInfo for DefaultWeightInfo {
        fn register() -> Weight { Weight::from_parts(40_000_000, 0) }
        fn unregister() -> Weight { Weight::from_parts(35_000_000, 0) }
        fn update_address() -> Weight { Weight::from_parts(35_000_000, 0) }
        fn transfer_operator() -> Weight { Weight::from_parts(15_000_000, 0) }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ================================================================
    // Storage
    // ================================================================

    /// The privileged operator. Reports XP and manages registrations.
    #[pallet::storage]
    pub type Operator<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

    /// Map: Uid → AccountId.
    #[pallet::storage]
    pub type Accounts<T: Config> =
        StorageMap<_, Blake2_128Concat, Uid, T::AccountId, OptionQuery>;

    /// Map: AccountId → Uid. Reverse of `Accounts`.
    #[pallet::storage]
    pub type Uids<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, Uid, OptionQuery>;

    /// Number of currently bound uids.
    #[pallet::storage]
    pub type UserCount<T: Config> = StorageValue<_, u32, ValueQuery>;

    // ================================================================
    // Genesis config: bootstrap the operator and known users
    // ================================================================

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Initial operator. Without one, no privileged call can ever pass
        /// `EnsureOperator`.
        pub operator: Option<T::AccountId>,
        /// Users bound at genesis: (uid, account, initial cumulative XP).
        pub users: Vec<(Uid, T::AccountId, Xp)>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            if let Some(operator) = &self.operator {
                Operator::<T>::put(operator);
            }
            for (uid, account, initial_xp) in &self.users {
                Pallet::<T>::do_register(*uid, account.clone(), *initial_xp)
                    .expect("genesis users must have distinct uids and non-null accounts");
            }
        }
    }

    // ================================================================
    // Events
    // ================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A uid was bound, rebound, or released (`account: None`).
        RegistrationUpdated {
            uid: Uid,
            account: Option<T::AccountId>,
        },
        /// The operator role moved to a new account.
        OperatorChanged {
            old: T::AccountId,
            new: T::AccountId,
        },
    }

    // ================================================================
    // Errors
    // ================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// The uid or the account is already bound.
        AlreadyRegistered,
        /// The uid or the account is not bound.
        NotRegistered,
        /// The null (all-zero) account cannot be bound.
        InvalidAddress,
    }

    // ================================================================
    // Hooks
    // ================================================================

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
        /// Bind `uid` to `account`.
        ///
        /// `initial_xp` is the user's cumulative XP at registration time. It
        /// is recorded as the baseline but never credited as spendable.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::register())]
        pub fn register(
            origin: OriginFor<T>,
            uid: Uid,
            account: T::AccountId,
            initial_xp: Xp,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;
            Self::do_register(uid, account, initial_xp)
        }

        /// Release `uid`. Its ledger state is deleted, not paused.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::unregister())]
        pub fn unregister(origin: OriginFor<T>, uid: Uid) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;

            let account = Accounts::<T>::take(uid).ok_or(Error::<T>::NotRegistered)?;
            Uids::<T>::remove(&account);
            UserCount::<T>::mutate(|c| *c = c.saturating_sub(1));
            T::OnRegistration::on_unregistered(uid);

            log::debug!(target: LOG_TARGET, "uid {} released from {:?}", uid, account);
            Self::deposit_event(Event::RegistrationUpdated { uid, account: None });
            Ok(())
        }

        /// Point `uid` at `new_account`, keeping its ledger state.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::update_address())]
        pub fn update_address(
            origin: OriginFor<T>,
            uid: Uid,
            new_account: T::AccountId,
        ) -> DispatchResult {
            T::RegistrarOrigin::ensure_origin(origin)?;

            let old_account = Accounts::<T>::get(uid).ok_or(Error::<T>::NotRegistered)?;
            ensure!(!Self::is_null_account(&new_account), Error::<T>::InvalidAddress);
            // Also rejects rebinding to the current account.
            ensure!(!Uids::<T>::contains_key(&new_account), Error::<T>::AlreadyRegistered);

            Uids::<T>::remove(&old_account);
            Uids::<T>::insert(&new_account, uid);
            Accounts::<T>::insert(uid, &new_account);

            log::debug!(
                target: LOG_TARGET,
                "uid {} moved from {:?} to {:?}", uid, old_account, new_account,
            );
            Self::deposit_event(Event::RegistrationUpdated { uid, account: Some(new_account) });
            Ok(())
        }

        /// Hand the operator role to `new_operator`.
        /// Only the current operator can do this.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::transfer_operator())]
        pub fn transfer_operator(
            origin: OriginFor<T>,
            new_operator: T::AccountId,
        ) -> DispatchResult {
            let old = EnsureOperator::<T>::ensure_origin(origin)?;
            Operator::<T>::put(&new_operator);

            log::debug!(target: LOG_TARGET, "operator moved from {:?} to {:?}", old, new_operator);
            Self::deposit_event(Event::OperatorChanged { old, new: new_operator });
            Ok(())
        }
    }

    // ================================================================
    // Internal helpers and queries
    // ================================================================

    impl<T: Config> Pallet<T> {
        pub(crate) fn do_register(
            uid: Uid,
            account: T::AccountId,
            initial_xp: Xp,
        ) -> DispatchResult {
            ensure!(!Accounts::<T>::contains_key(uid), Error::<T>::AlreadyRegistered);
            ensure!(!Self::is_null_account(&account), Error::<T>::InvalidAddress);
            ensure!(!Uids::<T>::contains_key(&account), Error::<T>::AlreadyRegistered);

            Accounts::<T>::insert(uid, &account);
            Uids::<T>::insert(&account, uid);
            UserCount::<T>::mutate(|c| *c = c.saturating_add(1));
            T::OnRegistration::on_registered(uid, initial_xp);

            log::debug!(
                target: LOG_TARGET,
                "uid {} bound to {:?} at {} xp", uid, account, initial_xp,
            );
            Self::deposit_event(Event::RegistrationUpdated { uid, account: Some(account) });
            Ok(())
        }

        /// The account whose SCALE encoding is all zeroes.
        fn is_null_account(who: &T::AccountId) -> bool {
            T::AccountId::decode(&mut TrailingZeroInput::zeroes())
                .map(|null| &null == who)
                .unwrap_or(false)
        }

        /// Uid bound to `who`.
        pub fn resolve_uid(who: &T::AccountId) -> Result<Uid, DispatchError> {
            Uids::<T>::get(who).ok_or_else(|| Error::<T>::NotRegistered.into())
        }

        pub fn account_of(uid: Uid) -> Option<T::AccountId> {
            Accounts::<T>::get(uid)
        }

        pub fn operator() -> Option<T::AccountId> {
            Operator::<T>::get()
        }

        pub fn user_count() -> u32 {
            UserCount::<T>::get()
        }

        /// Checks that both maps mirror each other and the counter matches.
        #[cfg(any(test, feature = "try-runtime"))]
        pub fn do_try_state() -> Result<(), sp_runtime::TryRuntimeError> {
            let mut bound: u32 = 0;
            for (uid, account) in Accounts::<T>::iter() {
                ensure!(
                    Uids::<T>::get(&account) == Some(uid),
                    "account bound to a uid does not map back to it"
                );
                bound = bound.saturating_add(1);
            }
            for (account, uid) in Uids::<T>::iter() {
                ensure!(
                    Accounts::<T>::get(uid).as_ref() == Some(&account),
                    "uid bound to an account does not map back to it"
                );
            }
            ensure!(bound == UserCount::<T>::get(), "user count out of sync");
            Ok(())
        }
    }

    impl<T: Config> IdentityInterface<T::AccountId> for Pallet<T> {
        fn uid_of(who: &T::AccountId) -> Option<Uid> {
            Uids::<T>::get(who)
        }

        fn account_of(uid: Uid) -> Option<T::AccountId> {
            Accounts::<T>::get(uid)
        }
    }
}

/// Origin check that admits only a signed origin from the current operator.
///
/// Yields the operator account on success.
pub struct EnsureOperator<T>(core::marker::PhantomData<T>);

impl<T: Config> EnsureOrigin<T::RuntimeOrigin> for EnsureOperator<T> {
    type Success = T::AccountId;

    fn try_origin(o: T::RuntimeOrigin) -> Result<Self::Success, T::RuntimeOrigin> {
        let raw: Result<frame_system::RawOrigin<T::AccountId>, T::RuntimeOrigin> = o.into();
        raw.and_then(|o| match o {
            frame_system::RawOrigin::Signed(who) if Operator::<T>::get().as_ref() == Some(&who) => {
                Ok(who)
            }
            r => Err(T::RuntimeOrigin::from(r)),
        })
    }

    #[cfg(feature = "runtime-benchmarks")]
    fn try_successful_origin() -> Result<T::RuntimeOrigin, ()> {
        Operator::<T>::get()
            .map(|who| frame_system::RawOrigin::Signed(who).into())
            .ok_or(())
    }
}
