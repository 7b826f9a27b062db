use crate as pallet_identity_registry;
use core::cell::RefCell;
use duopow_primitives::{RegistrationHooks, Uid, Xp};
use frame_support::derive_impl;
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

pub const OPERATOR: u64 = 1;
pub const ALICE: u64 = 10;
pub const BOB: u64 = 11;
pub const CHARLIE: u64 = 12;
/// Encodes to all zeroes.
pub const NULL: u64 = 0;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        IdentityRegistry: pallet_identity_registry,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

impl pallet_identity_registry::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type RegistrarOrigin = pallet_identity_registry::EnsureOperator<Test>;
    type OnRegistration = RecordingHooks;
    type WeightInfo = pallet_identity_registry::DefaultWeightInfo;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookCall {
    Registered(Uid, Xp),
    Unregistered(Uid),
}

thread_local! {
    static HOOK_CALLS: RefCell<Vec<HookCall>> = RefCell::new(Vec::new());
}

/// Records every lifecycle callback in place of the XP ledger.
pub struct RecordingHooks;

impl RegistrationHooks for RecordingHooks {
    fn on_registered(uid: Uid, initial_xp: Xp) {
        HOOK_CALLS.with(|c| c.borrow_mut().push(HookCall::Registered(uid, initial_xp)));
    }

    fn on_unregistered(uid: Uid) {
        HOOK_CALLS.with(|c| c.borrow_mut().push(HookCall::Unregistered(uid)));
    }
}

pub fn hook_calls() -> Vec<HookCall> {
    HOOK_CALLS.with(|c| c.borrow().clone())
}

pub fn new_test_ext() -> sp_io::TestExternalities {
    new_test_ext_with_users(vec![])
}

pub fn new_test_ext_with_users(users: Vec<(Uid, u64, Xp)>) -> sp_io::TestExternalities {
    HOOK_CALLS.with(|c| c.borrow_mut().clear());

    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
    pallet_identity_registry::GenesisConfig::<Test> { operator: Some(OPERATOR), users }
        .assimilate_storage(&mut t)
        .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
