use crate as pallet_xp_ledger;
use duopow_primitives::{Uid, Xp};
use frame_support::derive_impl;
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

pub const OPERATOR: u64 = 1;
pub const ALICE: u64 = 10;
pub const BOB: u64 = 11;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        IdentityRegistry: pallet_identity_registry,
        XpLedger: pallet_xp_ledger,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

impl pallet_identity_registry::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type RegistrarOrigin = pallet_identity_registry::EnsureOperator<Test>;
    type OnRegistration = XpLedger;
    type WeightInfo = pallet_identity_registry::DefaultWeightInfo;
}

impl pallet_xp_ledger::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type ReporterOrigin = pallet_identity_registry::EnsureOperator<Test>;
    type Identity = IdentityRegistry;
    type WeightInfo = pallet_xp_ledger::DefaultWeightInfo;
}

pub fn new_test_ext() -> sp_io::TestExternalities {
    new_test_ext_with_users(vec![])
}

pub fn new_test_ext_with_users(users: Vec<(Uid, u64, Xp)>) -> sp_io::TestExternalities {
    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
    pallet_identity_registry::GenesisConfig::<Test> { operator: Some(OPERATOR), users }
        .assimilate_storage(&mut t)
        .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
