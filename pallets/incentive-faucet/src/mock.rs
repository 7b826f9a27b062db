use crate as pallet_incentive_faucet;
use frame_support::{
    derive_impl,
    traits::{ConstU64, Currency},
};
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

pub const OPERATOR: u64 = 1;
pub const ISSUER: u64 = 2;
pub const ALICE: u64 = 10;
pub const BOB: u64 = 11;

/// Minimum balance of a fresh account.
pub const EXISTENTIAL_DEPOSIT: u64 = 5;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Balances: pallet_balances,
        IdentityRegistry: pallet_identity_registry,
        XpLedger: pallet_xp_ledger,
        Incentives: pallet_incentives,
        Faucet: pallet_incentive_faucet,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
    type AccountData = pallet_balances::AccountData<u64>;
}

#[derive_impl(pallet_balances::config_preludes::TestDefaultConfig)]
impl pallet_balances::Config for Test {
    type AccountStore = System;
    type ExistentialDeposit = ConstU64<EXISTENTIAL_DEPOSIT>;
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

impl pallet_incentives::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Identity = IdentityRegistry;
    type XpLedger = XpLedger;
    type Issuer = Faucet;
    type WeightInfo = pallet_incentives::DefaultWeightInfo;
}

impl pallet_incentive_faucet::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Currency = Balances;
    type Catalog = Incentives;
    type WeightInfo = pallet_incentive_faucet::DefaultWeightInfo;
}

pub fn new_test_ext() -> sp_io::TestExternalities {
    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
    pallet_identity_registry::GenesisConfig::<Test> {
        operator: Some(OPERATOR),
        users: vec![(100, ALICE, 0), (101, BOB, 0)],
    }
    .assimilate_storage(&mut t)
    .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}

/// Sets the free balance of `who`, adjusting total issuance.
pub fn fund(who: u64, amount: u64) {
    let _ = <Balances as Currency<u64>>::make_free_balance_be(&who, amount);
}
