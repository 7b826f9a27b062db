use crate as pallet_incentives;
use core::cell::RefCell;
use duopow_primitives::{ClaimCount, IncentiveId, IncentiveIssuer, Xp};
use frame_support::{derive_impl, weights::Weight};
use sp_runtime::{BuildStorage, DispatchError, DispatchResult};

type Block = frame_system::mocking::MockBlock<Test>;

pub const OPERATOR: u64 = 1;
pub const ISSUER: u64 = 2;
pub const ALICE: u64 = 10;
pub const BOB: u64 = 11;
pub const CHARLIE: u64 = 12;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        IdentityRegistry: pallet_identity_registry,
        XpLedger: pallet_xp_ledger,
        Incentives: pallet_incentives,
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

impl pallet_incentives::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Identity = IdentityRegistry;
    type XpLedger = XpLedger;
    type Issuer = MockIssuer;
    type WeightInfo = pallet_incentives::DefaultWeightInfo;
}

/// How `MockIssuer` reacts to a delivery request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuerBehaviour {
    Deliver,
    Fail,
    /// Calls `claim` again for the same receiver and incentive before
    /// returning success.
    Reenter,
}

/// What the issuer saw from inside a reentrant delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReentryObservation {
    pub spendable: Option<Xp>,
    pub remaining: ClaimCount,
    pub claimed: bool,
    pub nested_claim: DispatchResult,
}

thread_local! {
    static BEHAVIOUR: RefCell<IssuerBehaviour> = RefCell::new(IssuerBehaviour::Deliver);
    static DELIVERIES: RefCell<Vec<(u64, IncentiveId, u64)>> = RefCell::new(Vec::new());
    static REENTRY: RefCell<Option<ReentryObservation>> = RefCell::new(None);
}

pub fn set_issuer_behaviour(behaviour: IssuerBehaviour) {
    BEHAVIOUR.with(|b| *b.borrow_mut() = behaviour);
}

/// Successful deliveries as (issuer, incentive, receiver).
pub fn deliveries() -> Vec<(u64, IncentiveId, u64)> {
    DELIVERIES.with(|d| d.borrow().clone())
}

pub fn reentry_observation() -> Option<ReentryObservation> {
    REENTRY.with(|r| r.borrow().clone())
}

pub struct MockIssuer;

pub const DELIVERY_WEIGHT: Weight = Weight::from_parts(7_000_000, 0);

impl IncentiveIssuer<u64> for MockIssuer {
    fn claim(issuer: &u64, incentive: IncentiveId, receiver: &u64) -> DispatchResult {
        match BEHAVIOUR.with(|b| *b.borrow()) {
            IssuerBehaviour::Deliver => {}
            IssuerBehaviour::Fail => return Err(DispatchError::Other("issuer out of stock")),
            IssuerBehaviour::Reenter => {
                let uid = IdentityRegistry::resolve_uid(receiver).ok();
                let observation = ReentryObservation {
                    spendable: XpLedger::balance_of(receiver).ok(),
                    remaining: Incentives::remaining_claims(incentive),
                    claimed: uid.map(|uid| Incentives::has_claimed(uid, incentive)).unwrap_or(false),
                    nested_claim: Incentives::claim(RuntimeOrigin::signed(*receiver), incentive),
                };
                REENTRY.with(|r| *r.borrow_mut() = Some(observation));
            }
        }
        DELIVERIES.with(|d| d.borrow_mut().push((*issuer, incentive, *receiver)));
        Ok(())
    }

    fn deliver_weight() -> Weight {
        DELIVERY_WEIGHT
    }
}

pub fn new_test_ext() -> sp_io::TestExternalities {
    BEHAVIOUR.with(|b| *b.borrow_mut() = IssuerBehaviour::Deliver);
    DELIVERIES.with(|d| d.borrow_mut().clear());
    REENTRY.with(|r| *r.borrow_mut() = None);

    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
    pallet_identity_registry::GenesisConfig::<Test> { operator: Some(OPERATOR), users: vec![] }
        .assimilate_storage(&mut t)
        .unwrap();

    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
