use crate as pallet_transfer_guard;
use crate::{AccountRegistry, Invoke, Moment, PriceOracle, SignatureVerifier};
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::{
    construct_runtime,
    traits::{ConstU32, ConstU64, ConstU128, Currency, ExistenceRequirement, Get, UnixTime},
  },
  sp_runtime::{
    BuildStorage,
    traits::{BlakeTwo256, Convert, IdentityLookup},
  },
};

use alloc::{
  collections::{BTreeMap, BTreeSet},
  vec,
  vec::Vec,
};
use core::cell::RefCell;

type Block = polkadot_sdk::frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = u128;

/// Signing key of `WALLET`.
pub const OWNER: AccountId = 1;
pub const BOB: AccountId = 2;
pub const RELAYER: AccountId = 3;
pub const EVE: AccountId = 4;
/// Guarded account.
pub const WALLET: AccountId = 10;
pub const CONTRACT: AccountId = 20;

pub const TOKEN: TestAsset = TestAsset::Local(1);
pub const PRICED_TOKEN: TestAsset = TestAsset::Local(2);
pub const UNPRICED_TOKEN: TestAsset = TestAsset::Local(3);

pub const DAY: Moment = 24 * 60 * 60;
pub const SECURITY_PERIOD: Moment = DAY;
pub const SECURITY_WINDOW: Moment = DAY / 2;
pub const LIMIT_PERIOD: Moment = DAY;
pub const DEFAULT_LIMIT: Balance = 1_000;
pub const GAS_PRICE: Balance = 10;
pub const REFUND_GAS_OVERHEAD: u64 = 20;
pub const GENESIS_TIME: Moment = 1_700_000_000;

pub const TEST_INITIAL_BALANCE: Balance = 1_000_000;

/// Call data that makes the mock contract revert.
pub const REVERT_DATA: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  MaxEncodedLen,
  serde::Serialize,
  serde::Deserialize,
)]
pub enum TestAsset {
  #[default]
  Native,
  Local(u32),
}

/// Stand-in for an owner signature: valid when `signer` owns the account and
/// `digest` matches the request.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct TestSignature {
  pub signer: AccountId,
  pub digest: [u8; 32],
}

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Balances: polkadot_sdk::pallet_balances,
    TransferGuard: pallet_transfer_guard,
  }
);

impl polkadot_sdk::frame_system::Config for Test {
  type BaseCallFilter = polkadot_sdk::frame_support::traits::Everything;
  type BlockWeights = ();
  type BlockLength = ();
  type DbWeight = ();
  type RuntimeOrigin = RuntimeOrigin;
  type RuntimeCall = RuntimeCall;
  type Nonce = u64;
  type Hash = polkadot_sdk::sp_core::H256;
  type Hashing = BlakeTwo256;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Block = Block;
  type RuntimeEvent = RuntimeEvent;
  type BlockHashCount = ConstU64<250>;
  type Version = ();
  type PalletInfo = PalletInfo;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
  type OnNewAccount = ();
  type OnKilledAccount = ();
  type SystemWeightInfo = ();
  type SS58Prefix = ();
  type OnSetCode = ();
  type MaxConsumers = ConstU32<16>;
  type RuntimeTask = ();
  type ExtensionsWeightInfo = ();
  type SingleBlockMigrations = ();
  type MultiBlockMigrator = ();
  type PreInherents = ();
  type PostInherents = ();
  type PostTransactions = ();
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ConstU32<50>;
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type RuntimeEvent = RuntimeEvent;
  type DustRemoval = ();
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = RuntimeHoldReason;
  type RuntimeFreezeReason = RuntimeFreezeReason;
  type DoneSlashHandler = ();
}

pub struct NativeAsset;
impl Get<TestAsset> for NativeAsset {
  fn get() -> TestAsset {
    TestAsset::Native
  }
}

thread_local! {
  static NOW: RefCell<Moment> = const { RefCell::new(0) };

  static OWNERS: RefCell<BTreeMap<AccountId, AccountId>> = RefCell::new(BTreeMap::new());
  static LOCKED: RefCell<BTreeSet<AccountId>> = RefCell::new(BTreeSet::new());
  static REVOKED: RefCell<BTreeSet<AccountId>> = RefCell::new(BTreeSet::new());

  static ASSET_BALANCES: RefCell<BTreeMap<(AccountId, TestAsset), Balance>> =
    RefCell::new(BTreeMap::new());
  static APPROVALS: RefCell<BTreeMap<(AccountId, TestAsset, AccountId), Balance>> =
    RefCell::new(BTreeMap::new());
  static CONTRACT_CALLS: RefCell<Vec<(AccountId, AccountId, Balance, Vec<u8>)>> =
    RefCell::new(Vec::new());

  static PRICES: RefCell<BTreeMap<TestAsset, Balance>> = RefCell::new(BTreeMap::new());
}

pub fn reset_mock_adapters() {
  NOW.with(|n| *n.borrow_mut() = GENESIS_TIME);
  OWNERS.with(|o| {
    let mut o = o.borrow_mut();
    o.clear();
    o.insert(WALLET, OWNER);
  });
  LOCKED.with(|l| l.borrow_mut().clear());
  REVOKED.with(|r| r.borrow_mut().clear());
  ASSET_BALANCES.with(|b| b.borrow_mut().clear());
  APPROVALS.with(|a| a.borrow_mut().clear());
  CONTRACT_CALLS.with(|c| c.borrow_mut().clear());
  PRICES.with(|p| {
    let mut p = p.borrow_mut();
    p.clear();
    p.insert(TOKEN, 1);
    p.insert(PRICED_TOKEN, 5);
  });
}

// ---- clock ----

pub struct MockTime;

impl UnixTime for MockTime {
  fn now() -> core::time::Duration {
    core::time::Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

pub fn now() -> Moment {
  NOW.with(|n| *n.borrow())
}

pub fn set_now(at: Moment) {
  NOW.with(|n| *n.borrow_mut() = at);
}

pub fn advance(secs: Moment) {
  NOW.with(|n| *n.borrow_mut() += secs);
}

// ---- account registry ----

pub fn set_owner(account: AccountId, owner: AccountId) {
  OWNERS.with(|o| {
    o.borrow_mut().insert(account, owner);
  });
}

pub fn lock(account: AccountId) {
  LOCKED.with(|l| {
    l.borrow_mut().insert(account);
  });
}

pub fn unlock(account: AccountId) {
  LOCKED.with(|l| {
    l.borrow_mut().remove(&account);
  });
}

pub fn revoke_module(account: AccountId) {
  REVOKED.with(|r| {
    r.borrow_mut().insert(account);
  });
}

fn owner_of(account: &AccountId) -> Option<AccountId> {
  OWNERS.with(|o| o.borrow().get(account).copied())
}

pub struct MockAccounts;

impl AccountRegistry<AccountId> for MockAccounts {
  fn is_owner(account: &AccountId, who: &AccountId) -> bool {
    owner_of(account) == Some(*who)
  }

  fn is_locked(account: &AccountId) -> bool {
    LOCKED.with(|l| l.borrow().contains(account))
  }

  fn is_module_authorised(account: &AccountId) -> bool {
    !REVOKED.with(|r| r.borrow().contains(account))
  }
}

// ---- signatures ----

pub fn sign(signer: AccountId, digest: [u8; 32]) -> TestSignature {
  TestSignature { signer, digest }
}

pub struct MockVerifier;

impl SignatureVerifier<AccountId, TestSignature> for MockVerifier {
  fn verify(account: &AccountId, digest: &[u8; 32], signature: &TestSignature) -> bool {
    owner_of(account) == Some(signature.signer) && signature.digest == *digest
  }
}

// ---- token ledger ----

pub fn set_asset_balance(who: AccountId, asset: TestAsset, amount: Balance) {
  ASSET_BALANCES.with(|b| {
    b.borrow_mut().insert((who, asset), amount);
  });
}

pub fn get_asset_balance(who: AccountId, asset: TestAsset) -> Balance {
  MockInvoke::balance(&who, asset)
}

pub fn allowance(owner: AccountId, asset: TestAsset, spender: AccountId) -> Balance {
  APPROVALS.with(|a| a.borrow().get(&(owner, asset, spender)).copied().unwrap_or(0))
}

pub fn contract_calls() -> Vec<(AccountId, AccountId, Balance, Vec<u8>)> {
  CONTRACT_CALLS.with(|c| c.borrow().clone())
}

pub struct MockInvoke;

impl Invoke<AccountId, TestAsset, Balance> for MockInvoke {
  fn transfer(
    account: &AccountId,
    asset: TestAsset,
    to: &AccountId,
    amount: Balance,
    _data: &[u8],
  ) -> Result<(), DispatchError> {
    match asset {
      TestAsset::Native => <Balances as Currency<AccountId>>::transfer(
        account,
        to,
        amount,
        ExistenceRequirement::AllowDeath,
      ),
      _ => ASSET_BALANCES.with(|b| {
        let mut b = b.borrow_mut();
        let from_balance = b.get(&(*account, asset)).copied().unwrap_or(0);
        let remaining = from_balance
          .checked_sub(amount)
          .ok_or(DispatchError::Other("InsufficientBalance"))?;
        b.insert((*account, asset), remaining);
        let to_balance = b.get(&(*to, asset)).copied().unwrap_or(0);
        b.insert((*to, asset), to_balance + amount);
        Ok(())
      }),
    }
  }

  fn approve(
    account: &AccountId,
    asset: TestAsset,
    spender: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    APPROVALS.with(|a| {
      a.borrow_mut().insert((*account, asset, *spender), amount);
    });
    Ok(())
  }

  fn call_contract(
    account: &AccountId,
    contract: &AccountId,
    value: Balance,
    data: &[u8],
  ) -> Result<(), DispatchError> {
    if data.starts_with(&REVERT_DATA) {
      return Err(DispatchError::Other("ContractReverted"));
    }
    if value > 0 {
      <Balances as Currency<AccountId>>::transfer(
        account,
        contract,
        value,
        ExistenceRequirement::AllowDeath,
      )?;
    }
    CONTRACT_CALLS.with(|c| c.borrow_mut().push((*account, *contract, value, data.to_vec())));
    Ok(())
  }

  fn balance(who: &AccountId, asset: TestAsset) -> Balance {
    match asset {
      TestAsset::Native => <Balances as Currency<AccountId>>::free_balance(who),
      _ => ASSET_BALANCES.with(|b| b.borrow().get(&(*who, asset)).copied().unwrap_or(0)),
    }
  }
}

// ---- pricing ----

pub fn set_price(asset: TestAsset, price: Balance) {
  PRICES.with(|p| {
    p.borrow_mut().insert(asset, price);
  });
}

/// Fixed price per token unit, in native units.
pub struct MockOracle;

impl PriceOracle<TestAsset, Balance> for MockOracle {
  fn to_common_unit(asset: TestAsset, amount: Balance) -> Result<Balance, DispatchError> {
    let price = PRICES
      .with(|p| p.borrow().get(&asset).copied())
      .ok_or(DispatchError::Other("NoPrice"))?;
    amount
      .checked_mul(price)
      .ok_or(DispatchError::Arithmetic(polkadot_sdk::sp_runtime::ArithmeticError::Overflow))
  }
}

/// One gas unit per microsecond of reference time.
pub struct MockWeightToGas;

impl Convert<Weight, u64> for MockWeightToGas {
  fn convert(weight: Weight) -> u64 {
    weight.ref_time() / 1_000_000
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, TestAsset, Balance, TestSignature> for MockBenchmarkHelper {
  fn asset() -> TestAsset {
    TOKEN
  }

  fn setup_account(owner: &AccountId, asset: TestAsset, amount: Balance) -> AccountId {
    let account = WALLET + 1_000;
    set_owner(account, *owner);
    match asset {
      TestAsset::Native => {
        <Balances as Currency<AccountId>>::make_free_balance_be(&account, amount);
      }
      _ => set_asset_balance(account, asset, amount),
    }
    account
  }

  fn sign(account: &AccountId, digest: &[u8; 32]) -> TestSignature {
    TestSignature {
      signer: owner_of(account).unwrap_or(*account),
      digest: *digest,
    }
  }

  fn advance_time(secs: Moment) {
    advance(secs);
  }
}

impl pallet_transfer_guard::Config for Test {
  type AssetId = TestAsset;
  type Balance = Balance;
  type Signature = TestSignature;
  type NativeAssetId = NativeAsset;
  type Invoke = MockInvoke;
  type PriceOracle = MockOracle;
  type Accounts = MockAccounts;
  type SignatureVerifier = MockVerifier;
  type TimeProvider = MockTime;
  type SecurityPeriod = ConstU64<SECURITY_PERIOD>;
  type SecurityWindow = ConstU64<SECURITY_WINDOW>;
  type LimitPeriod = ConstU64<LIMIT_PERIOD>;
  type DefaultLimit = ConstU128<DEFAULT_LIMIT>;
  type MaxDataLength = ConstU32<64>;
  type RefundGasOverhead = ConstU64<REFUND_GAS_OVERHEAD>;
  type GasPrice = ConstU128<GAS_PRICE>;
  type WeightToGas = MockWeightToGas;
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  new_test_ext_with(pallet_transfer_guard::GenesisConfig::<Test>::default())
}

pub fn new_test_ext_with(
  guard: pallet_transfer_guard::GenesisConfig<Test>,
) -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = polkadot_sdk::frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (OWNER, TEST_INITIAL_BALANCE),
      (WALLET, TEST_INITIAL_BALANCE),
      (RELAYER, TEST_INITIAL_BALANCE),
      (EVE, TEST_INITIAL_BALANCE),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  guard.assimilate_storage(&mut t).unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    reset_mock_adapters();
    set_asset_balance(WALLET, TOKEN, TEST_INITIAL_BALANCE);
    set_asset_balance(WALLET, PRICED_TOKEN, TEST_INITIAL_BALANCE);
    set_asset_balance(WALLET, UNPRICED_TOKEN, TEST_INITIAL_BALANCE);
    polkadot_sdk::frame_system::Pallet::<Test>::set_block_number(1);
  });
  ext
}
