//! Transfer Guard Pallet
//!
//! Authorizes outbound value movements of guarded accounts. Every owner request
//! (token transfer, token approval, contract call) either executes at once,
//! because the destination is whitelisted or the amount fits in the rolling
//! daily limit, or is parked as a time-locked pending action that anyone may
//! execute once its security period has passed.
//!
//! Owner requests can also be relayed: a third party submits a request signed
//! by the owner and is reimbursed out of the account, with the reimbursement
//! charged against the same daily limit.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{AccountRegistry, Invoke, PriceOracle, SignatureVerifier};

pub mod limit;
pub use limit::{DailyLimit, LimitChangeError};

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId, Balance, Signature> {
  /// A priced, non-native asset.
  fn asset() -> AssetId;

  /// Register a fresh unlocked account owned by `owner`, holding `amount` of `asset`.
  fn setup_account(owner: &AccountId, asset: AssetId, amount: Balance) -> AccountId;

  /// Signature accepted by the configured verifier for `account` over `digest`.
  fn sign(account: &AccountId, digest: &[u8; 32]) -> Signature;

  /// Move the clock read through `TimeProvider` forward by `secs`.
  fn advance_time(secs: Moment);
}

pub(crate) const LOG_TARGET: &str = "runtime::transfer-guard";

/// Domain tag mixed into relayed request digests.
pub const RELAY_DIGEST_TAG: &[u8; 20] = b"transfer-guard/relay";

/// Activation time given to whitelist entries seeded at genesis.
pub const GENESIS_ACTIVATION: Moment = 1;

#[frame::pallet]
pub mod pallet {
  use crate::{
    AccountRegistry, ActionKind, DailyLimit, Fingerprint, Invoke, LOG_TARGET, LimitChangeError,
    Moment, OwnerRequest, PendingAction, PriceOracle, RELAY_DIGEST_TAG, SignatureVerifier,
    WeightInfo, GENESIS_ACTIVATION, is_forbidden_selector,
  };
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{storage::with_storage_layer, traits::UnixTime},
    sp_runtime::traits::{Bounded, CheckedMul, Convert, Zero},
  };

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type AssetId: Parameter + Member + Copy + MaybeSerializeDeserialize + MaxEncodedLen;

    /// Amounts of any asset and of the common unit the limit is expressed in.
    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaybeSerializeDeserialize
      + MaxEncodedLen;

    /// Owner signature over a relayed request digest.
    type Signature: Parameter;

    /// Native currency; its amounts are already in the common unit.
    #[pallet::constant]
    type NativeAssetId: Get<Self::AssetId>;

    type Invoke: Invoke<Self::AccountId, Self::AssetId, Self::Balance>;
    type PriceOracle: PriceOracle<Self::AssetId, Self::Balance>;
    type Accounts: AccountRegistry<Self::AccountId>;
    type SignatureVerifier: SignatureVerifier<Self::AccountId, Self::Signature>;
    type TimeProvider: UnixTime;

    /// Delay before whitelist entries, limit changes and pending actions take effect
    #[pallet::constant]
    type SecurityPeriod: Get<Moment>;

    /// How long a pending action stays executable once its security period is over
    #[pallet::constant]
    type SecurityWindow: Get<Moment>;

    /// Length of the rolling spending window
    #[pallet::constant]
    type LimitPeriod: Get<Moment>;

    /// Limit given to an account the first time the guard sees it
    #[pallet::constant]
    type DefaultLimit: Get<Self::Balance>;

    #[pallet::constant]
    type MaxDataLength: Get<u32> + 'static;

    /// Gas charged on top of the relayed request itself
    #[pallet::constant]
    type RefundGasOverhead: Get<u64>;

    /// Network gas price in the common unit; caps what a relayer may claim per gas
    #[pallet::constant]
    type GasPrice: Get<Self::Balance>;

    /// Gas accounted for a relayed request of the given weight
    type WeightToGas: Convert<Weight, u64>;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<
        Self::AccountId,
        Self::AssetId,
        Self::Balance,
        Self::Signature,
      >;

    type WeightInfo: WeightInfo;
  }

  pub type BalanceOf<T> = <T as Config>::Balance;
  pub type AssetIdOf<T> = <T as Config>::AssetId;
  pub type CallDataOf<T> = BoundedVec<u8, <T as Config>::MaxDataLength>;

  pub type OwnerRequestOf<T> = OwnerRequest<
    <T as frame_system::Config>::AccountId,
    <T as Config>::AssetId,
    <T as Config>::Balance,
    CallDataOf<T>,
  >;

  pub type PendingActionOf<T> = PendingAction<
    <T as frame_system::Config>::AccountId,
    <T as Config>::AssetId,
    <T as Config>::Balance,
    CallDataOf<T>,
    BlockNumberFor<T>,
  >;

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Daily limit state per account; created on first use.
  #[pallet::storage]
  pub type Limits<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, DailyLimit<T::Balance>, OptionQuery>;

  /// Activation time of trusted destinations; 0 means not whitelisted.
  #[pallet::storage]
  pub type Whitelist<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    T::AccountId,
    Blake2_128Concat,
    T::AccountId,
    Moment,
    ValueQuery,
  >;

  /// Earliest execution time of each live pending action.
  #[pallet::storage]
  pub type PendingActions<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    T::AccountId,
    Blake2_128Concat,
    Fingerprint,
    Moment,
    OptionQuery,
  >;

  /// Highest nonce consumed by a relayed request.
  #[pallet::storage]
  pub type RelayNonces<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, u64, ValueQuery>;

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    /// Accounts starting with a limit other than `DefaultLimit`.
    pub limits: Vec<(T::AccountId, T::Balance)>,
    /// `(account, target)` pairs trusted from the first block.
    pub whitelist: Vec<(T::AccountId, T::AccountId)>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      for (account, limit) in &self.limits {
        Limits::<T>::insert(account, DailyLimit::new(*limit));
      }
      for (account, target) in &self.whitelist {
        Whitelist::<T>::insert(account, target, GENESIS_ACTIVATION);
      }
    }
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn integrity_test() {
      assert!(T::LimitPeriod::get() > 0, "LimitPeriod must be non-zero");
    }
  }

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    Transferred {
      account: T::AccountId,
      token: T::AssetId,
      to: T::AccountId,
      amount: T::Balance,
      data: CallDataOf<T>,
    },
    Approved {
      account: T::AccountId,
      token: T::AssetId,
      spender: T::AccountId,
      amount: T::Balance,
    },
    CalledContract {
      account: T::AccountId,
      contract: T::AccountId,
      value: T::Balance,
      data: CallDataOf<T>,
    },
    PendingActionCreated {
      account: T::AccountId,
      kind: ActionKind,
      fingerprint: Fingerprint,
      execute_after: Moment,
    },
    PendingActionExecuted {
      account: T::AccountId,
      kind: ActionKind,
      fingerprint: Fingerprint,
    },
    PendingActionCancelled {
      account: T::AccountId,
      fingerprint: Fingerprint,
    },
    AddedToWhitelist {
      account: T::AccountId,
      target: T::AccountId,
      whitelist_after: Moment,
    },
    RemovedFromWhitelist {
      account: T::AccountId,
      target: T::AccountId,
    },
    LimitChanged {
      account: T::AccountId,
      new_limit: T::Balance,
      start_after: Moment,
    },
    RelayedRequestExecuted {
      account: T::AccountId,
      relayer: T::AccountId,
      nonce: u64,
    },
    RelayedRequestFailed {
      account: T::AccountId,
      relayer: T::AccountId,
      nonce: u64,
      error: DispatchError,
    },
    Refunded {
      account: T::AccountId,
      relayer: T::AccountId,
      token: T::AssetId,
      amount: T::Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// The account is locked
    AccountLocked,
    /// Caller does not own the account
    NotOwner,
    AlreadyWhitelisted,
    NotWhitelisted,
    /// An identical action created in the same block is already pending
    DuplicatePendingAction,
    NoSuchPendingAction,
    /// The pending action is not yet executable or its window has lapsed
    OutsideExecutionWindow,
    /// Token transfer and approval selectors cannot go through the generic call path
    ForbiddenMethod,
    InvalidSignature,
    ArithmeticOverflow,
    /// Nothing is scheduled and the requested limit is already in force
    LimitUnchanged,
    /// Native currency has no allowance to approve
    NativeApproval,
    /// Relay nonce must exceed the last one used by the account
    InvalidNonce,
    /// The account no longer lets the guard pay relayers
    RefundNotAuthorised,
    /// The account cannot cover the worst-case relayer refund
    InsufficientRefundBalance,
    /// The relayer refund does not fit in the daily limit
    RefundAboveDailyLimit,
    /// The quoted refund token price is worth more than the network gas price
    RefundPriceTooHigh,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Transfer `amount` of `token` to `to`, deferring it when neither the
    /// whitelist nor the daily limit allows it.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::transfer_token())]
    pub fn transfer_token(
      origin: OriginFor<T>,
      account: T::AccountId,
      token: T::AssetId,
      to: T::AccountId,
      amount: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_transfer(&account, token, to, amount, data)
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::approve_token())]
    pub fn approve_token(
      origin: OriginFor<T>,
      account: T::AccountId,
      token: T::AssetId,
      spender: T::AccountId,
      amount: T::Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_approve(&account, token, spender, amount)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::call_contract())]
    pub fn call_contract(
      origin: OriginFor<T>,
      account: T::AccountId,
      contract: T::AccountId,
      value: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_call_contract(&account, contract, value, data)
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::add_to_whitelist())]
    pub fn add_to_whitelist(
      origin: OriginFor<T>,
      account: T::AccountId,
      target: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_add_to_whitelist(&account, target)
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::remove_from_whitelist())]
    pub fn remove_from_whitelist(
      origin: OriginFor<T>,
      account: T::AccountId,
      target: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_remove_from_whitelist(&account, target)
    }

    /// Execute a pending transfer inside its execution window. Callable by anyone.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::execute_pending_transfer())]
    pub fn execute_pending_transfer(
      origin: OriginFor<T>,
      account: T::AccountId,
      token: T::AssetId,
      to: T::AccountId,
      amount: T::Balance,
      data: CallDataOf<T>,
      created_at: BlockNumberFor<T>,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      let action = PendingAction {
        kind: ActionKind::Transfer,
        token,
        to,
        amount,
        data,
        created_at,
      };
      let fingerprint = Self::take_pending(&account, &action)?;
      Self::execute_transfer(&account, action.token, action.to, action.amount, action.data)?;
      Self::deposit_event(Event::PendingActionExecuted {
        account,
        kind: ActionKind::Transfer,
        fingerprint,
      });
      Ok(())
    }

    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::execute_pending_approve())]
    pub fn execute_pending_approve(
      origin: OriginFor<T>,
      account: T::AccountId,
      token: T::AssetId,
      spender: T::AccountId,
      amount: T::Balance,
      created_at: BlockNumberFor<T>,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      let action = PendingAction {
        kind: ActionKind::Approve,
        token,
        to: spender,
        amount,
        data: CallDataOf::<T>::default(),
        created_at,
      };
      let fingerprint = Self::take_pending(&account, &action)?;
      Self::execute_approve(&account, action.token, action.to, action.amount)?;
      Self::deposit_event(Event::PendingActionExecuted {
        account,
        kind: ActionKind::Approve,
        fingerprint,
      });
      Ok(())
    }

    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::execute_pending_contract_call())]
    pub fn execute_pending_contract_call(
      origin: OriginFor<T>,
      account: T::AccountId,
      contract: T::AccountId,
      value: T::Balance,
      data: CallDataOf<T>,
      created_at: BlockNumberFor<T>,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      let action = PendingAction {
        kind: ActionKind::CallContract,
        token: T::NativeAssetId::get(),
        to: contract,
        amount: value,
        data,
        created_at,
      };
      let fingerprint = Self::take_pending(&account, &action)?;
      Self::execute_call(&account, action.to, action.amount, action.data)?;
      Self::deposit_event(Event::PendingActionExecuted {
        account,
        kind: ActionKind::CallContract,
        fingerprint,
      });
      Ok(())
    }

    /// Drop a pending action, whether or not its window has lapsed.
    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::cancel_pending())]
    pub fn cancel_pending(
      origin: OriginFor<T>,
      account: T::AccountId,
      fingerprint: Fingerprint,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_cancel_pending(&account, fingerprint)
    }

    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::change_limit())]
    pub fn change_limit(
      origin: OriginFor<T>,
      account: T::AccountId,
      new_limit: T::Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_change_limit(&account, new_limit)
    }

    #[pallet::call_index(10)]
    #[pallet::weight(T::WeightInfo::disable_limit())]
    pub fn disable_limit(origin: OriginFor<T>, account: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_owner(&account, &who)?;
      Self::do_change_limit(&account, T::Balance::max_value())
    }

    /// Submit an owner-signed request on the owner's behalf and get reimbursed.
    ///
    /// A failing request does not fail the relay: its effects are discarded,
    /// the nonce is still consumed and the relayer is still refunded.
    #[pallet::call_index(11)]
    #[pallet::weight(T::WeightInfo::relay().saturating_add(Pallet::<T>::request_weight(request)))]
    pub fn relay(
      origin: OriginFor<T>,
      account: T::AccountId,
      request: OwnerRequestOf<T>,
      nonce: u64,
      gas_price: T::Balance,
      gas_limit: u64,
      refund_token: T::AssetId,
      signature: T::Signature,
    ) -> DispatchResult {
      let relayer = ensure_signed(origin)?;
      Self::ensure_unlocked(&account)?;
      ensure!(
        nonce > RelayNonces::<T>::get(&account),
        Error::<T>::InvalidNonce
      );
      let digest = Self::relay_digest(
        &account,
        &request,
        nonce,
        gas_price,
        gas_limit,
        refund_token,
      );
      ensure!(
        T::SignatureVerifier::verify(&account, &digest, &signature),
        Error::<T>::InvalidSignature
      );
      Self::ensure_refund_covered(&account, gas_price, gas_limit, refund_token)?;
      RelayNonces::<T>::insert(&account, nonce);

      let gas_used = T::WeightToGas::convert(Self::request_weight(&request)).min(gas_limit);
      let outcome =
        with_storage_layer::<(), DispatchError, _>(|| Self::dispatch_request(&account, request));
      match outcome {
        Ok(()) => Self::deposit_event(Event::RelayedRequestExecuted {
          account: account.clone(),
          relayer: relayer.clone(),
          nonce,
        }),
        Err(error) => {
          log::debug!(
            target: LOG_TARGET,
            "relayed request {} for {:?} failed: {:?}",
            nonce,
            account,
            error
          );
          Self::deposit_event(Event::RelayedRequestFailed {
            account: account.clone(),
            relayer: relayer.clone(),
            nonce,
            error,
          });
        }
      }
      Self::refund(&account, &relayer, gas_used, gas_price, refund_token)
    }
  }

  impl<T: Config> Pallet<T> {
    fn now() -> Moment {
      T::TimeProvider::now().as_secs()
    }

    fn ensure_owner(account: &T::AccountId, who: &T::AccountId) -> DispatchResult {
      ensure!(T::Accounts::is_owner(account, who), Error::<T>::NotOwner);
      Ok(())
    }

    fn ensure_unlocked(account: &T::AccountId) -> DispatchResult {
      ensure!(!T::Accounts::is_locked(account), Error::<T>::AccountLocked);
      Ok(())
    }

    // ---- whitelist ----

    /// Strictly after the activation time; removal takes effect at once.
    pub fn is_whitelisted(account: &T::AccountId, target: &T::AccountId) -> bool {
      let activation = Whitelist::<T>::get(account, target);
      activation != 0 && activation < Self::now()
    }

    pub fn whitelist_activation(account: &T::AccountId, target: &T::AccountId) -> Moment {
      Whitelist::<T>::get(account, target)
    }

    fn do_add_to_whitelist(account: &T::AccountId, target: T::AccountId) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      ensure!(
        Whitelist::<T>::get(account, &target) == 0,
        Error::<T>::AlreadyWhitelisted
      );
      let whitelist_after = Self::now()
        .checked_add(T::SecurityPeriod::get())
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      Whitelist::<T>::insert(account, &target, whitelist_after);
      Self::deposit_event(Event::AddedToWhitelist {
        account: account.clone(),
        target,
        whitelist_after,
      });
      Ok(())
    }

    fn do_remove_from_whitelist(account: &T::AccountId, target: T::AccountId) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      ensure!(
        Whitelist::<T>::get(account, &target) != 0,
        Error::<T>::NotWhitelisted
      );
      Whitelist::<T>::remove(account, &target);
      Self::deposit_event(Event::RemovedFromWhitelist {
        account: account.clone(),
        target,
      });
      Ok(())
    }

    // ---- daily limit ----

    fn limit_of(account: &T::AccountId) -> DailyLimit<T::Balance> {
      Limits::<T>::get(account).unwrap_or_else(|| DailyLimit::new(T::DefaultLimit::get()))
    }

    /// Debit `amount` (common unit) from the account's daily allowance.
    ///
    /// `Ok(false)` means the amount does not fit and nothing was debited.
    pub fn check_and_update_daily_spent(
      account: &T::AccountId,
      amount: T::Balance,
    ) -> Result<bool, DispatchError> {
      let now = Self::now();
      Limits::<T>::try_mutate(account, |maybe| -> Result<bool, DispatchError> {
        let limit = maybe.get_or_insert_with(|| DailyLimit::new(T::DefaultLimit::get()));
        limit
          .try_debit(amount, now, T::LimitPeriod::get())
          .map_err(|_| Error::<T>::ArithmeticOverflow.into())
      })
    }

    fn do_change_limit(account: &T::AccountId, new_limit: T::Balance) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      let now = Self::now();
      let start_after = Limits::<T>::try_mutate(account, |maybe| -> Result<Moment, DispatchError> {
        if let Some(limit) = maybe.as_mut() {
          return limit
            .schedule_change(new_limit, now, T::SecurityPeriod::get())
            .map_err(|e| match e {
              LimitChangeError::Unchanged => Error::<T>::LimitUnchanged.into(),
              LimitChangeError::Overflow => Error::<T>::ArithmeticOverflow.into(),
            });
        }
        // Never configured nor spent against: nothing to protect yet.
        ensure!(
          new_limit != T::DefaultLimit::get(),
          Error::<T>::LimitUnchanged
        );
        *maybe = Some(DailyLimit::new(new_limit));
        Ok(now)
      })?;
      log::debug!(
        target: LOG_TARGET,
        "limit of {:?} set to {:?} from {}",
        account,
        new_limit,
        start_after
      );
      Self::deposit_event(Event::LimitChanged {
        account: account.clone(),
        new_limit,
        start_after,
      });
      Ok(())
    }

    pub fn current_limit(account: &T::AccountId) -> T::Balance {
      Self::limit_of(account).effective(Self::now())
    }

    /// Scheduled limit and when it applies, or zeros when nothing is scheduled.
    pub fn pending_limit(account: &T::AccountId) -> (T::Balance, Moment) {
      let limit = Self::limit_of(account);
      if limit.change_after > Self::now() {
        (limit.pending, limit.change_after)
      } else {
        (Zero::zero(), 0)
      }
    }

    pub fn daily_unspent(account: &T::AccountId) -> (T::Balance, Moment) {
      Self::limit_of(account).unspent(Self::now())
    }

    // ---- authorization ----

    /// Native amounts pass through, token amounts go through the oracle.
    pub fn to_common_unit(
      token: T::AssetId,
      amount: T::Balance,
    ) -> Result<T::Balance, DispatchError> {
      if token == T::NativeAssetId::get() {
        return Ok(amount);
      }
      T::PriceOracle::to_common_unit(token, amount)
    }

    fn within_daily_limit(
      account: &T::AccountId,
      token: T::AssetId,
      amount: T::Balance,
    ) -> Result<bool, DispatchError> {
      let value = Self::to_common_unit(token, amount)?;
      Self::check_and_update_daily_spent(account, value)
    }

    fn do_transfer(
      account: &T::AccountId,
      token: T::AssetId,
      to: T::AccountId,
      amount: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      if Self::is_whitelisted(account, &to) || Self::within_daily_limit(account, token, amount)? {
        return Self::execute_transfer(account, token, to, amount, data);
      }
      Self::create_pending(
        account,
        PendingAction {
          kind: ActionKind::Transfer,
          token,
          to,
          amount,
          data,
          created_at: frame_system::Pallet::<T>::block_number(),
        },
      )?;
      Ok(())
    }

    fn do_approve(
      account: &T::AccountId,
      token: T::AssetId,
      spender: T::AccountId,
      amount: T::Balance,
    ) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      ensure!(token != T::NativeAssetId::get(), Error::<T>::NativeApproval);
      if Self::is_whitelisted(account, &spender)
        || Self::within_daily_limit(account, token, amount)?
      {
        return Self::execute_approve(account, token, spender, amount);
      }
      Self::create_pending(
        account,
        PendingAction {
          kind: ActionKind::Approve,
          token,
          to: spender,
          amount,
          data: CallDataOf::<T>::default(),
          created_at: frame_system::Pallet::<T>::block_number(),
        },
      )?;
      Ok(())
    }

    fn do_call_contract(
      account: &T::AccountId,
      contract: T::AccountId,
      value: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      ensure!(!is_forbidden_selector(&data), Error::<T>::ForbiddenMethod);
      let native = T::NativeAssetId::get();
      if Self::is_whitelisted(account, &contract)
        || Self::within_daily_limit(account, native, value)?
      {
        return Self::execute_call(account, contract, value, data);
      }
      Self::create_pending(
        account,
        PendingAction {
          kind: ActionKind::CallContract,
          token: native,
          to: contract,
          amount: value,
          data,
          created_at: frame_system::Pallet::<T>::block_number(),
        },
      )?;
      Ok(())
    }

    fn execute_transfer(
      account: &T::AccountId,
      token: T::AssetId,
      to: T::AccountId,
      amount: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      T::Invoke::transfer(account, token, &to, amount, &data)?;
      Self::deposit_event(Event::Transferred {
        account: account.clone(),
        token,
        to,
        amount,
        data,
      });
      Ok(())
    }

    fn execute_approve(
      account: &T::AccountId,
      token: T::AssetId,
      spender: T::AccountId,
      amount: T::Balance,
    ) -> DispatchResult {
      T::Invoke::approve(account, token, &spender, amount)?;
      Self::deposit_event(Event::Approved {
        account: account.clone(),
        token,
        spender,
        amount,
      });
      Ok(())
    }

    fn execute_call(
      account: &T::AccountId,
      contract: T::AccountId,
      value: T::Balance,
      data: CallDataOf<T>,
    ) -> DispatchResult {
      T::Invoke::call_contract(account, &contract, value, &data)?;
      Self::deposit_event(Event::CalledContract {
        account: account.clone(),
        contract,
        value,
        data,
      });
      Ok(())
    }

    // ---- pending actions ----

    pub fn pending_execute_after(account: &T::AccountId, fingerprint: Fingerprint) -> Option<Moment> {
      PendingActions::<T>::get(account, fingerprint)
    }

    fn create_pending(
      account: &T::AccountId,
      action: PendingActionOf<T>,
    ) -> Result<(Fingerprint, Moment), DispatchError> {
      let fingerprint = action.fingerprint();
      ensure!(
        !PendingActions::<T>::contains_key(account, fingerprint),
        Error::<T>::DuplicatePendingAction
      );
      let execute_after = Self::now()
        .checked_add(T::SecurityPeriod::get())
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      PendingActions::<T>::insert(account, fingerprint, execute_after);
      log::debug!(
        target: LOG_TARGET,
        "deferred {:?} of {:?} for {:?} until {}",
        action.kind,
        action.amount,
        account,
        execute_after
      );
      Self::deposit_event(Event::PendingActionCreated {
        account: account.clone(),
        kind: action.kind,
        fingerprint,
        execute_after,
      });
      Ok((fingerprint, execute_after))
    }

    /// Remove a pending action that is inside its execution window.
    fn take_pending(
      account: &T::AccountId,
      action: &PendingActionOf<T>,
    ) -> Result<Fingerprint, DispatchError> {
      Self::ensure_unlocked(account)?;
      let fingerprint = action.fingerprint();
      let execute_after = PendingActions::<T>::get(account, fingerprint)
        .filter(|at| *at != 0)
        .ok_or(Error::<T>::NoSuchPendingAction)?;
      let window_end = execute_after
        .checked_add(T::SecurityWindow::get())
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let now = Self::now();
      ensure!(
        execute_after <= now && now <= window_end,
        Error::<T>::OutsideExecutionWindow
      );
      PendingActions::<T>::remove(account, fingerprint);
      log::trace!(
        target: LOG_TARGET,
        "executing pending {:?} of {:?}",
        action.kind,
        account
      );
      Ok(fingerprint)
    }

    fn do_cancel_pending(account: &T::AccountId, fingerprint: Fingerprint) -> DispatchResult {
      Self::ensure_unlocked(account)?;
      ensure!(
        PendingActions::<T>::contains_key(account, fingerprint),
        Error::<T>::NoSuchPendingAction
      );
      PendingActions::<T>::remove(account, fingerprint);
      Self::deposit_event(Event::PendingActionCancelled {
        account: account.clone(),
        fingerprint,
      });
      Ok(())
    }

    // ---- relaying ----

    pub fn is_valid_signature(
      account: &T::AccountId,
      digest: &[u8; 32],
      signature: &T::Signature,
    ) -> bool {
      T::SignatureVerifier::verify(account, digest, signature)
    }

    /// Digest the owner signs to authorize a relayed request.
    pub fn relay_digest(
      account: &T::AccountId,
      request: &OwnerRequestOf<T>,
      nonce: u64,
      gas_price: T::Balance,
      gas_limit: u64,
      refund_token: T::AssetId,
    ) -> [u8; 32] {
      (
        RELAY_DIGEST_TAG,
        account,
        request,
        nonce,
        gas_price,
        gas_limit,
        refund_token,
      )
        .using_encoded(frame::hashing::blake2_256)
    }

    pub fn request_weight(request: &OwnerRequestOf<T>) -> Weight {
      match request {
        OwnerRequest::TransferToken { .. } => T::WeightInfo::transfer_token(),
        OwnerRequest::ApproveToken { .. } => T::WeightInfo::approve_token(),
        OwnerRequest::CallContract { .. } => T::WeightInfo::call_contract(),
        OwnerRequest::AddToWhitelist { .. } => T::WeightInfo::add_to_whitelist(),
        OwnerRequest::RemoveFromWhitelist { .. } => T::WeightInfo::remove_from_whitelist(),
        OwnerRequest::ChangeLimit { .. } => T::WeightInfo::change_limit(),
        OwnerRequest::DisableLimit => T::WeightInfo::disable_limit(),
        OwnerRequest::CancelPending { .. } => T::WeightInfo::cancel_pending(),
      }
    }

    fn dispatch_request(account: &T::AccountId, request: OwnerRequestOf<T>) -> DispatchResult {
      match request {
        OwnerRequest::TransferToken {
          token,
          to,
          amount,
          data,
        } => Self::do_transfer(account, token, to, amount, data),
        OwnerRequest::ApproveToken {
          token,
          spender,
          amount,
        } => Self::do_approve(account, token, spender, amount),
        OwnerRequest::CallContract {
          contract,
          value,
          data,
        } => Self::do_call_contract(account, contract, value, data),
        OwnerRequest::AddToWhitelist { target } => Self::do_add_to_whitelist(account, target),
        OwnerRequest::RemoveFromWhitelist { target } => {
          Self::do_remove_from_whitelist(account, target)
        }
        OwnerRequest::ChangeLimit { new_limit } => Self::do_change_limit(account, new_limit),
        OwnerRequest::DisableLimit => Self::do_change_limit(account, T::Balance::max_value()),
        OwnerRequest::CancelPending { fingerprint } => {
          Self::do_cancel_pending(account, fingerprint)
        }
      }
    }

    /// Refund owed for `gas` units, in `refund_token`.
    ///
    /// Native refunds are priced at the lower of the relayer's price and the
    /// network price. A token price worth more than the network price in the
    /// common unit is refused.
    pub fn refund_amount(
      gas: u64,
      gas_price: T::Balance,
      refund_token: T::AssetId,
    ) -> Result<T::Balance, DispatchError> {
      let price = if refund_token == T::NativeAssetId::get() {
        gas_price.min(T::GasPrice::get())
      } else {
        ensure!(
          T::PriceOracle::to_common_unit(refund_token, gas_price)? <= T::GasPrice::get(),
          Error::<T>::RefundPriceTooHigh
        );
        gas_price
      };
      let gas = gas
        .checked_add(T::RefundGasOverhead::get())
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let amount = T::Balance::try_from(gas)
        .map_err(|_| Error::<T>::ArithmeticOverflow)?
        .checked_mul(&price)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      Ok(amount)
    }

    /// Up-front check that the account can pay the worst-case refund.
    fn ensure_refund_covered(
      account: &T::AccountId,
      gas_price: T::Balance,
      gas_limit: u64,
      refund_token: T::AssetId,
    ) -> DispatchResult {
      if gas_price.is_zero() {
        return Ok(());
      }
      ensure!(
        T::Accounts::is_module_authorised(account),
        Error::<T>::RefundNotAuthorised
      );
      let worst_case = Self::refund_amount(gas_limit, gas_price, refund_token)?;
      ensure!(
        T::Invoke::balance(account, refund_token) >= worst_case,
        Error::<T>::InsufficientRefundBalance
      );
      let value = Self::to_common_unit(refund_token, worst_case)?;
      let fits = Self::limit_of(account)
        .would_authorise(value, Self::now(), T::LimitPeriod::get())
        .map_err(|_| Error::<T>::ArithmeticOverflow)?;
      ensure!(fits, Error::<T>::RefundAboveDailyLimit);
      Ok(())
    }

    fn refund(
      account: &T::AccountId,
      relayer: &T::AccountId,
      gas_used: u64,
      gas_price: T::Balance,
      refund_token: T::AssetId,
    ) -> DispatchResult {
      if gas_price.is_zero() {
        return Ok(());
      }
      let amount = Self::refund_amount(gas_used, gas_price, refund_token)?;
      let value = Self::to_common_unit(refund_token, amount)?;
      // Refunds are never whitelist-exempt.
      ensure!(
        Self::check_and_update_daily_spent(account, value)?,
        Error::<T>::RefundAboveDailyLimit
      );
      T::Invoke::transfer(account, refund_token, relayer, amount, &[])?;
      log::debug!(
        target: LOG_TARGET,
        "refunded {:?} to relayer {:?} from {:?}",
        amount,
        relayer,
        account
      );
      Self::deposit_event(Event::Refunded {
        account: account.clone(),
        relayer: relayer.clone(),
        token: refund_token,
        amount,
      });
      Ok(())
    }
  }
}
