#![cfg(feature = "runtime-benchmarks")]

use crate::*;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::traits::{Bounded, Saturating, Zero};

#[benchmarks]
mod benches {
  use super::*;

  type Helper<T> = <T as Config>::BenchmarkHelper;

  /// Amount that never fits in a fresh daily limit.
  fn above_limit<T: Config>() -> BalanceOf<T> {
    T::DefaultLimit::get().saturating_add(1u32.into())
  }

  fn funds<T: Config>() -> BalanceOf<T> {
    T::DefaultLimit::get().saturating_mul(100u32.into())
  }

  fn guarded<T: Config>(asset: AssetIdOf<T>) -> (T::AccountId, T::AccountId) {
    let owner: T::AccountId = whitelisted_caller();
    let wallet = Helper::<T>::setup_account(&owner, asset, funds::<T>());
    (owner, wallet)
  }

  fn payload<T: Config>() -> CallDataOf<T> {
    let len = T::MaxDataLength::get() as usize;
    let mut bytes = alloc::vec![0xabu8; len];
    if let Some(first) = bytes.first_mut() {
      *first = 0x01;
    }
    BoundedVec::truncate_from(bytes)
  }

  fn pending_fingerprint<T: Config>(
    kind: ActionKind,
    token: AssetIdOf<T>,
    to: T::AccountId,
    amount: BalanceOf<T>,
    data: CallDataOf<T>,
  ) -> Fingerprint {
    PendingAction {
      kind,
      token,
      to,
      amount,
      data,
      created_at: frame_system::Pallet::<T>::block_number(),
    }
    .fingerprint()
  }

  #[benchmark]
  fn transfer_token() {
    let native = T::NativeAssetId::get();
    let (owner, wallet) = guarded::<T>(native);
    let to: T::AccountId = account("recipient", 0, 0);
    let amount = above_limit::<T>();
    let data = payload::<T>();

    #[extrinsic_call]
    transfer_token(
      RawOrigin::Signed(owner),
      wallet.clone(),
      native,
      to.clone(),
      amount,
      data.clone(),
    );

    let fingerprint = pending_fingerprint::<T>(ActionKind::Transfer, native, to, amount, data);
    assert!(PendingActions::<T>::contains_key(&wallet, fingerprint));
  }

  #[benchmark]
  fn approve_token() {
    let asset = Helper::<T>::asset();
    let (owner, wallet) = guarded::<T>(asset);
    let spender: T::AccountId = account("spender", 0, 0);
    let amount = BalanceOf::<T>::max_value();

    #[extrinsic_call]
    approve_token(
      RawOrigin::Signed(owner),
      wallet.clone(),
      asset,
      spender,
      amount,
    );

    assert_eq!(PendingActions::<T>::iter_prefix(&wallet).count(), 1);
  }

  #[benchmark]
  fn call_contract() {
    let native = T::NativeAssetId::get();
    let (owner, wallet) = guarded::<T>(native);
    let contract: T::AccountId = account("contract", 0, 0);
    let value = above_limit::<T>();

    #[extrinsic_call]
    call_contract(
      RawOrigin::Signed(owner),
      wallet.clone(),
      contract,
      value,
      payload::<T>(),
    );

    assert_eq!(PendingActions::<T>::iter_prefix(&wallet).count(), 1);
  }

  #[benchmark]
  fn add_to_whitelist() {
    let (owner, wallet) = guarded::<T>(T::NativeAssetId::get());
    let target: T::AccountId = account("target", 0, 0);

    #[extrinsic_call]
    add_to_whitelist(RawOrigin::Signed(owner), wallet.clone(), target.clone());

    assert!(Pallet::<T>::whitelist_activation(&wallet, &target) != 0);
  }

  #[benchmark]
  fn remove_from_whitelist() {
    let (owner, wallet) = guarded::<T>(T::NativeAssetId::get());
    let target: T::AccountId = account("target", 0, 0);
    Whitelist::<T>::insert(&wallet, &target, GENESIS_ACTIVATION);

    #[extrinsic_call]
    remove_from_whitelist(RawOrigin::Signed(owner), wallet.clone(), target.clone());

    assert_eq!(Pallet::<T>::whitelist_activation(&wallet, &target), 0);
  }

  #[benchmark]
  fn execute_pending_transfer() -> Result<(), BenchmarkError> {
    let native = T::NativeAssetId::get();
    let (owner, wallet) = guarded::<T>(native);
    let to: T::AccountId = account("recipient", 0, 0);
    let amount = above_limit::<T>();
    let data = payload::<T>();
    Pallet::<T>::transfer_token(
      RawOrigin::Signed(owner).into(),
      wallet.clone(),
      native,
      to.clone(),
      amount,
      data.clone(),
    )?;
    Helper::<T>::advance_time(T::SecurityPeriod::get());
    let created_at = frame_system::Pallet::<T>::block_number();
    let executor: T::AccountId = account("executor", 0, 0);

    #[extrinsic_call]
    execute_pending_transfer(
      RawOrigin::Signed(executor),
      wallet.clone(),
      native,
      to,
      amount,
      data,
      created_at,
    );

    assert_eq!(PendingActions::<T>::iter_prefix(&wallet).count(), 0);
    Ok(())
  }

  #[benchmark]
  fn execute_pending_approve() -> Result<(), BenchmarkError> {
    let asset = Helper::<T>::asset();
    let (owner, wallet) = guarded::<T>(asset);
    let spender: T::AccountId = account("spender", 0, 0);
    let amount = BalanceOf::<T>::max_value();
    Pallet::<T>::approve_token(
      RawOrigin::Signed(owner).into(),
      wallet.clone(),
      asset,
      spender.clone(),
      amount,
    )?;
    Helper::<T>::advance_time(T::SecurityPeriod::get());
    let created_at = frame_system::Pallet::<T>::block_number();
    let executor: T::AccountId = account("executor", 0, 0);

    #[extrinsic_call]
    execute_pending_approve(
      RawOrigin::Signed(executor),
      wallet.clone(),
      asset,
      spender,
      amount,
      created_at,
    );

    assert_eq!(PendingActions::<T>::iter_prefix(&wallet).count(), 0);
    Ok(())
  }

  #[benchmark]
  fn execute_pending_contract_call() -> Result<(), BenchmarkError> {
    let native = T::NativeAssetId::get();
    let (owner, wallet) = guarded::<T>(native);
    let contract: T::AccountId = account("contract", 0, 0);
    let value = above_limit::<T>();
    let data = payload::<T>();
    Pallet::<T>::call_contract(
      RawOrigin::Signed(owner).into(),
      wallet.clone(),
      contract.clone(),
      value,
      data.clone(),
    )?;
    Helper::<T>::advance_time(T::SecurityPeriod::get());
    let created_at = frame_system::Pallet::<T>::block_number();
    let executor: T::AccountId = account("executor", 0, 0);

    #[extrinsic_call]
    execute_pending_contract_call(
      RawOrigin::Signed(executor),
      wallet.clone(),
      contract,
      value,
      data,
      created_at,
    );

    assert_eq!(PendingActions::<T>::iter_prefix(&wallet).count(), 0);
    Ok(())
  }

  #[benchmark]
  fn cancel_pending() -> Result<(), BenchmarkError> {
    let native = T::NativeAssetId::get();
    let (owner, wallet) = guarded::<T>(native);
    let to: T::AccountId = account("recipient", 0, 0);
    let amount = above_limit::<T>();
    Pallet::<T>::transfer_token(
      RawOrigin::Signed(owner.clone()).into(),
      wallet.clone(),
      native,
      to.clone(),
      amount,
      CallDataOf::<T>::default(),
    )?;
    let fingerprint = pending_fingerprint::<T>(
      ActionKind::Transfer,
      native,
      to,
      amount,
      CallDataOf::<T>::default(),
    );

    #[extrinsic_call]
    cancel_pending(RawOrigin::Signed(owner), wallet.clone(), fingerprint);

    assert!(!PendingActions::<T>::contains_key(&wallet, fingerprint));
    Ok(())
  }

  #[benchmark]
  fn change_limit() -> Result<(), BenchmarkError> {
    let (owner, wallet) = guarded::<T>(T::NativeAssetId::get());
    Pallet::<T>::check_and_update_daily_spent(&wallet, Zero::zero())?;
    let new_limit = above_limit::<T>();

    #[extrinsic_call]
    change_limit(RawOrigin::Signed(owner), wallet.clone(), new_limit);

    assert_eq!(Pallet::<T>::pending_limit(&wallet).0, new_limit);
    Ok(())
  }

  #[benchmark]
  fn disable_limit() -> Result<(), BenchmarkError> {
    let (owner, wallet) = guarded::<T>(T::NativeAssetId::get());
    Pallet::<T>::check_and_update_daily_spent(&wallet, Zero::zero())?;

    #[extrinsic_call]
    disable_limit(RawOrigin::Signed(owner), wallet.clone());

    assert_eq!(
      Pallet::<T>::pending_limit(&wallet).0,
      BalanceOf::<T>::max_value()
    );
    Ok(())
  }

  #[benchmark]
  fn relay() {
    let native = T::NativeAssetId::get();
    let (_, wallet) = guarded::<T>(native);
    let relayer: T::AccountId = account("relayer", 0, 0);
    let request: OwnerRequestOf<T> = OwnerRequest::AddToWhitelist {
      target: account("target", 0, 0),
    };
    let gas_price: BalanceOf<T> = 1u32.into();
    let gas_limit = 1u64;
    let digest = Pallet::<T>::relay_digest(&wallet, &request, 1, gas_price, gas_limit, native);
    let signature = Helper::<T>::sign(&wallet, &digest);

    #[extrinsic_call]
    relay(
      RawOrigin::Signed(relayer),
      wallet.clone(),
      request,
      1,
      gas_price,
      gas_limit,
      native,
      signature,
    );

    assert_eq!(RelayNonces::<T>::get(&wallet), 1);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
