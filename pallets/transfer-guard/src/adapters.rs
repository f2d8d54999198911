//! Adapter traits for the transfer guard pallet.
//!
//! The guard never moves value or inspects account state by itself; the account
//! implementation, the token ledger and the pricing layer are reached through
//! these traits.

use frame::prelude::*;

/// Outbound actions performed on behalf of a guarded account.
///
/// Failures are propagated unchanged to the caller of the guard.
pub trait Invoke<AccountId, AssetId, Balance> {
  /// Move `amount` of `asset` from `account` to `to`, forwarding `data` to the recipient.
  fn transfer(
    account: &AccountId,
    asset: AssetId,
    to: &AccountId,
    amount: Balance,
    data: &[u8],
  ) -> Result<(), DispatchError>;

  /// Set the allowance of `spender` over the account's `asset` balance.
  fn approve(
    account: &AccountId,
    asset: AssetId,
    spender: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  /// Call `contract` with `data`, attaching `value` of native currency.
  fn call_contract(
    account: &AccountId,
    contract: &AccountId,
    value: Balance,
    data: &[u8],
  ) -> Result<(), DispatchError>;

  fn balance(account: &AccountId, asset: AssetId) -> Balance;
}

/// Converts token amounts into the common unit the daily limit is expressed in.
pub trait PriceOracle<AssetId, Balance> {
  fn to_common_unit(asset: AssetId, amount: Balance) -> Result<Balance, DispatchError>;
}

/// Ownership, lock state and module authorization of guarded accounts.
pub trait AccountRegistry<AccountId> {
  fn is_owner(account: &AccountId, who: &AccountId) -> bool;

  /// A locked account rejects every mutating entry point of the guard.
  fn is_locked(account: &AccountId) -> bool;

  /// Whether the account still lets the guard act for it, which includes
  /// paying relayer refunds out of its balance.
  fn is_module_authorised(account: &AccountId) -> bool;
}

/// Owner signature check for relayed requests and external verifiers.
pub trait SignatureVerifier<AccountId, Signature> {
  fn verify(account: &AccountId, digest: &[u8; 32], signature: &Signature) -> bool;
}

/// No-op `Invoke` for configurations that only exercise the bookkeeping.
impl<AccountId, AssetId, Balance: Default> Invoke<AccountId, AssetId, Balance> for () {
  fn transfer(
    _: &AccountId,
    _: AssetId,
    _: &AccountId,
    _: Balance,
    _: &[u8],
  ) -> Result<(), DispatchError> {
    Ok(())
  }

  fn approve(_: &AccountId, _: AssetId, _: &AccountId, _: Balance) -> Result<(), DispatchError> {
    Ok(())
  }

  fn call_contract(
    _: &AccountId,
    _: &AccountId,
    _: Balance,
    _: &[u8],
  ) -> Result<(), DispatchError> {
    Ok(())
  }

  fn balance(_: &AccountId, _: AssetId) -> Balance {
    Balance::default()
  }
}

/// Identity pricing: every asset is already denominated in the common unit.
impl<AssetId, Balance> PriceOracle<AssetId, Balance> for () {
  fn to_common_unit(_: AssetId, amount: Balance) -> Result<Balance, DispatchError> {
    Ok(amount)
  }
}

/// Self-owned, never locked accounts.
impl<AccountId: PartialEq> AccountRegistry<AccountId> for () {
  fn is_owner(account: &AccountId, who: &AccountId) -> bool {
    account == who
  }

  fn is_locked(_: &AccountId) -> bool {
    false
  }

  fn is_module_authorised(_: &AccountId) -> bool {
    true
  }
}

/// Rejects every signature; relaying is disabled.
impl<AccountId, Signature> SignatureVerifier<AccountId, Signature> for () {
  fn verify(_: &AccountId, _: &[u8; 32], _: &Signature) -> bool {
    false
  }
}
