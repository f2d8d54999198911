#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn transfer_token() -> Weight;
  fn approve_token() -> Weight;
  fn call_contract() -> Weight;
  fn add_to_whitelist() -> Weight;
  fn remove_from_whitelist() -> Weight;
  fn execute_pending_transfer() -> Weight;
  fn execute_pending_approve() -> Weight;
  fn execute_pending_contract_call() -> Weight;
  fn cancel_pending() -> Weight;
  fn change_limit() -> Weight;
  fn disable_limit() -> Weight;
  fn relay() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Worst case: whitelist miss, limit miss, pending action written.
  fn transfer_token() -> Weight {
    Weight::from_parts(32_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn approve_token() -> Weight {
    Weight::from_parts(30_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn call_contract() -> Weight {
    Weight::from_parts(34_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn add_to_whitelist() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn remove_from_whitelist() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn execute_pending_transfer() -> Weight {
    Weight::from_parts(28_000_000, 2500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn execute_pending_approve() -> Weight {
    Weight::from_parts(26_000_000, 2500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn execute_pending_contract_call() -> Weight {
    Weight::from_parts(30_000_000, 2500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn cancel_pending() -> Weight {
    Weight::from_parts(13_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn change_limit() -> Weight {
    Weight::from_parts(15_000_000, 1400)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn disable_limit() -> Weight {
    Weight::from_parts(15_000_000, 1400)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  // Envelope only; the relayed request's own weight is added at dispatch.
  fn relay() -> Weight {
    Weight::from_parts(45_000_000, 3000)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }
}

impl WeightInfo for () {
  fn transfer_token() -> Weight { Weight::from_parts(32_000_000, 3600) }
  fn approve_token() -> Weight { Weight::from_parts(30_000_000, 3600) }
  fn call_contract() -> Weight { Weight::from_parts(34_000_000, 3600) }
  fn add_to_whitelist() -> Weight { Weight::from_parts(14_000_000, 1500) }
  fn remove_from_whitelist() -> Weight { Weight::from_parts(14_000_000, 1500) }
  fn execute_pending_transfer() -> Weight { Weight::from_parts(28_000_000, 2500) }
  fn execute_pending_approve() -> Weight { Weight::from_parts(26_000_000, 2500) }
  fn execute_pending_contract_call() -> Weight { Weight::from_parts(30_000_000, 2500) }
  fn cancel_pending() -> Weight { Weight::from_parts(13_000_000, 1200) }
  fn change_limit() -> Weight { Weight::from_parts(15_000_000, 1400) }
  fn disable_limit() -> Weight { Weight::from_parts(15_000_000, 1400) }
  fn relay() -> Weight { Weight::from_parts(45_000_000, 3000) }
}
