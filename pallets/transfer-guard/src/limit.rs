//! Rolling daily spending limit with a two-phase change protocol.
//!
//! `DailyLimit` is a plain state machine with no storage access: the pallet
//! loads it, feeds it the current time and persists the result. Pending limit
//! changes and window resets are applied lazily, the first time a record is
//! touched after they fall due.

use crate::types::Moment;
use frame::prelude::*;
use polkadot_sdk::sp_runtime::{
  ArithmeticError,
  traits::{AtLeast32BitUnsigned, CheckedAdd, Saturating, Zero},
};

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub struct DailyLimit<Balance> {
  /// Ceiling currently in force, in the common unit.
  pub current: Balance,
  /// Ceiling adopted once `change_after` is reached; equals `current` when idle.
  pub pending: Balance,
  /// When `pending` replaces `current`; 0 when no change is scheduled.
  pub change_after: Moment,
  /// Amount debited in the running window.
  pub spent: Balance,
  /// End of the running window; 0 before the first debit.
  pub period_end: Moment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LimitChangeError {
  /// No change is scheduled and the requested limit is already in force.
  Unchanged,
  Overflow,
}

impl From<ArithmeticError> for LimitChangeError {
  fn from(_: ArithmeticError) -> Self {
    LimitChangeError::Overflow
  }
}

impl<Balance: AtLeast32BitUnsigned + Copy> DailyLimit<Balance> {
  pub fn new(limit: Balance) -> Self {
    Self {
      current: limit,
      pending: limit,
      change_after: 0,
      spent: Zero::zero(),
      period_end: 0,
    }
  }

  pub fn has_pending_change(&self) -> bool {
    self.change_after != 0
  }

  fn change_due(&self, now: Moment) -> bool {
    self.change_after != 0 && now >= self.change_after
  }

  /// Limit in force at `now`, counting a due change that was not applied yet.
  pub fn effective(&self, now: Moment) -> Balance {
    if self.change_due(now) {
      self.pending
    } else {
      self.current
    }
  }

  pub fn apply_due_change(&mut self, now: Moment) {
    if self.change_due(now) {
      self.current = self.pending;
      self.change_after = 0;
    }
  }

  /// Debit `amount` if it fits into what is left of the running window.
  ///
  /// Returns `Ok(false)` without touching `spent` when it does not. An expired
  /// window restarts at `now` and lasts `period`.
  pub fn try_debit(
    &mut self,
    amount: Balance,
    now: Moment,
    period: Moment,
  ) -> Result<bool, ArithmeticError> {
    self.apply_due_change(now);
    if now >= self.period_end {
      self.spent = Zero::zero();
      self.period_end = now.checked_add(period).ok_or(ArithmeticError::Overflow)?;
    }
    let spent = self
      .spent
      .checked_add(&amount)
      .ok_or(ArithmeticError::Overflow)?;
    if spent > self.current {
      return Ok(false);
    }
    self.spent = spent;
    Ok(true)
  }

  /// Dry run of [`Self::try_debit`].
  pub fn would_authorise(
    &self,
    amount: Balance,
    now: Moment,
    period: Moment,
  ) -> Result<bool, ArithmeticError> {
    let mut probe = *self;
    probe.try_debit(amount, now, period)
  }

  /// Allowance left in the running window and when the window ends.
  ///
  /// An elapsed window reports the full limit and a zero end time.
  pub fn unspent(&self, now: Moment) -> (Balance, Moment) {
    let limit = self.effective(now);
    if now >= self.period_end {
      return (limit, 0);
    }
    (limit.saturating_sub(self.spent), self.period_end)
  }

  /// Schedule `new_limit` to take over after `delay`.
  ///
  /// A zero delay adopts the new limit at once. Returns the time from which
  /// the new limit applies.
  pub fn schedule_change(
    &mut self,
    new_limit: Balance,
    now: Moment,
    delay: Moment,
  ) -> Result<Moment, LimitChangeError> {
    self.apply_due_change(now);
    if !self.has_pending_change() && new_limit == self.current {
      return Err(LimitChangeError::Unchanged);
    }
    if delay == 0 {
      self.current = new_limit;
      self.pending = new_limit;
      self.change_after = 0;
      return Ok(now);
    }
    let change_after = now.checked_add(delay).ok_or(ArithmeticError::Overflow)?;
    self.pending = new_limit;
    self.change_after = change_after;
    Ok(change_after)
  }
}
