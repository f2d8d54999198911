use frame::prelude::*;
use hex_literal::hex;

/// Unix time in seconds.
pub type Moment = u64;

/// Content address of a pending action.
pub type Fingerprint = [u8; 32];

/// `transfer(address,uint256)` of a fungible token contract.
pub const TOKEN_TRANSFER_SELECTOR: [u8; 4] = hex!("a9059cbb");
/// `approve(address,uint256)` of a fungible token contract.
pub const TOKEN_APPROVE_SELECTOR: [u8; 4] = hex!("095ea7b3");

/// Token movements must go through `transfer_token` / `approve_token` so the
/// limit sees them; the generic call path refuses their selectors.
pub fn is_forbidden_selector(data: &[u8]) -> bool {
  data.starts_with(&TOKEN_TRANSFER_SELECTOR) || data.starts_with(&TOKEN_APPROVE_SELECTOR)
}

#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum ActionKind {
  Transfer,
  Approve,
  CallContract,
}

/// Parameters identifying a deferred action.
///
/// Nothing but the execution time is stored on chain; whoever executes the
/// action supplies the same parameters again, including `created_at`.
#[derive(Clone, Debug, Encode, Eq, PartialEq)]
pub struct PendingAction<AccountId, AssetId, Balance, Data, BlockNumber> {
  pub kind: ActionKind,
  pub token: AssetId,
  pub to: AccountId,
  pub amount: Balance,
  pub data: Data,
  pub created_at: BlockNumber,
}

impl<AccountId, AssetId, Balance, Data, BlockNumber>
  PendingAction<AccountId, AssetId, Balance, Data, BlockNumber>
where
  AccountId: Encode,
  AssetId: Encode,
  Balance: Encode,
  Data: Encode,
  BlockNumber: Encode,
{
  pub fn fingerprint(&self) -> Fingerprint {
    frame::hashing::blake2_256(&self.encode())
  }
}

/// Owner request carried by a relayer.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum OwnerRequest<AccountId, AssetId, Balance, Data> {
  TransferToken {
    token: AssetId,
    to: AccountId,
    amount: Balance,
    data: Data,
  },
  ApproveToken {
    token: AssetId,
    spender: AccountId,
    amount: Balance,
  },
  CallContract {
    contract: AccountId,
    value: Balance,
    data: Data,
  },
  AddToWhitelist {
    target: AccountId,
  },
  RemoveFromWhitelist {
    target: AccountId,
  },
  ChangeLimit {
    new_limit: Balance,
  },
  DisableLimit,
  CancelPending {
    fingerprint: Fingerprint,
  },
}
