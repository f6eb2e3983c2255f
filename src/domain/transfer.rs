use super::account::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transfer as submitted by a caller, before it is assigned a token.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TransferOrder {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Amount,
}

/// A queued request to move `amount` from `sender_id` to `receiver_id`.
///
/// Neither account is checked for existence when the request is queued.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransferRequest {
    pub token: Uuid,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Amount,
    /// How many times execution was deferred because the sender was unverified.
    pub attempts: u32,
}

impl TransferRequest {
    pub fn new(order: TransferOrder) -> Self {
        Self {
            token: Uuid::new_v4(),
            sender_id: order.sender_id,
            receiver_id: order.receiver_id,
            amount: order.amount,
            attempts: 0,
        }
    }

    /// The same request, re-created for another pass through the queue.
    pub fn deferred(&self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    SenderNotFound,
    ReceiverNotFound,
    InsufficientFunds,
    RetriesExhausted,
    QueueFull,
    /// The receiver's balance would pass the supported ceiling.
    BalanceOverflow,
    /// The account store failed; the transfer was not applied.
    StoreUnavailable,
}

/// Observable lifecycle of a submitted transfer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Deferred { attempts: u32 },
    Completed,
    Failed { reason: FailureReason },
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed { .. })
    }
}

/// Returned to the caller on submission; the outcome is only known later.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferReceipt {
    pub token: Uuid,
    pub message: String,
}

impl TransferReceipt {
    pub fn accepted(token: Uuid) -> Self {
        Self {
            token,
            message: "Transaction is being processed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_deserialization() {
        let order: TransferOrder =
            serde_json::from_str(r#"{"sender_id": 1, "receiver_id": 2, "amount": 100}"#).unwrap();
        assert_eq!(order.sender_id, 1);
        assert_eq!(order.receiver_id, 2);
        assert_eq!(order.amount.value(), dec!(100));
    }

    #[test]
    fn test_order_missing_field_is_rejected() {
        let result = serde_json::from_str::<TransferOrder>(r#"{"sender_id": 1, "amount": 100}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_deferred_keeps_token_and_counts_attempts() {
        let request = TransferRequest::new(TransferOrder {
            sender_id: 1,
            receiver_id: 2,
            amount: Amount::new(dec!(5)).unwrap(),
        });
        let retried = request.deferred().deferred();
        assert_eq!(retried.token, request.token);
        assert_eq!(retried.attempts, 2);
        assert_eq!(request.attempts, 0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(TransferStatus::Failed {
            reason: FailureReason::InsufficientFunds,
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "insufficient_funds");

        let json = serde_json::to_value(TransferStatus::Deferred { attempts: 3 }).unwrap();
        assert_eq!(json["status"], "deferred");
        assert_eq!(json["attempts"], 3);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Deferred { attempts: 1 }.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(
            TransferStatus::Failed {
                reason: FailureReason::SenderNotFound
            }
            .is_terminal()
        );
    }
}
