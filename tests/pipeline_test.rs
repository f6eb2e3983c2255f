use p2p_ledger::application::service::LedgerService;
use p2p_ledger::config::LedgerConfig;
use p2p_ledger::domain::account::Balance;
use p2p_ledger::domain::transfer::{FailureReason, TransferStatus};
use rust_decimal_macros::dec;

mod common;
use common::{balance, eventually, fast_config, order, verified_accounts};

#[tokio::test]
async fn test_ids_are_unique_and_increasing() {
    let service = LedgerService::new(LedgerConfig::default()).unwrap();
    let mut previous = 0;
    for _ in 0..20 {
        let account = service.create_account(Default::default()).await.unwrap();
        assert!(account.id > previous);
        previous = account.id;
    }
    assert_eq!(service.list_accounts().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_transfer_from_unverified_sender_defers_then_completes() {
    let service = LedgerService::new(LedgerConfig::default()).unwrap();
    let a = service.create_account(Default::default()).await.unwrap();
    let b = service.create_account(Default::default()).await.unwrap();
    let receipt = service
        .submit_transfer(order(a.id, b.id, dec!(100)))
        .await
        .unwrap();

    // Transfer tick before any verification: deferred, nothing moves.
    assert_eq!(service.run_transfer_tick().await, 1);
    assert_eq!(
        service.transfer_status(receipt.token).await.unwrap(),
        TransferStatus::Deferred { attempts: 1 }
    );
    assert_eq!(balance(&service, a.id).await, Balance::new(dec!(1000)));
    assert_eq!(balance(&service, b.id).await, Balance::new(dec!(1000)));
    let depths = service.queue_depths();
    assert_eq!(depths.transaction, 1);
    assert_eq!(depths.verification, 3);

    // Verification tick processes A and B.
    assert_eq!(service.run_verification_tick().await, 2);
    assert!(service.list_accounts().await.unwrap()[&a.id].verified);

    // The next transfer tick executes the deferred request.
    assert_eq!(service.run_transfer_tick().await, 1);
    assert_eq!(
        service.transfer_status(receipt.token).await.unwrap(),
        TransferStatus::Completed
    );
    assert_eq!(balance(&service, a.id).await, Balance::new(dec!(900)));
    assert_eq!(balance(&service, b.id).await, Balance::new(dec!(1100)));
}

#[tokio::test]
async fn test_transfer_exceeding_balance_changes_nothing() {
    let service = LedgerService::new(LedgerConfig::default()).unwrap();
    verified_accounts(&service, 2).await;

    let receipt = service.submit_transfer(order(1, 2, dec!(2000))).await.unwrap();
    service.run_transfer_tick().await;

    assert_eq!(
        service.transfer_status(receipt.token).await.unwrap(),
        TransferStatus::Failed {
            reason: FailureReason::InsufficientFunds
        }
    );
    assert_eq!(balance(&service, 1).await, Balance::new(dec!(1000)));
    assert_eq!(balance(&service, 2).await, Balance::new(dec!(1000)));
    assert_eq!(service.queue_depths().transaction, 0);
}

#[tokio::test]
async fn test_verification_never_reverts() {
    let service = LedgerService::new(LedgerConfig::default()).unwrap();
    verified_accounts(&service, 1).await;

    // A deferral can only come from an unverified sender, so a verified sender
    // queued again for verification stays verified and transfers go through.
    let receipt = service.submit_transfer(order(1, 1, dec!(1))).await.unwrap();
    service.run_transfer_tick().await;
    assert_eq!(
        service.transfer_status(receipt.token).await.unwrap(),
        TransferStatus::Completed
    );
    service.run_verification_tick().await;
    assert!(service.list_accounts().await.unwrap()[&1].verified);
}

#[tokio::test]
async fn test_unknown_sender_and_receiver_fail() {
    let service = LedgerService::new(LedgerConfig::default()).unwrap();
    verified_accounts(&service, 1).await;

    let no_sender = service.submit_transfer(order(9, 1, dec!(1))).await.unwrap();
    let no_receiver = service.submit_transfer(order(1, 9, dec!(1))).await.unwrap();
    service.run_transfer_tick().await;

    assert_eq!(
        service.transfer_status(no_sender.token).await.unwrap(),
        TransferStatus::Failed {
            reason: FailureReason::SenderNotFound
        }
    );
    assert_eq!(
        service.transfer_status(no_receiver.token).await.unwrap(),
        TransferStatus::Failed {
            reason: FailureReason::ReceiverNotFound
        }
    );
    let accounts = service.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[&1].balance, Balance::new(dec!(1000)));
}

#[tokio::test]
async fn test_deferral_gives_up_after_limit() {
    let config = LedgerConfig {
        max_deferrals: 3,
        ..LedgerConfig::default()
    };
    let service = LedgerService::new(config).unwrap();
    service.create_account(Default::default()).await.unwrap();
    service.create_account(Default::default()).await.unwrap();

    let receipt = service.submit_transfer(order(1, 2, dec!(10))).await.unwrap();
    // Verification never runs.
    for _ in 0..4 {
        service.run_transfer_tick().await;
    }

    assert_eq!(
        service.transfer_status(receipt.token).await.unwrap(),
        TransferStatus::Failed {
            reason: FailureReason::RetriesExhausted
        }
    );
    assert_eq!(service.queue_depths().transaction, 0);
    assert_eq!(balance(&service, 1).await, Balance::new(dec!(1000)));
}

#[tokio::test]
async fn test_running_workers_process_pipeline() {
    let service = LedgerService::new(fast_config(2)).unwrap();
    let workers = service.start();

    let a = service.create_account(Default::default()).await.unwrap();
    let b = service.create_account(Default::default()).await.unwrap();
    let receipt = service
        .submit_transfer(order(a.id, b.id, dec!(100)))
        .await
        .unwrap();

    let token = receipt.token;
    eventually(|| {
        let service = service.clone();
        async move {
            service.transfer_status(token).await.unwrap() == TransferStatus::Completed
        }
    })
    .await;

    workers.shutdown().await;
    assert_eq!(balance(&service, a.id).await, Balance::new(dec!(900)));
    assert_eq!(balance(&service, b.id).await, Balance::new(dec!(1100)));
}
