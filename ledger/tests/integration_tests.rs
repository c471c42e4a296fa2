//! End-to-end behaviour of the share ledger through its public API.

use std::sync::{Arc, Mutex};
use std::thread;

use hypershare_compliance::ComplianceError;
use hypershare_ledger::{
    Ledger, LedgerConfig, LedgerError, LedgerEvent, Operation, SharedLedger,
};
use hypershare_types::{AccountAddress, ClassId};

const E18: u128 = 1_000_000_000_000_000_000;

fn addr(n: u8) -> AccountAddress {
    AccountAddress::new([n; 20])
}

/// Records every event the ledger emits.
fn recording_ledger(config: LedgerConfig) -> (Ledger, Arc<Mutex<Vec<LedgerEvent>>>) {
    let mut ledger = Ledger::new(config).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    ledger.subscribe(Box::new(move |event| {
        sink.lock().unwrap().push(event.clone());
    }));
    (ledger, events)
}

/// Balances and holder counts for the given accounts and classes.
fn state_of(ledger: &Ledger, accounts: &[AccountAddress], classes: &[ClassId]) -> Vec<u128> {
    let mut state = Vec::new();
    for class in classes {
        state.push(ledger.holder_count(*class).unwrap() as u128);
        for account in accounts {
            state.push(ledger.balance_of(account, *class).unwrap());
        }
    }
    state
}

#[test]
fn scenario_a_shareholder_limit() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(2, 0, false).unwrap();

    ledger.mint(addr(1), class, 10).unwrap();
    ledger.mint(addr(2), class, 10).unwrap();
    assert_eq!(ledger.holder_count(class).unwrap(), 2);

    let err = ledger.mint(addr(3), class, 10).unwrap_err();
    assert!(matches!(
        err.compliance(),
        Some(ComplianceError::ShareholderLimitExceeded { limit: 2, current: 2 })
    ));
    assert!(err.is_rule_violation());
    assert_eq!(ledger.holder_count(class).unwrap(), 2);
    assert_eq!(ledger.balance_of(&addr(3), class).unwrap(), 0);
}

#[test]
fn scenario_b_minimum_holding() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(10, 5, true).unwrap();

    ledger.mint(addr(1), class, 5 * E18).unwrap();
    assert_eq!(ledger.balance_of(&addr(1), class).unwrap(), 5 * E18);

    let err = ledger.mint(addr(2), class, 3).unwrap_err();
    assert!(matches!(
        err.compliance(),
        Some(ComplianceError::BelowMinimumHolding { balance: 3, minimum: 5 })
    ));
    assert_eq!(ledger.holder_count(class).unwrap(), 1);
}

#[test]
fn scenario_c_batch_mint_commits_once() {
    let (mut ledger, events) = recording_ledger(LedgerConfig::default());
    let class = ledger.create_class(10, 0, false).unwrap();
    let accounts = [addr(1), addr(2), addr(3), addr(4)];

    let outcome = ledger
        .mint_batch(&accounts, class, &[100, 200, 300, 400], b"mint")
        .unwrap();

    assert_eq!(outcome.entries, 4);
    assert_eq!(outcome.classes.len(), 1);
    assert_eq!(outcome.classes[0].holder_delta(), 4);
    assert_eq!(ledger.holder_count(class).unwrap(), 4);
    assert_eq!(ledger.total_supply(class).unwrap(), 1000);
    assert_eq!(ledger.holders(class).unwrap(), accounts.to_vec());

    let events = events.lock().unwrap();
    let batches: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, LedgerEvent::BatchCommitted { .. }))
        .collect();
    assert_eq!(
        batches,
        vec![&LedgerEvent::BatchCommitted {
            operation: Operation::MintBatch,
            class_ids: vec![class],
            entries: 4,
            memo: b"mint".to_vec(),
        }]
    );
    let joined = events
        .iter()
        .filter(|e| matches!(e, LedgerEvent::HolderJoined { .. }))
        .count();
    assert_eq!(joined, 4);
}

#[test]
fn scenario_d_transfer_below_minimum() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(0, 50, false).unwrap();
    ledger.mint(addr(1), class, 100).unwrap();

    let err = ledger.transfer(addr(1), addr(2), class, 60).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Compliance {
            source: ComplianceError::BelowMinimumHolding { balance: 40, minimum: 50 },
            ..
        }
    ));
    assert_eq!(ledger.balance_of(&addr(1), class).unwrap(), 100);
    assert_eq!(ledger.balance_of(&addr(2), class).unwrap(), 0);
    assert_eq!(ledger.holder_count(class).unwrap(), 1);
}

#[test]
fn deploy_script_batch_is_rejected_by_minimum() {
    // Minting 100..400 raw units into a class with a
    // 5e18 minimum: every entry is below the floor, the first is reported.
    let mut ledger = Ledger::default();
    let class = ledger.create_class(10, 5 * E18, true).unwrap();
    let err = ledger
        .mint_batch(&[addr(1), addr(2), addr(3), addr(4)], class, &[100, 200, 300, 400], b"mint")
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Compliance {
            position: 0,
            source: ComplianceError::BelowMinimumHolding { .. },
            ..
        }
    ));
    assert_eq!(ledger.holder_count(class).unwrap(), 0);
}

#[test]
fn batch_reports_second_new_holder_at_limit_one() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(1, 0, false).unwrap();

    let err = ledger
        .mint_batch(&[addr(1), addr(2)], class, &[10, 10], b"")
        .unwrap_err();
    match err {
        LedgerError::Compliance {
            position,
            account,
            source: ComplianceError::ShareholderLimitExceeded { .. },
            ..
        } => {
            assert_eq!(position, 1);
            assert_eq!(account, addr(2));
        }
        other => panic!("expected ShareholderLimitExceeded, got {other:?}"),
    }
    // The first entry validated in simulation but was not committed.
    assert_eq!(ledger.balance_of(&addr(1), class).unwrap(), 0);
    assert_eq!(ledger.holder_count(class).unwrap(), 0);
}

#[test]
fn failing_batch_leaves_state_identical() {
    let (mut ledger, events) = recording_ledger(LedgerConfig::default());
    let class = ledger.create_class(3, 10, false).unwrap();
    ledger.mint_batch(&[addr(1), addr(2)], class, &[50, 50], b"").unwrap();
    let accounts = [addr(1), addr(2), addr(3), addr(4)];
    let before = state_of(&ledger, &accounts, &[class]);
    let snapshot_before = ledger.snapshot();
    events.lock().unwrap().clear();

    // Third entry would push the class to four holders.
    let err = ledger
        .transfer_batch(addr(1), &[addr(2), addr(3), addr(4)], class, &[10, 10, 10], b"")
        .unwrap_err();
    assert!(matches!(err, LedgerError::Compliance { position: 2, .. }));

    assert_eq!(state_of(&ledger, &accounts, &[class]), before);
    assert_eq!(ledger.snapshot(), snapshot_before);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        LedgerEvent::OperationRejected { operation: Operation::TransferBatch, .. }
    ));
}

#[test]
fn transfer_batch_debits_sender_in_order() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(0, 0, false).unwrap();
    ledger.mint(addr(1), class, 100).unwrap();

    ledger
        .transfer_batch(addr(1), &[addr(2), addr(3)], class, &[30, 70], b"payout")
        .unwrap();
    assert_eq!(ledger.balance_of(&addr(1), class).unwrap(), 0);
    assert_eq!(ledger.holders(class).unwrap(), vec![addr(2), addr(3)]);
    assert_eq!(ledger.holder_count(class).unwrap(), 2);

    let err = ledger
        .transfer_batch(addr(2), &[addr(4), addr(5)], class, &[20, 20], b"")
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance { position: 1, needed: 20, available: 10, .. }
    ));
    assert_eq!(ledger.balance_of(&addr(2), class).unwrap(), 30);
}

#[test]
fn burn_batch_is_atomic() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(0, 0, false).unwrap();
    ledger.mint_batch(&[addr(1), addr(2)], class, &[10, 10], b"").unwrap();

    assert!(ledger.burn_batch(&[addr(1), addr(2)], class, &[10, 11], b"").is_err());
    assert_eq!(ledger.total_supply(class).unwrap(), 20);

    let outcome = ledger.burn_batch(&[addr(1), addr(2)], class, &[10, 5], b"").unwrap();
    assert_eq!(outcome.classes[0].left, vec![addr(1)]);
    assert_eq!(ledger.holder_count(class).unwrap(), 1);
    assert_eq!(ledger.total_supply(class).unwrap(), 5);
}

#[test]
fn non_divisible_class_with_share_decimals() {
    let config = LedgerConfig {
        share_decimals: 18,
        ..LedgerConfig::default()
    };
    let mut ledger = Ledger::new(config).unwrap();
    let class = ledger.create_class(10, 5 * E18, true).unwrap();

    ledger.mint(addr(1), class, 5 * E18).unwrap();
    let err = ledger.mint(addr(1), class, E18 / 2).unwrap_err();
    assert!(matches!(
        err.compliance(),
        Some(ComplianceError::DivisibilityViolation { .. })
    ));
    ledger.transfer(addr(1), addr(2), class, 5 * E18).unwrap();
    assert_eq!(ledger.holders(class).unwrap(), vec![addr(2)]);

    assert!(matches!(
        ledger.create_class(0, E18 + 1, true),
        Err(LedgerError::InvalidParameters(_))
    ));
}

#[test]
fn classes_are_independent() {
    let mut ledger = Ledger::default();
    let narrow = ledger.create_class(1, 0, false).unwrap();
    let wide = ledger.create_class(0, 0, false).unwrap();
    assert_eq!(narrow, ClassId::new(0));
    assert_eq!(wide, ClassId::new(1));

    ledger.mint(addr(1), narrow, 1).unwrap();
    ledger.mint_batch(&[addr(2), addr(3)], wide, &[1, 1], b"").unwrap();
    assert!(ledger.mint(addr(2), narrow, 1).is_err());
    assert_eq!(ledger.holder_count(narrow).unwrap(), 1);
    assert_eq!(ledger.holder_count(wide).unwrap(), 2);
}

#[test]
fn caller_errors_are_distinguished() {
    let mut ledger = Ledger::default();
    let class = ledger.create_class(0, 0, false).unwrap();
    let arity = ledger.mint_batch(&[addr(1)], class, &[1, 2], b"").unwrap_err();
    let unknown = ledger.mint(addr(1), ClassId::new(42), 1).unwrap_err();
    assert!(arity.is_caller_error());
    assert!(unknown.is_caller_error());
    assert!(!arity.is_rule_violation());
}

#[test]
fn concurrent_mints_never_exceed_limit() {
    let shared = SharedLedger::new(Ledger::default());
    let class = shared.create_class(5, 0, false).unwrap();

    let handles: Vec<_> = (1..=20u8)
        .map(|n| {
            let ledger = shared.clone();
            thread::spawn(move || ledger.mint(addr(n), class, 10).is_ok())
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, 5);
    assert_eq!(shared.holder_count(class).unwrap(), 5);
    assert_eq!(shared.holders(class).unwrap().len(), 5);
}

#[test]
fn concurrent_transfers_conserve_supply() {
    let shared = SharedLedger::new(Ledger::default());
    let class = shared.create_class(0, 0, false).unwrap();
    shared
        .mint_batch(&[addr(1), addr(2), addr(3)], class, &[1000, 1000, 1000], b"")
        .unwrap();

    let handles: Vec<_> = (0..3u8)
        .map(|i| {
            let ledger = shared.clone();
            thread::spawn(move || {
                let from = addr(i + 1);
                let to = addr((i + 1) % 3 + 1);
                for _ in 0..50 {
                    let _ = ledger.transfer(from, to, class, 7);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total: u128 = (1..=3u8)
        .map(|n| shared.balance_of(&addr(n), class).unwrap())
        .sum();
    assert_eq!(total, 3000);
    let holders = shared.holders(class).unwrap().len() as u64;
    assert_eq!(shared.holder_count(class).unwrap(), holders);
}
