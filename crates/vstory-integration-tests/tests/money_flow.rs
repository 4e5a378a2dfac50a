//! Integration test: coins from deposit to payout.
//!
//! Exercises the full ledger lifecycle with referral follow-ups:
//! 1. A referred reader deposits and an admin approves
//! 2. The reader buys a chapter from a referred author
//! 3. Follow-ups pay both referral commissions
//! 4. The author withdraws, is refunded on rejection, then paid out
//! 5. Coins are conserved across balances, platform and tax

use vstory_integration_tests::{Recorder, TestLedger};
use vstory_ledger::{deposit, dispatch, referral, reporting, transfer, withdrawal, LedgerPolicy};
use vstory_types::account::Role;
use vstory_types::events::EventType;
use vstory_types::requests::{BankDestination, DepositMethod, RequestStatus};

fn destination() -> BankDestination {
    BankDestination {
        bank_name: "Techcombank".into(),
        bank_account: "19031234567890".into(),
        bank_holder: "TRAN THI B".into(),
    }
}

#[test]
fn deposit_purchase_withdraw_lifecycle() {
    let ledger = TestLedger::new();
    ledger.account("admin", Role::Admin, 0);
    ledger.account("scout", Role::Author, 0);
    ledger.account("writer", Role::Author, 0);
    ledger.account("reader", Role::Reader, 0);
    ledger.chapter("ch-1", "writer", 10_000);

    let mut conn = ledger.connect();
    let recorder = Recorder::default();
    referral::set_referrer(&mut conn, "reader", "scout").expect("refer reader");
    referral::set_referrer(&mut conn, "writer", "scout").expect("refer writer");

    // =========================================================
    // Deposit
    // =========================================================
    let requested = deposit::request_deposit(
        &mut conn,
        "reader",
        10_000,
        10_000,
        DepositMethod::BankTransfer,
        Some("ck tu vcb"),
    )
    .expect("request deposit");
    assert!(requested.value.reference_code.starts_with("VS"));
    let (_, follow_ups) = requested.into_parts();
    dispatch(&mut conn, &recorder, follow_ups);

    let id = reporting::list_deposits(&conn, Some("reader"), Some(RequestStatus::Pending), 10, 0)
        .expect("pending deposits")[0]
        .id;
    let (_, follow_ups) = deposit::approve_deposit(&mut conn, id, "admin", None)
        .expect("approve")
        .into_parts();
    dispatch(&mut conn, &recorder, follow_ups);
    assert_eq!(ledger.balance("reader"), 10_000);
    assert_eq!(ledger.balance("scout"), 200);

    // =========================================================
    // Purchase
    // =========================================================
    let (receipt, follow_ups) = transfer::purchase_item(&mut conn, "reader", "ch-1")
        .expect("purchase")
        .into_parts();
    assert_eq!(receipt.split, vstory_revenue::split(10_000u64));
    assert_eq!(receipt.split.author, 6_500);
    assert_eq!(receipt.payer_balance, 0);
    dispatch(&mut conn, &recorder, follow_ups);
    assert_eq!(ledger.balance("writer"), 6_500);
    assert_eq!(ledger.balance("scout"), 265);

    assert_eq!(
        recorder.kinds(),
        vec![
            EventType::DepositRequested,
            EventType::DepositApproved,
            EventType::ReferralCommission,
            EventType::ChapterSold,
            EventType::ReferralCommission,
        ]
    );

    // =========================================================
    // Withdrawal
    // =========================================================
    let policy = LedgerPolicy {
        min_withdrawal: 5_000,
        ..LedgerPolicy::default()
    };
    let first = withdrawal::request_withdrawal(&mut conn, &policy, "writer", 5_000, &destination())
        .expect("request withdrawal")
        .value;
    assert_eq!(ledger.balance("writer"), 1_500);
    withdrawal::reject_withdrawal(&mut conn, first.id, "admin", Some("wrong account number"))
        .expect("reject");
    assert_eq!(ledger.balance("writer"), 6_500);

    let second = withdrawal::request_withdrawal(&mut conn, &policy, "writer", 5_000, &destination())
        .expect("request again")
        .value;
    let paid = withdrawal::approve_withdrawal(&mut conn, second.id, "admin", None)
        .expect("approve")
        .value;
    assert_eq!(paid.payout_amount, 5_000);
    assert_eq!(ledger.balance("writer"), 1_500);

    // =========================================================
    // Conservation
    // =========================================================
    let (platform, tax) = reporting::platform_totals(&conn, 0, u64::MAX).expect("platform");
    assert_eq!((platform, tax), (3_000, 500));
    let minted = 10_000 + reporting::referral_earned(&conn, "scout").expect("referrals");
    let held = ["admin", "scout", "writer", "reader"]
        .iter()
        .map(|id| ledger.balance(id))
        .sum::<u64>();
    assert_eq!(held + platform + tax + paid.coins_reserved, minted);

    let stats = reporting::ledger_stats(&conn).expect("stats");
    assert_eq!(stats.pending_withdrawals, 0);
    assert_eq!(stats.approved_deposit_money, 10_000);
}

#[test]
fn deposit_commission_starts_at_fifty_coins() {
    let ledger = TestLedger::new();
    ledger.account("admin", Role::Admin, 0);
    ledger.account("scout", Role::Author, 0);
    ledger.account("reader", Role::Reader, 0);
    let mut conn = ledger.connect();
    referral::set_referrer(&mut conn, "reader", "scout").expect("refer");
    let recorder = Recorder::default();

    for coins in [49, 50] {
        let method = DepositMethod::Zalopay;
        let id = deposit::request_deposit(&mut conn, "reader", coins, coins, method, None)
            .expect("request")
            .value
            .id;
        let (_, follow_ups) = deposit::approve_deposit(&mut conn, id, "admin", None)
            .expect("approve")
            .into_parts();
        dispatch(&mut conn, &recorder, follow_ups);
    }

    assert_eq!(ledger.balance("reader"), 99);
    assert_eq!(ledger.balance("scout"), 1);
    let commissions: Vec<_> = recorder
        .take()
        .into_iter()
        .filter(|n| n.kind == EventType::ReferralCommission)
        .collect();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].recipient.as_deref(), Some("scout"));
    assert_eq!(commissions[0].payload["source_amount"], 50);
}

#[test]
fn gifts_move_whole_amounts_without_commission() {
    let ledger = TestLedger::new();
    ledger.account("admin", Role::Admin, 0);
    ledger.account("scout", Role::Author, 0);
    ledger.account("writer", Role::Author, 0);
    ledger.account("fan", Role::Reader, 1_000);
    ledger.chapter("ch-1", "writer", 100);
    let mut conn = ledger.connect();
    referral::set_referrer(&mut conn, "writer", "scout").expect("refer");
    let recorder = Recorder::default();

    let (gift, follow_ups) = transfer::gift_to_author(&mut conn, "fan", "writer", 300)
        .expect("gift")
        .into_parts();
    assert_eq!(gift.payee_credited(), 300);
    dispatch(&mut conn, &recorder, follow_ups);

    let (bonus, follow_ups) =
        transfer::tip(&mut conn, &LedgerPolicy::default(), "admin", "writer", "ch-1", 500)
            .expect("admin tip")
            .into_parts();
    assert_eq!(bonus.payer_debited, 0);
    dispatch(&mut conn, &recorder, follow_ups);

    assert_eq!(ledger.balance("fan"), 700);
    assert_eq!(ledger.balance("writer"), 800);
    assert_eq!(ledger.balance("scout"), 0);
    assert_eq!(recorder.kinds(), vec![EventType::GiftReceived, EventType::GiftReceived]);
    assert_eq!(
        reporting::platform_totals(&conn, 0, u64::MAX).expect("platform"),
        (0, 0)
    );
}
