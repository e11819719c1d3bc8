/// json state - ledger snapshots for debugging and monitoring
use collateral_loan_rs::{
    InMemoryTransfer, LedgerConfig, LoanLedger, LoanView, Money, Principal, Rate, SafeTimeProvider, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json state serialization ===\n");

    let config = LedgerConfig::from_json(
        r#"{ "repayment_policy": "ExactOnly", "claim_window": "AfterDueDate" }"#,
    )?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let borrower = Principal::new("borrower");
    let lender = Principal::new("lender");
    let mut ledger = LoanLedger::with_config(config, InMemoryTransfer::new());

    let id = ledger.request_loan(
        &borrower,
        Money::from_major(2),
        Money::from_major(1),
        Rate::from_bps(250),
        3_600,
        &time,
    )?;

    println!("stage 1: requested");
    println!("------------------");
    println!("{}\n", LoanView::from_loan(&ledger.get_loan(id)?).to_json_pretty()?);

    ledger.fund_loan(&lender, id, Money::from_major(1), &time)?;
    println!("stage 2: funded");
    println!("---------------");
    println!("{}\n", LoanView::from_loan(&ledger.get_loan(id)?).to_json_pretty()?);

    controller.advance(Duration::minutes(30));
    let due = ledger.get_loan(id)?.repayment_due().ok_or("repayment due out of range")?;
    ledger.repay_loan(&borrower, id, due, &time)?;
    println!("stage 3: repaid after 30 minutes");
    println!("--------------------------------");
    println!("{}\n", ledger.json());

    println!("audit trail:");
    for snapshot in ledger.snapshots_for(id) {
        println!("  {} {}", snapshot.timestamp.format("%H:%M"), snapshot.trigger);
    }

    Ok(())
}
