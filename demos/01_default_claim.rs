/// default claim - lender takes the collateral after the due date passes
use collateral_loan_rs::{InMemoryTransfer, LedgerError, LoanLedger, Money, Principal, Rate, SafeTimeProvider, TimeSource};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== default claim ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let borrower = Principal::new("borrower");
    let lender = Principal::new("lender");
    let mut ledger = LoanLedger::new(InMemoryTransfer::new());

    let id = ledger.request_loan(
        &borrower,
        Money::from_major(100),
        Money::from_major(5),
        Rate::ZERO,
        864_000,
        &time,
    )?;
    ledger.fund_loan(&lender, id, Money::from_major(5), &time)?;

    let loan = ledger.get_loan(id)?;
    println!("funded on {}", time.now().format("%Y-%m-%d"));
    println!("due date:  {}", loan.due_date.map(|d| d.to_string()).unwrap_or_default());

    // too early
    controller.advance(Duration::days(5));
    match ledger.claim_collateral(&lender, id, &time) {
        Err(LedgerError::NotYetDue { due_date, .. }) => println!("\nday 5: claim refused, due {}", due_date),
        other => println!("\nday 5: unexpected {:?}", other),
    }

    // borrower never repays
    controller.advance(Duration::days(10));
    ledger.claim_collateral(&lender, id, &time)?;
    println!("day 15: collateral claimed");

    println!("\nstatus: {}", ledger.get_loan(id)?.status());
    println!("lender balance: {}", ledger.transfer().balance_of(&lender));
    println!("borrower balance: {}", ledger.transfer().balance_of(&borrower));

    for event in ledger.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
