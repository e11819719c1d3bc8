/// quick start - request, fund and repay a loan
use collateral_loan_rs::{InMemoryTransfer, LoanLedger, Money, Principal, Rate, SafeTimeProvider, TimeSource};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let time = SafeTimeProvider::new(TimeSource::System);
    let borrower = Principal::new("borrower");
    let lender = Principal::new("lender");

    let mut ledger = LoanLedger::new(InMemoryTransfer::new());

    // lock 150 as collateral for a 100 loan at 5% over ten days
    let id = ledger.request_loan(
        &borrower,
        Money::from_major(150),
        Money::from_major(100),
        Rate::from_percentage(5),
        864_000,
        &time,
    )?;

    ledger.fund_loan(&lender, id, Money::from_major(100), &time)?;

    let due = ledger.get_loan(id)?.repayment_due().ok_or("repayment due out of range")?;
    ledger.repay_loan(&borrower, id, due, &time)?;

    println!("{}", ledger.json());
    println!("lender received: {}", ledger.transfer().balance_of(&lender));

    Ok(())
}
