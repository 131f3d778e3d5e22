use fincalc_core::loans::amortization::{self, AmortizationEntry};
use fincalc_core::loans::analysis::{self, LoanAnalysisInput};
use fincalc_core::loans::solver::{self, LoanField, LoanRecord, RateSearchConfig, RateSearchStatus};
use fincalc_core::time_value::{annuity_payment, monthly_rate};
use fincalc_core::FinCalcError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn standard_loan() -> LoanRecord {
    LoanRecord {
        loan_amount: Some(dec!(24000)),
        interest_rate: Some(dec!(6)),
        loan_term_years: Some(dec!(2)),
        down_payment: Decimal::ZERO,
        monthly_payment: None,
    }
}

fn rel_err(actual: Decimal, expected: Decimal) -> Decimal {
    if expected.is_zero() {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    }
}

// ===========================================================================
// Concrete scenario: 24k at 6% over 2 years
// ===========================================================================

#[test]
fn test_payment_then_schedule_standard_loan() {
    let solved = solver::solve(&standard_loan()).unwrap();
    let payment = solved.monthly_payment.unwrap();
    // Exact annuity payment is 1063.6946...
    assert!((payment - dec!(1063.69)).abs() < dec!(0.01), "got {payment}");

    let schedule = amortization::generate_schedule(dec!(24000), dec!(6), dec!(2), payment).unwrap();
    assert_eq!(schedule.len(), 24);
    assert!((schedule[0].interest - dec!(120)).abs() < dec!(0.01));
    assert!(schedule[23].remaining_balance < dec!(0.5));
}

#[test]
fn test_rate_solve_recovers_standard_loan() {
    let payment = solver::solve(&standard_loan()).unwrap().monthly_payment.unwrap();
    let input = LoanRecord {
        interest_rate: None,
        monthly_payment: Some(payment),
        ..standard_loan()
    };
    let rate = solver::solve(&input).unwrap().interest_rate.unwrap();
    assert!((rate - dec!(6)).abs() < dec!(0.01), "got {rate}");
}

// ===========================================================================
// Round-trip law across a grid of loans
// ===========================================================================

#[test]
fn test_round_trip_every_solve_mode() {
    let loans = [
        (dec!(24000), dec!(6), dec!(2), dec!(0)),
        (dec!(350000), dec!(4.25), dec!(30), dec!(70000)),
        (dec!(8000), dec!(13.9), dec!(3), dec!(500)),
        (dec!(12000), dec!(0), dec!(4), dec!(0)),
    ];

    for (amount, rate, term, down) in loans {
        let full = solver::solve(&LoanRecord {
            loan_amount: Some(amount),
            interest_rate: Some(rate),
            loan_term_years: Some(term),
            down_payment: down,
            monthly_payment: None,
        })
        .unwrap();
        let payment = full.monthly_payment.unwrap();

        let principal = solver::solve(&LoanRecord {
            loan_amount: None,
            ..full.clone()
        })
        .unwrap();
        assert!(rel_err(principal.loan_amount.unwrap(), amount) < dec!(0.000001));

        let term_solved = solver::solve(&LoanRecord {
            loan_term_years: None,
            ..full.clone()
        })
        .unwrap();
        assert!(rel_err(term_solved.loan_term_years.unwrap(), term) < dec!(0.000001));

        let rate_solved = solver::solve(&LoanRecord {
            interest_rate: None,
            ..full.clone()
        })
        .unwrap();
        assert!(
            (rate_solved.interest_rate.unwrap() - rate).abs() < dec!(0.0001),
            "rate {} vs {}",
            rate_solved.interest_rate.unwrap(),
            rate
        );

        // Known fields pass through untouched
        assert_eq!(rate_solved.monthly_payment, Some(payment));
        assert_eq!(rate_solved.down_payment, down);
    }
}

// ===========================================================================
// Boundaries and errors
// ===========================================================================

#[test]
fn test_zero_rate_payment_is_exact() {
    let input = LoanRecord {
        interest_rate: Some(Decimal::ZERO),
        ..standard_loan()
    };
    let payment = solver::solve(&input).unwrap().monthly_payment.unwrap();
    assert_eq!(payment, dec!(24000) / dec!(24));
}

#[test]
fn test_rate_ceiling_is_reported_not_raised() {
    let input = LoanRecord {
        interest_rate: None,
        monthly_payment: Some(dec!(5000)),
        ..standard_loan()
    };
    let solution = solver::solve_with(&input, &RateSearchConfig::default()).unwrap();
    assert_eq!(solution.record.interest_rate, Some(dec!(20)));
    assert_eq!(solution.solved_for, LoanField::InterestRate);
    assert_eq!(
        solution.rate_search.map(|r| r.status),
        Some(RateSearchStatus::ClampedAtCeiling)
    );
}

#[test]
fn test_term_solve_domain_error_at_interest_only_payment() {
    let principal = dec!(24000);
    let interest_only = principal * monthly_rate(dec!(6));
    let input = LoanRecord {
        loan_term_years: None,
        monthly_payment: Some(interest_only),
        ..standard_loan()
    };
    let err = solver::solve(&input).unwrap_err();
    assert!(matches!(err, FinCalcError::DomainError(_)));
    assert!(err.to_string().starts_with("Domain error"));
}

#[test]
fn test_insufficient_data_message() {
    let input = LoanRecord {
        loan_amount: None,
        ..standard_loan()
    };
    let err = solver::solve(&input).unwrap_err();
    assert!(matches!(err, FinCalcError::InsufficientData(_)));
}

// ===========================================================================
// Schedule properties
// ===========================================================================

fn assert_schedule_well_formed(schedule: &[AmortizationEntry], principal: Decimal) {
    let mut previous = principal;
    let mut reached_zero = false;
    for (i, entry) in schedule.iter().enumerate() {
        assert_eq!(entry.month, i as u32 + 1);
        assert!(entry.interest >= Decimal::ZERO);
        assert!(entry.principal >= Decimal::ZERO);
        assert!(entry.remaining_balance >= Decimal::ZERO);
        assert!(entry.remaining_balance <= previous);
        if reached_zero {
            assert!(entry.remaining_balance.is_zero());
        }
        reached_zero = entry.remaining_balance.is_zero();
        previous = entry.remaining_balance;
    }
}

#[test]
fn test_schedules_are_well_formed() {
    let cases = [
        (dec!(24000), dec!(6), dec!(2)),
        (dec!(280000), dec!(4.25), dec!(30)),
        (dec!(5000), dec!(19.99), dec!(1)),
    ];
    for (principal, rate, term) in cases {
        let payment = annuity_payment(principal, monthly_rate(rate), term * dec!(12)).unwrap();
        let schedule = amortization::generate_schedule(principal, rate, term, payment).unwrap();
        assert_eq!(Decimal::from(schedule.len() as u32), term * dec!(12));
        assert_schedule_well_formed(&schedule, principal);
        assert!(schedule.last().unwrap().remaining_balance < dec!(0.5));
    }
}

#[test]
fn test_overpayment_schedule_stays_at_zero() {
    let schedule = amortization::generate_schedule(dec!(6000), dec!(8), dec!(2), dec!(1000)).unwrap();
    assert_eq!(schedule.len(), 24);
    assert_schedule_well_formed(&schedule, dec!(6000));
    assert!(schedule[23].remaining_balance.is_zero());

    let summary = amortization::summarize(&schedule).unwrap();
    assert!((summary.total_principal - dec!(6000)).abs() < dec!(0.000001));
    assert_eq!(schedule[23].payment, Decimal::ZERO);
}

// ===========================================================================
// Full analysis envelope
// ===========================================================================

#[test]
fn test_analysis_from_json() {
    let input: LoanAnalysisInput = serde_json::from_str(
        r#"{
            "loan_amount": "30000",
            "interest_rate": "7.5",
            "down_payment": "5000",
            "monthly_payment": "500"
        }"#,
    )
    .unwrap();
    let result = analysis::analyze_loan(&input).unwrap();
    let out = &result.result;

    assert_eq!(out.solution.solved_for, LoanField::LoanTerm);
    assert_eq!(out.financed_principal, dec!(25000));
    let term = out.solution.record.loan_term_years.unwrap();
    // 25k at 7.5% with 500/month takes a little over 5 years
    assert!(term > dec!(5) && term < dec!(6), "got {term}");
    assert_eq!(out.schedule.len() as u32, out.summary.number_of_payments);
    assert!(out.summary.final_balance < dec!(0.5));
    assert_eq!(result.metadata.precision, "rust_decimal_128bit");
}
