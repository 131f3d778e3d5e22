use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Fill in the one unknown field of a loan record. Unknown fields are
/// omitted or `null` in the JSON.
#[napi]
pub fn solve_loan(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::loans::analysis::LoanAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::loans::solver::solve_with(&input.record, &input.rate_search)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::loans::analysis::LoanAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fincalc_core::loans::analysis::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::loans::amortization::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::loans::amortization::build_amortization(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[napi]
pub fn project_sip(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::investments::sip::SipInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::investments::sip::project_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_swp(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::investments::swp::SwpInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::investments::swp::project_swp(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_swp_with_inflation(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::investments::swp::SwpInflationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::investments::swp::project_swp_with_inflation(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_mortgage_swp(input_json: String) -> NapiResult<String> {
    let input: fincalc_core::comparison::mortgage_swp::MortgageSwpInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fincalc_core::comparison::mortgage_swp::compare_mortgage_swp(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
