//! Formula catalog tests
//!
//! Cross-checks between related formulas, evaluated through the public
//! dispatcher the executor uses.

use financalc::core::{evaluate_formula, Category, Formula, CATALOG};
use financalc::error::CalcError;
use financalc::types::{format_value, Inputs, Value};
use pretty_assertions::assert_eq;

fn inputs(pairs: &[(&str, f64)]) -> Inputs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::Number(*v)))
        .collect()
}

fn eval(name: &str, pairs: &[(&str, f64)]) -> f64 {
    evaluate_formula(name, &inputs(pairs), None)
        .unwrap_or_else(|e| panic!("{} failed: {}", name, e))
        .result
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Plausible value for every standard parameter name
fn sample_value(parameter: &str) -> f64 {
    match parameter {
        "P" => 1000.0,
        "S" => 1500.0,
        "I" => 120.0,
        "R" => 100.0,
        "G" => 10.0,
        "j" => 0.12,
        "i" => 0.02,
        "g" => 0.01,
        "de" => 0.03,
        "pi" => 0.04,
        "m" => 12.0,
        "n" => 10.0,
        "N" => 4.0,
        "k" => 3.0,
        "i_conocida" => 0.02,
        "n_deseada" => 15.0,
        "n_conocida" => 30.0,
        other => panic!("No sample value for parameter '{}'", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// WHOLE CATALOG
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_formula_evaluates_with_documented_parameters() {
    for info in CATALOG.iter() {
        let pairs: Vec<(&str, f64)> = info
            .parameters
            .iter()
            .map(|p| (*p, sample_value(p)))
            .collect();

        let first = evaluate_formula(info.name, &inputs(&pairs), None)
            .unwrap_or_else(|e| panic!("{} failed: {}", info.name, e));
        let second = evaluate_formula(info.name, &inputs(&pairs), None).unwrap();

        assert!(first.result.is_finite(), "{}", info.name);
        assert_eq!(first, second, "{} is not deterministic", info.name);
        assert!(
            first.substituted_formula.ends_with(&format!("= {}", format_value(first.result))),
            "{}: {}",
            info.name,
            first.substituted_formula
        );
    }
}

#[test]
fn test_every_category_is_populated() {
    for category in Category::ALL {
        assert!(
            Formula::in_category(category).count() > 0,
            "{:?} has no formulas",
            category
        );
    }
    let total: usize = Category::ALL
        .into_iter()
        .map(|c| Formula::in_category(c).count())
        .sum();
    assert_eq!(total, CATALOG.len());
}

#[test]
fn test_names_round_trip_through_lookup() {
    for info in CATALOG.iter() {
        assert_eq!(Formula::from_name(info.name), Some(info.formula));
        assert_eq!(info.formula.name(), info.name);
    }
    assert_eq!(Formula::from_name("formula_experimental"), None);
}

// ═══════════════════════════════════════════════════════════════════════════
// RELATIONSHIPS BETWEEN FORMULAS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_compound_interest_inverses() {
    let s = eval("formula_ic_S_from_Pin", &[("P", 1000.0), ("i", 0.05), ("n", 3.0)]);
    assert_close(s, 1157.625);

    let p = eval("formula_ic_P_from_Sin", &[("S", s), ("i", 0.05), ("n", 3.0)]);
    assert_close(p, 1000.0);

    let n = eval("formula_ic_n_from_SPi", &[("S", s), ("P", 1000.0), ("i", 0.05)]);
    assert_close(n, 3.0);

    let i = eval("formula_ic_i_from_SPn", &[("S", s), ("P", 1000.0), ("n", 3.0)]);
    assert_close(i, 0.05);
}

#[test]
fn test_simple_interest_inverses() {
    let s = eval("formula_is_S_from_Pjn", &[("P", 1000.0), ("j", 0.12), ("n", 2.0)]);
    assert_close(eval("formula_is_P_from_Sjn", &[("S", s), ("j", 0.12), ("n", 2.0)]), 1000.0);
    assert_close(eval("formula_is_j_from_SPn", &[("S", s), ("P", 1000.0), ("n", 2.0)]), 0.12);
    assert_close(eval("formula_is_n_from_SPI", &[("S", s), ("P", 1000.0), ("j", 0.12)]), 2.0);
    assert_close(eval("formula_is_P_from_Ijn", &[("I", 240.0), ("j", 0.12), ("n", 2.0)]), 1000.0);
}

#[test]
fn test_annuity_due_is_ordinary_times_one_period() {
    let args = [("R", 100.0), ("i", 0.02), ("n", 10.0)];
    let ordinary = eval("formula_av_S_from_Rin", &args);
    let due = eval("formula_aa_S_from_Rin", &args);
    assert_close(due, ordinary * 1.02);

    let ordinary_p = eval("formula_av_P_from_Rin", &args);
    let deferred = eval("formula_adv_P_from_Rink", &[("R", 100.0), ("i", 0.02), ("n", 10.0), ("k", 2.0)]);
    assert_close(deferred, ordinary_p / 1.02f64.powi(2));
}

#[test]
fn test_annuity_payment_and_term_inverses() {
    let p = eval("formula_av_P_from_Rin", &[("R", 250.0), ("i", 0.015), ("n", 24.0)]);
    assert_close(eval("formula_av_R_from_Pin", &[("P", p), ("i", 0.015), ("n", 24.0)]), 250.0);
    assert_close(eval("formula_av_n_from_PRi", &[("P", p), ("R", 250.0), ("i", 0.015)]), 24.0);

    let s = eval("formula_av_S_from_Rin", &[("R", 250.0), ("i", 0.015), ("n", 24.0)]);
    assert_close(eval("formula_av_R_from_Sin", &[("S", s), ("i", 0.015), ("n", 24.0)]), 250.0);
    assert_close(eval("formula_av_n_from_SRi", &[("S", s), ("R", 250.0), ("i", 0.015)]), 24.0);
}

#[test]
fn test_gradient_future_value_is_compounded_present_value() {
    let growth = (1.03f64).powf(8.0);

    let ga_p = eval("formula_ga_P_from_Gin", &[("G", 50.0), ("i", 0.03), ("n", 8.0)]);
    let ga_s = eval("formula_ga_S_from_Gin", &[("G", 50.0), ("i", 0.03), ("n", 8.0)]);
    assert_close(ga_s, ga_p * growth);

    let gg = [("R", 200.0), ("g", 0.01), ("i", 0.03), ("n", 8.0)];
    assert_close(eval("formula_gg_S_from_Rgin", &gg), eval("formula_gg_P_from_Rgin", &gg) * growth);
}

#[test]
fn test_loan_installment_splits_into_principal_and_interest() {
    let (p, i, n) = (10_000.0, 0.01, 12.0);
    let installment = eval("formula_av_R_from_Pin", &[("P", p), ("i", i), ("n", n)]);

    for period in 1..=12 {
        let args = [("P", p), ("i", i), ("n", n), ("N", period as f64)];
        let principal = eval("formula_prestamo_amortizacion_N", &args);
        let interest = eval("formula_prestamo_interes_N", &args);
        assert_close(principal + interest, installment);
    }

    let settled = eval("formula_prestamo_saldo_N", &[("P", p), ("i", i), ("n", n), ("N", n)]);
    assert_close(settled, 0.0);
}

#[test]
fn test_bank_discount_rate_inverse() {
    let p = eval("formula_db_P_from_Sden", &[("S", 5000.0), ("de", 0.04), ("n", 3.0)]);
    assert_close(eval("formula_db_de_from_Psn", &[("P", p), ("S", 5000.0), ("n", 3.0)]), 0.04);

    let discount = eval("formula_db_DB_from_Sden", &[("S", 5000.0), ("de", 0.04), ("n", 3.0)]);
    assert_close(discount, 5000.0 - p);
}

#[test]
fn test_nominal_rate_compounding_and_inverse() {
    let s = eval("formula_ic_S_from_Pjm", &[("P", 1000.0), ("j", 0.12), ("m", 12.0), ("n", 12.0)]);
    assert_close(s, 1126.825030131970);
    assert_close(s, eval("formula_ic_S_from_Pin", &[("P", 1000.0), ("i", 0.01), ("n", 12.0)]));

    let p = eval("formula_ic_P_from_Sjm", &[("S", s), ("j", 0.12), ("m", 12.0), ("n", 12.0)]);
    assert_close(p, 1000.0);
}

#[test]
fn test_compound_interest_earned() {
    let args = [("P", 1000.0), ("i", 0.05), ("n", 3.0)];
    let interest = eval("formula_ic_I_from_Pin", &args);
    assert_close(interest, 157.625);
    assert_close(interest, eval("formula_ic_S_from_Pin", &args) - 1000.0);
}

#[test]
fn test_rational_discount_splits_future_value() {
    let args = [("S", 1157.625), ("i", 0.05), ("n", 3.0)];
    let discount = eval("formula_dr_D_from_Sin", &args);
    let present = eval("formula_dr_P_from_Sin", &args);

    assert_close(discount, 157.625);
    assert_close(present, 1000.0);
    assert_close(discount + present, 1157.625);
    assert_close(present, eval("formula_ic_P_from_Sin", &args));
}

#[test]
fn test_real_rate_removes_inflation() {
    let real = eval("formula_tasa_real", &[("i", 0.10), ("pi", 0.04)]);
    assert_close(real, 0.057692307692);
    assert_close((1.0 + real) * 1.04 - 1.0, 0.10);

    assert_close(eval("formula_tasa_real", &[("i", 0.04), ("pi", 0.04)]), 0.0);
    assert!(eval("formula_tasa_real", &[("i", 0.02), ("pi", 0.05)]) < 0.0);
}

#[test]
fn test_annuity_due_payment_inverses() {
    let present = eval("formula_aa_P_from_Rin", &[("R", 100.0), ("i", 0.02), ("n", 10.0)]);
    assert_close(present, 916.223670636709);
    assert_close(eval("formula_aa_R_from_Pin", &[("P", present), ("i", 0.02), ("n", 10.0)]), 100.0);

    let future = eval("formula_aa_S_from_Rin", &[("R", 100.0), ("i", 0.02), ("n", 10.0)]);
    assert_close(future, 1116.871541973263);
    assert_close(eval("formula_aa_R_from_Sin", &[("S", future), ("i", 0.02), ("n", 10.0)]), 100.0);
}

#[test]
fn test_effective_rate_defaults_to_one_year() {
    let annual = eval("formula_tasa_efectiva_from_nominal", &[("j", 0.12), ("m", 12.0)]);
    assert_close(annual, 1.01f64.powf(12.0) - 1.0);

    let explicit = eval("formula_tasa_efectiva_from_nominal", &[("j", 0.12), ("m", 12.0), ("t", 1.0)]);
    assert_eq!(annual, explicit);
}

// ═══════════════════════════════════════════════════════════════════════════
// SUBSTITUTED FORMULAS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_substituted_formula_rendering() {
    let cases: &[(&str, &[(&str, f64)], &str)] = &[
        (
            "formula_is_I_from_Pjn",
            &[("P", 1000.0), ("j", 0.125), ("n", 2.0)],
            "1000 * 0.125 * 2 = 250",
        ),
        (
            "formula_is_S_from_Pjn",
            &[("P", 1000.0), ("j", 0.125), ("n", 2.0)],
            "1000 * (1 + 0.125 * 2) = 1250",
        ),
        (
            "formula_is_P_from_Sjn",
            &[("S", 1250.0), ("j", 0.125), ("n", 2.0)],
            "1250 / (1 + 0.125 * 2) = 1000",
        ),
        (
            "formula_ic_S_from_Pin",
            &[("P", 1000.0), ("i", 0.5), ("n", 2.0)],
            "1000 * (1 + 0.5)^2 = 2250",
        ),
        (
            "formula_ic_P_from_Sin",
            &[("S", 2250.0), ("i", 0.5), ("n", 2.0)],
            "2250 * (1 + 0.5)^-2 = 1000",
        ),
        (
            "formula_ic_n_from_SPi",
            &[("S", 2250.0), ("P", 1000.0), ("i", 0.5)],
            "log(2250 / 1000) / log(1 + 0.5) = 2",
        ),
        (
            "formula_ic_i_from_SPn",
            &[("S", 2250.0), ("P", 1000.0), ("n", 2.0)],
            "(2250 / 1000)^(1/2) - 1 = 0.5",
        ),
        (
            "formula_tasa_efectiva_from_nominal",
            &[("j", 0.5), ("m", 2.0)],
            "(1 + 0.5 / 2)^(2*1) - 1 = 0.5625",
        ),
        (
            "formula_tasa_equivalente",
            &[("i_conocida", 1.25), ("n_deseada", 15.0), ("n_conocida", 30.0)],
            "(1 + 1.25)^(15/30) - 1 = 0.5",
        ),
        (
            "formula_dr_D_from_Sin",
            &[("S", 2250.0), ("i", 0.5), ("n", 2.0)],
            "2250 * (1 - (1 + 0.5)^-2) = 1250",
        ),
        (
            "formula_db_de_from_Psn",
            &[("P", 250.0), ("S", 1000.0), ("n", 2.0)],
            "1 - (250/1000)^(1/2) = 0.5",
        ),
        (
            "formula_db_P_from_Sden",
            &[("S", 1000.0), ("de", 0.5), ("n", 2.0)],
            "1000 * (1 - 0.5)^2 = 250",
        ),
        (
            "formula_av_S_from_Rin",
            &[("R", 100.0), ("i", 0.5), ("n", 2.0)],
            "100 * ((1 + 0.5)^2 - 1) / 0.5 = 250",
        ),
        (
            "formula_av_P_from_Rin",
            &[("R", 100.0), ("i", 1.0), ("n", 2.0)],
            "100 * (1 - (1 + 1)^-2) / 1 = 75",
        ),
        (
            "formula_av_R_from_Sin",
            &[("S", 250.0), ("i", 0.5), ("n", 2.0)],
            "250 * (0.5 / ((1 + 0.5)^2 - 1)) = 100",
        ),
        (
            "formula_av_R_from_Pin",
            &[("P", 75.0), ("i", 1.0), ("n", 2.0)],
            "75 * (1 / (1 - (1 + 1)^-2)) = 100",
        ),
        (
            "formula_av_n_from_SRi",
            &[("S", 250.0), ("R", 100.0), ("i", 0.5)],
            "log((250 * 0.5 / 100) + 1) / log(1 + 0.5) = 2",
        ),
        (
            "formula_av_n_from_PRi",
            &[("P", 75.0), ("R", 100.0), ("i", 1.0)],
            "-log(1 - (75 * 1 / 100)) / log(1 + 1) = 2",
        ),
        (
            "formula_aa_S_from_Rin",
            &[("R", 100.0), ("i", 0.5), ("n", 2.0)],
            "100 * (((1 + 0.5)^2 - 1) / 0.5) * (1 + 0.5) = 375",
        ),
        (
            "formula_aa_P_from_Rin",
            &[("R", 100.0), ("i", 1.0), ("n", 2.0)],
            "100 * ((1 - (1 + 1)^-2) / 1) * (1 + 1) = 150",
        ),
        (
            "formula_adv_P_from_Rink",
            &[("R", 100.0), ("i", 1.0), ("n", 2.0), ("k", 1.0)],
            "100 * ((1 - (1 + 1)^-2) / 1) * (1 + 1)^-1 = 37.5",
        ),
    ];

    for (name, pairs, expected) in cases {
        let evaluation = evaluate_formula(name, &inputs(pairs), None)
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        assert_eq!(evaluation.substituted_formula, *expected, "{}", name);
    }
}

#[test]
fn test_substituted_formula_uses_exponent_for_extreme_magnitudes() {
    let large = evaluate_formula(
        "formula_is_I_from_Pjn",
        &inputs(&[("P", 1e21), ("j", 2.0), ("n", 1.0)]),
        None,
    )
    .unwrap();
    assert_eq!(large.substituted_formula, "1e+21 * 2 * 1 = 2e+21");

    let tiny = evaluate_formula(
        "formula_experimental",
        &inputs(&[("a", 0.0000001)]),
        Some("a * 2"),
    )
    .unwrap();
    assert_eq!(tiny.substituted_formula, "1e-7 * 2 = 2e-7");
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_zero_rate_annuity_is_invalid() {
    let err = evaluate_formula(
        "formula_av_S_from_Rin",
        &inputs(&[("R", 100.0), ("i", 0.0), ("n", 10.0)]),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CalcError::InvalidResult(ref name) if name == "formula_av_S_from_Rin"));
}

#[test]
fn test_missing_parameter_is_invalid() {
    let err = evaluate_formula("formula_is_I_from_Pjn", &inputs(&[("P", 100.0)]), None).unwrap_err();
    assert!(matches!(err, CalcError::InvalidResult(_)));
}

#[test]
fn test_experimental_requires_expression() {
    let err = evaluate_formula("formula_experimental", &inputs(&[("a", 1.0)]), None).unwrap_err();
    assert!(matches!(err, CalcError::MissingExpression(_)));

    let ok = evaluate_formula("formula_experimental", &inputs(&[("a", 2.0)]), Some("a ^ 3 + log(1)"))
        .unwrap();
    assert_close(ok.result, 8.0);
    assert_eq!(ok.substituted_formula, "2 ^ 3 + log(1) = 8");
}
