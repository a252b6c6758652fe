//! Financial formula catalog
//!
//! A closed set of named formulas (simple and compound interest, rate
//! conversion, discount, annuities, gradients, loan installments) plus the
//! `formula_experimental` escape hatch, which evaluates a plan-supplied
//! expression. Every evaluation also renders the formula with the numbers that
//! were actually used, e.g. `1000 * (1 + 0.12 * 2) = 1240`.
//!
//! The same table feeds the planner's knowledge base, so the names the model
//! is told about are exactly the names dispatched here.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::expression;
use crate::error::{CalcError, CalcResult};
use crate::types::{format_value, Inputs, Value, EXPERIMENTAL_FORMULA};

/// Formula family, used to group the catalog for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SimpleInterest,
    CompoundInterest,
    Rates,
    RationalDiscount,
    BankDiscount,
    OrdinaryAnnuity,
    AnnuityDue,
    DeferredAnnuity,
    ArithmeticGradient,
    GeometricGradient,
    Loan,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::SimpleInterest,
        Category::CompoundInterest,
        Category::Rates,
        Category::RationalDiscount,
        Category::BankDiscount,
        Category::OrdinaryAnnuity,
        Category::AnnuityDue,
        Category::DeferredAnnuity,
        Category::ArithmeticGradient,
        Category::GeometricGradient,
        Category::Loan,
    ];

    /// Section heading used in the planner knowledge base
    pub fn title(self) -> &'static str {
        match self {
            Category::SimpleInterest => "INTERÉS SIMPLE",
            Category::CompoundInterest => "INTERÉS COMPUESTO",
            Category::Rates => "TASAS DE INTERÉS",
            Category::RationalDiscount => "DESCUENTO RACIONAL (usando interés compuesto)",
            Category::BankDiscount => "DESCUENTO BANCARIO/COMERCIAL COMPUESTO",
            Category::OrdinaryAnnuity => "ANUALIDADES VENCIDAS",
            Category::AnnuityDue => "ANUALIDADES ANTICIPADAS",
            Category::DeferredAnnuity => "ANUALIDADES DIFERIDAS VENCIDAS",
            Category::ArithmeticGradient => "GRADIENTE ARITMÉTICO",
            Category::GeometricGradient => "GRADIENTE GEOMÉTRICO",
            Category::Loan => "PRÉSTAMOS (para cuota N)",
        }
    }
}

/// Identifier of a catalog formula.
///
/// Discriminants index into [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Formula {
    IsIFromPjn,
    IsSFromPjn,
    IsPFromSjn,
    IsPFromIjn,
    IsNFromSPI,
    IsJFromSPn,
    IcSFromPin,
    IcPFromSin,
    IcIFromPin,
    IcNFromSPi,
    IcIFromSPn,
    IcSFromPjm,
    IcPFromSjm,
    TasaEfectivaFromNominal,
    TasaEquivalente,
    TasaReal,
    DrDFromSin,
    DrPFromSin,
    DbDBFromSden,
    DbPFromSden,
    DbDeFromPsn,
    AvSFromRin,
    AvPFromRin,
    AvRFromSin,
    AvRFromPin,
    AvNFromSRi,
    AvNFromPRi,
    AaSFromRin,
    AaPFromRin,
    AaRFromSin,
    AaRFromPin,
    AdvPFromRink,
    GaPFromGin,
    GaSFromGin,
    GgPFromRgin,
    GgSFromRgin,
    PrestamoSaldoN,
    PrestamoAmortizacionN,
    PrestamoInteresN,
}

/// Static description of a catalog formula
#[derive(Debug, Serialize)]
pub struct FormulaInfo {
    #[serde(skip)]
    pub formula: Formula,
    pub name: &'static str,
    pub category: Category,
    /// Symbolic form, as shown to the planner
    pub expression: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
    /// Inputs the formula reads; a missing one yields an invalid result
    pub parameters: &'static [&'static str],
}

const fn info(
    formula: Formula,
    name: &'static str,
    category: Category,
    expression: &'static str,
    note: Option<&'static str>,
    parameters: &'static [&'static str],
) -> FormulaInfo {
    FormulaInfo {
        formula,
        name,
        category,
        expression,
        note,
        parameters,
    }
}

use Category as C;
use Formula as F;

/// The complete catalog, in [`Formula`] discriminant order
pub static CATALOG: [FormulaInfo; 39] = [
    info(F::IsIFromPjn, "formula_is_I_from_Pjn", C::SimpleInterest, "I = P * j * n", Some("n en años"), &["P", "j", "n"]),
    info(F::IsSFromPjn, "formula_is_S_from_Pjn", C::SimpleInterest, "S = P * (1 + j * n)", Some("n en años"), &["P", "j", "n"]),
    info(F::IsPFromSjn, "formula_is_P_from_Sjn", C::SimpleInterest, "P = S / (1 + j * n)", Some("n en años"), &["S", "j", "n"]),
    info(F::IsPFromIjn, "formula_is_P_from_Ijn", C::SimpleInterest, "P = I / (j * n)", Some("n en años"), &["I", "j", "n"]),
    info(F::IsNFromSPI, "formula_is_n_from_SPI", C::SimpleInterest, "n = (S/P - 1) / j", Some("resultado en años"), &["S", "P", "j"]),
    info(F::IsJFromSPn, "formula_is_j_from_SPn", C::SimpleInterest, "j = (S/P - 1) / n", None, &["S", "P", "n"]),
    info(F::IcSFromPin, "formula_ic_S_from_Pin", C::CompoundInterest, "S = P * (1 + i)^n", None, &["P", "i", "n"]),
    info(F::IcPFromSin, "formula_ic_P_from_Sin", C::CompoundInterest, "P = S * (1 + i)^-n", None, &["S", "i", "n"]),
    info(F::IcIFromPin, "formula_ic_I_from_Pin", C::CompoundInterest, "I = P * ((1 + i)^n - 1)", None, &["P", "i", "n"]),
    info(F::IcNFromSPi, "formula_ic_n_from_SPi", C::CompoundInterest, "n = log(S / P) / log(1 + i)", None, &["S", "P", "i"]),
    info(F::IcIFromSPn, "formula_ic_i_from_SPn", C::CompoundInterest, "i = (S / P)^(1/n) - 1", None, &["S", "P", "n"]),
    info(F::IcSFromPjm, "formula_ic_S_from_Pjm", C::CompoundInterest, "S = P * (1 + j / m)^n", Some("n es número total de capitalizaciones"), &["P", "j", "m", "n"]),
    info(F::IcPFromSjm, "formula_ic_P_from_Sjm", C::CompoundInterest, "P = S * (1 + j / m)^-n", Some("n es número total de capitalizaciones"), &["S", "j", "m", "n"]),
    info(F::TasaEfectivaFromNominal, "formula_tasa_efectiva_from_nominal", C::Rates, "i = (1 + j / m)^(m * t) - 1", Some("t es el plazo en años, ej: para tasa mensual t=1/12; por defecto t=1"), &["j", "m"]),
    info(F::TasaEquivalente, "formula_tasa_equivalente", C::Rates, "i_eq = (1 + i_conocida)^(n_deseada / n_conocida) - 1", Some("n en días"), &["i_conocida", "n_deseada", "n_conocida"]),
    info(F::TasaReal, "formula_tasa_real", C::Rates, "r = (i - pi) / (1 + pi)", Some("i y pi son tasas efectivas"), &["i", "pi"]),
    info(F::DrDFromSin, "formula_dr_D_from_Sin", C::RationalDiscount, "D = S * (1 - (1 + i)^-n)", None, &["S", "i", "n"]),
    info(F::DrPFromSin, "formula_dr_P_from_Sin", C::RationalDiscount, "P = S * (1 + i)^-n", Some("Valor líquido = P"), &["S", "i", "n"]),
    info(F::DbDBFromSden, "formula_db_DB_from_Sden", C::BankDiscount, "DB = S * (1 - (1 - de)^n)", None, &["S", "de", "n"]),
    info(F::DbPFromSden, "formula_db_P_from_Sden", C::BankDiscount, "P = S * (1 - de)^n", Some("Valor líquido = P"), &["S", "de", "n"]),
    info(F::DbDeFromPsn, "formula_db_de_from_Psn", C::BankDiscount, "de = 1 - (P/S)^(1/n)", None, &["P", "S", "n"]),
    info(F::AvSFromRin, "formula_av_S_from_Rin", C::OrdinaryAnnuity, "S = R * (((1 + i)^n - 1) / i)", None, &["R", "i", "n"]),
    info(F::AvPFromRin, "formula_av_P_from_Rin", C::OrdinaryAnnuity, "P = R * ((1 - (1 + i)^-n) / i)", None, &["R", "i", "n"]),
    info(F::AvRFromSin, "formula_av_R_from_Sin", C::OrdinaryAnnuity, "R = S * (i / ((1 + i)^n - 1))", None, &["S", "i", "n"]),
    info(F::AvRFromPin, "formula_av_R_from_Pin", C::OrdinaryAnnuity, "R = P * (i / (1 - (1 + i)^-n))", None, &["P", "i", "n"]),
    info(F::AvNFromSRi, "formula_av_n_from_SRi", C::OrdinaryAnnuity, "n = log((S * i / R) + 1) / log(1 + i)", None, &["S", "R", "i"]),
    info(F::AvNFromPRi, "formula_av_n_from_PRi", C::OrdinaryAnnuity, "n = -log(1 - (P * i / R)) / log(1 + i)", None, &["P", "R", "i"]),
    info(F::AaSFromRin, "formula_aa_S_from_Rin", C::AnnuityDue, "S = R * (((1 + i)^n - 1) / i) * (1 + i)", None, &["R", "i", "n"]),
    info(F::AaPFromRin, "formula_aa_P_from_Rin", C::AnnuityDue, "P = R * ((1 - (1 + i)^-n) / i) * (1 + i)", None, &["R", "i", "n"]),
    info(F::AaRFromSin, "formula_aa_R_from_Sin", C::AnnuityDue, "R = (S / (1 + i)) * (i / ((1 + i)^n - 1))", None, &["S", "i", "n"]),
    info(F::AaRFromPin, "formula_aa_R_from_Pin", C::AnnuityDue, "R = (P / (1 + i)) * (i / (1 - (1 + i)^-n))", None, &["P", "i", "n"]),
    info(F::AdvPFromRink, "formula_adv_P_from_Rink", C::DeferredAnnuity, "P = R * ((1 - (1 + i)^-n) / i) * (1 + i)^-k", None, &["R", "i", "n", "k"]),
    info(F::GaPFromGin, "formula_ga_P_from_Gin", C::ArithmeticGradient, "P = (G / i) * (((1 - (1 + i)^-n) / i) - (n * (1 + i)^-n))", None, &["G", "i", "n"]),
    info(F::GaSFromGin, "formula_ga_S_from_Gin", C::ArithmeticGradient, "S = (G / i) * ((((1 + i)^n - 1) / i) - n)", None, &["G", "i", "n"]),
    info(F::GgPFromRgin, "formula_gg_P_from_Rgin", C::GeometricGradient, "P = R * ((1 - ((1 + g) / (1 + i))^n) / (i - g))", None, &["R", "g", "i", "n"]),
    info(F::GgSFromRgin, "formula_gg_S_from_Rgin", C::GeometricGradient, "S = R * ((((1 + i)^n) - ((1 + g)^n)) / (i - g))", None, &["R", "g", "i", "n"]),
    info(F::PrestamoSaldoN, "formula_prestamo_saldo_N", C::Loan, "Saldo_N = P * (((1+i)^n - (1+i)^N) / ((1+i)^n - 1))", None, &["P", "i", "n", "N"]),
    info(F::PrestamoAmortizacionN, "formula_prestamo_amortizacion_N", C::Loan, "Amortizacion_N = (P*i / (1-(1+i)^-n)) * (1+i)^(N-1-n)", None, &["P", "i", "n", "N"]),
    info(F::PrestamoInteresN, "formula_prestamo_interes_N", C::Loan, "Interes_N = (P*i / (1-(1+i)^-n)) * (1-(1+i)^(N-1-n))", None, &["P", "i", "n", "N"]),
];

/// `format!` with each named number rendered through [`format_value`]
macro_rules! substituted {
    ($template:literal, $($name:ident),+ $(,)?) => {
        format!($template, $($name = format_value($name)),+)
    };
}

impl Formula {
    pub fn info(self) -> &'static FormulaInfo {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look up a formula by its catalog name (case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG.iter().find(|i| i.name == name).map(|i| i.formula)
    }

    /// Catalog formulas in a given category
    pub fn in_category(category: Category) -> impl Iterator<Item = &'static FormulaInfo> {
        CATALOG.iter().filter(move |i| i.category == category)
    }

    /// Evaluate with the given inputs, returning the raw result and the
    /// substituted-formula string. No validity check is applied here.
    pub fn compute(self, inputs: &Inputs) -> (f64, String) {
        let p = Params(inputs);

        match self {
            // ── Simple interest ───────────────────────────────────────────
            F::IsIFromPjn => {
                let (principal, rate, periods) = (p.get("P"), p.get("j"), p.get("n"));
                let result = principal * rate * periods;
                (
                    result,
                    substituted!(
                        "{principal} * {rate} * {periods} = {result}",
                        principal,
                        rate,
                        periods,
                        result,
                    ),
                )
            }
            F::IsSFromPjn => {
                let (principal, rate, periods) = (p.get("P"), p.get("j"), p.get("n"));
                let result = principal * (1.0 + rate * periods);
                (
                    result,
                    substituted!(
                        "{principal} * (1 + {rate} * {periods}) = {result}",
                        principal,
                        rate,
                        periods,
                        result,
                    ),
                )
            }
            F::IsPFromSjn => {
                let (future, rate, periods) = (p.get("S"), p.get("j"), p.get("n"));
                let result = future / (1.0 + rate * periods);
                (
                    result,
                    substituted!(
                        "{future} / (1 + {rate} * {periods}) = {result}",
                        future,
                        rate,
                        periods,
                        result,
                    ),
                )
            }
            F::IsPFromIjn => {
                let (interest, rate, periods) = (p.get("I"), p.get("j"), p.get("n"));
                let result = interest / (rate * periods);
                (
                    result,
                    substituted!(
                        "{interest} / ({rate} * {periods}) = {result}",
                        interest,
                        rate,
                        periods,
                        result,
                    ),
                )
            }
            F::IsNFromSPI => {
                let (future, principal, rate) = (p.get("S"), p.get("P"), p.get("j"));
                let result = (future / principal - 1.0) / rate;
                (
                    result,
                    substituted!(
                        "({future} / {principal} - 1) / {rate} = {result}",
                        future,
                        principal,
                        rate,
                        result,
                    ),
                )
            }
            F::IsJFromSPn => {
                let (future, principal, periods) = (p.get("S"), p.get("P"), p.get("n"));
                let result = (future / principal - 1.0) / periods;
                (
                    result,
                    substituted!(
                        "({future} / {principal} - 1) / {periods} = {result}",
                        future,
                        principal,
                        periods,
                        result,
                    ),
                )
            }

            // ── Compound interest ─────────────────────────────────────────
            F::IcSFromPin => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let result = principal * (1.0 + i).powf(n);
                (
                    result,
                    substituted!(
                        "{principal} * (1 + {i})^{n} = {result}",
                        principal,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::IcPFromSin => {
                let (future, i, n) = (p.get("S"), p.get("i"), p.get("n"));
                let result = future * (1.0 + i).powf(-n);
                (result, substituted!("{future} * (1 + {i})^-{n} = {result}", future, i, n, result))
            }
            F::IcIFromPin => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let result = principal * ((1.0 + i).powf(n) - 1.0);
                (
                    result,
                    substituted!(
                        "{principal} * ((1 + {i})^{n} - 1) = {result}",
                        principal,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::IcNFromSPi => {
                let (future, principal, i) = (p.get("S"), p.get("P"), p.get("i"));
                let result = (future / principal).ln() / (1.0 + i).ln();
                (
                    result,
                    substituted!(
                        "log({future} / {principal}) / log(1 + {i}) = {result}",
                        future,
                        principal,
                        i,
                        result,
                    ),
                )
            }
            F::IcIFromSPn => {
                let (future, principal, n) = (p.get("S"), p.get("P"), p.get("n"));
                let result = (future / principal).powf(1.0 / n) - 1.0;
                (
                    result,
                    substituted!(
                        "({future} / {principal})^(1/{n}) - 1 = {result}",
                        future,
                        principal,
                        n,
                        result,
                    ),
                )
            }
            F::IcSFromPjm => {
                let (principal, j, m, n) = (p.get("P"), p.get("j"), p.get("m"), p.get("n"));
                let result = principal * (1.0 + j / m).powf(n);
                (
                    result,
                    substituted!(
                        "{principal} * (1 + {j} / {m})^{n} = {result}",
                        principal,
                        j,
                        m,
                        n,
                        result,
                    ),
                )
            }
            F::IcPFromSjm => {
                let (future, j, m, n) = (p.get("S"), p.get("j"), p.get("m"), p.get("n"));
                let result = future * (1.0 + j / m).powf(-n);
                (
                    result,
                    substituted!(
                        "{future} * (1 + {j} / {m})^-{n} = {result}",
                        future,
                        j,
                        m,
                        n,
                        result,
                    ),
                )
            }

            // ── Rates ─────────────────────────────────────────────────────
            F::TasaEfectivaFromNominal => {
                let (j, m) = (p.get("j"), p.get("m"));
                let t = p.get_or("t", 1.0);
                let result = (1.0 + j / m).powf(m * t) - 1.0;
                (result, substituted!("(1 + {j} / {m})^({m}*{t}) - 1 = {result}", j, m, t, result))
            }
            F::TasaEquivalente => {
                let known = p.get("i_conocida");
                let (wanted_days, known_days) = (p.get("n_deseada"), p.get("n_conocida"));
                let result = (1.0 + known).powf(wanted_days / known_days) - 1.0;
                (
                    result,
                    substituted!(
                        "(1 + {known})^({wanted_days}/{known_days}) - 1 = {result}",
                        known,
                        wanted_days,
                        known_days,
                        result,
                    ),
                )
            }
            F::TasaReal => {
                let (i, inflation) = (p.get("i"), p.get("pi"));
                let result = (i - inflation) / (1.0 + inflation);
                (
                    result,
                    substituted!(
                        "({i} - {inflation}) / (1 + {inflation}) = {result}",
                        i,
                        inflation,
                        result,
                    ),
                )
            }

            // ── Discount ──────────────────────────────────────────────────
            F::DrDFromSin => {
                let (future, i, n) = (p.get("S"), p.get("i"), p.get("n"));
                let result = future * (1.0 - (1.0 + i).powf(-n));
                (
                    result,
                    substituted!(
                        "{future} * (1 - (1 + {i})^-{n}) = {result}",
                        future,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::DrPFromSin => {
                let (future, i, n) = (p.get("S"), p.get("i"), p.get("n"));
                let result = future * (1.0 + i).powf(-n);
                (result, substituted!("{future} * (1 + {i})^-{n} = {result}", future, i, n, result))
            }
            F::DbDBFromSden => {
                let (future, de, n) = (p.get("S"), p.get("de"), p.get("n"));
                let result = future * (1.0 - (1.0 - de).powf(n));
                (
                    result,
                    substituted!(
                        "{future} * (1 - (1 - {de})^{n}) = {result}",
                        future,
                        de,
                        n,
                        result,
                    ),
                )
            }
            F::DbPFromSden => {
                let (future, de, n) = (p.get("S"), p.get("de"), p.get("n"));
                let result = future * (1.0 - de).powf(n);
                (
                    result,
                    substituted!(
                        "{future} * (1 - {de})^{n} = {result}",
                        future,
                        de,
                        n,
                        result,
                    ),
                )
            }
            F::DbDeFromPsn => {
                let (principal, future, n) = (p.get("P"), p.get("S"), p.get("n"));
                let result = 1.0 - (principal / future).powf(1.0 / n);
                (
                    result,
                    substituted!(
                        "1 - ({principal}/{future})^(1/{n}) = {result}",
                        principal,
                        future,
                        n,
                        result,
                    ),
                )
            }

            // ── Ordinary annuities ────────────────────────────────────────
            F::AvSFromRin => {
                let (payment, i, n) = (p.get("R"), p.get("i"), p.get("n"));
                let result = payment * (((1.0 + i).powf(n) - 1.0) / i);
                (
                    result,
                    substituted!(
                        "{payment} * ((1 + {i})^{n} - 1) / {i} = {result}",
                        payment,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AvPFromRin => {
                let (payment, i, n) = (p.get("R"), p.get("i"), p.get("n"));
                let result = payment * ((1.0 - (1.0 + i).powf(-n)) / i);
                (
                    result,
                    substituted!(
                        "{payment} * (1 - (1 + {i})^-{n}) / {i} = {result}",
                        payment,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AvRFromSin => {
                let (future, i, n) = (p.get("S"), p.get("i"), p.get("n"));
                let result = future * (i / ((1.0 + i).powf(n) - 1.0));
                (
                    result,
                    substituted!(
                        "{future} * ({i} / ((1 + {i})^{n} - 1)) = {result}",
                        future,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AvRFromPin => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let result = principal * (i / (1.0 - (1.0 + i).powf(-n)));
                (
                    result,
                    substituted!(
                        "{principal} * ({i} / (1 - (1 + {i})^-{n})) = {result}",
                        principal,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AvNFromSRi => {
                let (future, payment, i) = (p.get("S"), p.get("R"), p.get("i"));
                let result = ((future * i / payment) + 1.0).ln() / (1.0 + i).ln();
                (
                    result,
                    substituted!(
                        "log(({future} * {i} / {payment}) + 1) / log(1 + {i}) = {result}",
                        future,
                        i,
                        payment,
                        result,
                    ),
                )
            }
            F::AvNFromPRi => {
                let (principal, payment, i) = (p.get("P"), p.get("R"), p.get("i"));
                let result = -(1.0 - (principal * i / payment)).ln() / (1.0 + i).ln();
                (
                    result,
                    substituted!(
                        "-log(1 - ({principal} * {i} / {payment})) / log(1 + {i}) = {result}",
                        principal,
                        i,
                        payment,
                        result,
                    ),
                )
            }

            // ── Annuities due ─────────────────────────────────────────────
            F::AaSFromRin => {
                let (payment, i, n) = (p.get("R"), p.get("i"), p.get("n"));
                let result = payment * (((1.0 + i).powf(n) - 1.0) / i) * (1.0 + i);
                (
                    result,
                    substituted!(
                        "{payment} * (((1 + {i})^{n} - 1) / {i}) * (1 + {i}) = {result}",
                        payment,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AaPFromRin => {
                let (payment, i, n) = (p.get("R"), p.get("i"), p.get("n"));
                let result = payment * ((1.0 - (1.0 + i).powf(-n)) / i) * (1.0 + i);
                (
                    result,
                    substituted!(
                        "{payment} * ((1 - (1 + {i})^-{n}) / {i}) * (1 + {i}) = {result}",
                        payment,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AaRFromSin => {
                let (future, i, n) = (p.get("S"), p.get("i"), p.get("n"));
                let result = (future / (1.0 + i)) * (i / ((1.0 + i).powf(n) - 1.0));
                (
                    result,
                    substituted!(
                        "({future} / (1 + {i})) * ({i} / ((1 + {i})^{n} - 1)) = {result}",
                        future,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::AaRFromPin => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let result = (principal / (1.0 + i)) * (i / (1.0 - (1.0 + i).powf(-n)));
                (
                    result,
                    substituted!(
                        "({principal} / (1 + {i})) * ({i} / (1 - (1 + {i})^-{n})) = {result}",
                        principal,
                        i,
                        n,
                        result,
                    ),
                )
            }

            // ── Deferred annuity ──────────────────────────────────────────
            F::AdvPFromRink => {
                let (payment, i, n, k) = (p.get("R"), p.get("i"), p.get("n"), p.get("k"));
                let result = payment * ((1.0 - (1.0 + i).powf(-n)) / i) * (1.0 + i).powf(-k);
                (
                    result,
                    substituted!(
                        "{payment} * ((1 - (1 + {i})^-{n}) / {i}) * (1 + {i})^-{k} = {result}",
                        payment,
                        i,
                        n,
                        k,
                        result,
                    ),
                )
            }

            // ── Gradients ─────────────────────────────────────────────────
            F::GaPFromGin => {
                let (gradient, i, n) = (p.get("G"), p.get("i"), p.get("n"));
                let result = (gradient / i)
                    * (((1.0 - (1.0 + i).powf(-n)) / i) - (n * (1.0 + i).powf(-n)));
                (
                    result,
                    substituted!(
                        "({gradient} / {i}) * (((1 - (1 + {i})^-{n}) / {i}) - ({n} * (1 + {i})^-{n})) = {result}",
                        gradient,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::GaSFromGin => {
                let (gradient, i, n) = (p.get("G"), p.get("i"), p.get("n"));
                let result = (gradient / i) * ((((1.0 + i).powf(n) - 1.0) / i) - n);
                (
                    result,
                    substituted!(
                        "({gradient} / {i}) * ((((1 + {i})^{n} - 1) / {i}) - {n}) = {result}",
                        gradient,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::GgPFromRgin => {
                let (payment, g, i, n) = (p.get("R"), p.get("g"), p.get("i"), p.get("n"));
                let result = payment * ((1.0 - ((1.0 + g) / (1.0 + i)).powf(n)) / (i - g));
                (
                    result,
                    substituted!(
                        "{payment} * ((1 - ((1 + {g}) / (1 + {i}))^{n}) / ({i} - {g})) = {result}",
                        payment,
                        g,
                        i,
                        n,
                        result,
                    ),
                )
            }
            F::GgSFromRgin => {
                let (payment, g, i, n) = (p.get("R"), p.get("g"), p.get("i"), p.get("n"));
                let result = payment * (((1.0 + i).powf(n) - (1.0 + g).powf(n)) / (i - g));
                (
                    result,
                    substituted!(
                        "{payment} * (((1 + {i})^{n} - (1 + {g})^{n}) / ({i} - {g})) = {result}",
                        payment,
                        i,
                        n,
                        g,
                        result,
                    ),
                )
            }

            // ── Loans (installment N of n) ────────────────────────────────
            F::PrestamoSaldoN => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let installment = p.get("N");
                let growth = (1.0 + i).powf(n);
                let result = principal * ((growth - (1.0 + i).powf(installment)) / (growth - 1.0));
                (
                    result,
                    substituted!(
                        "{principal} * (((1 + {i})^{n} - (1 + {i})^{installment}) / ((1 + {i})^{n} - 1)) = {result}",
                        principal,
                        i,
                        n,
                        installment,
                        result,
                    ),
                )
            }
            F::PrestamoAmortizacionN => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let installment = p.get("N");
                let payment = principal * i / (1.0 - (1.0 + i).powf(-n));
                let result = payment * (1.0 + i).powf(installment - 1.0 - n);
                (
                    result,
                    substituted!(
                        "({principal} * {i} / (1 - (1 + {i})^-{n})) * (1 + {i})^({installment} - 1 - {n}) = {result}",
                        principal,
                        i,
                        n,
                        installment,
                        result,
                    ),
                )
            }
            F::PrestamoInteresN => {
                let (principal, i, n) = (p.get("P"), p.get("i"), p.get("n"));
                let installment = p.get("N");
                let payment = principal * i / (1.0 - (1.0 + i).powf(-n));
                let result = payment * (1.0 - (1.0 + i).powf(installment - 1.0 - n));
                (
                    result,
                    substituted!(
                        "({principal} * {i} / (1 - (1 + {i})^-{n})) * (1 - (1 + {i})^({installment} - 1 - {n})) = {result}",
                        principal,
                        i,
                        n,
                        installment,
                        result,
                    ),
                )
            }
        }
    }
}

impl FromStr for Formula {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::from_name(s).ok_or_else(|| CalcError::UnknownFormula(s.to_string()))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric view over resolved inputs.
///
/// A missing or non-numeric parameter reads as NaN, which the validity gate
/// then reports as an invalid result.
struct Params<'a>(&'a Inputs);

impl Params<'_> {
    fn get(&self, name: &str) -> f64 {
        self.0
            .get(name)
            .and_then(Value::as_number)
            .unwrap_or(f64::NAN)
    }

    fn get_or(&self, name: &str, default: f64) -> f64 {
        self.0.get(name).and_then(Value::as_number).unwrap_or(default)
    }
}

//==============================================================================
// Dispatch
//==============================================================================

/// What a step asks the engine to evaluate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepFormula<'a> {
    Catalog(Formula),
    /// `formula_experimental` with its generated expression
    Experimental(&'a str),
}

impl<'a> StepFormula<'a> {
    /// Resolve a formula name (and optional expression) to something evaluable.
    ///
    /// A blank expression counts as missing.
    pub fn resolve(formula_name: &str, generated_formula: Option<&'a str>) -> CalcResult<Self> {
        if formula_name == EXPERIMENTAL_FORMULA {
            return generated_formula
                .filter(|expression| !expression.trim().is_empty())
                .map(StepFormula::Experimental)
                .ok_or_else(|| CalcError::MissingExpression(formula_name.to_string()));
        }
        formula_name.parse().map(StepFormula::Catalog)
    }
}

/// Result of evaluating one formula
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: f64,
    pub substituted_formula: String,
}

/// Evaluate `formula_name` against resolved inputs.
///
/// Fails with `UnknownFormula`, `MissingExpression`, `Expression` (experimental
/// syntax or binding problems) or `InvalidResult` when the value is NaN or
/// infinite.
pub fn evaluate_formula(
    formula_name: &str,
    inputs: &Inputs,
    generated_formula: Option<&str>,
) -> CalcResult<Evaluation> {
    let (result, substituted_formula) = match StepFormula::resolve(formula_name, generated_formula)? {
        StepFormula::Catalog(formula) => formula.compute(inputs),
        StepFormula::Experimental(expression) => {
            let result = expression::evaluate_generated(expression, inputs)?;
            let substituted = expression::substitute_inputs(expression, inputs)?;
            (result, format!("{substituted} = {}", format_value(result)))
        }
    };

    if !result.is_finite() {
        return Err(CalcError::InvalidResult(formula_name.to_string()));
    }

    Ok(Evaluation {
        result,
        substituted_formula,
    })
}
