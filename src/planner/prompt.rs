//! Prompt templates
//!
//! The formula knowledge base is rendered from the catalog, so the planner is
//! only ever told about formulas the executor can run.

use super::Mode;
use crate::core::catalog::{Category, Formula};

const INTRO: &str = "Eres FinanCalc AI, un experto planificador financiero. Tu única función es analizar un problema financiero y generar un plan de cálculo secuencial en formato JSON. Tu salida DEBE ser única y exclusivamente el objeto JSON, sin ningún texto adicional, explicaciones o markdown.";

const PROCESS: &str = "PROCESO OBLIGATORIO:
1.  La 'interpretation' debe ser corta: \"Se debe calcular [variable] para [tipo de problema]\".
2.  Identifica los datos iniciales en 'initial_data'. Usa los nombres de variables definidos en el DICCIONARIO.
3.  Determina la variable final a resolver y colócala en 'final_target_variable'.
4.  Crea un array 'calculation_steps' con los pasos necesarios, usando las fórmulas de la BASE DE CONOCIMIENTO.
5.  Cada paso debe tener 'step_name', 'target_variable', 'formula_name', y 'inputs'.
6.  Si un paso necesita el resultado de un paso anterior, en 'inputs' usa la sintaxis '{{nombre_variable_anterior}}'.";

/// Variable names the planner should use, with their meaning
pub const VARIABLE_DICTIONARY: &[(&str, &str)] = &[
    ("P", "Valor Presente, Principal, Capital Inicial"),
    ("S", "Valor Futuro, Monto, Capital Final"),
    ("I", "Monto del Interés"),
    ("j", "Tasa Nominal Anual (TNA)"),
    ("i", "Tasa de Interés Efectiva por período"),
    ("n", "Número total de períodos (días, meses, años, etc.)"),
    ("m", "Frecuencia de capitalización por año (ej: mensual=12, trimestral=4)"),
    ("R", "Renta, Anualidad, Cuota, Depósito periódico"),
    ("D", "Monto del Descuento"),
    ("d", "Tasa de Descuento"),
    ("DB", "Descuento Bancario"),
    ("dn", "Tasa de Descuento Bancario Simple"),
    ("de", "Tasa de Descuento Compuesto"),
    ("G", "Gradiente Aritmético"),
    ("g", "Tasa de Gradiente Geométrico"),
    ("k", "Período de diferimiento en anualidades"),
    ("N", "Número de cuota específica en un préstamo"),
];

const PRECISE_EXAMPLE: &str = r#"EJEMPLO DE PLAN SECUENCIAL:
Problema: "¿Con cuántos depósitos de 150 um que se realizan cada fin de quincena, se acumulará un monto de 1901.85 um? TNA de 0.24 capitalizable mensualmente."
JSON ESPERADO:
{
  "interpretation": "Se debe calcular el número de períodos (n) para una anualidad vencida, convirtiendo primero la tasa nominal a una tasa efectiva quincenal.",
  "initial_data": { "S": 1901.85, "R": 150, "j": 0.24, "m": 12, "n_conocida_dias": 30, "n_deseada_dias": 15 },
  "final_target_variable": "n_final",
  "calculation_steps": [
    {
      "step_name": "Calcular Tasa Efectiva Mensual",
      "target_variable": "i_mensual",
      "formula_name": "formula_tasa_efectiva_from_nominal",
      "inputs": { "j": 0.24, "m": 12, "t": 0.08333333333333333 }
    },
    {
      "step_name": "Calcular Tasa Efectiva Quincenal Equivalente",
      "target_variable": "i_quincenal",
      "formula_name": "formula_tasa_equivalente",
      "inputs": { "i_conocida": "{{i_mensual}}", "n_deseada": 15, "n_conocida": 30 }
    },
    {
      "step_name": "Calcular Número de Depósitos",
      "target_variable": "n_final",
      "formula_name": "formula_av_n_from_SRi",
      "inputs": { "S": 1901.85, "R": 150, "i": "{{i_quincenal}}" }
    }
  ]
}"#;

const EXPERIMENTAL_INSTRUCTIONS: &str = "MODO EXPERIMENTAL:
Si ninguna fórmula estándar encaja perfectamente, puedes crear un paso con \"formula_name\": \"formula_experimental\" y un campo adicional \"generated_formula\" con la expresión matemática que se puede evaluar. Usa los nombres de variables del DICCIONARIO en la fórmula generada. Solo se admiten números, variables, + - * / ^, paréntesis y las funciones log, ln, log10, exp, sqrt, abs y pow.";

const EXPERIMENTAL_EXAMPLE: &str = r#"EJEMPLO EXPERIMENTAL:
Problema: "Calcular la tasa efectiva para 62 días a partir de una TNA de 19.03% con capitalización trimestral."
JSON ESPERADO:
{
  "interpretation": "Se necesita una tasa para 62 días desde una TNA capitalizable trimestralmente. Se creará una fórmula experimental para ello.",
  "initial_data": { "j": 0.1903, "dias_capitalizacion": 90, "plazo_calculo_dias": 62 },
  "final_target_variable": "i_experimental",
  "calculation_steps": [
    {
      "step_name": "Tasa Efectiva Experimental",
      "target_variable": "i_experimental",
      "formula_name": "formula_experimental",
      "generated_formula": "(1 + j / (360 / dias_capitalizacion))^(plazo_calculo_dias / dias_capitalizacion) - 1",
      "inputs": { "j": 0.1903, "dias_capitalizacion": 90, "plazo_calculo_dias": 62 }
    }
  ]
}"#;

const CLOSING: &str = "Recuerda, solo el JSON.";

/// Catalog rendered as `--- CATEGORY ---` sections of `name: expression (note)`
pub fn knowledge_base() -> String {
    let mut out = String::from("BASE DE CONOCIMIENTO DE FÓRMULAS:\n");
    for category in Category::ALL {
        out.push_str(&format!("\n--- {} ---\n", category.title()));
        for info in Formula::in_category(category) {
            let line = match info.note {
                Some(note) => format!("{}: {} ({})\n", info.name, info.expression, note),
                None => format!("{}: {}\n", info.name, info.expression),
            };
            out.push_str(&line);
        }
    }
    out
}

fn variable_dictionary() -> String {
    let mut out = String::from("DICCIONARIO DE VARIABLES:\n");
    for (name, meaning) in VARIABLE_DICTIONARY {
        out.push_str(&format!("- {}: {}\n", name, meaning));
    }
    out
}

/// System prompt for a planning mode
pub fn system_prompt(mode: Mode) -> String {
    let mut sections = vec![
        INTRO.to_string(),
        PROCESS.to_string(),
        variable_dictionary(),
        knowledge_base(),
    ];

    match mode {
        Mode::Preciso => sections.push(PRECISE_EXAMPLE.to_string()),
        Mode::Experimental => {
            sections.push(EXPERIMENTAL_INSTRUCTIONS.to_string());
            sections.push(EXPERIMENTAL_EXAMPLE.to_string());
        }
    }
    sections.push(CLOSING.to_string());

    sections.join("\n\n")
}

/// Full prompt sent to a provider: system prompt plus the quoted problem
pub fn build_prompt(mode: Mode, problem: &str) -> String {
    format!(
        "{}\n\nProblema a resolver: \"{}\"",
        system_prompt(mode),
        problem.trim()
    )
}
