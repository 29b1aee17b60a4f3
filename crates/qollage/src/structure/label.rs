//! Label text for gate glyphs.
//!
//! Gate names are shortened to their conventional symbols and parameters are
//! appended in parentheses. Float parameters that are simple multiples of π
//! are written as fractions of π.

use std::f64::consts::PI;

use qollage_core::circuit::Parameter;

/// Denominators tried, in order, when writing a float as a fraction of π.
const PI_DENOMINATORS: [i64; 6] = [1, 2, 3, 4, 6, 8];

/// Largest numerator written as a fraction of π.
const MAX_PI_NUMERATOR: i64 = 16;

const PI_TOLERANCE: f64 = 1e-9;

const GREEK_LETTERS: [(&str, &str); 24] = [
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("theta", "θ"),
    ("iota", "ι"),
    ("kappa", "κ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("xi", "ξ"),
    ("omicron", "ο"),
    ("pi", "π"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("upsilon", "υ"),
    ("phi", "φ"),
    ("chi", "χ"),
    ("psi", "ψ"),
    ("omega", "ω"),
];

/// Returns the conventional symbol for a gate name, or the name itself.
pub fn short_name(name: &str) -> &str {
    match name {
        "Hadamard" => "H",
        "PauliX" => "X",
        "PauliY" => "Y",
        "PauliZ" => "Z",
        "Identity" => "I",
        "SGate" => "S",
        "InvSGate" => "S†",
        "TGate" => "T",
        "InvTGate" => "T†",
        "SqrtPauliX" => "√X",
        "InvSqrtPauliX" => "√X†",
        "SqrtPauliY" => "√Y",
        "InvSqrtPauliY" => "√Y†",
        "SXGate" => "SX",
        "InvSXGate" => "SX†",
        "RotateX" => "Rx",
        "RotateY" => "Ry",
        "RotateZ" => "Rz",
        "RotateXY" => "Rxy",
        "PhaseShiftState0" => "P₀",
        "PhaseShiftState1" => "P₁",
        "ISwap" => "iSWAP",
        "SqrtISwap" => "√iSWAP",
        "InvSqrtISwap" => "√iSWAP†",
        "FSwap" => "fSWAP",
        "MultiQubitZZ" => "ZZ",
        "MultiQubitMS" => "MS",
        "MolmerSorensenXX" => "MS",
        "PhaseShift" => "Φ",
        "Squeezing" => "Sq",
        "BeamSplitter" => "BS",
        "PhaseDisplacement" => "D",
        other => other,
    }
}

/// Builds the full glyph label: short name plus formatted parameters.
pub fn gate_label(name: &str, parameters: &[Parameter], precision: usize) -> String {
    let short = short_name(name);
    if parameters.is_empty() {
        return short.to_string();
    }
    let formatted: Vec<String> = parameters
        .iter()
        .map(|parameter| format_parameter(parameter, precision))
        .collect();
    format!("{short}({})", formatted.join(", "))
}

/// Formats a single parameter.
///
/// Symbols that parse as numbers are treated as floats.
pub fn format_parameter(parameter: &Parameter, precision: usize) -> String {
    match parameter {
        Parameter::Float(value) => format_angle(*value, precision),
        Parameter::Symbol(expr) => match expr.trim().parse::<f64>() {
            Ok(value) => format_angle(value, precision),
            Err(_) => replace_greek_words(expr),
        },
    }
}

/// Writes `value` as a fraction of π when it is one, otherwise as a number.
pub fn format_angle(value: f64, precision: usize) -> String {
    if let Some((numerator, denominator)) = pi_fraction(value) {
        let sign = if numerator < 0 { "-" } else { "" };
        let magnitude = numerator.abs();
        let coefficient = if magnitude == 1 {
            String::new()
        } else {
            magnitude.to_string()
        };
        return if denominator == 1 {
            format!("{sign}{coefficient}π")
        } else {
            format!("{sign}{coefficient}π/{denominator}")
        };
    }
    format_number(value, precision)
}

/// Formats a number with at most `precision` decimals, trimming trailing zeros.
pub fn format_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{value:.precision$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns the reduced `(p, q)` with `value ≈ p·π/q`, if any.
fn pi_fraction(value: f64) -> Option<(i64, i64)> {
    if !value.is_finite() || value.abs() < PI_TOLERANCE {
        return None;
    }
    PI_DENOMINATORS.iter().find_map(|&denominator| {
        let scaled = value * denominator as f64 / PI;
        let numerator = scaled.round();
        let close = (value - numerator * PI / denominator as f64).abs() < PI_TOLERANCE;
        (close && numerator != 0.0 && numerator.abs() <= MAX_PI_NUMERATOR as f64)
            .then_some((numerator as i64, denominator))
    })
}

/// Replaces every run of ASCII letters that spells a Greek letter name.
fn replace_greek_words(expr: &str) -> String {
    let mut result = String::with_capacity(expr.len());
    let mut word = String::new();
    for ch in expr.chars() {
        if ch.is_ascii_alphabetic() {
            word.push(ch);
            continue;
        }
        push_word(&mut result, &word);
        word.clear();
        result.push(ch);
    }
    push_word(&mut result, &word);
    result
}

fn push_word(result: &mut String, word: &str) {
    match GREEK_LETTERS.iter().find(|(name, _)| *name == word) {
        Some((_, symbol)) => result.push_str(symbol),
        None => result.push_str(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        assert_eq!(short_name("Hadamard"), "H");
        assert_eq!(short_name("RotateZ"), "Rz");
        assert_eq!(short_name("SqrtPauliX"), "√X");
        assert_eq!(short_name("MyCustomGate"), "MyCustomGate");
    }

    #[test]
    fn test_pi_fractions() {
        assert_eq!(format_angle(PI, 3), "π");
        assert_eq!(format_angle(-PI / 2.0, 3), "-π/2");
        assert_eq!(format_angle(3.0 * PI / 2.0, 3), "3π/2");
        assert_eq!(format_angle(PI / 3.0, 3), "π/3");
        assert_eq!(format_angle(2.0 * PI / 3.0, 3), "2π/3");
        assert_eq!(format_angle(3.0 * PI / 4.0, 3), "3π/4");
        assert_eq!(format_angle(PI / 8.0, 3), "π/8");
        assert_eq!(format_angle(2.0 * PI, 3), "2π");
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(format_angle(0.0, 3), "0");
        assert_eq!(format_angle(0.5, 3), "0.5");
        assert_eq!(format_angle(1.23456, 3), "1.235");
        assert_eq!(format_angle(2.0, 3), "2");
        assert_eq!(format_angle(-0.0001, 3), "0");
        assert_eq!(format_angle(0.069, 2), "0.07");
        assert_eq!(format_angle(17.0 * PI, 3), "53.407");
    }

    #[test]
    fn test_symbols() {
        let precision = 3;
        assert_eq!(format_parameter(&Parameter::from("theta"), precision), "θ");
        assert_eq!(
            format_parameter(&Parameter::from("2*phi + theta_1"), precision),
            "2*φ + θ_1"
        );
        assert_eq!(format_parameter(&Parameter::from("alphabet"), precision), "alphabet");
        assert_eq!(format_parameter(&Parameter::from("5"), precision), "5");
        assert_eq!(format_parameter(&Parameter::from("pi/2"), precision), "π/2");
    }

    #[test]
    fn test_gate_label() {
        assert_eq!(gate_label("Hadamard", &[], 3), "H");
        assert_eq!(
            gate_label("RotateX", &[Parameter::Float(PI / 2.0)], 3),
            "Rx(π/2)"
        );
        assert_eq!(
            gate_label(
                "RotateXY",
                &[Parameter::Float(1.0), Parameter::from("theta")],
                3
            ),
            "Rxy(1, θ)"
        );
    }
}
