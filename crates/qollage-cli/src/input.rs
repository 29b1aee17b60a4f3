//! Circuit input files.
//!
//! A circuit file is TOML with optional `qubits`/`modes` counts and an
//! ordered array of `[[operations]]` tables tagged by `kind`:
//!
//! ```toml
//! qubits = 2
//!
//! [[operations]]
//! kind = "gate"
//! name = "Hadamard"
//! qubits = [0]
//!
//! [[operations]]
//! kind = "controlled"
//! name = "PauliX"
//! controls = [0]
//! targets = [1]
//! ```
//!
//! Missing counts are inferred from the highest referenced index.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use qollage::circuit::{Circuit, Operation};

/// Errors raised while reading a circuit file.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read circuit file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid circuit file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CircuitFile {
    qubits: Option<usize>,
    modes: Option<usize>,
    #[serde(default)]
    operations: Vec<Operation>,
}

/// Reads and parses the circuit stored at `path`.
pub fn load_circuit(path: &Path) -> Result<Circuit, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_circuit(&content).map_err(|message| InputError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses a circuit from TOML source.
pub fn parse_circuit(source: &str) -> Result<Circuit, String> {
    let file: CircuitFile = toml::from_str(source).map_err(|err| err.to_string())?;

    let mut circuit = Circuit::from_operations(file.operations);
    if let Some(qubits) = file.qubits {
        circuit = circuit.with_qubits(qubits);
    }
    if let Some(modes) = file.modes {
        circuit = circuit.with_modes(modes);
    }

    debug!(
        qubits = circuit.number_of_qubits(),
        modes = circuit.number_of_modes(),
        operations = circuit.len();
        "Circuit file parsed"
    );
    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_counts_win() {
        let circuit = parse_circuit(
            r#"
            qubits = 3

            [[operations]]
            kind = "gate"
            name = "Hadamard"
            qubits = [0]
            "#,
        )
        .unwrap();
        assert_eq!(circuit.number_of_qubits(), 3);
        assert_eq!(circuit.operations(), [Operation::gate("Hadamard", [0])]);
    }

    #[test]
    fn test_counts_are_inferred() {
        let circuit = parse_circuit(
            r#"
            [[operations]]
            kind = "bosonic"
            name = "BeamSplitter"
            modes = [0, 1]

            [[operations]]
            kind = "controlled"
            name = "PauliX"
            controls = [0]
            targets = [2]
            "#,
        )
        .unwrap();
        assert_eq!(circuit.number_of_qubits(), 3);
        assert_eq!(circuit.number_of_modes(), 2);
    }

    #[test]
    fn test_empty_file_is_empty_circuit() {
        let circuit = parse_circuit("").unwrap();
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_unknown_operation_kind_is_rejected() {
        let err = parse_circuit(
            r#"
            [[operations]]
            kind = "teleport"
            qubits = [0]
            "#,
        )
        .unwrap_err();
        assert!(err.contains("teleport"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_circuit(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
