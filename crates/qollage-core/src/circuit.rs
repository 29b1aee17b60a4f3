//! Circuit input model.
//!
//! A [`Circuit`] is an ordered list of [`Operation`]s together with the
//! declared number of qubits and bosonic modes. Operation order defines time
//! precedence on shared lines. The model is read-only input for the diagram
//! engine: nothing downstream mutates it.
//!
//! All types implement [`serde::Deserialize`], so circuits can be described in
//! any serde format. Operations are tagged by a `kind` field:
//!
//! ```
//! # use qollage_core::circuit::{Operation, Parameter};
//! let op: Operation = toml::from_str(
//!     r#"
//!     kind = "gate"
//!     name = "RotateX"
//!     qubits = [0]
//!     parameters = ["theta"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(op, Operation::rotation("RotateX", 0, Parameter::from("theta")));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A gate parameter: either a concrete number or a symbolic expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Float(f64),
    Symbol(String),
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Self::Symbol(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Self::Symbol(value)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(value) => write!(f, "{value}"),
            Self::Symbol(expr) => write!(f, "{expr}"),
        }
    }
}

/// Element type of a classical register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    #[default]
    Bit,
    Float,
    Complex,
    Integer,
}

/// A single circuit operation.
///
/// The set of variants is closed. Operations the upstream circuit library
/// knows but this engine cannot draw arrive as [`Operation::Opaque`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// A gate acting on one or more qubits, optionally parametrized.
    Gate {
        name: String,
        qubits: Vec<usize>,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    /// A gate on `targets` conditioned on every qubit in `controls`.
    Controlled {
        name: String,
        controls: Vec<usize>,
        targets: Vec<usize>,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    /// Measures `qubit` into bit `bit` of the classical register `register`.
    Measure {
        qubit: usize,
        register: String,
        bit: usize,
    },
    /// Synchronizes the given qubits. An empty list means every qubit.
    Barrier {
        #[serde(default)]
        qubits: Vec<usize>,
    },
    /// Declares a classical register.
    DefineRegister {
        name: String,
        length: usize,
        #[serde(default)]
        register_kind: RegisterKind,
        #[serde(default)]
        is_output: bool,
    },
    /// A simulator or compiler directive.
    Pragma {
        name: String,
        #[serde(default)]
        qubits: Vec<usize>,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    /// A sub-circuit repeated `repetitions` times.
    Loop {
        repetitions: Parameter,
        body: Vec<Operation>,
    },
    /// A sub-circuit executed only when bit `bit` of `register` is set.
    Conditional {
        register: String,
        bit: usize,
        body: Vec<Operation>,
    },
    /// A sub-circuit controlled by the qubit `control`.
    ControlledCircuit { control: usize, body: Vec<Operation> },
    /// Sets bit `bit` of the classical register `register` to `value`.
    InputBit {
        register: String,
        bit: usize,
        value: bool,
    },
    /// Binds the symbol `name` to `value`.
    InputSymbolic { name: String, value: f64 },
    /// An operation on bosonic modes, possibly coupled to qubits.
    Bosonic {
        name: String,
        modes: Vec<usize>,
        #[serde(default)]
        qubits: Vec<usize>,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    /// An operation kind the diagram engine has no glyph for.
    Opaque {
        name: String,
        #[serde(default)]
        qubits: Vec<usize>,
    },
}

impl Operation {
    /// Creates an unparametrized gate.
    pub fn gate(name: impl Into<String>, qubits: impl Into<Vec<usize>>) -> Self {
        Self::Gate {
            name: name.into(),
            qubits: qubits.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a single-qubit gate with one parameter.
    pub fn rotation(name: impl Into<String>, qubit: usize, angle: impl Into<Parameter>) -> Self {
        Self::Gate {
            name: name.into(),
            qubits: vec![qubit],
            parameters: vec![angle.into()],
        }
    }

    /// Creates an unparametrized controlled gate.
    pub fn controlled(
        name: impl Into<String>,
        controls: impl Into<Vec<usize>>,
        targets: impl Into<Vec<usize>>,
    ) -> Self {
        Self::Controlled {
            name: name.into(),
            controls: controls.into(),
            targets: targets.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a controlled NOT gate.
    pub fn cnot(control: usize, target: usize) -> Self {
        Self::controlled("PauliX", [control], [target])
    }

    /// Creates a measurement of `qubit` into `register[bit]`.
    pub fn measure(qubit: usize, register: impl Into<String>, bit: usize) -> Self {
        Self::Measure {
            qubit,
            register: register.into(),
            bit,
        }
    }

    /// Creates a barrier over the given qubits (empty means all qubits).
    pub fn barrier(qubits: impl Into<Vec<usize>>) -> Self {
        Self::Barrier {
            qubits: qubits.into(),
        }
    }

    /// Creates a bit register definition.
    pub fn define_bits(name: impl Into<String>, length: usize) -> Self {
        Self::DefineRegister {
            name: name.into(),
            length,
            register_kind: RegisterKind::Bit,
            is_output: true,
        }
    }

    /// Creates a pragma acting on the given qubits.
    pub fn pragma(name: impl Into<String>, qubits: impl Into<Vec<usize>>) -> Self {
        Self::Pragma {
            name: name.into(),
            qubits: qubits.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a loop repeating `body`.
    pub fn repeat(repetitions: impl Into<Parameter>, body: Vec<Operation>) -> Self {
        Self::Loop {
            repetitions: repetitions.into(),
            body,
        }
    }

    /// Creates a sub-circuit conditioned on `register[bit]`.
    pub fn conditional(register: impl Into<String>, bit: usize, body: Vec<Operation>) -> Self {
        Self::Conditional {
            register: register.into(),
            bit,
            body,
        }
    }

    /// Creates a sub-circuit controlled by `control`.
    pub fn controlled_circuit(control: usize, body: Vec<Operation>) -> Self {
        Self::ControlledCircuit { control, body }
    }

    /// Creates an assignment of `value` to `register[bit]`.
    pub fn input_bit(register: impl Into<String>, bit: usize, value: bool) -> Self {
        Self::InputBit {
            register: register.into(),
            bit,
            value,
        }
    }

    /// Creates a bosonic operation on modes only.
    pub fn bosonic(name: impl Into<String>, modes: impl Into<Vec<usize>>) -> Self {
        Self::Bosonic {
            name: name.into(),
            modes: modes.into(),
            qubits: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Creates an operation the engine cannot draw natively.
    pub fn opaque(name: impl Into<String>, qubits: impl Into<Vec<usize>>) -> Self {
        Self::Opaque {
            name: name.into(),
            qubits: qubits.into(),
        }
    }

    /// Replaces the parameter list of gates, controlled gates, pragmas and
    /// bosonic operations. Other variants are returned unchanged.
    pub fn with_parameters(mut self, values: Vec<Parameter>) -> Self {
        match &mut self {
            Self::Gate { parameters, .. }
            | Self::Controlled { parameters, .. }
            | Self::Pragma { parameters, .. }
            | Self::Bosonic { parameters, .. } => *parameters = values,
            _ => {}
        }
        self
    }

    /// A short human readable name used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Self::Gate { name, .. }
            | Self::Controlled { name, .. }
            | Self::Pragma { name, .. }
            | Self::Bosonic { name, .. }
            | Self::Opaque { name, .. }
            | Self::InputSymbolic { name, .. } => name,
            Self::Measure { .. } => "Measure",
            Self::Barrier { .. } => "Barrier",
            Self::DefineRegister { .. } => "DefineRegister",
            Self::Loop { .. } => "Loop",
            Self::Conditional { .. } => "Conditional",
            Self::ControlledCircuit { .. } => "ControlledCircuit",
            Self::InputBit { .. } => "InputBit",
        }
    }

    /// Largest qubit index referenced by this operation, including loop bodies.
    fn max_qubit(&self) -> Option<usize> {
        match self {
            Self::Gate { qubits, .. }
            | Self::Barrier { qubits }
            | Self::Pragma { qubits, .. }
            | Self::Bosonic { qubits, .. }
            | Self::Opaque { qubits, .. } => qubits.iter().copied().max(),
            Self::Controlled {
                controls, targets, ..
            } => controls.iter().chain(targets).copied().max(),
            Self::Measure { qubit, .. } => Some(*qubit),
            Self::DefineRegister { .. } | Self::InputBit { .. } | Self::InputSymbolic { .. } => {
                None
            }
            Self::Loop { body, .. } | Self::Conditional { body, .. } => {
                body.iter().filter_map(Operation::max_qubit).max()
            }
            Self::ControlledCircuit { control, body } => body
                .iter()
                .filter_map(Operation::max_qubit)
                .chain([*control])
                .max(),
        }
    }

    /// Largest bosonic mode index referenced by this operation.
    fn max_mode(&self) -> Option<usize> {
        match self {
            Self::Bosonic { modes, .. } => modes.iter().copied().max(),
            Self::Loop { body, .. }
            | Self::Conditional { body, .. }
            | Self::ControlledCircuit { body, .. } => {
                body.iter().filter_map(Operation::max_mode).max()
            }
            _ => None,
        }
    }
}

/// An ordered sequence of operations with declared line counts.
///
/// # Examples
///
/// ```
/// # use qollage_core::circuit::{Circuit, Operation};
/// let mut circuit = Circuit::new(2);
/// circuit.add_operation(Operation::gate("Hadamard", [0]));
/// circuit.add_operation(Operation::cnot(0, 1));
/// assert_eq!(circuit.len(), 2);
///
/// // Sizes can also be inferred from the referenced indices.
/// let inferred = Circuit::from_operations(vec![Operation::cnot(0, 3)]);
/// assert_eq!(inferred.number_of_qubits(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    qubits: usize,
    modes: usize,
    operations: Vec<Operation>,
}

impl Circuit {
    /// Creates an empty circuit with `qubits` declared qubits and no modes.
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            modes: 0,
            operations: Vec::new(),
        }
    }

    /// Creates a circuit whose qubit and mode counts are the smallest that
    /// cover every index referenced by `operations`.
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        let qubits = operations
            .iter()
            .filter_map(Operation::max_qubit)
            .max()
            .map_or(0, |max| max + 1);
        let modes = operations
            .iter()
            .filter_map(Operation::max_mode)
            .max()
            .map_or(0, |max| max + 1);
        Self {
            qubits,
            modes,
            operations,
        }
    }

    /// Sets the declared number of bosonic modes (builder style).
    pub fn with_modes(mut self, modes: usize) -> Self {
        self.modes = modes;
        self
    }

    /// Sets the declared number of qubits (builder style).
    pub fn with_qubits(mut self, qubits: usize) -> Self {
        self.qubits = qubits;
        self
    }

    /// Appends an operation.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn number_of_qubits(&self) -> usize {
        self.qubits
    }

    pub fn number_of_modes(&self) -> usize {
        self.modes
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl FromIterator<Operation> for Circuit {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from_operations(iter.into_iter().collect())
    }
}
