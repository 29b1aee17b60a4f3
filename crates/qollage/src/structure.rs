//! Operation classification.
//!
//! This module turns a [`Circuit`] into a flat list of [`Element`]s, each one
//! describing how a single operation is drawn: its [`OperationClass`], its
//! [`Shape`], the [`Span`] of lines it touches and its label. It is the first
//! stage of the pipeline:
//!
//! ```text
//! Circuit
//!     ↓ structure (this module)
//! CircuitStructure (lines + elements)
//!     ↓ timeline
//! Allocation (one column per element)
//!     ↓ layout
//! Diagram
//!     ↓ export
//! Markup
//! ```
//!
//! Lines are created once, up front: one per qubit, then one per bosonic
//! mode, then one per classical register in definition order.
//!
//! Loops, conditionals and controlled sub-circuits are flattened into a
//! [`Element::GroupStart`] marker, their classified body and a
//! [`Element::GroupEnd`] marker. Register definitions, symbol inputs and
//! pragmas that are filtered out produce no element at all.

mod label;

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use qollage_core::circuit::{Circuit, Operation, Parameter, RegisterKind};

use crate::{
    config::{InitializationMode, RenderConfig},
    error::QollageError,
};

pub use label::{format_angle, format_number, gate_label, short_name};

// =============================================================================
// Positions and spans
// =============================================================================

/// Index path of an operation inside the circuit.
///
/// Top-level operations have a single index. Operations inside loop bodies
/// append their index within the body, so the second operation of the loop
/// at index 3 is `#3.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(Vec<usize>);

impl Position {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Returns the position of the `index`-th operation nested below this one.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// A contiguous, inclusive range of line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    first: usize,
    last: usize,
}

impl Span {
    /// Creates a span between two lines, in either order.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            first: a.min(b),
            last: a.max(b),
        }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Smallest span covering every given line, or `None` if there are none.
    pub fn covering(lines: &[usize]) -> Option<Self> {
        let first = lines.iter().copied().min()?;
        let last = lines.iter().copied().max()?;
        Some(Self { first, last })
    }

    pub fn first(self) -> usize {
        self.first
    }

    pub fn last(self) -> usize {
        self.last
    }

    pub fn len(self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(self, line: usize) -> bool {
        (self.first..=self.last).contains(&line)
    }

    pub fn lines(self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }

    pub fn merge(self, other: Span) -> Self {
        Self {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }
}

// =============================================================================
// Lines
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Quantum,
    Bosonic,
    Classical,
}

/// One horizontal track of the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    index: usize,
    kind: LineKind,
    label: String,
}

impl Line {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone)]
struct Register {
    line: usize,
    length: usize,
}

// =============================================================================
// Descriptors
// =============================================================================

/// Broad category of an operation, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    SingleQubit,
    MultiQubit,
    Controlled,
    Measurement,
    Barrier,
    Pragma,
    Bosonic,
    /// Assignment of a classical bit.
    ClassicalInput,
    /// An unknown operation drawn in best-effort mode.
    Placeholder,
}

impl OperationClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::SingleQubit => "single_qubit",
            Self::MultiQubit => "multi_qubit",
            Self::Controlled => "controlled",
            Self::Measurement => "measurement",
            Self::Barrier => "barrier",
            Self::Pragma => "pragma",
            Self::Bosonic => "bosonic",
            Self::ClassicalInput => "classical_input",
            Self::Placeholder => "placeholder",
        }
    }
}

/// Glyph drawn on the target lines of a controlled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetGlyph {
    /// `⊕`, for X-like targets
    Oplus,
    /// A filled dot, for Z-like targets
    Dot,
    /// Swap crosses
    Cross,
    /// A labelled box
    Box,
}

/// Drawing shape of a classified operation. Line indices are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Labelled box on a single line.
    Box { line: usize },
    /// Labelled box stretched over the span; `lines` are the lines actually acted on.
    Block { lines: Vec<usize> },
    Controlled {
        controls: Vec<usize>,
        targets: Vec<usize>,
        target: TargetGlyph,
    },
    Swap { lines: [usize; 2] },
    Measurement {
        qubit: usize,
        register: usize,
        bit: usize,
    },
    Barrier { lines: Vec<usize> },
}

/// Drawing descriptor of one operation instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    position: Position,
    class: OperationClass,
    shape: Shape,
    span: Span,
    label: Option<String>,
    connector: bool,
}

impl Descriptor {
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// All lines the operation occupies, including pass-through lines.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether a vertical connector joins the topmost and bottommost line.
    pub fn needs_connector(&self) -> bool {
        self.connector
    }
}

/// Line a group frame is attached to from outside its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAnchor {
    /// Classical condition bit, joined by a double connector.
    Condition { line: usize, bit: usize },
    /// Control qubit, joined by a single connector.
    Control { line: usize },
}

impl GroupAnchor {
    pub fn line(self) -> usize {
        match self {
            Self::Condition { line, .. } | Self::Control { line } => line,
        }
    }
}

/// A group frame marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    position: Position,
    label: String,
    span: Span,
    body: Span,
    anchor: Option<GroupAnchor>,
}

impl Group {
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines synchronized by the group: the body plus the anchor line.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Lines enclosed by the frame.
    pub fn body(&self) -> Span {
        self.body
    }

    pub fn anchor(&self) -> Option<GroupAnchor> {
        self.anchor
    }
}

/// One entry of the flattened circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Operation(Descriptor),
    GroupStart(Group),
    GroupEnd(Group),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Self::Operation(descriptor) => descriptor.span,
            Self::GroupStart(group) | Self::GroupEnd(group) => group.span,
        }
    }
}

/// Lines plus the flattened, classified operations of a circuit.
#[derive(Debug, Clone)]
pub struct CircuitStructure {
    lines: Vec<Line>,
    elements: Vec<Element>,
}

impl CircuitStructure {
    /// Classifies every operation of `circuit`.
    ///
    /// # Errors
    ///
    /// - [`QollageError::UnsupportedOperation`] for opaque operations (unless
    ///   best-effort rendering is enabled) and for operations with no lines
    /// - [`QollageError::InvalidRegisterReference`] for any qubit, mode,
    ///   register or bit outside the declared bounds
    pub fn from_circuit(circuit: &Circuit, config: &RenderConfig) -> Result<Self, QollageError> {
        let classifier = Classifier::new(circuit, config);
        let mut elements = Vec::new();
        classifier.flatten(circuit.operations(), None, &mut elements)?;
        debug!(
            lines = classifier.lines.len(),
            elements = elements.len();
            "Circuit classified"
        );
        Ok(Self {
            lines: classifier.lines,
            elements,
        })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Iterates over the operation descriptors, skipping group markers.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.elements.iter().filter_map(|element| match element {
            Element::Operation(descriptor) => Some(descriptor),
            _ => None,
        })
    }
}

// =============================================================================
// Classifier
// =============================================================================

struct Classifier<'a> {
    qubits: usize,
    modes: usize,
    registers: IndexMap<String, Register>,
    lines: Vec<Line>,
    config: &'a RenderConfig,
}

impl<'a> Classifier<'a> {
    fn new(circuit: &Circuit, config: &'a RenderConfig) -> Self {
        let qubits = circuit.number_of_qubits();
        let modes = circuit.number_of_modes();

        let mut lines = Vec::with_capacity(qubits + modes);
        for qubit in 0..qubits {
            let label = match config.initialization() {
                InitializationMode::State => "|0⟩".to_string(),
                InitializationMode::Qubit => format!("q[{qubit}]"),
            };
            lines.push(Line {
                index: lines.len(),
                kind: LineKind::Quantum,
                label,
            });
        }
        for mode in 0..modes {
            lines.push(Line {
                index: lines.len(),
                kind: LineKind::Bosonic,
                label: format!("m[{mode}]"),
            });
        }

        let mut registers: IndexMap<String, Register> = IndexMap::new();
        collect_registers(circuit.operations(), &mut |name, length, kind| {
            if let Some(register) = registers.get_mut(name) {
                register.length = register.length.max(length);
                return;
            }
            trace!(name, length, kind:?; "Register defined");
            let line = lines.len();
            lines.push(Line {
                index: line,
                kind: LineKind::Classical,
                label: name.to_string(),
            });
            registers.insert(name.to_string(), Register { line, length });
        });

        Self {
            qubits,
            modes,
            registers,
            lines,
            config,
        }
    }

    fn flatten(
        &self,
        operations: &[Operation],
        parent: Option<&Position>,
        out: &mut Vec<Element>,
    ) -> Result<(), QollageError> {
        for (index, operation) in operations.iter().enumerate() {
            let position = match parent {
                Some(parent) => parent.child(index),
                None => Position::root(index),
            };

            match operation {
                Operation::Loop { repetitions, body } => {
                    let label = format!("Loop ×{}", self.repetitions(repetitions));
                    self.flatten_group(body, position, label, None, out)?;
                    continue;
                }
                Operation::Conditional {
                    register,
                    bit,
                    body,
                } => {
                    let line = self.register_bit(register, *bit, &position)?;
                    let anchor = GroupAnchor::Condition { line, bit: *bit };
                    let label = format!("if {register}[{bit}]");
                    self.flatten_group(body, position, label, Some(anchor), out)?;
                    continue;
                }
                Operation::ControlledCircuit { control, body } => {
                    let line = self.qubit_line(*control, &position)?;
                    let anchor = GroupAnchor::Control { line };
                    let label = "Controlled".to_string();
                    self.flatten_group(body, position, label, Some(anchor), out)?;
                    continue;
                }
                _ => {}
            }

            if let Some(descriptor) = self.classify(operation, position)? {
                trace!(
                    position:% = descriptor.position,
                    class = descriptor.class.name();
                    "Operation classified"
                );
                out.push(Element::Operation(descriptor));
            }
        }
        Ok(())
    }

    fn repetitions(&self, repetitions: &Parameter) -> String {
        match repetitions {
            Parameter::Float(value) => format_number(*value, self.config.float_precision()),
            Parameter::Symbol(_) => label::format_parameter(repetitions, self.config.float_precision()),
        }
    }

    fn flatten_group(
        &self,
        body: &[Operation],
        position: Position,
        label: String,
        anchor: Option<GroupAnchor>,
        out: &mut Vec<Element>,
    ) -> Result<(), QollageError> {
        let mut inner = Vec::new();
        self.flatten(body, Some(&position), &mut inner)?;

        let Some(body_span) = inner
            .iter()
            .map(Element::span)
            .reduce(|acc, span| acc.merge(span))
        else {
            return Ok(());
        };

        let span = match anchor {
            Some(GroupAnchor::Control { line }) if body_span.contains(line) => {
                return Err(unsupported(&position, "ControlledCircuit"));
            }
            Some(anchor) => body_span.merge(Span::single(anchor.line())),
            None => body_span,
        };
        let group = Group {
            position,
            label,
            span,
            body: body_span,
            anchor,
        };
        out.push(Element::GroupStart(group.clone()));
        out.extend(inner);
        out.push(Element::GroupEnd(group));
        Ok(())
    }

    fn classify(
        &self,
        operation: &Operation,
        position: Position,
    ) -> Result<Option<Descriptor>, QollageError> {
        let precision = self.config.float_precision();
        let descriptor = match operation {
            Operation::Gate {
                name,
                qubits,
                parameters,
            } => {
                let lines = self.qubit_lines(qubits, &position, name)?;
                if name == "SWAP" && lines.len() == 2 {
                    Descriptor {
                        span: Span::new(lines[0], lines[1]),
                        shape: Shape::Swap {
                            lines: [lines[0], lines[1]],
                        },
                        class: OperationClass::MultiQubit,
                        label: None,
                        connector: true,
                        position,
                    }
                } else {
                    let class = if lines.len() == 1 {
                        OperationClass::SingleQubit
                    } else {
                        OperationClass::MultiQubit
                    };
                    boxed(position, class, lines, gate_label(name, parameters, precision))
                }
            }
            Operation::Controlled {
                name,
                controls,
                targets,
                parameters,
            } => {
                let control_lines = self.qubit_lines(controls, &position, name)?;
                let target_lines = self.qubit_lines(targets, &position, name)?;
                if control_lines.iter().any(|line| target_lines.contains(line)) {
                    return Err(unsupported(&position, name));
                }
                let target = target_glyph(name, parameters, target_lines.len());
                let label = (target == TargetGlyph::Box)
                    .then(|| gate_label(name, parameters, precision));
                let all: Vec<usize> = control_lines.iter().chain(&target_lines).copied().collect();
                Descriptor {
                    span: span_of(&all),
                    shape: Shape::Controlled {
                        controls: control_lines,
                        targets: target_lines,
                        target,
                    },
                    class: OperationClass::Controlled,
                    label,
                    connector: true,
                    position,
                }
            }
            Operation::Measure {
                qubit,
                register,
                bit,
            } => {
                let qubit_line = self.qubit_line(*qubit, &position)?;
                let register_line = self.register_bit(register, *bit, &position)?;
                Descriptor {
                    span: Span::new(qubit_line, register_line),
                    shape: Shape::Measurement {
                        qubit: qubit_line,
                        register: register_line,
                        bit: *bit,
                    },
                    class: OperationClass::Measurement,
                    label: None,
                    connector: true,
                    position,
                }
            }
            Operation::Barrier { qubits } => {
                let lines = if qubits.is_empty() {
                    (0..self.qubits).collect()
                } else {
                    self.qubit_lines(qubits, &position, "Barrier")?
                };
                if lines.is_empty() {
                    return Ok(None);
                }
                Descriptor {
                    span: span_of(&lines),
                    shape: Shape::Barrier { lines },
                    class: OperationClass::Barrier,
                    label: None,
                    connector: false,
                    position,
                }
            }
            Operation::DefineRegister { .. } => return Ok(None),
            Operation::InputSymbolic { name, .. } => {
                trace!(name; "Symbol input has no glyph");
                return Ok(None);
            }
            Operation::InputBit {
                register,
                bit,
                value,
            } => {
                let line = self.register_bit(register, *bit, &position)?;
                let label = format!("[{bit}] = {}", u8::from(*value));
                boxed(position, OperationClass::ClassicalInput, vec![line], label)
            }
            Operation::Pragma {
                name,
                qubits,
                parameters,
            } => {
                if !self.config.pragmas().includes(name) {
                    trace!(name; "Pragma filtered out");
                    return Ok(None);
                }
                let lines = if qubits.is_empty() {
                    self.all_qubits(&position, name)?
                } else {
                    self.qubit_lines(qubits, &position, name)?
                };
                let label = gate_label(name, parameters, precision);
                boxed(position, OperationClass::Pragma, lines, label)
            }
            Operation::Bosonic {
                name,
                modes,
                qubits,
                parameters,
            } => {
                if modes.is_empty() && qubits.is_empty() {
                    return Err(unsupported(&position, name));
                }
                let mut lines = Vec::with_capacity(modes.len() + qubits.len());
                for qubit in qubits {
                    lines.push(self.qubit_line(*qubit, &position)?);
                }
                for mode in modes {
                    lines.push(self.mode_line(*mode, &position)?);
                }
                let lines = normalized(lines);
                boxed(
                    position,
                    OperationClass::Bosonic,
                    lines,
                    gate_label(name, parameters, precision),
                )
            }
            Operation::Opaque { name, qubits } => {
                if !self.config.best_effort() {
                    return Err(unsupported(&position, name));
                }
                let lines = if qubits.is_empty() {
                    self.all_qubits(&position, name)?
                } else {
                    self.qubit_lines(qubits, &position, name)?
                };
                debug!(position:%, name; "Rendering unsupported operation as placeholder");
                boxed(position, OperationClass::Placeholder, lines, name.clone())
            }
            // Flattened by the caller.
            Operation::Loop { .. }
            | Operation::Conditional { .. }
            | Operation::ControlledCircuit { .. } => return Ok(None),
        };
        Ok(Some(descriptor))
    }

    fn qubit_line(&self, qubit: usize, position: &Position) -> Result<usize, QollageError> {
        if qubit < self.qubits {
            Ok(qubit)
        } else {
            Err(QollageError::InvalidRegisterReference {
                position: position.clone(),
                reference: format!("q[{qubit}]"),
                bound: self.qubits,
            })
        }
    }

    fn mode_line(&self, mode: usize, position: &Position) -> Result<usize, QollageError> {
        if mode < self.modes {
            Ok(self.qubits + mode)
        } else {
            Err(QollageError::InvalidRegisterReference {
                position: position.clone(),
                reference: format!("m[{mode}]"),
                bound: self.modes,
            })
        }
    }

    /// Resolves the qubits of a multi-line operation, sorted and deduplicated.
    fn qubit_lines(
        &self,
        qubits: &[usize],
        position: &Position,
        name: &str,
    ) -> Result<Vec<usize>, QollageError> {
        if qubits.is_empty() {
            return Err(unsupported(position, name));
        }
        let lines = qubits
            .iter()
            .map(|qubit| self.qubit_line(*qubit, position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(normalized(lines))
    }

    fn all_qubits(&self, position: &Position, name: &str) -> Result<Vec<usize>, QollageError> {
        if self.qubits == 0 {
            return Err(unsupported(position, name));
        }
        Ok((0..self.qubits).collect())
    }

    fn register_bit(
        &self,
        name: &str,
        bit: usize,
        position: &Position,
    ) -> Result<usize, QollageError> {
        let Some(register) = self.registers.get(name) else {
            return Err(QollageError::InvalidRegisterReference {
                position: position.clone(),
                reference: name.to_string(),
                bound: 0,
            });
        };
        if bit >= register.length {
            return Err(QollageError::InvalidRegisterReference {
                position: position.clone(),
                reference: format!("{name}[{bit}]"),
                bound: register.length,
            });
        }
        Ok(register.line)
    }
}

fn collect_registers(operations: &[Operation], define: &mut impl FnMut(&str, usize, RegisterKind)) {
    for operation in operations {
        match operation {
            Operation::DefineRegister {
                name,
                length,
                register_kind,
                ..
            } => define(name, *length, *register_kind),
            Operation::Loop { body, .. }
            | Operation::Conditional { body, .. }
            | Operation::ControlledCircuit { body, .. } => collect_registers(body, define),
            _ => {}
        }
    }
}

fn target_glyph(name: &str, parameters: &[Parameter], targets: usize) -> TargetGlyph {
    if !parameters.is_empty() {
        return TargetGlyph::Box;
    }
    match name {
        "PauliX" | "X" | "CNOT" | "NOT" => TargetGlyph::Oplus,
        "PauliZ" | "Z" => TargetGlyph::Dot,
        "SWAP" if targets == 2 => TargetGlyph::Cross,
        _ => TargetGlyph::Box,
    }
}

fn boxed(position: Position, class: OperationClass, lines: Vec<usize>, label: String) -> Descriptor {
    let span = span_of(&lines);
    let shape = if lines.len() == 1 {
        Shape::Box { line: lines[0] }
    } else {
        Shape::Block { lines }
    };
    Descriptor {
        position,
        class,
        shape,
        span,
        label: Some(label),
        connector: false,
    }
}

fn normalized(mut lines: Vec<usize>) -> Vec<usize> {
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Span of a non-empty line list.
fn span_of(lines: &[usize]) -> Span {
    Span::covering(lines).unwrap_or(Span::single(0))
}

fn unsupported(position: &Position, name: &str) -> QollageError {
    QollageError::UnsupportedOperation {
        position: position.clone(),
        name: name.to_string(),
    }
}
