//! Time column allocation.
//!
//! The allocator keeps, for every line, the first column that is still free
//! (`next_free`). Each operation is placed in the smallest column that is
//! free on all lines of its span, and then claims that column on every
//! spanned line:
//!
//! ```text
//! c = max(next_free[line] for line in span)
//! next_free[line] = c + 1   for line in span
//! ```
//!
//! Operations are visited in circuit order in a single forward pass, so
//! ties are decided by the original order and operations on disjoint lines
//! pack into the same column.
//!
//! Group markers do not occupy a column. They synchronize their span so a
//! loop body starts and ends on a common column boundary.

use log::debug;

use crate::structure::{CircuitStructure, Element, Span};

/// Per-line column bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    next_free: Vec<usize>,
}

impl Timeline {
    pub fn new(line_count: usize) -> Self {
        Self {
            next_free: vec![0; line_count],
        }
    }

    /// Places an operation spanning `span` and returns its column.
    ///
    /// # Panics
    ///
    /// Panics if the span reaches past the last line.
    pub fn place(&mut self, span: Span) -> usize {
        let column = self.boundary(span);
        self.next_free[span.lines()].fill(column + 1);
        column
    }

    /// Advances every line of `span` to their common maximum and returns it.
    pub fn synchronize(&mut self, span: Span) -> usize {
        let boundary = self.boundary(span);
        self.next_free[span.lines()].fill(boundary);
        boundary
    }

    /// First free column on `line`.
    pub fn next_free(&self, line: usize) -> usize {
        self.next_free[line]
    }

    /// Number of columns used so far.
    pub fn column_count(&self) -> usize {
        self.next_free.iter().copied().max().unwrap_or(0)
    }

    fn boundary(&self, span: Span) -> usize {
        self.next_free[span.lines()]
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// Where an element landed on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The column an operation occupies.
    Column(usize),
    /// The column boundary a group marker synchronized its span to.
    Boundary(usize),
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Self::Column(index) | Self::Boundary(index) => index,
        }
    }
}

/// Result of allocating a whole circuit structure.
#[derive(Debug, Clone)]
pub struct Allocation {
    slots: Vec<Slot>,
    timeline: Timeline,
}

impl Allocation {
    /// Allocates every element of `structure`, in order.
    pub fn allocate(structure: &CircuitStructure) -> Self {
        let mut timeline = Timeline::new(structure.lines().len());
        let slots = structure
            .elements()
            .iter()
            .map(|element| match element {
                Element::Operation(descriptor) => Slot::Column(timeline.place(descriptor.span())),
                Element::GroupStart(group) | Element::GroupEnd(group) => {
                    Slot::Boundary(timeline.synchronize(group.span()))
                }
            })
            .collect();

        debug!(columns = timeline.column_count(); "Columns allocated");
        Self { slots, timeline }
    }

    /// One slot per element of the allocated structure, in the same order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn column_count(&self) -> usize {
        self.timeline.column_count()
    }

    /// The final per-line state.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use qollage_core::circuit::{Circuit, Operation};

    use super::*;
    use crate::config::RenderConfig;

    fn allocate(circuit: &Circuit) -> (CircuitStructure, Allocation) {
        let structure = CircuitStructure::from_circuit(circuit, &RenderConfig::default()).unwrap();
        let allocation = Allocation::allocate(&structure);
        (structure, allocation)
    }

    #[test]
    fn test_place_claims_column_on_every_spanned_line() {
        let mut timeline = Timeline::new(3);
        assert_eq!(timeline.place(Span::single(0)), 0);
        assert_eq!(timeline.place(Span::new(0, 2)), 1);
        assert_eq!(timeline.next_free(1), 2);
        assert_eq!(timeline.place(Span::single(1)), 2);
        assert_eq!(timeline.column_count(), 3);
    }

    #[test]
    fn test_synchronize_does_not_take_a_column() {
        let mut timeline = Timeline::new(2);
        timeline.place(Span::single(0));
        timeline.place(Span::single(0));
        assert_eq!(timeline.synchronize(Span::new(0, 1)), 2);
        assert_eq!(timeline.next_free(1), 2);
        assert_eq!(timeline.column_count(), 2);
    }

    #[test]
    fn test_independent_gates_share_a_column() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        circuit.add_operation(Operation::gate("Hadamard", [1]));
        let (_, allocation) = allocate(&circuit);
        assert_eq!(allocation.slots(), [Slot::Column(0), Slot::Column(0)]);
        assert_eq!(allocation.column_count(), 1);
    }

    #[test]
    fn test_controlled_x_advances_both_lines() {
        let mut circuit = Circuit::new(2);
        circuit.add_operation(Operation::cnot(0, 1));
        let (_, allocation) = allocate(&circuit);
        assert_eq!(allocation.slots(), [Slot::Column(0)]);
        assert_eq!(allocation.timeline().next_free(0), 1);
        assert_eq!(allocation.timeline().next_free(1), 1);
    }

    #[test]
    fn test_barrier_synchronizes_lines() {
        let mut circuit = Circuit::new(3);
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        circuit.add_operation(Operation::gate("Hadamard", [0]));
        circuit.add_operation(Operation::gate("Hadamard", [1]));
        circuit.add_operation(Operation::barrier(Vec::new()));
        circuit.add_operation(Operation::gate("PauliX", [2]));
        let (_, allocation) = allocate(&circuit);

        assert_eq!(allocation.slots()[3], Slot::Column(2));
        assert_eq!(allocation.slots()[4], Slot::Column(3));
    }

    #[test]
    fn test_loop_body_starts_on_common_boundary() {
        let circuit = Circuit::from_operations(vec![
            Operation::gate("Hadamard", [0]),
            Operation::gate("Hadamard", [0]),
            Operation::repeat(
                3.0,
                vec![
                    Operation::gate("PauliX", [1]),
                    Operation::gate("PauliZ", [0]),
                ],
            ),
            Operation::gate("PauliY", [1]),
        ]);
        let (_, allocation) = allocate(&circuit);
        assert_eq!(
            allocation.slots(),
            [
                Slot::Column(0),
                Slot::Column(1),
                Slot::Boundary(2),
                Slot::Column(2),
                Slot::Column(2),
                Slot::Boundary(3),
                Slot::Column(3),
            ]
        );
        assert_eq!(allocation.column_count(), 4);
    }

    #[test]
    fn test_empty_structure() {
        let (_, allocation) = allocate(&Circuit::new(0));
        assert_eq!(allocation.column_count(), 0);
        assert!(allocation.slots().is_empty());
    }

    fn arbitrary_operation(qubits: usize) -> impl Strategy<Value = Operation> {
        prop_oneof![
            (0..qubits).prop_map(|q| Operation::gate("Hadamard", [q])),
            (0..qubits, 0..qubits)
                .prop_filter("distinct qubits", |(a, b)| a != b)
                .prop_map(|(a, b)| Operation::cnot(a, b)),
            proptest::collection::vec(0..qubits, 1..=qubits)
                .prop_map(|qubits| Operation::barrier(qubits)),
        ]
    }

    proptest! {
        #[test]
        fn prop_no_two_operations_share_line_and_column(
            operations in proptest::collection::vec(arbitrary_operation(5), 0..40)
        ) {
            let circuit = Circuit::from_operations(operations).with_qubits(5);
            let (structure, allocation) = allocate(&circuit);

            let mut occupied = HashSet::new();
            for (descriptor, slot) in structure.descriptors().zip(allocation.slots()) {
                for line in descriptor.span().lines() {
                    prop_assert!(occupied.insert((line, slot.index())));
                }
            }
        }

        #[test]
        fn prop_independent_lines_use_their_longest_line(
            lines in proptest::collection::vec(0usize..5, 0..40),
        ) {
            let mut circuit = Circuit::new(5);
            let mut per_line = [0usize; 5];
            for line in lines {
                circuit.add_operation(Operation::gate("PauliX", [line]));
                per_line[line] += 1;
            }
            let (_, allocation) = allocate(&circuit);
            prop_assert_eq!(
                allocation.column_count(),
                per_line.iter().copied().max().unwrap_or(0)
            );
        }

        #[test]
        fn prop_barrier_aligns_and_advances(
            operations in proptest::collection::vec(arbitrary_operation(4), 0..20),
            barrier in proptest::collection::vec(0usize..4, 1..=4),
        ) {
            let circuit = Circuit::from_operations(operations).with_qubits(4);
            let structure = CircuitStructure::from_circuit(&circuit, &RenderConfig::default()).unwrap();
            let mut timeline = Timeline::new(4);
            for descriptor in structure.descriptors() {
                timeline.place(descriptor.span());
            }

            let span = Span::covering(&barrier).unwrap();
            let before: Vec<usize> = span.lines().map(|line| timeline.next_free(line)).collect();
            timeline.place(span);
            let after: Vec<usize> = span.lines().map(|line| timeline.next_free(line)).collect();

            prop_assert!(after.windows(2).all(|pair| pair[0] == pair[1]));
            prop_assert!(after.iter().zip(&before).all(|(a, b)| a > b));
        }
    }
}
