//! Integration tests for the DiagramBuilder API

use std::fs;

use qollage::{
    DiagramBuilder, DrawOptions, QollageError,
    circuit::{Circuit, Operation},
    config::{AppConfig, Dialect},
    draw_circuit,
    structure::{OperationClass, Position},
    timeline::Allocation,
};

fn markup_only() -> DrawOptions {
    DrawOptions::new().with_render_as_image(false)
}

#[test]
fn test_single_hadamard() {
    let circuit: Circuit = [Operation::gate("Hadamard", [0])].into_iter().collect();

    let builder = DiagramBuilder::default();
    let structure = builder.classify(&circuit).expect("Failed to classify");
    assert_eq!(structure.lines().len(), 1);

    let diagram = builder.layout(&structure).expect("Failed to lay out");
    assert_eq!(diagram.columns().len(), 1);
    assert_eq!(diagram.nodes().len(), 1);

    let node = &diagram.nodes()[0];
    assert_eq!(node.class(), OperationClass::SingleQubit);
    assert_eq!(node.label(), Some("H"));
    assert_eq!(node.column(), 0);
}

#[test]
fn test_controlled_x_spans_both_lines() {
    let mut circuit = Circuit::new(2);
    circuit.add_operation(Operation::cnot(0, 1));

    let builder = DiagramBuilder::default();
    let structure = builder.classify(&circuit).unwrap();
    let allocation = Allocation::allocate(&structure);
    assert_eq!(allocation.timeline().next_free(0), 1);
    assert_eq!(allocation.timeline().next_free(1), 1);

    let diagram = builder.layout(&structure).unwrap();
    let node = &diagram.nodes()[0];
    assert_eq!(node.column(), 0);
    assert_eq!((node.span().first(), node.span().last()), (0, 1));
    assert!(node.connector().is_some());
}

#[test]
fn test_parallel_hadamards_share_a_column() {
    let mut circuit = Circuit::new(2);
    circuit.add_operation(Operation::gate("Hadamard", [0]));
    circuit.add_operation(Operation::gate("Hadamard", [1]));

    let builder = DiagramBuilder::default();
    let diagram = builder.layout(&builder.classify(&circuit).unwrap()).unwrap();
    assert_eq!(diagram.columns().len(), 1);
    assert!(diagram.nodes().iter().all(|node| node.column() == 0));
}

#[test]
fn test_out_of_range_qubit_is_rejected() {
    let mut circuit = Circuit::new(2);
    circuit.add_operation(Operation::gate("Hadamard", [5]));

    let err = draw_circuit(&circuit, &markup_only()).unwrap_err();
    match err {
        QollageError::InvalidRegisterReference {
            position,
            reference,
            bound,
        } => {
            assert_eq!(position, Position::root(0));
            assert_eq!(reference, "q[5]");
            assert_eq!(bound, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_opaque_needs_best_effort() {
    let mut circuit = Circuit::new(1);
    circuit.add_operation(Operation::opaque("PragmaGetStateVector", [0]));

    let err = draw_circuit(&circuit, &markup_only()).unwrap_err();
    assert!(matches!(err, QollageError::UnsupportedOperation { .. }));

    let mut config = AppConfig::default();
    config.render_mut().set_best_effort(true);
    let rendering = DiagramBuilder::new(config)
        .draw(&circuit, &markup_only())
        .expect("Best effort should render a placeholder");
    assert_eq!(
        rendering.diagram().nodes()[0].class(),
        OperationClass::Placeholder
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let mut circuit = Circuit::new(3);
    circuit.add_operation(Operation::define_bits("ro", 3));
    circuit.add_operation(Operation::gate("Hadamard", [0]));
    circuit.add_operation(Operation::cnot(0, 2));
    circuit.add_operation(Operation::rotation("RotateZ", 1, std::f64::consts::FRAC_PI_2));
    circuit.add_operation(Operation::repeat(
        2.0,
        vec![Operation::gate("PauliX", [1]), Operation::barrier(Vec::new())],
    ));
    circuit.add_operation(Operation::measure(2, "ro", 2));

    for dialect in [Dialect::Typst, Dialect::Svg] {
        let mut config = AppConfig::default();
        config.render_mut().set_dialect(dialect);
        let builder = DiagramBuilder::new(config);

        let first = builder.draw(&circuit, &markup_only()).unwrap();
        let second = builder.draw(&circuit, &markup_only()).unwrap();
        assert_eq!(first.markup(), second.markup(), "{dialect} markup differs");
    }
}

#[test]
fn test_markup_written_to_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bell.typ");

    let mut circuit = Circuit::new(2);
    circuit.add_operation(Operation::gate("Hadamard", [0]));
    circuit.add_operation(Operation::cnot(0, 1));

    let rendering = draw_circuit(&circuit, &markup_only().with_output_path(&path)).unwrap();
    assert_eq!(rendering.written_to(), Some(path.as_path()));
    assert_eq!(fs::read_to_string(&path).unwrap(), rendering.markup());
}

#[test]
fn test_output_directory_and_missing_extension() {
    let dir = tempfile::tempdir().unwrap();
    let circuit: Circuit = [Operation::gate("Hadamard", [0])].into_iter().collect();

    let rendering = draw_circuit(&circuit, &markup_only().with_output_path(dir.path())).unwrap();
    let expected = dir.path().join("circuit.typ");
    assert_eq!(rendering.written_to(), Some(expected.as_path()));
    assert_eq!(fs::read_to_string(&expected).unwrap(), rendering.markup());

    let mut config = AppConfig::default();
    config.render_mut().set_dialect(Dialect::Svg);
    let builder = DiagramBuilder::new(config);
    let rendering = builder
        .draw(&circuit, &markup_only().with_output_path(dir.path().join("hadamard")))
        .unwrap();
    let expected = dir.path().join("hadamard.svg");
    assert_eq!(rendering.written_to(), Some(expected.as_path()));
    assert!(expected.exists());
    assert!(!dir.path().join("hadamard").exists());
}

#[test]
fn test_conditional_and_controlled_circuit() {
    let circuit = Circuit::from_operations(vec![
        Operation::define_bits("ro", 1),
        Operation::gate("Hadamard", [0]),
        Operation::measure(0, "ro", 0),
        Operation::input_bit("ro", 0, false),
        Operation::conditional("ro", 0, vec![Operation::gate("PauliX", [1])]),
        Operation::controlled_circuit(0, vec![Operation::gate("PauliZ", [1])]),
    ]);

    let builder = DiagramBuilder::default();
    let structure = builder.classify(&circuit).unwrap();
    assert!(
        structure
            .descriptors()
            .any(|descriptor| descriptor.class() == OperationClass::ClassicalInput)
    );

    let diagram = builder.layout(&structure).unwrap();
    let labels: Vec<_> = diagram.groups().iter().map(|frame| frame.label()).collect();
    assert_eq!(labels, ["if ro[0]", "Controlled"]);
    assert!(diagram.groups().iter().all(|frame| frame.connector().is_some()));

    let rendering = builder.draw(&circuit, &markup_only()).unwrap();
    assert!(rendering.markup().contains("if ro[0]"));
    assert!(rendering.markup().contains("[0] = 0"));
}

#[test]
fn test_unwritable_output_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, "plain file").unwrap();
    let path = blocker.join("circuit.typ");

    let circuit: Circuit = [Operation::gate("Hadamard", [0])].into_iter().collect();
    let err = draw_circuit(&circuit, &markup_only().with_output_path(&path)).unwrap_err();

    assert!(matches!(err, QollageError::IoFailure { .. }));
    assert!(!path.exists());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "plain file");
}

#[test]
fn test_builder_reusability() {
    let builder = DiagramBuilder::default();

    let first: Circuit = [Operation::gate("Hadamard", [0])].into_iter().collect();
    let second: Circuit = [Operation::gate("PauliZ", [0])].into_iter().collect();

    let first = builder.draw(&first, &markup_only()).unwrap();
    let second = builder.draw(&second, &markup_only()).unwrap();
    assert_ne!(first.markup(), second.markup());
}
