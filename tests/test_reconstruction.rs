//! Integration tests for input reconstruction.

use approx::assert_relative_eq;
use htm_cla::{ClaError, Layer, LayerParams, SYNAPSE_CONNECTED_PERMANENCE};

const INPUTS: usize = 32;

fn layer(seed: u64) -> Layer {
    let mut params = LayerParams::default();
    params.set_layer_parameters(48, INPUTS, INPUTS, 4, true, true);
    params.max_active_columns = 4;
    params.seed = seed;
    Layer::new(params).unwrap()
}

fn pattern(offset: usize) -> Vec<f32> {
    (0..INPUTS)
        .map(|i| if (i + offset) % 4 == 0 { 1.0 } else { 0.0 })
        .collect()
}

#[test]
fn test_score_undefined_for_empty_input() {
    let mut layer = layer(1);
    layer.execute(&[0.0; INPUTS], 1.0).unwrap();
    assert_eq!(layer.compute_dynamic_reconstruction_score(), None);
}

#[test]
fn test_score_is_bounded() {
    let mut layer = layer(2);
    for step in 0..25 {
        layer.execute(&pattern(step % 4), 1.0).unwrap();
        let score = layer.compute_dynamic_reconstruction_score().unwrap();
        assert!((0.0..=1.0).contains(&score), "step {}: {}", step, score);
    }
}

#[test]
fn test_dynamic_reconstruction_from_active_columns() {
    let mut layer = layer(3);
    layer.set_spatial_learning(false);
    layer.execute(&pattern(0), 1.0).unwrap();

    let mut expected = vec![0.0f32; INPUTS];
    for &c in &layer.active_columns() {
        for syn in &layer.columns()[c].synapses {
            expected[syn.target.column] += syn.permanence - 0.5;
        }
    }

    let rec = layer.dynamic_reconstruction();
    assert_eq!(rec.len(), INPUTS);
    for (r, e) in rec.vector.iter().zip(&expected) {
        assert_relative_eq!(*r, *e, epsilon = 1e-5);
    }
}

#[test]
fn test_static_reconstruction_requires_compute() {
    let mut layer = layer(4);
    assert!(matches!(
        layer.static_reconstruction(0),
        Err(ClaError::NotInitialized(_))
    ));

    layer.compute_static_reconstruction();
    let rec = layer.static_reconstruction(5).unwrap();
    for (i, &v) in rec.vector.iter().enumerate() {
        // one proximal synapse per input position
        assert_relative_eq!(v, layer.get_permanence(5, i).unwrap());
    }
    for (i, &b) in rec.binary.iter().enumerate() {
        let p = layer.get_permanence(5, i).unwrap();
        if p >= SYNAPSE_CONNECTED_PERMANENCE {
            assert_relative_eq!(b, 2.0 * p - 0.5);
        } else {
            assert_eq!(b, 0.0);
        }
    }
    assert!(layer.static_reconstruction(48).is_err());
}

#[test]
fn test_prediction_reconstruction_follows_predicting_columns() {
    let mut layer = layer(5);
    let (a, b) = (pattern(0), pattern(2));
    layer.execute(&a, 1.0).unwrap();
    layer.execute(&b, 1.0).unwrap();
    layer.execute(&a, 1.0).unwrap();

    layer.compute_prediction_reconstruction();
    let predicting: Vec<usize> = (0..48)
        .filter(|&c| layer.columns()[c].predicting.now)
        .collect();

    let rec = layer.prediction_reconstruction();
    if predicting.is_empty() {
        assert!(rec.vector.iter().all(|&v| v == 0.0));
    } else {
        let total: f32 = rec.vector.iter().sum();
        let expected: f32 = predicting
            .iter()
            .flat_map(|&c| layer.columns()[c].synapses.iter().map(|s| s.permanence))
            .sum();
        assert_relative_eq!(total, expected, epsilon = 1e-3);
    }
}

#[test]
fn test_get_permanence_tracks_learning() {
    let mut layer = layer(6);
    let before = layer.get_permanence(0, 0).unwrap();
    for step in 0..5 {
        layer.execute(&pattern(step), 1.0).unwrap();
    }
    let after = layer.get_permanence(0, 0).unwrap();
    assert_ne!(before, after);
    assert!(matches!(
        layer.get_permanence(0, INPUTS),
        Err(ClaError::IndexOutOfBounds { .. })
    ));
}
