//! Integration tests for the sequence memory.
//!
//! Tests cover:
//! - Learning a two-symbol alternating sequence
//! - Negative reinforcement of predictions that do not come true, including
//!   predictions made by cells that were learning at the same step
//! - Segment capacity under repeated bursting
//! - Learning switches

use htm_cla::{CellFlag, Layer, LayerParams, Moment, PerformanceStatistics};

const INPUTS: usize = 64;

fn params(seed: u64) -> LayerParams {
    let mut params = LayerParams::default();
    params.set_layer_parameters(64, INPUTS, INPUTS, 8, false, true);
    params.max_active_columns = 4;
    params.seed = seed;
    params
}

/// First half of the input space.
fn pattern_a() -> Vec<f32> {
    (0..INPUTS).map(|i| if i < INPUTS / 2 { 1.0 } else { 0.0 }).collect()
}

/// Second half of the input space.
fn pattern_b() -> Vec<f32> {
    (0..INPUTS).map(|i| if i >= INPUTS / 2 { 1.0 } else { 0.0 }).collect()
}

#[test]
fn test_complementary_patterns_use_disjoint_columns() {
    let mut layer = Layer::new(params(1)).unwrap();
    layer.execute(&pattern_a(), 1.0).unwrap();
    let cols_a = layer.active_columns();
    layer.execute(&pattern_b(), 1.0).unwrap();
    let cols_b = layer.active_columns();

    assert_eq!(cols_a.len(), 4);
    assert_eq!(cols_b.len(), 4);
    assert!(cols_a.iter().all(|c| !cols_b.contains(c)));
}

#[test]
fn test_alternating_sequence_predicts_next_symbol() {
    for seed in [0, 1, 2, 3] {
        let mut layer = Layer::new(params(seed)).unwrap();
        let (a, b) = (pattern_a(), pattern_b());

        layer.execute(&a, 1.0).unwrap();
        layer.execute(&b, 1.0).unwrap();
        let cols_b = layer.active_columns();
        layer.execute(&a, 1.0).unwrap();

        // presenting A again lights up cells in every column of B
        for &c in &cols_b {
            let column = layer.column(c).unwrap();
            assert!(column.predicting.now, "seed {}: column {} not predicting", seed, c);
            assert!(column
                .cells
                .iter()
                .any(|cell| cell.check(Moment::Now, CellFlag::Predicting)));
        }
    }
}

#[test]
fn test_alternating_sequence_converges() {
    for seed in [0, 1, 2, 3] {
        let mut layer = Layer::new(params(seed)).unwrap();
        let (a, b) = (pattern_a(), pattern_b());

        for step in 0..40 {
            let input = if step % 2 == 0 { &a } else { &b };
            layer.execute(input, 1.0).unwrap();

            if step >= 10 {
                let stats = PerformanceStatistics::collect(&layer);
                assert_eq!(
                    (stats.predicted_columns, stats.unpredicted_columns),
                    (4, 0),
                    "seed {} step {}",
                    seed,
                    step
                );
            }
        }
    }
}

#[test]
fn test_failed_prediction_is_punished() {
    let mut layer = Layer::new(params(5)).unwrap();
    let (a, b) = (pattern_a(), pattern_b());

    layer.execute(&a, 1.0).unwrap();
    layer.execute(&b, 1.0).unwrap();
    let cols_b = layer.active_columns();
    layer.execute(&a, 1.0).unwrap();

    // permanences of queued synapses on the segments that fired
    let mut queued = Vec::new();
    for h in layer.segment_handles().filter(|h| cols_b.contains(&h.column)) {
        let segment = layer.segment(h).unwrap();
        if !segment.active {
            continue;
        }
        for (s, syn) in segment.synapses.iter().enumerate() {
            if syn.update_queued {
                queued.push((h, s, syn.permanence));
            }
        }
    }
    assert!(!queued.is_empty());

    // A again instead of B: the predicting cells stay silent
    layer.execute(&a, 1.0).unwrap();

    for &c in &cols_b {
        assert!(layer.column(c).unwrap().mispredicted);
    }
    for (h, s, before) in queued {
        let segment = layer.segment(h).unwrap();
        let syn = &segment.synapses[s];
        assert!(
            syn.permanence < before,
            "synapse {} of {:?}: {} -> {}",
            s,
            h,
            before,
            syn.permanence
        );
        assert!(syn.mispredicted);
        assert!(segment.mispredicted);
    }
}

#[test]
fn test_segment_capacity_under_bursting() {
    let mut p = params(9);
    p.segments_per_cell = 2;
    p.cells_per_column = 2;
    let mut layer = Layer::new(p).unwrap();

    // a rotating window keeps most columns bursting
    for step in 0..60 {
        let input: Vec<f32> = (0..INPUTS)
            .map(|i| if (i + step * 7) % INPUTS < 12 { 1.0 } else { 0.0 })
            .collect();
        layer.execute(&input, 1.0).unwrap();

        for column in layer.columns() {
            for cell in &column.cells {
                assert!(cell.segment_count() <= 2);
            }
        }
    }

    let stats = PerformanceStatistics::collect(&layer);
    assert!(stats.total_segments <= 64 * 2 * 2);
    assert!(stats.most_segments <= 2);
}

#[test]
fn test_temporal_learning_off_grows_nothing() {
    let mut p = params(2);
    p.temporal_learning_enabled = false;
    let mut layer = Layer::new(p).unwrap();

    for step in 0..10 {
        let input = if step % 2 == 0 { pattern_a() } else { pattern_b() };
        layer.execute(&input, 1.0).unwrap();
    }

    assert_eq!(layer.segment_handles().count(), 0);
    let stats = PerformanceStatistics::collect(&layer);
    assert_eq!(stats.learning_cells, 0);
    // every active column bursts
    assert_eq!(stats.active_cells, 4 * 4);
}

#[test]
fn test_learning_cache_holds_previous_learners() {
    let mut layer = Layer::new(params(3)).unwrap();
    layer.execute(&pattern_a(), 1.0).unwrap();
    let learners: Vec<(usize, usize)> = layer
        .columns()
        .iter()
        .enumerate()
        .flat_map(|(c, column)| {
            column
                .cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.check(Moment::Now, CellFlag::Learning))
                .map(move |(i, _)| (c, i))
        })
        .collect();
    assert_eq!(learners.len(), 4);

    layer.execute(&pattern_b(), 1.0).unwrap();

    let cached: Vec<(usize, usize)> = layer
        .learning_cache()
        .iter()
        .map(|t| (t.column, t.cell))
        .collect();
    assert_eq!(cached, learners);
}

#[test]
fn test_learning_predictor_is_punished() {
    let (a, b) = (pattern_a(), pattern_b());
    let mut checked = 0;

    for seed in [0, 1, 2, 3] {
        let mut layer = Layer::new(params(seed)).unwrap();
        // a repeated symbol makes its own cells predict it again
        for _ in 0..20 {
            layer.execute(&a, 1.0).unwrap();
        }
        let cols_a = layer.active_columns();

        let mut queued = Vec::new();
        for h in layer.segment_handles().filter(|h| cols_a.contains(&h.column)) {
            let cell = layer.cell(h.column, h.cell).unwrap();
            let segment = layer.segment(h).unwrap();
            if !(cell.check(Moment::Now, CellFlag::Learning)
                && cell.check(Moment::Now, CellFlag::Predicting)
                && segment.active)
            {
                continue;
            }
            for (s, syn) in segment.synapses.iter().enumerate() {
                if syn.update_queued && syn.permanence > 0.0 {
                    queued.push((h, s, syn.permanence));
                }
            }
        }
        if queued.is_empty() {
            continue;
        }
        checked += 1;

        layer.execute(&b, 1.0).unwrap();

        for (h, s, before) in queued {
            let cell = layer.cell(h.column, h.cell).unwrap();
            assert!(!cell.check(Moment::Now, CellFlag::Active));
            assert!(cell.check(Moment::Previous, CellFlag::Predicting));
            let syn = &layer.segment(h).unwrap().synapses[s];
            assert!(
                syn.permanence < before,
                "seed {}: synapse {} of {:?} kept {}",
                seed,
                s,
                h,
                syn.permanence
            );
            assert!(syn.mispredicted);
        }
    }

    assert!(checked > 0, "no cell learned while predicting");
}
