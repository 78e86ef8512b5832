//! End-to-end behaviour of the NequIP network: construction, layer chaining,
//! output shapes, rotation invariance and inversion parity of scalar outputs.

use graphite::graph::Graph;
use graphite::nn::{Error, Layer, NequIP, NequipConfig};

const CLUSTER: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.2, -0.3],
    [-0.4, 1.1, 0.5],
    [0.6, -0.8, 0.9],
    [-0.9, -0.3, -0.7],
];

fn config() -> NequipConfig {
    NequipConfig::from_toml_str(
        r#"
        irreps_in = "8x0e"
        irreps_hidden = "8x0e + 4x1e + 2x2e"
        irreps_out = "3x0e"
        num_convs = 3
        radial_neurons = [8, 16]
        num_species = 2
        max_radius = 3.15
        num_neighbors = 4.0
        seed = 7
        "#,
    )
    .unwrap()
}

fn rotation(axis: [f64; 3], angle: f64) -> [[f64; 3]; 3] {
    let n = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    let [x, y, z] = axis.map(|c| c / n);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    [
        [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
        [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
        [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
    ]
}

fn rotate(r: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    std::array::from_fn(|i| r[i][0] * v[0] + r[i][1] * v[1] + r[i][2] * v[2])
}

fn cluster_graph(positions: &[[f64; 3]]) -> Graph {
    Graph::from_positions(vec![0, 1, 1, 0, 1], positions, 3.1)
}

#[test]
fn construction_fails_without_gate_scalars() {
    let config = NequipConfig {
        irreps_in: "4x0e".parse().unwrap(),
        irreps_hidden: "8x0e + 4x1o".parse().unwrap(),
        irreps_node: "1x3e".parse().unwrap(),
        irreps_edge: "1x1o".parse().unwrap(),
        ..Default::default()
    };
    let err = NequIP::new(config).unwrap_err();
    assert!(matches!(err, Error::GateParity { .. }));
    assert!(err.to_string().contains("unable to produce gates"));
}

#[test]
fn construction_rejects_non_harmonic_edges() {
    let config = NequipConfig {
        irreps_edge: "1x0e + 1x1o + 1x2o".parse().unwrap(),
        ..Default::default()
    };
    assert!(matches!(NequIP::new(config), Err(Error::InconsistentParity(_))));
}

#[test]
fn layers_chain_their_representations() {
    let model = NequIP::new(config()).unwrap();
    let layers = model.layers();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0].irreps_in(), &model.config().irreps_in);
    for pair in layers.windows(2) {
        assert_eq!(pair[0].irreps_out(), pair[1].irreps_in());
    }
    assert_eq!(model.irreps_out(), &model.config().irreps_out);

    let chain: Vec<_> = model.plan().irreps_chain().cloned().collect();
    let inputs: Vec<_> = layers.iter().map(|l| l.irreps_in().clone()).collect();
    assert_eq!(chain, inputs);
}

#[test]
fn forward_returns_one_row_per_node() {
    let model = NequIP::new(config()).unwrap();
    let graph = cluster_graph(&CLUSTER);
    let out = model.forward(&graph).unwrap();
    assert_eq!(out.shape(), &[5, 3]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn scalar_outputs_are_rotation_invariant() {
    let model = NequIP::new(config()).unwrap();
    let reference = model.forward(&cluster_graph(&CLUSTER)).unwrap();

    for (axis, angle) in [([0.0, 0.0, 1.0], 0.7), ([1.0, -2.0, 0.5], 2.3), ([0.3, 0.9, -1.4], -1.1)] {
        let r = rotation(axis, angle);
        let rotated: Vec<_> = CLUSTER.iter().map(|&p| rotate(&r, p)).collect();
        let out = model.forward(&cluster_graph(&rotated)).unwrap();
        for (a, b) in reference.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-8 * (1.0 + a.abs()), "{a} vs {b}");
        }
    }
}

#[test]
fn scalar_outputs_follow_their_parity_under_inversion() {
    let config = NequipConfig {
        irreps_hidden: "8x0e + 4x0o + 4x1o + 2x1e".parse().unwrap(),
        irreps_edge: "1x0e + 1x1o + 1x2e".parse().unwrap(),
        irreps_out: "2x0e + 2x0o".parse().unwrap(),
        ..config()
    };
    let model = NequIP::new(config).unwrap();
    let plan = model.plan();
    assert_eq!(plan.layers[0].irreps_out.to_string(), "8x0e+4x1o");
    assert_eq!(plan.layers[1].irreps_out.to_string(), "8x0e+4x1o+2x1e");

    let reference = model.forward(&cluster_graph(&CLUSTER)).unwrap();
    let inverted: Vec<_> = CLUSTER.iter().map(|p| p.map(|c| -c)).collect();
    let out = model.forward(&cluster_graph(&inverted)).unwrap();

    assert!(reference.column(2).iter().any(|v| v.abs() > 1e-6));
    for (row_ref, row) in reference.rows().into_iter().zip(out.rows()) {
        for col in 0..2 {
            let (a, b) = (row_ref[col], row[col]);
            assert!((a - b).abs() < 1e-8 * (1.0 + a.abs()), "even column {col}: {a} vs {b}");
        }
        for col in 2..4 {
            let (a, b) = (row_ref[col], row[col]);
            assert!((a + b).abs() < 1e-8 * (1.0 + a.abs()), "odd column {col}: {a} vs {b}");
        }
    }
}

#[test]
fn forward_rejects_unknown_species() {
    let model = NequIP::new(config()).unwrap();
    let graph = Graph::from_positions(vec![0, 2], &CLUSTER[..2], 3.1);
    assert!(matches!(model.forward(&graph), Err(Error::InvalidGraph(_))));
}
