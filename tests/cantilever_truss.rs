use approx::assert_relative_eq;
use truss_opt::prelude::*;

const E: f64 = 70e9;
const RHO: f64 = 2700.0;

/// Two-bar bracket:
///
///   1 (pinned)
///   |  \
///   |    \
///   0 ---- 2  <- unit load downward
///   (pinned)
///
/// Bar 0-2 has length 1 and carries -1 (compression); bar 1-2 has length √2
/// and carries √2 (tension).
fn bracket() -> TrussModel {
    let pinned: &[usize] = &[0, 1];
    let bcs = [(0, pinned), (1, pinned)];
    TrussModel::from_arrays(
        Material::new(E, RHO),
        &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
        &[[0, 2], [1, 2]],
        &[(2, [0.0, -1.0])],
        &bcs,
    )
    .unwrap()
}

#[test]
fn bracket_matches_closed_form() {
    let model = bracket();
    let a = 2e-4;
    let ea = E * a;
    let state = TrussAnalysis::new(&model).solve(&[a, a]).unwrap();

    let sqrt2 = 2f64.sqrt();
    let tip = state.node_displacement(2).unwrap();
    assert_relative_eq!(tip.dx, -1.0 / ea, max_relative = 1e-10);
    assert_relative_eq!(tip.dy, -(1.0 + 2.0 * sqrt2) / ea, max_relative = 1e-10);
    assert_relative_eq!(
        state.compliance(),
        (1.0 + 2.0 * sqrt2) / (2.0 * ea),
        max_relative = 1e-10
    );

    let forces = state.bar_forces();
    assert_relative_eq!(forces[0], -1.0, max_relative = 1e-10);
    assert_relative_eq!(forces[1], sqrt2, max_relative = 1e-10);

    assert_relative_eq!(state.mass(), RHO * a * (1.0 + sqrt2), max_relative = 1e-14);
}

#[test]
fn reactions_balance_applied_load() {
    let model = bracket();
    let state = TrussAnalysis::new(&model).solve(&[1e-4, 3e-4]).unwrap();
    let reactions = state.reactions();

    let sum_fx: f64 = reactions.iter().map(|r| r.fx).sum();
    let sum_fy: f64 = reactions.iter().map(|r| r.fy).sum();
    assert_relative_eq!(sum_fx, 0.0, epsilon = 1e-9);
    assert_relative_eq!(sum_fy, 1.0, max_relative = 1e-9);

    // the chord pushes node 0 away from the tip, the diagonal pulls node 1 toward it
    assert_relative_eq!(reactions[0].fx, 1.0, max_relative = 1e-9);
    assert_relative_eq!(reactions[1].fx, -1.0, max_relative = 1e-9);
    assert_relative_eq!(reactions[1].fy, 1.0, max_relative = 1e-9);
}

#[test]
fn single_bar_compliance() {
    let (f, l, a) = (250.0, 3.0, 5e-5);
    let roller: &[usize] = &[1];
    let pinned: &[usize] = &[0, 1];
    let bcs = [(0, pinned), (1, roller)];
    let model = TrussModel::from_arrays(
        Material::new(E, RHO),
        &[0.0, 0.0, l, 0.0],
        &[[0, 1]],
        &[(1, [f, 0.0])],
        &bcs,
    )
    .unwrap();

    for options in [AnalysisOptions::dense(), AnalysisOptions::skyline()] {
        let response = TrussAnalysis::with_options(&model, options).evaluate(&[a]).unwrap();
        assert_relative_eq!(response.compliance, f * f * l / (2.0 * E * a), max_relative = 1e-12);
    }
}

#[test]
fn stiffness_before_supports_is_exactly_symmetric() {
    let model = TrussModel::from_arrays(
        Material::new(E, RHO),
        &[0.0, 0.0, 1.3, 0.2, 2.1, 1.7, -0.4, 0.9],
        &[[0, 1], [1, 2], [2, 3], [3, 0], [0, 2], [1, 3]],
        &[],
        &[],
    )
    .unwrap();
    let k = model
        .assemble_stiffness(&[1e-4, 2e-4, 3e-4, 4e-4, 5e-4, 6e-4])
        .unwrap();
    assert_eq!(k, k.transpose());
}

#[test]
fn supports_eliminate_rows_and_columns() {
    let model = bracket();
    let mut k = model.assemble_stiffness(&[1e-4, 1e-4]).unwrap();
    let mut f = model.assemble_loads();
    model.apply_bcs(&mut k, &mut f);

    for var in model.constrained_dofs() {
        for j in 0..model.num_dofs() {
            let expected = if j == var { 1.0 } else { 0.0 };
            assert_eq!(k[(var, j)], expected);
            assert_eq!(k[(j, var)], expected);
        }
        assert_eq!(f[var], 0.0);
    }
    assert_eq!(f[5], -1.0);
}

#[test]
fn coincident_nodes_are_degenerate() {
    let mut model = bracket();
    model.add_bar(Bar::new(2, 2)).unwrap();
    let err = TrussAnalysis::new(&model)
        .evaluate(&[1e-4, 1e-4, 1e-4])
        .unwrap_err();
    assert!(matches!(err, TrussError::DegenerateGeometry { bar: 2, n1: 2, n2: 2 }));
}

#[test]
fn unsupported_structure_is_singular() {
    let model = TrussModel::from_arrays(
        Material::new(E, RHO),
        &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
        &[[0, 2], [1, 2]],
        &[(2, [0.0, -1.0])],
        &[],
    )
    .unwrap();

    for options in [AnalysisOptions::dense(), AnalysisOptions::skyline()] {
        let err = TrussAnalysis::with_options(&model, options)
            .evaluate(&[1e-4, 1e-4])
            .unwrap_err();
        assert!(matches!(err, TrussError::SingularSystem { .. }));
    }
}

#[test]
fn millimetre_bracket_is_not_singular() {
    // supported rows end up with a unit diagonal next to free rows near 1e12
    let (s, a) = (1e-3, 1e-2);
    let pinned: &[usize] = &[0, 1];
    let model = TrussModel::from_arrays(
        Material::steel(),
        &[0.0, 0.0, 0.0, s, s, 0.0],
        &[[0, 2], [1, 2]],
        &[(2, [0.0, -1.0])],
        &[(0, pinned), (1, pinned)],
    )
    .unwrap();
    let ea = model.material().e * a;

    for options in [AnalysisOptions::dense(), AnalysisOptions::skyline()] {
        let response = TrussAnalysis::with_options(&model, options).evaluate(&[a, a]).unwrap();
        assert_relative_eq!(
            response.compliance,
            (1.0 + 2.0 * 2f64.sqrt()) * s / (2.0 * ea),
            max_relative = 1e-10
        );
    }
}

#[test]
fn very_soft_bar_is_not_singular() {
    // free stiffness far below the unit diagonal of the supported rows
    let a = 1e-13;
    let pinned: &[usize] = &[0, 1];
    let roller: &[usize] = &[1];
    let model = TrussModel::from_arrays(
        Material::new(1.0, 1.0),
        &[0.0, 0.0, 1.0, 0.0],
        &[[0, 1]],
        &[(1, [1.0, 0.0])],
        &[(0, pinned), (1, roller)],
    )
    .unwrap();

    for options in [AnalysisOptions::dense(), AnalysisOptions::skyline()] {
        let response = TrussAnalysis::with_options(&model, options).evaluate(&[a]).unwrap();
        assert_relative_eq!(response.compliance, 1.0 / (2.0 * a), max_relative = 1e-10);
    }
}

#[test]
fn repeated_supports_on_a_node_combine() {
    // x and y restraints of node 0 given separately act as a pin
    let x: &[usize] = &[0];
    let y: &[usize] = &[1];
    let split = TrussModel::from_arrays(
        Material::new(E, RHO),
        &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
        &[[0, 2], [1, 2]],
        &[(2, [0.0, -1.0])],
        &[(0, x), (0, y), (1, x), (1, y)],
    )
    .unwrap();
    assert_eq!(split.constrained_dofs(), vec![0, 1, 2, 3]);

    let areas = [1e-4, 2e-4];
    let expected = TrussAnalysis::new(&bracket()).evaluate(&areas).unwrap();
    let response = TrussAnalysis::new(&split).evaluate(&areas).unwrap();
    assert_relative_eq!(response.compliance, expected.compliance, max_relative = 1e-14);
}

#[test]
fn non_positive_area_is_rejected() {
    let model = bracket();
    let err = TrussAnalysis::new(&model).evaluate(&[1e-4, 0.0]).unwrap_err();
    assert!(matches!(err, TrussError::InvalidArea { bar: 1, .. }));
}

#[test]
fn out_of_range_node_is_inconsistent() {
    let mut model = bracket();
    let err = model.add_bar(Bar::new(0, 7)).unwrap_err();
    assert!(matches!(err, TrussError::InconsistentTopology(_)));
}

#[test]
fn report_serializes_forces_and_geometry() {
    let model = bracket();
    let report = TrussAnalysis::new(&model).report(&[1e-4, 1e-4]).unwrap();
    assert_eq!(report.nodes.len(), 3);
    assert_eq!(report.bars.len(), 2);
    assert_eq!(report.displacements.len(), 3);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["bars"][1]["n1"], 1);
    assert!(json["bars"][0]["force"].as_f64().unwrap() < 0.0);
    assert!(json["response"]["compliance"].as_f64().unwrap() > 0.0);
}
