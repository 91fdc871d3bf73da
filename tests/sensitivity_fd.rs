use approx::assert_relative_eq;
use truss_opt::prelude::*;

/// Deterministic values in [0, 1)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Two-bay braced truss (statically indeterminate), pinned at the left
/// column, with loads in both directions
fn braced_truss() -> TrussModel {
    let mut model = TrussModel::new(Material::new(200e9, 7850.0));
    for i in 0..3 {
        model.add_node(Node::new(2.0 * i as f64, 0.0));
        model.add_node(Node::new(2.0 * i as f64, 1.5));
    }
    for i in 0..2 {
        let (bl, tl, br, tr) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        for (n1, n2) in [(bl, br), (tl, tr), (br, tr), (bl, tr), (tl, br)] {
            model.add_bar(Bar::new(n1, n2)).unwrap();
        }
    }
    model.add_bar(Bar::new(0, 1)).unwrap();
    model.add_support(0, Support::pinned()).unwrap();
    model.add_support(1, Support::roller_x()).unwrap();
    model.add_node_load(4, NodeLoad::new(300.0, -1000.0)).unwrap();
    model.add_node_load(3, NodeLoad::fy(-500.0)).unwrap();
    model
}

fn random_areas(rng: &mut Lcg, n: usize) -> Vec<f64> {
    (0..n).map(|_| 1e-4 * (0.5 + rng.next())).collect()
}

fn random_direction(rng: &mut Lcg, n: usize) -> Vec<f64> {
    (0..n).map(|_| 1e-4 * (2.0 * rng.next() - 1.0)).collect()
}

#[test]
fn compliance_gradient_matches_central_differences() {
    let model = braced_truss();
    let mut rng = Lcg(7);

    for options in [AnalysisOptions::dense(), AnalysisOptions::skyline()] {
        let analysis = TrussAnalysis::with_options(&model, options);
        let areas = random_areas(&mut rng, model.num_bars());
        let gradient = analysis.compliance_gradient(&areas).unwrap();
        let scale = gradient.iter().map(|g| g.abs()).fold(0.0, f64::max);

        for i in 0..model.num_bars() {
            let h = 1e-6 * areas[i];
            let mut plus = areas.clone();
            let mut minus = areas.clone();
            plus[i] += h;
            minus[i] -= h;
            let fd = (analysis.evaluate(&plus).unwrap().compliance
                - analysis.evaluate(&minus).unwrap().compliance)
                / (2.0 * h);
            assert_relative_eq!(gradient[i], fd, epsilon = 1e-6 * scale, max_relative = 1e-5);
        }
    }
}

#[test]
fn hessian_vector_product_matches_gradient_differences() {
    let model = braced_truss();
    let analysis = TrussAnalysis::new(&model);
    let mut rng = Lcg(42);

    for _ in 0..3 {
        let areas = random_areas(&mut rng, model.num_bars());
        let direction = random_direction(&mut rng, model.num_bars());
        let hp = analysis.hessian_vector_product(&areas, &direction).unwrap();

        let h = 1e-4;
        let step = |sign: f64| -> Vec<f64> {
            areas
                .iter()
                .zip(&direction)
                .map(|(a, p)| a + sign * h * p)
                .collect()
        };
        let g_plus = analysis.compliance_gradient(&step(1.0)).unwrap();
        let g_minus = analysis.compliance_gradient(&step(-1.0)).unwrap();

        let scale = hp.iter().map(|v| v.abs()).fold(0.0, f64::max);
        for i in 0..model.num_bars() {
            let fd = (g_plus[i] - g_minus[i]) / (2.0 * h);
            assert_relative_eq!(hp[i], fd, epsilon = 1e-5 * scale, max_relative = 1e-5);
        }
    }
}

#[test]
fn hessian_is_symmetric() {
    let model = braced_truss();
    let analysis = TrussAnalysis::new(&model);
    let mut rng = Lcg(3);
    let areas = random_areas(&mut rng, model.num_bars());
    let p = random_direction(&mut rng, model.num_bars());
    let q = random_direction(&mut rng, model.num_bars());

    let hp = analysis.hessian_vector_product(&areas, &p).unwrap();
    let hq = analysis.hessian_vector_product(&areas, &q).unwrap();
    let q_hp: f64 = q.iter().zip(&hp).map(|(a, b)| a * b).sum();
    let p_hq: f64 = p.iter().zip(&hq).map(|(a, b)| a * b).sum();
    assert_relative_eq!(q_hp, p_hq, max_relative = 1e-9);
}

#[test]
fn mass_is_linear_in_areas() {
    let model = braced_truss();
    let analysis = TrussAnalysis::new(&model);
    let mut rng = Lcg(11);
    let areas = random_areas(&mut rng, model.num_bars());

    let dm = analysis.mass_gradient().unwrap();
    let expected: f64 = dm.iter().zip(&areas).map(|(g, a)| g * a).sum();
    assert_relative_eq!(analysis.evaluate(&areas).unwrap().mass, expected, max_relative = 1e-12);

    // diagonal bars are 2.5 long
    assert_relative_eq!(dm[3], 7850.0 * 2.5, max_relative = 1e-14);
}

#[test]
fn solver_backends_agree() {
    let model = braced_truss();
    let mut rng = Lcg(5);
    let areas = random_areas(&mut rng, model.num_bars());

    let dense = TrussAnalysis::with_options(&model, AnalysisOptions::dense())
        .solve(&areas)
        .unwrap();
    let skyline = TrussAnalysis::with_options(&model, AnalysisOptions::skyline())
        .solve(&areas)
        .unwrap();

    assert_relative_eq!(dense.compliance(), skyline.compliance(), max_relative = 1e-10);
    for (a, b) in dense.displacements().iter().zip(skyline.displacements().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-14, max_relative = 1e-9);
    }

    let direction = random_direction(&mut rng, model.num_bars());
    let hp_dense = dense.hessian_vector_product(&direction).unwrap();
    let hp_skyline = skyline.hessian_vector_product(&direction).unwrap();
    let scale = hp_dense.iter().map(|v| v.abs()).fold(0.0, f64::max);
    for (a, b) in hp_dense.iter().zip(&hp_skyline) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9 * scale, max_relative = 1e-8);
    }
}
