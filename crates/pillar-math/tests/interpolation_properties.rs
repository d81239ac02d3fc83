//! Property tests for the interpolators and solvers.

use approx::assert_relative_eq;
use pillar_math::prelude::*;
use proptest::prelude::*;

fn curve_nodes() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.05f64..3.0, 0.001f64..0.08), 2..12).prop_map(|steps| {
        let mut xs = Vec::with_capacity(steps.len());
        let mut ys = Vec::with_capacity(steps.len());
        let mut t = 0.0;
        let mut log_df = 0.0;
        for (dt, forward) in steps {
            t += dt;
            log_df -= forward * dt;
            xs.push(t);
            ys.push(log_df.exp());
        }
        (xs, ys)
    })
}

fn all_interpolators(xs: &[f64], ys: &[f64]) -> Vec<Box<dyn Interpolator>> {
    vec![
        Box::new(LinearInterpolator::new(xs.to_vec(), ys.to_vec()).unwrap()),
        Box::new(LogLinearInterpolator::new(xs.to_vec(), ys.to_vec()).unwrap()),
        Box::new(
            CubicInterpolator::new(xs.to_vec(), ys.to_vec(), CubicScheme::natural_spline(), false)
                .unwrap(),
        ),
        Box::new(
            CubicInterpolator::new(xs.to_vec(), ys.to_vec(), CubicScheme::Kruger, true).unwrap(),
        ),
        Box::new(
            CubicInterpolator::new(xs.to_vec(), ys.to_vec(), CubicScheme::Parabolic, false)
                .unwrap(),
        ),
        Box::new(MonotoneConvex::new(xs.to_vec(), ys.to_vec()).unwrap()),
        Box::new(QuadraticInterpolator::new(xs.to_vec(), ys.to_vec()).unwrap()),
        Box::new(LogQuadraticInterpolator::new(xs.to_vec(), ys.to_vec()).unwrap()),
    ]
}

proptest! {
    #[test]
    fn interpolators_reproduce_nodes((xs, ys) in curve_nodes()) {
        for interp in all_interpolators(&xs, &ys) {
            for (x, y) in xs.iter().zip(&ys) {
                prop_assert!((interp.interpolate(*x) - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn primitive_differentiates_back((xs, ys) in curve_nodes()) {
        let h = 1e-5;
        for interp in all_interpolators(&xs, &ys) {
            prop_assert!(interp.primitive(xs[0]).abs() < 1e-14);
            let span = xs[xs.len() - 1] - xs[0];
            for x in [xs[0] + 0.25 * span, xs[0] + 0.5 * span] {
                let slope = (interp.primitive(x + h) - interp.primitive(x - h)) / (2.0 * h);
                prop_assert!((slope - interp.interpolate(x)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn kruger_with_filter_preserves_monotone_data((xs, ys) in curve_nodes()) {
        let sorted: Vec<f64> = {
            let mut v = ys.clone();
            v.sort_by(|a, b| b.total_cmp(a));
            v
        };
        let interp = CubicInterpolator::new(xs.clone(), sorted, CubicScheme::Kruger, true).unwrap();
        let lo = xs[0];
        let hi = xs[xs.len() - 1];
        let mut prev = interp.interpolate(lo);
        for k in 1..=100 {
            let x = lo + (hi - lo) * f64::from(k) / 100.0;
            let y = interp.interpolate(x);
            prop_assert!(y <= prev + 1e-14);
            prev = y;
        }
    }

    #[test]
    fn brent_inverts_discount(rate in -0.02f64..0.15, t in 0.1f64..40.0) {
        let target = (-rate * t).exp();
        let f = |df: f64| -df.ln() / t - rate;
        let result = brent(f, target * 0.5, target * 1.5, &SolverConfig::default().with_tolerance(1e-14)).unwrap();
        prop_assert!((result.root - target).abs() < 1e-12);
    }
}

#[test]
fn log_linear_on_discounts_gives_flat_forwards_between_nodes() {
    let xs = vec![0.0, 1.0, 2.0];
    let ys = vec![1.0, 0.97, 0.93];
    let interp = LogLinearInterpolator::new(xs, ys).unwrap();
    let f1 = -interp.derivative(0.3) / interp.interpolate(0.3);
    let f2 = -interp.derivative(0.8) / interp.interpolate(0.8);
    assert_relative_eq!(f1, f2, epsilon = 1e-12);
    assert_relative_eq!(f1, -(0.97f64).ln(), epsilon = 1e-12);
}

#[test]
fn halton_seeded_start_is_reproducible() {
    let mut a = HaltonSequence::randomized(3, 42);
    let mut b = HaltonSequence::randomized(3, 42);
    for _ in 0..20 {
        assert_eq!(a.next_vec(), b.next_vec());
    }
}
