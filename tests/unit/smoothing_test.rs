//! Unit tests for kernel regression smoothing.

use pedalsim::metrics::{Kernel, KernelSmoother, SmoothingError};

const ALL_KERNELS: [Kernel; 10] = [
    Kernel::Uniform,
    Kernel::Triangle,
    Kernel::Epanechnikov,
    Kernel::Quartic,
    Kernel::Triweight,
    Kernel::Logistic,
    Kernel::Cosine,
    Kernel::Gaussian,
    Kernel::Tricube,
    Kernel::Silverman,
];

#[test]
fn test_constant_signal_is_unchanged_for_every_kernel() {
    let points: Vec<(f64, f64)> = (0..25).map(|i| (i as f64 * 1.5, 4.2)).collect();
    for kernel in ALL_KERNELS {
        let smoothed = KernelSmoother::new(kernel, 2.0).smooth(&points).unwrap();
        assert_eq!(smoothed.len(), points.len());
        for ((x, y), (sx, sy)) in points.iter().zip(&smoothed) {
            assert_eq!(x, sx);
            assert!((sy - y).abs() < 1e-9, "{:?} gave {}", kernel, sy);
        }
    }
}

#[test]
fn test_spike_is_spread_out() {
    let mut values = vec![0.0; 21];
    values[10] = 10.0;
    let smoothed = KernelSmoother::new(Kernel::Gaussian, 2.0)
        .smooth_series(&values)
        .unwrap();

    assert!(smoothed[10] < 10.0);
    assert!(smoothed[9] > 0.0);
    assert!(smoothed[11] > 0.0);
    assert!((smoothed[9] - smoothed[11]).abs() < 1e-9);
}

#[test]
fn test_smoothed_values_stay_within_input_range() {
    let values = [0.0, 5.0, -3.0, 8.0, 2.0, 2.0, -1.0, 4.0];
    let smoothed = KernelSmoother::new(Kernel::Epanechnikov, 1.5)
        .smooth_series(&values)
        .unwrap();
    for v in smoothed {
        assert!((-3.0..=8.0).contains(&v));
    }
}

#[test]
fn test_per_point_bandwidth_length_checked() {
    let smoother = KernelSmoother::with_bandwidths(Kernel::Gaussian, vec![1.0, 1.0]);
    assert_eq!(
        smoother.smooth_series(&[1.0, 2.0, 3.0]),
        Err(SmoothingError::BandwidthLength {
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn test_empty_input() {
    let smoothed = KernelSmoother::new(Kernel::Gaussian, 2.0).smooth(&[]).unwrap();
    assert!(smoothed.is_empty());
}
