use criterion::Criterion;
use light_curve_classifier_features::TimeSeries;
use light_curve_classifier_features::periodogram::*;
use light_curve_common::linspace;
use std::hint::black_box;

pub fn bench_periodogram(c: &mut Criterion) {
    const PERIOD: f32 = 0.22;

    let params = DynamicFreqGridParams::new(10.0, 1.0, NyquistFreq::average(), 1 << 20);
    for n in [10, 100, 1000] {
        let t = linspace(0.0_f32, 1.0, n);
        let m: Vec<_> = t
            .iter()
            .map(|&t| 3.0 * f32::sin(2.0 * std::f32::consts::PI / PERIOD * t + 0.5) + 4.0)
            .collect();
        let err = vec![1.0_f32; n];
        c.bench_function(format!("Periodogram: {n} length").as_str(), |b| {
            b.iter(|| {
                let mut ts = TimeSeries::new(&t, &m, &err);
                let periodogram = Periodogram::from_t(&t, &params).unwrap();
                periodogram.power(black_box(&mut ts));
            })
        });
    }
}
