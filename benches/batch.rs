use criterion::Criterion;
use light_curve_classifier_features::*;
use light_curve_classifier_features_test_util::{PERIODIC_TABLE_F64, TRANSIENT_TABLE_F64};
use std::hint::black_box;

pub fn bench_orchestrator(c: &mut Criterion) {
    let bands: BandSet = [Band(1), Band(2)].into();

    let periodic = FeatureOrchestrator::<f64>::new(vec![
        Extractor::harmonics(Harmonics::default(), bands.clone()),
        Extractor::period(PeriodExtractor::default()),
    ]);
    c.bench_function("Orchestrator: period and harmonics", |b| {
        b.iter(|| periodic.run(black_box(&PERIODIC_TABLE_F64)))
    });

    let transient = FeatureOrchestrator::<f64>::new(vec![Extractor::sn_parametric_model(
        SnParametricModel::difference_flux(),
        bands,
    )]);
    c.bench_function("Orchestrator: SPM", |b| {
        b.iter(|| transient.run(black_box(&TRANSIENT_TABLE_F64)))
    });
}
