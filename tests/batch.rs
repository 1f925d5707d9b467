use light_curve_classifier_features::*;
use light_curve_classifier_features_test_util::{
    PERIODIC_PERIODS, PERIODIC_TABLE_F64, TRANSIENT_PARAMETERS, TRANSIENT_TABLE_F64,
};

use approx::assert_relative_eq;
use light_curve_classifier_features::ndarray::ArrayView1;
use std::f64::consts::PI;

const SPM_NAMES: [&str; 7] = [
    "SPM_A",
    "SPM_t0",
    "SPM_gamma",
    "SPM_beta",
    "SPM_tau_rise",
    "SPM_tau_fall",
    "SPM_chi",
];

fn bands() -> BandSet {
    [Band(1), Band(2)].into()
}

fn band_values(features: &FeatureTable<f64>, oid: &str, names: &[&str], band: Band) -> Vec<f64> {
    names
        .iter()
        .map(|name| features.get(oid, &band.suffixed(name)).unwrap())
        .collect()
}

fn same_bits(a: &FeatureTable<f64>, b: &FeatureTable<f64>) -> bool {
    a.names() == b.names()
        && a.iter().zip(b.iter()).all(|((oid_a, row_a), (oid_b, row_b))| {
            oid_a == oid_b
                && row_a
                    .iter()
                    .zip(row_b.iter())
                    .all(|(x, y)| x.to_bits() == y.to_bits())
        })
}

#[test]
fn transient_and_empty_band() {
    let param = [1.0, 5.0, 20.0, 0.3, 5.0, 30.0];
    let t: Vec<f64> = (0..30).map(|i| 60000.0 + 3.0 * i as f64).collect();
    let flux: Vec<f64> = t
        .iter()
        .map(|&t| SnParametricModel::model(t - 60000.0, &param))
        .collect();

    let n = t.len();
    let mut oid = vec!["ZTF_rise_fall"; n];
    let mut mjd = t.clone();
    let mut fid = vec![Band(1); n];
    let mut diff_flux = flux;
    let mut diff_err = vec![0.01; n];
    // The second object is observed in band 2 only
    oid.extend(["ZTF_band_2_only"; 10]);
    mjd.extend((0..10).map(|i| 60000.0 + i as f64));
    fid.extend([Band(2); 10]);
    diff_flux.extend([0.5; 10]);
    diff_err.extend([0.01; 10]);
    let table = LightCurveTable::from_columns(
        oid,
        mjd,
        fid,
        [(Column::DiffFlux, diff_flux), (Column::DiffErr, diff_err)],
    )
    .unwrap();

    let orchestrator = FeatureOrchestrator::new(vec![Extractor::sn_parametric_model(
        SnParametricModel::difference_flux(),
        [Band(1)].into(),
    )]);
    let batch = orchestrator.run(&table);
    assert!(batch.schema_errors.is_empty());
    assert_eq!(batch.features.len(), 2);

    let values = band_values(&batch.features, "ZTF_rise_fall", &SPM_NAMES, Band(1));
    assert!(values.iter().all(|x| x.is_finite()), "{values:?}");
    let empty = band_values(&batch.features, "ZTF_band_2_only", &SPM_NAMES, Band(1));
    assert!(empty.iter().all(|x| x.is_nan()));
}

#[test]
fn transient_dataset() {
    let orchestrator = FeatureOrchestrator::new(vec![Extractor::sn_parametric_model(
        SnParametricModel::difference_flux(),
        bands(),
    )]);
    let batch = orchestrator.run(&TRANSIENT_TABLE_F64);
    assert_eq!(batch.features.len(), TRANSIENT_TABLE_F64.len());

    for truth in TRANSIENT_PARAMETERS.iter() {
        let values = band_values(&batch.features, &truth.oid, &SPM_NAMES, truth.band);
        assert!(values.iter().all(|x| x.is_finite()), "{values:?}");
        // Amplitude is bounded by the flux peak
        let amplitude = values[0];
        assert!(amplitude > 0.1 * truth.params[0] && amplitude < 10.0 * truth.params[0]);
        let beta = values[3];
        assert!((0.0..=1.0).contains(&beta));
        assert!(values[6] >= 0.0);
    }
}

#[test]
fn transient_model_follows_data() {
    // Tolerances tight enough to reach the least-squares minimum
    let spm = SnParametricModel::new(
        SpmInput::DifferenceFlux,
        CurveFitAlgorithm::default(),
        1e4,
        1e2,
        0.01,
    );
    for truth in TRANSIENT_PARAMETERS.iter() {
        let lc = TRANSIENT_TABLE_F64.get(&truth.oid).unwrap();
        let BandSelection { t, values } = lc
            .select(truth.band, &[Column::DiffFlux, Column::DiffErr])
            .unwrap();
        let output = spm
            .eval_arrays(
                ArrayView1::from(&t),
                ArrayView1::from(&values[0]),
                ArrayView1::from(&values[1]),
            )
            .unwrap();
        let param: [f64; 6] = output[..6].try_into().unwrap();

        let sum_squares: f64 = t
            .iter()
            .zip(values[0].iter())
            .map(|(&x, &flux)| (SnParametricModel::model(x - t[0], &param) - flux).powi(2))
            .sum();
        let rms = f64::sqrt(sum_squares / t.len() as f64);
        // Noise is 1% of the amplitude
        assert!(
            rms < 0.05 * truth.params[0],
            "{} band {}: rms {rms}, parameters {param:?}",
            truth.oid,
            truth.band
        );
    }
}

#[test]
fn transient_fit_is_deterministic() {
    let orchestrator = FeatureOrchestrator::new(vec![Extractor::sn_parametric_model(
        SnParametricModel::difference_flux(),
        bands(),
    )]);
    let first = orchestrator.run(&TRANSIENT_TABLE_F64);
    let second = orchestrator.run(&TRANSIENT_TABLE_F64);
    assert!(same_bits(&first.features, &second.features));
}

#[test]
fn periodic_dataset() {
    let orchestrator = FeatureOrchestrator::new(vec![
        Extractor::harmonics(Harmonics::default(), bands()),
        Extractor::period(PeriodExtractor::default()),
    ]);
    let batch = orchestrator.run(&PERIODIC_TABLE_F64);
    assert!(batch.schema_errors.is_empty());
    assert_eq!(batch.features.len(), PERIODIC_PERIODS.len());

    for (oid, period) in PERIODIC_PERIODS.iter() {
        let found = batch.features.get(oid, MULTIBAND_PERIOD_FIELD).unwrap();
        assert_relative_eq!(found, *period, max_relative = 0.01);

        for (band, amplitude) in [(Band(1), 0.45), (Band(2), 0.35)] {
            let mag_1 = batch
                .features
                .get(oid, &band.suffixed("Harmonics_mag_1"))
                .unwrap();
            assert_relative_eq!(mag_1, amplitude, max_relative = 0.1);
            let phase_2 = batch
                .features
                .get(oid, &band.suffixed("Harmonics_phase_2"))
                .unwrap();
            assert!((0.0..2.0 * PI).contains(&phase_2));
        }
    }
}

#[test]
fn harmonics_fallback_period() {
    let orchestrator =
        FeatureOrchestrator::new(vec![Extractor::harmonics(Harmonics::default(), bands())]);
    let batch = orchestrator.run(&PERIODIC_TABLE_F64);
    assert!(batch.schema_errors.is_empty());
    for (oid, _period) in PERIODIC_PERIODS.iter() {
        let mag_1 = batch
            .features
            .get(oid, &Band(1).suffixed("Harmonics_mag_1"))
            .unwrap();
        assert_relative_eq!(mag_1, 0.45, max_relative = 0.1);
    }
}

#[test]
fn harmonics_single_band_with_given_period() {
    const PERIOD: f64 = 5.3;

    let t: Vec<f64> = (0..50).map(|i| 59000.0 + 1.37 * i as f64).collect();
    let m: Vec<f64> = t
        .iter()
        .map(|&t| 17.0 + 0.2 * f64::sin(2.0 * PI * t / PERIOD))
        .collect();
    let n = t.len();
    let table = LightCurveTable::from_columns(
        vec!["ZTF_single_band"; n],
        t,
        vec![Band(2); n],
        [(Column::MagpsfMl, m), (Column::SigmapsfMl, vec![0.05; n])],
    )
    .unwrap();
    let ctx = SharedContext::new().with_table(
        ContextKey::Period,
        FeatureTable::from_rows(
            vec![MULTIBAND_PERIOD_FIELD.to_owned()],
            [("ZTF_single_band".to_owned(), vec![PERIOD])],
        ),
    );

    let harmonics = Harmonics::new(3, 0.01, PeriodExtractor::default());
    let extractor: Extractor<f64> = Extractor::harmonics(harmonics, bands());
    let features = extractor.compute(&table, &ctx).unwrap();
    let names = [
        "Harmonics_mag_1",
        "Harmonics_mag_2",
        "Harmonics_mag_3",
        "Harmonics_phase_2",
        "Harmonics_phase_3",
        "Harmonics_mse",
    ];

    let band_2 = band_values(&features, "ZTF_single_band", &names, Band(2));
    assert!(band_2.iter().all(|x| x.is_finite()), "{band_2:?}");
    assert_relative_eq!(band_2[0], 0.2, max_relative = 1e-6);
    let band_1 = band_values(&features, "ZTF_single_band", &names, Band(1));
    assert!(band_1.iter().all(|x| x.is_nan()));
}

#[test]
fn every_object_has_a_row() {
    let extractors: Vec<Extractor<f64>> = vec![
        Extractor::harmonics(Harmonics::default(), bands()),
        Extractor::period(PeriodExtractor::default()),
        Extractor::sn_parametric_model(SnParametricModel::difference_flux(), bands()),
    ];
    // Magnitudes only in the periodic table, fluxes only in the transient one
    for (table, n_schema_errors) in [(&*PERIODIC_TABLE_F64, 1), (&*TRANSIENT_TABLE_F64, 2)] {
        let batch = FeatureOrchestrator::new(extractors.clone()).run(table);
        assert!(batch.features.object_ids().eq(table.object_ids()));
        assert_eq!(batch.schema_errors.len(), n_schema_errors);
        assert_eq!(batch.features.n_features(), 28 + 5 + 14);
    }
}

#[test]
fn missing_columns_are_schema_errors() {
    let spm: Extractor<f64> =
        Extractor::sn_parametric_model(SnParametricModel::difference_flux(), bands());
    let err = spm
        .compute(&PERIODIC_TABLE_F64, &SharedContext::new())
        .unwrap_err();
    let SchemaError::MissingColumns { missing, .. } = err;
    assert_eq!(missing, [Column::DiffFlux, Column::DiffErr].into());

    let harmonics: Extractor<f64> = Extractor::harmonics(Harmonics::default(), bands());
    assert!(
        harmonics
            .compute(&TRANSIENT_TABLE_F64, &SharedContext::new())
            .is_err()
    );
}

#[test]
fn configuration_round_trip() {
    let orchestrator: FeatureOrchestrator<f64> = FeatureOrchestrator::new(vec![
        Extractor::sn_parametric_model(SnParametricModel::difference_flux(), bands()),
        Extractor::harmonics(Harmonics::default(), bands()),
        Extractor::period(PeriodExtractor::default()),
    ]);
    let json = orchestrator.to_json_string().unwrap();
    let restored = FeatureOrchestrator::from_json_str(&json).unwrap();
    assert_eq!(orchestrator, restored);
    assert!(same_bits(
        &orchestrator.run(&TRANSIENT_TABLE_F64).features,
        &restored.run(&TRANSIENT_TABLE_F64).features,
    ));
}
