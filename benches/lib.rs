use criterion::{criterion_group, criterion_main};

mod batch;
mod periodogram;

criterion_group!(benches_batch, batch::bench_orchestrator);
criterion_group!(benches_fit, fit::bench_fit_spm, fit::bench_fit_harmonics);
criterion_group!(benches_periodogram, periodogram::bench_periodogram);
criterion_main!(benches_batch, benches_fit, benches_periodogram);
