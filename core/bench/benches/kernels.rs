use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fhe_kernel_bench::circuit::{CalibratedCompiler, CircuitCompiler, CompiledCircuit};
use fhe_kernel_bench::inputset::{CoverageProfile, InputSet, InputShape, InputVector};
use fhe_kernel_bench::isolation::{time_multi_core, time_single_core_best_effort};
use fhe_kernel_bench::kernels::{Kernel, LANES};
use std::hint::black_box;
use std::time::Duration;
use strum::IntoEnumIterator;

const SAMPLE: [u64; LANES] = [42, 17, 99, 8, 63];

fn plaintext_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels_plaintext");
    for kernel in Kernel::iter() {
        group.bench_with_input(BenchmarkId::from_parameter(kernel), &kernel, |b, kernel| {
            b.iter(|| black_box(kernel.evaluate(black_box(&SAMPLE))))
        });
    }
    group.finish();
}

/// Round trips through the calibrated circuits, timed with and without isolation.
fn calibrated_round_trip(c: &mut Criterion) {
    let inputs = InputSet::generate_seeded(
        InputShape::new(LANES, 8).unwrap(),
        &CoverageProfile::Strict.into(),
        0,
    )
    .unwrap();
    let sample = InputVector::from(SAMPLE);

    let mut group = c.benchmark_group("kernels_calibrated");
    group.sample_size(50);
    for kernel in Kernel::iter() {
        let circuit = CalibratedCompiler.compile(kernel, &inputs).unwrap();
        group.bench_with_input(
            BenchmarkId::new("single_core", kernel),
            &kernel,
            |b, _| {
                b.iter_custom(|iters| {
                    (0..iters)
                        .map(|_| {
                            let (out, timing) = time_single_core_best_effort(0, || {
                                circuit.encrypt_run_decrypt(&sample)
                            });
                            black_box(out.unwrap());
                            timing.elapsed
                        })
                        .sum::<Duration>()
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("multi_core", kernel), &kernel, |b, _| {
            b.iter_custom(|iters| {
                (0..iters)
                    .map(|_| {
                        let (out, elapsed) =
                            time_multi_core(|| circuit.encrypt_run_decrypt(&sample));
                        black_box(out.unwrap());
                        elapsed
                    })
                    .sum::<Duration>()
            })
        });
    }
    group.finish();
}

criterion_group!(kernels, plaintext_kernels, calibrated_round_trip);
criterion_main!(kernels);
