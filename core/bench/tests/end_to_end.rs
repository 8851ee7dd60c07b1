use fhe_kernel_bench::circuit::{
    BackendKind, CalibratedCompiler, CircuitCompiler, CompiledCircuit,
};
use fhe_kernel_bench::conf::{BenchConfig, TimingMode};
use fhe_kernel_bench::driver::BenchmarkDriver;
use fhe_kernel_bench::inputset::{CoverageProfile, InputSet, InputShape, InputVector};
use fhe_kernel_bench::isolation::THREAD_CAP_VARS;
use fhe_kernel_bench::kernels::Kernel;
use serial_test::serial;
use strum::IntoEnumIterator;

#[test]
fn strict_input_set_layout() {
    let set = InputSet::generate_seeded(
        InputShape::new(5, 8).unwrap(),
        &CoverageProfile::Strict.into(),
        0,
    )
    .unwrap();
    let counts = set.counts();
    assert_eq!(
        (counts.axis, counts.extremes, counts.pairs, counts.random),
        (1280, 7, 4096, 256)
    );
    assert_eq!(set.len(), 5639);

    // every position reaches both ends of the range
    for pos in 0..5 {
        assert!(set.iter().any(|v| v.values()[pos] == 0));
        assert!(set.iter().any(|v| v.values()[pos] == 255));
    }
}

#[test]
#[serial]
fn calibrated_strict_run_passes() {
    let conf = BenchConfig {
        spot_checks: 5,
        timing: TimingMode::Both,
        ..BenchConfig::default()
    };
    let env_before = THREAD_CAP_VARS.map(std::env::var_os);
    let compiler = BackendKind::Calibrated.compiler().unwrap();
    let report = BenchmarkDriver::new(compiler, conf).run().unwrap();

    assert!(report.passed(), "{report}");
    assert_eq!(report.input_set_len, 5639);
    assert_eq!(report.checks_run, 20);
    let outputs = report
        .kernels
        .iter()
        .map(|k| k.output.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        outputs,
        vec![vec![8, 17, 42, 63, 99], vec![99], vec![45], vec![15887]]
    );
    assert_eq!(THREAD_CAP_VARS.map(std::env::var_os), env_before);
}

#[test]
#[serial]
fn reports_are_reproducible() {
    let run = || {
        let conf = BenchConfig {
            profile: CoverageProfile::Quick,
            seed: 1234,
            ..BenchConfig::default()
        };
        BenchmarkDriver::new(Box::new(CalibratedCompiler), conf)
            .run()
            .unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.failures, b.failures);
    assert_eq!(a.checks_run, b.checks_run);
}

/// A set that never exercises large values compiles a circuit that is wrong on them.
#[test]
fn under_covered_compile_is_observable() {
    let shape = InputShape::new(5, 8).unwrap();
    let narrow = InputSet::from_vectors(
        shape,
        vec![
            InputVector::from([0, 0, 0, 0, 0]),
            InputVector::from([200, 1, 1, 1, 1]),
        ],
    )
    .unwrap();
    let circuit = CalibratedCompiler.compile(Kernel::SumSq5, &narrow).unwrap();
    let input = InputVector::from([200, 200, 0, 0, 0]);
    assert_ne!(
        circuit.encrypt_run_decrypt(&input).unwrap(),
        Kernel::SumSq5.reference(&[200, 200, 0, 0, 0])
    );

    let strict =
        InputSet::generate_seeded(shape, &CoverageProfile::Strict.into(), 0).unwrap();
    for kernel in Kernel::iter() {
        let circuit = CalibratedCompiler.compile(kernel, &strict).unwrap();
        assert_eq!(
            circuit.encrypt_run_decrypt(&input).unwrap(),
            kernel.reference(&[200, 200, 0, 0, 0])
        );
    }
}
