//! Engine behavior against scripted backends.

use cbos_bench::{
    run_backend, Backend, BackendError, BackendKind, BackendResult, BenchConfig, CipherFamily,
    CipherId, CipherSuite, ConfigError, Console, CycleSource, Engine, EngineError, FailureStage,
    KeySize, CPU_TICK_UNIT,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const MESSAGE_SIZE: usize = 64;
const ITERATIONS: usize = 20;
const CYCLES_PER_CALL: u64 = 8;

/// Advances by a fixed step on every read.
struct StepCycles {
    next: AtomicU64,
    step: u64,
}

impl StepCycles {
    fn new(step: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            step,
        }
    }
}

impl CycleSource for StepCycles {
    fn timestamp(&self) -> u64 {
        self.next.fetch_add(self.step, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Error,
    ZeroBytes,
}

#[derive(Debug, Default)]
struct Calls {
    init: usize,
    free: usize,
    random: usize,
    set_cipher: Vec<String>,
    encrypt: usize,
}

impl Calls {
    fn total(&self) -> usize {
        self.init + self.free + self.random + self.set_cipher.len() + self.encrypt
    }
}

struct FakeContext {
    active: Option<String>,
    encrypts: usize,
    live: Rc<Cell<usize>>,
}

impl Drop for FakeContext {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

struct ScriptedBackend {
    ciphers: Vec<CipherId>,
    reject: Vec<&'static str>,
    encrypt_fault: Option<(&'static str, usize, Fault)>,
    fail_init: bool,
    fail_random: bool,
    calls: RefCell<Calls>,
    live: Rc<Cell<usize>>,
}

impl ScriptedBackend {
    fn new(ciphers: &[&str]) -> Self {
        Self {
            ciphers: ciphers.iter().copied().map(CipherId::from).collect(),
            reject: Vec::new(),
            encrypt_fault: None,
            fail_init: false,
            fail_random: false,
            calls: RefCell::new(Calls::default()),
            live: Rc::new(Cell::new(0)),
        }
    }

    fn rejecting(mut self, cipher: &'static str) -> Self {
        self.reject.push(cipher);
        self
    }

    fn failing_encrypt(mut self, cipher: &'static str, call: usize, fault: Fault) -> Self {
        self.encrypt_fault = Some((cipher, call, fault));
        self
    }
}

impl Backend for ScriptedBackend {
    type Context = FakeContext;

    fn name(&self) -> &str {
        "scripted"
    }

    fn ciphers(&self) -> &[CipherId] {
        &self.ciphers
    }

    fn init(&self) -> BackendResult<Self::Context> {
        self.calls.borrow_mut().init += 1;
        if self.fail_init {
            return Err(BackendError::Init("no memory".to_string()));
        }
        self.live.set(self.live.get() + 1);
        Ok(FakeContext {
            active: None,
            encrypts: 0,
            live: Rc::clone(&self.live),
        })
    }

    fn free(&self, ctx: Self::Context) -> BackendResult<()> {
        self.calls.borrow_mut().free += 1;
        drop(ctx);
        Ok(())
    }

    fn random(&self, _ctx: &mut Self::Context, dst: &mut [u8]) -> BackendResult<()> {
        self.calls.borrow_mut().random += 1;
        if self.fail_random {
            return Err(BackendError::Random("entropy exhausted".to_string()));
        }
        dst.fill(0xA5);
        Ok(())
    }

    fn set_cipher(&self, ctx: &mut Self::Context, cipher: &CipherId) -> BackendResult<()> {
        self.calls.borrow_mut().set_cipher.push(cipher.to_string());
        if self.reject.contains(&cipher.as_str()) {
            return Err(BackendError::UnsupportedCipher(cipher.to_string()));
        }
        ctx.active = Some(cipher.to_string());
        ctx.encrypts = 0;
        Ok(())
    }

    fn encrypt(&self, ctx: &mut Self::Context, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        self.calls.borrow_mut().encrypt += 1;
        let active = ctx.active.as_deref().ok_or(BackendError::NoActiveCipher)?;
        ctx.encrypts += 1;

        if let Some((cipher, call, fault)) = self.encrypt_fault {
            if cipher == active && call == ctx.encrypts {
                return match fault {
                    Fault::Error => Err(BackendError::Encrypt("device lost".to_string())),
                    Fault::ZeroBytes => Ok(0),
                };
            }
        }

        dst.copy_from_slice(src);
        Ok(dst.len())
    }
}

fn engine(iterations: usize) -> Engine<StepCycles> {
    let config = BenchConfig::new(MESSAGE_SIZE, iterations).with_progress(Duration::from_millis(1), 10);
    Engine::new(config)
        .with_console(Console::Silent)
        .with_cycle_source(StepCycles::new(CYCLES_PER_CALL))
}

#[test]
fn test_one_report_per_cipher_in_order() {
    let backend = ScriptedBackend::new(&["A", "B", "C"]);
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.backend, "scripted");
    assert_eq!(summary.tick_unit, "cycle");
    let ciphers: Vec<&str> = summary.reports.iter().map(|r| r.cipher.as_str()).collect();
    assert_eq!(ciphers, ["A", "B", "C"]);

    #[allow(clippy::cast_precision_loss)]
    let expected = MESSAGE_SIZE as f64 / CYCLES_PER_CALL as f64;
    for report in &summary.reports {
        assert_eq!(report.iterations, ITERATIONS);
        assert_eq!(report.message_size, MESSAGE_SIZE);
        assert_eq!(report.statistics.samples, ITERATIONS);
        assert!((report.statistics.mean - expected).abs() < 1e-12);
        assert!(report.statistics.variance.abs() < 1e-12);
        assert!(report.wall_clock_secs >= 0.0);
    }

    let calls = backend.calls.borrow();
    assert_eq!(calls.init, 1);
    assert_eq!(calls.random, 1);
    assert_eq!(calls.free, 1);
    assert_eq!(calls.encrypt, 3 * 2 * ITERATIONS);
}

#[test]
fn test_rejected_cipher_is_skipped_and_fails_run() {
    let backend = ScriptedBackend::new(&["A", "B", "C"]).rejecting("B");
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(!summary.is_success());
    assert!(summary.report("B").is_none());
    assert!(summary.report("A").is_some());
    assert!(summary.report("C").is_some());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].stage, FailureStage::SetCipher);
    assert_eq!(backend.calls.borrow().set_cipher, ["A", "B", "C"]);
}

#[test]
fn test_wall_clock_failure_fails_run_but_continues() {
    let backend = ScriptedBackend::new(&["A", "B"]).failing_encrypt("A", 5, Fault::Error);
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(!summary.is_success());
    assert!(summary.report("A").is_none());
    assert!(summary.report("B").is_some());
    assert_eq!(summary.failures[0].cipher, "A");
    assert_eq!(summary.failures[0].stage, FailureStage::WallClockPass);
    assert_eq!(backend.calls.borrow().encrypt, 5 + 2 * ITERATIONS);
    assert_eq!(backend.calls.borrow().free, 1);
}

#[test]
fn test_cycle_pass_failure() {
    let backend =
        ScriptedBackend::new(&["A", "B"]).failing_encrypt("B", ITERATIONS + 3, Fault::Error);
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(!summary.is_success());
    assert!(summary.report("A").is_some());
    assert!(summary.report("B").is_none());
    assert_eq!(summary.failures[0].stage, FailureStage::CyclePass);
}

#[test]
fn test_zero_byte_encrypt_is_a_failure() {
    let backend = ScriptedBackend::new(&["A"]).failing_encrypt("A", 1, Fault::ZeroBytes);
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(!summary.is_success());
    assert!(summary.reports.is_empty());
    assert_eq!(summary.failures[0].stage, FailureStage::WallClockPass);
}

#[test]
fn test_zero_iterations_touches_no_backend_operation() {
    let backend = ScriptedBackend::new(&["A"]);
    let err = engine(0).run(&backend).unwrap_err();

    assert!(matches!(err, EngineError::Config(ConfigError::ZeroIterations)));
    assert_eq!(backend.calls.borrow().total(), 0);
}

#[test]
fn test_init_failure_aborts_run() {
    let mut backend = ScriptedBackend::new(&["A"]);
    backend.fail_init = true;
    let err = engine(ITERATIONS).run(&backend).unwrap_err();

    assert!(matches!(err, EngineError::Init { .. }));
    let calls = backend.calls.borrow();
    assert_eq!(calls.init, 1);
    assert_eq!(calls.free, 0);
    assert!(calls.set_cipher.is_empty());
}

#[test]
fn test_zero_ciphers_is_a_successful_run() {
    let backend = ScriptedBackend::new(&[]);
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(summary.is_success());
    assert!(summary.reports.is_empty());
    assert_eq!(backend.calls.borrow().free, 1);
}

#[test]
fn test_random_failure_is_not_fatal() {
    let mut backend = ScriptedBackend::new(&["A"]);
    backend.fail_random = true;
    let summary = engine(ITERATIONS).run(&backend).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.reports.len(), 1);
}

#[test]
fn test_teardown_releases_context_once() {
    let backend = ScriptedBackend::new(&["A", "B"]).rejecting("A");
    engine(ITERATIONS).run(&backend).unwrap();

    assert_eq!(backend.calls.borrow().free, 1);
    assert_eq!(backend.live.get(), 0);
}

#[test]
fn test_tick_unit_follows_cycle_source() {
    let backend = ScriptedBackend::new(&["A"]);
    let summary = engine(ITERATIONS)
        .with_cycle_source(cbos_bench::MonotonicClock)
        .run(&backend)
        .unwrap();
    assert_eq!(summary.tick_unit, "nanosecond");
}

#[test]
fn test_single_iteration_run() {
    let backend = ScriptedBackend::new(&["A"]);
    let summary = engine(1).run(&backend).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.reports[0].statistics.samples, 1);
}

#[test]
fn test_rustcrypto_backend_end_to_end() {
    let config = BenchConfig::new(256, 8).with_progress(Duration::from_millis(1), 10);
    let engine = Engine::new(config).with_console(Console::Silent);
    let suite = CipherSuite::new(KeySize::Aes256, CipherFamily::Modes);

    let summary = run_backend(BackendKind::RustCrypto, suite, &engine).unwrap();

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert_eq!(summary.tick_unit, CPU_TICK_UNIT);
    assert_eq!(summary.reports.len(), 6);
    for report in &summary.reports {
        assert!(report.statistics.mean.is_finite());
        assert!(report.statistics.mean > 0.0);
    }
}

#[cfg(feature = "ring")]
#[test]
fn test_ring_aes_192_is_skipped_and_fails_run() {
    let config = BenchConfig::new(64, 4).with_progress(Duration::from_millis(1), 10);
    let engine = Engine::new(config).with_console(Console::Silent);
    let suite = CipherSuite::new(KeySize::Aes192, CipherFamily::Modes);

    let summary = run_backend(BackendKind::Ring, suite, &engine).unwrap();

    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].cipher, "CHACHA20-POLY1305");
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].cipher, "AES-192-GCM");
    assert!(summary.failures[0].is_skipped());
    assert!(!summary.is_success());
}

#[test]
fn test_unavailable_backend_is_fatal() {
    let engine = engine(ITERATIONS);
    let suite = CipherSuite::default();
    for kind in BackendKind::ALL {
        if !kind.is_available() {
            let err = run_backend(kind, suite, &engine).unwrap_err();
            assert!(matches!(err, EngineError::BackendUnavailable(_)));
        }
    }
}
