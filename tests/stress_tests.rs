//! Stress tests for the admission gate and the registry
//!
//! These tests hammer shared state from many threads. No real processes are
//! started; a mock runner stands in for the container CLI.

use coderun::execution::{MockOutput, MockRunner};
use coderun::{Config, Registry, Request, Runner, Semaphore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn config(pool_size: usize) -> Config {
    let cfg = serde_json::json!({
        "pool_size": pool_size,
        "box": {"cpu": 1, "memory": 64, "network": "none", "volume": "%s:/sandbox:ro", "nproc": 64},
        "step": {"user": "sandbox", "action": "run", "timeout": 3, "noutput": 4096},
        "boxes": {"python": {"image": "codapi/python"}},
        "commands": {
            "python": {
                "run": {
                    "engine": "docker",
                    "entry": "main.py",
                    "steps": [{"box": "python", "command": ["python", "main.py"]}]
                }
            }
        }
    });
    let mut cfg: Config = serde_json::from_value(cfg).unwrap();
    cfg.apply_defaults();
    cfg
}

fn request(i: usize) -> Request {
    let mut req = Request {
        sandbox: "python".to_string(),
        command: "run".to_string(),
        ..Default::default()
    };
    req.files.insert("", format!("print({})", i));
    req.generate_id();
    req
}

/// Test that held slots never exceed capacity under contention
#[test]
fn stress_semaphore_contention() {
    let sem = Arc::new(Semaphore::new(4));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let sem = Arc::clone(&sem);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..500 {
                    if let Ok(_permit) = sem.try_acquire() {
                        peak.fetch_max(sem.held(), Ordering::SeqCst);
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(sem.held(), 0);
}

/// Test that spurious releases never raise capacity
#[test]
fn stress_release_storm() {
    let sem = Semaphore::new(3);
    for _ in 0..1000 {
        sem.release();
    }
    for _ in 0..3 {
        sem.acquire().unwrap();
    }
    assert!(sem.acquire().is_err());
}

/// Test concurrent executions: every request either runs or is busy
#[test]
fn stress_concurrent_exec() {
    let runner = Arc::new(MockRunner::new().with("docker run", MockOutput::stdout("ok")));
    let dyn_runner: Arc<dyn Runner> = runner.clone();
    let reg = Arc::new(Registry::from_config(config(4), dyn_runner).unwrap());
    let ok = Arc::new(AtomicUsize::new(0));
    let busy = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let reg = Arc::clone(&reg);
            let ok = Arc::clone(&ok);
            let busy = Arc::clone(&busy);
            thread::spawn(move || {
                for i in 0..20 {
                    let out = reg.exec(&request(t * 100 + i));
                    if out.ok {
                        assert_eq!(out.stdout, "ok");
                        ok.fetch_add(1, Ordering::SeqCst);
                    } else {
                        assert_eq!(out.stderr, "busy: try again later");
                        busy.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ok = ok.load(Ordering::SeqCst);
    assert_eq!(ok + busy.load(Ordering::SeqCst), 16 * 20);
    assert!(ok > 0);
    assert_eq!(runner.lines().len(), ok);
    assert_eq!(reg.semaphore().held(), 0);
}

/// Test many sequential executions reuse slots
#[test]
fn stress_sequential_exec() {
    let dyn_runner: Arc<dyn Runner> = Arc::new(MockRunner::new());
    let reg = Registry::from_config(config(1), dyn_runner).unwrap();
    for i in 0..100 {
        assert!(reg.exec(&request(i)).ok);
    }
    assert_eq!(reg.semaphore().held(), 0);
}
