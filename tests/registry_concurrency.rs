// tests/registry_concurrency.rs
//
// N concurrent first accesses must run the expensive construction exactly once
// and hand every caller the same instance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use fraud_risk_pipeline::error::{PipelineError, Result};
use fraud_risk_pipeline::models::{
    HashingEncoder, LogisticClassifier, ModelLoader, SharedClassifier, SharedEncoder,
};
use fraud_risk_pipeline::registry::ModelRegistry;

#[derive(Default)]
struct SlowCountingLoader {
    behavior: AtomicUsize,
    text: AtomicUsize,
    encoder: AtomicUsize,
}

impl ModelLoader for SlowCountingLoader {
    fn load_behavior(&self) -> Result<SharedClassifier> {
        self.behavior.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Ok(Arc::new(LogisticClassifier::new(0.0, vec![0.1; 5])))
    }
    fn load_text(&self) -> Result<SharedClassifier> {
        self.text.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(Arc::new(LogisticClassifier::new(0.0, vec![0.1; 32])))
    }
    fn load_encoder(&self) -> Result<SharedEncoder> {
        self.encoder.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(Arc::new(HashingEncoder::new(32)))
    }
}

#[test]
fn concurrent_first_access_constructs_once() {
    const N: usize = 16;
    let loader = Arc::new(SlowCountingLoader::default());
    let registry = Arc::new(ModelRegistry::new(loader.clone()));
    let barrier = Arc::new(Barrier::new(N));

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.behavior_classifier().expect("load")
            })
        })
        .collect();

    let instances: Vec<SharedClassifier> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(loader.behavior.load(Ordering::SeqCst), 1);
    for inst in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], inst));
    }
}

#[test]
fn each_resource_has_its_own_slot() {
    let loader = Arc::new(SlowCountingLoader::default());
    let registry = ModelRegistry::new(loader.clone());

    for _ in 0..3 {
        registry.warm_up().unwrap();
        registry.text_classifier().unwrap();
        registry.embedding_encoder().unwrap();
    }

    assert_eq!(loader.behavior.load(Ordering::SeqCst), 1);
    assert_eq!(loader.text.load(Ordering::SeqCst), 1);
    assert_eq!(loader.encoder.load(Ordering::SeqCst), 1);
    assert!(registry.is_ready());
}

struct AlwaysFails(AtomicUsize);

impl ModelLoader for AlwaysFails {
    fn load_behavior(&self) -> Result<SharedClassifier> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(PipelineError::ResourceUnavailable {
            resource: "behavior_classifier",
            reason: "no file".into(),
        })
    }
    fn load_text(&self) -> Result<SharedClassifier> {
        self.load_behavior()
    }
    fn load_encoder(&self) -> Result<SharedEncoder> {
        Ok(Arc::new(HashingEncoder::new(4)))
    }
}

#[test]
fn failures_are_retried_on_every_call() {
    let loader = Arc::new(AlwaysFails(AtomicUsize::new(0)));
    let registry = ModelRegistry::new(loader.clone());

    for _ in 0..3 {
        let err = registry.behavior_classifier().err().expect("should fail");
        assert_eq!(err.kind(), "resource_unavailable");
    }
    assert_eq!(loader.0.load(Ordering::SeqCst), 3);
    assert!(!registry.is_ready());
}
