//! In-process transport for unit tests: scripted responses, a request log
//! and a peak-concurrency counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::transport::{Request, Response, Transport, TransportError};

type Handler = dyn Fn(&Request) -> Result<Response, TransportError> + Send + Sync;

pub struct MockTransport {
    handler: Box<Handler>,
    delay: Duration,
    log: Mutex<Vec<Request>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            log: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Hold every call for `delay` so overlapping calls are observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    /// Values of `key` across all logged requests, in call order.
    pub fn param_values(&self, key: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.param_value(key).map(str::to_string))
            .collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn call(&self, request: &Request) -> Result<Response, TransportError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.log.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let out = (self.handler)(request);
        self.active.fetch_sub(1, Ordering::SeqCst);
        out
    }
}
