//! Shared helpers for integration tests.

#![allow(dead_code)]

use botmeter::{Clock, CounterStore, FileBackend, UsageMeter};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Clock the test moves by hand.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Arc<Self> {
        Arc::new(Self {
            now: RwLock::new(Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()),
        })
    }

    pub fn set(&self, y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) {
        *self.now.write().unwrap() = Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap();
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

pub async fn open_meter(path: &Path, clock: Arc<ManualClock>) -> UsageMeter {
    let store = CounterStore::open(Box::new(FileBackend::new(path))).await;
    UsageMeter::new(store, clock)
}
