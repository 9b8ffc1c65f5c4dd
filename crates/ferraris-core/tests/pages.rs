//! Ticks in, pages out: the full path from reflectance samples to rendered
//! responses through the shared meter.

use ferraris_core::pages::{self, Status};
use ferraris_core::sensor::{HeldSensor, ReflectanceSensor, Sample, SensorError};
use ferraris_core::{MeterConfig, MeterEngine, SharedMeter};

/// Disc turning once every `period` ticks with a 30-tick stripe; every
/// 50th read fails.
struct Disc {
    period: u32,
    t: u32,
}

impl ReflectanceSensor for Disc {
    fn sample(&mut self) -> Result<Sample, SensorError> {
        let t = self.t;
        self.t += 1;
        if t % 50 == 49 {
            return Err(SensorError::NotReady);
        }
        Ok(if t % self.period < 30 { 980 } else { 150 })
    }
}

fn meter(ticks_per_minute: u32) -> SharedMeter {
    let config = MeterConfig {
        ticks_per_minute,
        ..MeterConfig::DEFAULT
    };
    SharedMeter::new(MeterEngine::new(config).unwrap())
}

#[test]
fn test_now_page_tracks_engine() {
    let meter = meter(60_000);
    let mut sensor = HeldSensor::new(Disc { period: 10_000, t: 0 }, 0);

    for _ in 0..20_001 {
        meter.tick(sensor.sample());
    }

    let response = pages::handle(b"GET /now HTTP/1.0\r\n\r\n", &meter);
    assert_eq!(response.status, Status::Ok);
    assert!(
        response.body.contains("<pre>\n960</pre>"),
        "unexpected body: {}",
        response.body
    );
    assert_eq!(sensor.failures(), 400);
}

#[test]
fn test_minute_pages_show_committed_counts() {
    let meter = meter(1_000);
    let mut sensor = HeldSensor::new(Disc { period: 250, t: 0 }, 0);

    // Three minutes at four rotations each
    for _ in 0..3_000 {
        meter.tick(sensor.sample());
    }

    let body = pages::handle(b"GET /min0.htm HTTP/1.1\r\n\r\n", &meter).body;
    assert!(body.contains("\n#0:4\n#1:4\n#2:4\n#3:0\n"), "unexpected body: {}", body);

    let body = pages::handle(b"GET /min1.htm HTTP/1.1\r\n\r\n", &meter).body;
    assert!(body.contains("\n#60:0\n"));

    // The snapshot taken for a page is the one the pages render
    let snapshot = meter.snapshot();
    let from_snapshot = pages::handle(b"GET /min0 HTTP/1.0\r\n", &snapshot).body;
    assert_eq!(from_snapshot, pages::handle(b"GET /min0 HTTP/1.0\r\n", &meter).body);
}

#[test]
fn test_queries_do_not_mutate_engine() {
    let meter = meter(1_000);
    for t in 0..1_500u32 {
        meter.tick(if t % 100 < 5 { 1000 } else { 0 });
    }
    let before = meter.snapshot();

    for raw in [
        &b"GET / HTTP/1.0\r\n"[..],
        b"GET /now HTTP/1.0\r\n",
        b"GET /min0 HTTP/1.0\r\n",
        b"GET /min1 HTTP/1.0\r\n",
        b"GET /wlcm HTTP/1.0\r\n",
        b"GET /nope HTTP/1.0\r\n",
        b"DELETE /now HTTP/1.0\r\n",
    ] {
        pages::handle(raw, &meter);
    }

    assert_eq!(meter.snapshot(), before);
}
