//! Concurrent readers against a ticking writer must only ever observe
//! whole-tick states of the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ferraris_core::config::HISTORY_MINUTES;
use ferraris_core::{MeterConfig, MeterEngine, MeterSnapshot, SharedMeter};

const TICKS_PER_MINUTE: u32 = 1_000;
const TOTAL_TICKS: u32 = 300_000;
const READERS: usize = 3;

fn config() -> MeterConfig {
    MeterConfig {
        ticks_per_minute: TICKS_PER_MINUTE,
        ..MeterConfig::DEFAULT
    }
}

/// Disc with two markings of different width per 1_337-tick revolution pair,
/// so consecutive intervals (and usage values) keep changing.
fn sample(t: u32) -> u16 {
    let phase = t % 1_337;
    if phase < 9 || (600..604).contains(&phase) {
        1000
    } else {
        120
    }
}

/// Ground truth from a single-threaded replay
struct Expected {
    /// Indexed by clock tick: state after that many ticks
    usage: Vec<u32>,
    pulses: Vec<u32>,
    /// Every usage value the engine passes through, sorted
    usage_values: Vec<u32>,
    /// Rotations committed for each minute since boot
    minutes: Vec<u16>,
}

impl Expected {
    fn replay() -> Self {
        let mut engine = MeterEngine::new(config()).unwrap();
        let mut usage = vec![0];
        let mut pulses = vec![0];
        let mut minutes = Vec::new();

        for t in 0..TOTAL_TICKS {
            let outcome = engine.tick(sample(t));
            if let Some(committed) = outcome.committed {
                minutes.push(committed.rotations);
            }
            let snapshot = engine.snapshot();
            usage.push(snapshot.usage_watts);
            pulses.push(snapshot.total_pulses);
        }

        let mut usage_values = usage.clone();
        usage_values.sort_unstable();
        usage_values.dedup();

        Self {
            usage,
            pulses,
            usage_values,
            minutes,
        }
    }

    fn check(&self, snapshot: &MeterSnapshot) {
        let n = snapshot.clock_ticks as usize;
        let committed = snapshot.minutes_committed();

        assert_eq!(
            committed * TICKS_PER_MINUTE + snapshot.ticks_this_minute,
            snapshot.clock_ticks,
            "minute commit and counter reset observed apart"
        );
        assert_eq!(snapshot.minute_index(), committed as usize % HISTORY_MINUTES);
        assert_eq!(snapshot.usage_watts, self.usage[n], "usage at tick {}", n);
        assert_eq!(snapshot.total_pulses, self.pulses[n], "pulses at tick {}", n);

        for (slot, &count) in snapshot.history.slots().iter().enumerate() {
            let latest_minute = (0..committed as usize)
                .rev()
                .find(|m| m % HISTORY_MINUTES == slot);
            let expected = latest_minute.map_or(0, |m| self.minutes[m]);
            assert_eq!(count, expected, "slot {} at tick {}", slot, n);
        }
    }
}

#[test]
fn test_concurrent_reads_never_tear() {
    let expected = Expected::replay();
    let meter = SharedMeter::new(MeterEngine::new(config()).unwrap());
    let done = AtomicBool::new(false);

    let reads: usize = thread::scope(|s| {
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                s.spawn(|| {
                    let mut reads = 0usize;
                    loop {
                        expected.check(&meter.snapshot());
                        // The narrow accessors take their own critical section
                        let watts = meter.current_usage();
                        assert!(expected.usage_values.binary_search(&watts).is_ok());
                        reads += 1;
                        if done.load(Ordering::Acquire) {
                            break reads;
                        }
                    }
                })
            })
            .collect();

        for t in 0..TOTAL_TICKS {
            meter.tick(sample(t));
            if t % 4_096 == 0 {
                thread::yield_now();
            }
        }
        done.store(true, Ordering::Release);

        readers.into_iter().map(|r| r.join().unwrap()).sum()
    });

    assert!(reads >= READERS, "every reader took at least one snapshot");

    let last = meter.snapshot();
    expected.check(&last);
    assert_eq!(last.clock_ticks, TOTAL_TICKS);
    assert_eq!(last.minutes_committed(), TOTAL_TICKS / TICKS_PER_MINUTE);
}
