//! Demonstration driver: three worker threads generate synthetic
//! workloads under spans and the resulting trace lands in one file.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sum_u32(rng: &mut StdRng) -> u32 {
    let _span = tracevent::span_fn!();
    let mut v: u32 = 0;
    for _ in 0..1_000_000 {
        v = v.wrapping_add(rng.gen());
    }
    v
}

fn sum_u64(rng: &mut StdRng) -> u64 {
    let _span = tracevent::span_fn!();
    let mut v: u64 = 0;
    for _ in 0..1_000_000 {
        v = v.wrapping_add(rng.gen());
    }
    v
}

/// Sleeps briefly and bails out early; the early return still closes the
/// span through the guard.
fn nap(rounds: u32) {
    let _span = tracevent::span_fn!();
    for i in 0..rounds {
        if i == 2 {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn worker(id: i64) {
    tracevent::thread::init(id);
    let mut rng = StdRng::seed_from_u64(id as u64);

    match id {
        1 => {
            for _ in 0..10 {
                sum_u32(&mut rng);
            }
        }
        2 => {
            for _ in 0..10 {
                sum_u64(&mut rng);
            }
        }
        _ => nap(10),
    }

    tracevent::thread::terminate();
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "trace.json".to_string());
    tracevent::init(&path).context("unable to start trace session")?;

    {
        let _span = tracevent::span("spawn_workers");
        let workers: Vec<_> = (1..=3)
            .map(|id| thread::spawn(move || worker(id)))
            .collect();
        for handle in workers {
            handle.join().expect("worker panicked");
        }
    }

    tracevent::terminate().context("unable to finish trace")?;
    log::info!("trace written to {path}");
    Ok(())
}
