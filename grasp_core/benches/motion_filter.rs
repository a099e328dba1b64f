use std::time::{Duration, Instant};

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use grasp_core::filter::FilterParams;
use grasp_core::{ControllerCfg, MotionFilter, radius};
use grasp_traits::JointSample;

// Closing fingers with a little positional jitter, 1 kHz
fn synth_samples(n: usize, seed: u64) -> Vec<JointSample> {
    let mut state = seed.max(1);
    let mut jitter = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state = x;
        ((x >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 0.002
    };
    let t0 = Instant::now();
    (0..n)
        .map(|i| {
            let t = i as f64 / 1000.0;
            let mut position = [0.0; 8];
            let mut velocity = [0.0; 8];
            for j in 2..8 {
                let p = (t * 1.5).min(1.2);
                position[j] = p + jitter();
                velocity[j] = if p < 1.2 { 1.5 } else { 0.0 };
            }
            JointSample {
                stamp: t0 + Duration::from_millis(i as u64),
                position,
                velocity,
            }
        })
        .collect()
}

pub fn bench_ingest(c: &mut Criterion) {
    let mut g = c.benchmark_group("motion_filter");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    } else {
        g.sample_size(50);
    }

    let samples = synth_samples(5_000, 0xC0FFEE);
    for min_ms in [50u64, 100, 400] {
        let cfg = ControllerCfg {
            min_static_duration: Duration::from_millis(min_ms),
            ..ControllerCfg::default()
        };
        let params = FilterParams::from(&cfg);
        g.bench_function(format!("ingest_window_{min_ms}ms"), |b| {
            b.iter_batched(
                || MotionFilter::new(params),
                |mut f| {
                    for s in &samples {
                        let _ = f.ingest(black_box(s), s.stamp);
                    }
                    black_box(f.done_moving().as_array());
                },
                BatchSize::SmallInput,
            )
        });
    }

    g.bench_function("radius", |b| {
        b.iter(|| black_box(radius(black_box(0.9), black_box(0.3))))
    });
    g.finish();
}

criterion_group!(motion_filter, bench_ingest);
criterion_main!(motion_filter);
