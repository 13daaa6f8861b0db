//! ビット演算プリミティブのベンチマーク
//!
//! 目的: `popcount` / `find_first_set` の命令版とポータブル版の速度差を比較する。
//!
//! ## 実行方法
//!
//! ```powershell
//! cargo bench --bench bits_bench
//! cargo bench --bench bits_bench --no-default-features
//! ```

use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sketching::domain::bits::portable;
use sketching::{find_first_set, popcount};

const WORDS: usize = 4096;

fn ci_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
}

fn random_words() -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(0xB175);
    (0..WORDS).map(|_| rng.next_u64()).collect()
}

fn bench_popcount(c: &mut Criterion) {
    let mut group = c.benchmark_group("popcount");
    let words = random_words();

    group.bench_function("selected_4096", |b| {
        b.iter(|| black_box(&words).iter().map(|&w| popcount(w)).sum::<u32>())
    });

    group.bench_function("portable_4096", |b| {
        b.iter(|| {
            black_box(&words)
                .iter()
                .map(|&w| portable::popcount(w))
                .sum::<u32>()
        })
    });

    group.finish();
}

fn bench_find_first_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_first_set");
    let words = random_words();
    // high-bit words are the portable loop's worst case
    let high: Vec<u64> = words.iter().map(|&w| w & 0xFFFF_0000_0000_0000).collect();

    group.bench_function("selected_4096", |b| {
        b.iter(|| black_box(&words).iter().map(|&w| find_first_set(w)).sum::<u32>())
    });

    group.bench_function("portable_4096", |b| {
        b.iter(|| {
            black_box(&words)
                .iter()
                .map(|&w| portable::find_first_set(w))
                .sum::<u32>()
        })
    });

    group.bench_function("portable_high_bits_4096", |b| {
        b.iter(|| {
            black_box(&high)
                .iter()
                .map(|&w| portable::find_first_set(w))
                .sum::<u32>()
        })
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = ci_criterion();
    targets =
        bench_popcount,
        bench_find_first_set,
}

criterion_main!(benches);
