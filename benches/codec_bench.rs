use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linked_strmap::{map_from_bytes, map_to_bytes, DataMap, Value};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// 1k records, each a small map of mixed scalars, strings and an int array.
fn records() -> DataMap {
    let mut root = DataMap::with_capacity(1_000);
    for (i, x) in lcg(42).take(1_000).enumerate() {
        let mut rec = DataMap::new();
        rec.put("id", x as i64);
        rec.put("name", format!("record-{i}"));
        rec.put("score", (x % 1000) as f64 / 10.0);
        rec.put("active", x % 3 == 0);
        rec.put("samples", (0..16).map(|j| (x >> j) as i32).collect::<Vec<i32>>());
        root.put(format!("r{:016x}", x), Value::Map(rec));
    }
    root
}

fn bench_codec(c: &mut Criterion) {
    let root = records();
    let bytes = map_to_bytes(&root).expect("encode");

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode_1k_records", |b| {
        b.iter(|| black_box(map_to_bytes(&root).expect("encode")))
    });
    group.bench_function("decode_1k_records", |b| {
        b.iter(|| black_box(map_from_bytes(&bytes).expect("decode")))
    });
    group.finish();
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_codec
}
criterion_main!(benches);
