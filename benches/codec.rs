use arcoder::codec::{compress_to_vec, decompress_to_vec, Options};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn sample_text(len: usize) -> Vec<u8> {
    let words = ["arithmetic ", "coding ", "interval ", "renormalize ", "model ", "bit\n"];
    words.iter().cycle().flat_map(|w| w.bytes()).take(len).collect()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("order0");
    let input = sample_text(64 * 1024);
    let options = Options::default();
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("compress", |b| b.iter(|| compress_to_vec(&input, &options).unwrap()));

    let compressed = compress_to_vec(&input, &options).unwrap();
    group.bench_function("decompress", |b| {
        b.iter(|| decompress_to_vec(&compressed, &options).unwrap())
    });

    let strict = Options { strict: true, ..Options::default() };
    group.bench_function("decompress_strict", |b| {
        b.iter(|| decompress_to_vec(&compressed, &strict).unwrap())
    });
    group.finish();
}

fn bench_precision(c: &mut Criterion) {
    let mut group = c.benchmark_group("precision");
    let input = sample_text(12 * 1024);
    for num_state_bits in [16, 32, 48] {
        let options = Options { num_state_bits, ..Options::default() };
        group.bench_function(format!("compress_{num_state_bits}"), |b| {
            b.iter(|| compress_to_vec(&input, &options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_precision);
criterion_main!(benches);
