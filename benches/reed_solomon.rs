use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_barcode::decoder::reed_solomon::{ReedSolomonDecoder, encode};

/// Version 40-H sized block: 15 data and 30 EC codewords
fn block() -> Vec<u8> {
    let data: Vec<u8> = (0..15u8).map(|i| i.wrapping_mul(37).wrapping_add(11)).collect();
    let mut block = data.clone();
    block.extend(encode(&data, 30));
    block
}

fn bench_rs_encode(c: &mut Criterion) {
    let data: Vec<u8> = (0..120u8).collect();
    c.bench_function("rs_encode_120_data_30_ec", |b| {
        b.iter(|| encode(black_box(&data), black_box(30)))
    });
}

fn bench_rs_decode_clean(c: &mut Criterion) {
    let clean = block();
    let decoder = ReedSolomonDecoder::new(30);
    c.bench_function("rs_decode_clean", |b| {
        b.iter(|| {
            let mut received = clean.clone();
            decoder.decode(black_box(&mut received))
        })
    });
}

fn bench_rs_decode_errors(c: &mut Criterion) {
    let clean = block();
    let decoder = ReedSolomonDecoder::new(30);
    let mut group = c.benchmark_group("rs_decode_errors");
    for errors in [1usize, 5, 15] {
        let mut damaged = clean.clone();
        for i in 0..errors {
            damaged[i * 3] ^= 0x5a;
        }
        group.bench_function(format!("{errors}"), |b| {
            b.iter(|| {
                let mut received = damaged.clone();
                decoder.decode(black_box(&mut received))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rs_encode,
    bench_rs_decode_clean,
    bench_rs_decode_errors
);
criterion_main!(benches);
