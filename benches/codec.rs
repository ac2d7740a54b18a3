// ABOUTME: Criterion benchmarks for the hot codec paths
// ABOUTME: submit_sm encode/decode and GSM 03.38 text conversion

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use esmpp::codec::CodecOptions;
use esmpp::text::gsm7;
use esmpp::{Pdu, PduBody, PhoneNumber, SubmitSm};

fn sample_submit() -> Pdu {
    let submit = SubmitSm::new(
        PhoneNumber::international("38164111222").unwrap(),
        PhoneNumber::international("38164333444").unwrap(),
        "The quick brown fox jumps over the lazy dog 0123456789",
        "bench",
    );
    Pdu {
        command_status: esmpp::CommandStatus::Ok,
        sequence_number: 42,
        body: PduBody::SubmitSm(Box::new(SubmitSm {
            log_id: String::new(),
            ..submit
        })),
    }
}

fn submit_sm_encode(c: &mut Criterion) {
    let options = CodecOptions::default();
    let pdu = sample_submit();
    c.bench_function("submit_sm_encode", |b| {
        b.iter(|| black_box(&pdu).to_bytes(&options).unwrap())
    });
}

fn submit_sm_decode(c: &mut Criterion) {
    let options = CodecOptions::default();
    let bytes = sample_submit().to_bytes(&options).unwrap();
    c.bench_function("submit_sm_decode", |b| {
        b.iter(|| Pdu::decode(black_box(&bytes), &options).unwrap())
    });
}

fn gsm7_encode(c: &mut Criterion) {
    let text = "Ringing in results {with extensions} for €9.99";
    c.bench_function("gsm7_encode", |b| {
        b.iter(|| gsm7::encode(black_box(text), false).unwrap())
    });
    c.bench_function("gsm7_encode_packed", |b| {
        b.iter(|| gsm7::encode_packed(black_box(text), false).unwrap())
    });
}

criterion_group!(benches, submit_sm_encode, submit_sm_decode, gsm7_encode);
criterion_main!(benches);
