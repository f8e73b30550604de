use criterion::{Criterion, black_box, criterion_group, criterion_main};
use html2wt::{SerializerConfig, serialize};
use wt2html::perf_fixtures::make_list;
use wt2html::{DsrOptions, compute_dsr};
use wtdom::{Diagnostics, Document};

const SMALL_ITEMS: usize = 64;
const LARGE_ITEMS: usize = 5_000;

fn annotated_list(items: usize) -> (String, Document) {
    let (source, mut doc) = make_list(items);
    let mut diagnostics = Diagnostics::new();
    compute_dsr(&mut doc, source.len(), &DsrOptions::default(), &mut diagnostics);
    (source, doc)
}

fn bench_mode(c: &mut Criterion, name: &str, items: usize, config: SerializerConfig) {
    let (source, doc) = annotated_list(items);
    c.bench_function(name, |b| {
        b.iter(|| {
            let out = serialize(black_box(&doc), Some(&source), &config);
            black_box(out.map(|o| o.wikitext.len()).unwrap_or(0));
        });
    });
}

fn bench_serialize_normal(c: &mut Criterion) {
    bench_mode(c, "bench_serialize_normal_small", SMALL_ITEMS, SerializerConfig::default());
    bench_mode(c, "bench_serialize_normal_large", LARGE_ITEMS, SerializerConfig::default());
}

fn bench_serialize_selser(c: &mut Criterion) {
    bench_mode(c, "bench_serialize_selser_large", LARGE_ITEMS, SerializerConfig::selser());
}

fn bench_serialize_rt_test(c: &mut Criterion) {
    bench_mode(c, "bench_serialize_rt_test_large", LARGE_ITEMS, SerializerConfig::rt_test());
}

criterion_group!(
    benches,
    bench_serialize_normal,
    bench_serialize_selser,
    bench_serialize_rt_test
);
criterion_main!(benches);
