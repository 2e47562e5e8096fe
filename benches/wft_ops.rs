//! Benchmarks for formula parsing and node interning.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use semnet::wft;
use semnet::{Network, NetworkConfig};

const RULE: &str = "Impl(setof(Isa(every(x, Isa(x, Dog)), Pet), Isa(x, Animal)), \
                    Or(Isa(x, Mammal), Not(And(Isa(x, Fish), Isa(x, Bird)))))";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_rule", |bench| {
        bench.iter(|| black_box(wft::parse(black_box(RULE)).unwrap()))
    });
}

fn bench_intern_hit(c: &mut Criterion) {
    let mut net = Network::new(NetworkConfig::default()).unwrap();
    net.assert_wft(RULE, true).unwrap();

    c.bench_function("assert_existing_rule", |bench| {
        bench.iter(|| black_box(net.assert_wft(RULE, true).unwrap()))
    });
}

fn bench_intern_fresh(c: &mut Criterion) {
    let mut net = Network::new(NetworkConfig::default()).unwrap();
    let mut n = 0u64;

    c.bench_function("assert_fresh_conjunction", |bench| {
        bench.iter(|| {
            n += 1;
            let text = format!("And(Isa(Dog{n}, Animal), Isa(Cat{n}, Animal))");
            black_box(net.assert_wft(&text, false).unwrap())
        })
    });
}

criterion_group!(benches, bench_parse, bench_intern_hit, bench_intern_fresh);
criterion_main!(benches);
