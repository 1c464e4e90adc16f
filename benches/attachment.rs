use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ltecomp::attachment::{AttachmentMode, attach};
use ltecomp::topology::{TopologyParams, generate_topology};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn bench_attachment(c: &mut Criterion) {
    let topo = generate_topology(&TopologyParams::new(100.0, 50.0, 1_000), &mut StdRng::seed_from_u64(1));

    c.bench_function("nearest 4x1000", |b| {
        b.iter(|| attach(black_box(&topo.groups), black_box(&topo.cells), AttachmentMode::Nearest))
    });
    c.bench_function("static 4x1000", |b| {
        b.iter(|| attach(black_box(&topo.groups), black_box(&topo.cells), AttachmentMode::Static))
    });
}

criterion_group!(benches, bench_attachment);
criterion_main!(benches);
