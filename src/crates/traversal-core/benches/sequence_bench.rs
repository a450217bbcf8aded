use criterion::{black_box, criterion_group, criterion_main, Criterion};
use traversal_core::{
    BoundRef, CompiledTraversal, Direction, ElementKind, Operand, Predicate, Step, StepSequence,
    Test, WalkTarget,
};

fn walk(depth: usize) -> StepSequence {
    let mut steps = StepSequence::new().append(Step::SelectAll {
        kind: ElementKind::Vertex,
    });
    for _ in 0..depth {
        steps = steps
            .append(Step::Traverse {
                direction: Direction::Both,
                edge_labels: vec!["Knows".to_string()],
                target: WalkTarget::Vertices,
            })
            .append(Step::Where {
                predicate: Predicate::has("zip_code", Test::within(["10001", "10199"])),
            });
    }
    steps
}

fn sequence_append_benchmark(c: &mut Criterion) {
    let base = walk(50);

    c.bench_function("sequence append", |b| {
        b.iter(|| black_box(&base).append(Step::Limit { count: 1 }));
    });

    c.bench_function("sequence build 100", |b| {
        b.iter(|| walk(black_box(50)));
    });
}

fn compile_benchmark(c: &mut Criterion) {
    let correlated = StepSequence::new().append(Step::Fold).append(Step::Bind {
        name: "_a".to_string(),
        continuation: walk(10).append(Step::Where {
            predicate: !Predicate::is(Test::Within(Operand::Bound(BoundRef::named("_a")))),
        }),
    });

    c.bench_function("compile correlated", |b| {
        b.iter(|| CompiledTraversal::new(black_box(correlated.clone())).unwrap());
    });

    let compiled = CompiledTraversal::new(walk(50)).unwrap();
    c.bench_function("compile to json", |b| {
        b.iter(|| black_box(&compiled).to_json().unwrap());
    });
}

criterion_group!(benches, sequence_append_benchmark, compile_benchmark);
criterion_main!(benches);
