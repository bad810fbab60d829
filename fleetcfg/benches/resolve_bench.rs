use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fleetcfg::resolve::{contains_placeholder, Placeholder};
use fleetcfg::{Session, SessionOptions};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

fn bench_placeholder_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholder");

    group.bench_function("contains_plain", |b| {
        b.iter(|| contains_placeholder(black_box("jdbc:postgresql://db.internal:5432/billing")));
    });

    group.bench_function("contains_placeholder", |b| {
        b.iter(|| contains_placeholder(black_box("http://${billing@host}:${billing@port}/")));
    });

    group.bench_function("parse_simple", |b| {
        b.iter(|| Placeholder::parse(black_box("portOffset")));
    });

    group.bench_function("parse_qualified_with_default", |b| {
        b.iter(|| Placeholder::parse(black_box("billing[prod]@db.url:jdbc:h2:mem")));
    });

    group.finish();
}

/// A source tree with one component whose keys form a chain of `depth`
/// references ending in a literal.
fn chain_tree(depth: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("components/chain");
    fs::create_dir_all(&folder).unwrap();
    fs::create_dir_all(dir.path().join("envs")).unwrap();
    fs::write(
        dir.path().join("envs/prod.yaml"),
        "portOffset: 100\ncore:\n  ip: 10.0.0.5\n  components: [chain]\n",
    )
    .unwrap();

    let mut source = String::new();
    for i in 0..depth {
        writeln!(source, "k{i}=${{k{}}}-${{portOffset}}", i + 1).unwrap();
    }
    writeln!(source, "k{depth}=leaf").unwrap();
    fs::write(folder.join("application.properties"), source).unwrap();
    dir
}

fn bench_session_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_component");

    for depth in [1, 10, 50] {
        let dir = chain_tree(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                // Fresh session per iteration so caches start cold
                let options = SessionOptions::new(dir.path(), dir.path().join("out"))
                    .with_user_home("/home/fleet");
                let session = Session::new(options).unwrap();
                let component = session.component("prod", "chain").unwrap();
                let app = session.config_type("app").unwrap();
                black_box(session.resolved_properties(&component, app, "prod").unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_placeholder_parsing, bench_session_resolution);
criterion_main!(benches);
