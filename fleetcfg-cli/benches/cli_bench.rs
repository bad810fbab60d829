use std::fs;
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

/// A source tree with `count` components in one group of `prod`.
fn source_tree(count: usize) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let names: Vec<String> = (0..count).map(|i| format!("svc{i}")).collect();
    fs::create_dir_all(dir.path().join("envs")).expect("failed to create envs dir");
    fs::write(
        dir.path().join("envs/prod.yaml"),
        format!(
            "portOffset: 100\ncore:\n  ip: 10.0.0.5\n  components: [{}]\n",
            names.join(", ")
        ),
    )
    .expect("failed to write descriptor");

    for name in &names {
        let folder = dir.path().join("components").join(name);
        fs::create_dir_all(&folder).expect("failed to create component folder");
        fs::write(
            folder.join("application.yaml"),
            "port: ${portOffset}0${order}\nhost: ${ip}\nurl: http://${host}:${port}/\n",
        )
        .expect("failed to write source");
    }
    dir
}

fn fleetcfg(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fleetcfg").expect("failed to locate fleetcfg binary");
    cmd.arg("--root")
        .arg(root.path())
        .arg("--dest")
        .arg(root.path().join("out"))
        .env("HOME", root.path());
    cmd
}

fn bench_cli_startup(c: &mut Criterion) {
    c.bench_function("cli_startup_version", |b| {
        b.iter(|| {
            let mut cmd = Command::cargo_bin("fleetcfg").expect("failed to locate fleetcfg binary");
            let output = cmd.arg("--version").output().expect("failed to run fleetcfg");
            black_box(output);
        });
    });
}

fn bench_cli_build(c: &mut Criterion) {
    c.bench_function("cli_build_50_components", |b| {
        b.iter_batched(
            || source_tree(50),
            |root| {
                let status = fleetcfg(&root)
                    .args(["--quiet", "build", "prod"])
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .expect("failed to execute fleetcfg build");
                black_box(status.success());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_cli_show(c: &mut Criterion) {
    let root = source_tree(10);
    c.bench_function("cli_show", |b| {
        b.iter(|| {
            let output = fleetcfg(&root)
                .args(["show", "svc9", "prod", "--format", "json"])
                .output()
                .expect("failed to execute fleetcfg show");
            black_box(output);
        });
    });
}

criterion_group!(cli_benches, bench_cli_startup, bench_cli_build, bench_cli_show);
criterion_main!(cli_benches);
