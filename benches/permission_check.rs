use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use std::fs;

use filebox::{Filebox, Permission, PermissionMode};

fn bench_permission_check(c: &mut Criterion) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fb = Filebox::new(tmp.path());
    let nobody: [&str; 0] = [];
    for name in ["open.csv", "locked.csv", "shared/silent.csv", "shared/own.csv"] {
        let p = tmp.path().join(name);
        fs::create_dir_all(p.parent().expect("parent")).expect("mkdir");
        fs::write(p, b"ID,Name\n").expect("seed");
    }
    fb.access_file("locked.csv", nobody)
        .set_permission(&Permission::allow(PermissionMode::Read, ["admin"]))
        .expect("file meta");
    fb.access_dir("shared", nobody)
        .set_permission(&Permission::allow(PermissionMode::Crud, ["admin", "manager"]).and_deny(PermissionMode::Update, ["manager"]))
        .expect("dir meta");
    fb.access_file("shared/own.csv", nobody)
        .set_permission(&Permission::allow(PermissionMode::Read, ["manager"]))
        .expect("file meta");

    let mut group = c.benchmark_group("check_permission");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(50);

    // no sidecars at all, file sidecar only, directory fallback, file override
    for path in ["open.csv", "locked.csv", "shared/silent.csv", "shared/own.csv"] {
        group.bench_with_input(BenchmarkId::new("read_as_manager", path), &path, |b, &path| {
            b.iter(|| {
                let f = fb.access_file(path, ["manager"]);
                criterion::black_box(f.check_permission(PermissionMode::Read));
            });
        });
    }

    // In-memory evaluation without disk access
    let perm = Permission::allow(PermissionMode::Crud, ["admin", "manager", "staff"])
        .and_deny(PermissionMode::Update, ["contractor"]);
    let roles = ["contractor", "staff"];
    group.bench_function("has_permission_in_memory", |b| {
        b.iter(|| criterion::black_box(perm.allows_any(PermissionMode::Update, &roles)));
    });
    group.finish();
}

criterion_group!(benches, bench_permission_check);
criterion_main!(benches);
