use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

use webflow_deploy::copier::copy_directory;
use webflow_deploy::staging::{mark_component_files, mark_component_name};

const COMPONENT: &str = r#"import { declareComponent } from "@webflow/react";
import { Card } from "./Card";

export default declareComponent(Card, {
  name: "Card",
  description: "Content card",
  group: "Layout",
});
"#;

/// Create a source tree with N files, every fourth one a component declaration
fn create_source_tree(dir: &TempDir, count: usize) -> PathBuf {
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    for i in 0..count {
        let subdir = src.join(format!("components{}", i % 10));
        fs::create_dir_all(&subdir).unwrap();
        if i % 4 == 0 {
            fs::write(subdir.join(format!("Card{}.webflow.tsx", i)), COMPONENT).unwrap();
        } else {
            fs::write(subdir.join(format!("Card{}.tsx", i)), format!("content {}", i)).unwrap();
        }
    }

    src
}

/// Benchmark the staging copy with different file counts
fn bench_copy_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_directory");
    let shutdown = AtomicBool::new(false);

    for file_count in [100, 500, 1000].iter() {
        let temp = TempDir::new().unwrap();
        let src = create_source_tree(&temp, *file_count);
        let dst = temp.path().join("deploy").join("src");

        group.throughput(Throughput::Elements(*file_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            file_count,
            |b, _| {
                b.iter(|| {
                    let _ = fs::remove_dir_all(&dst);
                    copy_directory(black_box(&src), black_box(&dst), &shutdown, None).unwrap()
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the component name rewrite on a single declaration
fn bench_mark_component_name(c: &mut Criterion) {
    c.bench_function("mark_component_name", |b| {
        b.iter(|| mark_component_name(black_box(COMPONENT)))
    });
}

/// Benchmark marking a staged tree (second pass finds everything marked)
fn bench_mark_component_files(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let src = create_source_tree(&temp, 400);
    mark_component_files(&src).unwrap();

    c.bench_function("mark_component_files_400_marked", |b| {
        b.iter(|| mark_component_files(black_box(&src)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_copy_directory,
    bench_mark_component_name,
    bench_mark_component_files,
);
criterion_main!(benches);
