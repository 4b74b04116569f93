//! Criterion benchmarks for INI load and update.
//!
//! Every operation rescans the whole file, so cost grows with the number of
//! sections.  The fixtures below scale the section count.
//!
//! Run with:
//! ```bash
//! cargo bench --package confstore-storage --bench ini_bench
//! ```

use std::fs;
use std::path::PathBuf;

use confstore_core::{ConfigKey, Configuration, NamedValue};
use confstore_storage::{IniStorageProvider, StorageProvider};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Writes a file with `sections` sections of four named and two positional lines.
fn fixture(sections: usize) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("confstore_bench_{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create bench dir");
    let path = dir.join("bench.ini");

    let mut text = String::from("# benchmark fixture\n");
    for s in 0..sections {
        text.push_str(&format!(
            "[Section{s}]\nHost=host{s}\nPort={}\nEnabled=true\nRatio=0.5\nalpha\nbeta\n\n",
            1000 + s
        ));
    }
    fs::write(&path, text).expect("write fixture");
    path
}

fn schema(sections: usize) -> Configuration {
    let keys = (0..sections).map(|s| {
        let mut key = ConfigKey::new(format!("Section{s}")).expect("valid name");
        key.insert(NamedValue::new("Port", 0u16)).expect("unique");
        key.insert(NamedValue::new("Enabled", false)).expect("unique");
        key.insert(NamedValue::new("items", String::new()).name_visible(false))
            .expect("unique");
        key.set_default_value_name(Some("items")).expect("declared");
        key
    });
    Configuration::from_keys(keys).expect("unique keys")
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("ini_load");

    for sections in [10usize, 100] {
        let path = fixture(sections);
        let mut provider = IniStorageProvider::open(&path, true).expect("open");

        group.bench_with_input(BenchmarkId::new("free_form", sections), &sections, |b, _| {
            b.iter(|| provider.load().expect("load"))
        });

        let mut configuration = schema(sections);
        group.bench_with_input(BenchmarkId::new("schema", sections), &sections, |b, _| {
            b.iter(|| provider.load_into(&mut configuration).expect("load_into"))
        });

        drop(provider);
        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).ok();
        }
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("ini_update");

    for sections in [10usize, 100] {
        let path = fixture(sections);
        let mut provider = IniStorageProvider::open(&path, false).expect("open");
        let mut configuration = schema(sections);
        provider.load_into(&mut configuration).expect("load_into");

        group.bench_with_input(BenchmarkId::new("preserving", sections), &sections, |b, _| {
            b.iter(|| provider.update(&configuration).expect("update"))
        });

        drop(provider);
        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).ok();
        }
    }

    group.finish();
}

criterion_group!(benches, bench_load, bench_update);
criterion_main!(benches);
