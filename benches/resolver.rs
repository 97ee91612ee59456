use criterion::{criterion_group, criterion_main, Criterion};
use locale_store::{id_hash, Config, HashSet, IdentityResolver, Record, Tag};
use rand::Rng;

fn resolve_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve all");
    group.sample_size(10);

    for max_id in [10_000, 100_000, 1_000_000] {
        let resolver = IdentityResolver::with_max_id(max_id);

        let mut rng = rand::rng();
        let hashes = (0..1_000)
            .map(|_| id_hash(rng.random_range(0..=max_id)))
            .collect::<HashSet<_>>();

        group.bench_function(format!("1000 hashes up to {max_id}"), |b| {
            b.iter(|| resolver.resolve_all(&hashes));
        });
    }
}

fn add(c: &mut Criterion) {
    let mut group = c.benchmark_group("store add");
    group.sample_size(10);

    let folder = tempfile::tempdir().unwrap();

    for item_count in [100, 1_000] {
        group.bench_function(format!("{item_count} texts"), |b| {
            b.iter(|| {
                let mut store = Config::from_data_path(folder.path().join("en_us_data.dat"))
                    .max_id(100_000)
                    .create_new();

                store
                    .insert(Record::new(id_hash(1), Tag::Ugdt, "occupied"))
                    .unwrap();

                for _ in 0..item_count {
                    store.add(nanoid::nanoid!()).unwrap();
                }
            });
        });
    }
}

criterion_group!(benches, resolve_all, add);
criterion_main!(benches);
