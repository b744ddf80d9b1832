//! Performance benchmarks for change resolution.

use changefeed::{
    ChangeResolver, ChangesRequest, Entity, FilterParameters, MemoryEntityStore,
    MemorySequenceLog, MemoryTaxonomy, TermHierarchyIndex, DEFAULT_WORKSPACE,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;

struct Site {
    log: Arc<MemorySequenceLog>,
    store: Arc<MemoryEntityStore>,
    taxonomy: Arc<MemoryTaxonomy>,
}

impl Site {
    fn new() -> Self {
        Self {
            log: Arc::new(MemorySequenceLog::new()),
            store: Arc::new(MemoryEntityStore::new()),
            taxonomy: Arc::new(MemoryTaxonomy::new()),
        }
    }

    fn save(&self, entity: Entity) {
        let saved = self.store.save(Some(DEFAULT_WORKSPACE), entity).unwrap();
        self.log.record(DEFAULT_WORKSPACE, &saved);
    }

    fn resolver(&self) -> ChangeResolver {
        ChangeResolver::new(
            self.log.clone(),
            self.store.clone(),
            self.taxonomy.clone(),
        )
    }
}

/// Site with `size` articles, each tagged with one of ten channels under "chan-root".
fn create_site(size: usize) -> Site {
    let site = Site::new();
    site.taxonomy.add_term("root", "chan-root", None);
    site.store
        .save(None, Entity::new("taxonomy_term", "channel", "root", "chan-root"))
        .unwrap();
    for c in 0..10 {
        let id = format!("c{c}");
        site.taxonomy.add_term(&id, &format!("chan-{c}"), Some("root"));
        site.store
            .save(None, Entity::new("taxonomy_term", "channel", id, format!("chan-{c}")))
            .unwrap();
    }

    for i in 0..size {
        site.save(
            Entity::new("node", "article", i.to_string(), format!("uuid-{i}"))
                .with_value("title", json!(format!("Article {i}")))
                .with_reference("field_channel", "taxonomy_term", format!("c{}", i % 10)),
        );
    }
    site
}

/// Benchmark unfiltered resolution with varying log sizes
fn bench_unfiltered(c: &mut Criterion) {
    let mut group = c.benchmark_group("unfiltered");

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("entries", size), &size, |b, &size| {
            let site = create_site(size);
            let resolver = site.resolver();

            b.iter(|| {
                black_box(resolver.resolve(&ChangesRequest::new()).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark channel filtering through the term hierarchy
fn bench_channel_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_filter");

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("entries", size), &size, |b, &size| {
            let site = create_site(size);
            let resolver = site.resolver();
            let request = ChangesRequest::new().filter("contentpool_channels").parameters(
                FilterParameters::new()
                    .with("types", json!(["node.article"]))
                    .with("channels", json!(["chan-root"])),
            );

            b.iter(|| {
                black_box(resolver.resolve(&request).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark include_docs with and without the revision cache
fn bench_include_docs(c: &mut Criterion) {
    let site = create_site(1000);
    let plain = site.resolver();
    let cached = site.resolver().with_revision_cache();
    let request = ChangesRequest::new().include_docs(true);

    c.bench_function("include_docs_1000", |b| {
        b.iter(|| {
            black_box(plain.resolve(&request).unwrap());
        });
    });

    c.bench_function("include_docs_1000_cached", |b| {
        b.iter(|| {
            black_box(cached.resolve(&request).unwrap());
        });
    });
}

/// Benchmark reference closure with varying chain depths
fn bench_reference_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_depth");

    for depth in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("chain_depth", depth), &depth, |b, &depth| {
            let site = Site::new();
            for i in 0..depth {
                let mut entity =
                    Entity::new("paragraph", "text", i.to_string(), format!("para-{i}"));
                if i + 1 < depth {
                    entity = entity.with_reference("field_next", "paragraph", (i + 1).to_string());
                }
                site.store.save(Some(DEFAULT_WORKSPACE), entity).unwrap();
            }
            site.save(
                Entity::new("node", "article", "root", "uuid-root")
                    .with_reference("field_next", "paragraph", "0"),
            );
            let resolver = site.resolver();

            b.iter(|| {
                black_box(resolver.resolve(&ChangesRequest::new()).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark term closure over a wide hierarchy
fn bench_term_closure(c: &mut Criterion) {
    let taxonomy = Arc::new(MemoryTaxonomy::new());
    taxonomy.add_term("0", "term-0", None);
    for i in 1..5000 {
        taxonomy.add_term(&i.to_string(), &format!("term-{i}"), Some(&((i - 1) / 4).to_string()));
    }

    c.bench_function("term_closure_5000", |b| {
        b.iter(|| {
            let index = TermHierarchyIndex::new(taxonomy.clone());
            black_box(index.close(&["term-0".to_string()]).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_unfiltered,
    bench_channel_filter,
    bench_include_docs,
    bench_reference_depth,
    bench_term_closure,
);

criterion_main!(benches);
