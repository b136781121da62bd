//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ssrflow::cache::derive_cache_key;
use ssrflow::core::BrowserType;
use ssrflow::pipeline::{is_covered, SsrPipeline};
use ssrflow::render::DataContext;
use ssrflow::testing::{request, test_app, FnRenderer, StaticResolver};
use std::sync::Arc;

fn route_benchmark(c: &mut Criterion) {
    let prefixes = ["/api".to_string()];
    c.bench_function("route_predicate", |b| {
        b.iter(|| {
            black_box(is_covered(black_box("/blog/2024/hello-world"), &prefixes));
            black_box(is_covered(black_box("/static/app.js"), &prefixes));
        });
    });
}

fn key_benchmark(c: &mut Criterion) {
    c.bench_function("derive_cache_key", |b| {
        b.iter(|| derive_cache_key("ssr", black_box("/blog/2024/hello-world"), None));
    });
    c.bench_function("derive_cache_key_partitioned", |b| {
        b.iter(|| {
            derive_cache_key(
                "ssr",
                black_box("/blog/2024/hello-world"),
                Some(BrowserType::Modern),
            )
        });
    });
}

fn cache_hit_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let resolver = StaticResolver::new().with_route("/about", DataContext::for_route("about"));
    let renderer = FnRenderer::static_markup("<title>About</title>", "<main>about</main>");
    let pipeline = SsrPipeline::builder(test_app(), Arc::new(resolver), Arc::new(renderer))
        .build()
        .unwrap();
    let parts = request("/about");

    // Warm the cache so every iteration is a hit.
    runtime.block_on(pipeline.handle(&parts)).unwrap();

    c.bench_function("pipeline_cache_hit", |b| {
        b.iter(|| runtime.block_on(pipeline.handle(black_box(&parts))).unwrap());
    });
}

criterion_group!(benches, route_benchmark, key_benchmark, cache_hit_benchmark);
criterion_main!(benches);
