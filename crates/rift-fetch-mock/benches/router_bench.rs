use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rift_fetch_mock::history::CallLog;
use rift_fetch_mock::request::normalize_request;
use rift_fetch_mock::router::{RouteConfig, RouteOptions, Router};
use rift_fetch_mock::FetchMockConfig;

fn build_router(count: usize, dialect: &str) -> Router {
    let config = FetchMockConfig::default();
    let mut router = Router::new();
    for i in 0..count {
        let url = match dialect {
            "begin" => format!("begin:http://localhost/api/v1/endpoint{i}/"),
            "express" => format!("express:/api/v1/endpoint{i}/:id"),
            _ => format!("http://localhost/api/v1/endpoint{i}"),
        };
        let route = RouteConfig::new()
            .url(url.as_str())
            .response(200)
            .options(RouteOptions::new().method("GET"));
        router.add_route(route, &config).unwrap();
    }
    router
}

fn call(url: &str) -> CallLog {
    CallLog::new(normalize_request(url.into(), None).unwrap(), false)
}

fn bench_first_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_match");

    for route_count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(1));

        for (dialect, url) in [
            ("exact", "http://localhost/api/v1/endpoint{n}"),
            ("begin", "http://localhost/api/v1/endpoint{n}/items"),
            ("express", "http://localhost/api/v1/endpoint{n}/42"),
        ] {
            let mut router = build_router(*route_count, dialect);

            // last route (worst case)
            let last = call(&url.replace("{n}", &(route_count - 1).to_string()));
            group.bench_with_input(
                BenchmarkId::new(format!("{dialect}_last"), route_count),
                route_count,
                |b, _| b.iter(|| router.execute(black_box(&last))),
            );

            // scans every route
            let none = call("http://localhost/not/found");
            group.bench_with_input(
                BenchmarkId::new(format!("{dialect}_none"), route_count),
                route_count,
                |b, _| b.iter(|| router.execute(black_box(&none))),
            );
        }
    }

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");
    for route_count in [10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("add_routes", route_count),
            route_count,
            |b, &n| b.iter(|| build_router(black_box(n), "exact")),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_first_match, bench_registration);
criterion_main!(benches);
