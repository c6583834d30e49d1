//! Candidate-set scan benchmark suite.
//!
//! Benchmarks a single locator pass over the in-memory driver:
//! - Set sizes: 4, 10, 25 candidates
//! - Hit positions: first, last, none
//!
//! Run with: cargo bench --bench candidate_scan
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use notion_e2e::driver::{FakeElement, FakePage};
use notion_e2e::{CandidateSet, FakeDriver, Locator, ReadinessOracle, WaitBudget};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const SET_SIZES: &[usize] = &[4, 10, 25];
const URL: &str = "https://www.notion.so";

#[derive(Debug, Clone, Copy)]
enum Hit {
    First,
    Last,
    None,
}

// ============================================================================
// Fixtures
// ============================================================================

fn selectors(size: usize) -> Vec<String> {
    (0..size)
        .map(|i| format!("//div[contains(@class, 'candidate-{i}')]"))
        .collect()
}

fn driver_for(selectors: &[String], hit: Hit) -> FakeDriver {
    let target = match hit {
        Hit::First => selectors.first(),
        Hit::Last => selectors.last(),
        Hit::None => None,
    };

    let mut page = FakePage::new(URL);
    for (i, selector) in selectors.iter().enumerate() {
        let element = FakeElement::new(format!("e{i}")).matches(selector.clone());
        page = page.element(if Some(selector) == target {
            element
        } else {
            element.hidden()
        });
    }

    let driver = FakeDriver::new();
    driver.page(page);
    driver.start_at(URL);
    driver
}

fn locator() -> Locator {
    let budget = WaitBudget::new(Duration::from_secs(15), Duration::from_secs(2))
        .expect("valid budget");
    Locator::new(ReadinessOracle::new(), budget)
}

// ============================================================================
// Benchmark: Single Pass
// ============================================================================

fn bench_probe_once(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let locator = locator();

    let mut group = c.benchmark_group("probe_once");
    for &size in SET_SIZES {
        let selectors = selectors(size);
        let set = CandidateSet::new("bench", selectors.clone());

        for hit in [Hit::First, Hit::Last, Hit::None] {
            let driver = driver_for(&selectors, hit);
            group.bench_with_input(
                BenchmarkId::new(format!("{hit:?}").to_lowercase(), size),
                &size,
                |b, _| {
                    b.to_async(&rt).iter(|| async {
                        let outcome = locator
                            .probe_once(&driver, &set)
                            .await
                            .expect("probe");
                        black_box(outcome)
                    });
                },
            );
        }
    }
    group.finish();
}

// ============================================================================
// Benchmark: Ready Page Find
// ============================================================================

fn bench_find_ready_page(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let locator = locator();
    let selectors = selectors(10);
    let set = CandidateSet::new("bench", selectors.clone());
    let driver = driver_for(&selectors, Hit::Last);

    c.bench_function("find_ready_page", |b| {
        b.to_async(&rt).iter(|| async {
            let outcome = locator.find(&driver, &set).await.expect("find");
            black_box(outcome)
        });
    });
}

criterion_group!(benches, bench_probe_once, bench_find_ready_page);
criterion_main!(benches);
