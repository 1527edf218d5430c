//! Buffer pool hot paths: the hit path with lock traffic, and the
//! miss/evict/reload churn of a scan wider than the pool.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use latchdb::{BufferPool, DiskManager, LockMode, PageKey, PageStore, TxnId};
use tempfile::tempdir;

fn seeded_pool(capacity: usize, pages: u32) -> (BufferPool, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let dm = Arc::new(DiskManager::open(dir.path()).unwrap());
    for _ in 0..pages {
        dm.allocate_page(0).unwrap();
    }
    let pool = BufferPool::new(capacity, dm as Arc<dyn PageStore>);
    (pool, dir)
}

fn bench_get_page_hit(c: &mut Criterion) {
    let (pool, _dir) = seeded_pool(32, 16);
    let key = PageKey::new(0, 3);

    c.bench_function("get_page_hit_shared", |b| {
        b.iter(|| {
            let tid = TxnId::fresh();
            let page = pool.get_page(Some(tid), key, LockMode::Shared).unwrap();
            black_box(page.read().as_slice()[0]);
            pool.release_page(tid, key);
        })
    });
}

fn bench_get_page_miss_evict(c: &mut Criterion) {
    let (pool, _dir) = seeded_pool(4, 16);

    // Cycling 16 pages through a 4-page pool makes every access a miss
    // plus an eviction. Lock-free access so nothing is pinned.
    let mut next = 0u32;
    c.bench_function("get_page_miss_evict", |b| {
        b.iter(|| {
            let page = pool
                .get_page(None, PageKey::new(0, next % 16), LockMode::Shared)
                .unwrap();
            black_box(page.read().as_slice()[0]);
            next = next.wrapping_add(1);
        })
    });
}

criterion_group!(benches, bench_get_page_hit, bench_get_page_miss_evict);
criterion_main!(benches);
