use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::sync::Arc;
use std::thread;
use tour_booking_client::{QueryCache, QueryKey, ResourceFamily};

// Concurrent read/write/invalidate mix over the query cache, at several
// working-set sizes (distinct tour ids).
pub fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_cache");

    for tour_count in [10i64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(tour_count),
            tour_count,
            |b, &tour_count| {
                b.iter(|| {
                    let cache = Arc::new(QueryCache::new());
                    let tour_ids: Vec<i64> = (0..tour_count).collect();

                    // Pre-populate comment lists and rating aggregates.
                    for id in &tour_ids {
                        cache
                            .put(QueryKey::TourComments(*id), &vec!["comment"; 8])
                            .unwrap();
                        cache.put(QueryKey::TourRating(*id), &4.2f64).unwrap();
                    }

                    let mut handles = vec![];
                    for _ in 0..4 {
                        let cache = Arc::clone(&cache);
                        let tour_ids = tour_ids.clone();

                        let handle = thread::spawn(move || {
                            let mut rng = thread_rng();
                            for _ in 0..250 {
                                let id = *tour_ids.choose(&mut rng).unwrap();
                                let roll: f64 = rng.gen();
                                if roll < 0.7 {
                                    // 70% reads
                                    let _ = cache
                                        .get_cached::<Vec<String>>(&QueryKey::TourComments(id));
                                } else if roll < 0.9 {
                                    // 20% writes
                                    cache
                                        .put(QueryKey::TourComments(id), &vec!["comment"; 8])
                                        .unwrap();
                                } else {
                                    // 10% invalidations scoped to one tour
                                    cache.invalidate_matching(|key| {
                                        matches!(
                                            key,
                                            QueryKey::TourComments(t) | QueryKey::TourRating(t)
                                                if *t == id
                                        )
                                    });
                                }
                            }
                        });

                        handles.push(handle);
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    black_box(cache.stats())
                });
            },
        );
    }

    group.bench_function("family_invalidation", |b| {
        let cache = QueryCache::new();
        b.iter(|| {
            for id in 0..100i64 {
                cache.put(QueryKey::Tour(id), &id).unwrap();
                cache.put(QueryKey::Booking(id), &id).unwrap();
            }
            black_box(cache.invalidate_family(ResourceFamily::Tours))
        });
    });

    group.finish();
}

criterion_group!(benches, cache_benchmark);
criterion_main!(benches);
