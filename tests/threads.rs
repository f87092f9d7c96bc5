use rayon::prelude::*;
use recycle::*;
use std::{
    sync::{
        atomic::{AtomicIsize, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

#[derive(Default)]
struct Tally {
    created: AtomicUsize,
    live: AtomicIsize,
    recycled: AtomicUsize,
}

struct Conn {
    tally: Arc<Tally>,
}

impl Drop for Conn {
    fn drop(&mut self) {
        self.tally.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn conn_pool(tally: &Arc<Tally>) -> Pool<Conn> {
    let make = Arc::clone(tally);
    let hook = Arc::clone(tally);
    Pool::with_recycle(
        move || {
            make.created.fetch_add(1, Ordering::SeqCst);
            make.live.fetch_add(1, Ordering::SeqCst);
            Conn {
                tally: Arc::clone(&make),
            }
        },
        move |_: &mut Conn| {
            hook.recycled.fetch_add(1, Ordering::SeqCst);
        },
    )
}

#[test]
fn test_threads_share_one_pool() {
    let tally = Arc::new(Tally::default());
    {
        let pool = conn_pool(&tally);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    {
                        let _a1 = pool.allocate();
                    }

                    let _a2 = pool.allocate();
                    let _a3 = pool.allocate();

                    {
                        let _a4 = pool.allocate();
                    }

                    let new_pool = pool.clone();

                    let _b1 = new_pool.allocate();
                    let _b2 = new_pool.allocate();

                    pool.free_unused();
                });
            }
        });
    }
    assert_eq!(tally.live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_handles_cross_threads() {
    let tally = Arc::new(Tally::default());
    let pool = conn_pool(&tally);

    let handles = pool.allocate_bulk(16);
    let workers: Vec<_> = handles
        .into_iter()
        .map(|handle| thread::spawn(move || drop(handle)))
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(pool.unused_resources(), 16);
    assert_eq!(tally.recycled.load(Ordering::SeqCst), 16);
}

#[test]
fn test_pool_dropped_while_threads_hold_handles() {
    let tally = Arc::new(Tally::default());
    let pool = conn_pool(&tally);
    let handles = pool.allocate_bulk(8);
    drop(pool);

    handles.into_par_iter().for_each(|handle| {
        assert!(!handle.is_attached());
        drop(handle);
    });

    assert_eq!(tally.live.load(Ordering::SeqCst), 0);
    assert_eq!(tally.recycled.load(Ordering::SeqCst), 0);
}

#[test]
fn test_parallel_accounting() {
    let tally = Arc::new(Tally::default());
    let pool = conn_pool(&tally);
    pool.prefill(4);

    (0..1024).into_par_iter().for_each(|i| {
        if i % 3 == 0 {
            let batch = pool.allocate_bulk(3);
            pool.recycle_bulk(batch);
        } else {
            let handle = pool.allocate();
            assert!(handle.is_valid());
        }
        let unused = pool.unused_resources();
        let created = tally.created.load(Ordering::SeqCst);
        assert!(unused <= created);
    });

    let created = tally.created.load(Ordering::SeqCst);
    assert_eq!(pool.unused_resources(), created);
    assert_eq!(tally.live.load(Ordering::SeqCst) as usize, created);
}

#[test]
fn test_fixed_capacity_under_contention() {
    let tally = Arc::new(Tally::default());
    let pool = conn_pool(&tally);
    pool.prefill(4).set_fixed_capacity(true);

    let granted = AtomicUsize::new(0);
    (0..256).into_par_iter().for_each(|_| {
        if let Ok(handle) = pool.try_allocate() {
            granted.fetch_add(1, Ordering::Relaxed);
            drop(handle);
        }
        assert!(pool.unused_resources() <= 4);
    });

    assert!(granted.load(Ordering::Relaxed) > 0);
    assert_eq!(tally.created.load(Ordering::SeqCst), 4);
    assert_eq!(pool.unused_resources(), 4);
}
