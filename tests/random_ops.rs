//! Cross-backend equivalence on deterministic random operation streams.
//!
//! One seeded stream of push / decrease_key / pop operations is generated
//! against a shadow model (with globally unique keys, so the pop sequence
//! is fully determined), then replayed against every backend. All backends
//! must produce the same pop sequence and the same size trajectory.

use addressable_heaps::{standard_factories, ElementId, Heap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy)]
enum Op {
    Push(i64, ElementId),
    Decrease(ElementId, i64),
    Pop,
}

/// Generates a stream of valid operations; keys are kept unique so every
/// backend pops the same (key, id) pairs.
fn generate_stream(seed: u64, steps: usize, max_live: usize) -> Vec<Op> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ops = Vec::with_capacity(steps);

    let mut shadow: BTreeMap<ElementId, i64> = BTreeMap::new();
    let mut live_ids: Vec<ElementId> = Vec::new();
    let mut used_keys: HashSet<i64> = HashSet::new();
    let mut next_id = 0usize;

    let fresh_key = |rng: &mut StdRng, used: &mut HashSet<i64>, below: Option<i64>| {
        loop {
            let candidate = match below {
                None => rng.gen_range(0..1_000_000_000i64),
                Some(bound) => bound - rng.gen_range(1..1_000_000i64),
            };
            if used.insert(candidate) {
                return candidate;
            }
        }
    };

    for _ in 0..steps {
        let roll = rng.gen_range(0..10u32);
        if (roll < 5 && shadow.len() < max_live) || shadow.is_empty() {
            let key = fresh_key(&mut rng, &mut used_keys, None);
            let id = next_id;
            next_id += 1;
            shadow.insert(id, key);
            live_ids.push(id);
            ops.push(Op::Push(key, id));
        } else if roll < 8 {
            let id = live_ids[rng.gen_range(0..live_ids.len())];
            let current = shadow[&id];
            let new_key = fresh_key(&mut rng, &mut used_keys, Some(current));
            shadow.insert(id, new_key);
            ops.push(Op::Decrease(id, new_key));
        } else {
            // Pop the unique minimum from the model.
            let (&min_id, _) = shadow
                .iter()
                .min_by_key(|&(_, &key)| key)
                .expect("model not empty");
            shadow.remove(&min_id);
            live_ids.retain(|&id| id != min_id);
            ops.push(Op::Pop);
        }
    }
    ops
}

struct Trace {
    pops: Vec<(i64, ElementId)>,
    sizes: Vec<usize>,
}

fn run_stream(heap: &mut dyn Heap<i64>, ops: &[Op], validate_every: usize) -> Trace {
    let mut trace = Trace {
        pops: Vec::new(),
        sizes: Vec::new(),
    };
    for (step, op) in ops.iter().enumerate() {
        match *op {
            Op::Push(key, id) => heap.push(key, id),
            Op::Decrease(id, new_key) => {
                heap.decrease_key(id, new_key).expect("valid decrease");
            }
            Op::Pop => {
                let popped = heap.pop().expect("pop on non-empty heap");
                trace.pops.push(popped);
            }
        }
        trace.sizes.push(heap.len());
        if step % validate_every == 0 {
            heap.validate();
        }
    }
    heap.validate();

    // Drain the rest; the tail must come out sorted as well.
    while let Some(popped) = heap.pop() {
        trace.pops.push(popped);
        trace.sizes.push(heap.len());
    }
    heap.validate();
    trace
}

#[test]
fn identical_traces_across_backends() {
    let ops = generate_stream(0x2d34_aab7, 10_000, 1000);

    let factories = standard_factories::<i64>();
    let mut reference: Option<(&'static str, Trace)> = None;

    for factory in &factories {
        let mut heap = factory.make();
        let trace = run_stream(heap.as_mut(), &ops, 97);

        match &reference {
            None => reference = Some((factory.name(), trace)),
            Some((reference_name, reference_trace)) => {
                assert_eq!(
                    reference_trace.pops, trace.pops,
                    "pop sequences diverge between {} and {}",
                    reference_name,
                    factory.name()
                );
                assert_eq!(
                    reference_trace.sizes, trace.sizes,
                    "size trajectories diverge between {} and {}",
                    reference_name,
                    factory.name()
                );
            }
        }
    }
}

#[test]
fn decrease_heavy_stream() {
    // A smaller stream dominated by decreases, stressing the cut and
    // restructuring paths of the lazy backends.
    let ops = generate_stream(0x7717_0001, 2_000, 64);

    let factories = standard_factories::<i64>();
    let mut reference: Option<Trace> = None;

    for factory in &factories {
        let mut heap = factory.make();
        let trace = run_stream(heap.as_mut(), &ops, 13);
        match &reference {
            None => reference = Some(trace),
            Some(reference_trace) => {
                assert_eq!(
                    reference_trace.pops, trace.pops,
                    "pop sequences diverge for {}",
                    factory.name()
                );
                assert_eq!(reference_trace.sizes, trace.sizes);
            }
        }
    }
}
