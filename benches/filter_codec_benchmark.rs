//! Benchmark for codec and catalog throughput
//!
//! Target: flatten/rebuild of a 200-condition filter well under 1ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use report_filter_core::codec::{decode_explicit, encode_explicit, flatten, rebuild};
use report_filter_core::field::{DataSourceId, FieldReference, FieldType};
use report_filter_core::operator::{operators_for, OperatorCache};
use report_filter_core::tree::{Combinator, FilterTree, GroupId};

/// Create a realistic filter: 20 groups of 10 conditions below an AND root
fn create_test_tree() -> FilterTree {
    let fields: Vec<FieldReference> = FieldType::KNOWN
        .iter()
        .enumerate()
        .map(|(i, field_type)| {
            FieldReference::new(format!("field_{}", i), format!("Field {}", i), field_type.clone())
        })
        .collect();
    let data_source = DataSourceId::new("orders");

    let mut tree = FilterTree::new(Combinator::And);
    for g in 0..20 {
        let combinator = if g % 2 == 0 { Combinator::Or } else { Combinator::And };
        let group = tree
            .add_group(GroupId::ROOT, combinator)
            .expect("root exists");
        for c in 0..10 {
            let field = &fields[(g * 10 + c) % fields.len()];
            let condition = tree.new_condition(data_source.clone(), field);
            tree.push_condition(group, condition).expect("group exists");
        }
    }
    tree
}

fn benchmark_codec(c: &mut Criterion) {
    let tree = create_test_tree();
    let records = flatten(&tree);

    c.bench_function("flatten_200_conditions", |b| {
        b.iter(|| black_box(flatten(black_box(&tree))))
    });

    c.bench_function("rebuild_200_conditions", |b| {
        b.iter(|| black_box(rebuild(black_box(&records))))
    });

    let explicit = encode_explicit(&tree);
    c.bench_function("explicit_round_trip", |b| {
        b.iter(|| black_box(decode_explicit(black_box(&explicit))))
    });
}

fn benchmark_catalog(c: &mut Criterion) {
    let types = FieldType::KNOWN.to_vec();

    c.bench_function("operators_for_uncached", |b| {
        b.iter(|| {
            for field_type in &types {
                black_box(operators_for(black_box(field_type)));
            }
        })
    });

    c.bench_function("operators_for_cached", |b| {
        let cache = OperatorCache::new();
        // Warm up cache
        for field_type in &types {
            cache.get(field_type);
        }

        b.iter(|| {
            for field_type in &types {
                black_box(cache.get(black_box(field_type)));
            }
        })
    });
}

criterion_group!(benches, benchmark_codec, benchmark_catalog);
criterion_main!(benches);
