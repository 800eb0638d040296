use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use synthset_linalg::{
    mat4_inverse,
    quat::{rotation_matrix_to_quaternion, QuaternionFormula},
    transforms::axis_angle_to_rotation_matrix,
};

fn bench_quaternion(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotation_matrix_to_quaternion");

    let rotation = axis_angle_to_rotation_matrix(&[1.0, -2.0, 3.0], 1.1).unwrap();

    for formula in [QuaternionFormula::Trace, QuaternionFormula::LargestDiagonal] {
        group.bench_with_input(
            BenchmarkId::new("formula", format!("{formula:?}")),
            &formula,
            |b, formula| b.iter(|| rotation_matrix_to_quaternion(black_box(&rotation), *formula)),
        );
    }

    group.finish();
}

fn bench_inverse(c: &mut Criterion) {
    let m = [
        [0.0, -1.0, 0.0, 1.0],
        [1.0, 0.0, 0.0, 2.0],
        [0.0, 0.0, 1.0, 3.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    c.bench_function("mat4_inverse", |b| b.iter(|| mat4_inverse(black_box(&m))));
}

criterion_group!(benches, bench_quaternion, bench_inverse);
criterion_main!(benches);
