use std::time::Duration;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use glob::glob;
use hrsw::Stopwatch;
use human_duration::human_duration;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use gridplan::MotionModel;
use gridplan::PlanRequest;
use gridplan::Planner2D;
use gridplan::problem::GridProblem;

/// Maximum time willing to wait for a single benchmark instance.
/// Experiments are carried out at least 5s and at least 100 times, so running a
/// 1s instance takes 1m40s.
const MAX_INSTANCE_TIME: Duration = Duration::from_secs(1);
const RANDOM_SIZES: [u32; 3] = [64, 256, 1024];
const LETHAL_RATIO: f64 = 0.25;

/// Runs the instance once outside criterion, skipping it when it's too slow.
fn worth_benchmarking(name: &str, problem: &GridProblem, request: &PlanRequest) -> bool {
    let mut planner = Planner2D::default();
    let mut stopwatch = Stopwatch::new_started();
    let result = planner.plan(&problem.costmap, request);
    stopwatch.stop();
    let elapsed = stopwatch.elapsed();

    match result {
        Ok(path) => println!("{name}: {path}"),
        Err(e) => println!("{name}: {e}"),
    }
    if elapsed > MAX_INSTANCE_TIME {
        log::warn!(
            "Skipping {name} as it takes too long with A* ({})",
            human_duration(&elapsed)
        );
        return false;
    }
    true
}

fn bench_instance(
    group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>,
    name: &str,
    problem: &GridProblem,
) {
    for model in [MotionModel::VonNeumann, MotionModel::Moore] {
        let request = problem.request().with_motion_model(model);
        let instance_name = format!("{name}:{model}");
        if !worth_benchmarking(&instance_name, problem, &request) {
            continue;
        }

        // Replanning keeps the graph, like a robot does every control cycle.
        let mut planner = Planner2D::default();
        group.bench_with_input(
            BenchmarkId::new("A*", &instance_name),
            &request,
            |b, request| b.iter(|| planner.plan(&problem.costmap, request)),
        );
    }
}

fn sample_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid Search");

    for size in RANDOM_SIZES {
        for i in 0..3 {
            let mut rng = ChaCha8Rng::seed_from_u64(i);
            let Some(problem) = GridProblem::random(&mut rng, size, size, LETHAL_RATIO) else {
                log::warn!("Failed to generate a random {size}x{size} problem with seed {i}");
                continue;
            };
            bench_instance(&mut group, &format!("random[{size}x{size}]:{i}"), &problem);
        }
    }

    for path in glob("data/maps/*.txt")
        .unwrap()
        .filter_map(std::result::Result::ok)
    {
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        let path: &std::path::Path = path.as_ref();
        let mut problem = GridProblem::try_from(path).unwrap();
        let dimensions = problem.costmap.dimensions();

        bench_instance(&mut group, &format!("{name}[{dimensions}]"), &problem);
        for i in 0..3 {
            let mut rng = ChaCha8Rng::seed_from_u64(i);
            if problem.randomize(&mut rng).is_some() {
                bench_instance(&mut group, &format!("{name}[{dimensions}]:{i}"), &problem);
            }
        }
    }
    group.finish();
}

criterion_group!(benches, sample_astar);
criterion_main!(benches);
