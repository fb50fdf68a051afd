#![no_main]

use libfuzzer_sys::fuzz_target;

use gridplan::MotionModel;
use gridplan::Planner2D;
use gridplan::config::SearchBudget;
use gridplan::problem::GridProblem;

fuzz_target!(|data: &[u8]| {
    let Some((&model, map)) = data.split_first() else {
        return;
    };
    let Ok(map) = std::str::from_utf8(map) else {
        return;
    };
    let Ok(problem) = GridProblem::try_from(map) else {
        return;
    };
    let model = if model % 2 == 0 {
        MotionModel::VonNeumann
    } else {
        MotionModel::Moore
    };

    let request = problem
        .request()
        .with_motion_model(model)
        .with_budget(SearchBudget::unbounded().with_max_iterations(100_000));
    if let Ok(path) = Planner2D::default().plan(&problem.costmap, &request) {
        assert!(path.seems_valid());
        assert_eq!(path.start(), Some(problem.start));
        assert_eq!(path.end(), Some(problem.goal));
    }
});
