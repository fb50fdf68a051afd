use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use anstream::println;
use clap::Parser;
use owo_colors::OwoColorize;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use tqdm::tqdm;

use gridplan::Cell;
use gridplan::Costmap2D;
use gridplan::MotionModel;
use gridplan::PlanError;
use gridplan::PlanRequest;
use gridplan::Planner2D;
use gridplan::PlannerConfig;
use gridplan::config::SearchBudget;
use gridplan::cost_model::CostModel;
use gridplan::problem::GridProblem;
use gridplan::problem::GridProblemParseError;

#[cfg(feature = "mem_profile")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;
#[cfg(all(not(feature = "mem_profile"), not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Plans paths on a costmap
///
/// Text maps use `.` for free space, `#` for lethal obstacles, `@` for
/// inscribed ones, `?` for unknown cells and digits for intermediate costs.
/// `S` and `G` mark the start and the goal. PNG maps are read as occupancy
/// grids.
#[derive(Parser, Debug)]
#[clap(long_version = gridplan::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, env = "LOGS_PLAN", default_value = "logs/plan.org")]
    pub output: PathBuf,

    #[arg()]
    pub map: PathBuf,

    /// Start cell as `x,y`. Overrides the map's `S`.
    #[arg(long, value_parser = parse_cell)]
    pub start: Option<Cell>,
    /// Goal cell as `x,y`. Overrides the map's `G`.
    #[arg(long, value_parser = parse_cell)]
    pub goal: Option<Cell>,

    /// 4 (von-neumann) or 8 (moore)
    #[arg(short, long, env = "PLAN_MOTION_MODEL", default_value_t = MotionModel::default())]
    pub motion_model: MotionModel,
    /// Treat unknown cells as obstacles.
    #[arg(long)]
    pub no_traverse_unknown: bool,

    #[arg(long, env = "PLAN_MAX_ITERATIONS")]
    pub max_iterations: Option<usize>,
    #[arg(long, env = "PLAN_MAX_PLANNING_TIME_MS")]
    pub max_planning_time_ms: Option<u64>,

    /// Goal tolerance in map units.
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,
    #[arg(long, default_value_t = gridplan::config::DEFAULT_MAX_ON_APPROACH_ITERATIONS)]
    pub max_on_approach_iterations: usize,

    #[arg(long, default_value_t = gridplan::cost_model::DEFAULT_NEUTRAL_COST)]
    pub neutral_cost: f32,
    #[arg(long, default_value_t = gridplan::cost_model::DEFAULT_COST_TRAVEL_MULTIPLIER)]
    pub cost_travel_multiplier: f32,

    /// Map units per cell.
    #[arg(long, default_value_t = 1.0)]
    pub resolution: f64,

    /// Plans the same request again, reusing the search graph.
    #[arg(long, default_value_t = 1usize)]
    pub repeats: usize,
    /// Also plans between random free cells, seeded by instance number.
    #[arg(long, default_value_t = 0u64)]
    pub random_instances: u64,

    #[arg(long)]
    pub memory_stats: bool,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn parse_cell(s: &str) -> Result<Cell, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(Cell::new(x, y))
}

impl Args {
    fn config(&self) -> PlannerConfig {
        PlannerConfig {
            cost_model: CostModel {
                neutral_cost: self.neutral_cost,
                cost_travel_multiplier: self.cost_travel_multiplier,
            },
            tolerance: self.tolerance,
            max_on_approach_iterations: self.max_on_approach_iterations,
            motion_model: self.motion_model,
            traverse_unknown: !self.no_traverse_unknown,
            budget: SearchBudget {
                max_iterations: self.max_iterations,
                max_planning_time: self.max_planning_time_ms.map(Duration::from_millis),
            },
        }
    }
}

/// Loads a map, with its `S`/`G` markers when it has them.
fn load(p: &Path) -> std::io::Result<(Costmap2D, Option<Cell>, Option<Cell>)> {
    let is_png = p
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        let costmap = Costmap2D::try_from(p).map_err(std::io::Error::other)?;
        return Ok((costmap, None, None));
    }

    let text = std::fs::read_to_string(p)?;
    match GridProblem::try_from(text.as_str()) {
        Ok(problem) => Ok((problem.costmap, Some(problem.start), Some(problem.goal))),
        Err(GridProblemParseError::MissingStart | GridProblemParseError::MissingGoal) => {
            let costmap = Costmap2D::try_from(text.as_str()).map_err(std::io::Error::other)?;
            Ok((costmap, None, None))
        }
        Err(e) => Err(std::io::Error::other(e)),
    }
}

fn write_header<W: std::io::Write>(out: &mut BufWriter<W>, args: &Args) -> std::io::Result<()> {
    writeln!(out, ":PROPERTIES:")?;
    writeln!(out, ":VERSION: {:?}", gridplan::build::PKG_VERSION)?;
    writeln!(out, ":GIT_BRANCH: {:?}", shadow_rs::branch())?;
    writeln!(out, ":BUILD_IS_DEBUG: {}", shadow_rs::is_debug())?;
    if gridplan::build::GIT_CLEAN {
        writeln!(out, ":GIT_STATUS: CLEAN")?;
    } else {
        writeln!(out, ":GIT_STATUS: DIRTY")?;
    }
    writeln!(out, ":END:")?;
    writeln!(out, "#+title: Plans on {:?}", args.map)?;
    writeln!(out, "#+date: {}", chrono::Local::now().to_rfc3339())?;
    writeln!(out)?;
    writeln!(out, "* Config\n#+begin_src ron\n{:#?}\n#+end_src", args.config())?;
    Ok(())
}

fn write_plan<W: std::io::Write>(
    out: &mut BufWriter<W>,
    title: &str,
    problem: &GridProblem,
    result: &Result<gridplan::Path, PlanError>,
    elapsed: Duration,
) -> std::io::Result<()> {
    writeln!(out, "** {title}")?;
    writeln!(out, "- Start: {}", problem.start)?;
    writeln!(out, "- Goal: {}", problem.goal)?;
    writeln!(out, "- Time: {}", human_duration::human_duration(&elapsed))?;
    match result {
        Ok(path) => {
            writeln!(out, "- Result: {path}")?;
            writeln!(out, "- Length: {:.3}", path.length())?;
            writeln!(out, "#+begin_quote\n{}#+end_quote", problem.render(Some(path)))?;
        }
        Err(e) => {
            writeln!(out, "- Result: FAILED {e}")?;
            writeln!(out, "#+begin_quote\n{}#+end_quote", problem.render(None))?;
        }
    }
    Ok(())
}

fn report(title: &str, result: &Result<gridplan::Path, PlanError>, elapsed: Duration) {
    let elapsed = human_duration::human_duration(&elapsed);
    match result {
        Ok(path) if path.reached_goal => println!(
            "{title}: {} steps, cost {} in {} iterations ({elapsed})",
            path.steps().green(),
            path.cost.green(),
            path.iterations
        ),
        Ok(path) => println!(
            "{title}: {} steps to {} near the goal, cost {} ({elapsed})",
            path.steps().yellow(),
            path.end().unwrap_or_default().yellow(),
            path.cost.yellow()
        ),
        Err(e) if e.is_retryable() => println!("{title}: {} ({elapsed})", e.yellow()),
        Err(e) => println!("{title}: {} ({elapsed})", e.red()),
    }
}

fn main() -> std::io::Result<()> {
    #[cfg(feature = "mem_profile")]
    let _profiler = dhat::Profiler::new_heap();

    let args = Args::parse();
    args.color.write_global();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (mut costmap, map_start, map_goal) = load(&args.map)?;
    costmap
        .set_resolution(args.resolution)
        .map_err(std::io::Error::other)?;
    let (Some(start), Some(goal)) = (args.start.or(map_start), args.goal.or(map_goal)) else {
        return Err(std::io::Error::other(
            "No start or goal. Mark them with 'S' and 'G' or pass --start and --goal",
        ));
    };
    let mut problem = GridProblem::new(costmap, start, goal);
    println!("{} {:?}", "Map".bold(), problem.costmap);

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Logging to {:?}", args.output.yellow());
    let file = File::create(&args.output)?;
    let mut out = BufWriter::new(file);
    write_header(&mut out, &args)?;

    let mut planner = Planner2D::new(args.config());
    writeln!(out, "* Plans")?;
    let request = PlanRequest::new(start, goal);
    for i in tqdm(0..args.repeats.max(1)).desc(Some("Planning")) {
        let t = Instant::now();
        let result = planner.plan(&problem.costmap, &request);
        let elapsed = t.elapsed();
        if i == 0 {
            report("Plan", &result, elapsed);
        }
        write_plan(&mut out, &format!("Plan {i}"), &problem, &result, elapsed)?;
    }

    if args.random_instances > 0 {
        writeln!(out, "* Random instances")?;
    }
    for instance in 0..args.random_instances {
        let mut rng = ChaCha8Rng::seed_from_u64(instance);
        if problem.randomize(&mut rng).is_none() {
            writeln!(
                out,
                "FIXME Failed to generate random problem with seed {instance}"
            )?;
            continue;
        }
        let t = Instant::now();
        let result = planner.plan(&problem.costmap, &problem.request());
        let elapsed = t.elapsed();
        report(&format!("Instance {instance}"), &result, elapsed);
        write_plan(
            &mut out,
            &format!("Instance {instance}"),
            &problem,
            &result,
            elapsed,
        )?;
    }

    if args.memory_stats {
        writeln!(out, "* Memory\n#+begin_example")?;
        planner.write_memory_stats(&mut out)?;
        writeln!(out, "#+end_example")?;
        planner.write_memory_stats(std::io::stdout().lock())?;
    }

    out.flush()
}
