#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("pointviz_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use pointviz_engine::config::SessionConfig;
    use pointviz_engine::engine::LocalEngine;
    use pointviz_engine::notify::Level;
    use pointviz_engine::selectors;
    use pointviz_engine::store::{Dimension, TriangulationMethod};
    use pointviz_engine::visual::Scene;
    use pointviz_engine::workflow::{Outcome, Session};
    use std::fmt::Write as _;

    const DEFAULT_SEED: u64 = 1;

    const USAGE: &str = r#"pointviz_cli (pointviz-engine)

USAGE:
  pointviz_cli list
  pointviz_cli run <scenario|all> [options]

SCENARIOS:
  direct-2d
  lifted-2d
  tetrahedralize-3d
  clustering-pipeline

OPTIONS (run):
  --vertices <n>      Number of vertices to generate (default: per scenario)
  --grid-size <g>     Clustering grid cell size (default 1.0)
  --seed <s>          Seed for vertex generation (default 1)
  -h, --help          Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Options {
        vertices: Option<usize>,
        grid_size: f64,
        seed: u64,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut options = Options {
            vertices: None,
            grid_size: SessionConfig::default().grid_size,
            seed: DEFAULT_SEED,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--vertices" => options.vertices = Some(args.parsed("--vertices")?),
                "--grid-size" => options.grid_size = args.parsed("--grid-size")?,
                "--seed" => options.seed = args.parsed("--seed")?,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if scenario_name == "all" {
            for scenario in Scenario::ALL {
                print!("{}", run_scenario(*scenario, options)?);
            }
            return Ok(());
        }

        let scenario =
            Scenario::from_str(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
        print!("{}", run_scenario(scenario, options)?);
        Ok(())
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        Direct2d,
        Lifted2d,
        Tetrahedralize3d,
        ClusteringPipeline,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::Direct2d,
            Scenario::Lifted2d,
            Scenario::Tetrahedralize3d,
            Scenario::ClusteringPipeline,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::Direct2d => "direct-2d",
                Scenario::Lifted2d => "lifted-2d",
                Scenario::Tetrahedralize3d => "tetrahedralize-3d",
                Scenario::ClusteringPipeline => "clustering-pipeline",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }

        fn dimension(self) -> Dimension {
            match self {
                Scenario::Tetrahedralize3d => Dimension::Three,
                _ => Dimension::Two,
            }
        }

        fn method(self) -> TriangulationMethod {
            match self {
                Scenario::ClusteringPipeline => TriangulationMethod::VertexClustering,
                _ => TriangulationMethod::Direct,
            }
        }

        fn default_vertices(self) -> usize {
            match self {
                Scenario::Direct2d | Scenario::Lifted2d => 12,
                Scenario::Tetrahedralize3d => 20,
                Scenario::ClusteringPipeline => 40,
            }
        }
    }

    fn run_scenario(scenario: Scenario, options: Options) -> Result<String, String> {
        let config = SessionConfig {
            seed: Some(options.seed),
            grid_size: options.grid_size,
            initial_dimension: scenario.dimension(),
            initial_method: scenario.method(),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config).map_err(|e| e.to_string())?;
        let mut engine = LocalEngine::new();
        let count = options.vertices.unwrap_or(scenario.default_vertices());
        session.regenerate_vertices(count).map_err(|e| e.to_string())?;

        match scenario {
            Scenario::Direct2d => {
                expect_applied(session.triangulate(&mut engine))?;
            }
            Scenario::Lifted2d => {
                session.lift_vertices().map_err(|e| e.to_string())?;
                expect_applied(session.triangulate(&mut engine))?;
                session.lift_triangles().map_err(|e| e.to_string())?;
            }
            Scenario::Tetrahedralize3d => {
                expect_applied(session.tetrahedralize(&mut engine))?;
            }
            Scenario::ClusteringPipeline => {
                expect_applied(session.cluster(&mut engine))?;
                expect_applied(session.simplify(&mut engine))?;
                expect_applied(session.triangulate_from_simplified(&mut engine))?;
            }
        }

        Ok(report(scenario, &mut session))
    }

    fn expect_applied<E: std::fmt::Display>(result: Result<Outcome, E>) -> Result<(), String> {
        match result.map_err(|e| e.to_string())? {
            Outcome::Applied => Ok(()),
            Outcome::Failed(err) => Err(err.to_string()),
            Outcome::Discarded => Err("response was discarded".to_string()),
        }
    }

    fn report(scenario: Scenario, session: &mut Session) -> String {
        let store = session.store();
        let summary = selectors::summary(store);
        let mut scene = Scene::new();
        let primitives = scene.sync(store).added.len();

        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", scenario.name());
        let _ = writeln!(
            out,
            "mode {} / {} / stage {:?}",
            summary.dimension, summary.method, summary.stage
        );
        let _ = writeln!(
            out,
            "vertices={} triangles={} tetrahedra={} lifted_vertices={} lifted_triangles={}",
            summary.vertex_count,
            summary.triangle_count,
            summary.tetrahedron_count,
            summary.lifted_vertex_count,
            summary.lifted_triangle_count
        );

        if summary.cluster_count > 0 {
            let stats = summary.cluster_stats;
            let _ = writeln!(
                out,
                "clusters={} simplified={} avg_size={:.2} largest={} smallest={} total_area={:.3} avg_area={:.3}",
                stats.total_clusters,
                summary.simplified_vertex_count,
                stats.average_vertices_per_cluster,
                stats.largest_cluster_size,
                stats.smallest_cluster_size,
                stats.total_area,
                stats.average_area
            );
            let malformed = selectors::malformed_rectangles(store.cluster_rectangles());
            if !malformed.is_empty() {
                let _ = writeln!(out, "malformed rectangles: {}", malformed.join(", "));
            }
        }
        let _ = writeln!(out, "primitives={primitives}");

        for note in session.take_notifications() {
            let tag = match note.level {
                Level::Success => "ok",
                Level::Error => "error",
            };
            let _ = writeln!(out, "[{tag}] {}", note.message);
        }
        out
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }

        fn parsed<T: std::str::FromStr>(&mut self, flag: &str) -> Result<T, String>
        where
            T::Err: std::fmt::Display,
        {
            let raw = self.value(flag)?;
            raw.parse()
                .map_err(|e| format!("invalid value `{raw}` for {flag}: {e}"))
        }
    }
}
