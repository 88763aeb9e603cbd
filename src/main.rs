use anyhow::Context;
use clap::{Parser, Subcommand};
use scenario_replay::engine::HostMonitor;
use scenario_replay::executor::DummyExecutor;
use scenario_replay::scenario::{DataOrigin, load_scenario_from_file};
use scenario_replay::session::ScenarioSession;
use scenario_replay::steps::StepList;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "scenario-replay",
    version,
    about = "Replay recorded browser scenarios"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the compacted steps of a scenario
    Steps {
        /// Scenario YAML file
        file: PathBuf,
    },
    /// Replay a scenario against the logging driver
    Replay {
        /// Scenario YAML file
        file: PathBuf,
    },
    /// Resolve one named data item
    Resolve {
        /// Scenario YAML file
        file: PathBuf,
        /// Data scope: project or scenario
        #[arg(long, default_value = "scenario")]
        origin: DataOrigin,
        /// Data name
        name: String,
    },
}

/// 시나리오 파일을 읽어 하위 명령을 실행하는 진입점이다.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Steps { file } => {
            let scenario = load_scenario_from_file(&file)?;
            let steps = StepList::from_actions(&scenario.actions);
            for (i, step) in steps.iter().enumerate() {
                println!("{:>3}. [{}] {}", i + 1, step.kind_name(), step.display());
            }
        }
        Commands::Replay { file } => {
            let scenario = load_scenario_from_file(&file)?;
            let runtime = tokio::runtime::Runtime::new().context("tokio 런타임 생성 실패")?;
            let monitor = HostMonitor::new();
            monitor.set_ready(true);
            let mut session = ScenarioSession::new(scenario, Arc::new(DummyExecutor), monitor);
            let outcome = runtime.block_on(session.reset());
            let result = session.result();
            println!(
                "{:?}: {} action results",
                result.status,
                result.action_results.len()
            );
            if let Err(err) = outcome {
                anyhow::bail!("재생 실패: {err}");
            }
        }
        Commands::Resolve { file, origin, name } => {
            let scenario = load_scenario_from_file(&file)?;
            let mut ctx = scenario_replay::engine::ExecutionContext::new(
                scenario.project_data,
                scenario.data,
                &scenario.replay,
            );
            let value = ctx.resolve(origin, &name)?;
            println!("{value}");
        }
    }
    Ok(())
}
