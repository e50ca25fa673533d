use std::fs::File;
use std::io::Write;
use std::time;

use colored::Colorize;
use log::{info, warn};
use rustc_hash::FxHashMap;
use z3::{Config, Context};

use pathsynth::executor::symbolic_execution::{ExplorationReport, SymbolicExecutor};
use pathsynth::executor::symbolic_setting::{load_setting_from_json, SymbolicExecutorSetting};
use pathsynth::input_user::Input;
use pathsynth::parser_user;
use pathsynth::program::Program;
use pathsynth::stats::symbolic_stats::{
    path_summary_csv_headers, print_path_summary_statistics_csv,
    print_path_summary_statistics_pretty, PathStatistics,
};
use pathsynth::synthesizer::test_case::{synthesize_test_cases, TestCase};
use pathsynth::VERSION;

fn display_pathsynth_header() {
    let logo = r#"
          pathsynth
   Symbolic Test Synthesizer
    "#;

    eprintln!("{}", logo.bright_cyan().bold());
    eprintln!("{} {}", "Welcome to pathsynth".green().bold(), VERSION.dimmed());
    eprintln!("{}", "══════════════════════════════════".green());
}

fn main() {
    display_pathsynth_header();

    let result = start();
    if result.is_err() {
        eprintln!("{}", "previous errors were found".red());
        std::process::exit(exitcode::SOFTWARE);
    } else {
        eprintln!("{}", "Everything went okay".green());
        std::process::exit(exitcode::OK);
    }
}

fn load_setting(user_input: &Input) -> Result<SymbolicExecutorSetting, ()> {
    let mut setting = match &user_input.path_to_setting {
        Some(path) => load_setting_from_json(path).map_err(|e| {
            eprintln!("{} {}", "error: malformed setting file:".red().bold(), e);
        })?,
        None => SymbolicExecutorSetting::default(),
    };
    if let Some(strategy) = user_input.strategy {
        setting.strategy = strategy;
    }
    if let Some(seed) = user_input.seed {
        setting.seed = seed;
    }
    Ok(setting)
}

fn print_report(report: &ExplorationReport, cases: &[TestCase]) {
    eprintln!(
        "{}",
        "╔═══════════════════════════════════════════════════════════════╗".green()
    );
    eprintln!(
        "{}",
        "║                        pathsynth Report                       ║".green()
    );
    eprintln!(
        "{}",
        "╚═══════════════════════════════════════════════════════════════╝".green()
    );
    eprintln!(
        "{} {}",
        "📊 Exploration Summary:".cyan().bold(),
        report.function.bright_yellow()
    );
    eprintln!(" ├─ Completed Paths   : {}", report.completed_paths.len());
    eprintln!(" ├─ Dropped Paths     : {}", report.dropped_paths.len());
    for (reason, count) in report.dropped_reasons() {
        eprintln!(" │   • {:<20}: {}", reason, count);
    }
    eprintln!(" ├─ Pruned Branches   : {}", report.pruned_branches);
    eprintln!(" ├─ Distinct Paths    : {}", report.coverage.coverage_count());
    if let Some(reason) = &report.stopped_early {
        eprintln!(" ├─ Stopped Early     : {}", reason.yellow());
    }
    eprintln!(" └─ Execution Time    : {:?}", report.elapsed);

    for (index, path) in report.completed_paths.iter().enumerate() {
        info!(
            "path #{} of `{}`: {}",
            index,
            report.function,
            path.constraints
                .iter()
                .map(|c| format!("{}", c))
                .collect::<Vec<_>>()
                .join(" ∧ ")
        );
    }
    for case in cases {
        eprintln!("{}", case.lookup_fmt());
    }
}

fn save_test_cases(
    user_input: &Input,
    function: &str,
    setting: &SymbolicExecutorSetting,
    cases: &[TestCase],
    start_time: &time::Instant,
) -> Result<(), ()> {
    let meta = FxHashMap::from_iter([
        ("target_path".to_string(), user_input.input_file().to_string()),
        ("strategy".to_string(), setting.strategy.to_string()),
        ("seed".to_string(), setting.seed.to_string()),
        (
            "execution_time".to_string(),
            format!("{:?}", start_time.elapsed()),
        ),
    ]);
    let json_output = serde_json::Value::Array(
        cases
            .iter()
            .map(|case| case.to_json_with_meta(&meta))
            .collect(),
    );

    let file_path = format!("{}_{}_tests.json", user_input.input_file(), function);
    eprintln!("{} {}", "💾 Saving the output to:", file_path.cyan());

    let json_string = serde_json::to_string_pretty(&json_output).map_err(|e| {
        eprintln!("{} {}", "error:".red().bold(), e);
    })?;
    let mut file = File::create(&file_path).map_err(|e| {
        eprintln!("{} {}", "error: unable to create file:".red().bold(), e);
    })?;
    file.write_all(json_string.as_bytes()).map_err(|e| {
        eprintln!("{} {}", "error: unable to write data:".red().bold(), e);
    })
}

fn target_functions(program: &Program, user_input: &Input) -> Result<Vec<String>, ()> {
    match &user_input.function {
        Some(name) if program.function(name).is_some() => Ok(vec![name.clone()]),
        Some(name) => {
            eprintln!("{} no function named `{}`", "error:".red().bold(), name);
            Err(())
        }
        None => Ok(program.function_names()),
    }
}

fn start() -> Result<(), ()> {
    let start_time = time::Instant::now();

    let user_input = Input::new()?;
    let program = parser_user::parse_project(&user_input)?;

    env_logger::init();

    let setting = load_setting(&user_input)?;
    info!("\n{}", setting);

    let cfg = Config::new();
    let ctx = Context::new(&cfg);
    let mut sym_executor = SymbolicExecutor::new(&ctx, &program, &setting);

    let mut stats = PathStatistics::new();
    for function in target_functions(&program, &user_input)? {
        eprintln!(
            "{} {}",
            "🛒 Exploring".green(),
            function.bright_yellow()
        );
        let report = match sym_executor.explore(&function) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{} {}", "fatal:".red().bold(), e);
                return Err(());
            }
        };
        if let Some(reason) = &report.stopped_early {
            warn!("`{}` stopped early: {}", function, reason);
        }

        let cases =
            synthesize_test_cases(&mut sym_executor.oracle, &report, setting.max_model_depth);
        print_report(&report, &cases);
        if user_input.flag_save_output {
            save_test_cases(&user_input, &function, &setting, &cases, &start_time)?;
        }
        stats.update_from_report(&report);
    }

    if user_input.flag_printout_stats {
        println!(
            "\n{}",
            "🪶 Stats of Explored Paths ══════════════════════"
                .yellow()
                .bold()
        );
        print_path_summary_statistics_pretty(&stats);
    } else if user_input.flag_printout_stats_csv {
        println!("{}", path_summary_csv_headers().join(","));
        print_path_summary_statistics_csv(&stats);
    }
    eprintln!(
        "{}",
        "════════════════════════════════════════════════════════════════".green()
    );
    Ok(())
}
