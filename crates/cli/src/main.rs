use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use pict_renamer_core::{apply_plan, generate_plan, ApplyReport, PlanOptions, RenamePlan};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "renamer")]
#[command(about = "対象フォルダ内の画像ファイルを更新日時ベースの名前へ一括リネームします")]
struct Cli {
    target_directory: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let is_help = matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _ = err.print();
            return if is_help {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(&cli) {
        Ok(report) if report.failures.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("エラー: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ApplyReport> {
    let options = PlanOptions {
        input: cli.target_directory.clone(),
        ..PlanOptions::default()
    };

    let plan = generate_plan(&options)?;
    let report = apply_plan(&plan);
    print_report(&plan, &report);

    Ok(report)
}

fn print_report(plan: &RenamePlan, report: &ApplyReport) {
    for candidate in plan.candidates.iter().filter(|c| c.changed) {
        println!(
            "{} -> {}",
            candidate.original_path.display(),
            candidate.target_path.display()
        );
    }

    for skipped in &plan.skipped {
        println!("スキップ: {} ({})", skipped.path.display(), skipped.reason);
    }

    for failure in &report.failures {
        eprintln!(
            "失敗: {} -> {} ({})",
            failure.path.display(),
            failure.target.display(),
            failure.reason
        );
    }

    println!(
        "\n集計: scanned={} images={} non_image_skip={} hidden_skip={} renamed={} unchanged={} failed={}",
        plan.stats.scanned_files,
        plan.stats.image_files,
        plan.stats.skipped_non_image,
        plan.stats.skipped_hidden,
        report.renamed,
        report.unchanged,
        report.failures.len()
    );
}
