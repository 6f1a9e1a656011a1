use crate::planner::RenamePlan;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RenameFailure {
    pub path: PathBuf,
    pub target: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub renamed: usize,
    pub unchanged: usize,
    pub failures: Vec<RenameFailure>,
}

pub fn apply_plan(plan: &RenamePlan) -> ApplyReport {
    let mut report = ApplyReport::default();

    for candidate in &plan.candidates {
        if !candidate.changed {
            report.unchanged += 1;
            continue;
        }

        if candidate.target_path.exists() {
            report.failures.push(RenameFailure {
                path: candidate.original_path.clone(),
                target: candidate.target_path.clone(),
                reason: "リネーム先が既に存在します".to_string(),
            });
            continue;
        }

        match fs::rename(&candidate.original_path, &candidate.target_path) {
            Ok(()) => report.renamed += 1,
            Err(err) => report.failures.push(RenameFailure {
                path: candidate.original_path.clone(),
                target: candidate.target_path.clone(),
                reason: err.to_string(),
            }),
        }
    }

    report
}
