use anyhow::Result;
use brigade_core::export::ExportFormat;
use brigade_core::guard::SecurityLevel;
use brigade_core::task::TaskStatus;
use brigade_core::Kernel;

use crate::seed::DEMO_TASK;

/// Print the score, guard summary, roster and active tasks.
pub fn status(kernel: &Kernel, level: SecurityLevel) {
    let report = kernel.guard_report(level);
    println!(
        "{}  score {}",
        kernel.status_banner().unwrap_or_default(),
        kernel.store().score()
    );
    println!("{}", report.summary());

    println!("\nBrigade:");
    for member in kernel.members() {
        println!(
            "  {:<8} {:<14} {}",
            member.id,
            report.anonymize(&member.name),
            report.anonymize(&member.role)
        );
    }

    println!("\nTasks:");
    for task in kernel.lifecycle().tasks() {
        println!(
            "  {:<8} {:<24} w{:<3} {}",
            task.id, task.title, task.weight, task.status
        );
    }
}


/// Run a rush-hour simulation and print the score response.
pub fn rush(kernel: &Kernel, count: usize) -> Result<()> {
    let before = kernel.store().score();
    kernel.simulate_rush_hour(count)?;
    println!("score {} -> {}", before, kernel.store().score());
    let history: Vec<String> = kernel
        .store()
        .history()
        .iter()
        .map(|p| p.score.to_string())
        .collect();
    println!("history: {}", history.join(" "));
    Ok(())
}


/// Seal the demo task, then print a sealed export.
pub fn export(
    kernel: &Kernel,
    format: ExportFormat,
    level: SecurityLevel,
    admin_requests: u64,
) -> Result<()> {
    for _ in 0..admin_requests {
        kernel.record_admin_request();
    }
    kernel.lifecycle().transition(DEMO_TASK, TaskStatus::InProgress)?;
    kernel.lifecycle().transition(DEMO_TASK, TaskStatus::Done)?;
    let sealed = kernel.export_sealed(format, level)?;
    println!("{sealed}");
    Ok(())
}


/// Print every check; true if all passed.
pub fn selfcheck(kernel: &Kernel) -> bool {
    let results = kernel.self_check();
    for r in &results {
        let mark = if r.passed { "OK  " } else { "FAIL" };
        println!("[{mark}] {:<24} {}", r.name, r.detail);
    }
    let failed = results.iter().filter(|r| !r.passed).count();
    println!("\n{} of {} checks passed", results.len() - failed, results.len());
    failed == 0
}
