use tracing::info;

use super::incremental::UpdateReport;

/// Consumer of per-insertion reports
pub trait ReportSink {
    fn accept(&mut self, report: &UpdateReport);
}

/// Logs every non-empty report through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn accept(&mut self, report: &UpdateReport) {
        if report.is_unchanged() {
            return;
        }
        for entry in &report.added {
            info!(tid = report.tid, itemset = ?entry.itemset, average = entry.average_utility, "added");
        }
        for entry in &report.updated {
            info!(tid = report.tid, itemset = ?entry.itemset, average = entry.average_utility, "updated");
        }
        for entry in &report.retracted {
            info!(tid = report.tid, itemset = ?entry.itemset, average = entry.average_utility, "retracted");
        }
    }
}

/// Keeps every report, mostly for tests and batch drivers.
#[derive(Debug, Default)]
pub struct VecSink {
    pub reports: Vec<UpdateReport>,
}

impl ReportSink for VecSink {
    fn accept(&mut self, report: &UpdateReport) {
        self.reports.push(report.clone());
    }
}
