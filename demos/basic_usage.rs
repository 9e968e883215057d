//! Basic usage example for the rcbd library.
//!
//! This example analyses a small vigour trial scored on two dates and prints
//! an ANOVA summary with letter groups for every assessment.

use rcbd::{AnalysisOutcome, Analyzer, AssessmentKey, PlotRecord, PlotScore, RawValue, TrialData};

fn main() {
    println!("rcbd - Basic Usage Example\n");

    let treatments = ["Untreated", "Product A", "Product B"];

    // scores[date][treatment][block]; "" marks a plot that was not scored
    let dates = [
        (
            "2024-05-01",
            [
                ["4.8", "5.2", "5.1", "4.9"],
                ["5.3", "4.9", "5.0", "5.2"],
                ["8.1", "7.8", "8.2", "7.9"],
            ],
        ),
        (
            "2024-06-12",
            [
                ["6.0", "6.4", "", "5.9"],
                ["6.2", "6.1", "6.6", "5.8"],
                ["6.3", "6.0", "6.1", "6.5"],
            ],
        ),
    ];

    let mut scores = Vec::new();
    for (date, grid) in &dates {
        for (t, row) in grid.iter().enumerate() {
            for (b, &value) in row.iter().enumerate() {
                scores.push(PlotScore {
                    key: AssessmentKey::new(*date, "vigour"),
                    record: PlotRecord::new(t as u32, b as u32, RawValue::from(value)),
                });
            }
        }
    }

    let trial = TrialData::from_scores(scores);
    let analyzer: Analyzer = Analyzer::default();

    for (key, outcome) in trial.analyze(&analyzer) {
        println!("== {key}");
        let report = match outcome {
            AnalysisOutcome::Report(report) => report,
            AnalysisOutcome::NoData(_) => {
                println!("  no data\n");
                continue;
            }
        };

        let anova = &report.anova;
        println!(
            "  F = {:.2}, p = {:.4}, significant: {}",
            anova.f_statistic, anova.p_value, anova.significant
        );
        println!(
            "  e.s.e. = {:.3}, s.e.d. = {:.3}, LSD = {:.3}, c.v. = {:.1}%",
            report.standard_errors.ese,
            report.standard_errors.sed,
            report.standard_errors.lsd,
            anova.coefficient_of_variation
        );
        if report.excluded > 0 {
            println!("  {} plot(s) without a usable score", report.excluded);
        }

        for summary in &report.treatments {
            let name = treatments[summary.treatment.0 as usize];
            println!(
                "  {:<10} {:>6.2} ± {:.2}  {}",
                name,
                summary.mean,
                summary.std_error,
                summary.letter_group.render(&report.not_applicable_label)
            );
        }
        println!();
    }
}
