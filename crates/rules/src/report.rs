//! Scan reports: findings joined with their threat and element, rendered as
//! JSON or a plain-text table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threatlens_core::{Diagram, ElementCategory, Finding, Severity, Threat};

/// One finding with its threat and element resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub rule: String,
    pub threat: String,
    pub threat_name: String,
    pub severity: Severity,
    pub element: ElementCategory,
    pub shape: String,
    /// Element id, when the shape can still be found in the diagram.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_name: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub mitigation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub rules_evaluated: usize,
    pub elements: usize,
    /// Most severe first, then in scan order.
    pub findings: Vec<ReportRow>,
    pub counts: BTreeMap<Severity, usize>,
}

impl ScanReport {
    /// Join scan output with the threat catalog and the diagram.
    ///
    /// Findings whose threat is missing from `threats` are dropped, though the
    /// analyzer never produces them.
    pub fn build(
        findings: &[Finding],
        diagram: &Diagram,
        threats: &[Threat],
        rules_evaluated: usize,
    ) -> Self {
        let mut rows: Vec<ReportRow> = findings
            .iter()
            .filter_map(|finding| {
                let threat = threats.iter().find(|t| t.id == finding.threat)?;
                let element = diagram
                    .by_category(finding.element)
                    .find(|e| e.shape() == finding.shape);
                Some(ReportRow {
                    rule: finding.rule.clone(),
                    threat: threat.id.clone(),
                    threat_name: threat.name.clone(),
                    severity: threat.severity,
                    element: finding.element,
                    shape: finding.shape.clone(),
                    element_id: element.map(|e| e.id.clone()),
                    element_name: element.map(|e| e.display_name().to_string()),
                    mitigation: threat.mitigation.clone(),
                })
            })
            .collect();
        // Stable, so scan order is kept within a severity.
        rows.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut counts = BTreeMap::new();
        for row in &rows {
            *counts.entry(row.severity).or_insert(0) += 1;
        }

        Self {
            generated_at: Utc::now(),
            rules_evaluated,
            elements: diagram.len(),
            findings: rows,
            counts,
        }
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.counts
            .range(severity..)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Fixed-width table followed by a per-severity summary line.
    pub fn to_table(&self) -> String {
        let headers = ["SEVERITY", "THREAT", "RULE", "ELEMENT", "SHAPE", "NAME"];
        let cells: Vec<[String; 6]> = self
            .findings
            .iter()
            .map(|row| {
                [
                    row.severity.to_string(),
                    row.threat_name.clone(),
                    row.rule.clone(),
                    row.element.to_string(),
                    row.shape.clone(),
                    row.element_name.clone().unwrap_or_default(),
                ]
            })
            .collect();

        let mut widths = headers.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, &headers, &widths);
        for row in &cells {
            push_row(&mut out, row, &widths);
        }

        let summary: Vec<String> = self
            .counts
            .iter()
            .rev()
            .map(|(severity, count)| format!("{} {}", count, severity))
            .collect();
        out.push_str(&format!(
            "\n{} finding(s) from {} rule(s) over {} element(s){}{}\n",
            self.findings.len(),
            self.rules_evaluated,
            self.elements,
            if summary.is_empty() { "" } else { ": " },
            summary.join(", ")
        ));
        out
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref(), width = width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
