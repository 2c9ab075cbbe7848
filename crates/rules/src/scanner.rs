//! Runs a rule set over a diagram, sequentially or on a rayon pool.

use std::time::Instant;

use rayon::prelude::*;
use threatlens_core::config::DEFAULT_MAX_RULE_DEPTH;
use threatlens_core::{Diagram, Finding, Threat};
use tracing::info;

use crate::analyzer::RuleAnalyzer;
use crate::schema::ThreatRule;

/// Scan driver. Findings are ordered by rule, then by element, in both modes.
#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    max_depth: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RULE_DEPTH)
    }
}

impl Scanner {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Evaluate every enabled rule with a single analyzer.
    pub fn scan(&self, rules: &[ThreatRule], diagram: &Diagram, threats: &[Threat]) -> Vec<Finding> {
        let start = Instant::now();
        let mut analyzer = RuleAnalyzer::with_max_depth(self.max_depth);
        let mut results = Vec::new();

        for rule in rules.iter().filter(|r| r.is_enabled()) {
            analyzer.start_evaluation(rule, diagram, threats, &mut results);
        }

        info!(
            rules = rules.len(),
            elements = diagram.len(),
            findings = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );
        results
    }

    /// Evaluate enabled rules on a pool of `threads` workers, one analyzer per rule.
    pub fn scan_parallel(
        &self,
        rules: &[ThreatRule],
        diagram: &Diagram,
        threats: &[Threat],
        threads: usize,
    ) -> Result<Vec<Finding>, rayon::ThreadPoolBuildError> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("threat-scan-{}", i))
            .build()?;

        let max_depth = self.max_depth;
        let per_rule: Vec<Vec<Finding>> = pool.install(|| {
            rules
                .par_iter()
                .filter(|r| r.is_enabled())
                .map(|rule| {
                    let mut results = Vec::new();
                    RuleAnalyzer::with_max_depth(max_depth)
                        .start_evaluation(rule, diagram, threats, &mut results);
                    results
                })
                .collect()
        });
        let results: Vec<Finding> = per_rule.into_iter().flatten().collect();

        info!(
            rules = rules.len(),
            elements = diagram.len(),
            findings = results.len(),
            threads = pool.current_num_threads(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "parallel scan complete"
        );
        Ok(results)
    }
}
