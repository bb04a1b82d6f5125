//! Dependency Aggregation
//!
//! Folds the service-call edges observed during a batch into a report of
//! who calls whom and how.

use crate::domain::execution::{CallKind, DependencyReport, ExecutionResult};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregates every reported edge across a batch of results. Pure over its
/// input; result order does not affect the report.
pub fn analyze(results: &[ExecutionResult]) -> DependencyReport {
    let mut report = DependencyReport::default();
    let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for result in results {
        for edge in &result.service_calls {
            report.total_service_calls += 1;
            dependencies
                .entry(edge.source_service.clone())
                .or_default()
                .insert(edge.target_service.clone());
            match edge.call_type {
                Some(CallKind::Sync) => report.patterns.synchronous_calls += 1,
                Some(CallKind::Async) => report.patterns.asynchronous_calls += 1,
                // Unannotated calls land in neither tally.
                None => {}
            }
            if edge.error_propagated {
                report.patterns.error_propagation += 1;
            }
        }
    }

    report.service_dependencies = dependencies;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{ServiceCallEdge, TestStatus};

    fn edge(source: &str, target: &str, kind: Option<CallKind>, propagated: bool) -> ServiceCallEdge {
        ServiceCallEdge {
            source_service: source.to_string(),
            target_service: target.to_string(),
            endpoint: "/x".to_string(),
            method: "GET".to_string(),
            status: Some(200),
            response_time: Some(5),
            call_type: kind,
            error_propagated: propagated,
        }
    }

    fn result_with(edges: Vec<ServiceCallEdge>) -> ExecutionResult {
        ExecutionResult {
            status: TestStatus::Passed,
            response_status_code: Some(200),
            response_body: None,
            response_time_ms: 1,
            error_message: None,
            execution_log: None,
            service_calls: edges,
        }
    }

    #[test]
    fn test_analyze_groups_targets_by_source() {
        let results = vec![
            result_with(vec![
                edge("A", "B", Some(CallKind::Sync), false),
                edge("A", "C", Some(CallKind::Sync), false),
            ]),
            result_with(vec![edge("B", "C", Some(CallKind::Async), true)]),
        ];
        let report = analyze(&results);

        assert_eq!(report.total_service_calls, 3);
        assert_eq!(
            report.service_dependencies["A"],
            BTreeSet::from(["B".to_string(), "C".to_string()])
        );
        assert_eq!(
            report.service_dependencies["B"],
            BTreeSet::from(["C".to_string()])
        );
        assert_eq!(report.patterns.synchronous_calls, 2);
        assert_eq!(report.patterns.asynchronous_calls, 1);
        assert_eq!(report.patterns.error_propagation, 1);
    }

    #[test]
    fn test_analyze_counts_repeated_edges_once_in_dependencies() {
        let results = vec![result_with(vec![
            edge("A", "B", None, false),
            edge("A", "B", None, false),
        ])];
        let report = analyze(&results);
        assert_eq!(report.total_service_calls, 2);
        assert_eq!(report.service_dependencies["A"].len(), 1);
    }

    #[test]
    fn test_unannotated_calls_count_in_neither_tally() {
        let results = vec![result_with(vec![edge("A", "B", None, false)])];
        let report = analyze(&results);
        assert_eq!(report.total_service_calls, 1);
        assert_eq!(report.patterns.synchronous_calls, 0);
        assert_eq!(report.patterns.asynchronous_calls, 0);
    }

    #[test]
    fn test_analyze_is_order_insensitive() {
        let forward = vec![
            result_with(vec![edge("A", "B", Some(CallKind::Sync), false)]),
            result_with(vec![edge("B", "C", Some(CallKind::Async), false)]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = analyze(&forward);
        let b = analyze(&reversed);
        assert_eq!(a.service_dependencies, b.service_dependencies);
        assert_eq!(a.patterns, b.patterns);
        assert_eq!(a.total_service_calls, b.total_service_calls);
    }

    #[test]
    fn test_analyze_empty_batch() {
        let report = analyze(&[]);
        assert_eq!(report.total_service_calls, 0);
        assert!(report.service_dependencies.is_empty());
        assert_eq!(report.patterns, Default::default());
    }
}
