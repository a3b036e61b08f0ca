//! Plain-text renderings of the metrics panel and travel card.

use std::fmt::Write;

use client_core::{
    format::{
        format_computation_time, format_distance, format_percent, format_ratio,
        format_travel_time, TrafficCondition, AVERAGE_SPEED_KMH,
    },
    SessionSnapshot,
};

pub fn metrics_panel(snapshot: &SessionSnapshot) -> String {
    let Some(metrics) = snapshot.metrics() else {
        if snapshot.paths.is_empty() {
            return "No paths computed yet.\n".to_string();
        }
        return format!(
            "No algorithm found a path ({} failed).\n",
            snapshot.paths.failed_count()
        );
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:>10} {:>10} {:>8} {:>9} {:>10}",
        "algorithm", "time", "distance", "travel", "speedup", "efficiency"
    );
    for row in snapshot.rows() {
        let marker = if row.is_fastest { "*" } else { " " };
        let selected = if snapshot.selection.selected == Some(row.id) {
            ">"
        } else {
            " "
        };
        let _ = writeln!(
            out,
            "{selected}{marker}{:<22} {:>10} {:>10} {:>8} {:>9} {:>10}",
            row.id.display_name(),
            format_computation_time(row.time_secs),
            format_distance(row.distance_km),
            format_travel_time(row.travel_time),
            format_ratio(row.speedup),
            format_percent(row.efficiency_pct),
        );
    }
    for (id, result) in snapshot.paths.iter().filter(|(_, r)| !r.is_valid()) {
        let reason = result.error.as_deref().unwrap_or("failed");
        let _ = writeln!(out, "  {:<22} error: {reason}", id.display_name());
    }
    let _ = writeln!(
        out,
        "fastest: {}  max speedup: {}  valid: {}  failed: {}",
        metrics.fastest.display_name(),
        format_ratio(metrics.max_speedup()),
        metrics.valid_count,
        metrics.failed_count,
    );
    out
}

pub fn travel_card(snapshot: &SessionSnapshot) -> Option<String> {
    let (id, result) = snapshot.active_result()?;
    let traffic = TrafficCondition::from_average_speed(AVERAGE_SPEED_KMH);
    let mut out = String::new();
    let _ = writeln!(out, "route via {}", id.display_name());
    let _ = writeln!(out, "  distance:      {}", format_distance(result.distance_km));
    let _ = writeln!(
        out,
        "  travel time:   {}",
        format_travel_time(result.travel_time)
    );
    let _ = writeln!(out, "  average speed: {AVERAGE_SPEED_KMH} km/h");
    let _ = writeln!(out, "  traffic:       {}", traffic.label());
    let _ = writeln!(out, "  waypoints:     {}", result.path.len());
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{LocationSlot, PathResultTable, Selection};
    use shared::{
        domain::{AlgorithmId, TravelTime},
        protocol::{AlgorithmResultPayload, PathsPayload},
    };

    fn snapshot_with(paths: PathsPayload, selected: Option<AlgorithmId>) -> SessionSnapshot {
        let paths = PathResultTable::from_payload(paths);
        SessionSnapshot {
            start: LocationSlot::default(),
            end: LocationSlot::default(),
            selection: Selection {
                selected,
                fastest: paths.fastest(),
            },
            paths,
            obstacles: Vec::new(),
            obstacle_mode: false,
            calculating: false,
            has_auto_zoomed: false,
        }
    }

    fn entry(time: f64, distance: f64) -> AlgorithmResultPayload {
        AlgorithmResultPayload {
            distance: Some(distance),
            time: Some(time),
            travel_time: TravelTime {
                hours: 0,
                minutes: 12,
            },
            path: vec![[13.08, 80.27], [13.07, 80.26], [13.06, 80.25]],
            error: None,
        }
    }

    fn sample() -> PathsPayload {
        let mut paths = PathsPayload::new();
        paths.insert("parallel_dijkstra".into(), entry(0.125, 8.2));
        paths.insert("sequential_dijkstra".into(), entry(0.5, 8.2));
        paths.insert(
            "parallel_astar".into(),
            AlgorithmResultPayload {
                error: Some("No path found or timeout".into()),
                ..AlgorithmResultPayload::default()
            },
        );
        paths
    }

    #[test]
    fn panel_lists_rows_failures_and_summary() {
        let panel = metrics_panel(&snapshot_with(sample(), Some(AlgorithmId::ParallelDijkstra)));

        assert!(panel.contains(">*parallel dijkstra"));
        assert!(panel.contains("125.00ms"));
        assert!(panel.contains("parallel astar         error: No path found or timeout"));
        assert!(panel.contains("fastest: parallel dijkstra  max speedup: 4.00x  valid: 2  failed: 1"));
    }

    #[test]
    fn panel_reports_empty_and_all_failed_tables() {
        assert_eq!(
            metrics_panel(&snapshot_with(PathsPayload::new(), None)),
            "No paths computed yet.\n"
        );

        let mut failed = PathsPayload::new();
        failed.insert(
            "sequential_astar".into(),
            AlgorithmResultPayload {
                error: Some("timeout".into()),
                ..AlgorithmResultPayload::default()
            },
        );
        assert_eq!(
            metrics_panel(&snapshot_with(failed, None)),
            "No algorithm found a path (1 failed).\n"
        );
    }

    #[test]
    fn travel_card_follows_selection() {
        let card = travel_card(&snapshot_with(sample(), Some(AlgorithmId::SequentialDijkstra)))
            .expect("card");

        assert!(card.starts_with("route via sequential dijkstra\n"));
        assert!(card.contains("distance:      8.20km"));
        assert!(card.contains("travel time:   0h 12m"));
        assert!(card.contains("traffic:       Light Traffic"));
        assert!(card.contains("waypoints:     3"));
    }

    #[test]
    fn travel_card_is_absent_without_valid_results() {
        assert_eq!(travel_card(&snapshot_with(PathsPayload::new(), None)), None);
    }
}
