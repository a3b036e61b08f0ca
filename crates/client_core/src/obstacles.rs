use shared::domain::{Coordinate, ObstacleId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub coordinate: Coordinate,
}

/// Server-acknowledged obstacles in placement order. Entries are only ever
/// appended or dropped all at once.
#[derive(Debug, Clone, Default)]
pub struct ObstacleLedger {
    entries: Vec<Obstacle>,
}

impl ObstacleLedger {
    pub fn record(&mut self, coordinate: Coordinate) -> Obstacle {
        let obstacle = Obstacle {
            id: ObstacleId::new_v4(),
            coordinate,
        };
        self.entries.push(obstacle);
        obstacle
    }

    /// Empties the ledger, returning how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.entries.iter().any(|obstacle| obstacle.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Obstacle> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_placement_order_and_mints_distinct_ids() {
        let mut ledger = ObstacleLedger::default();
        let first = ledger.record(Coordinate::new(13.05, 80.21));
        let second = ledger.record(Coordinate::new(13.05, 80.21));

        assert_ne!(first.id, second.id);
        let ids: Vec<_> = ledger.iter().map(|obstacle| obstacle.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(ledger.contains(first.id));
    }

    #[test]
    fn clear_reports_removed_count() {
        let mut ledger = ObstacleLedger::default();
        ledger.record(Coordinate::new(13.0, 80.0));
        ledger.record(Coordinate::new(13.1, 80.1));

        assert_eq!(ledger.clear(), 2);
        assert!(ledger.is_empty());
        assert_eq!(ledger.clear(), 0);
    }
}
