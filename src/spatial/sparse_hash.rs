//! Sparse hash grid for efficient radius queries

use ahash::AHashMap;
use crate::core::types::{EntityId, Vec2};

/// Sparse hash grid bucketing entity positions by cell
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    pub fn remove(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|(e, _)| *e != entity);
        }
    }

    /// Move an entity's entry to a new position, changing cells if needed
    pub fn relocate(&mut self, entity: EntityId, from: Vec2, to: Vec2) {
        let (old, new) = (self.cell_coord(from), self.cell_coord(to));
        if old == new {
            if let Some(entry) = self
                .cells
                .get_mut(&old)
                .and_then(|cell| cell.iter_mut().find(|(e, _)| *e == entity))
            {
                entry.1 = to;
                return;
            }
        }
        self.remove(entity, from);
        self.insert(entity, to);
    }

    /// Entities within `radius` of `center`, paired with their distance.
    /// Walks as many rings of cells as the radius needs.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<(EntityId, f32)> {
        if radius < 0.0 {
            return Vec::new();
        }
        let (cx, cy) = self.cell_coord(center);
        let rings = (radius / self.cell_size).ceil() as i32;

        let mut found = Vec::new();
        for dx in -rings..=rings {
            for dy in -rings..=rings {
                let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for (entity, pos) in cell {
                    let distance = center.distance(pos);
                    if distance <= radius {
                        found.push((*entity, distance));
                    }
                }
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_radius_spans_multiple_cells() {
        let mut grid = SparseHashGrid::new(2.0);
        let near = EntityId::new();
        let far = EntityId::new();
        let outside = EntityId::new();
        grid.insert(near, Vec2::new(1.0, 0.0));
        grid.insert(far, Vec2::new(7.0, 0.0));
        grid.insert(outside, Vec2::new(12.0, 0.0));

        let found: Vec<EntityId> = grid
            .query_radius(Vec2::ZERO, 8.0)
            .into_iter()
            .map(|(e, _)| e)
            .collect();

        assert!(found.contains(&near));
        assert!(found.contains(&far));
        assert!(!found.contains(&outside));
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = SparseHashGrid::new(5.0);
        let e = EntityId::new();
        grid.insert(e, Vec2::new(-0.5, -0.5));
        let found = grid.query_radius(Vec2::new(0.5, 0.5), 2.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut grid = SparseHashGrid::new(5.0);
        let e = EntityId::new();
        grid.insert(e, Vec2::new(1.0, 1.0));
        grid.remove(e, Vec2::new(1.0, 1.0));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_relocate_across_and_within_cells() {
        let mut grid = SparseHashGrid::new(5.0);
        let e = EntityId::new();
        grid.insert(e, Vec2::new(30.0, 0.0));

        grid.relocate(e, Vec2::new(30.0, 0.0), Vec2::new(1.0, 0.0));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.query_radius(Vec2::ZERO, 2.0).len(), 1);
        assert!(grid.query_radius(Vec2::new(30.0, 0.0), 2.0).is_empty());

        // Same cell: the stored position still follows
        grid.relocate(e, Vec2::new(1.0, 0.0), Vec2::new(4.0, 0.0));
        assert_eq!(grid.len(), 1);
        assert!(grid.query_radius(Vec2::ZERO, 2.0).is_empty());
        assert_eq!(grid.query_radius(Vec2::new(4.0, 0.0), 0.5).len(), 1);
    }
}
