use std::collections::HashMap;

/// Spatial hash grid for region queries. Items are bucketed by the cell
/// containing their (lon, lat); queries return candidate indices that the
/// caller filters by exact distance.
pub struct SpatialGrid<T> {
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<T>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        (
            (lon / self.cell_size).floor() as i32,
            (lat / self.cell_size).floor() as i32,
        )
    }

    /// Insert an item at a geographic position
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);
        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Candidate indices within `radius_degrees` of a point (a square of
    /// cells, so some candidates may lie outside the radius)
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let (cx, cy) = self.to_cell(lon, lat);
        let reach = (radius_degrees / self.cell_size).ceil().max(0.0) as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_neighbouring_cells() {
        let mut grid = SpatialGrid::new(0.01);
        grid.insert(-96.8000, 32.7800, "a");
        grid.insert(-96.8055, 32.7805, "b");
        grid.insert(-96.7000, 32.9000, "far");

        let mut hits = grid.query_radius(-96.8010, 32.7801, 0.005);
        hits.sort();
        assert_eq!(hits, vec![0, 1]);
        assert_eq!(grid.get(1), Some(&"b"));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_empty_grid() {
        let grid: SpatialGrid<u8> = SpatialGrid::new(0.01);
        assert!(grid.is_empty());
        assert!(grid.query_radius(0.0, 0.0, 1.0).is_empty());
    }
}
