use crate::constants::CellArea;
use crate::maze::GridGraph;
use crate::rng::Rng;
use crate::types::CellPos;

const RANDOM_CELL_ATTEMPTS: usize = 64;

/// Rolls cells inside `area` until one is open floor. Gives up after a bounded number of rolls.
pub(super) fn random_open_cell(graph: &GridGraph, rng: &mut Rng, area: CellArea) -> Option<CellPos> {
    (0..RANDOM_CELL_ATTEMPTS)
        .map(|_| rng.cell_in(area))
        .find(|cell| graph.is_walkable(*cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{HOME_BOX, ROAM_AREA};

    #[test]
    fn random_cells_are_open_and_inside_the_area() {
        let graph = GridGraph::classic();
        let mut rng = Rng::new(2024);
        for _ in 0..200 {
            let cell = random_open_cell(&graph, &mut rng, ROAM_AREA).expect("roam area has floor");
            assert!(graph.is_walkable(cell));
            assert!((ROAM_AREA.rows.0..=ROAM_AREA.rows.1).contains(&cell.row));
            assert!((ROAM_AREA.cols.0..=ROAM_AREA.cols.1).contains(&cell.col));
        }
    }

    #[test]
    fn solid_area_gives_up() {
        let graph = GridGraph::classic();
        let mut rng = Rng::new(5);
        let solid = CellArea {
            rows: (0, 0),
            cols: (0, 29),
        };
        assert_eq!(random_open_cell(&graph, &mut rng, solid), None);
        assert!(random_open_cell(&graph, &mut rng, HOME_BOX).is_some());
    }
}
