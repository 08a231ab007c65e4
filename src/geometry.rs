//! Seat numbering and room geometry.
//!
//! Seats are numbered from 1. Two layouts are supported:
//! - strict bench: seats pair up on two-seat benches, benches fill rows of
//!   `benches_per_row` from the front;
//! - distance: seats fill a near-square `rows x cols` rectangle row by row.
//!
//! Both expose the same `SeatGrid` so renderers do not care which one ran.

use crate::config::SeatingConfig;
use crate::data::{RoomLayout, SeatGrid, SeatNumber, Side};

pub const SEATS_PER_BENCH: u32 = 2;

/// Bench placement of `seat` under the strict layout.
pub fn seat_to_grid(seat: SeatNumber, benches_per_row: u32) -> SeatGrid {
    debug_assert!(seat >= 1, "seat numbers start at 1");
    let index = seat - 1;
    let bench_num = index / SEATS_PER_BENCH;
    SeatGrid {
        row: bench_num / benches_per_row,
        col: bench_num % benches_per_row,
        position: if index % SEATS_PER_BENCH == 0 {
            Side::Left
        } else {
            Side::Right
        },
        bench_num,
    }
}

/// Inverse of [`seat_to_grid`].
pub fn grid_to_seat(bench_num: u32, position: Side) -> SeatNumber {
    let offset = match position {
        Side::Left => 1,
        Side::Right => 2,
    };
    bench_num * SEATS_PER_BENCH + offset
}

pub fn strict_layout(capacity: u32, benches_per_row: u32) -> RoomLayout {
    let total_benches = capacity.div_ceil(SEATS_PER_BENCH);
    RoomLayout {
        total_rows: total_benches.div_ceil(benches_per_row),
        total_columns: benches_per_row,
        benches_per_row,
        total_benches,
    }
}

/// Near-square rectangle used by the distance layout and for position scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceGrid {
    pub rows: u32,
    pub cols: u32,
}

impl DistanceGrid {
    pub fn for_capacity(capacity: u32) -> Self {
        let rows = ((capacity as f64).sqrt().floor() as u32).max(1);
        let cols = capacity.div_ceil(rows).max(1);
        Self { rows, cols }
    }

    pub fn coords(&self, seat: SeatNumber) -> (u32, u32) {
        let index = seat - 1;
        (index / self.cols, index % self.cols)
    }

    pub fn seat_grid(&self, seat: SeatNumber) -> SeatGrid {
        let (row, col) = self.coords(seat);
        let index = seat - 1;
        SeatGrid {
            row,
            col,
            position: if index % SEATS_PER_BENCH == 0 {
                Side::Left
            } else {
                Side::Right
            },
            bench_num: index / SEATS_PER_BENCH,
        }
    }

    pub fn layout(&self, capacity: u32) -> RoomLayout {
        RoomLayout {
            total_rows: self.rows,
            total_columns: self.cols,
            benches_per_row: self.cols.div_ceil(SEATS_PER_BENCH),
            total_benches: capacity.div_ceil(SEATS_PER_BENCH),
        }
    }
}

/// Distance from the grid centre plus a checkerboard bonus. Higher means the
/// seat is better for spreading subjects out.
pub fn position_score(row: u32, col: u32, total_rows: u32, total_cols: u32) -> f64 {
    let center_row = total_rows as f64 / 2.0;
    let center_col = total_cols as f64 / 2.0;
    let dr = row as f64 - center_row;
    let dc = col as f64 - center_col;
    let checkerboard_bonus = if (row + col) % 2 == 0 { 10.0 } else { 0.0 };
    (dr * dr + dc * dc).sqrt() + checkerboard_bonus
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatPosition {
    pub seat: SeatNumber,
    pub row: u32,
    pub col: u32,
    pub position_score: f64,
}

/// Every seat of the room with its position score, ascending by score.
/// Equal scores keep seat-number order.
pub fn generate_seat_positions(capacity: u32, rows: u32, cols: u32) -> Vec<SeatPosition> {
    let cols = cols.max(1);
    let mut positions: Vec<SeatPosition> = (1..=capacity)
        .map(|seat| {
            let row = (seat - 1) / cols;
            let col = (seat - 1) % cols;
            SeatPosition {
                seat,
                row,
                col,
                position_score: position_score(row, col, rows, cols),
            }
        })
        .collect();
    positions.sort_by(|a, b| a.position_score.total_cmp(&b.position_score));
    positions
}

/// The layout a room is arranged in for one allocation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    StrictBench { benches_per_row: u32 },
    Distance,
}

impl Geometry {
    pub fn from_config(config: &SeatingConfig) -> Self {
        if config.strict_mode {
            Geometry::StrictBench {
                benches_per_row: config.benches_per_row,
            }
        } else {
            Geometry::Distance
        }
    }

    pub fn seat_to_grid(&self, seat: SeatNumber, capacity: u32) -> SeatGrid {
        match self {
            Geometry::StrictBench { benches_per_row } => seat_to_grid(seat, *benches_per_row),
            Geometry::Distance => DistanceGrid::for_capacity(capacity).seat_grid(seat),
        }
    }

    pub fn layout(&self, capacity: u32) -> RoomLayout {
        match self {
            Geometry::StrictBench { benches_per_row } => strict_layout(capacity, *benches_per_row),
            Geometry::Distance => DistanceGrid::for_capacity(capacity).layout(capacity),
        }
    }

    /// Physical coordinates (row, column) of a seat, in seat widths.
    pub fn spatial_coords(&self, seat: SeatNumber, capacity: u32) -> (f64, f64) {
        match self {
            Geometry::StrictBench { benches_per_row } => {
                let grid = seat_to_grid(seat, *benches_per_row);
                let side = match grid.position {
                    Side::Left => 0,
                    Side::Right => 1,
                };
                (grid.row as f64, (grid.col * SEATS_PER_BENCH + side) as f64)
            }
            Geometry::Distance => {
                let (row, col) = DistanceGrid::for_capacity(capacity).coords(seat);
                (row as f64, col as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_seat_room() {
        let layout = strict_layout(60, 4);
        assert_eq!(layout.total_benches, 30);
        assert_eq!(layout.total_rows, 8);
        assert_eq!(layout.total_columns, 4);

        let cases = [
            (1, 0, 0, Side::Left, 0),
            (2, 0, 0, Side::Right, 0),
            (3, 0, 1, Side::Left, 1),
            (9, 1, 0, Side::Left, 4),
            (10, 1, 0, Side::Right, 4),
            (17, 2, 0, Side::Left, 8),
            (59, 7, 1, Side::Left, 29),
            (60, 7, 1, Side::Right, 29),
        ];
        for (seat, row, col, position, bench_num) in cases {
            assert_eq!(
                seat_to_grid(seat, 4),
                SeatGrid { row, col, position, bench_num },
                "seat {seat}"
            );
        }
    }

    #[test]
    fn test_strict_round_trip() {
        for capacity in [1, 7, 8, 33, 60] {
            for seat in 1..=capacity {
                let grid = seat_to_grid(seat, 4);
                assert_eq!(grid_to_seat(grid.bench_num, grid.position), seat);
                assert_eq!(grid.position == Side::Left, seat % 2 == 1);
                assert!(grid.row < strict_layout(capacity, 4).total_rows);
            }
        }
    }

    #[test]
    fn test_layouts_for_common_capacities() {
        for (capacity, benches, rows) in [(20, 10, 3), (40, 20, 5), (80, 40, 10), (100, 50, 13)] {
            let layout = strict_layout(capacity, 4);
            assert_eq!((layout.total_benches, layout.total_rows), (benches, rows));
        }
    }

    #[test]
    fn test_distance_grid_shape() {
        assert_eq!(DistanceGrid::for_capacity(1), DistanceGrid { rows: 1, cols: 1 });
        assert_eq!(DistanceGrid::for_capacity(10), DistanceGrid { rows: 3, cols: 4 });
        assert_eq!(DistanceGrid::for_capacity(16), DistanceGrid { rows: 4, cols: 4 });
        assert_eq!(DistanceGrid::for_capacity(10).coords(6), (1, 1));
    }

    #[test]
    fn test_seat_positions_sorted_and_complete() {
        let positions = generate_seat_positions(12, 3, 4);
        assert_eq!(positions.len(), 12);
        assert!(positions
            .windows(2)
            .all(|w| w[0].position_score <= w[1].position_score));
        let mut seats: Vec<_> = positions.iter().map(|p| p.seat).collect();
        seats.sort_unstable();
        assert_eq!(seats, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_checkerboard_bonus() {
        // (0,0) is on the bonus colour, (0,1) is not
        let on = position_score(0, 0, 4, 4);
        let off = position_score(0, 1, 4, 4);
        assert!(on > 10.0);
        assert!(off < 10.0);
    }

    #[test]
    fn test_strict_spatial_coords_separate_bench_mates() {
        let geometry = Geometry::StrictBench { benches_per_row: 4 };
        assert_eq!(geometry.spatial_coords(1, 8), (0.0, 0.0));
        assert_eq!(geometry.spatial_coords(2, 8), (0.0, 1.0));
        assert_eq!(geometry.spatial_coords(3, 8), (0.0, 2.0));
    }
}
