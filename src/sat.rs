use nanorand::{Rng, WyRand};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Summed-area table over an occupancy grid.
///
/// The table is `(width + 1) * (height + 1)` with a zero first row and
/// column, so any rectangle inside the grid can be queried without bounds
/// special cases.
pub struct SummedAreaTable {
    table: Vec<u32>,
    width: u32,
    height: u32,
}

impl SummedAreaTable {
    /// `grid` is row-major, any non-zero cell counts as occupied.
    pub fn new(grid: &[u8], width: u32, height: u32) -> Self {
        let mut sat = SummedAreaTable {
            table: vec![0; (width as usize + 1) * (height as usize + 1)],
            width,
            height,
        };
        sat.update_from_row(grid, 0);
        sat
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Recomputes rows `start_row..` after the grid changed at or below `start_row`.
    pub fn update_from_row(&mut self, grid: &[u8], start_row: u32) {
        to_summed_area_table(
            grid,
            self.width as usize,
            self.height as usize,
            &mut self.table,
            start_row as usize,
        );
    }

    pub fn region_is_empty(&self, x: u32, y: u32, rect: &Rect) -> bool {
        region_is_empty(
            &self.table,
            self.width as usize + 1,
            x as usize,
            y as usize,
            rect.width as usize,
            rect.height as usize,
        )
    }

    pub fn find_space_for_rect(&self, rect: &Rect, rng: &mut WyRand) -> Option<Point> {
        find_space_for_rect(self, rect, rng)
    }
}

fn region_is_empty(
    table: &[u32],
    table_width: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> bool {
    let tl = table[y * table_width + x];
    let tr = table[y * table_width + x + width];

    let bl = table[(y + height) * table_width + x];
    let br = table[(y + height) * table_width + x + width];

    tl as i64 + br as i64 - tr as i64 - bl as i64 == 0
}

/// 在图片寻找位置写字，所有空位中随机取一个
fn find_space_for_rect(sat: &SummedAreaTable, rect: &Rect, rng: &mut WyRand) -> Option<Point> {
    let max_x = sat.width.checked_sub(rect.width)?;
    let max_y = sat.height.checked_sub(rect.height)?;

    let mut available_points: u32 = 0;
    let mut random_point = None;

    for y in 0..=max_y {
        for x in 0..=max_x {
            if sat.region_is_empty(x, y, rect) {
                // reservoir sampling
                let random_num = rng.generate_range(0..=available_points);
                if random_num == available_points {
                    random_point = Some(Point { x, y });
                }
                available_points += 1;
            }
        }
    }

    random_point
}

/// https://blog.demofox.org/2018/04/16/prefix-sums-and-summed-area-tables/
fn to_summed_area_table(
    grid: &[u8],
    width: usize,
    height: usize,
    table: &mut [u32],
    start_row: usize,
) {
    let table_width = width + 1;
    for row in start_row..height {
        let mut sum = 0;
        for col in 0..width {
            sum += (grid[row * width + col] != 0) as u32;
            table[(row + 1) * table_width + col + 1] = table[row * table_width + col + 1] + sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use nanorand::WyRand;

    use super::{Point, Rect, SummedAreaTable};

    #[test]
    fn empty_grid_is_empty_everywhere() {
        let grid = vec![0u8; 6 * 4];
        let sat = SummedAreaTable::new(&grid, 6, 4);
        let rect = Rect {
            width: 6,
            height: 4,
        };
        assert!(sat.region_is_empty(0, 0, &rect));
    }

    #[test]
    fn occupied_cell_is_detected() {
        let mut grid = vec![0u8; 5 * 5];
        grid[2 * 5 + 3] = 1;
        let sat = SummedAreaTable::new(&grid, 5, 5);

        let small = Rect {
            width: 2,
            height: 2,
        };
        assert!(sat.region_is_empty(0, 0, &small));
        assert!(!sat.region_is_empty(2, 1, &small));
        assert!(!sat.region_is_empty(3, 2, &Rect { width: 1, height: 1 }));
    }

    #[test]
    fn incremental_update_matches_full_rebuild() {
        let mut grid = vec![0u8; 4 * 4];
        let mut sat = SummedAreaTable::new(&grid, 4, 4);

        grid[3 * 4 + 1] = 255;
        sat.update_from_row(&grid, 3);

        let rebuilt = SummedAreaTable::new(&grid, 4, 4);
        assert_eq!(sat.table, rebuilt.table);
    }

    #[test]
    fn finds_the_only_free_spot() {
        let mut grid = vec![1u8; 4 * 3];
        grid[2 * 4 + 3] = 0;
        let sat = SummedAreaTable::new(&grid, 4, 3);

        let mut rng = WyRand::new_seed(7);
        let point = sat.find_space_for_rect(&Rect { width: 1, height: 1 }, &mut rng);
        assert_eq!(point, Some(Point { x: 3, y: 2 }));
    }

    #[test]
    fn oversized_rect_does_not_fit() {
        let grid = vec![0u8; 3 * 3];
        let sat = SummedAreaTable::new(&grid, 3, 3);
        let mut rng = WyRand::new_seed(1);
        let rect = Rect {
            width: 4,
            height: 1,
        };
        assert_eq!(sat.find_space_for_rect(&rect, &mut rng), None);
    }
}
