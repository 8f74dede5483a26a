//! Field of view
//!
//! Symmetric shadowcasting over a blocking bitmap: the grid is split into
//! four quadrants around the origin and each is scanned row by row, narrowing
//! the visible slope range whenever a blocking cell is met. Slopes are exact
//! rationals so the result is symmetric (A sees B iff B sees A) and fully
//! deterministic.
//!
//! Blocking cells are themselves visible; only what lies behind them is
//! hidden. A cell is within range iff `dx^2 + dy^2 <= radius^2`.

use std::cmp::Ordering;

use glam::IVec2;

use super::bitmap::Bitmap;

/// Compute which cells are visible from `origin` within `radius`.
///
/// An origin outside the bitmap sees nothing.
pub fn calculate(blocking: &Bitmap, origin: IVec2, radius: u32) -> Bitmap {
    let mut visible = Bitmap::new(blocking.size());
    if !blocking.in_bounds(origin) {
        return visible;
    }
    visible.set(origin, true);

    // Nothing past the bitmap's extent can be seen anyway
    let extent = blocking.width().saturating_add(blocking.height());
    let radius = i64::from(radius.min(extent));
    for quadrant in Quadrant::ALL {
        let scanner = Scanner {
            blocking,
            origin,
            quadrant,
            radius,
        };
        scanner.run(&mut visible);
    }
    visible
}

/// Exact slope `num / den` with `den > 0`
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Slope through the near-left corner of `col` at `depth`
    fn of_tile(depth: i64, col: i64) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }

    /// Compare `col` with `depth * self`
    fn cmp_col(&self, depth: i64, col: i64) -> Ordering {
        (col * self.den).cmp(&(depth * self.num))
    }

    /// `floor(depth * self + 1/2)`
    fn round_ties_up(&self, depth: i64) -> i64 {
        (2 * depth * self.num + self.den).div_euclid(2 * self.den)
    }

    /// `ceil(depth * self - 1/2)`
    fn round_ties_down(&self, depth: i64) -> i64 {
        -(self.den - 2 * depth * self.num).div_euclid(2 * self.den)
    }
}

#[derive(Debug, Clone, Copy)]
enum Quadrant {
    North,
    East,
    South,
    West,
}

impl Quadrant {
    const ALL: [Quadrant; 4] = [
        Quadrant::North,
        Quadrant::East,
        Quadrant::South,
        Quadrant::West,
    ];

    /// Map (depth, col) in quadrant space to a grid offset
    fn offset(&self, depth: i64, col: i64) -> IVec2 {
        let (depth, col) = (depth as i32, col as i32);
        match self {
            Quadrant::North => IVec2::new(col, -depth),
            Quadrant::South => IVec2::new(col, depth),
            Quadrant::East => IVec2::new(depth, col),
            Quadrant::West => IVec2::new(-depth, col),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    depth: i64,
    start: Slope,
    end: Slope,
}

impl Row {
    fn next(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    fn cols(&self) -> std::ops::RangeInclusive<i64> {
        self.start.round_ties_up(self.depth)..=self.end.round_ties_down(self.depth)
    }

    /// Floor tiles are only revealed when their centre lies inside the row's
    /// slope range; this keeps the result symmetric.
    fn is_symmetric(&self, col: i64) -> bool {
        self.start.cmp_col(self.depth, col) != Ordering::Less
            && self.end.cmp_col(self.depth, col) != Ordering::Greater
    }
}

struct Scanner<'a> {
    blocking: &'a Bitmap,
    origin: IVec2,
    quadrant: Quadrant,
    radius: i64,
}

impl Scanner<'_> {
    fn position(&self, depth: i64, col: i64) -> IVec2 {
        self.origin + self.quadrant.offset(depth, col)
    }

    /// Out-of-bounds cells block, so light never wraps around the edge
    fn is_wall(&self, depth: i64, col: i64) -> bool {
        let pos = self.position(depth, col);
        !self.blocking.in_bounds(pos) || self.blocking.get(pos)
    }

    fn in_radius(&self, depth: i64, col: i64) -> bool {
        depth * depth + col * col <= self.radius * self.radius
    }

    fn reveal(&self, visible: &mut Bitmap, depth: i64, col: i64) {
        if self.in_radius(depth, col) {
            visible.set(self.position(depth, col), true);
        }
    }

    fn run(&self, visible: &mut Bitmap) {
        let mut rows = vec![Row {
            depth: 1,
            start: Slope::new(-1, 1),
            end: Slope::new(1, 1),
        }];

        while let Some(mut row) = rows.pop() {
            if row.depth > self.radius {
                continue;
            }
            // None = no tile yet, Some(true) = previous tile was a wall
            let mut prev_wall: Option<bool> = None;
            for col in row.cols() {
                let wall = self.is_wall(row.depth, col);
                if wall || row.is_symmetric(col) {
                    self.reveal(visible, row.depth, col);
                }
                match (prev_wall, wall) {
                    (Some(true), false) => {
                        row.start = Slope::of_tile(row.depth, col);
                    }
                    (Some(false), true) => {
                        let mut next = row.next();
                        next.end = Slope::of_tile(row.depth, col);
                        rows.push(next);
                    }
                    _ => {}
                }
                prev_wall = Some(wall);
            }
            if prev_wall == Some(false) {
                rows.push(row.next());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;
    use proptest::prelude::*;

    fn open(w: u32, h: u32) -> Bitmap {
        Bitmap::new(UVec2::new(w, h))
    }

    #[test]
    fn test_open_room_matches_circle() {
        let blocking = open(21, 21);
        let origin = IVec2::new(10, 10);
        let visible = calculate(&blocking, origin, 5);
        for y in 0..21 {
            for x in 0..21 {
                let p = IVec2::new(x, y);
                let inside = crate::distance_sq(p, origin) <= 25;
                assert_eq!(visible.get(p), inside, "mismatch at {:?}", p);
            }
        }
    }

    #[test]
    fn test_zero_radius_sees_only_origin() {
        let visible = calculate(&open(5, 5), IVec2::new(2, 2), 0);
        assert_eq!(visible.count(), 1);
        assert!(visible.get(IVec2::new(2, 2)));
    }

    #[test]
    fn test_max_radius_sees_whole_open_grid() {
        let visible = calculate(&open(7, 4), IVec2::new(2, 2), u32::MAX);
        assert_eq!(visible.count(), 28);
    }

    #[test]
    fn test_origin_out_of_bounds_sees_nothing() {
        let visible = calculate(&open(5, 5), IVec2::new(7, 2), 4);
        assert_eq!(visible.count(), 0);
    }

    #[test]
    fn test_wall_visible_but_hides_cells_behind() {
        // Corridor along y = 0 with a wall at x = 2
        let mut blocking = open(10, 1);
        blocking.set(IVec2::new(2, 0), true);
        let visible = calculate(&blocking, IVec2::new(5, 0), 8);
        assert!(visible.get(IVec2::new(3, 0)));
        assert!(visible.get(IVec2::new(2, 0)));
        assert!(!visible.get(IVec2::new(1, 0)));
        assert!(!visible.get(IVec2::new(0, 0)));
        assert!(visible.get(IVec2::new(9, 0)));
    }

    #[test]
    fn test_pillar_casts_shadow() {
        let mut blocking = open(11, 11);
        blocking.set(IVec2::new(5, 3), true);
        let visible = calculate(&blocking, IVec2::new(5, 5), 6);
        assert!(visible.get(IVec2::new(5, 3)));
        assert!(!visible.get(IVec2::new(5, 2)));
        assert!(!visible.get(IVec2::new(5, 1)));
        assert!(visible.get(IVec2::new(2, 2)));
    }

    #[test]
    fn test_enclosed_room() {
        // 5x5 room with walls around a 3x3 floor
        let mut blocking = open(7, 7);
        for i in 0..7 {
            for edge in [1, 5] {
                blocking.set(IVec2::new(i, edge), true);
                blocking.set(IVec2::new(edge, i), true);
            }
        }
        let visible = calculate(&blocking, IVec2::new(3, 3), 10);
        assert!(visible.get(IVec2::new(1, 1)));
        assert!(visible.get(IVec2::new(5, 3)));
        assert!(!visible.get(IVec2::new(0, 3)));
        assert!(!visible.get(IVec2::new(6, 6)));
    }

    fn blocking_strategy() -> impl Strategy<Value = Bitmap> {
        proptest::collection::vec(proptest::bool::weighted(0.25), 12 * 12).prop_map(|bits| {
            let mut bitmap = open(12, 12);
            for (i, b) in bits.into_iter().enumerate() {
                bitmap.set(IVec2::new(i as i32 % 12, i as i32 / 12), b);
            }
            bitmap
        })
    }

    proptest! {
        #[test]
        fn prop_deterministic(blocking in blocking_strategy(), x in 0i32..12, y in 0i32..12, r in 0u32..10) {
            let origin = IVec2::new(x, y);
            prop_assert_eq!(calculate(&blocking, origin, r), calculate(&blocking, origin, r));
        }

        #[test]
        fn prop_symmetric_between_floor_cells(
            blocking in blocking_strategy(),
            ax in 0i32..12, ay in 0i32..12, bx in 0i32..12, by in 0i32..12,
        ) {
            let a = IVec2::new(ax, ay);
            let b = IVec2::new(bx, by);
            prop_assume!(!blocking.get(a) && !blocking.get(b));
            let a_sees_b = calculate(&blocking, a, 20).get(b);
            let b_sees_a = calculate(&blocking, b, 20).get(a);
            prop_assert_eq!(a_sees_b, b_sees_a);
        }

        #[test]
        fn prop_never_beyond_radius(blocking in blocking_strategy(), x in 0i32..12, y in 0i32..12, r in 0u32..8) {
            let origin = IVec2::new(x, y);
            let visible = calculate(&blocking, origin, r);
            for p in visible.iter_set() {
                prop_assert!(crate::distance_sq(p, origin) <= (r * r) as i32);
            }
        }
    }
}
