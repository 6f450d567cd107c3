/// Presets that can be stamped into a universe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pattern {
    Glider,
    Pulsar,
}

const GLIDER: [(i32, i32); 5] = [(-1, 0), (0, 1), (1, -1), (1, 0), (1, 1)];

// One quadrant of the pulsar; mirrored across both axes around the anchor.
const PULSAR_QUADRANT: [(i32, i32); 12] = [
    (6, 4),
    (6, 3),
    (6, 2),
    (2, 1),
    (3, 1),
    (4, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 6),
    (3, 6),
    (4, 6),
];

impl Pattern {
    pub fn name(self) -> &'static str {
        match self {
            Self::Glider => "glider",
            Self::Pulsar => "pulsar",
        }
    }

    /// `(row, col)` offsets from the anchor cell.
    pub fn offsets(self) -> Vec<(i32, i32)> {
        match self {
            Self::Glider => GLIDER.to_vec(),
            Self::Pulsar => {
                let mut offsets = Vec::with_capacity(PULSAR_QUADRANT.len() * 4);
                for &(row, col) in &PULSAR_QUADRANT {
                    let signs = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
                    for (row_sign, col_sign) in signs {
                        offsets.push((row * row_sign, col * col_sign));
                    }
                }
                offsets
            }
        }
    }

    /// Absolute cells of the pattern anchored at `(row, col)`. Cells that
    /// would land outside a `width` x `height` grid are dropped.
    pub fn cells(
        self,
        row: u32,
        col: u32,
        width: u32,
        height: u32,
    ) -> Vec<(u32, u32)> {
        self.offsets()
            .into_iter()
            .filter_map(|(d_row, d_col)| {
                let r = i64::from(row) + i64::from(d_row);
                let c = i64::from(col) + i64::from(d_col);
                let inside = (0..i64::from(height)).contains(&r)
                    && (0..i64::from(width)).contains(&c);
                inside.then_some((r as u32, c as u32))
            })
            .collect()
    }
}
