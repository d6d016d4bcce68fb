use crate::core::domain::GridShape;

/// Flattened lookup of the row, column and box partition of every cell.
/// Access is O(1) via the row-major cell index.
#[derive(Debug, Clone)]
pub struct PartitionMap {
    rows: usize,
    cols: usize,
    boxes: usize,
    /// `[row_id, col_id, box_id]` per cell index.
    ids: Vec<[usize; 3]>,
}

impl PartitionMap {
    pub fn new(shape: &GridShape) -> Self {
        let boxes_per_col = shape.height / shape.square_height;
        let ids = (0..shape.cell_count())
            .map(|i| {
                let p = shape.position_of(i);
                let (br, bc) = shape.box_of(p);
                [p.row, p.col, br * boxes_per_col + bc]
            })
            .collect();

        Self {
            rows: shape.width,
            cols: shape.height,
            boxes: shape.box_count(),
            ids,
        }
    }

    #[inline(always)]
    pub fn row_of(&self, index: usize) -> usize {
        self.ids[index][0]
    }

    #[inline(always)]
    pub fn col_of(&self, index: usize) -> usize {
        self.ids[index][1]
    }

    #[inline(always)]
    pub fn box_of(&self, index: usize) -> usize {
        self.ids[index][2]
    }

    /// Number of partitions of each kind: `[rows, cols, boxes]`.
    pub fn counts(&self) -> [usize; 3] {
        [self.rows, self.cols, self.boxes]
    }

    /// Sums, for each partition kind, the number of distinct symbols seen in
    /// each partition. Symbol 0 stands for an unknown cell.
    pub fn distinct_totals<I>(&self, symbols: I, alphabet: usize) -> [usize; 3]
    where
        I: IntoIterator<Item = usize>,
    {
        let stride = alphabet + 1;
        let counts = self.counts();
        let mut seen: [Vec<bool>; 3] = [
            vec![false; counts[0] * stride],
            vec![false; counts[1] * stride],
            vec![false; counts[2] * stride],
        ];
        let mut totals = [0usize; 3];

        for (index, symbol) in symbols.into_iter().enumerate() {
            let ids = &self.ids[index];
            for kind in 0..3 {
                let slot = ids[kind] * stride + symbol;
                if !seen[kind][slot] {
                    seen[kind][slot] = true;
                    totals[kind] += 1;
                }
            }
        }
        totals
    }
}
