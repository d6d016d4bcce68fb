/// Running max/mean/min of a stream of values, remembering where the max came from.
#[derive(Debug, Clone, Default)]
pub struct StatCollector {
    total: f64,
    count: usize,
    greatest: Option<(f64, usize)>,
    smallest: Option<f64>,
}

impl StatCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, value: f64, index: usize) {
        self.total += value;
        self.count += 1;
        if self.greatest.map_or(true, |(g, _)| value > g) {
            self.greatest = Some((value, index));
        }
        if self.smallest.map_or(true, |s| value < s) {
            self.smallest = Some(value);
        }
    }

    pub fn greatest(&self) -> f64 {
        self.greatest.map_or(0.0, |(g, _)| g)
    }

    /// Index of the first value that reached the maximum.
    pub fn greatest_index(&self) -> usize {
        self.greatest.map_or(0, |(_, i)| i)
    }

    pub fn smallest(&self) -> f64 {
        self.smallest.unwrap_or(0.0)
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}
