//! Moving-window shapes

/// Window shape around a centre cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Square window of the given radius (3x3 for radius 1)
    Square(usize),
    /// Circular window of the given radius in cells
    Circle(usize),
}

impl Neighborhood {
    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Square(r) | Neighborhood::Circle(r) => *r,
        }
    }

    /// Width and height of the bounding square
    pub fn size(&self) -> usize {
        self.radius() * 2 + 1
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match self {
            Neighborhood::Square(r) => {
                let r = *r as isize;
                dr.abs() <= r && dc.abs() <= r
            }
            Neighborhood::Circle(r) => {
                let r = *r as isize;
                dr * dr + dc * dc <= r * r
            }
        }
    }

    /// Relative `(dr, dc)` positions in row-major order, centre included
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        let mut offsets = Vec::with_capacity(self.size() * self.size());

        for dr in -r..=r {
            for dc in -r..=r {
                if self.contains(dr, dc) {
                    offsets.push((dr, dc));
                }
            }
        }

        offsets
    }

    /// In-bounds neighbours of `(row, col)` in a `rows` x `cols` grid
    pub fn cells(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let offsets = self.offsets();
        offsets.into_iter().filter_map(move |(dr, dc)| {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            (nr >= 0 && nc >= 0 && (nr as usize) < rows && (nc as usize) < cols)
                .then_some((nr as usize, nc as usize))
        })
    }
}
