//! Grid-row binary layouts
//!
//! A grid format such as `TLf`, `BLd`, `LTh` or `TRa` describes how the values
//! of an `nx * ny` array are laid out in a file. The first two letters give
//! the corner the traversal starts at and whether rows (`T`/`B` first) or
//! columns (`L`/`R` first) are stored contiguously. The element code follows,
//! then any of the modifiers `x` (repeated east column omitted), `y`
//! (repeated south row omitted), `s<N>` (skip `N` leading bytes) and `w`
//! (byte swap).
//!
//! In memory a grid is always row-major from the top-left corner.

use std::io::{BufRead, Write};

use super::element::{ByteSwap, Direction, ElementCodec, ElementType};
use crate::{Error, Result};

/// Layout of a gridded array on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridFormat {
    /// Rows are stored contiguously
    pub row_major: bool,
    /// First stored row is the top one
    pub top_down: bool,
    /// First stored column is the left one
    pub left_right: bool,
    pub element: ElementType,
    /// Bytes to skip before the first value
    pub skip: usize,
    pub swap: ByteSwap,
    /// The east column repeats the west one and is not stored
    pub missing_x: bool,
    /// The south row repeats the north one and is not stored
    pub missing_y: bool,
}

impl Default for GridFormat {
    fn default() -> Self {
        Self {
            row_major: true,
            top_down: true,
            left_right: true,
            element: ElementType::Float32,
            skip: 0,
            swap: ByteSwap::None,
            missing_x: false,
            missing_y: false,
        }
    }
}

impl GridFormat {
    /// Parse a grid descriptor
    pub fn parse(descriptor: &str) -> Result<Self> {
        let chars: Vec<char> = descriptor.chars().collect();
        if chars.len() < 3 {
            return Err(Error::invalid_format(
                descriptor,
                "expected two orientation letters and a type code",
            ));
        }
        let mut format = GridFormat::default();
        match (chars[0], chars[1]) {
            ('T', h @ ('L' | 'R')) | ('B', h @ ('L' | 'R')) => {
                format.row_major = true;
                format.top_down = chars[0] == 'T';
                format.left_right = h == 'L';
            }
            ('L', v @ ('T' | 'B')) | ('R', v @ ('T' | 'B')) => {
                format.row_major = false;
                format.left_right = chars[0] == 'L';
                format.top_down = v == 'T';
            }
            _ => {
                return Err(Error::invalid_format(
                    descriptor,
                    "orientation must pair T/B with L/R",
                ));
            }
        }
        format.element = ElementType::from_code(chars[2])?;

        let mut i = 3;
        while i < chars.len() {
            match chars[i] {
                'x' => format.missing_x = true,
                'y' => format.missing_y = true,
                'w' => format.swap = ByteSwap::Both,
                's' => {
                    let digits: String = chars[i + 1..]
                        .iter()
                        .take_while(|c| c.is_ascii_digit())
                        .collect();
                    if digits.is_empty() {
                        return Err(Error::invalid_format(descriptor, "s modifier needs a byte count"));
                    }
                    format.skip = digits.parse().map_err(|_| {
                        Error::invalid_format(descriptor, format!("bad skip count '{}'", digits))
                    })?;
                    i += digits.len();
                }
                other => {
                    return Err(Error::invalid_format(
                        descriptor,
                        format!("unknown modifier '{}'", other),
                    ));
                }
            }
            i += 1;
        }
        Ok(format)
    }

    /// Number of stored columns and rows for an `nx * ny` grid
    fn stored_shape(&self, nx: usize, ny: usize) -> (usize, usize) {
        let sx = if self.missing_x { nx.saturating_sub(1) } else { nx };
        let sy = if self.missing_y { ny.saturating_sub(1) } else { ny };
        (sx, sy)
    }

    /// Canonical `(row, col)` positions in storage order
    fn traversal(&self, sx: usize, sy: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (outer, inner) = if self.row_major { (sy, sx) } else { (sx, sy) };
        (0..outer).flat_map(move |o| {
            (0..inner).map(move |i| {
                let (r, c) = if self.row_major { (o, i) } else { (i, o) };
                let row = if self.top_down { r } else { sy - 1 - r };
                let col = if self.left_right { c } else { sx - 1 - c };
                (row, col)
            })
        })
    }

    /// Read an `nx * ny` grid into row-major top-left order
    pub fn read_grid(&self, reader: &mut dyn BufRead, nx: usize, ny: usize) -> Result<Vec<f64>> {
        if self.skip > 0 {
            let mut sink = vec![0u8; self.skip];
            let got = super::element::read_full(reader, &mut sink)?;
            if got < self.skip {
                return Err(Error::ShortRead {
                    expected: self.skip,
                    got,
                });
            }
        }
        let codec = ElementCodec::new(self.element, Direction::Read, self.swap);
        let (sx, sy) = self.stored_shape(nx, ny);
        let mut grid = vec![f64::NAN; nx * ny];
        let mut count = 0;
        for (row, col) in self.traversal(sx, sy) {
            match codec.read(reader)? {
                Some(value) => grid[row * nx + col] = value,
                None => {
                    return Err(Error::ShortRead {
                        expected: sx * sy,
                        got: count,
                    });
                }
            }
            count += 1;
        }

        if self.missing_x && nx > 0 {
            for row in 0..sy {
                grid[row * nx + nx - 1] = grid[row * nx];
            }
        }
        if self.missing_y && ny > 1 {
            let (top, rest) = grid.split_at_mut(nx);
            rest[(ny - 2) * nx..].copy_from_slice(top);
        }
        Ok(grid)
    }

    /// Write a row-major top-left grid in this layout
    pub fn write_grid(&self, writer: &mut dyn Write, grid: &[f64], nx: usize, ny: usize) -> Result<()> {
        if grid.len() != nx * ny {
            return Err(Error::invalid_format(
                format!("{}x{}", nx, ny),
                format!("grid holds {} values", grid.len()),
            ));
        }
        if self.skip > 0 {
            writer
                .write_all(&vec![0u8; self.skip])
                .map_err(|e| Error::write_failure("Grid padding write failed", e))?;
        }
        let codec = ElementCodec::new(self.element, Direction::Write, self.swap);
        let (sx, sy) = self.stored_shape(nx, ny);
        for (row, col) in self.traversal(sx, sy) {
            codec.write(writer, grid[row * nx + col])?;
        }
        if self.element.is_ascii() {
            writer
                .write_all(b"\n")
                .map_err(|e| Error::write_failure("Grid terminator write failed", e))?;
        }
        Ok(())
    }
}
