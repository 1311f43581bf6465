//! Multi-dimensional arrays.
//!
//! Rust has no rank-N array type, so `Grid` stores items row-major with
//! explicit dimensions. It renders with nested braces (`{{1,2},{3,4}}`)
//! and reports its type with rank markers (`i32[,]`).

use crate::inspect::{display_name, Capture, Category, Inspect, Kind, NodeId, TypeInfo};
use crate::result::{CheckError, CheckResult};

/// Row-major multi-dimensional array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    dims: Vec<usize>,
    items: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid; the product of `dims` must equal the number of items
    pub fn new(dims: Vec<usize>, items: Vec<T>) -> CheckResult<Self> {
        let expected: usize = dims.iter().product();
        if dims.is_empty() || expected != items.len() {
            return Err(CheckError::InvalidGridShape {
                dims,
                items: items.len(),
            });
        }
        Ok(Self { dims, items })
    }

    /// Build a rank-2 grid from rows of equal length
    pub fn from_rows(rows: Vec<Vec<T>>) -> CheckResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(CheckError::InvalidGridShape {
                dims: vec![height, width],
                items: rows.iter().map(Vec::len).sum(),
            });
        }
        let items: Vec<T> = rows.into_iter().flatten().collect();
        Self::new(vec![height, width], items)
    }

    /// Length of each dimension
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Item at a multi-dimensional index
    #[must_use]
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (i, d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            flat = flat * d + i;
        }
        self.items.get(flat)
    }

    /// Items in row-major order
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Inspect> Inspect for Grid<T> {
    fn category() -> Category {
        Category::Enumerable
    }

    fn inspect(&self, capture: &mut Capture) -> NodeId {
        let element = display_name(std::any::type_name::<T>());
        let name = format!("{element}[{}]", ",".repeat(self.rank().saturating_sub(1)));
        let info = TypeInfo::named(std::any::type_name::<Self>(), name, Self::category());
        let items = self.items.iter().map(|item| item.inspect(capture)).collect();
        capture.leaf(
            info,
            Kind::Grid {
                dims: self.dims.clone(),
                items,
            },
        )
    }
}
