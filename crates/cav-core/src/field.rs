//! Dense structured-grid storage.
//!
//! A [`Field`] holds `nk` components per node on an `ni x nj` grid, laid out
//! row-major as `(i * nj + j) * nk + k`, so one `i` row is a contiguous slice
//! of `nj * nk` values. Scalar fields are fields with `nk == 1`.
//!
//! Shapes never change after construction. Copying or swapping between two
//! fields of different shape is a programming error and panics.

use crate::error::{CavError, CavResult};
use crate::numeric::Real;
use core::ops::{Index, IndexMut};

/// Grid extent of a field: nodes in i, nodes in j, components per node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl Shape {
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self { ni, nj, nk }
    }

    pub fn len(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of grid nodes (components not counted).
    pub fn nodes(&self) -> usize {
        self.ni * self.nj
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    shape: Shape,
    data: Vec<Real>,
}

impl Field {
    /// Zero-filled field.
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self::filled(ni, nj, nk, 0.0)
    }

    /// Zero-filled single-component field.
    pub fn scalar(ni: usize, nj: usize) -> Self {
        Self::new(ni, nj, 1)
    }

    pub fn filled(ni: usize, nj: usize, nk: usize, value: Real) -> Self {
        let shape = Shape::new(ni, nj, nk);
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn ni(&self) -> usize {
        self.shape.ni
    }

    pub fn nj(&self) -> usize {
        self.shape.nj
    }

    pub fn nk(&self) -> usize {
        self.shape.nk
    }

    #[inline]
    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.shape.ni && j < self.shape.nj && k < self.shape.nk);
        (i * self.shape.nj + j) * self.shape.nk + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Real {
        self.data[self.offset(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: Real) {
        let idx = self.offset(i, j, k);
        self.data[idx] = value;
    }

    /// Bounds-checked read, for tests and diagnostics.
    pub fn try_get(&self, i: usize, j: usize, k: usize) -> CavResult<Real> {
        if i >= self.shape.ni {
            return Err(CavError::IndexOob {
                what: "field i",
                index: i,
                len: self.shape.ni,
            });
        }
        if j >= self.shape.nj {
            return Err(CavError::IndexOob {
                what: "field j",
                index: j,
                len: self.shape.nj,
            });
        }
        if k >= self.shape.nk {
            return Err(CavError::IndexOob {
                what: "field k",
                index: k,
                len: self.shape.nk,
            });
        }
        Ok(self.get(i, j, k))
    }

    /// Deep copy of every value into `dst`; both fields keep their own storage.
    pub fn copy_into(&self, dst: &mut Field) {
        assert_eq!(self.shape, dst.shape, "copy_into between mismatched shapes");
        dst.data.copy_from_slice(&self.data);
    }

    /// Exchange the underlying storage of two equally shaped fields without copying.
    pub fn swap_storage(&mut self, other: &mut Field) {
        assert_eq!(self.shape, other.shape, "swap_storage between mismatched shapes");
        core::mem::swap(&mut self.data, &mut other.data);
    }

    pub fn fill(&mut self, value: Real) {
        self.data.fill(value);
    }

    /// Apply `f` to component `k` of every node.
    pub fn map_component(&mut self, k: usize, mut f: impl FnMut(Real) -> Real) {
        assert!(k < self.shape.nk, "component {k} out of range");
        let nk = self.shape.nk;
        for v in self.data.iter_mut().skip(k).step_by(nk) {
            *v = f(*v);
        }
    }

    /// Contiguous values of row `i` (all `j`, all components).
    pub fn row(&self, i: usize) -> &[Real] {
        let width = self.shape.nj * self.shape.nk;
        &self.data[i * width..(i + 1) * width]
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Component `k` of every node in row-major node order.
    pub fn component(&self, k: usize) -> Vec<Real> {
        self.data
            .iter()
            .skip(k)
            .step_by(self.shape.nk)
            .copied()
            .collect()
    }

    /// Build a field from per-component vectors in row-major node order.
    pub fn from_components(ni: usize, nj: usize, components: &[&[Real]]) -> CavResult<Self> {
        let nk = components.len();
        if nk == 0 {
            return Err(CavError::InvalidArg {
                what: "at least one component is required",
            });
        }
        let mut field = Field::new(ni, nj, nk);
        for (k, values) in components.iter().enumerate() {
            if values.len() != ni * nj {
                return Err(CavError::LengthMismatch {
                    what: "component",
                    expected: ni * nj,
                    got: values.len(),
                });
            }
            for (node, v) in values.iter().enumerate() {
                field.data[node * nk + k] = *v;
            }
        }
        Ok(field)
    }
}

impl Index<(usize, usize, usize)> for Field {
    type Output = Real;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &Real {
        &self.data[self.offset(i, j, k)]
    }
}

impl IndexMut<(usize, usize, usize)> for Field {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut Real {
        let idx = self.offset(i, j, k);
        &mut self.data[idx]
    }
}

/// Scalar-field shorthand: `(i, j)` addresses component 0.
impl Index<(usize, usize)> for Field {
    type Output = Real;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.data[self.offset(i, j, 0)]
    }
}

impl IndexMut<(usize, usize)> for Field {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        let idx = self.offset(i, j, 0);
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp(ni: usize, nj: usize, nk: usize, offset: Real) -> Field {
        let mut f = Field::new(ni, nj, nk);
        for i in 0..ni {
            for j in 0..nj {
                for k in 0..nk {
                    f.set(i, j, k, offset + (i * 100 + j * 10 + k) as Real);
                }
            }
        }
        f
    }

    #[test]
    fn get_set_round_trip() {
        let mut f = Field::new(3, 4, 3);
        f.set(2, 3, 1, 7.5);
        assert_eq!(f.get(2, 3, 1), 7.5);
        assert_eq!(f[(2, 3, 1)], 7.5);
        f[(0, 1, 2)] = -1.0;
        assert_eq!(f.get(0, 1, 2), -1.0);
    }

    #[test]
    fn scalar_index_addresses_component_zero() {
        let mut f = Field::scalar(5, 5);
        f[(1, 2)] = 3.0;
        assert_eq!(f.get(1, 2, 0), 3.0);
    }

    #[test]
    fn try_get_reports_out_of_bounds() {
        let f = Field::new(3, 3, 1);
        assert!(f.try_get(2, 2, 0).is_ok());
        let err = f.try_get(3, 0, 0).unwrap_err();
        assert!(matches!(err, CavError::IndexOob { index: 3, len: 3, .. }));
        assert!(f.try_get(0, 0, 1).is_err());
    }

    #[test]
    fn copy_into_keeps_separate_storage() {
        let a = ramp(4, 5, 3, 0.0);
        let mut b = Field::new(4, 5, 3);
        a.copy_into(&mut b);
        assert_eq!(a, b);
        b.set(0, 0, 0, 99.0);
        assert_eq!(a.get(0, 0, 0), 0.0);
    }

    #[test]
    fn swap_storage_exchanges_contents() {
        let mut a = ramp(3, 3, 2, 0.0);
        let mut b = ramp(3, 3, 2, 1000.0);
        a.swap_storage(&mut b);
        assert_eq!(a.get(1, 1, 1), 1000.0 + 111.0);
        assert_eq!(b.get(1, 1, 1), 111.0);
    }

    #[test]
    #[should_panic(expected = "mismatched shapes")]
    fn swap_storage_rejects_shape_mismatch() {
        let mut a = Field::new(3, 3, 1);
        let mut b = Field::new(3, 4, 1);
        a.swap_storage(&mut b);
    }

    #[test]
    #[should_panic(expected = "mismatched shapes")]
    fn copy_into_rejects_shape_mismatch() {
        let a = Field::new(3, 3, 3);
        let mut b = Field::new(3, 3, 1);
        a.copy_into(&mut b);
    }

    #[test]
    fn rows_are_contiguous() {
        let f = ramp(3, 2, 2, 0.0);
        assert_eq!(f.row(1), &[100.0, 101.0, 110.0, 111.0]);
    }

    #[test]
    fn components_round_trip_through_vectors() {
        let f = ramp(3, 4, 3, 0.5);
        let p = f.component(0);
        let u = f.component(1);
        let v = f.component(2);
        let back = Field::from_components(3, 4, &[&p, &u, &v]).unwrap();
        assert_eq!(f, back);

        let short = vec![0.0; 11];
        let err = Field::from_components(3, 4, &[&p, &short]).unwrap_err();
        assert!(matches!(err, CavError::LengthMismatch { expected: 12, got: 11, .. }));
    }

    #[test]
    fn map_component_touches_only_that_component() {
        let mut f = Field::filled(2, 2, 3, 1.0);
        f.map_component(0, |p| p - 0.25);
        assert_eq!(f.get(1, 1, 0), 0.75);
        assert_eq!(f.get(1, 1, 1), 1.0);
        assert_eq!(f.get(1, 1, 2), 1.0);
    }

    proptest! {
        #[test]
        fn swap_storage_is_its_own_inverse(
            ni in 1usize..6,
            nj in 1usize..6,
            nk in 1usize..4,
            seed in -100.0f64..100.0,
        ) {
            let original_a = ramp(ni, nj, nk, seed);
            let original_b = ramp(ni, nj, nk, -seed - 1.0);
            let mut a = original_a.clone();
            let mut b = original_b.clone();
            a.swap_storage(&mut b);
            a.swap_storage(&mut b);
            prop_assert_eq!(a, original_a);
            prop_assert_eq!(b, original_b);
        }
    }
}
