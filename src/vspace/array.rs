use ndarray::ArrayD;

use crate::value::{Value, downcast_ref, erase};

use super::{Descriptor, VSpace};

/// VSpace for dense `f64` tensors of a fixed shape.
#[derive(Debug)]
pub struct ArrayVSpace {
    shape: Vec<usize>,
}

impl ArrayVSpace {
    pub fn new(shape: Vec<usize>) -> Self {
        ArrayVSpace { shape }
    }
}

impl VSpace for ArrayVSpace {
    fn descriptor(&self) -> Descriptor {
        Descriptor::Array {
            shape: self.shape.clone(),
        }
    }

    fn zeros(&self) -> Box<dyn Value> {
        erase(ArrayD::<f64>::zeros(self.shape.clone()))
    }

    fn add(&self, x: &dyn Value, y: &dyn Value) -> Box<dyn Value> {
        let x = downcast_ref::<ArrayD<f64>>(x);
        let y = downcast_ref::<ArrayD<f64>>(y);
        erase(x + y)
    }

    fn mut_add(&self, x: Box<dyn Value>, y: &dyn Value) -> Box<dyn Value> {
        let mut x = crate::value::downcast_owned::<ArrayD<f64>>(x);
        let y = downcast_ref::<ArrayD<f64>>(y);
        x += y;
        erase(x)
    }

    fn scalar_mul(&self, x: &dyn Value, a: f64) -> Box<dyn Value> {
        let x = downcast_ref::<ArrayD<f64>>(x);
        erase(x * a)
    }

    fn inner_prod(&self, x: &dyn Value, y: &dyn Value) -> f64 {
        let x = downcast_ref::<ArrayD<f64>>(x);
        let y = downcast_ref::<ArrayD<f64>>(y);
        (x * y).sum()
    }

    fn covector(&self, x: &dyn Value) -> Box<dyn Value> {
        erase(downcast_ref::<ArrayD<f64>>(x).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mut_add_accumulates() {
        let vs = ArrayVSpace::new(vec![2]);
        let a = erase(ArrayD::<f64>::from_elem(vec![2], 1.0));
        let b = ArrayD::<f64>::from_elem(vec![2], 2.0);
        let sum = vs.mut_add(a, &b);
        let sum = downcast_ref::<ArrayD<f64>>(sum.as_ref());
        assert_eq!(sum.iter().copied().collect::<Vec<_>>(), vec![3.0, 3.0]);
    }
}
