use num_traits::Zero;

use crate::value::{Value, downcast_ref, erase};

use super::{Descriptor, VSpace};

/// VSpace for bare `f64` scalars.
#[derive(Debug)]
pub struct ScalarVSpace;

impl VSpace for ScalarVSpace {
    fn descriptor(&self) -> Descriptor {
        Descriptor::Scalar
    }

    fn zeros(&self) -> Box<dyn Value> {
        erase(f64::zero())
    }

    fn add(&self, x: &dyn Value, y: &dyn Value) -> Box<dyn Value> {
        erase(downcast_ref::<f64>(x) + downcast_ref::<f64>(y))
    }

    fn mut_add(&self, x: Box<dyn Value>, y: &dyn Value) -> Box<dyn Value> {
        self.add(x.as_ref(), y)
    }

    fn scalar_mul(&self, x: &dyn Value, a: f64) -> Box<dyn Value> {
        erase(downcast_ref::<f64>(x) * a)
    }

    fn inner_prod(&self, x: &dyn Value, y: &dyn Value) -> f64 {
        downcast_ref::<f64>(x) * downcast_ref::<f64>(y)
    }

    fn covector(&self, x: &dyn Value) -> Box<dyn Value> {
        erase(*downcast_ref::<f64>(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_zeros() {
        let vs = ScalarVSpace;
        let z = vs.zeros();
        assert_eq!(*downcast_ref::<f64>(z.as_ref()), 0.0);
        let s = vs.add(&3.0_f64, &4.0_f64);
        assert_eq!(*downcast_ref::<f64>(s.as_ref()), 7.0);
    }
}
