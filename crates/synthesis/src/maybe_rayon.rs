/// Row-parallel iteration with a sequential fallback.
///
/// With the `parallel` feature, weight-grid rows are spread over rayon's
/// pool. Without it, `into_par_iter()` resolves to `into_iter()` so the
/// same `.map(..).collect()` chains compile unchanged and run in order.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
