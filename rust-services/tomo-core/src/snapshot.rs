use log::trace;
use ndarray::Array2;

/// Copies of both accumulators taken at evenly spaced points of a sweep.
///
/// With `views` views and `capacity = min(views, 10)`, view `v` triggers a
/// capture when `v * (capacity - 1) / (views - 1)` (integer division) reaches
/// the number of captures so far. The first view and the last view always
/// capture, so the final entry equals the finished accumulator.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    views: usize,
    capacity: usize,
    storage: Vec<Array2<f64>>,
    filtered_storage: Vec<Array2<f64>>,
}

impl SnapshotStore {
    /// `views >= 2` and `1 <= capacity <= views`.
    pub fn new(views: usize, capacity: usize) -> Self {
        debug_assert!(views >= 2 && (1..=views).contains(&capacity));
        Self {
            views,
            capacity,
            storage: Vec::with_capacity(capacity),
            filtered_storage: Vec::with_capacity(capacity),
        }
    }

    pub fn stored(&self) -> usize {
        self.storage.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether finishing `view` should trigger a capture.
    pub fn is_checkpoint(&self, view: usize) -> bool {
        view * (self.capacity - 1) / (self.views - 1) >= self.stored()
    }

    /// Call once after each view has been fully accumulated.
    pub fn observe(&mut self, view: usize, result: &Array2<f64>, filtered_result: &Array2<f64>) {
        if self.stored() < self.capacity && self.is_checkpoint(view) {
            trace!("snapshot {} of {} after view {}", self.stored() + 1, self.capacity, view);
            self.storage.push(result.clone());
            self.filtered_storage.push(filtered_result.clone());
        }
    }

    pub fn into_parts(self) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        (self.storage, self.filtered_storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn checkpoints(views: usize, capacity: usize) -> Vec<usize> {
        let mut store = SnapshotStore::new(views, capacity);
        let mut hits = vec![];
        let image = Array2::zeros((1, 1));
        for view in 0..views {
            let before = store.stored();
            store.observe(view, &image, &image);
            if store.stored() > before {
                hits.push(view);
            }
        }
        hits
    }

    #[rstest(/**/ views, capacity, expected,
             case( 2,  2, vec![0, 1]),
             case( 4,  4, vec![0, 1, 2, 3]),
             case(10, 10, (0..10).collect()),
             case(11, 10, vec![0, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
             case(45, 10, vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 44]),
    )]
    fn checkpoints_are_evenly_spaced(views: usize, capacity: usize, expected: Vec<usize>) {
        assert_eq!(checkpoints(views, capacity), expected);
    }

    #[test]
    fn every_sweep_fills_the_store() {
        for views in 2..400 {
            let capacity = views.min(10);
            let hits = checkpoints(views, capacity);
            assert_eq!(hits.len(), capacity, "views = {views}");
            assert_eq!(hits.last(), Some(&(views - 1)));
        }
    }

    #[test]
    fn snapshots_are_deep_copies() {
        let mut store = SnapshotStore::new(2, 2);
        let mut acc = Array2::from_elem((2, 2), 1.0);
        store.observe(0, &acc, &acc);
        acc.fill(5.0);
        store.observe(1, &acc, &acc);
        let (storage, filtered) = store.into_parts();
        assert_eq!(storage[0], Array2::from_elem((2, 2), 1.0));
        assert_eq!(storage[1], acc);
        assert_eq!(filtered[1], acc);
    }
}
