use denoise_core::PointCloud;
use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;

use crate::RadiusIndex;

/// Static k-d tree over the finite points of a cloud, backed by kiddo's
/// `ImmutableKdTree`. Build once, then query from any number of threads.
///
/// Points with a non-finite coordinate are left out of the tree, so they are
/// never returned by a query. Tree items are positions in the finite subset;
/// `ids` maps them back to indices in the original cloud.
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    ids: Vec<usize>,
    num_points: usize,
}

impl KdTree {
    /// Index every finite point of `cloud`.
    ///
    /// # Panics
    ///
    /// Panics if the cloud holds more than `u32::MAX` finite points.
    pub fn build(cloud: &PointCloud) -> Self {
        let mut points: Vec<[f32; 3]> = Vec::with_capacity(cloud.len());
        let mut ids = Vec::with_capacity(cloud.len());
        for i in 0..cloud.len() {
            if cloud.is_finite_at(i) {
                points.push(cloud.point(i));
                ids.push(i);
            }
        }
        assert!(
            points.len() <= u32::MAX as usize,
            "KdTree supports at most u32::MAX points"
        );

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            ids,
            num_points: cloud.len(),
        }
    }

    /// Number of points actually stored in the tree (finite points only).
    pub fn indexed_len(&self) -> usize {
        self.ids.len()
    }
}

impl KdTree {
    /// Tree hits within `radius` of `query`, unsorted and still in tree ids.
    fn hits(&self, query: &[f32; 3], radius: f32) -> impl Iterator<Item = u32> {
        let valid = !self.ids.is_empty()
            && radius > 0.0
            && radius.is_finite()
            && query.iter().all(|v| v.is_finite());
        let radius_sq = radius * radius;

        // `within_unsorted` is strict; pad and re-check with `<=` so points
        // at exactly `radius` are returned.
        let results = if valid {
            let query_radius_sq = radius_sq + f32::EPSILON * radius_sq.max(1.0);
            self.tree
                .within_unsorted::<SquaredEuclidean>(query, query_radius_sq)
        } else {
            Vec::new()
        };

        results
            .into_iter()
            .filter(move |nn| nn.distance <= radius_sq)
            .map(|nn| nn.item)
    }
}

impl RadiusIndex for KdTree {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .hits(query, radius)
            .map(|item| self.ids[item as usize])
            .collect();
        indices.sort_unstable();
        indices
    }

    fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        self.hits(query, radius).count()
    }

    fn len(&self) -> usize {
        self.num_points
    }
}
