use crate::Point;
use kiddo::{KdTree, SquaredEuclidean};

/// Immutable set of candidate corner detections.
///
/// Only ever queried for nearest neighbors; every returned point is an
/// exact member of the set.
pub struct CandidateCloud {
    points: Vec<Point>,
    tree: KdTree<f64, 2>,
}

impl CandidateCloud {
    pub fn new(points: Vec<Point>) -> Self {
        let coords = points.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>();
        let tree: KdTree<f64, 2> = (&coords).into();
        Self { points, tree }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Closest candidate to `p`.
    ///
    /// With `max_distance`, a closest candidate whose squared distance is
    /// `>= max_distance²` is rejected and `None` is returned. An empty
    /// cloud always yields `None`.
    pub fn nearest(&self, p: Point, max_distance: Option<f64>) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let nn = self.tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
        if let Some(max) = max_distance {
            if nn.distance >= max * max {
                return None;
            }
        }
        self.points.get(nn.item as usize).copied()
    }

    /// Up to `k` candidates closest to `p`, nearest first.
    pub fn nearest_n(&self, p: Point, k: usize) -> Vec<Point> {
        if self.points.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut found = self.tree.nearest_n::<SquaredEuclidean>(&[p.x, p.y], k);
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found
            .into_iter()
            .filter_map(|nn| self.points.get(nn.item as usize).copied())
            .collect()
    }
}

impl std::fmt::Debug for CandidateCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateCloud")
            .field("len", &self.points.len())
            .finish()
    }
}

impl From<Vec<Point>> for CandidateCloud {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for CandidateCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scattered() -> CandidateCloud {
        [
            (12.0, 40.5),
            (80.25, 33.0),
            (55.0, 91.0),
            (140.0, 12.75),
            (101.5, 120.0),
            (7.0, 150.0),
        ]
        .into_iter()
        .map(|(x, y)| Point::new(x, y))
        .collect()
    }

    fn brute_force(cloud: &CandidateCloud, p: Point) -> Point {
        let mut best = cloud.points()[0];
        for &c in cloud.points() {
            if (c - p).norm_squared() < (best - p).norm_squared() {
                best = c;
            }
        }
        best
    }

    #[test]
    fn returns_true_closest_member() {
        let cloud = scattered();
        for q in [
            Point::new(0.0, 0.0),
            Point::new(60.0, 80.0),
            Point::new(130.0, 20.0),
            Point::new(100.0, 119.0),
            Point::new(-50.0, 300.0),
        ] {
            assert_eq!(cloud.nearest(q, None), Some(brute_force(&cloud, q)));
        }
    }

    #[test]
    fn result_is_cloud_member() {
        let cloud = scattered();
        let hit = cloud.nearest(Point::new(81.0, 34.0), None).expect("hit");
        assert!(cloud.points().contains(&hit));
    }

    #[test]
    fn cap_rejects_far_matches() {
        let cloud = scattered();
        // (80.25, 33.0) is 5 px away from this query.
        let q = Point::new(80.25, 38.0);
        assert_eq!(cloud.nearest(q, Some(6.0)), Some(Point::new(80.25, 33.0)));
        assert_eq!(cloud.nearest(q, Some(5.0)), None, "boundary is exclusive");
        assert_eq!(cloud.nearest(q, Some(2.0)), None);
    }

    #[test]
    fn nearest_n_is_sorted_by_distance() {
        let cloud = scattered();
        let q = Point::new(60.0, 80.0);
        let hits = cloud.nearest_n(q, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], brute_force(&cloud, q));
        for pair in hits.windows(2) {
            assert!((pair[0] - q).norm() <= (pair[1] - q).norm());
        }
        assert_eq!(cloud.nearest_n(q, 50).len(), cloud.len());
    }

    #[test]
    fn empty_cloud_has_no_neighbors() {
        let cloud = CandidateCloud::new(Vec::new());
        assert!(cloud.is_empty());
        assert_eq!(cloud.nearest(Point::new(1.0, 1.0), None), None);
        assert!(cloud.nearest_n(Point::new(1.0, 1.0), 4).is_empty());
    }
}
