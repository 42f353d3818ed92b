// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

const SAH_BUCKETS: usize = 12;

#[derive(Debug, Clone)]
struct BVHNode {
    bounds: AABB,
    left: Option<usize>,
    right: Option<usize>,
    start: usize,
    count: usize,
}

impl BVHNode {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: None, right: None, start, count }
    }

    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self { bounds, left: Some(left), right: Some(right), start: 0, count: 0 }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// SAH bounding volume hierarchy over opaque primitive indices. The hierarchy
/// only knows bounds; primitive tests are supplied by the caller.
#[derive(Debug, Clone)]
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
    max_leaf_size: usize,
}

impl BVH {
    pub fn new(prim_bounds: Vec<AABB>) -> Self {
        Self::with_max_leaf_size(prim_bounds, 4)
    }

    pub fn with_max_leaf_size(prim_bounds: Vec<AABB>, max_leaf_size: usize) -> Self {
        let prim_centroids = prim_bounds.iter().map(|b| b.center()).collect();
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
            max_leaf_size: max_leaf_size.max(1),
        };

        if !bvh.indices.is_empty() {
            let (bounds, centroid_bounds) = bvh.compute_bounds(0, bvh.indices.len());
            bvh.build(0, bvh.indices.len(), bounds, centroid_bounds);
        }

        log::debug!("Built BVH with {} nodes over {} primitives.", bvh.nodes.len(), bvh.indices.len());
        bvh
    }

    pub fn num_primitives(&self) -> usize {
        self.indices.len()
    }

    pub fn bounds(&self) -> AABB {
        self.nodes.first().map(|n| n.bounds).unwrap_or_default()
    }

    /// Closest hit. `hit_fn` receives the ray clipped to the closest distance
    /// found so far and reports `(payload, t)` for an accepted hit.
    pub fn ray_intersection<F, T>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut clipped = *ray;
        let mut closest: Option<(usize, T)> = None;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&clipped) {
                continue;
            }

            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if let Some((hit, t)) = hit_fn(prim_idx, &clipped) {
                        if clipped.update(t) {
                            closest = Some((prim_idx, hit));
                        }
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        closest
    }

    /// Any hit; stops at the first primitive `hit_fn` accepts.
    pub fn ray_intersection_t<F>(&self, ray: &Ray3f, mut hit_fn: F) -> bool
    where
        F: FnMut(usize, &Ray3f) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(ray) {
                continue;
            }
            if node.is_leaf() {
                for i in 0..node.count {
                    if hit_fn(self.indices[node.start + i], ray) {
                        return true;
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        false
    }

    fn bucket_of(&self, prim_idx: usize, axis: usize, axis_min: Float, axis_max: Float) -> usize {
        let c = self.prim_centroids[prim_idx][axis];
        let b = ((c - axis_min) / (axis_max - axis_min) * SAH_BUCKETS as Float) as usize;
        b.min(SAH_BUCKETS - 1)
    }

    fn push_leaf(&mut self, bounds: AABB, start: usize, count: usize) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::leaf(bounds, start, count));
        node_idx
    }

    fn build(&mut self, start: usize, end: usize, bounds: AABB, centroid_bounds: AABB) -> usize {
        let count = end - start;
        if count <= self.max_leaf_size {
            return self.push_leaf(bounds, start, count);
        }

        let axis = centroid_bounds.max_extent();
        let axis_min = centroid_bounds.p_min[axis];
        let axis_max = centroid_bounds.p_max[axis];
        if (axis_max - axis_min).abs() < 1e-6 {
            return self.push_leaf(bounds, start, count);
        }

        let mut buckets = [(0usize, AABB::default()); SAH_BUCKETS];
        for i in start..end {
            let idx = self.indices[i];
            let b = self.bucket_of(idx, axis, axis_min, axis_max);
            buckets[b].0 += 1;
            buckets[b].1.expand_by_aabb(&self.prim_bounds[idx]);
        }

        let area = bounds.surface_area().max(1e-6);
        let mut min_cost = Float::MAX;
        let mut min_split = 0usize;
        for split in 0..(SAH_BUCKETS - 1) {
            let (mut b0, mut b1) = (AABB::default(), AABB::default());
            let (mut count0, mut count1) = (0usize, 0usize);
            for (b, bucket) in buckets.iter().enumerate() {
                if b <= split {
                    count0 += bucket.0;
                    b0.expand_by_aabb(&bucket.1);
                } else {
                    count1 += bucket.0;
                    b1.expand_by_aabb(&bucket.1);
                }
            }
            let cost0 = if count0 > 0 { count0 as Float * b0.surface_area() } else { 0.0 };
            let cost1 = if count1 > 0 { count1 as Float * b1.surface_area() } else { 0.0 };
            let cost = 1.0 + (cost0 + cost1) / area;
            if cost < min_cost {
                min_cost = cost;
                min_split = split;
            }
        }

        if min_cost >= count as Float {
            return self.push_leaf(bounds, start, count);
        }

        let mut mid = start;
        for i in start..end {
            let idx = self.indices[i];
            if self.bucket_of(idx, axis, axis_min, axis_max) <= min_split {
                self.indices.swap(i, mid);
                mid += 1;
            }
        }

        if mid == start || mid == end {
            return self.push_leaf(bounds, start, count);
        }

        let (left_bounds, left_centroids) = self.compute_bounds(start, mid);
        let (right_bounds, right_centroids) = self.compute_bounds(mid, end);
        let node_idx = self.push_leaf(bounds, 0, 0);
        let left = self.build(start, mid, left_bounds, left_centroids);
        let right = self.build(mid, end, right_bounds, right_centroids);
        self.nodes[node_idx] = BVHNode::interior(bounds, left, right);
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for &idx in &self.indices[start..end] {
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::BVH;
    use crate::core::rng::Pcg32;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::shapes::triangle::Triangle;

    fn scattered_triangles() -> Vec<Triangle> {
        let mut rng = Pcg32::new(3, 11);
        let mut tris = Vec::new();
        for _ in 0..200 {
            let c = Vector3f::new(rng.next_f32() * 10.0, rng.next_f32() * 10.0, rng.next_f32() * 10.0);
            let e0 = Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) - Vector3f::repeat(0.5);
            let e1 = Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) - Vector3f::repeat(0.5);
            tris.push(Triangle::new(c, c + e0, c + e1));
        }
        tris
    }

    fn naive_closest(tris: &[Triangle], ray: &Ray3f) -> Option<(usize, Float)> {
        let mut best: Option<(usize, Float)> = None;
        for (i, tri) in tris.iter().enumerate() {
            if let Some(hit) = tri.intersect(ray) {
                if best.map_or(true, |(_, t)| hit.t < t) {
                    best = Some((i, hit.t));
                }
            }
        }
        best
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let tris = scattered_triangles();
        let bvh = BVH::new(tris.iter().map(|t| t.bounding_box()).collect());
        assert_eq!(bvh.num_primitives(), tris.len());

        let mut rng = Pcg32::new(5, 2);
        let mut hits = 0;
        for _ in 0..500 {
            let o = Vector3f::new(rng.next_f32() * 10.0, rng.next_f32() * 10.0, -5.0);
            let target = Vector3f::new(rng.next_f32() * 10.0, rng.next_f32() * 10.0, rng.next_f32() * 10.0);
            let ray = Ray3f::new(o, target - o, None, None);

            let bvh_hit = bvh.ray_intersection(&ray, |idx, r| tris[idx].intersect(r).map(|h| (h.t, h.t)));
            let naive = naive_closest(&tris, &ray);
            match (bvh_hit, naive) {
                (Some((_, t)), Some((_, tn))) => {
                    assert!((t - tn).abs() < 1e-4);
                    hits += 1;
                }
                (None, None) => {}
                other => panic!("bvh and brute force disagree: {:?}", other),
            }

            let any = bvh.ray_intersection_t(&ray, |idx, r| tris[idx].intersect(r).is_some());
            assert_eq!(any, naive.is_some());
        }
        assert!(hits > 0);
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = BVH::new(Vec::new());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(bvh.ray_intersection(&ray, |_, _| Some(((), 1.0))).is_none());
        assert!(!bvh.ray_intersection_t(&ray, |_, _| true));
        assert!(!bvh.bounds().is_valid());
    }
}
