// crates/mg_geo/src/spatial_index.rs

//! 测站近邻索引
//!
//! 测站集合在一次插值中不变，因此索引只支持批量构建，
//! 之后只做 k 近邻查询。

use crate::geometry::Point2D;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// 带负载的索引点
#[derive(Debug, Clone)]
struct IndexedPoint<T> {
    at: Point2D,
    payload: T,
}

impl<T> RTreeObject for IndexedPoint<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.at.x, self.at.y])
    }
}

impl<T> PointDistance for IndexedPoint<T> {
    fn distance_2(&self, query: &[f64; 2]) -> f64 {
        self.at.distance_squared_to(&Point2D::new(query[0], query[1]))
    }
}

/// 基于 R-tree 的二维点索引
pub struct SpatialIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.tree.size())
            .finish()
    }
}

impl<T> SpatialIndex<T> {
    /// 从点集批量构建
    #[must_use]
    pub fn bulk_load(points: Vec<(Point2D, T)>) -> Self {
        let items = points
            .into_iter()
            .map(|(at, payload)| IndexedPoint { at, payload })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// 距离 `target` 最近的 `k` 个点，按距离升序
    #[must_use]
    pub fn query_nearest(&self, target: &Point2D, k: usize) -> Vec<(&Point2D, &T)> {
        self.tree
            .nearest_neighbor_iter(&[target.x, target.y])
            .take(k)
            .map(|item| (&item.at, &item.payload))
            .collect()
    }

    /// 点数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
