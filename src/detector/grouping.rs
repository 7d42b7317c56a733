// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use crate::common::Rectangle;

/// Cluster of overlapping detections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectangleGroup {
    bbox: Rectangle,
    members: usize,
}

impl RectangleGroup {
    /// Average of the member rectangles.
    pub fn bbox(&self) -> &Rectangle {
        &self.bbox
    }

    pub fn members(&self) -> usize {
        self.members
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        DisjointSet {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            // keep the lowest index as root so groups come out in detection order
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}

/// Cluster raw detections: any two rectangles whose IoU exceeds `iou_threshold`
/// end up in the same group. Groups with fewer than `min_neighbors` members are dropped.
///
/// This is a separate pass; [`Detector::detect`](crate::Detector::detect) never applies it.
pub fn group_rectangles(
    rects: &[Rectangle],
    iou_threshold: f64,
    min_neighbors: usize,
) -> Vec<RectangleGroup> {
    let mut set = DisjointSet::new(rects.len());
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].iou(&rects[j]) > iou_threshold {
                set.union(i, j);
            }
        }
    }

    // (sum_x, sum_y, sum_w, sum_h, count) per root
    let mut sums = vec![(0i64, 0i64, 0u64, 0u64, 0usize); rects.len()];
    for (i, rect) in rects.iter().enumerate() {
        let root = set.find(i);
        let acc = &mut sums[root];
        acc.0 += i64::from(rect.x());
        acc.1 += i64::from(rect.y());
        acc.2 += u64::from(rect.width());
        acc.3 += u64::from(rect.height());
        acc.4 += 1;
    }

    sums.into_iter()
        .filter(|acc| acc.4 > 0 && acc.4 >= min_neighbors)
        .map(|(x, y, w, h, n)| {
            let count = n as f64;
            RectangleGroup {
                bbox: Rectangle::new(
                    (x as f64 / count).round() as i32,
                    (y as f64 / count).round() as i32,
                    (w as f64 / count).round() as u32,
                    (h as f64 / count).round() as u32,
                ),
                members: n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(group_rectangles(&[], 0.3, 1).is_empty());
    }

    #[test]
    fn test_two_clusters() {
        let rects = vec![
            Rectangle::new(0, 0, 20, 20),
            Rectangle::new(100, 100, 20, 20),
            Rectangle::new(2, 0, 20, 20),
            Rectangle::new(102, 102, 20, 20),
            Rectangle::new(4, 0, 20, 20),
        ];
        let groups = group_rectangles(&rects, 0.5, 1);
        assert_eq!(2, groups.len());
        assert_eq!(3, groups[0].members());
        assert_eq!(Rectangle::new(2, 0, 20, 20), *groups[0].bbox());
        assert_eq!(2, groups[1].members());
        assert_eq!(Rectangle::new(101, 101, 20, 20), *groups[1].bbox());
    }

    #[test]
    fn test_transitive_overlap() {
        // a overlaps b, b overlaps c, a and c are disjoint
        let rects = vec![
            Rectangle::new(0, 0, 10, 10),
            Rectangle::new(5, 0, 10, 10),
            Rectangle::new(10, 0, 10, 10),
        ];
        assert_eq!(0.0, rects[0].iou(&rects[2]));
        let groups = group_rectangles(&rects, 0.2, 1);
        assert_eq!(1, groups.len());
        assert_eq!(3, groups[0].members());
    }

    #[test]
    fn test_min_neighbors_filters_singletons() {
        let rects = vec![
            Rectangle::new(0, 0, 20, 20),
            Rectangle::new(1, 1, 20, 20),
            Rectangle::new(200, 200, 20, 20),
        ];
        let groups = group_rectangles(&rects, 0.5, 2);
        assert_eq!(1, groups.len());
        assert_eq!(2, groups[0].members());
    }
}
