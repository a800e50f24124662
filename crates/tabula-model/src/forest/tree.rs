//! CART decision tree used as the forest's base learner.
//!
//! Nodes live in a flat vector; a split sends a row left when
//! `row[feature] <= threshold`. Leaves store a value vector: the class
//! distribution for classification, a single mean for regression.

use crate::model::Task;
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// Minimum impurity decrease for a split to be kept
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Vec<f64>),
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) task: Task,
    pub(crate) n_classes: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
}

/// A fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

/// Sufficient statistics of a node for split scoring.
///
/// `cost` is the node size times its impurity, so a split's quality is the
/// parent cost minus the sum of the children's costs.
trait Impurity: Clone {
    fn push(&mut self, y: f64);
    fn pop(&mut self, y: f64);
    fn count(&self) -> usize;
    fn cost(&self) -> f64;
}

#[derive(Debug, Clone)]
struct Gini {
    counts: Vec<f64>,
    n: usize,
}

impl Impurity for Gini {
    fn push(&mut self, y: f64) {
        self.counts[y as usize] += 1.0;
        self.n += 1;
    }

    fn pop(&mut self, y: f64) {
        self.counts[y as usize] -= 1.0;
        self.n -= 1;
    }

    fn count(&self) -> usize {
        self.n
    }

    fn cost(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        n - self.counts.iter().map(|c| c * c).sum::<f64>() / n
    }
}

#[derive(Debug, Clone, Default)]
struct Variance {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl Impurity for Variance {
    fn push(&mut self, y: f64) {
        self.n += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn pop(&mut self, y: f64) {
        self.n -= 1;
        self.sum -= y;
        self.sum_sq -= y * y;
    }

    fn count(&self) -> usize {
        self.n
    }

    fn cost(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.n as f64).max(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Grow a tree on the given (possibly repeated) row indices.
    pub(crate) fn fit<R: Rng + ?Sized>(
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = Builder {
            features: features.view(),
            targets: targets.view(),
            params,
            nodes: Vec::new(),
        };
        builder.grow(rows, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Leaf value vector reached by a row.
    pub(crate) fn leaf(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Check that every split reads a feature below `n_features`, every child
    /// id points forward inside the node list, and every leaf holds
    /// `leaf_width` values.
    ///
    /// Children always follow their parent, so forward ids also rule out
    /// cycles in [`DecisionTree::leaf`].
    pub(crate) fn check(&self, n_features: usize, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len();
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {id} splits on feature {feature} of {n_features}"
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= n_nodes {
                            return Err(format!(
                                "node {id} has child {child} outside {}..{n_nodes}",
                                id + 1
                            ));
                        }
                    }
                }
                Node::Leaf(value) if value.len() != leaf_width => {
                    return Err(format!(
                        "leaf {id} holds {} values, expected {leaf_width}",
                        value.len()
                    ));
                }
                Node::Leaf(_) => {}
            }
        }
        Ok(())
    }

    /// Number of nodes
    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0)
    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct Builder<'a> {
    features: ArrayView2<'a, f64>,
    targets: ArrayView1<'a, f64>,
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn grow<R: Rng + ?Sized>(&mut self, rows: Vec<usize>, depth: usize, rng: &mut R) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf(self.leaf_value(&rows)));

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || rows.len() < self.params.min_samples_split.max(2) {
            return id;
        }

        let split = match self.params.task {
            Task::Classification => self.best_split(
                &rows,
                Gini {
                    counts: vec![0.0; self.params.n_classes],
                    n: 0,
                },
                rng,
            ),
            Task::Regression => self.best_split(&rows, Variance::default(), rng),
        };
        let Some(split) = split else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.features[[r, split.feature]] <= split.threshold);

        let left = self.grow(left_rows, depth + 1, rng);
        let right = self.grow(right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn leaf_value(&self, rows: &[usize]) -> Vec<f64> {
        let n = rows.len().max(1) as f64;
        match self.params.task {
            Task::Classification => {
                let mut dist = vec![0.0; self.params.n_classes];
                for &r in rows {
                    dist[self.targets[r] as usize] += 1.0;
                }
                dist.iter_mut().for_each(|p| *p /= n);
                dist
            }
            Task::Regression => {
                vec![rows.iter().map(|&r| self.targets[r]).sum::<f64>() / n]
            }
        }
    }

    fn best_split<I: Impurity, R: Rng + ?Sized>(
        &self,
        rows: &[usize],
        empty: I,
        rng: &mut R,
    ) -> Option<Split> {
        let mut parent = empty.clone();
        for &r in rows {
            parent.push(self.targets[r]);
        }
        let parent_cost = parent.cost();
        if parent_cost <= MIN_GAIN {
            return None;
        }

        let n_features = self.features.ncols();
        if n_features == 0 {
            return None;
        }
        let k = self.params.max_features.clamp(1, n_features);
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<Split> = None;
        let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(rows.len());

        for feature in index::sample(rng, n_features, k) {
            sorted.clear();
            sorted.extend(
                rows.iter()
                    .map(|&r| (self.features[[r, feature]], self.targets[r])),
            );
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = empty.clone();
            let mut right = parent.clone();

            for i in 0..sorted.len() - 1 {
                let (x, y) = sorted[i];
                left.push(y);
                right.pop(y);

                let next = sorted[i + 1].0;
                if x == next || left.count() < min_leaf || right.count() < min_leaf {
                    continue;
                }

                let gain = parent_cost - left.cost() - right.cost();
                if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: x + (next - x) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}
