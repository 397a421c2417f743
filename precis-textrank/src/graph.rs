//! Weighted co-occurrence graph and PageRank scoring.

use std::collections::HashMap;

/// Interns node labels and accumulates undirected edge weights.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    index: HashMap<String, usize>,
    labels: Vec<String>,
    edges: HashMap<(usize, usize), f64>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_node(&mut self, label: &str) -> usize {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    /// Adds `weight` to the undirected edge between `a` and `b`.
    /// Self-loops are ignored.
    pub fn increment_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b {
            return;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        *self.edges.entry(key).or_insert(0.0) += weight;
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn build(self) -> Graph {
        let mut adjacency = vec![Vec::new(); self.labels.len()];
        for (&(a, b), &weight) in &self.edges {
            adjacency[a].push((b, weight));
            adjacency[b].push((a, weight));
        }
        // Sorted neighbor lists keep score propagation order, and therefore
        // floating point accumulation, independent of hash order.
        for neighbors in &mut adjacency {
            neighbors.sort_unstable_by_key(|&(node, _)| node);
        }
        Graph {
            adjacency,
            labels: self.labels,
        }
    }
}

#[derive(Debug, Default)]
pub struct Graph {
    adjacency: Vec<Vec<(usize, f64)>>,
    labels: Vec<String>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn label(&self, node: usize) -> &str {
        &self.labels[node]
    }

    pub fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adjacency[node]
    }

    fn total_weight(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|&(_, w)| w).sum()
    }
}

#[derive(Debug, Clone)]
pub struct PageRank {
    pub damping: f64,
    pub max_iterations: usize,
    pub threshold: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            threshold: 1e-6,
        }
    }
}

/// Scores plus how the iteration ended.
#[derive(Debug, Clone)]
pub struct PageRankScores {
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl PageRank {
    /// Power iteration with dangling-node redistribution. Returns partial
    /// scores with `converged = false` when the iteration cap is hit first.
    pub fn run(&self, graph: &Graph) -> PageRankScores {
        let n = graph.node_count();
        if n == 0 {
            return PageRankScores {
                scores: Vec::new(),
                iterations: 0,
                converged: true,
            };
        }

        let initial = 1.0 / n as f64;
        let mut scores = vec![initial; n];
        let mut new_scores = vec![0.0; n];

        let dangling: Vec<usize> = (0..n).filter(|&v| graph.neighbors(v).is_empty()).collect();
        let teleport = (1.0 - self.damping) / n as f64;

        let mut iterations = 0;
        let mut delta = f64::MAX;
        while iterations < self.max_iterations && delta > self.threshold {
            iterations += 1;

            let dangling_mass: f64 = dangling.iter().map(|&v| scores[v]).sum();
            new_scores.fill(teleport + self.damping * dangling_mass / n as f64);

            for (node, &score) in scores.iter().enumerate() {
                let total_weight = graph.total_weight(node);
                if total_weight > 0.0 {
                    for &(neighbor, weight) in graph.neighbors(node) {
                        new_scores[neighbor] += self.damping * score * weight / total_weight;
                    }
                }
            }

            delta = scores
                .iter()
                .zip(new_scores.iter())
                .map(|(old, new)| (old - new).abs())
                .sum();
            std::mem::swap(&mut scores, &mut new_scores);
        }

        let sum: f64 = scores.iter().sum();
        if sum > 0.0 {
            for score in &mut scores {
                *score /= sum;
            }
        }

        PageRankScores {
            scores,
            iterations,
            converged: delta <= self.threshold,
        }
    }
}
