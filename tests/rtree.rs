// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios over the public API.

use std::collections::HashSet;

use rtree_index::{Rtree, SplitType};

/// Small deterministic generator so these scenarios don't need a `rand`
/// dependency, mirroring `src/testutil.rs`'s in-crate counterpart (not
/// reachable from here since integration tests only see the public API).
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed } }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_range(&mut self, lo: i64, hi: i64) -> i64 {
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as i64
    }

    fn next_coord(&mut self, dim: usize, lo: i64, hi: i64) -> Vec<i64> {
        (0..dim).map(|_| self.next_range(lo, hi)).collect()
    }
}

fn sequential_scan(points: &[(Vec<i64>, i64)], lo: &[i64], hi: &[i64]) -> HashSet<(Vec<i64>, i64)> {
    points
        .iter()
        .filter(|(coord, _)| coord.iter().zip(lo).zip(hi).all(|((&c, &l), &h)| c >= l && c <= h))
        .cloned()
        .collect()
}

fn euclidean_sq(a: &[i64], b: &[i64]) -> i128 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = (x - y) as i128;
            d * d
        })
        .sum()
}

#[test]
fn s1_single_insert() {
    let mut tree = Rtree::create_in_memory(2, 128, SplitType::Quadratic).unwrap();
    tree.insert(vec![0, 0], 7).unwrap();
    assert_eq!(
        tree.search_range(&[-1, -1], &[1, 1]).unwrap(),
        vec![(vec![0, 0], 7)]
    );
    assert_eq!(tree.search_knn(&[0, 0], 1).unwrap(), vec![(vec![0, 0], 7)]);
}

#[test]
fn s2_forced_split() {
    let mut tree = Rtree::create_in_memory(2, 128, SplitType::Linear).unwrap();
    let max = rtree_index::node::max_entries(2, 128, true);
    let mut rng = Xorshift64::new(1);
    assert_eq!(tree.node_count(), 1);
    for _ in 0..=max {
        let coord = rng.next_coord(2, -1000, 1000);
        tree.insert(coord, 0).unwrap();
    }
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn s3_range_over_many_matches_sequential_scan() {
    let mut tree = Rtree::create_in_memory(3, 512, SplitType::Quadratic).unwrap();
    let mut rng = Xorshift64::new(2);
    let mut points = Vec::new();
    for i in 0..1000i64 {
        let coord = rng.next_coord(3, -1000, 1000);
        tree.insert(coord.clone(), i).unwrap();
        points.push((coord, i));
    }

    for _ in 0..10 {
        let a = rng.next_coord(3, -1000, 1000);
        let b = rng.next_coord(3, -1000, 1000);
        let lo: Vec<i64> = a.iter().zip(&b).map(|(&x, &y)| x.min(y)).collect();
        let hi: Vec<i64> = a.iter().zip(&b).map(|(&x, &y)| x.max(y)).collect();

        let expected = sequential_scan(&points, &lo, &hi);
        let got: HashSet<_> = tree.search_range(&lo, &hi).unwrap().into_iter().collect();
        assert_eq!(got, expected);
    }
}

#[test]
fn s4_knn_smaller_than_n() {
    let mut tree = Rtree::create_in_memory(2, 128, SplitType::BruteForce).unwrap();
    let mut rng = Xorshift64::new(3);
    let mut points = Vec::new();
    for i in 0..100i64 {
        let coord = rng.next_coord(2, -500, 500);
        tree.insert(coord.clone(), i).unwrap();
        points.push((coord, i));
    }

    let p = vec![0, 0];
    let hits = tree.search_knn(&p, 20).unwrap();
    assert_eq!(hits.len(), 20);

    let mut by_dist: Vec<_> = points
        .iter()
        .map(|(c, d)| (euclidean_sq(c, &p), c.clone(), *d))
        .collect();
    by_dist.sort_by_key(|(dist, _, _)| *dist);
    let cutoff = by_dist[19].0;
    let top: HashSet<_> = by_dist
        .iter()
        .filter(|(dist, _, _)| *dist <= cutoff)
        .map(|(_, c, d)| (c.clone(), *d))
        .collect();

    for hit in &hits {
        assert!(top.contains(hit), "hit {:?} not in extended top-20", hit);
    }
}

#[test]
fn s5_knn_larger_than_n() {
    let mut tree = Rtree::create_in_memory(2, 128, SplitType::BruteForce).unwrap();
    let mut rng = Xorshift64::new(4);
    for i in 0..100i64 {
        let coord = rng.next_coord(2, -500, 500);
        tree.insert(coord, i).unwrap();
    }
    let hits = tree.search_knn(&[0, 0], 120).unwrap();
    assert_eq!(hits.len(), 100);
}

#[test]
fn s6_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s6.rtree");
    let mut rng = Xorshift64::new(5);
    let mut points = Vec::new();

    {
        let mut tree = Rtree::create_in_file(&path, 2, 256, SplitType::Quadratic).unwrap();
        for i in 0..500i64 {
            let coord = rng.next_coord(2, -1000, 1000);
            tree.insert(coord.clone(), i).unwrap();
            points.push((coord, i));
        }
    }

    let mut reopened = Rtree::open_from_file(&path).unwrap();
    let universe_lo = vec![i64::MIN / 2; 2];
    let universe_hi = vec![i64::MAX / 2; 2];
    let got: HashSet<_> = reopened
        .search_range(&universe_lo, &universe_hi)
        .unwrap()
        .into_iter()
        .collect();
    let expected: HashSet<_> = points.into_iter().collect();
    assert_eq!(got, expected);
}

#[test]
fn s7_every_node_reachable_from_root() {
    let mut tree = Rtree::create_in_memory(2, 128, SplitType::Quadratic).unwrap();
    let mut rng = Xorshift64::new(6);
    for _ in 0..2000 {
        let coord = rng.next_coord(2, -10_000, 10_000);
        tree.insert(coord, 0).unwrap();
    }

    assert_eq!(tree.reachable_node_count().unwrap(), tree.node_count());
}
