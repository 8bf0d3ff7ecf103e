//! Dißmann's greedy R-vine structure selection.
//!
//! Builds one tree per level. A tree's vertices are the previous tree's
//! edges; two vertices may be joined when their conditioning sets agree and
//! their conditioned pairs share exactly one variable (the proximity
//! condition), which is exactly the condition under which a valid R-vine
//! edge exists between them. Among the allowed edges, a maximum spanning
//! tree by `|tree_criterion|` is kept, each edge gets a pair-copula fit
//! (or, below `threshold`, is forced to independence), and the fitted
//! h-functions become next level's pseudo-observations.
//!
//! The tree sequence is finally folded into an [`RVineMatrix`] by
//! [`assemble`], which walks it the same way the original
//! `Vinecop::update_vinecop` does: take the top (most recent) edge of a
//! matrix column, then repeatedly hunt one tree down for the edge whose
//! variable set matches the accumulated conditioning set.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;

use crate::bicop::{Bicop, FitControlsBicop};
use crate::error::{Error, Result};
use crate::family::BicopFamily;
use crate::rvine_matrix::RVineMatrix;
use crate::stats::pairwise_tau;
use crate::vinecop::controls::FitControlsVinecop;

/// One vertex of a Dißmann tree level: a modeled pair `(a, b)` conditioned
/// on `conditioning`, with each side's pseudo-observation against the rest.
struct Vertex {
    conditioned: (u32, u32),
    conditioning: Vec<u32>,
    obs_a: Array1<f64>,
    obs_b: Array1<f64>,
}

impl Vertex {
    fn obs_for(&self, var: u32) -> &Array1<f64> {
        if self.conditioned.0 == var {
            &self.obs_a
        } else {
            debug_assert_eq!(self.conditioned.1, var);
            &self.obs_b
        }
    }

    fn var_set(&self) -> BTreeSet<u32> {
        let mut set: BTreeSet<u32> = self.conditioning.iter().copied().collect();
        set.insert(self.conditioned.0);
        set.insert(self.conditioned.1);
        set
    }
}

/// If `v1` and `v2` may be joined by an edge in the next tree level, returns
/// `(new_conditioned_a, new_conditioned_b, new_conditioning)`.
fn connectable(v1: &Vertex, v2: &Vertex) -> Option<(u32, u32, Vec<u32>)> {
    let mut d1 = v1.conditioning.clone();
    d1.sort_unstable();
    let mut d2 = v2.conditioning.clone();
    d2.sort_unstable();
    if d1 != d2 {
        return None;
    }
    let c1 = [v1.conditioned.0, v1.conditioned.1];
    let c2 = [v2.conditioned.0, v2.conditioned.1];
    let shared: Vec<u32> = c1.into_iter().filter(|x| c2.contains(x)).collect();
    if shared.len() != 1 {
        return None;
    }
    let s = shared[0];
    let a = c1.into_iter().find(|&x| x != s)?;
    let b = c2.into_iter().find(|&x| x != s)?;
    let mut conditioning = d1;
    conditioning.push(s);
    Some((a, b, conditioning))
}

/// Disjoint-set union backing Kruskal's maximum-spanning-tree selection.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            false
        } else {
            self.parent[ra] = rb;
            true
        }
    }
}

/// The first tree: a complete graph on the `d` raw variables, collapsed to
/// a maximum spanning tree by `|tau|` (the original's base-tree star plus
/// its first real tree collapse into one step here, since an empty
/// conditioning set always satisfies the proximity condition).
fn first_tree(data: ArrayView2<f64>) -> Vec<Vertex> {
    let d = data.ncols();
    let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(d * (d - 1) / 2);
    for i in 0..d {
        for j in (i + 1)..d {
            let weight = pairwise_tau(data.column(i), data.column(j)).abs();
            edges.push((i, j, weight));
        }
    }
    edges.sort_by(|a, b| b.2.partial_cmp(&a.2).expect("tau is always finite"));

    let mut dsu = DisjointSet::new(d);
    let mut vertices = Vec::with_capacity(d - 1);
    for (i, j, _) in edges {
        if vertices.len() == d - 1 {
            break;
        }
        if dsu.union(i, j) {
            vertices.push(Vertex {
                conditioned: (i as u32 + 1, j as u32 + 1),
                conditioning: Vec::new(),
                obs_a: data.column(i).to_owned(),
                obs_b: data.column(j).to_owned(),
            });
        }
    }
    vertices
}

fn hfunc_vec(bicop: &Bicop, x: &Array1<f64>, y: &Array1<f64>, which1: bool) -> Array1<f64> {
    Array1::from_shape_fn(x.len(), |k| if which1 { bicop.hfunc1(x[k], y[k]) } else { bicop.hfunc2(x[k], y[k]) })
}

/// Builds the next tree level from `prev`, fitting one pair-copula per
/// surviving edge and returning both the new vertices and their copulas
/// (indexed the same way, for [`assemble`] to consume).
fn select_next_tree(
    prev: &[Vertex],
    tree_index: usize,
    controls: &FitControlsVinecop,
) -> Result<(Vec<Vertex>, Vec<Bicop>)> {
    let m = prev.len();
    let n = prev[0].obs_a.len();

    let mut candidates: Vec<(usize, usize, u32, u32, Vec<u32>, f64)> = Vec::new();
    for i in 0..m {
        for j in (i + 1)..m {
            if let Some((a, b, conditioning)) = connectable(&prev[i], &prev[j]) {
                let x = prev[i].obs_for(a);
                let y = prev[j].obs_for(b);
                let weight = controls.tree_criterion().evaluate(x.view(), y.view()).abs();
                candidates.push((i, j, a, b, conditioning, weight));
            }
        }
    }
    candidates.sort_by(|p, q| q.5.partial_cmp(&p.5).expect("tree weights are always finite"));

    let mut dsu = DisjointSet::new(m);
    let mut kept: Vec<(u32, u32, Vec<u32>, Array1<f64>, Array1<f64>)> = Vec::with_capacity(m.saturating_sub(1));
    for (i, j, a, b, conditioning, _) in candidates {
        if kept.len() == m.saturating_sub(1) {
            break;
        }
        if dsu.union(i, j) {
            let x = prev[i].obs_for(a).clone();
            let y = prev[j].obs_for(b).clone();
            kept.push((a, b, conditioning, x, y));
        }
    }

    if kept.len() != m.saturating_sub(1) {
        return Err(Error::Structure(format!(
            "structure selection could not connect tree {tree_index}: found {} of {} required edges",
            kept.len(),
            m.saturating_sub(1)
        )));
    }

    let fitted: Vec<Result<(Vertex, Bicop)>> = kept
        .into_par_iter()
        .map(|(a, b, conditioning, x, y)| {
            let mut u_e = Array2::zeros((n, 2));
            u_e.column_mut(0).assign(&x);
            u_e.column_mut(1).assign(&y);

            let weight = controls.tree_criterion().evaluate(x.view(), y.view()).abs();
            let edge_copula = if weight < controls.threshold() {
                Bicop::new(BicopFamily::Indep)
            } else {
                Bicop::select(u_e.view(), controls.bicop_controls())?
            };

            // `obs_for(key)` must return the OTHER conditioned variable's
            // distribution given everything including `key`, so it's keyed
            // opposite to which side of the h-function it reads from.
            let obs_a = hfunc_vec(&edge_copula, &x, &y, true);
            let obs_b = hfunc_vec(&edge_copula, &x, &y, false);
            let vertex = Vertex { conditioned: (a, b), conditioning, obs_a, obs_b };
            Ok((vertex, edge_copula))
        })
        .collect();

    let mut vertices = Vec::with_capacity(fitted.len());
    let mut copulas = Vec::with_capacity(fitted.len());
    for result in fitted {
        let (vertex, copula) = result?;
        vertices.push(vertex);
        copulas.push(copula);
    }
    Ok((vertices, copulas))
}

/// Folds a tree sequence (`levels[k]` holding both a tree's vertices and its
/// fitted pair-copulas) into an [`RVineMatrix`] plus the `pair_copulas_`
/// staircase indexed by `(tree, column)` exactly as [`RVineMatrix::matrix`]
/// expects: column `col`'s diagonal is row `col`.
fn assemble(mut levels: Vec<Vec<(Vertex, Bicop)>>, d: usize) -> Result<(RVineMatrix, Vec<Vec<Bicop>>)> {
    let mut matrix = Array2::<u32>::zeros((d, d));
    let mut pair_copulas: Vec<Vec<Option<Bicop>>> = (0..d - 1).map(|t| vec![None; d - 1 - t]).collect();

    for col in 0..(d - 1) {
        let t = d - 1 - col;
        let level_idx = t - 1;
        let (v0, pc0) =
            levels[level_idx].pop().ok_or_else(|| Error::Structure("tree sequence exhausted early".to_string()))?;
        matrix[[col, col]] = v0.conditioned.0;
        matrix[[col + 1, col]] = v0.conditioned.1;
        pair_copulas[t - 1][col] = Some(pc0);

        let diag = v0.conditioned.0;
        let mut ned_set: BTreeSet<u32> = v0.conditioning.iter().copied().collect();

        for k in 1..t {
            let target_level = t - k - 1;
            let mut reduced = ned_set.clone();
            reduced.insert(diag);

            let pos = levels[target_level].iter().position(|(v, _)| v.var_set() == reduced).ok_or_else(|| {
                Error::Structure("Dissmann reassembly could not find a matching edge".to_string())
            })?;
            let (v_new, mut pc_new) = levels[target_level].remove(pos);

            let matches_first = v_new.conditioned.0 == diag;
            let other = if matches_first { v_new.conditioned.1 } else { v_new.conditioned.0 };
            matrix[[col + 1 + k, col]] = other;
            if !matches_first {
                pc_new.flip();
            }
            pair_copulas[target_level][col] = Some(pc_new);
            ned_set = v_new.conditioning.iter().copied().collect();
        }
    }
    matrix[[d - 1, d - 1]] = matrix[[d - 1, d - 2]];

    let pair_copulas: Vec<Vec<Bicop>> = pair_copulas
        .into_iter()
        .map(|row| row.into_iter().map(|pc| pc.expect("every staircase entry is filled during assembly")).collect())
        .collect();

    Ok((RVineMatrix::new(matrix)?, pair_copulas))
}

/// Selects both the R-vine structure and every pair-copula from `data`
/// (Dißmann's algorithm): one maximum-spanning tree per level, truncated at
/// `controls.truncation_level()` trees, with untruncated levels beyond that
/// defaulting to independence.
pub fn select_all(data: ArrayView2<f64>, controls: &FitControlsVinecop) -> Result<(RVineMatrix, Vec<Vec<Bicop>>)> {
    let d = data.ncols();
    if d < 2 {
        return Err(Error::Domain("need at least 2 variables to select a vine structure".to_string()));
    }
    if data.nrows() < 2 {
        return Err(Error::State("structure selection needs at least 2 observations".to_string()));
    }

    let max_trees = (d - 1).min(controls.truncation_level());
    let mut levels: Vec<Vec<(Vertex, Bicop)>> = Vec::with_capacity(d - 1);

    let first = first_tree(data);
    if controls.show_trace() {
        eprintln!("tree 1: {} edges", first.len());
    }

    let n = first[0].obs_a.len();
    let mut level: Vec<(Vertex, Bicop)> = Vec::with_capacity(first.len());
    // The first tree's edges are fit on raw pseudo-observations; every
    // later tree's edges arrive from `select_next_tree` already carrying
    // the h-transformed pseudo-observations the next level needs, so this
    // transform happens exactly once, here.
    for vertex in first {
        let mut u_e = Array2::zeros((n, 2));
        u_e.column_mut(0).assign(&vertex.obs_a);
        u_e.column_mut(1).assign(&vertex.obs_b);
        let copula = Bicop::select(u_e.view(), controls.bicop_controls())?;
        level.push((vertex, copula));
    }
    levels.push(level);

    let mut prev_vertices: Vec<Vertex> = levels[0]
        .iter()
        .map(|(v, c)| Vertex {
            conditioned: v.conditioned,
            conditioning: v.conditioning.clone(),
            obs_a: hfunc_vec(c, &v.obs_a, &v.obs_b, true),
            obs_b: hfunc_vec(c, &v.obs_a, &v.obs_b, false),
        })
        .collect();

    for tree_index in 1..max_trees {
        if prev_vertices.len() < 2 {
            break;
        }
        let (next_vertices, next_copulas) = select_next_tree(&prev_vertices, tree_index + 1, controls)?;
        if controls.show_trace() {
            eprintln!("tree {}: {} edges", tree_index + 1, next_vertices.len());
        }
        prev_vertices = next_vertices
            .iter()
            .map(|v| Vertex {
                conditioned: v.conditioned,
                conditioning: v.conditioning.clone(),
                obs_a: v.obs_a.clone(),
                obs_b: v.obs_b.clone(),
            })
            .collect();
        levels.push(next_vertices.into_iter().zip(next_copulas).collect());
    }

    fill_remaining_levels(&mut levels, d);
    assemble(levels, d)
}

/// Selects only the pair-copulas for a vine whose structure (`matrix`) is
/// already fixed: one tree per `matrix` column, each edge fit independently
/// (no spanning-tree search needed since the edges are already determined).
pub fn select_families(
    data: ArrayView2<f64>,
    matrix: &RVineMatrix,
    controls: &FitControlsVinecop,
) -> Result<Vec<Vec<Bicop>>> {
    let d = matrix.dim();
    if data.ncols() != d {
        return Err(Error::Domain(format!("data has {} columns, matrix expects {d}", data.ncols())));
    }

    let natural = matrix.in_natural_order();
    let order = matrix.order();
    let max_matrix = matrix.get_max_matrix();
    let needed1 = matrix.get_needed_hfunc1();
    let needed2 = matrix.get_needed_hfunc2();

    let n = data.nrows();
    // column j of hfunc{1,2} holds the running pseudo-observation for
    // variable `order[j]` after conditioning on everything processed so far.
    let mut hfunc1: Array2<f64> = Array2::zeros((d, d));
    let mut hfunc2: Array2<f64> = Array2::zeros((d, d));
    for j in 0..d {
        let col = data.column((order[j] - 1) as usize).to_owned();
        hfunc2.column_mut(j).assign(&col);
        hfunc1.column_mut(j).assign(&col);
    }

    let mut pair_copulas: Vec<Vec<Bicop>> = (0..d - 1).map(|t| Vec::with_capacity(d - 1 - t)).collect();
    let max_trees = (d - 1).min(controls.truncation_level());

    for tree in 0..(d - 1) {
        for edge in 0..(d - tree - 1) {
            if tree >= max_trees {
                pair_copulas[tree].push(Bicop::new(BicopFamily::Indep));
                continue;
            }
            let m = max_matrix[[tree, edge]];
            let u1 = hfunc2.column(edge).to_owned();
            let u2 = if m == natural[[tree, edge]] { hfunc2.column(d - m as usize) } else { hfunc1.column(d - m as usize) }
                .to_owned();

            let mut u_e = Array2::zeros((n, 2));
            u_e.column_mut(0).assign(&u1);
            u_e.column_mut(1).assign(&u2);
            let copula = Bicop::select(u_e.view(), controls.bicop_controls())?;

            if needed1[[tree + 1, edge]] {
                hfunc1.column_mut(edge).assign(&hfunc_vec(&copula, &u1, &u2, true));
            }
            if needed2[[tree + 1, edge]] {
                hfunc2.column_mut(edge).assign(&hfunc_vec(&copula, &u1, &u2, false));
            }
            pair_copulas[tree].push(copula);
        }
    }
    Ok(pair_copulas)
}

/// Pads out `levels` with independence edges for every tree beyond where
/// [`select_all`] stopped early (truncation, or a level collapsing to a
/// single vertex), so [`assemble`] always receives a full `d - 1` levels.
fn fill_remaining_levels(levels: &mut Vec<Vec<(Vertex, Bicop)>>, d: usize) {
    while levels.len() < d - 1 {
        let prev = levels.last().expect("first_tree always seeds at least one level");
        let mut next = Vec::with_capacity(prev.len().saturating_sub(1));
        let mut used = vec![false; prev.len()];
        for i in 0..prev.len() {
            if used[i] {
                continue;
            }
            for j in (i + 1)..prev.len() {
                if used[j] {
                    continue;
                }
                if let Some((a, b, conditioning)) = connectable(&prev[i].0, &prev[j].0) {
                    let x = prev[i].0.obs_for(a).clone();
                    let y = prev[j].0.obs_for(b).clone();
                    let copula = Bicop::new(BicopFamily::Indep);
                    let obs_a = hfunc_vec(&copula, &x, &y, true);
                    let obs_b = hfunc_vec(&copula, &x, &y, false);
                    next.push((Vertex { conditioned: (a, b), conditioning, obs_a, obs_b }, copula));
                    used[i] = true;
                    used[j] = true;
                    break;
                }
            }
        }
        if next.is_empty() {
            break;
        }
        levels.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bicop::ParametricMethod;
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Uniform};
    use rand_pcg::Pcg64;

    fn independent_data(n: usize, d: usize, seed: u64) -> Array2<f64> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let uniform = Uniform::new(0.0_f64, 1.0).unwrap();
        Array2::from_shape_fn((n, d), |_| uniform.sample(&mut rng))
    }

    #[test]
    fn select_all_builds_a_valid_matrix_for_independent_data() {
        let data = independent_data(200, 4, 7);
        let mut controls = FitControlsVinecop::default();
        controls.set_truncation_level(3).unwrap();
        let (matrix, pair_copulas) = select_all(data.view(), &controls).unwrap();
        assert_eq!(matrix.dim(), 4);
        assert_eq!(pair_copulas.len(), 3);
        assert_eq!(pair_copulas[0].len(), 3);
        assert_eq!(pair_copulas[2].len(), 1);
    }

    #[test]
    fn truncated_selection_forces_independence_on_dropped_trees() {
        let data = independent_data(150, 5, 11);
        let mut controls = FitControlsVinecop::default();
        controls.set_truncation_level(1).unwrap();
        let (_, pair_copulas) = select_all(data.view(), &controls).unwrap();
        for edge in &pair_copulas[1] {
            assert_eq!(edge.family(), BicopFamily::Indep);
        }
    }

    #[test]
    fn select_families_respects_a_fixed_d_vine_order() {
        let data = independent_data(120, 3, 3);
        let matrix = RVineMatrix::construct_d_vine_matrix(&[1, 2, 3]).unwrap();
        let mut bicop_controls = FitControlsBicop::default();
        bicop_controls.set_parametric_method(ParametricMethod::Itau);
        let controls = FitControlsVinecop::new(
            bicop_controls,
            usize::MAX,
            crate::stats::TreeCriterion::Tau,
            0.0,
            false,
            false,
            false,
            1,
            0.9,
        )
        .unwrap();
        let pair_copulas = select_families(data.view(), &matrix, &controls).unwrap();
        assert_eq!(pair_copulas.len(), 2);
        assert_eq!(pair_copulas[0].len(), 2);
        assert_eq!(pair_copulas[1].len(), 1);
    }
}
