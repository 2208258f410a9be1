//! Atom-pair shingles.
//!
//! A shingle joins the neighborhoods of two atoms at the same radius with the
//! topological distance between the atoms: `"{a}|{distance}|{b}"` where `a`
//! and `b` are the two neighborhood strings in lexicographic order.

use indexmap::IndexMap;
use ndarray::Array2;
use petgraph::algo::dijkstra;

use crate::chem::molecule::Molecule;
use crate::fingerprints::map::neighborhood::NeighborhoodTable;

/// Distance recorded between atoms in different components.
pub const DISCONNECTED_DISTANCE: f64 = 1e8;

/// All-pairs shortest-path bond counts.
pub fn distance_matrix(mol: &Molecule) -> Array2<f64> {
    let n = mol.atom_count();
    let graph = mol.graph();
    let mut distances = Array2::from_elem((n, n), DISCONNECTED_DISTANCE);

    for start in graph.node_indices() {
        for (node, cost) in dijkstra(graph, start, None, |_| 1.0_f64) {
            distances[[start.index(), node.index()]] = cost;
        }
    }
    distances
}

/// Shingle for one pair of neighborhoods, independent of argument order.
pub fn pair_shingle(env_a: &str, env_b: &str, distance: i64) -> String {
    let (first, second) = if env_a <= env_b {
        (env_a, env_b)
    } else {
        (env_b, env_a)
    };
    format!("{first}|{distance}|{second}")
}

/// Shingles for every unordered atom pair and radius `1..=max_radius` where
/// both neighborhoods exist, as byte strings.
///
/// Pairs are visited by increasing first atom, then increasing second atom,
/// then increasing radius. With `count_mode` each distinct shingle is emitted
/// once, in first-seen order, as `"{shingle}|{occurrences}"`.
pub fn atom_pair_shingles(
    mol: &Molecule,
    neighborhoods: &NeighborhoodTable,
    max_radius: usize,
    count_mode: bool,
) -> Vec<Vec<u8>> {
    let n = mol.atom_count();
    let distances = distance_matrix(mol);
    let mut shingles = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            // Truncation toward zero, never rounding.
            let distance = distances[[i, j]] as i64;
            for radius in 1..=max_radius {
                let (Some(env_i), Some(env_j)) =
                    (neighborhoods.get(i, radius), neighborhoods.get(j, radius))
                else {
                    continue;
                };
                shingles.push(pair_shingle(env_i, env_j, distance));
            }
        }
    }

    if !count_mode {
        return shingles.into_iter().map(String::into_bytes).collect();
    }

    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for shingle in shingles {
        *counts.entry(shingle).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(shingle, count)| format!("{shingle}|{count}").into_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::smiles::parse_smiles;
    use crate::fingerprints::map::neighborhood::neighborhoods;

    fn shingle_strings(smiles: &str, radius: usize, count_mode: bool) -> Vec<String> {
        let mol = parse_smiles(smiles).unwrap();
        let table = neighborhoods(&mol, radius);
        atom_pair_shingles(&mol, &table, radius, count_mode)
            .into_iter()
            .map(|bytes| String::from_utf8(bytes).unwrap())
            .collect()
    }

    #[test]
    fn distances_count_bonds() {
        let mol = parse_smiles("CCCO").unwrap();
        let dm = distance_matrix(&mol);
        assert_eq!(dm[[0, 3]], 3.0);
        assert_eq!(dm[[3, 0]], 3.0);
        assert_eq!(dm[[1, 1]], 0.0);

        let ring = parse_smiles("C1CCCCC1").unwrap();
        assert_eq!(distance_matrix(&ring)[[0, 3]], 3.0);
        assert_eq!(distance_matrix(&ring)[[0, 5]], 1.0);
    }

    #[test]
    fn disconnected_atoms_get_sentinel_distance() {
        let mol = parse_smiles("CC.O").unwrap();
        let dm = distance_matrix(&mol);
        assert_eq!(dm[[0, 2]], DISCONNECTED_DISTANCE);
        assert_eq!(dm[[0, 1]], 1.0);
    }

    #[test]
    fn pair_order_does_not_matter() {
        assert_eq!(pair_shingle("OC", "CC", 2), pair_shingle("CC", "OC", 2));
        assert_eq!(pair_shingle("OC", "CC", 2), "CC|2|OC");
    }

    #[test]
    fn ethane_yields_one_shingle() {
        assert_eq!(shingle_strings("CC", 1, false), vec!["CC|1|CC"]);
        assert_eq!(shingle_strings("CC", 2, false), vec!["CC|1|CC"]);
        assert_eq!(shingle_strings("CC", 1, true), vec!["CC|1|CC|1"]);
    }

    #[test]
    fn duplicates_are_kept_or_counted() {
        let plain = shingle_strings("CCC", 1, false);
        assert_eq!(plain, vec!["C(C)C|1|CC", "CC|2|CC", "C(C)C|1|CC"]);

        let counted = shingle_strings("CCC", 1, true);
        assert_eq!(counted, vec!["C(C)C|1|CC|2", "CC|2|CC|1"]);
    }

    #[test]
    fn pairs_iterate_by_atom_then_radius() {
        let shingles = shingle_strings("CCC", 2, false);
        assert_eq!(
            shingles,
            vec!["C(C)C|1|CC", "CC|2|CC", "CCC|2|CCC", "C(C)C|1|CC"]
        );
    }

    #[test]
    fn single_atoms_and_empty_molecules_have_no_shingles() {
        assert!(shingle_strings("C", 2, false).is_empty());
        assert!(shingle_strings("", 2, true).is_empty());
        assert!(shingle_strings("CC", 0, false).is_empty());
    }

    #[test]
    fn disconnected_pairs_carry_sentinel_distance() {
        let shingles = shingle_strings("CC.CC", 1, true);
        assert_eq!(shingles, vec!["CC|1|CC|2", "CC|100000000|CC|4"]);
    }
}
