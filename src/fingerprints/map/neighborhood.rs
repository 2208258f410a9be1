//! Radius-bounded atom neighborhoods.
//!
//! The environment of an atom at radius `r` is collected bond by bond: the
//! first layer is every bond of the atom, and each further layer is the set of
//! not-yet-taken bonds of the atoms reached by the previous layer. When the
//! frontier runs dry before `r` layers, the atom has no environment at that
//! radius.

use indexmap::IndexMap;

use crate::chem::canonical::rooted_smiles;
use crate::chem::molecule::Molecule;

/// Canonical neighborhood strings for every atom at radii `1..=max_radius`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodTable {
    max_radius: usize,
    entries: Vec<Vec<Option<String>>>,
}

impl NeighborhoodTable {
    /// Largest radius held by the table
    pub fn max_radius(&self) -> usize {
        self.max_radius
    }

    /// Number of atoms covered
    pub fn atom_count(&self) -> usize {
        self.entries.len()
    }

    /// Neighborhood of `atom` at `radius`, `None` when it does not exist
    pub fn get(&self, atom: usize, radius: usize) -> Option<&str> {
        if radius == 0 {
            return None;
        }
        self.entries
            .get(atom)?
            .get(radius - 1)?
            .as_deref()
    }

    /// Number of `(atom, radius)` slots holding a neighborhood
    pub fn present_count(&self) -> usize {
        self.entries
            .iter()
            .flatten()
            .filter(|entry| entry.is_some())
            .count()
    }
}

/// Bond indices of the radius-`radius` environment of `root`, in discovery
/// order. Empty when the environment does not exist.
pub fn atom_environment(mol: &Molecule, root: usize, radius: usize) -> Vec<usize> {
    let mut taken = vec![false; mol.bond_count()];
    let mut environment = Vec::new();
    let mut frontier: Vec<(usize, usize)> = mol
        .atom_bonds(root)
        .into_iter()
        .map(|(bond, _)| (root, bond))
        .collect();

    let mut layer = 0;
    while layer < radius {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for (from, bond) in frontier {
            if taken[bond] {
                continue;
            }
            taken[bond] = true;
            environment.push(bond);

            if layer + 1 < radius {
                let Some((a, b, _)) = mol.bond(bond) else {
                    continue;
                };
                let far = if a == from { b } else { a };
                next.extend(
                    mol.atom_bonds(far)
                        .into_iter()
                        .filter(|&(next_bond, _)| !taken[next_bond])
                        .map(|(next_bond, _)| (far, next_bond)),
                );
            }
        }
        frontier = next;
        layer += 1;
    }

    if layer != radius {
        environment.clear();
    }
    environment
}

/// Sub-molecule spanned by a set of bonds, plus the map from original atom
/// index to sub-molecule index. Atoms are numbered by first appearance.
pub fn environment_submol(mol: &Molecule, bonds: &[usize]) -> (Molecule, IndexMap<usize, usize>) {
    let mut submol = Molecule::new();
    let mut atom_map: IndexMap<usize, usize> = IndexMap::new();

    for &bond in bonds {
        let Some((a, b, order)) = mol.bond(bond) else {
            continue;
        };
        let mut local = [0usize; 2];
        for (slot, atom) in local.iter_mut().zip([a, b]) {
            *slot = match atom_map.get(&atom) {
                Some(&idx) => idx,
                None => {
                    let Some(source) = mol.atom(atom) else {
                        continue;
                    };
                    let idx = submol.add_atom(source.clone());
                    atom_map.insert(atom, idx);
                    idx
                }
            };
        }
        // Bonds come from a valid molecule and are unique within `bonds`.
        let _ = submol.add_bond(local[0], local[1], order);
    }

    (submol, atom_map)
}

/// Canonical SMILES of the radius-`radius` neighborhood rooted at `root`.
pub fn neighborhood_smiles(mol: &Molecule, root: usize, radius: usize) -> Option<String> {
    let bonds = atom_environment(mol, root, radius);
    let (submol, atom_map) = environment_submol(mol, &bonds);
    let local_root = *atom_map.get(&root)?;
    rooted_smiles(&submol, local_root)
}

/// Neighborhood strings for every atom of `mol` at radii `1..=max_radius`.
pub fn neighborhoods(mol: &Molecule, max_radius: usize) -> NeighborhoodTable {
    let entries = (0..mol.atom_count())
        .map(|atom| {
            (1..=max_radius)
                .map(|radius| neighborhood_smiles(mol, atom, radius))
                .collect()
        })
        .collect();

    NeighborhoodTable {
        max_radius,
        entries,
    }
}
