//! Canonical atom ranking and SMILES writing.
//!
//! Ranks come from iterative refinement of atom invariants by neighbor
//! classes. When refinement stalls with tied classes, the lowest-index atom
//! of the smallest tied class is promoted and refinement resumes, so every
//! atom ends with a distinct rank. Atoms tied by symmetry produce the same
//! string whichever of them is promoted.
//!
//! The writer is a two-pass depth-first traversal: the first pass finds the
//! ring-closure bonds, the second emits atoms, branches and ring digits with
//! neighbors visited in rank order.

use std::collections::{BTreeSet, HashMap};

use crate::chem::molecule::{BondOrder, Molecule};

/// Canonical rank of every atom, a permutation of `0..atom_count`.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let adjacency = bonded_neighbors(mol);
    let invariants: Vec<_> = mol
        .atoms()
        .zip(&adjacency)
        .map(|(atom, neighbors)| {
            (
                atom.atomic_number,
                atom.aromatic,
                neighbors.len(),
                atom.formal_charge,
                atom.hydrogens.unwrap_or(0),
                atom.bracket,
            )
        })
        .collect();

    let mut ranks = refine(dense_ranks(&invariants), &adjacency);
    while let Some(tied) = smallest_tied_class(&ranks) {
        let promoted = ranks.iter().position(|&rank| rank == tied);
        let keys: Vec<(usize, bool)> = ranks
            .iter()
            .enumerate()
            .map(|(idx, &rank)| (rank, Some(idx) != promoted))
            .collect();
        ranks = refine(dense_ranks(&keys), &adjacency);
    }
    ranks
}

/// Canonical SMILES of a whole molecule; components are joined by `.`.
pub fn canonical_smiles(mol: &Molecule) -> String {
    SmilesWriter::new(mol).write(None)
}

/// Canonical SMILES starting from `root`, or `None` when `root` is not an atom
/// of the molecule. The component holding `root` is written first.
pub fn rooted_smiles(mol: &Molecule, root: usize) -> Option<String> {
    (root < mol.atom_count()).then(|| SmilesWriter::new(mol).write(Some(root)))
}

fn bonded_neighbors(mol: &Molecule) -> Vec<Vec<(usize, BondOrder)>> {
    (0..mol.atom_count())
        .map(|atom| {
            mol.atom_bonds(atom)
                .into_iter()
                .filter_map(|(bond, other)| mol.bond(bond).map(|(_, _, order)| (other, order)))
                .collect()
        })
        .collect()
}

fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && keys[idx] != keys[order[pos - 1]] {
            rank += 1;
        }
        ranks[idx] = rank;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&max| max + 1)
}

fn refine(mut ranks: Vec<usize>, adjacency: &[Vec<(usize, BondOrder)>]) -> Vec<usize> {
    loop {
        let classes = class_count(&ranks);
        let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = adjacency
            .iter()
            .enumerate()
            .map(|(idx, neighbors)| {
                let mut signature: Vec<(usize, BondOrder)> = neighbors
                    .iter()
                    .map(|&(other, order)| (ranks[other], order))
                    .collect();
                signature.sort_unstable();
                (ranks[idx], signature)
            })
            .collect();
        let next = dense_ranks(&keys);
        if class_count(&next) == classes {
            return next;
        }
        ranks = next;
    }
}

fn smallest_tied_class(ranks: &[usize]) -> Option<usize> {
    let mut sizes = vec![0usize; class_count(ranks)];
    for &rank in ranks {
        sizes[rank] += 1;
    }
    sizes.iter().position(|&size| size > 1)
}

struct SmilesWriter<'a> {
    mol: &'a Molecule,
    ranks: Vec<usize>,
    neighbors: Vec<Vec<usize>>,
    discovered: Vec<bool>,
    on_path: Vec<bool>,
    emitted: Vec<bool>,
    ring_openings: HashMap<usize, Vec<usize>>,
    ring_closings: HashMap<usize, Vec<(usize, u32)>>,
    digits: BTreeSet<u32>,
}

impl<'a> SmilesWriter<'a> {
    fn new(mol: &'a Molecule) -> Self {
        let n = mol.atom_count();
        let ranks = canonical_ranks(mol);
        let neighbors = (0..n)
            .map(|atom| {
                let mut nbs = mol.neighbors(atom);
                nbs.sort_by_key(|&nb| ranks[nb]);
                nbs
            })
            .collect();
        Self {
            mol,
            ranks,
            neighbors,
            discovered: vec![false; n],
            on_path: vec![false; n],
            emitted: vec![false; n],
            ring_openings: HashMap::new(),
            ring_closings: HashMap::new(),
            digits: BTreeSet::new(),
        }
    }

    fn write(mut self, root: Option<usize>) -> String {
        let mut starts: Vec<usize> = (0..self.mol.atom_count()).collect();
        starts.sort_by_key(|&atom| self.ranks[atom]);
        if let Some(root) = root {
            starts.retain(|&atom| atom != root);
            starts.insert(0, root);
        }

        let mut components = Vec::new();
        for start in starts {
            if self.emitted[start] {
                continue;
            }
            self.discover_rings(start, None);
            let mut out = String::new();
            self.emit(start, None, &mut out);
            components.push(out);
        }
        components.join(".")
    }

    fn discover_rings(&mut self, atom: usize, parent: Option<usize>) {
        self.discovered[atom] = true;
        self.on_path[atom] = true;

        for nb in self.neighbors[atom].clone() {
            if Some(nb) == parent {
                continue;
            }
            if self.on_path[nb] {
                self.ring_openings.entry(nb).or_default().push(atom);
            } else if !self.discovered[nb] {
                self.discover_rings(nb, Some(atom));
            }
        }

        self.on_path[atom] = false;
    }

    fn emit(&mut self, atom: usize, parent: Option<usize>, out: &mut String) {
        self.emitted[atom] = true;
        if let Some(parent) = parent {
            out.push_str(self.bond_symbol(parent, atom));
        }
        out.push_str(&self.atom_token(atom));

        if let Some(mut closings) = self.ring_closings.remove(&atom) {
            closings.sort_by_key(|&(_, digit)| digit);
            for (opening, digit) in closings {
                out.push_str(self.bond_symbol(atom, opening));
                push_ring_digit(out, digit);
                self.digits.remove(&digit);
            }
        }

        if let Some(openings) = self.ring_openings.remove(&atom) {
            for closing in openings {
                let digit = (1..).find(|d| !self.digits.contains(d)).unwrap_or(1);
                self.digits.insert(digit);
                push_ring_digit(out, digit);
                self.ring_closings
                    .entry(closing)
                    .or_default()
                    .push((atom, digit));
            }
        }

        let mut branches = Vec::new();
        for nb in self.neighbors[atom].clone() {
            if Some(nb) == parent || self.emitted[nb] {
                continue;
            }
            let mut branch = String::new();
            self.emit(nb, Some(atom), &mut branch);
            branches.push(branch);
        }

        if let Some(last) = branches.pop() {
            for branch in branches {
                out.push('(');
                out.push_str(&branch);
                out.push(')');
            }
            out.push_str(&last);
        }
    }

    fn bond_symbol(&self, a: usize, b: usize) -> &'static str {
        let both_aromatic = [a, b]
            .iter()
            .all(|&idx| self.mol.atom(idx).map_or(false, |atom| atom.aromatic));
        match self.mol.bond_between(a, b) {
            Some(BondOrder::Single) if both_aromatic => "-",
            Some(BondOrder::Aromatic) if !both_aromatic => ":",
            Some(BondOrder::Single) | Some(BondOrder::Aromatic) | None => "",
            Some(order) => order.symbol(),
        }
    }

    fn atom_token(&self, idx: usize) -> String {
        let Some(atom) = self.mol.atom(idx) else {
            return String::new();
        };
        if !atom.needs_brackets() {
            return atom.symbol();
        }

        let mut token = format!("[{}", atom.symbol());
        match atom.hydrogens.unwrap_or(0) {
            0 => {}
            1 => token.push('H'),
            h => token.push_str(&format!("H{h}")),
        }
        match atom.formal_charge {
            0 => {}
            1 => token.push('+'),
            -1 => token.push('-'),
            q if q > 0 => token.push_str(&format!("+{q}")),
            q => token.push_str(&format!("-{}", q.unsigned_abs())),
        }
        token.push(']');
        token
    }
}

fn push_ring_digit(out: &mut String, digit: u32) {
    if digit > 9 {
        out.push('%');
    }
    out.push_str(&digit.to_string());
}
