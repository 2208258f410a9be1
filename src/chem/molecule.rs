//! Molecular graph representation.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::chem::elements;
use crate::chem::smiles::parse_smiles;
use crate::core::errors::{MapFpError, Result};

/// An atom in a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Atomic number, 0 for the wildcard atom
    pub atomic_number: u8,
    /// Aromatic flag (lowercase symbol in SMILES)
    pub aromatic: bool,
    /// Formal charge
    pub formal_charge: i8,
    /// Hydrogen count stated inside brackets; `None` for organic-subset atoms
    pub hydrogens: Option<u8>,
    /// Isotope mass number; parsed but never written
    pub isotope: Option<u16>,
    /// Whether the atom must be written in bracket form
    pub bracket: bool,
}

impl Atom {
    /// Plain aliphatic organic-subset atom
    pub fn new(atomic_number: u8) -> Self {
        Self {
            atomic_number,
            aromatic: false,
            formal_charge: 0,
            hydrogens: None,
            isotope: None,
            bracket: false,
        }
    }

    /// Plain aromatic organic-subset atom
    pub fn aromatic(atomic_number: u8) -> Self {
        Self {
            aromatic: true,
            ..Self::new(atomic_number)
        }
    }

    /// Mark the atom as bracketed with an explicit hydrogen count
    pub fn bracketed(mut self, hydrogens: u8) -> Self {
        self.bracket = true;
        self.hydrogens = Some(hydrogens);
        self
    }

    /// Set the formal charge
    pub fn with_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    /// Set the isotope
    pub fn with_isotope(mut self, isotope: u16) -> Self {
        self.isotope = Some(isotope);
        self
    }

    /// Element symbol as written in SMILES (lowercase when aromatic)
    pub fn symbol(&self) -> String {
        let symbol = elements::symbol(self.atomic_number);
        if self.aromatic {
            symbol.to_ascii_lowercase()
        } else {
            symbol.to_string()
        }
    }

    /// Whether the atom can only be written in bracket form
    pub fn needs_brackets(&self) -> bool {
        self.bracket
            || self.formal_charge != 0
            || (self.atomic_number != elements::WILDCARD
                && !elements::is_organic_subset(self.atomic_number))
            || (self.aromatic && !elements::can_be_aromatic(self.atomic_number))
    }
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    /// Single bond
    Single,
    /// Double bond
    Double,
    /// Triple bond
    Triple,
    /// Quadruple bond
    Quadruple,
    /// Aromatic bond
    Aromatic,
}

impl BondOrder {
    /// SMILES bond symbol, written explicitly
    pub fn symbol(self) -> &'static str {
        match self {
            BondOrder::Single => "-",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Quadruple => "$",
            BondOrder::Aromatic => ":",
        }
    }
}

/// A molecular graph. Atom and bond indices follow insertion order.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: UnGraph<Atom, BondOrder>,
}

impl Molecule {
    /// Create an empty molecule
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a molecule from SMILES
    pub fn from_smiles(smiles: &str) -> Result<Self> {
        parse_smiles(smiles)
    }

    /// Add an atom, returning its index
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.graph.add_node(atom).index()
    }

    /// Add a bond between two existing atoms, returning its index
    pub fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) -> Result<usize> {
        let n = self.atom_count();
        if a >= n || b >= n {
            return Err(MapFpError::graph_element(
                format!("bond references atom outside 0..{n}"),
                format!("{a}-{b}"),
            ));
        }
        if a == b {
            return Err(MapFpError::graph_element(
                "atom cannot bond to itself",
                a.to_string(),
            ));
        }
        let (na, nb) = (NodeIndex::new(a), NodeIndex::new(b));
        if self.graph.find_edge(na, nb).is_some() {
            return Err(MapFpError::graph_element(
                "atoms are already bonded",
                format!("{a}-{b}"),
            ));
        }
        Ok(self.graph.add_edge(na, nb, order).index())
    }

    /// Number of atoms
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of bonds
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when the molecule has no atoms
    pub fn is_empty(&self) -> bool {
        self.atom_count() == 0
    }

    /// Atom at an index
    pub fn atom(&self, idx: usize) -> Option<&Atom> {
        self.graph.node_weight(NodeIndex::new(idx))
    }

    /// Iterate atoms in index order
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_weights()
    }

    /// Endpoints and order of a bond
    pub fn bond(&self, idx: usize) -> Option<(usize, usize, BondOrder)> {
        let edge = EdgeIndex::new(idx);
        let (a, b) = self.graph.edge_endpoints(edge)?;
        let order = *self.graph.edge_weight(edge)?;
        Some((a.index(), b.index(), order))
    }

    /// Order of the bond joining two atoms, if any
    pub fn bond_between(&self, a: usize, b: usize) -> Option<BondOrder> {
        if a >= self.atom_count() || b >= self.atom_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|e| self.graph.edge_weight(e).copied())
    }

    /// `(bond index, neighbor atom index)` pairs for an atom, ordered by bond index
    pub fn atom_bonds(&self, atom: usize) -> Vec<(usize, usize)> {
        if atom >= self.atom_count() {
            return Vec::new();
        }
        let node = NodeIndex::new(atom);
        let mut bonds: Vec<(usize, usize)> = self
            .graph
            .edges(node)
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                (edge.id().index(), other.index())
            })
            .collect();
        bonds.sort_unstable();
        bonds
    }

    /// Neighbor atom indices, ordered by bond index
    pub fn neighbors(&self, atom: usize) -> Vec<usize> {
        self.atom_bonds(atom).into_iter().map(|(_, n)| n).collect()
    }

    /// Number of explicit bonds on an atom
    pub fn degree(&self, atom: usize) -> usize {
        self.atom_bonds(atom).len()
    }

    /// Underlying graph
    pub fn graph(&self) -> &UnGraph<Atom, BondOrder> {
        &self.graph
    }
}

/// One element of a batch handed to a fingerprint transformer.
#[derive(Debug, Clone)]
pub enum MoleculeInput {
    /// Already-built molecular graph
    Mol(Molecule),
    /// SMILES string to be parsed
    Smiles(String),
}

impl From<Molecule> for MoleculeInput {
    fn from(mol: Molecule) -> Self {
        Self::Mol(mol)
    }
}

impl From<String> for MoleculeInput {
    fn from(smiles: String) -> Self {
        Self::Smiles(smiles)
    }
}

impl From<&str> for MoleculeInput {
    fn from(smiles: &str) -> Self {
        Self::Smiles(smiles.to_string())
    }
}

/// Turn a batch of inputs into molecules, parsing SMILES where needed.
///
/// The first element that cannot be turned into a molecule fails the whole
/// batch with a validation error naming its index.
pub fn ensure_mols(inputs: Vec<MoleculeInput>) -> Result<Vec<Molecule>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(idx, input)| match input {
            MoleculeInput::Mol(mol) => Ok(mol),
            MoleculeInput::Smiles(smiles) => parse_smiles(&smiles).map_err(|e| {
                MapFpError::invalid_input(idx, format!("'{smiles}' is not a valid SMILES: {e}"))
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> Molecule {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(6));
        let c2 = mol.add_atom(Atom::new(6));
        let o = mol.add_atom(Atom::new(8));
        mol.add_bond(c1, c2, BondOrder::Single).unwrap();
        mol.add_bond(c2, o, BondOrder::Single).unwrap();
        mol
    }

    #[test]
    fn construction_and_adjacency() {
        let mol = ethanol();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.neighbors(1), vec![0, 2]);
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.bond(1), Some((1, 2, BondOrder::Single)));
        assert_eq!(mol.bond_between(2, 1), Some(BondOrder::Single));
        assert_eq!(mol.bond_between(0, 2), None);
    }

    #[test]
    fn atom_bonds_report_far_atom_from_either_end() {
        let mol = ethanol();
        assert_eq!(mol.atom_bonds(1), vec![(0, 0), (1, 2)]);
        assert_eq!(mol.atom_bonds(2), vec![(1, 1)]);
        assert!(mol.atom_bonds(9).is_empty());
    }

    #[test]
    fn invalid_bonds_are_rejected() {
        let mut mol = ethanol();
        assert!(matches!(
            mol.add_bond(0, 0, BondOrder::Single),
            Err(MapFpError::Graph { .. })
        ));
        assert!(mol.add_bond(0, 1, BondOrder::Double).is_err());
        assert!(mol.add_bond(0, 7, BondOrder::Single).is_err());
    }

    #[test]
    fn bracket_requirements() {
        assert!(!Atom::new(6).needs_brackets());
        assert!(Atom::new(6).with_charge(-1).needs_brackets());
        assert!(Atom::new(11).needs_brackets());
        assert!(Atom::aromatic(34).needs_brackets());
        assert!(!Atom::aromatic(7).needs_brackets());
        assert_eq!(Atom::aromatic(6).symbol(), "c");
        assert_eq!(Atom::new(17).symbol(), "Cl");
    }

    #[test]
    fn ensure_mols_parses_and_reports_index() {
        let mols = ensure_mols(vec![ethanol().into(), "CCO".into()]).unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[1].atom_count(), 3);

        let err = ensure_mols(vec!["CC".into(), "C1CC".into()]).unwrap_err();
        match err {
            MapFpError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("inputs[1]"))
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
