//! SMILES reader.
//!
//! Covers the organic subset, bracket atoms, explicit bonds, branches, ring
//! closures (including `%nn`) and `.` disconnections. Stereo markers are
//! accepted and discarded. No valence or aromaticity perception is done:
//! atoms keep exactly the flags the notation gives them.

use std::collections::BTreeMap;

use crate::chem::elements::{self, WILDCARD};
use crate::chem::molecule::{Atom, BondOrder, Molecule};
use crate::core::errors::{MapFpError, Result};

/// Parse a SMILES string into a [`Molecule`]. The empty string is the empty molecule.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    SmilesReader::new(smiles).read()
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
    position: usize,
}

struct SmilesReader<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    branches: Vec<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    rings: BTreeMap<u16, RingOpening>,
}

impl<'a> SmilesReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            branches: Vec::new(),
            pending_bond: None,
            rings: BTreeMap::new(),
        }
    }

    fn error(&self, message: impl Into<String>, position: usize) -> MapFpError {
        MapFpError::smiles_at(message, self.input, position)
    }

    fn read(mut self) -> Result<Molecule> {
        if let Some(offset) = self.bytes.iter().position(|b| !b.is_ascii()) {
            return Err(self.error("non-ASCII character", offset));
        }

        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b'(' => {
                    let prev = self
                        .prev
                        .ok_or_else(|| self.error("branch opened before any atom", self.pos))?;
                    self.reject_pending_bond()?;
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    self.reject_pending_bond()?;
                    let prev = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error("unmatched ')'", self.pos))?;
                    self.prev = Some(prev);
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => {
                    if self.prev.is_none() {
                        return Err(self.error("bond without a preceding atom", self.pos));
                    }
                    if self.pending_bond.is_some() {
                        return Err(self.error("consecutive bond symbols", self.pos));
                    }
                    let order = match c {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b'$' => BondOrder::Quadruple,
                        b':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending_bond = Some((order, self.pos));
                    self.pos += 1;
                }
                b'.' => {
                    self.reject_pending_bond()?;
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => self.ring_bond()?,
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom)?;
                }
                b'*' => {
                    self.pos += 1;
                    self.attach(Atom::new(WILDCARD))?;
                }
                _ if c.is_ascii_alphabetic() => {
                    let atom = self.organic_atom()?;
                    self.attach(atom)?;
                }
                _ => {
                    return Err(self.error(
                        format!("unexpected character '{}'", c as char),
                        self.pos,
                    ))
                }
            }
        }

        if let Some((_, position)) = self.pending_bond {
            return Err(self.error("bond without a following atom", position));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch", self.bytes.len()));
        }
        if let Some((number, opening)) = self.rings.iter().next() {
            return Err(self.error(format!("unclosed ring bond {number}"), opening.position));
        }

        Ok(self.mol)
    }

    fn reject_pending_bond(&self) -> Result<()> {
        match self.pending_bond {
            Some((_, position)) => Err(self.error("bond without a following atom", position)),
            None => Ok(()),
        }
    }

    fn implicit_order(&self, a: usize, b: usize) -> BondOrder {
        let aromatic = |idx: usize| self.mol.atom(idx).map_or(false, |atom| atom.aromatic);
        if aromatic(a) && aromatic(b) {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) -> Result<()> {
        let position = self.pos;
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => self.implicit_order(prev, idx),
            };
            self.mol
                .add_bond(prev, idx, order)
                .map_err(|e| self.error(e.to_string(), position))?;
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_bond(&mut self) -> Result<()> {
        let start = self.pos;
        let current = self
            .prev
            .ok_or_else(|| self.error("ring bond before any atom", start))?;

        let bytes = self.bytes;
        let number = if bytes[start] == b'%' {
            let digits = bytes
                .get(start + 1..start + 3)
                .filter(|d| d.iter().all(u8::is_ascii_digit))
                .ok_or_else(|| self.error("'%' must be followed by two digits", start))?;
            self.pos += 3;
            u16::from(digits[0] - b'0') * 10 + u16::from(digits[1] - b'0')
        } else {
            self.pos += 1;
            u16::from(bytes[start] - b'0')
        };
        let bond = self.pending_bond.take().map(|(order, _)| order);

        match self.rings.remove(&number) {
            Some(opening) => {
                if opening.atom == current {
                    return Err(self.error(format!("ring bond {number} closes on itself"), start));
                }
                let order = match (opening.order, bond) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(self.error(
                            format!("conflicting bond orders on ring bond {number}"),
                            start,
                        ))
                    }
                    (Some(order), _) | (None, Some(order)) => order,
                    (None, None) => self.implicit_order(opening.atom, current),
                };
                self.mol
                    .add_bond(opening.atom, current, order)
                    .map_err(|e| self.error(e.to_string(), start))?;
            }
            None => {
                self.rings.insert(
                    number,
                    RingOpening {
                        atom: current,
                        order: bond,
                        position: start,
                    },
                );
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom> {
        let start = self.pos;
        if let Some(two) = self.input.get(start..start + 2) {
            let halogen = match two {
                "Cl" => Some(17),
                "Br" => Some(35),
                _ => None,
            };
            if let Some(number) = halogen {
                self.pos += 2;
                return Ok(Atom::new(number));
            }
        }

        let atom = match self.bytes[start] {
            b'B' => Atom::new(5),
            b'C' => Atom::new(6),
            b'N' => Atom::new(7),
            b'O' => Atom::new(8),
            b'F' => Atom::new(9),
            b'P' => Atom::new(15),
            b'S' => Atom::new(16),
            b'I' => Atom::new(53),
            b'b' => Atom::aromatic(5),
            b'c' => Atom::aromatic(6),
            b'n' => Atom::aromatic(7),
            b'o' => Atom::aromatic(8),
            b'p' => Atom::aromatic(15),
            b's' => Atom::aromatic(16),
            other => {
                return Err(self.error(
                    format!("'{}' is not an organic-subset atom", other as char),
                    start,
                ))
            }
        };
        self.pos += 1;
        Ok(atom)
    }

    fn bracket_atom(&mut self) -> Result<Atom> {
        let open = self.pos;
        let body_start = open + 1;
        let close = self.input[body_start..]
            .find(']')
            .map(|offset| body_start + offset)
            .ok_or_else(|| self.error("unclosed bracket atom", open))?;
        let bytes = self.bytes;
        let body = &bytes[body_start..close];
        let mut i = 0;

        let isotope = match take_number(body, &mut i) {
            Some(mass) => Some(
                u16::try_from(mass)
                    .map_err(|_| self.error("isotope out of range", body_start))?,
            ),
            None => None,
        };

        let (atomic_number, aromatic) = self.bracket_element(body, &mut i, body_start)?;

        // Stereo markers carry no information for non-isomeric output.
        while body.get(i) == Some(&b'@') {
            i += 1;
        }
        if let Some(class) = body.get(i..i + 2) {
            if matches!(class, b"TH" | b"AL" | b"SP" | b"TB" | b"OH") && i > 0 && body[i - 1] == b'@'
            {
                i += 2;
                take_number(body, &mut i);
            }
        }

        let mut hydrogens = 0u8;
        if body.get(i) == Some(&b'H') {
            i += 1;
            let count = take_number(body, &mut i).unwrap_or(1);
            hydrogens = u8::try_from(count)
                .map_err(|_| self.error("hydrogen count out of range", body_start + i))?;
        }

        let mut formal_charge = 0i8;
        if let Some(&sign) = body.get(i).filter(|c| **c == b'+' || **c == b'-') {
            i += 1;
            let magnitude = match take_number(body, &mut i) {
                Some(n) => n,
                None => {
                    let mut n = 1;
                    while body.get(i) == Some(&sign) {
                        n += 1;
                        i += 1;
                    }
                    n
                }
            };
            let magnitude = i8::try_from(magnitude)
                .map_err(|_| self.error("charge out of range", body_start + i))?;
            formal_charge = if sign == b'+' { magnitude } else { -magnitude };
        }

        if body.get(i) == Some(&b':') {
            i += 1;
            if take_number(body, &mut i).is_none() {
                return Err(self.error("atom class must be numeric", body_start + i));
            }
        }

        if i != body.len() {
            return Err(self.error(
                format!("unexpected '{}' in bracket atom", body[i] as char),
                body_start + i,
            ));
        }

        self.pos = close + 1;
        Ok(Atom {
            atomic_number,
            aromatic,
            formal_charge,
            hydrogens: Some(hydrogens),
            isotope,
            bracket: true,
        })
    }

    fn bracket_element(&self, body: &[u8], i: &mut usize, offset: usize) -> Result<(u8, bool)> {
        let Some(&first) = body.get(*i) else {
            return Err(self.error("bracket atom without element", offset + *i));
        };

        if first == b'*' {
            *i += 1;
            return Ok((WILDCARD, false));
        }

        if first.is_ascii_lowercase() {
            for candidate in ["se", "as", "te", "b", "c", "n", "o", "p", "s"] {
                if body[*i..].starts_with(candidate.as_bytes()) {
                    let mut symbol = candidate.to_string();
                    symbol[..1].make_ascii_uppercase();
                    if let Some(number) = elements::atomic_number(&symbol) {
                        *i += candidate.len();
                        return Ok((number, true));
                    }
                }
            }
            return Err(self.error("unknown aromatic element", offset + *i));
        }

        if first.is_ascii_uppercase() {
            if let Some(&second) = body.get(*i + 1).filter(|c| c.is_ascii_lowercase()) {
                let symbol = format!("{}{}", first as char, second as char);
                if let Some(number) = elements::atomic_number(&symbol) {
                    *i += 2;
                    return Ok((number, false));
                }
            }
            if let Some(number) = elements::atomic_number(&(first as char).to_string()) {
                *i += 1;
                return Ok((number, false));
            }
        }

        Err(self.error("unknown element", offset + *i))
    }
}

/// Consume a run of ASCII digits, returning `None` when there are none.
fn take_number(body: &[u8], i: &mut usize) -> Option<u32> {
    let start = *i;
    let mut value: u32 = 0;
    while let Some(digit) = body.get(*i).filter(|c| c.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(u32::from(digit - b'0'));
        *i += 1;
    }
    (*i > start).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(smiles: &str) -> Molecule {
        parse_smiles(smiles).unwrap_or_else(|e| panic!("failed to parse {smiles}: {e}"))
    }

    fn error_position(smiles: &str) -> Option<usize> {
        match parse_smiles(smiles) {
            Err(MapFpError::Parse { position, .. }) => position,
            other => panic!("expected parse error for {smiles}, got {other:?}"),
        }
    }

    #[test]
    fn empty_string_is_empty_molecule() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn chains_and_branches() {
        let mol = parse("CC(C)(C)O");
        assert_eq!(mol.atom_count(), 5);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.degree(1), 4);
        assert_eq!(mol.neighbors(1), vec![0, 2, 3, 4]);
    }

    #[test]
    fn explicit_bond_orders() {
        let mol = parse("C=CC#N");
        assert_eq!(mol.bond(0).map(|b| b.2), Some(BondOrder::Double));
        assert_eq!(mol.bond(1).map(|b| b.2), Some(BondOrder::Single));
        assert_eq!(mol.bond(2).map(|b| b.2), Some(BondOrder::Triple));
    }

    #[test]
    fn aromatic_rings_get_aromatic_bonds() {
        let mol = parse("c1ccccc1O");
        assert_eq!(mol.atom_count(), 7);
        assert_eq!(mol.bond_count(), 7);
        assert_eq!(mol.bond_between(0, 5), Some(BondOrder::Aromatic));
        assert_eq!(mol.bond_between(5, 6), Some(BondOrder::Single));
        assert!(mol.atom(0).unwrap().aromatic);
    }

    #[test]
    fn ring_closure_bond_order_from_either_end() {
        let opening = parse("C=1CCCCC1");
        assert_eq!(opening.bond_between(0, 5), Some(BondOrder::Double));
        let closing = parse("C1CCCCC=1");
        assert_eq!(closing.bond_between(0, 5), Some(BondOrder::Double));
        assert!(parse_smiles("C=1CCCCC#1").is_err());
    }

    #[test]
    fn percent_ring_numbers() {
        let mol = parse("C%10CCC%10");
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.bond_between(0, 3), Some(BondOrder::Single));
    }

    #[test]
    fn ring_numbers_can_be_reused() {
        let mol = parse("C1CC1C1CC1");
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 7);
    }

    #[test]
    fn bracket_atoms() {
        let mol = parse("[13CH3][NH3+].[O-]C(=O)[C@@H](N)C.[Na+]");
        let carbon = mol.atom(0).unwrap();
        assert_eq!(carbon.isotope, Some(13));
        assert_eq!(carbon.hydrogens, Some(3));
        let nitrogen = mol.atom(1).unwrap();
        assert_eq!(nitrogen.formal_charge, 1);
        assert_eq!(nitrogen.hydrogens, Some(3));
        let oxygen = mol.atom(2).unwrap();
        assert_eq!(oxygen.formal_charge, -1);
        let sodium = mol.atom(mol.atom_count() - 1).unwrap();
        assert_eq!(sodium.atomic_number, 11);
        assert_eq!(sodium.formal_charge, 1);
    }

    #[test]
    fn bracket_element_disambiguation() {
        let mol = parse("[Hg].[H+].[se]1cccc1.[nH]1cccc1.[Fe+++].[Cu-2]");
        assert_eq!(mol.atom(0).unwrap().atomic_number, 80);
        assert_eq!(mol.atom(1).unwrap().atomic_number, 1);
        let selenium = mol.atom(2).unwrap();
        assert_eq!((selenium.atomic_number, selenium.aromatic), (34, true));
        let pyrrole_n = mol.atom(7).unwrap();
        assert_eq!((pyrrole_n.atomic_number, pyrrole_n.hydrogens), (7, Some(1)));
        assert_eq!(mol.atom(12).unwrap().formal_charge, 3);
        assert_eq!(mol.atom(13).unwrap().formal_charge, -2);
    }

    #[test]
    fn stereo_markers_are_discarded() {
        let plain = parse("FC=CF");
        let stereo = parse("F/C=C\\F");
        assert_eq!(plain.bond_count(), stereo.bond_count());
        let chiral = parse("N[C@@H](C)C(=O)O");
        assert_eq!(chiral.atom_count(), 6);
        assert!(parse_smiles("C[C@TH1H](F)Cl").is_ok());
    }

    #[test]
    fn halogens_and_wildcards() {
        let mol = parse("ClC(Br)*");
        assert_eq!(mol.atom(0).unwrap().atomic_number, 17);
        assert_eq!(mol.atom(2).unwrap().atomic_number, 35);
        assert_eq!(mol.atom(3).unwrap().atomic_number, WILDCARD);
    }

    #[test]
    fn malformed_input_reports_position() {
        assert_eq!(error_position("C1CC"), Some(1));
        assert_eq!(error_position("CC)"), Some(2));
        assert_eq!(error_position("CC(C"), Some(4));
        assert_eq!(error_position("C="), Some(1));
        assert_eq!(error_position("=C"), Some(0));
        assert_eq!(error_position("C[Xy]"), Some(2));
        assert_eq!(error_position("C[CH4"), Some(1));
        assert_eq!(error_position("CX"), Some(1));
        assert_eq!(error_position("C11"), Some(2));
        assert_eq!(error_position("C(=)C"), Some(2));
    }
}
