use super::atom::AtomRecord;
use crate::core::utils::identifiers::backbone_rank;
use nalgebra::Point3;
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error(
        "Residue {residue_number} of chain '{chain_id}' is not contiguous: atom #{atom_index} reappears after another residue"
    )]
    NonContiguousResidue {
        chain_id: char,
        residue_number: isize,
        atom_index: usize,
    },

    #[error(
        "Backbone atom '{atom_name}' of residue {residue_number} breaks the canonical N, CA, C, O order"
    )]
    BackboneOrder {
        residue_number: isize,
        atom_name: String,
    },
}

/// Atom records as delivered by a parser, before any derived data exists.
///
/// This is the `Unbuilt` state of a structure. Nothing residue-related can be
/// queried until [`RawStructure::build`] validates the records and turns them
/// into a [`Structure`]; the raw buffer is consumed by that transition.
#[derive(Debug, Clone, Default)]
pub struct RawStructure {
    records: Vec<AtomRecord>,
}

impl RawStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AtomRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: AtomRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates the records and computes the residue index.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NonContiguousResidue`] if the atoms of one residue
    /// are interleaved with another residue, and [`StructureError::BackboneOrder`]
    /// if N, CA, C and O are not in canonical relative order inside a residue.
    pub fn build(self) -> Result<Structure, StructureError> {
        let residues = index_residues(&self.records)?;
        Ok(Structure {
            atoms: self.records,
            residues,
        })
    }
}

fn index_residues(records: &[AtomRecord]) -> Result<Vec<ResidueSpan>, StructureError> {
    let mut spans: Vec<ResidueSpan> = Vec::new();
    let mut closed: HashSet<(char, isize)> = HashSet::new();
    let mut current: Option<(char, isize)> = None;
    let mut highest_rank: Option<u8> = None;

    for (index, atom) in records.iter().enumerate() {
        let key = atom.residue_key();
        if current != Some(key) {
            if let Some(previous) = current {
                closed.insert(previous);
            }
            if closed.contains(&key) {
                return Err(StructureError::NonContiguousResidue {
                    chain_id: key.0,
                    residue_number: key.1,
                    atom_index: index,
                });
            }
            spans.push(ResidueSpan {
                start: index,
                end: index,
            });
            current = Some(key);
            highest_rank = None;
        }

        if let Some(rank) = backbone_rank(&atom.name) {
            if highest_rank.is_some_and(|highest| rank < highest) {
                return Err(StructureError::BackboneOrder {
                    residue_number: atom.residue_number,
                    atom_name: atom.name.clone(),
                });
            }
            highest_rank = Some(rank);
        }

        if let Some(span) = spans.last_mut() {
            span.end = index + 1;
        }
    }

    Ok(spans)
}

/// Half-open range of atom indices occupied by one residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueSpan {
    pub start: usize,
    pub end: usize,
}

impl ResidueSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A built structural array: one owned atom buffer plus a residue index over it.
///
/// Atoms of a residue are contiguous, so every residue is a [`ResidueSpan`] into
/// the buffer and any run of residues is a single slice. Trimming residues from
/// either end is done through [`ResidueWindow`] without moving atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    atoms: Vec<AtomRecord>,
    residues: Vec<ResidueSpan>,
}

impl Structure {
    /// Builds a structure directly from records; shorthand for
    /// `RawStructure::from_records(atoms).build()`.
    pub fn from_atoms(atoms: Vec<AtomRecord>) -> Result<Self, StructureError> {
        RawStructure::from_records(atoms).build()
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn into_atoms(self) -> Vec<AtomRecord> {
        self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn residue_spans(&self) -> &[ResidueSpan] {
        &self.residues
    }

    /// Returns the atoms of the residue at `index` (position in the array, not
    /// residue number).
    pub fn residue_atoms(&self, index: usize) -> Option<&[AtomRecord]> {
        self.residues
            .get(index)
            .map(|span| &self.atoms[span.range()])
    }

    pub fn residue_number(&self, index: usize) -> Option<isize> {
        self.residue_atoms(index)
            .and_then(|atoms| atoms.first())
            .map(|atom| atom.residue_number)
    }

    pub fn residue_name(&self, index: usize) -> Option<&str> {
        self.residue_atoms(index)
            .and_then(|atoms| atoms.first())
            .map(|atom| atom.residue_name.as_str())
    }

    /// Finds the residue index holding residue number `residue_number`.
    pub fn find_residue(&self, residue_number: isize) -> Option<usize> {
        (0..self.residues.len()).find(|&index| self.residue_number(index) == Some(residue_number))
    }

    /// Finds an atom by name inside the residue at `residue_index`, returning its
    /// position in the atom buffer together with the record.
    pub fn find_atom(&self, residue_index: usize, atom_name: &str) -> Option<(usize, &AtomRecord)> {
        let span = self.residues.get(residue_index)?;
        span.range()
            .map(|index| (index, &self.atoms[index]))
            .find(|(_, atom)| atom.name == atom_name)
    }

    /// A window over every residue of the structure.
    pub fn window(&self) -> ResidueWindow<'_> {
        ResidueWindow {
            structure: self,
            first: 0,
            last: self.residues.len(),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.atoms.iter().map(|atom| &atom.position)
    }

    /// Replaces every coordinate with `f(coordinate)`. Identity fields and the
    /// residue index are untouched.
    pub fn transform_positions<F>(&mut self, mut f: F)
    where
        F: FnMut(&Point3<f64>) -> Point3<f64>,
    {
        for atom in &mut self.atoms {
            atom.position = f(&atom.position);
        }
    }

    /// Moves a single atom. Returns `false` if `atom_index` is out of bounds.
    pub fn set_position(&mut self, atom_index: usize, position: Point3<f64>) -> bool {
        match self.atoms.get_mut(atom_index) {
            Some(atom) => {
                atom.position = position;
                true
            }
            None => false,
        }
    }

    /// Reassigns serials `1..=N` in array order and resets chain and segment
    /// identifiers to a single value.
    pub fn relabel(&mut self, chain_id: char, segment_id: &str) {
        for (index, atom) in self.atoms.iter_mut().enumerate() {
            atom.serial = index as u32 + 1;
            atom.chain_id = chain_id;
            if atom.segment_id != segment_id {
                atom.segment_id = segment_id.to_string();
            }
        }
    }
}

/// A contiguous run of residues of a [`Structure`], trimmed in O(1).
#[derive(Debug, Clone, Copy)]
pub struct ResidueWindow<'a> {
    structure: &'a Structure,
    first: usize,
    last: usize,
}

impl<'a> ResidueWindow<'a> {
    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn residue_count(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Residue indices (into the parent structure) covered by the window.
    pub fn residue_indices(&self) -> Range<usize> {
        self.first..self.last
    }

    /// Drops up to `count` residues from the front.
    pub fn drop_first(self, count: usize) -> Self {
        Self {
            first: (self.first + count).min(self.last),
            ..self
        }
    }

    /// Drops up to `count` residues from the back.
    pub fn drop_last(self, count: usize) -> Self {
        Self {
            last: self.last.saturating_sub(count).max(self.first),
            ..self
        }
    }

    /// Keeps at most the first `count` residues.
    pub fn keep_first(self, count: usize) -> Self {
        Self {
            last: (self.first + count).min(self.last),
            ..self
        }
    }

    pub fn spans(&self) -> &'a [ResidueSpan] {
        &self.structure.residues[self.first..self.last]
    }

    /// All atoms of the window as one slice.
    pub fn atoms(&self) -> &'a [AtomRecord] {
        match (self.spans().first(), self.spans().last()) {
            (Some(first), Some(last)) => &self.structure.atoms[first.start..last.end],
            _ => &[],
        }
    }

    pub fn residues(self) -> impl Iterator<Item = &'a [AtomRecord]> {
        let atoms = &self.structure.atoms;
        self.spans().iter().map(move |span| &atoms[span.range()])
    }

    pub fn first_residue_number(&self) -> Option<isize> {
        self.atoms().first().map(|atom| atom.residue_number)
    }

    pub fn last_residue_number(&self) -> Option<isize> {
        self.atoms().last().map(|atom| atom.residue_number)
    }

    /// Clones the window's atoms, renumbering residues consecutively from
    /// `first_number` while keeping intra-residue atom order.
    pub fn to_renumbered(&self, first_number: isize) -> Vec<AtomRecord> {
        let mut out = Vec::with_capacity(self.atoms().len());
        for (offset, residue) in self.residues().enumerate() {
            let number = first_number + offset as isize;
            out.extend(residue.iter().map(|atom| AtomRecord {
                residue_number: number,
                ..atom.clone()
            }));
        }
        out
    }
}
