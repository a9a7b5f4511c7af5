use nalgebra::Point3;

/// Number of decimal places kept on coordinates written back into a structural array.
pub const COORDINATE_DECIMALS: i32 = 3;

/// One row of a structural array.
///
/// Mirrors the fixed atom-record schema handed over by the structure parser:
/// identity fields, residue membership and Cartesian coordinates in Angstroms.
/// Serial numbers are informational only; the graft assembler reassigns them.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Atom serial number (1-based, reassigned on output).
    pub serial: u32,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// Element symbol used for van der Waals radius lookups (e.g., "C").
    pub element: String,
    /// Three-letter residue name (e.g., "ALA").
    pub residue_name: String,
    /// Residue sequence number from the source file.
    pub residue_number: isize,
    /// Chain identifier.
    pub chain_id: char,
    /// Segment identifier.
    pub segment_id: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl AtomRecord {
    /// Creates a new `AtomRecord` on chain `'A'` with an empty segment and serial 0.
    ///
    /// # Arguments
    ///
    /// * `name` - The atom name.
    /// * `element` - The element symbol.
    /// * `residue_name` - The three-letter residue name.
    /// * `residue_number` - The residue sequence number.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(
        name: &str,
        element: &str,
        residue_name: &str,
        residue_number: isize,
        position: Point3<f64>,
    ) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            element: element.to_string(),
            residue_name: residue_name.to_string(),
            residue_number,
            chain_id: 'A',
            segment_id: String::new(),
            position,
        }
    }

    /// Returns the same record on another chain.
    pub fn with_chain(mut self, chain_id: char) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Returns the same record with another segment identifier.
    pub fn with_segment(mut self, segment_id: &str) -> Self {
        self.segment_id = segment_id.to_string();
        self
    }

    /// Returns the same record with another serial number.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    /// Key identifying the residue this atom belongs to.
    pub(crate) fn residue_key(&self) -> (char, isize) {
        (self.chain_id, self.residue_number)
    }
}

/// Rounds a coordinate to the fixed precision of structural arrays.
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    (value * scale).round() / scale
}

/// Rounds every component of a point to the fixed precision of structural arrays.
pub fn round_position(position: &Point3<f64>) -> Point3<f64> {
    position.map(round_coordinate)
}
