use phf::{Map, phf_map};

pub const NITROGEN: &str = "N";
pub const ALPHA_CARBON: &str = "CA";
pub const CARBONYL_CARBON: &str = "C";
pub const CARBONYL_OXYGEN: &str = "O";
pub const AMIDE_HYDROGEN: &str = "H";

/// Placeholder one-letter code for residue names outside the table.
pub const UNKNOWN_RESIDUE_CODE: char = 'X';

static BACKBONE_RANKS: Map<&'static str, u8> = phf_map! {
    "N" => 0,
    "CA" => 1,
    "C" => 2,
    "O" => 3,
};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    // Histidine protonation variants
    "HSE" => 'H', "HSD" => 'H', "HSP" => 'H', "HIE" => 'H', "HID" => 'H', "HIP" => 'H',
    "MSE" => 'M', "SEC" => 'U',
};

/// Position of a backbone atom in the canonical N, CA, C, O order, or `None`
/// for any other atom.
pub fn backbone_rank(atom_name: &str) -> Option<u8> {
    BACKBONE_RANKS.get(atom_name.trim()).copied()
}

/// Translates a three-letter residue name into its one-letter code.
///
/// Lookup is case-insensitive and ignores surrounding whitespace. Names outside
/// the table map to [`UNKNOWN_RESIDUE_CODE`].
pub fn one_letter_code(residue_name: &str) -> char {
    let key = residue_name.trim().to_ascii_uppercase();
    THREE_TO_ONE
        .get(key.as_str())
        .copied()
        .unwrap_or(UNKNOWN_RESIDUE_CODE)
}

pub fn is_known_residue(residue_name: &str) -> bool {
    THREE_TO_ONE.contains_key(residue_name.trim().to_ascii_uppercase().as_str())
}
