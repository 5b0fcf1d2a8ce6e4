// src/model/elements.rs

/// Element symbols indexed by atomic number minus one.
const SYMBOLS: [&str; 103] = [
    // --- Period 1 ---
    "H", "He",
    // --- Period 2 ---
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    // --- Period 3 ---
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    // --- Period 4 ---
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    // --- Period 5 ---
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe",
    // --- Period 6 ---
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy",
    "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt",
    "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    // --- Period 7 (through Lr) ---
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf",
    "Es", "Fm", "Md", "No", "Lr",
];

pub const MAX_ATOMIC_NUMBER: u32 = SYMBOLS.len() as u32;

/// Returns the element symbol for an atomic number, or `None` outside 1..=103.
pub fn symbol(z: u32) -> Option<&'static str> {
    if z == 0 {
        return None;
    }
    SYMBOLS.get(z as usize - 1).copied()
}

/// Returns the atomic number for an element symbol.
///
/// Matching ignores case and surrounding whitespace, and a trailing label
/// such as the `1` in `Fe1` (WIEN2k names inequivalent sites that way).
pub fn atomic_number(label: &str) -> Option<u32> {
    let letters: String = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }

    SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(&letters))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(symbol(1), Some("H"));
        assert_eq!(symbol(26), Some("Fe"));
        assert_eq!(symbol(103), Some("Lr"));
        assert_eq!(symbol(0), None);
        assert_eq!(symbol(104), None);
    }

    #[test]
    fn test_atomic_number_lookup() {
        assert_eq!(atomic_number("Fe"), Some(26));
        assert_eq!(atomic_number("  o "), Some(8));
        assert_eq!(atomic_number("Cr2"), Some(24));
        assert_eq!(atomic_number("Xx"), None);
        assert_eq!(atomic_number("12"), None);
    }

    #[test]
    fn test_table_is_consistent() {
        for z in 1..=MAX_ATOMIC_NUMBER {
            let s = symbol(z).unwrap();
            assert_eq!(atomic_number(s), Some(z), "{}", s);
        }
    }
}
