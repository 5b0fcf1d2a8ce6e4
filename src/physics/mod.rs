pub mod analysis;
pub mod orbit;
pub mod supercell;
