use std::fs;
use std::path::PathBuf;

use wien2k_struct::io::{load_structure, poscar, save_structure};
use wien2k_struct::model::symmetry::SymmetryOperation;
use wien2k_struct::model::{CalcMode, CellParameters};
use wien2k_struct::{
    Atom, AtomTweak, CellTweak, Config, LatticeType, OrbitOptions, RecordFormat, StructureError,
    StructureFile, Value,
};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("w2kstruct-it-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir.join(name)
}

/// Rutile-like TiO2: two groups, one of them with two members.
fn rutile() -> StructureFile {
    let cell = CellParameters::new(8.68, 8.68, 5.59, 90.0, 90.0, 90.0).unwrap();
    let unique = vec![
        Atom::new([0.0, 0.0, 0.0], 22).unwrap(),
        Atom::new([0.3, 0.3, 0.0], 8).unwrap(),
    ];
    let ops = vec![SymmetryOperation::identity(), SymmetryOperation::inversion()];
    StructureFile::with_symmetry(
        "TiO2 rutile",
        LatticeType::P,
        cell,
        &unique,
        ops,
        OrbitOptions::default(),
    )
}

#[test]
fn test_position_line_matches_fixed_width_layout() {
    let format = RecordFormat::compile("4X,I4,4X,F10.8,3X,F10.8,3X,F10.8").unwrap();
    let line = format
        .encode(&[Value::Int(1), Value::Float(0.0), Value::Float(0.0), Value::Float(0.5)])
        .unwrap();
    assert_eq!(line, "       1    0.00000000   0.00000000   0.50000000\n");
}

#[test]
fn test_symmetric_structure_expansion() {
    let s = rutile();
    // Ti at the origin is its own image, O at (0.3,0.3,0) gains (0.7,0.7,0)
    assert_eq!(s.atoms().len(), 3);
    assert_eq!(s.non_equivalent_count(), 2);
    assert_eq!(s.atoms()[2].position(), [0.7, 0.7, 0.0]);
    assert_eq!(s.equivalent_atoms(), &[0, 1, 1]);
    assert!(s.writes_symmetry());
}

#[test]
fn test_document_round_trip() {
    let s = rutile();
    let text = s.encode().unwrap();

    // O group: MULT 2, ISPLIT 8
    assert!(text.contains("\n                2                  8\n"));
    assert!(text.contains("\n   2\n 1 0 0 0.0000000\n"));

    let decoded = StructureFile::decode(&text).unwrap();
    assert_eq!(decoded.title(), "TiO2 rutile");
    assert_eq!(decoded.cell(), s.cell());
    assert_eq!(decoded.atoms(), s.atoms());
    assert_eq!(decoded.groups(), s.groups());
    assert_eq!(decoded.operations().len(), 2);
    assert_eq!(decoded.encode().unwrap(), text);
}

#[test]
fn test_rejected_tweaks_leave_structure_untouched() {
    let mut s = rutile();
    let before = s.clone();

    assert_eq!(
        s.tweak_lattice_type("X"),
        Err(StructureError::InvalidLatticeType("X".into()))
    );
    assert_eq!(
        s.tweak_atom(
            1,
            AtomTweak {
                x: Some(0.25),
                npt: Some(500),
                ..Default::default()
            }
        ),
        Err(StructureError::InvalidMeshSize(500))
    );
    assert_eq!(
        s.tweak_atom(
            0,
            AtomTweak {
                isplit: Some(9),
                ..Default::default()
            }
        ),
        Err(StructureError::InvalidSplitCode(9))
    );
    assert_eq!(
        s.tweak_atom(3, AtomTweak::default()),
        Err(StructureError::IndexOutOfRange { index: 3, len: 3 })
    );
    assert!(s
        .tweak_dimensions(CellTweak {
            a: Some(9.0),
            gamma: Some(180.0),
            ..Default::default()
        })
        .is_err());

    assert_eq!(s, before);
    assert!(s.tweak_log().is_empty());
}

#[test]
fn test_group_wide_tweak_is_logged_once() {
    let mut s = rutile();
    s.tweak_atom(
        2,
        AtomTweak {
            rmt: Some(1.6),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(s.atoms()[1].rmt(), 1.6);
    assert_eq!(s.atoms()[2].rmt(), 1.6);
    assert_eq!(s.atoms()[0].rmt(), 2.4);
    assert_eq!(s.tweak_log(), &["Atom 2: RMT : 2.4 -> 1.6".to_string()]);
    // radii keep the symmetry
    assert!(s.writes_symmetry());
}

#[test]
fn test_struct_file_on_disk() {
    let path = scratch("rutile.struct");
    let mut s = rutile();
    s.tweak_calc_mode("nrel");
    save_structure(&path, &s).unwrap();

    let loaded = load_structure(&path, &Config::default()).unwrap();
    assert_eq!(loaded.calc_mode(), CalcMode::Nrel);
    assert_eq!(loaded.atoms(), s.atoms());
    let _ = fs::remove_file(path);
}

#[test]
fn test_poscar_export_and_import() {
    let path = scratch("POSCAR");
    let s = rutile();
    save_structure(&path, &s).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "TiO2 rutile");
    assert_eq!(lines[1], poscar::BOHR_TO_ANG.to_string());
    // O (Z=8) sorts before Ti (Z=22)
    assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), vec!["O", "Ti"]);
    assert_eq!(lines[6].split_whitespace().collect::<Vec<_>>(), vec!["2", "1"]);
    assert_eq!(lines[7], "Direct");

    let mut config = Config::default();
    config.calc_mode = CalcMode::Nrel;
    let loaded = load_structure(&path, &config).unwrap();
    assert_eq!(loaded.title(), "TiO2 rutile");
    assert_eq!(loaded.lattice_type(), LatticeType::P);
    assert_eq!(loaded.calc_mode(), CalcMode::Nrel);
    assert_eq!(loaded.atoms().len(), 3);
    assert_eq!(loaded.atoms()[0].symbol(), "O");
    assert_eq!(loaded.atoms()[2].symbol(), "Ti");
    assert!((loaded.cell().a - 8.68).abs() < 1e-6);
    assert!((loaded.cell().c - 5.59).abs() < 1e-6);
    assert!((loaded.atoms()[1].position()[0] - 0.7).abs() < 1e-8);
    let _ = fs::remove_file(path);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = load_structure(&scratch("missing.struct"), &Config::default()).unwrap_err();
    assert!(matches!(err, wien2k_struct::FileError::Io(_)));
}
