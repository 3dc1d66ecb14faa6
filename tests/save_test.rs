use basic::mach::Listing;
use std::io::Write;

#[test]
fn test_save_and_reload_round_trip() {
    let mut listing = Listing::default();
    listing
        .load_source("10 PRINT \"HI\"\n20 GOTO 10")
        .unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in listing.lines() {
        writeln!(file, "{}", line).unwrap();
    }
    let source = std::fs::read_to_string(file.path()).unwrap();
    let mut reloaded = Listing::default();
    reloaded.load_source(&source).unwrap();
    assert_eq!(listing.list(1, 65535), reloaded.list(1, 65535));
}

#[test]
fn test_load_keeps_original_spelling() {
    let mut listing = Listing::default();
    listing.load_source("10 print  x :rem  note").unwrap();
    // Keywords canonicalize but spacing and remark text survive.
    let stored = listing.get(10).unwrap().to_string();
    assert_eq!(stored, "10 PRINT  X :REM  note");
}
