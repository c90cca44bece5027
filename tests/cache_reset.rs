//! Runs in its own test binary: emptying the process-wide cache would race
//! with the shared-dataset checks in `pipeline.rs`.

use std::sync::Arc;

use soccerstat::data::cache;

#[test]
fn reset_forgets_every_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    std::fs::write(&a, "Player,Gls\nA,1\n").unwrap();
    std::fs::write(&b, "Player,Gls\nB,2\n").unwrap();

    let first_a = cache::load(&a).unwrap();
    let first_b = cache::load(&b).unwrap();
    assert!(Arc::ptr_eq(&first_a, &cache::load(&a).unwrap()));

    cache::reset();
    assert!(!cache::invalidate(&a));
    assert!(!Arc::ptr_eq(&first_a, &cache::load(&a).unwrap()));
    assert!(!Arc::ptr_eq(&first_b, &cache::load(&b).unwrap()));
}
