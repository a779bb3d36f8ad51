#![no_main]

use std::collections::HashSet as NatSet;
use std::fmt::Debug;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use frozen::{Set, SetBuilder};

#[derive(Arbitrary, Debug)]
enum Action<A> {
    Insert(A),
    Remove(A),
    Snapshot,
}

fuzz_target!(|actions: Vec<Action<u32>>| {
    let mut set = Set::new();
    let mut builder = SetBuilder::new();
    let mut nat = NatSet::new();
    let mut snapshots = Vec::new();
    for action in actions {
        match action {
            Action::Insert(value) => {
                let len = nat.len() + if nat.contains(&value) { 0 } else { 1 };
                nat.insert(value);
                set = set.with(value);
                builder.add(value);
                assert_eq!(len, set.len());
            }
            Action::Remove(value) => {
                let len = nat.len() - if nat.contains(&value) { 1 } else { 0 };
                nat.remove(&value);
                set = set.without(&value);
                builder.remove(&value);
                assert_eq!(len, set.len());
            }
            Action::Snapshot => snapshots.push((set.clone(), nat.clone())),
        }
        assert_eq!(nat.len(), set.len());
        set.check_sane();
    }
    // Later edits never show through in earlier versions.
    for (old, old_nat) in snapshots {
        assert_eq!(Set::from(old_nat), old);
    }
    assert_eq!(Set::from(nat.clone()), set);
    assert_eq!(builder.finish(), set);
    assert_eq!(set.iter().cloned().collect::<NatSet<_>>(), nat);
    assert_eq!(set.into_iter().count(), nat.len());
});
