#![no_main]

use std::collections::{HashMap as NatMap, HashSet as NatSet};

use libfuzzer_sys::fuzz_target;

use frozen::{Map, Set};

fuzz_target!(|input: (Set<u16>, Set<u16>, Map<u8, u8>, Map<u8, u8>)| {
    let (a, b, m, n) = input;
    let nat_a: NatSet<u16> = a.iter().cloned().collect();
    let nat_b: NatSet<u16> = b.iter().cloned().collect();
    assert_eq!(Set::from(&nat_a | &nat_b), a.clone().union(b.clone()));
    assert_eq!(Set::from(&nat_a & &nat_b), a.clone().intersection(b.clone()));
    assert_eq!(Set::from(&nat_a - &nat_b), a.clone().difference(b.clone()));
    assert_eq!(Set::from(&nat_a ^ &nat_b), a.clone().symmetric_difference(b.clone()));
    for result in [a.clone() + b.clone(), a.clone() * b.clone(), a.clone() - b.clone()] {
        result.check_sane();
    }
    assert_eq!(a.is_subset(&b), nat_a.is_subset(&nat_b));

    // Maps merge with the right side winning on shared keys.
    let mut nat_m: NatMap<u8, u8> = m.iter().map(|(k, v)| (*k, *v)).collect();
    nat_m.extend(n.iter().map(|(k, v)| (*k, *v)));
    let merged = m.update(n);
    merged.check_sane();
    assert_eq!(Map::from(nat_m), merged);
});
