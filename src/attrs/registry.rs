// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-wide registry of user-defined attribute types.
//!
//! Registration is monotonic and rare; lookups copy the record out so no
//! reference escapes the critical section.

use std::sync::{Mutex, OnceLock};

use super::types::{AttrAffects, AttrMerge, AttrType, AttrValueKind};

const CUSTOM_TYPE_BASE: u32 = 0x1000;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TypeRecord {
    pub(crate) nick: String,
    pub(crate) kind: AttrValueKind,
    pub(crate) affects: AttrAffects,
    pub(crate) merge: AttrMerge,
}

fn registry() -> &'static Mutex<Vec<TypeRecord>> {
    static REGISTRY: OnceLock<Mutex<Vec<TypeRecord>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

pub(crate) fn register(
    nick: &str,
    kind: AttrValueKind,
    affects: AttrAffects,
    merge: AttrMerge,
) -> AttrType {
    let mut records = registry().lock().unwrap();
    let id = CUSTOM_TYPE_BASE + records.len() as u32;
    records.push(TypeRecord {
        nick: nick.to_owned(),
        kind,
        affects,
        merge,
    });
    AttrType(id)
}

pub(crate) fn lookup(ty: AttrType) -> Option<TypeRecord> {
    let index = ty.0.checked_sub(CUSTOM_TYPE_BASE)? as usize;
    registry().lock().unwrap().get(index).cloned()
}

pub(crate) fn find_by_nick(nick: &str) -> Option<AttrType> {
    let records = registry().lock().unwrap();
    records
        .iter()
        .position(|record| record.nick == nick)
        .map(|index| AttrType(CUSTOM_TYPE_BASE + index as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_monotonic_and_queryable() {
        let ty = register(
            "test-registry-probe",
            AttrValueKind::Int,
            AttrAffects::RENDERING,
            AttrMerge::Accumulates,
        );
        assert!(ty.0 >= CUSTOM_TYPE_BASE);
        let record = lookup(ty).unwrap();
        assert_eq!(record.nick, "test-registry-probe");
        assert_eq!(record.merge, AttrMerge::Accumulates);
        assert_eq!(find_by_nick("test-registry-probe"), Some(ty));
        assert_eq!(lookup(AttrType(CUSTOM_TYPE_BASE + 0xffff)), None);
    }
}
