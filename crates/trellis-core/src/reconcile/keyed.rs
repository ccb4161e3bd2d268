//! Keyed child diff with minimal moves.
//!
//! Common prefixes and suffixes are patched in place. For the remaining
//! window every new entry records which old entry it matched; entries on the
//! longest increasing run of old positions stay put and everything else is
//! moved or inserted, walking backwards so each insertion has a settled
//! reference node.

use crate::collections::KeyIndex;
use crate::descriptor::Descriptor;
use crate::{HostError, HostId, RenderError};

use super::{insert, mount, patch, unmount, unmount_all, Frame, RenderPass};

pub(super) fn patch_keyed(
    a: &mut [Descriptor],
    b: &mut [Descriptor],
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<(), RenderError> {
    let mut a_start = 0;
    let mut b_start = 0;
    let mut a_end = a.len();
    let mut b_end = b.len();

    while a_start < a_end && b_start < b_end && a[a_start].key() == b[b_start].key() {
        patch(&mut a[a_start], &mut b[b_start], parent, pass, frame)?;
        a_start += 1;
        b_start += 1;
    }
    while a_start < a_end && b_start < b_end && a[a_end - 1].key() == b[b_end - 1].key() {
        patch(&mut a[a_end - 1], &mut b[b_end - 1], parent, pass, frame)?;
        a_end -= 1;
        b_end -= 1;
    }

    if a_start == a_end {
        let reference = b.get(b_end).and_then(Descriptor::host);
        for node in &mut b[b_start..b_end] {
            let host = mount(node, pass, frame)?;
            insert(pass, parent, host, reference)?;
        }
        return Ok(());
    }
    if b_start == b_end {
        return unmount_all(&mut a[a_start..a_end], Some(parent), pass);
    }

    let a_left = a_end - a_start;
    let b_left = b_end - b_start;
    // Old position matched by each new entry; `None` marks a fresh entry.
    let mut sources: Vec<Option<usize>> = vec![None; b_left];
    let mut matched = vec![false; a_left];
    let mut moved = false;
    let mut pos = 0;
    let mut patched = 0;

    if b_left <= 4 || a_left * b_left <= 16 {
        for i in a_start..a_end {
            if patched >= b_left {
                break;
            }
            let found = (b_start..b_end).find(|&j| a[i].key() == b[j].key());
            if let Some(j) = found {
                sources[j - b_start] = Some(i);
                if pos > j {
                    moved = true;
                } else {
                    pos = j;
                }
                patch(&mut a[i], &mut b[j], parent, pass, frame)?;
                patched += 1;
                matched[i - a_start] = true;
            }
        }
    } else {
        let mut index = KeyIndex::default();
        for (j, node) in b.iter().enumerate().take(b_end).skip(b_start) {
            if let Some(key) = node.key() {
                index.insert(key.clone(), j);
            }
        }
        for i in a_start..a_end {
            if patched >= b_left {
                break;
            }
            let found = a[i].key().and_then(|key| index.get(key).copied());
            if let Some(j) = found {
                sources[j - b_start] = Some(i);
                if pos > j {
                    moved = true;
                } else {
                    pos = j;
                }
                patch(&mut a[i], &mut b[j], parent, pass, frame)?;
                patched += 1;
                matched[i - a_start] = true;
            }
        }
    }

    if a_left == a.len() && patched == 0 {
        log::trace!("keyed diff: no shared keys, replacing {a_left} children");
        unmount_all(a, None, pass)?;
        pass.host.clear_children(parent)?;
        for node in &mut b[b_start..b_end] {
            let host = mount(node, pass, frame)?;
            pass.host.append_child(parent, host)?;
        }
        return Ok(());
    }

    for (offset, node) in a[a_start..a_end].iter_mut().enumerate() {
        if !matched[offset] {
            unmount(node, Some(parent), pass)?;
        }
    }

    if moved {
        let sequence = longest_increasing_subsequence(&sources);
        log::trace!(
            "keyed diff: {patched} matched, {} stay in place",
            sequence.len()
        );
        let mut remaining = sequence.len();
        for i in (0..b_left).rev() {
            let position = b_start + i;
            let reference = b.get(position + 1).and_then(Descriptor::host);
            match sources[i] {
                None => {
                    let host = mount(&mut b[position], pass, frame)?;
                    insert(pass, parent, host, reference)?;
                }
                Some(_) if remaining == 0 || sequence[remaining - 1] != i => {
                    let host = b[position].host().ok_or(HostError::Unmounted)?;
                    insert(pass, parent, host, reference)?;
                }
                Some(_) => remaining -= 1,
            }
        }
    } else if patched != b_left {
        log::trace!("keyed diff: inserting {} new children", b_left - patched);
        for i in (0..b_left).rev() {
            if sources[i].is_none() {
                let position = b_start + i;
                let reference = b.get(position + 1).and_then(Descriptor::host);
                let host = mount(&mut b[position], pass, frame)?;
                insert(pass, parent, host, reference)?;
            }
        }
    }
    Ok(())
}

/// Indices of one longest strictly increasing run in `sources`, skipping
/// `None` entries except that index 0 always seeds the search.
pub(crate) fn longest_increasing_subsequence(sources: &[Option<usize>]) -> Vec<usize> {
    if sources.is_empty() {
        return Vec::new();
    }
    let mut predecessors = vec![0; sources.len()];
    let mut result: Vec<usize> = vec![0];

    for i in 0..sources.len() {
        if sources[i].is_none() {
            continue;
        }
        let last = result[result.len() - 1];
        if sources[last] < sources[i] {
            predecessors[i] = last;
            result.push(i);
            continue;
        }
        let mut low = 0;
        let mut high = result.len() - 1;
        while low < high {
            let middle = (low + high) / 2;
            if sources[result[middle]] < sources[i] {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        if sources[i] < sources[result[low]] {
            if low > 0 {
                predecessors[i] = result[low - 1];
            }
            result[low] = i;
        }
    }

    let mut cursor = result[result.len() - 1];
    for slot in result.iter_mut().rev() {
        *slot = cursor;
        cursor = predecessors[cursor];
    }
    result
}
