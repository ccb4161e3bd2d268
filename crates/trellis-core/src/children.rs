//! Helpers for descriptors received through the `children` prop.
//!
//! Child lists are already flat, so these operate on plain slices, usually
//! the one returned by [`crate::Scope::children`].

use crate::descriptor::Descriptor;
use crate::StructuralError;

pub fn count(children: &[Descriptor]) -> usize {
    children.len()
}

/// The single child, or an error when there are zero or several.
pub fn only(children: &[Descriptor]) -> Result<&Descriptor, StructuralError> {
    match children {
        [child] => Ok(child),
        _ => Err(StructuralError::NotExactlyOne {
            count: children.len(),
        }),
    }
}

/// Unmounted copies, ready to be placed in a render output.
pub fn to_vec(children: &[Descriptor]) -> Vec<Descriptor> {
    children.to_vec()
}

pub fn map<F>(children: &[Descriptor], mut f: F) -> Vec<Descriptor>
where
    F: FnMut(&Descriptor, usize) -> Descriptor,
{
    children
        .iter()
        .enumerate()
        .map(|(index, child)| f(child, index))
        .collect()
}

pub fn for_each<F>(children: &[Descriptor], mut f: F)
where
    F: FnMut(&Descriptor, usize),
{
    for (index, child) in children.iter().enumerate() {
        f(child, index);
    }
}
