//! Shared primitive types used across the analysis crate.

/// An integer simulation timestep. Frames are keyed by it.
pub type Timestep = u64;

/// Small integer class id of a species (0 = resource, 1 = consumer).
pub type SpeciesType = u32;

/// The canonical run identifier.
pub type RunId = String;

/// Resolve a possibly negative frame index against a frame count.
///
/// Non-negative indices count from the front, negative ones from the back
/// (`-1` is the last frame). Returns `None` when the run is too short.
pub fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index >= 0 {
        let i = index as usize;
        (i < len).then_some(i)
    } else {
        let back = index.unsigned_abs() as usize;
        (back <= len).then(|| len - back)
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_index;

    #[test]
    fn resolves_from_both_ends() {
        assert_eq!(resolve_index(3, 0), Some(0));
        assert_eq!(resolve_index(3, 2), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(3, -1), Some(2));
        assert_eq!(resolve_index(3, -3), Some(0));
        assert_eq!(resolve_index(3, -4), None);
        assert_eq!(resolve_index(0, -1), None);
    }
}
