use crate::node::StereoParity;

/// Objects that carry a canonical rank: nodes and connectors.
pub trait HasCanonicalRank {
    fn canonical_rank(&self) -> Option<usize>;
    fn set_canonical_rank(&mut self, rank: Option<usize>);
}

/// Objects that carry a perceived stereo parity: nodes and connectors.
pub trait HasParity {
    fn parity(&self) -> StereoParity;
    fn set_parity(&mut self, parity: StereoParity);
}

pub(crate) fn count_determined<'a, T: HasParity + 'a>(items: impl Iterator<Item = &'a T>) -> usize {
    items.filter(|item| item.parity().is_determined()).count()
}
