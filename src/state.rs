use enumset::{EnumSet, EnumSetType};

/// A single named accessible state bit (§3). Wire representation is two
/// 32-bit words; `EnumSet<State>` gives us that packing for free as long as
/// the enum stays within 64 bits, which this closed set does. `EnumSet<State>`
/// itself is `Serialize`/`Deserialize` via enumset's `serde` feature.
#[derive(Debug, EnumSetType)]
pub enum State {
    Invalid,
    Active,
    Armed,
    Busy,
    Checked,
    Collapsed,
    Defunct,
    Editable,
    Enabled,
    Expandable,
    Expanded,
    Focusable,
    Focused,
    HasTooltip,
    Horizontal,
    Iconified,
    Modal,
    MultiLine,
    MultiSelectable,
    Opaque,
    Pressed,
    Resizable,
    Selectable,
    Selected,
    Sensitive,
    Showing,
    SingleLine,
    Stale,
    Transient,
    Vertical,
    Visible,
    ManagesDescendants,
    Indeterminate,
    Required,
    Truncated,
    Animated,
    InvalidEntry,
    SupportsAutocompletion,
    SelectableText,
    IsDefault,
    Visited,
    Checkable,
    HasPopup,
    ReadOnly,
    Highlightable,
    Highlighted,
}

/// A fixed-size set of [`State`] bits. Bitwise union/intersection/equality
/// supported via `EnumSet`'s own operator overloads.
pub type StateSet = EnumSet<State>;

/// Splits a `StateSet` into its two 32-bit wire words: the low bit of a state
/// value lands in `word0` for values <32, else `word1` (§4.B).
pub fn to_wire_words(states: StateSet) -> (u32, u32) {
    let bits = states.as_u64();
    ((bits & 0xFFFF_FFFF) as u32, (bits >> 32) as u32)
}

pub fn from_wire_words(word0: u32, word1: u32) -> StateSet {
    let bits = (word0 as u64) | ((word1 as u64) << 32);
    StateSet::from_u64_truncated(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_words_round_trip() {
        let states = State::Focusable | State::Focused | State::Highlightable;
        let (w0, w1) = to_wire_words(states);
        assert_eq!(from_wire_words(w0, w1), states);
    }

    #[test]
    fn high_bit_state_lands_in_second_word() {
        // Highlighted is the 45th variant (index 44), so it must land in word1.
        let states: StateSet = State::Highlighted.into();
        let (w0, w1) = to_wire_words(states);
        assert_eq!(w0, 0);
        assert_ne!(w1, 0);
    }

    #[test]
    fn union_and_intersection() {
        let a = State::Focusable | State::Focused;
        let b = State::Focused | State::Selected;
        assert_eq!(a & b, State::Focused.into());
        assert!((a | b).contains(State::Selected));
    }
}
