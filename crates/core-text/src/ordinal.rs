//! Ordinals: logical positions into a [`Document`](crate::Document).
//!
//! An ordinal is a character offset into the buffer (the terminating sentinel
//! included). Two reserved values sit outside the valid range and compare
//! below / above every valid ordinal:
//!
//! * [`Ordinal::BEFORE_BEGIN`] one before the first character.
//! * [`Ordinal::UNDEFINED`] no position (also "past the end").
//!
//! Every component that stores ordinals must renormalize them on each
//! [`OrdinalShift`] or they silently point at the wrong text.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ordinal(i64);

impl Ordinal {
    pub const UNDEFINED: Ordinal = Ordinal(i64::MAX);
    pub const BEFORE_BEGIN: Ordinal = Ordinal(-1);
    pub const ZERO: Ordinal = Ordinal(0);

    pub const fn new(index: usize) -> Self {
        Ordinal(index as i64)
    }

    /// `true` for every ordinal that can address a character.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0 && self.0 != i64::MAX
    }

    /// Character index for a valid ordinal.
    #[inline]
    pub fn index(self) -> Option<usize> {
        self.is_valid().then_some(self.0 as usize)
    }

    /// Raw offset; sentinels map to `-1` / `i64::MAX`.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Offset arithmetic on a valid ordinal. Sentinels are returned untouched.
    #[inline]
    pub fn offset(self, delta: isize) -> Self {
        if !self.is_valid() {
            return self;
        }
        Ordinal(self.0 + delta as i64)
    }

    /// Signed distance `self - other` between two valid ordinals.
    #[inline]
    pub fn distance_from(self, other: Ordinal) -> isize {
        (self.0 - other.0) as isize
    }
}

impl From<usize> for Ordinal {
    fn from(index: usize) -> Self {
        Ordinal::new(index)
    }
}

impl fmt::Debug for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Ordinal::UNDEFINED => f.write_str("Ordinal(UNDEFINED)"),
            Ordinal::BEFORE_BEGIN => f.write_str("Ordinal(BEFORE_BEGIN)"),
            Ordinal(v) => write!(f, "Ordinal({v})"),
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Ordinal::UNDEFINED => f.write_str("undefined"),
            Ordinal::BEFORE_BEGIN => f.write_str("before-begin"),
            Ordinal(v) => write!(f, "{v}"),
        }
    }
}

/// Shift notification broadcast by the document before the matching
/// [`ContentChange`](crate::ContentChange).
///
/// Insertions report `begin` = insertion point and a positive `delta`.
/// Deletions report `begin` = the *last* removed ordinal and `delta` =
/// `-length`, so every ordinal strictly after the removed text moves back by
/// the removed length and ordinals inside it collapse onto the deletion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalShift {
    pub begin: Ordinal,
    pub delta: isize,
}

impl OrdinalShift {
    pub const fn new(begin: Ordinal, delta: isize) -> Self {
        Self { begin, delta }
    }

    /// Renormalize one stored ordinal.
    #[inline]
    pub fn adjust(&self, ordinal: &mut Ordinal) {
        adjust_ordinal_for_shift(self.begin, self.delta, ordinal);
    }

    /// Return the renormalized value of `ordinal`.
    #[inline]
    pub fn adjusted(&self, mut ordinal: Ordinal) -> Ordinal {
        self.adjust(&mut ordinal);
        ordinal
    }
}

/// Move `ordinal` to account for a shift of `delta` at `shift_begin`.
///
/// Ordinals greater than `shift_begin` move by `delta`. When `delta` is
/// negative, an ordinal inside the just-removed range
/// `(shift_begin + delta, shift_begin]` collapses to `shift_begin + 1 + delta`.
/// Sentinel ordinals are never moved.
pub fn adjust_ordinal_for_shift(shift_begin: Ordinal, delta: isize, ordinal: &mut Ordinal) {
    if !ordinal.is_valid() || delta == 0 {
        return;
    }
    if *ordinal > shift_begin {
        *ordinal = ordinal.offset(delta);
    } else if delta < 0 && ordinal.get() > shift_begin.get() + delta as i64 {
        *ordinal = Ordinal(shift_begin.get() + 1 + delta as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_bracket_valid_range() {
        assert!(Ordinal::BEFORE_BEGIN < Ordinal::ZERO);
        assert!(Ordinal::new(usize::MAX >> 2) < Ordinal::UNDEFINED);
        assert!(!Ordinal::UNDEFINED.is_valid());
        assert!(!Ordinal::BEFORE_BEGIN.is_valid());
        assert_eq!(Ordinal::new(3).index(), Some(3));
        assert_eq!(Ordinal::UNDEFINED.offset(5), Ordinal::UNDEFINED);
    }

    #[test]
    fn insert_shift_moves_ordinals_after_begin() {
        let shift = OrdinalShift::new(Ordinal::new(2), 3);
        assert_eq!(shift.adjusted(Ordinal::new(1)), Ordinal::new(1));
        assert_eq!(shift.adjusted(Ordinal::new(2)), Ordinal::new(2));
        assert_eq!(shift.adjusted(Ordinal::new(4)), Ordinal::new(7));
    }

    #[test]
    fn delete_shift_collapses_removed_range() {
        // deleteAt(2, 3) removes ordinals 2, 3, 4.
        let shift = OrdinalShift::new(Ordinal::new(4), -3);
        assert_eq!(shift.adjusted(Ordinal::new(1)), Ordinal::new(1));
        assert_eq!(shift.adjusted(Ordinal::new(2)), Ordinal::new(2));
        assert_eq!(shift.adjusted(Ordinal::new(3)), Ordinal::new(2));
        assert_eq!(shift.adjusted(Ordinal::new(4)), Ordinal::new(2));
        assert_eq!(shift.adjusted(Ordinal::new(5)), Ordinal::new(2));
        assert_eq!(shift.adjusted(Ordinal::new(9)), Ordinal::new(6));
    }

    #[test]
    fn sentinels_never_move() {
        let shift = OrdinalShift::new(Ordinal::ZERO, 10);
        assert_eq!(shift.adjusted(Ordinal::UNDEFINED), Ordinal::UNDEFINED);
        assert_eq!(shift.adjusted(Ordinal::BEFORE_BEGIN), Ordinal::BEFORE_BEGIN);
    }
}
