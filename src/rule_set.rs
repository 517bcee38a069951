use std::str::FromStr;

use thiserror::Error;

/// Neighborhood of the cell at `CELL_MASK`, within a 4x4 block stored as a
/// `u16` with bit `row * 4 + col`.
const NBHD_MASK: u16 = 0b0000_0111_0101_0111;
const CELL_MASK: u16 = 0b0000_0000_0010_0000;

/// Rules of Conway's Game of Life.
pub const B3S23: RuleSet = RuleSet::new(0b1000, 0b1100);

/// # Representation
/// Life rules are represented as
/// ```notrust
/// |------birth------|
/// 0000_0000_0000_0000_0000_0000_0000_0000
///                     |----survival-----|
/// ```
///
/// # Examples
/// ```notrust
/// b3s23:                0000_0000_0000_1000_0000_0000_0000_1100
///
/// b0s0:                 0000_0000_0000_0000_0000_0000_0000_0000
/// b012345678s012345678: 0000_0001_1111_1111_0000_0001_1111_1111
/// ```
///
/// See: https://conwaylife.com/wiki/Rulestring
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    rule: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        B3S23
    }
}

impl RuleSet {
    /// Create a new `RuleSet` for the given births and survivals. For both `b` and
    /// `s`, numbers are set on a bit basis. For instance if bit `i` in `b` is on, it
    /// means `i` is included in the set of births. Any bit past the 8th is ignored.
    pub const fn new(b: u16, s: u16) -> Self {
        let b = b & 0x1FF;
        let s = s & 0x1FF;

        Self {
            rule: ((b as u32) << 16) | s as u32,
        }
    }

    pub fn births(&self) -> u16 {
        ((self.rule & 0x1FF_0000) >> 0x10) as u16
    }

    pub fn survivals(&self) -> u16 {
        (self.rule & 0x1FF) as u16
    }

    /// Compute the leaf transition table for the current `RuleSet`.
    ///
    /// This returns a list of all possible 4x4 blocks, each stored using the
    /// bits of a `u16`. Indexing into the list with a block yields the next
    /// state of that block's center 2x2 (bits 5, 6, 9, 10); all other bits of
    /// the entry are clear, since the edge cells of a block lack a full
    /// neighborhood.
    pub fn compute_rules(&self) -> Vec<u16> {
        let mut rules = vec![0; (u16::MAX as usize) + 1];

        for block in 0..=u16::MAX {
            rules[block as usize] = self.next(block);
        }

        rules
    }

    fn next(&self, block: u16) -> u16 {
        let mut res: u16 = 0;

        // Shifts moving the masks over each of the four center cells
        let shifts = [0, 1, 4, 5];

        let births = self.births();
        let survivals = self.survivals();

        for shift in shifts {
            let nbhd_mask = NBHD_MASK << shift;
            let cell_mask = CELL_MASK << shift;

            let dead = (block & cell_mask) == 0;
            let num_neighbors = 1u16 << (block & nbhd_mask).count_ones();

            let set = if dead { births } else { survivals };
            if set & num_neighbors != 0 {
                res |= cell_mask;
            }
        }

        res
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("Invalid character '{0}' in rule string")]
    InvalidChar(char),

    #[error("Neighbor count {0} is out of range")]
    CountOutOfRange(u32),

    #[error("Rule string defines no birth or survival counts")]
    EmptyRule,
}

// Parses rules that look like b3/s23, B3/S23, or b3s23
impl FromStr for RuleSet {
    type Err = RuleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        enum State {
            Birth,
            Survival,
        }

        let mut state = State::Birth;
        let mut births = 0;
        let mut survivals = 0;
        let mut seen_digit = false;

        for c in s.chars() {
            match c {
                'b' | 'B' => state = State::Birth,
                's' | 'S' => state = State::Survival,
                '/' => {}
                d => {
                    let n = d.to_digit(10).ok_or(RuleSetError::InvalidChar(d))?;

                    if n > 8 {
                        return Err(RuleSetError::CountOutOfRange(n));
                    }

                    match state {
                        State::Birth => births |= 1 << n,
                        State::Survival => survivals |= 1 << n,
                    }

                    seen_digit = true;
                }
            }
        }

        if !seen_digit {
            return Err(RuleSetError::EmptyRule);
        }

        Ok(RuleSet::new(births, survivals))
    }
}

#[cfg(test)]
mod test {
    use super::B3S23;
    use super::CELL_MASK;
    use super::RuleSet;
    use super::RuleSetError;

    #[test]
    fn parse_conway() {
        let set: RuleSet = "b3/s23".parse().unwrap();

        assert_eq!(set.births(), B3S23.births());
        assert_eq!(set.survivals(), B3S23.survivals());
    }

    #[test]
    fn parse_without_slash() {
        let set: RuleSet = "B36S23".parse().unwrap();

        assert_eq!(set.births(), 0b100_1000);
        assert_eq!(set.survivals(), 0b1100);
    }

    #[test]
    fn parse_rejects_garbage() {
        let res: Result<RuleSet, _> = "b3/s2x".parse();

        assert_eq!(res, Err(RuleSetError::InvalidChar('x')));
    }

    #[test]
    fn parse_rejects_empty_rules() {
        for s in ["", "b/s", "bs/"] {
            let res: Result<RuleSet, _> = s.parse();

            assert_eq!(res, Err(RuleSetError::EmptyRule), "for rule {s:?}");
        }
    }

    #[test]
    fn conway_center_cell() {
        let rules = B3S23.compute_rules();

        // A lone live cell at bit 5 dies
        assert_eq!(rules[CELL_MASK as usize], 0);

        // A live cell with exactly two live neighbors survives
        let block = CELL_MASK | 0b0000_0000_0101_0000;
        assert_eq!(rules[block as usize] & CELL_MASK, CELL_MASK);

        // A dead cell with exactly three live neighbors is born
        let block = 0b0000_0111_0000_0000u16;
        assert_eq!(rules[block as usize] & CELL_MASK, CELL_MASK);
    }

    #[test]
    fn block_is_still_life() {
        let rules = B3S23.compute_rules();

        // The 2x2 block in the center of a 4x4 leaf
        let block = 0b0000_0110_0110_0000u16;
        assert_eq!(rules[block as usize], block);
    }
}
