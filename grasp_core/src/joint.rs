//! Named fingers, joints and command slots.
//!
//! The driver addresses everything by position; this module is the only place
//! that knows the index layout.

use grasp_traits::msg::{FINGER_COUNT, JOINT_COUNT, SPREAD_SLOT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Finger {
    One,
    Two,
    Three,
}

impl Finger {
    pub const ALL: [Finger; FINGER_COUNT] = [Finger::One, Finger::Two, Finger::Three];

    /// Zero-based slot in per-finger arrays (masks, status modes, command slots).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Finger::One => 0,
            Finger::Two => 1,
            Finger::Three => 2,
        }
    }

    /// Human-facing finger number (1-based).
    #[inline]
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Finger::One),
            2 => Some(Finger::Two),
            3 => Some(Finger::Three),
            _ => None,
        }
    }

    /// The proximal (inner) and distal (outer) joints of this finger.
    #[inline]
    pub const fn joints(self) -> [JointId; 2] {
        [JointId::Inner(self), JointId::Outer(self)]
    }
}

/// One entry of a joint-state sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointId {
    SpreadOne,
    SpreadTwo,
    Inner(Finger),
    Outer(Finger),
}

/// Sensor index of every joint, in sample order.
const JOINT_TABLE: [JointId; JOINT_COUNT] = [
    JointId::SpreadOne,
    JointId::SpreadTwo,
    JointId::Inner(Finger::One),
    JointId::Inner(Finger::Two),
    JointId::Inner(Finger::Three),
    JointId::Outer(Finger::One),
    JointId::Outer(Finger::Two),
    JointId::Outer(Finger::Three),
];

impl JointId {
    pub const ALL: [JointId; JOINT_COUNT] = JOINT_TABLE;

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            JointId::SpreadOne => 0,
            JointId::SpreadTwo => 1,
            JointId::Inner(f) => 2 + f.index(),
            JointId::Outer(f) => 5 + f.index(),
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        JOINT_TABLE.get(i).copied()
    }

    /// Owning finger; spread joints belong to none.
    #[inline]
    pub const fn finger(self) -> Option<Finger> {
        match self {
            JointId::Inner(f) | JointId::Outer(f) => Some(f),
            JointId::SpreadOne | JointId::SpreadTwo => None,
        }
    }

    pub fn name(self) -> String {
        match self {
            JointId::SpreadOne => "spread_1".to_string(),
            JointId::SpreadTwo => "spread_2".to_string(),
            JointId::Inner(f) => format!("inner_{}", f.number()),
            JointId::Outer(f) => format!("outer_{}", f.number()),
        }
    }
}

/// One slot of a hand command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandAxis {
    Finger(Finger),
    Spread,
}

impl HandAxis {
    pub const ALL: [HandAxis; 4] = [
        HandAxis::Finger(Finger::One),
        HandAxis::Finger(Finger::Two),
        HandAxis::Finger(Finger::Three),
        HandAxis::Spread,
    ];

    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            HandAxis::Finger(f) => f.index(),
            HandAxis::Spread => SPREAD_SLOT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_table_round_trips_through_index() {
        for (i, j) in JointId::ALL.iter().enumerate() {
            assert_eq!(j.index(), i);
            assert_eq!(JointId::from_index(i), Some(*j));
        }
        assert_eq!(JointId::from_index(JOINT_COUNT), None);
    }

    #[test]
    fn finger_joints_pair_inner_with_outer() {
        assert_eq!(
            Finger::Two.joints().map(JointId::index),
            [3, 6],
            "finger 2 owns sensor entries 3 and 6"
        );
        assert_eq!(JointId::SpreadOne.finger(), None);
        assert_eq!(JointId::Outer(Finger::Three).finger(), Some(Finger::Three));
    }

    #[test]
    fn spread_is_the_last_command_slot() {
        let slots: Vec<usize> = HandAxis::ALL.iter().map(|a| a.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }

    #[test]
    fn finger_numbers_are_one_based() {
        assert_eq!(Finger::from_number(1), Some(Finger::One));
        assert_eq!(Finger::from_number(0), None);
        assert_eq!(Finger::Three.number(), 3);
    }
}
