// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stencil settings of an 8-bit stencil buffer, and the presets of the path renderers.
//!
//! The semantics are those of OpenGL: the test compares `reference & test_mask` against
//! `stored & test_mask`, the chosen operation computes a new value, and only the bits in
//! `write_mask` are replaced. A fragment that fails the test writes no color.

/// The comparison of a stencil test. The reference value is on the left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StencilTest {
    /// Always passes.
    Always = 0,
    /// Never passes.
    Never = 1,
    /// `reference > stored`.
    Greater = 2,
    /// `reference >= stored`.
    GreaterEqual = 3,
    /// `reference < stored`.
    Less = 4,
    /// `reference <= stored`.
    LessEqual = 5,
    /// `reference == stored`.
    Equal = 6,
    /// `reference != stored`.
    NotEqual = 7,
}

impl StencilTest {
    fn from_bits(bits: u64) -> Self {
        match bits & 7 {
            0 => Self::Always,
            1 => Self::Never,
            2 => Self::Greater,
            3 => Self::GreaterEqual,
            4 => Self::Less,
            5 => Self::LessEqual,
            6 => Self::Equal,
            _ => Self::NotEqual,
        }
    }

    fn passes(self, reference: u8, stored: u8) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Greater => reference > stored,
            Self::GreaterEqual => reference >= stored,
            Self::Less => reference < stored,
            Self::LessEqual => reference <= stored,
            Self::Equal => reference == stored,
            Self::NotEqual => reference != stored,
        }
    }
}

/// How the stored value changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StencilOp {
    /// Keep the stored value.
    Keep = 0,
    /// Set it to zero.
    Zero = 1,
    /// Set it to the reference value.
    Replace = 2,
    /// Flip all bits.
    Invert = 3,
    /// Add one, wrapping at 255.
    IncrementWrap = 4,
    /// Subtract one, wrapping at 0.
    DecrementWrap = 5,
    /// Add one, saturating.
    IncrementClamp = 6,
    /// Subtract one, saturating.
    DecrementClamp = 7,
}

impl StencilOp {
    fn from_bits(bits: u64) -> Self {
        match bits & 7 {
            0 => Self::Keep,
            1 => Self::Zero,
            2 => Self::Replace,
            3 => Self::Invert,
            4 => Self::IncrementWrap,
            5 => Self::DecrementWrap,
            6 => Self::IncrementClamp,
            _ => Self::DecrementClamp,
        }
    }

    fn apply(self, reference: u8, stored: u8) -> u8 {
        match self {
            Self::Keep => stored,
            Self::Zero => 0,
            Self::Replace => reference,
            Self::Invert => !stored,
            Self::IncrementWrap => stored.wrapping_add(1),
            Self::DecrementWrap => stored.wrapping_sub(1),
            Self::IncrementClamp => stored.saturating_add(1),
            Self::DecrementClamp => stored.saturating_sub(1),
        }
    }
}

/// The stencil state of one triangle facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StencilFace {
    /// The reference value.
    pub reference: u8,
    /// The comparison.
    pub test: StencilTest,
    /// The bits taking part in the comparison.
    pub test_mask: u8,
    /// What happens when the test passes.
    pub pass_op: StencilOp,
    /// What happens when the test fails.
    pub fail_op: StencilOp,
    /// The bits that may be written.
    pub write_mask: u8,
}

impl StencilFace {
    /// Run the test against a stored value and return whether it passed, with the new value.
    pub fn run(&self, stored: u8) -> (bool, u8) {
        let passed = self
            .test
            .passes(self.reference & self.test_mask, stored & self.test_mask);
        let op = if passed { self.pass_op } else { self.fail_op };
        let value = op.apply(self.reference, stored);
        (passed, (stored & !self.write_mask) | (value & self.write_mask))
    }

    /// Pack the settings into the low 33 bits of an integer.
    pub fn to_bits(&self) -> u64 {
        u64::from(self.reference)
            | u64::from(self.test_mask) << 8
            | u64::from(self.write_mask) << 16
            | (self.test as u64) << 24
            | (self.pass_op as u64) << 27
            | (self.fail_op as u64) << 30
    }

    /// Unpack settings packed by [`StencilFace::to_bits`].
    pub fn from_bits(bits: u64) -> Self {
        Self {
            reference: bits as u8,
            test_mask: (bits >> 8) as u8,
            write_mask: (bits >> 16) as u8,
            test: StencilTest::from_bits(bits >> 24),
            pass_op: StencilOp::from_bits(bits >> 27),
            fail_op: StencilOp::from_bits(bits >> 30),
        }
    }
}

/// The stencil state of a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StencilSettings {
    /// The stencil buffer is neither tested nor written.
    #[default]
    Disabled,
    /// Both facings use the same state.
    Single(StencilFace),
    /// Clockwise (front) and counter-clockwise (back) triangles use different states.
    Separate {
        /// The state of clockwise triangles.
        front: StencilFace,
        /// The state of counter-clockwise triangles.
        back: StencilFace,
    },
}

impl StencilSettings {
    /// The state of a triangle with the given facing, or `None` when disabled.
    pub fn face(&self, clockwise: bool) -> Option<&StencilFace> {
        match self {
            Self::Disabled => None,
            Self::Single(face) => Some(face),
            Self::Separate { front, back } => Some(if clockwise { front } else { back }),
        }
    }

    /// Whether the stencil buffer is used at all.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Pack the front and back settings, with bit 33 set when enabled and bit 34 when two-sided.
    pub fn to_bits(&self) -> [u64; 2] {
        const ENABLED: u64 = 1 << 33;
        const SEPARATE: u64 = 1 << 34;
        match self {
            Self::Disabled => [0, 0],
            Self::Single(face) => [face.to_bits() | ENABLED, face.to_bits() | ENABLED],
            Self::Separate { front, back } => [
                front.to_bits() | ENABLED | SEPARATE,
                back.to_bits() | ENABLED | SEPARATE,
            ],
        }
    }
}

const fn face(
    reference: u8,
    test: StencilTest,
    test_mask: u8,
    pass_op: StencilOp,
    fail_op: StencilOp,
    write_mask: u8,
) -> StencilFace {
    StencilFace {
        reference,
        test,
        test_mask,
        pass_op,
        fail_op,
        write_mask,
    }
}

/// Adds one for every clockwise and subtracts one for every counter-clockwise triangle, which
/// leaves the winding number in the stencil buffer. For non-zero fills.
pub const INCR_DECR: StencilSettings = StencilSettings::Separate {
    front: face(
        0,
        StencilTest::Always,
        0xff,
        StencilOp::IncrementWrap,
        StencilOp::Keep,
        0xff,
    ),
    back: face(
        0,
        StencilTest::Always,
        0xff,
        StencilOp::DecrementWrap,
        StencilOp::Keep,
        0xff,
    ),
};

/// Flips the lowest bit for every triangle, which leaves the parity of the winding number.
/// For even-odd fills.
pub const INVERT: StencilSettings = StencilSettings::Single(face(
    0xff,
    StencilTest::Always,
    0xff,
    StencilOp::Invert,
    StencilOp::Keep,
    0x01,
));

/// Colors where the stencil is non-zero and resets it. Covers a stencilled fill.
pub const TEST_AND_RESET: StencilSettings = StencilSettings::Single(face(
    0,
    StencilTest::NotEqual,
    0xff,
    StencilOp::Zero,
    StencilOp::Keep,
    0xff,
));

/// Colors where the stencil is zero and resets it everywhere. Covers a stencilled inverse fill.
pub const INVERTED_TEST_AND_RESET: StencilSettings = StencilSettings::Single(face(
    0,
    StencilTest::Equal,
    0xff,
    StencilOp::Keep,
    StencilOp::Zero,
    0xff,
));

/// Colors where no curve was stencilled; elsewhere adds the triangle's winding like
/// [`INCR_DECR`] so a later cover resolves it. For the inner fan of non-zero fills.
pub const FILL_OR_INCR_DECR: StencilSettings = StencilSettings::Separate {
    front: face(
        0,
        StencilTest::Equal,
        0xff,
        StencilOp::Keep,
        StencilOp::IncrementWrap,
        0xff,
    ),
    back: face(
        0,
        StencilTest::Equal,
        0xff,
        StencilOp::Keep,
        StencilOp::DecrementWrap,
        0xff,
    ),
};

/// Colors where no curve was stencilled; elsewhere flips the parity bit like [`INVERT`].
/// For the inner fan of even-odd fills.
pub const FILL_OR_INVERT: StencilSettings = StencilSettings::Single(face(
    0,
    StencilTest::Equal,
    0x01,
    StencilOp::Keep,
    StencilOp::Invert,
    0x01,
));

/// Marks every covered pixel with one. The first pass of a stroke that must not blend twice.
pub const MARK: StencilSettings = StencilSettings::Single(face(
    1,
    StencilTest::Always,
    0xff,
    StencilOp::Replace,
    StencilOp::Keep,
    0xff,
));
