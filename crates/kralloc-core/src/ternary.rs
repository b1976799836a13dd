use core::ops::Not;

/// Three-valued answer for queries an allocator cannot always settle cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ternary {
  Yes,
  No,
  #[default]
  Unknown,
}

impl Ternary {
  pub const fn is_yes(self) -> bool {
    matches!(self, Ternary::Yes)
  }

  pub const fn is_no(self) -> bool {
    matches!(self, Ternary::No)
  }

  pub const fn is_unknown(self) -> bool {
    matches!(self, Ternary::Unknown)
  }

  pub const fn and(self, other: Ternary) -> Ternary {
    match (self, other) {
      (Ternary::No, _) | (_, Ternary::No) => Ternary::No,
      (Ternary::Yes, Ternary::Yes) => Ternary::Yes,
      _ => Ternary::Unknown,
    }
  }

  pub const fn or(self, other: Ternary) -> Ternary {
    match (self, other) {
      (Ternary::Yes, _) | (_, Ternary::Yes) => Ternary::Yes,
      (Ternary::No, Ternary::No) => Ternary::No,
      _ => Ternary::Unknown,
    }
  }
}

impl From<bool> for Ternary {
  fn from(value: bool) -> Self {
    if value { Ternary::Yes } else { Ternary::No }
  }
}

impl Not for Ternary {
  type Output = Ternary;

  fn not(self) -> Self::Output {
    match self {
      Ternary::Yes => Ternary::No,
      Ternary::No => Ternary::Yes,
      Ternary::Unknown => Ternary::Unknown,
    }
  }
}
