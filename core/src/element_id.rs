use std::fmt;

pub const PART_PREFIX: &str = "g";
pub const TARGET_PREFIX: &str = "t";
pub const HIT_ZONE_PREFIX: &str = "rt";

/// Numeric identifier shared by a part, its target and the target's hit zone.
pub type PieceId = u32;

/// Structural role of an element, derived purely from its `id` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    Part(PieceId),
    Target(PieceId),
    HitZone(PieceId),
}

impl ElementRole {
    pub fn parse(value: &str) -> Result<Self, ElementIdError> {
        if value.is_empty() {
            return Err(ElementIdError::Empty);
        }
        // "rt" must be tried before "t".
        let (prefix, digits) = if let Some(rest) = value.strip_prefix(HIT_ZONE_PREFIX) {
            (HIT_ZONE_PREFIX, rest)
        } else if let Some(rest) = value.strip_prefix(TARGET_PREFIX) {
            (TARGET_PREFIX, rest)
        } else if let Some(rest) = value.strip_prefix(PART_PREFIX) {
            (PART_PREFIX, rest)
        } else {
            return Err(ElementIdError::UnknownPrefix);
        };
        let id = parse_digits(digits, prefix.len())?;
        Ok(match prefix {
            HIT_ZONE_PREFIX => ElementRole::HitZone(id),
            TARGET_PREFIX => ElementRole::Target(id),
            _ => ElementRole::Part(id),
        })
    }

    pub fn piece(self) -> PieceId {
        match self {
            ElementRole::Part(id) | ElementRole::Target(id) | ElementRole::HitZone(id) => id,
        }
    }

    pub fn part_id(self) -> Option<PieceId> {
        match self {
            ElementRole::Part(id) => Some(id),
            _ => None,
        }
    }

    pub fn target_id(self) -> Option<PieceId> {
        match self {
            ElementRole::Target(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRole::Part(id) => write!(f, "{PART_PREFIX}{id}"),
            ElementRole::Target(id) => write!(f, "{TARGET_PREFIX}{id}"),
            ElementRole::HitZone(id) => write!(f, "{HIT_ZONE_PREFIX}{id}"),
        }
    }
}

impl std::str::FromStr for ElementRole {
    type Err = ElementIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

pub fn part_element_id(id: PieceId) -> String {
    ElementRole::Part(id).to_string()
}

pub fn target_element_id(id: PieceId) -> String {
    ElementRole::Target(id).to_string()
}

pub fn hit_zone_element_id(id: PieceId) -> String {
    ElementRole::HitZone(id).to_string()
}

fn parse_digits(digits: &str, offset: usize) -> Result<PieceId, ElementIdError> {
    if digits.is_empty() {
        return Err(ElementIdError::MissingDigits);
    }
    let mut value: PieceId = 0;
    for (idx, ch) in digits.chars().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            return Err(ElementIdError::InvalidDigit {
                ch,
                index: offset + idx,
            });
        };
        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(digit))
            .ok_or(ElementIdError::Overflow)?;
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementIdError {
    Empty,
    UnknownPrefix,
    MissingDigits,
    InvalidDigit { ch: char, index: usize },
    Overflow,
}

impl fmt::Display for ElementIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementIdError::Empty => write!(f, "element id is empty"),
            ElementIdError::UnknownPrefix => {
                write!(f, "element id must start with 'g', 't' or 'rt'")
            }
            ElementIdError::MissingDigits => write!(f, "element id has no digits after its prefix"),
            ElementIdError::InvalidDigit { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
            ElementIdError::Overflow => write!(f, "element id number is too large"),
        }
    }
}

impl std::error::Error for ElementIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_role() {
        assert_eq!(ElementRole::parse("g12"), Ok(ElementRole::Part(12)));
        assert_eq!(ElementRole::parse("t3"), Ok(ElementRole::Target(3)));
        assert_eq!(ElementRole::parse("rt7"), Ok(ElementRole::HitZone(7)));
    }

    #[test]
    fn rejects_anything_but_prefix_and_digits() {
        assert_eq!(ElementRole::parse("g"), Err(ElementIdError::MissingDigits));
        assert_eq!(
            ElementRole::parse("g1a"),
            Err(ElementIdError::InvalidDigit { ch: 'a', index: 2 })
        );
        assert_eq!(ElementRole::parse("G1"), Err(ElementIdError::UnknownPrefix));
        assert_eq!(ElementRole::parse("group1"), Err(ElementIdError::InvalidDigit { ch: 'r', index: 1 }));
        assert_eq!(ElementRole::parse(" g1"), Err(ElementIdError::UnknownPrefix));
        assert_eq!(ElementRole::parse("g99999999999"), Err(ElementIdError::Overflow));
    }

    #[test]
    fn leading_zeros_collapse() {
        assert_eq!(ElementRole::parse("g007"), Ok(ElementRole::Part(7)));
        assert_eq!(ElementRole::Part(7).to_string(), "g7");
    }
}
