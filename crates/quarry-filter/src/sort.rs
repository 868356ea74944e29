#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Parse `field`, `+field` (ascending) or `-field` (descending).
    pub fn parse(raw: &str) -> Self {
        let (direction, rest) = match raw.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, raw),
        };
        Sort {
            field: rest.strip_prefix('+').unwrap_or(rest).to_string(),
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixes() {
        assert_eq!(Sort::parse("name").direction, SortDirection::Asc);
        assert_eq!(Sort::parse("+name").field, "name");
        let desc = Sort::parse("-created");
        assert_eq!(desc.field, "created");
        assert_eq!(desc.direction.as_i32(), -1);
    }
}
