//! Fixed severity orders used to pick a row's worst-case status

/// Which severity scale a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityOrder {
    /// exploited > weaponized > poc > none > unknown
    ExploitMaturity,
    /// true > false > unknown
    ReportedExploited,
}

impl SeverityOrder {
    /// Rank of a lowercase value; 0 for empty or unrecognised values
    pub fn rank(self, value: &str) -> u8 {
        match self {
            SeverityOrder::ExploitMaturity => match value {
                "exploited" => 4,
                "weaponized" => 3,
                "poc" => 2,
                "none" => 1,
                _ => 0,
            },
            SeverityOrder::ReportedExploited => match value {
                "true" => 2,
                "false" => 1,
                _ => 0,
            },
        }
    }

    /// Highest-ranked value; the first one wins on ties and rank 0 yields ""
    pub fn worst<'a, I>(self, values: I) -> &'a str
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut worst = ("", 0);
        for value in values {
            let rank = self.rank(value);
            if rank > worst.1 {
                worst = (value, rank);
            }
        }
        worst.0
    }
}

/// Capitalise the first letter of each word and lowercase the rest
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maturity_order() {
        let order = SeverityOrder::ExploitMaturity;
        assert_eq!(order.worst(["weaponized", "exploited"]), "exploited");
        assert_eq!(order.worst(["none", "poc", ""]), "poc");
        assert_eq!(order.worst(["", "unheard-of"]), "");
        assert_eq!(order.worst(std::iter::empty()), "");
    }

    #[test]
    fn test_reported_exploited_order() {
        let order = SeverityOrder::ReportedExploited;
        assert_eq!(order.worst(["false", "true", "false"]), "true");
        assert_eq!(order.worst(["", "false"]), "false");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("exploited"), "Exploited");
        assert_eq!(title_case("poc"), "Poc");
        assert_eq!(title_case("true"), "True");
        assert_eq!(title_case("proof of concept"), "Proof Of Concept");
        assert_eq!(title_case(""), "");
    }
}
