//! Visibility filter shared by customer, project, activity and user queries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Visibility {
    #[default]
    Visible = 1,
    Hidden = 2,
    Both = 3,
}

impl Visibility {
    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Visible),
            2 => Some(Self::Hidden),
            3 => Some(Self::Both),
            _ => None,
        }
    }

    /// Whether a record with the given visible flag passes the filter.
    pub fn matches(self, visible: bool) -> bool {
        match self {
            Self::Visible => visible,
            Self::Hidden => !visible,
            Self::Both => true,
        }
    }
}

impl From<Visibility> for u8 {
    fn from(value: Visibility) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Visibility {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(i64::from(value)).ok_or_else(|| format!("Invalid visibility: {value}"))
    }
}

/// Visibility state of a query
///
/// Invalid values passed to [`VisibilityQuery::set_visibility`] are ignored
/// and the previous value is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityQuery {
    visibility: Visibility,
    /// When false, hidden parents hide their children as well
    exclusive_visibility: bool,
}

impl VisibilityQuery {
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Accepts `1`, `2`, `3` as numbers or numeric strings.
    pub fn set_visibility(&mut self, value: impl ToString) -> &mut Self {
        if let Some(visibility) =
            value.to_string().trim().parse::<i64>().ok().and_then(Visibility::from_number)
        {
            self.visibility = visibility;
        }
        self
    }

    pub fn is_exclusive_visibility(&self) -> bool {
        self.exclusive_visibility
    }

    pub fn set_exclusive_visibility(&mut self, exclusive: bool) -> &mut Self {
        self.exclusive_visibility = exclusive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_keep_the_previous_state() {
        let mut query = VisibilityQuery::default();
        assert!(!query.is_exclusive_visibility());
        assert_eq!(query.visibility(), Visibility::Visible);

        query.set_exclusive_visibility(true);
        assert!(query.is_exclusive_visibility());

        query.set_visibility("foo-bar");
        assert_eq!(query.visibility(), Visibility::Visible);

        query.set_visibility("2");
        assert_eq!(query.visibility(), Visibility::Hidden);

        query.set_visibility("0");
        assert_eq!(query.visibility(), Visibility::Hidden);

        query.set_visibility(3);
        assert_eq!(query.visibility(), Visibility::Both);
        query.set_visibility(2);
        assert_eq!(query.visibility(), Visibility::Hidden);
        query.set_visibility(1);
        assert_eq!(query.visibility(), Visibility::Visible);
    }

    #[test]
    fn matching_records() {
        assert!(Visibility::Visible.matches(true));
        assert!(!Visibility::Visible.matches(false));
        assert!(Visibility::Hidden.matches(false));
        assert!(Visibility::Both.matches(false));
    }
}
