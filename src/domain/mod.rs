use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of user roles. Form input is parsed through [`Role::parse`] so
/// arbitrary strings never reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the department id from the leading decimal digit of a product
/// number. Product numbers must be strictly positive; zero and negative
/// values have no leading digit in the 1-9 range and are rejected upstream
/// with a validation error, so this returns `None` for them.
#[must_use]
pub fn detect_department(prodnum: i32) -> Option<i32> {
    if prodnum <= 0 {
        return None;
    }
    let mut n = prodnum;
    while n >= 10 {
        n /= 10;
    }
    Some(n)
}

/// Allow-listed sort columns for the cost target listing. Anything outside
/// the list silently falls back to `Prodnum`; this enum is the only path by
/// which a sort request reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Prodnum,
    Buildcatnum,
    TargetCost,
    Department,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "buildcatnum" => Self::Buildcatnum,
            "target_cost" => Self::TargetCost,
            "department" => Self::Department,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::Prodnum,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prodnum => "prodnum",
            Self::Buildcatnum => "buildcatnum",
            Self::TargetCost => "target_cost",
            Self::Department => "department",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction. Only an exact (case-insensitive) `desc` sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_department_uses_leading_digit() {
        assert_eq!(detect_department(5123), Some(5));
        assert_eq!(detect_department(9001), Some(9));
        assert_eq!(detect_department(100), Some(1));
        assert_eq!(detect_department(7), Some(7));
    }

    #[test]
    fn detect_department_rejects_non_positive() {
        assert_eq!(detect_department(0), None);
        assert_eq!(detect_department(-5123), None);
    }

    #[test]
    fn unknown_sort_field_falls_back_to_prodnum() {
        assert_eq!(SortField::parse("prodnum"), SortField::Prodnum);
        assert_eq!(SortField::parse("target_cost"), SortField::TargetCost);
        assert_eq!(SortField::parse("; DROP TABLE users"), SortField::Prodnum);
        assert_eq!(SortField::parse(""), SortField::Prodnum);
    }

    #[test]
    fn only_desc_sorts_descending() {
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("descending"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse(""), SortOrder::Asc);
    }

    #[test]
    fn role_parsing_is_closed() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }
}
