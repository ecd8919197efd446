//! Small shared utilities

/// Convert a CamelCase or mixedCase identifier to snake_case.
///
/// `UserRole -> user_role`, `ID -> id`, `AvatarURL -> avatar_url`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            // Break before an uppercase run start or a lower-to-upper edge
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Last segment of an UpperCamelCase name.
///
/// `SalesOpportunity -> Opportunity`, `User -> User`.
pub fn last_camel_segment(name: &str) -> &str {
    let mut start = 0;
    for (i, c) in name.char_indices() {
        if i > 0 && c.is_uppercase() {
            start = i;
        }
    }
    &name[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("UserRole"), "user_role");
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("AvatarURL"), "avatar_url");
        assert_eq!(to_snake_case("username"), "username");
    }

    #[test]
    fn test_last_camel_segment() {
        assert_eq!(last_camel_segment("SalesOpportunity"), "Opportunity");
        assert_eq!(last_camel_segment("User"), "User");
        assert_eq!(last_camel_segment("CustomerContactInfo"), "Info");
    }
}
