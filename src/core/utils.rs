//! String transformation utilities for code generation

/// Splits an identifier into its words.
///
/// Word boundaries are non-alphanumeric separators, a lowercase letter
/// followed by an uppercase one, the end of an uppercase run that is
/// followed by a capitalized word, and every switch between letters and
/// digits.
///
/// # Examples
/// ```
/// use oapigen::core::utils::split_words;
///
/// assert_eq!(split_words("getHTTPResponse"), vec!["get", "HTTP", "Response"]);
/// assert_eq!(split_words("GetRuleV2"), vec!["Get", "Rule", "V", "2"]);
/// assert_eq!(split_words("find-pets by_status"), vec!["find", "pets", "by", "status"]);
/// ```
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            let boundary = prev.is_numeric() != ch.is_numeric()
                || (prev.is_lowercase() && ch.is_uppercase())
                || (prev.is_uppercase() && ch.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Converts a string to snake_case, used for generated file names.
///
/// # Examples
/// ```
/// use oapigen::core::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("GetEndpointSuggestions"), "get_endpoint_suggestions");
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
/// ```
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Converts a string to PascalCase, used for exported TypeScript names.
///
/// # Examples
/// ```
/// use oapigen::core::utils::to_pascal_case;
///
/// assert_eq!(to_pascal_case("find_pets_by_status"), "FindPetsByStatus");
/// assert_eq!(to_pascal_case("http_response"), "HttpResponse");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|word| capitalize(word)).collect()
}

/// Converts a string to camelCase, used for TypeScript function names.
///
/// # Examples
/// ```
/// use oapigen::core::utils::to_camel_case;
///
/// assert_eq!(to_camel_case("find_pets_by_status"), "findPetsByStatus");
/// assert_eq!(to_camel_case("GetEndpointSuggestions"), "getEndpointSuggestions");
/// ```
pub fn to_camel_case(s: &str) -> String {
    split_words(s)
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                word.to_lowercase()
            } else {
                capitalize(word)
            }
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("FindPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
        assert_eq!(to_snake_case("find_pets_by_status"), "find_pets_by_status");
        assert_eq!(to_snake_case("HTTPResponse"), "http_response");
        assert_eq!(to_snake_case("getHTTPResponse"), "get_http_response");
        assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
    }

    #[test]
    fn test_snake_case_splits_digits() {
        assert_eq!(to_snake_case("GetRuleV2"), "get_rule_v_2");
        assert_eq!(to_snake_case("ReadAlertsIndex"), "read_alerts_index");
        assert_eq!(to_snake_case("__leading__"), "leading");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("find_pets_by_status"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("findPetsByStatus"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("find-pets-by-status"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("FIND_PETS_BY_STATUS"), "FindPetsByStatus");
        assert_eq!(
            to_pascal_case("GetExceptionListSummary"),
            "GetExceptionListSummary"
        );
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("CreateEndpointListItem"), "createEndpointListItem");
        assert_eq!(to_camel_case("http_response"), "httpResponse");
        assert_eq!(to_camel_case(""), "");
    }
}
