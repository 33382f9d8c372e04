//! Naming utilities for modelgen
//!
//! Converts raw schema identifiers into Go-safe exported names.

use inflector::Inflector;

/// Schema whose tables are referenced without a schema prefix
pub const PUBLIC_SCHEMA: &str = "public";

/// Identity suffix as written in generated field names
pub const ID: &str = "ID";
/// Plural identity suffix as written in generated field names
pub const IDS: &str = "IDs";
/// Identity suffix as written in serialization names
pub const ID_ALIAS: &str = "Id";
/// Plural identity suffix as written in serialization names
pub const IDS_ALIAS: &str = "Ids";
/// Suffix biasing a relation away from a column with the same name
pub const REL: &str = "Rel";

/// Fallback when an identifier sanitizes to nothing
const FALLBACK_NAME: &str = "Field";

/// Words always written fully upper-cased
const INITIALISMS: &[&str] = &[
    "acl", "api", "ascii", "cpu", "css", "dns", "eof", "guid", "html", "http", "https", "id",
    "ip", "json", "lhs", "qps", "ram", "rhs", "rpc", "sla", "smtp", "sql", "ssh", "tcp", "tls",
    "ttl", "udp", "ui", "uid", "uri", "url", "utf8", "uuid", "vm", "xml", "xmpp", "xsrf", "xss",
];

/// Strip characters that cannot appear in an identifier and drop leading digits
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            '-' | ' ' | '.' => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches(|c: char| c.is_ascii_digit()).to_string()
}

/// Split a compound name (camelCase, snake_case, etc.) into lower-cased words
///
/// Upper-case runs stay together, so `HTTPServer` splits into `http` and `server`.
pub fn split_into_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();

    for part in name.split(|c| c == '_' || c == '-').filter(|s| !s.is_empty()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            let boundary = i > 0 && c.is_uppercase() && {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
                prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            };

            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words.iter().map(|w| w.to_lowercase()).collect()
}

fn capitalize_word(word: &str) -> String {
    if INITIALISMS.contains(&word) {
        return word.to_uppercase();
    }
    if word == "ids" {
        return IDS.to_string();
    }

    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert to an exported Go identifier, keeping initialisms upper-cased
pub fn camel_cased(name: &str) -> String {
    split_into_words(name)
        .iter()
        .map(|word| capitalize_word(word))
        .collect()
}

/// Lower-case the first character
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace `suffix` at the end of `name`, leaving other names untouched
pub fn replace_suffix(name: &str, suffix: &str, replacement: &str) -> String {
    match name.strip_suffix(suffix) {
        Some(stem) => format!("{}{}", stem, replacement),
        None => name.to_string(),
    }
}

/// Convert a plural name to singular
pub fn singularize(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "people" => "person".to_string(),
        "children" => "child".to_string(),
        "men" => "man".to_string(),
        "women" => "woman".to_string(),
        "feet" => "foot".to_string(),
        "teeth" => "tooth".to_string(),
        "geese" => "goose".to_string(),
        "mice" => "mouse".to_string(),
        "data" | "status" | "news" | "series" => name.to_string(),
        _ => name.to_singular(),
    }
}

/// Convert a singular name to plural
pub fn pluralize(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "man" => "men".to_string(),
        "woman" => "women".to_string(),
        "foot" => "feet".to_string(),
        "tooth" => "teeth".to_string(),
        "goose" => "geese".to_string(),
        "mouse" => "mice".to_string(),
        _ => name.to_plural(),
    }
}

/// Type-name prefix for a schema; tables in the public schema get none
pub fn schema_prefix(schema: &str) -> String {
    if schema == PUBLIC_SCHEMA {
        String::new()
    } else {
        camel_cased(&sanitize(schema))
    }
}

/// Singular, digit-free type name for a table, e.g. `user_accounts` becomes `UserAccount`
pub fn entity_name(schema: &str, table: &str) -> String {
    // digits go first so `logs2024` still singularizes
    let mut words = split_into_words(&strip_digits(&sanitize(table)));
    if let Some(last) = words.last_mut() {
        *last = singularize(last);
    }

    let name = strip_digits(&format!(
        "{}{}",
        schema_prefix(schema),
        camel_cased(&words.join("_"))
    ));
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

fn strip_digits(name: &str) -> String {
    name.chars().filter(|c| !c.is_ascii_digit()).collect()
}

/// Plural type name for a table, keeping the table's own number
pub fn entity_plural_name(schema: &str, table: &str) -> String {
    let stem = camel_cased(&sanitize(table));
    if stem.is_empty() {
        return pluralize(&entity_name(schema, table));
    }
    format!("{}{}", schema_prefix(schema), stem)
}

/// Name used to address a table in generated tags
pub fn full_name(schema: &str, table: &str) -> String {
    if schema == PUBLIC_SCHEMA {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

/// Field name for a column, e.g. `user_id` becomes `UserID`
pub fn column_name(name: &str) -> String {
    let converted = camel_cased(&sanitize(name));
    if converted.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        converted
    }
}

/// Relation field stem for a list of foreign-key columns with the identity suffix dropped
pub fn relation_name(fk_columns: &[String]) -> String {
    fk_columns
        .iter()
        .map(|column| replace_suffix(&column_name(column), ID, ""))
        .collect()
}

/// Serialization name for a generated field, e.g. `UserID` becomes `userId`
pub fn serialization_name(field_name: &str) -> String {
    lower_first(&replace_suffix(
        &replace_suffix(field_name, ID, ID_ALIAS),
        IDS,
        IDS_ALIAS,
    ))
}

/// Normalized, lower-cased form of a free-text value
pub fn value_name(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Constant name for one allowed value of an enumeration
pub fn enum_constant_name(enum_name: &str, value: &str) -> String {
    column_name(&format!("{}_{}", enum_name, value_name(value)))
}
