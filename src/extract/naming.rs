// Identifier and type-reference helpers

/// Split an identifier into words on case changes, digits and separators.
///
/// `createOrder` -> `["create", "Order"]`, `HTTPClient` -> `["HTTP", "Client"]`.
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase() && c.is_uppercase() && next_lower)
                || (prev.is_ascii_digit() != c.is_ascii_digit());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Uppercase the first character
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title Case words joined by spaces; all-caps acronyms are kept
pub fn title_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| {
            let w = w.as_ref();
            if w.len() > 1 && w.chars().all(|c| c.is_uppercase() || c.is_ascii_digit()) {
                w.to_string()
            } else {
                capitalize(&w.to_lowercase())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `createOrder` -> `Create Order`
pub fn humanize(name: &str) -> String {
    title_words(&split_words(name))
}

/// Participant-style name for a receiver: `$orderRepo` -> `OrderRepo`
pub fn participant_name(receiver: &str) -> String {
    let trimmed = receiver.trim_start_matches('$').trim_start_matches('_');
    capitalize(trimmed)
}

/// Alphanumeric alias for names that contain spaces
pub fn alias(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect()
}

const WRAPPERS: &[&str] = &[
    "Optional", "Nullable", "Readonly", "Promise", "Task", "ValueTask", "Mono", "Future",
    "Observable", "Lazy", "Ref", "Partial",
];

const COLLECTIONS: &[&str] = &[
    "List", "list", "Set", "set", "IEnumerable", "ICollection", "IList", "IReadOnlyList",
    "IReadOnlyCollection", "Collection", "Array", "ArrayList", "LinkedList", "HashSet", "Sequence",
    "Iterable", "Vector", "Queue", "Stack", "Flux", "frozenset", "tuple", "Tuple", "ReadonlyArray",
];

const MAPS: &[&str] = &[
    "Map", "HashMap", "Dictionary", "IDictionary", "dict", "Dict", "Record", "Mapping",
];

const PRIMITIVES: &[&str] = &[
    "int", "long", "short", "byte", "char", "float", "double", "decimal", "bool", "boolean",
    "string", "String", "str", "void", "object", "Object", "any", "unknown", "never", "number",
    "mixed", "array", "callable", "iterable", "null", "None", "Integer", "Long", "Short", "Byte",
    "Character", "Float", "Double", "Boolean", "BigDecimal", "BigInteger", "Date", "DateTime",
    "LocalDate", "LocalDateTime", "Instant", "UUID", "Guid", "dict", "list", "set", "tuple",
    "bytes", "self", "static", "var", "dynamic", "uint", "ulong", "sbyte", "ushort", "Any",
    "undefined", "symbol", "bigint", "Function", "datetime", "date", "Decimal", "Optional",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Split a generic argument list on top-level commas
fn generic_args(inner: &str) -> Vec<&str> {
    super::params::split_top_level(inner, ',')
}

/// Split `Name<args>` / `Name[args]` into the name and its argument text
fn split_generic(raw: &str) -> Option<(&str, &str)> {
    let open = raw.find(['<', '['])?;
    let close = if raw[open..].starts_with('<') { '>' } else { ']' };
    let end = raw.rfind(close)?;
    if end <= open {
        return None;
    }
    Some((raw[..open].trim(), &raw[open + 1..end]))
}

/// Reduce a type reference to its base name.
///
/// Strips generics, array suffixes, nullability markers, PHP leading
/// backslashes and pointer/reference sigils; unwraps `Optional[T]`-style
/// wrappers and takes the first non-null arm of a union.
pub fn strip_type_ref(raw: &str) -> String {
    let mut t = raw.trim();
    if let Some(first) = t.split('|').map(str::trim).find(|p| !matches!(*p, "null" | "None" | "undefined" | "")) {
        t = first;
    }
    t = t.trim_start_matches(['?', '\\', '&', '*']).trim();
    if let Some((name, inner)) = split_generic(t) {
        let short = name.rsplit(['.', '\\']).next().unwrap_or(name);
        if WRAPPERS.contains(&short) {
            if let Some(arg) = generic_args(inner).first() {
                return strip_type_ref(arg);
            }
        }
        t = name;
    }
    let t = t
        .trim_end_matches("[]")
        .trim_end_matches(['?', '*', '&', '!'])
        .trim_end_matches("...")
        .trim();
    t.replace('\\', ".").trim_start_matches('.').to_string()
}

/// Element type of a collection-shaped reference: `X[]`, `List<X>`, `list[X]`
pub fn collection_element(raw: &str) -> Option<String> {
    let t = raw.trim().trim_start_matches('?').trim_end_matches('?').trim();
    if let Some(base) = t.strip_suffix("[]") {
        return Some(strip_type_ref(base));
    }
    let (name, inner) = split_generic(t)?;
    let short = name.rsplit(['.', '\\']).next().unwrap_or(name);
    let args = generic_args(inner);
    if COLLECTIONS.contains(&short) {
        return args.first().map(|a| strip_type_ref(a));
    }
    if MAPS.contains(&short) {
        return args.last().map(|a| strip_type_ref(a));
    }
    if WRAPPERS.contains(&short) {
        return args.first().and_then(|a| collection_element(a));
    }
    None
}

/// Whether a name looks like a type (starts with an uppercase letter)
pub fn looks_like_type(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("createOrder", &["create", "Order"])]
    #[case("HTTPClient", &["HTTP", "Client"])]
    #[case("get_user_by_id", &["get", "user", "by", "id"])]
    #[case("OrderService", &["Order", "Service"])]
    #[case("v2Api", &["v", "2", "Api"])]
    fn test_split_words(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(split_words(input), expected);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("createOrder"), "Create Order");
        assert_eq!(humanize("list_all_users"), "List All Users");
        assert_eq!(humanize("getAPIKey"), "Get API Key");
    }

    #[test]
    fn test_participant_name() {
        assert_eq!(participant_name("$orderRepo"), "OrderRepo");
        assert_eq!(participant_name("_service"), "Service");
    }

    #[rstest]
    #[case("List<Order>", "List")]
    #[case("Order[]", "Order")]
    #[case("?Order", "Order")]
    #[case("Order?", "Order")]
    #[case("\\App\\Models\\Order", "App.Models.Order")]
    #[case("Optional[Order]", "Order")]
    #[case("Promise<Order>", "Order")]
    #[case("Order | null", "Order")]
    #[case("Map<String, List<Item>>", "Map")]
    fn test_strip_type_ref(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_type_ref(raw), expected);
    }

    #[rstest]
    #[case("Order[]", Some("Order"))]
    #[case("List<Order>", Some("Order"))]
    #[case("IEnumerable<Line>", Some("Line"))]
    #[case("list[Item]", Some("Item"))]
    #[case("Map<String, Item>", Some("Item"))]
    #[case("Order", None)]
    fn test_collection_element(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(collection_element(raw).as_deref(), expected);
    }

    #[test]
    fn test_primitives() {
        assert!(is_primitive("String"));
        assert!(is_primitive("int"));
        assert!(!is_primitive("Order"));
    }
}
