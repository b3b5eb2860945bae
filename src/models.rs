// src/models.rs

//! Plain data shared between the command model and the parser collaborators.

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

// --- KEYWORD OPTIONS ---
// Every parser-facing call in this crate takes its options as an ordered
// string-keyed map, the same shape argparse-style parsers accept as `**kwargs`.

/// Insertion-ordered keyword options (`help`, `action`, `default`, ...).
pub type Kwargs = serde_json::Map<String, Value>;

/// Builds a [`Kwargs`] map from `key => value` pairs.
///
/// Values go through `Value::from`, so strings, numbers, booleans and vectors
/// of those can be used directly.
///
/// ```
/// use argdeco::kwargs;
///
/// let options = kwargs! { "help" => "Number of retries", "default" => 3 };
/// assert_eq!(options.len(), 2);
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::models::Kwargs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::models::Kwargs::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::models::Value::from($value),
            );
        )+
        map
    }};
}

/// A positional/keyword pair, the shape of a parser construction call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    /// Positional tokens.
    pub args: Vec<String>,
    /// Keyword options, in insertion order.
    pub kwargs: Kwargs,
}

impl Invocation {
    /// Creates an invocation from positional tokens and keyword options.
    pub fn new<I, S>(args: I, kwargs: Kwargs) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs,
        }
    }
}

// --- GROUP HANDLES ---

/// Opaque handle to an argument group created on a parser.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// Where an argument gets attached: the parser itself or one of its groups.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    /// The parser itself.
    #[default]
    Parser,
    /// A group previously created on the parser.
    Group(GroupId),
}

// --- ACCUMULATED DECLARATIONS ---

/// One `argument` declaration: optional group tag plus the raw call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArgumentDecl {
    /// Tag of the target group; `None` targets the parser.
    pub group: Option<String>,
    /// Positional name or flag strings.
    pub args: Vec<String>,
    /// Argument options.
    pub kwargs: Kwargs,
}

/// One `group` or `mutually_exclusive` declaration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GroupDecl {
    /// The tag arguments refer to.
    pub name: String,
    /// Options forwarded when the group is created.
    pub kwargs: Kwargs,
}

/// Python-style truthiness of a value: `null`, `false`, `0`, `""`, `[]` and
/// `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kwargs_macro_keeps_insertion_order() {
        let options = kwargs! { "zeta" => 1, "alpha" => "a", "mid" => true };
        let keys: Vec<_> = options.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(options.get("alpha"), Some(&Value::from("a")));
    }

    #[test]
    fn test_invocation_default_is_empty() {
        let invocation = Invocation::default();
        assert!(invocation.args.is_empty());
        assert!(invocation.kwargs.is_empty());
        assert_eq!(
            Invocation::new(["a", "b"], kwargs! {}).args,
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::from(0)));
        assert!(!is_truthy(&Value::from("")));
        assert!(!is_truthy(&Value::from(false)));
        assert!(is_truthy(&Value::from(0.5)));
        assert!(is_truthy(&Value::from("x")));
        assert!(is_truthy(&Value::from(vec![1])));
    }
}
