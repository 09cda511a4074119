//! Method invocations and object creations covering a whole fragment.

use serde::{Deserialize, Serialize};

/// What kind of call a [`Call`] is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `receiver.name(args)` or `name(args)`.
    #[default]
    Method,
    /// `new Type(args)`.
    Creation,
    /// `super.name(args)`.
    Super,
    /// `this(args)` or `super(args)`.
    Constructor,
}

/// A call expression as rendered by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    /// Call kind.
    #[serde(default)]
    pub kind: CallKind,
    /// Invoked name (method name, or created type).
    pub name: String,
    /// Receiver expression, if any.
    #[serde(default)]
    pub expression: Option<String>,
    /// Rendered arguments, in order.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Rendered text of the whole call.
    pub text: String,
}

impl Call {
    /// Create a method invocation.
    pub fn method(
        name: impl Into<String>,
        expression: Option<&str>,
        arguments: &[&str],
        text: impl Into<String>,
    ) -> Self {
        Call {
            kind: CallKind::Method,
            name: name.into(),
            expression: expression.map(str::to_string),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            text: text.into(),
        }
    }

    /// Create an object creation.
    pub fn creation(name: impl Into<String>, arguments: &[&str], text: impl Into<String>) -> Self {
        Call {
            kind: CallKind::Creation,
            name: name.into(),
            expression: None,
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            text: text.into(),
        }
    }

    /// Rendered text of the call.
    pub fn actual_string(&self) -> &str {
        &self.text
    }

    pub fn identical_name(&self, other: &Call) -> bool {
        self.name == other.name
    }

    /// Both calls have the same receiver (or both have none).
    pub fn identical_expression(&self, other: &Call) -> bool {
        self.expression == other.expression
    }

    /// The receiver segment that is itself a call to the same method.
    ///
    /// For `a.append(x).append(y)` with name `append` the receiver is
    /// `a.append(x)` and this returns `append(x)`. Segments are split at
    /// dots outside parentheses.
    pub fn sub_expression_is_call_to_same_method(&self) -> Option<&str> {
        if self.kind != CallKind::Method {
            return None;
        }
        let expression = self.expression.as_deref()?;
        let prefix = format!("{}(", self.name);
        top_level_segments(expression)
            .into_iter()
            .find(|segment| segment.starts_with(&prefix))
    }
}

/// Split `expression` at `.` characters that are not nested in brackets.
fn top_level_segments(expression: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in expression.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '.' if depth == 0 => {
                segments.push(&expression[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&expression[start..]);
    segments
}
